//! Issue service: the in-memory registry of repair/deprecation issues.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cmdhub_domain::error::HubError;
use cmdhub_domain::event::{Event, EventType};
use cmdhub_domain::issue::Issue;

use crate::ports::EventPublisher;

type IssueKey = (String, String);

/// Registry of issues keyed by `(domain, issue_id)`.
pub struct IssueService<P> {
    issues: Mutex<BTreeMap<IssueKey, Issue>>,
    publisher: P,
}

impl<P: EventPublisher> IssueService<P> {
    pub fn new(publisher: P) -> Self {
        Self {
            issues: Mutex::new(BTreeMap::new()),
            publisher,
        }
    }

    fn issues(&self) -> MutexGuard<'_, BTreeMap<IssueKey, Issue>> {
        self.issues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `issue`, replacing any issue with the same key.
    ///
    /// Only a previously unknown issue is logged and announced with
    /// [`EventType::IssueCreated`].
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be published.
    pub async fn create_issue(&self, issue: Issue) -> Result<(), HubError> {
        let data = serde_json::json!({
            "domain": issue.domain,
            "issue_id": issue.issue_id,
            "severity": issue.severity,
            "breaks_in_version": issue.breaks_in_version,
            "translation_key": issue.translation_key,
            "translation_placeholders": issue.translation_placeholders,
        });
        let previous = self.issues().insert(issue.key(), issue.clone());
        if previous.is_some() {
            return Ok(());
        }

        tracing::warn!(
            domain = %issue.domain,
            issue_id = %issue.issue_id,
            breaks_in_version = issue.breaks_in_version.as_deref().unwrap_or("-"),
            "issue raised"
        );
        self.publisher
            .publish(Event::new(EventType::IssueCreated, None, data))
            .await
    }

    #[must_use]
    pub fn get_issue(&self, domain: &str, issue_id: &str) -> Option<Issue> {
        self.issues()
            .get(&(domain.to_string(), issue_id.to_string()))
            .cloned()
    }

    /// All issues, ordered by domain then id.
    #[must_use]
    pub fn list_issues(&self) -> Vec<Issue> {
        self.issues().values().cloned().collect()
    }
}
