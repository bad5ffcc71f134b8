//! Issue: an advisory repair or deprecation notice raised by an integration.
//!
//! Issues never change runtime behaviour; they tell the operator that
//! something should be fixed before a future release breaks it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How urgent an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
    Critical,
}

/// A repair/deprecation notice, keyed by `(domain, issue_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub domain: String,
    pub issue_id: String,
    pub severity: IssueSeverity,
    pub breaks_in_version: Option<String>,
    pub is_fixable: bool,
    pub translation_key: String,
    pub translation_placeholders: BTreeMap<String, String>,
}

impl Issue {
    /// Create a non-fixable issue with no placeholders.
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        issue_id: impl Into<String>,
        severity: IssueSeverity,
        translation_key: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            issue_id: issue_id.into(),
            severity,
            breaks_in_version: None,
            is_fixable: false,
            translation_key: translation_key.into(),
            translation_placeholders: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn breaks_in_version(mut self, version: impl Into<String>) -> Self {
        self.breaks_in_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn placeholder(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.translation_placeholders
            .insert(key.into(), value.into());
        self
    }

    /// Registry key of this issue.
    #[must_use]
    pub fn key(&self) -> (String, String) {
        (self.domain.clone(), self.issue_id.clone())
    }
}
