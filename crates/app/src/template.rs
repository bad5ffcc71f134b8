//! Value templates: Jinja-style transforms applied to raw integration output.
//!
//! A template sees the raw text as `value` and, when that text is valid
//! JSON, the parsed document as `value_json`:
//!
//! ```text
//! {{ value | upper }}
//! {{ "ON" if value_json.online else "OFF" }}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use minijinja::{Environment, Value};

use cmdhub_domain::error::HubError;

/// Error raised when a template fails to parse.
pub use minijinja::Error as TemplateError;

const TEMPLATE_NAME: &str = "value_template";

/// A value template, compiled once at construction.
pub struct ValueTemplate {
    env: Environment<'static>,
}

impl ValueTemplate {
    /// Compile `source`, rejecting syntax errors up front.
    ///
    /// # Errors
    ///
    /// Returns the parser error when `source` is not a valid template.
    pub fn new(source: impl Into<String>) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME, source.into())?;
        Ok(Self { env })
    }

    /// Render with `value` bound to the raw text and, when it parses as
    /// JSON, `value_json` bound to the parsed document.
    ///
    /// The output is trimmed of surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Render`] when evaluation fails (unknown filter,
    /// invalid operation, …).
    pub fn render_with_possible_json_value(&self, value: &str) -> Result<String, HubError> {
        let mut ctx = BTreeMap::new();
        ctx.insert("value", Value::from(value));
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(value) {
            ctx.insert("value_json", Value::from_serialize(&json));
        }

        let rendered = self
            .env
            .get_template(TEMPLATE_NAME)
            .and_then(|template| template.render(ctx))
            .map_err(|err| HubError::Render(Box::new(err)))?;
        Ok(rendered.trim().to_string())
    }
}

impl fmt::Debug for ValueTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self
            .env
            .get_template(TEMPLATE_NAME)
            .map(|template| template.source().to_owned())
            .unwrap_or_default();
        f.debug_struct("ValueTemplate")
            .field("source", &source)
            .finish_non_exhaustive()
    }
}
