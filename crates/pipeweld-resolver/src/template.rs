//! Pipeline templates.
//!
//! A template is a named YAML body with `${key}` placeholders, registered
//! by a `template-pipeline` record and instantiated by a
//! `from-pipeline-template` record later in the same document.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};

// Regex for matching ${...} placeholders
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}").unwrap());

/// A compiled template body.
#[derive(Debug, Clone)]
pub struct Template {
    body: String,
}

impl Template {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Substitute `variables` into the body's placeholders.
    ///
    /// Placeholders without a matching scalar variable are left as-is.
    pub fn render(&self, variables: &Mapping) -> String {
        PLACEHOLDER_REGEX
            .replace_all(&self.body, |caps: &regex::Captures| {
                let name = &caps[1];
                variables
                    .get(Value::String(name.into()))
                    .and_then(scalar_text)
                    .unwrap_or_else(|| format!("${{{name}}}"))
            })
            .to_string()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Templates registered during one resolution call.
///
/// Scoped to the call, never shared across concurrent resolutions.
/// Re-registering a name overwrites the previous body.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, template: Template) {
        self.templates.insert(name.into(), template);
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }
}
