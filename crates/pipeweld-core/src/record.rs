//! YAML record model.
//!
//! A pipeline configuration is a stream of records; each record is a
//! key-ordered mapping with an optional `kind` field that selects how the
//! resolver handles it.

use serde_yaml::{Mapping, Value};

/// Record kind that composes child pipeline documents by reference.
pub const KIND_VIRTUAL_PIPELINE: &str = "virtual-pipeline";
/// Record kind that registers a named pipeline template.
pub const KIND_TEMPLATE_PIPELINE: &str = "template-pipeline";
/// Record kind that instantiates a registered template.
pub const KIND_FROM_PIPELINE_TEMPLATE: &str = "from-pipeline-template";

/// One YAML sub-document: a key-ordered mapping of field name to value.
///
/// Field order is preserved through parse and encode.
#[derive(Debug, Clone, PartialEq)]
pub struct Record(Mapping);

impl Record {
    pub fn new(fields: Mapping) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Mapping {
        &self.0
    }

    /// The `kind` field, if present and a string.
    pub fn kind(&self) -> Option<&str> {
        self.str_field("kind")
    }

    /// A field as a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// A field as a boolean.
    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// A field as a sequence of strings.
    ///
    /// Returns `None` when the field is absent, not a sequence, or any
    /// element is not a string.
    pub fn string_sequence(&self, name: &str) -> Option<Vec<String>> {
        let seq = self.get(name)?.as_sequence()?;
        seq.iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// A field as a nested mapping.
    pub fn mapping_field(&self, name: &str) -> Option<&Mapping> {
        self.get(name).and_then(Value::as_mapping)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(Value::String(name.into()))
    }

    /// Insert or overwrite a field. New fields land at the end of the
    /// mapping; existing fields keep their position.
    pub fn set(&mut self, name: &str, value: Value) {
        self.0.insert(Value::String(name.into()), value);
    }
}

impl From<Mapping> for Record {
    fn from(fields: Mapping) -> Self {
        Self(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_single;

    #[test]
    fn test_kind_detection() {
        let record = parse_single("kind: virtual-pipeline\npipelines: []\n").unwrap();
        assert_eq!(record.kind(), Some(KIND_VIRTUAL_PIPELINE));

        let record = parse_single("name: build\nsteps: []\n").unwrap();
        assert_eq!(record.kind(), None);
    }

    #[test]
    fn test_string_sequence() {
        let record = parse_single("pipelines:\n  - services/api\n  - services/worker\n").unwrap();
        assert_eq!(
            record.string_sequence("pipelines"),
            Some(vec![
                "services/api".to_string(),
                "services/worker".to_string()
            ])
        );
    }

    #[test]
    fn test_string_sequence_rejects_non_string_elements() {
        let record = parse_single("pipelines:\n  - services/api\n  - 42\n").unwrap();
        assert_eq!(record.string_sequence("pipelines"), None);
    }

    #[test]
    fn test_string_sequence_rejects_scalar() {
        let record = parse_single("pipelines: not-a-list\n").unwrap();
        assert_eq!(record.string_sequence("pipelines"), None);
        assert_eq!(record.string_sequence("missing"), None);
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut record = parse_single("name: build\ndepends_on: []\nimage: alpine\n").unwrap();
        record.set("depends_on", Value::from(vec!["a".to_string()]));

        let keys: Vec<&str> = record.fields().keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["name", "depends_on", "image"]);
    }
}
