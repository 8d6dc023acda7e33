//! Multi-document YAML stream parsing and encoding.

use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

use crate::Record;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document is not a mapping")]
    NotAMapping,
}

/// Parse a YAML stream into its records, preserving document order.
///
/// Empty documents are skipped; a non-mapping document is an error.
pub fn parse_stream(input: &str) -> Result<Vec<Record>, DocumentError> {
    let mut records = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(input) {
        match Value::deserialize(doc)? {
            Value::Null => continue,
            Value::Mapping(fields) => records.push(Record::new(fields)),
            _ => return Err(DocumentError::NotAMapping),
        }
    }
    Ok(records)
}

/// Parse exactly one record from YAML text.
///
/// Multi-document input is rejected.
pub fn parse_single(input: &str) -> Result<Record, DocumentError> {
    match serde_yaml::from_str::<Value>(input)? {
        Value::Mapping(fields) => Ok(Record::new(fields)),
        _ => Err(DocumentError::NotAMapping),
    }
}

/// Encode records back into one YAML stream with `---` separators
/// between documents.
pub fn encode_stream(records: &[Record]) -> Result<String, DocumentError> {
    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        out.push_str(&serde_yaml::to_string(record.fields())?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_preserves_order() {
        let input = "name: one\n---\nname: two\n---\nname: three\n";
        let records = parse_stream(input).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].str_field("name"), Some("one"));
        assert_eq!(records[1].str_field("name"), Some("two"));
        assert_eq!(records[2].str_field("name"), Some("three"));
    }

    #[test]
    fn test_parse_stream_skips_empty_documents() {
        let input = "---\nname: one\n---\n---\nname: two\n";
        let records = parse_stream(input).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_stream_rejects_scalar_document() {
        let input = "name: one\n---\njust a string\n";
        assert!(matches!(
            parse_stream(input),
            Err(DocumentError::NotAMapping)
        ));
    }

    #[test]
    fn test_parse_single_rejects_multiple_documents() {
        let input = "name: one\n---\nname: two\n";
        assert!(parse_single(input).is_err());
    }

    #[test]
    fn test_round_trip_preserves_field_order() {
        let input = "name: build\nimage: alpine\nsteps:\n- lint\n- test\n---\nname: deploy\n";
        let records = parse_stream(input).unwrap();
        let encoded = encode_stream(&records).unwrap();
        let reparsed = parse_stream(&encoded).unwrap();
        assert_eq!(records, reparsed);

        let keys: Vec<&str> = records[0]
            .fields()
            .keys()
            .filter_map(serde_yaml::Value::as_str)
            .collect();
        assert_eq!(keys, vec!["name", "image", "steps"]);
    }

    #[test]
    fn test_encode_separates_documents() {
        let records = parse_stream("a: 1\n---\nb: 2\n").unwrap();
        let encoded = encode_stream(&records).unwrap();
        assert_eq!(encoded, "a: 1\n---\nb: 2\n");
    }
}
