//! Parser for the JSON form written by [`crate::render::to_json`].

use std::io::Read;

use crate::error::Result;
use crate::model::Document;

/// Parse a document from JSON and restore its invariants.
pub fn parse_json(input: &str) -> Result<Document> {
    let doc: Document = serde_json::from_str(input)?;
    doc.normalize()
}

/// Parse a document from a JSON reader.
pub fn parse_json_reader<R: Read>(reader: R) -> Result<Document> {
    let doc: Document = serde_json::from_reader(reader)?;
    doc.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::NodeId;

    #[test]
    fn test_parse_minimal() {
        let doc = parse_json(
            r#"{"pages": [{"elements": [
                {"id": 41, "block": {"type": "paragraph", "content": [
                    {"type": "text", "text": "Hello"}
                ]}}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.node_ids(), vec![NodeId(41)]);
        assert_eq!(doc.plain_text(), "Hello");
        assert_ne!(NodeId::fresh(), NodeId(41));
    }

    #[test]
    fn test_empty_page_list_gets_a_page() {
        let doc = parse_json(r#"{"pages": []}"#).unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = parse_json(
            r#"{"pages": [
                {"elements": [{"id": 7, "block": {"type": "horizontal_rule"}}]},
                {"elements": [{"id": 7, "block": {"type": "horizontal_rule"}}]}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateNode(NodeId(7))));
    }

    #[test]
    fn test_max_node_id_rejected() {
        let err = parse_json(
            r#"{"pages": [{"elements": [
                {"id": 18446744073709551615, "block": {"type": "horizontal_rule"}}
            ]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_ne!(NodeId::fresh(), NodeId(u64::MAX));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_json_reader(&b"{\"pages\": ["[..]).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
