//! Text to document decoding
//!
//! Request bodies are decoded once into a generic `serde_json::Value` tree with
//! simd-json, then lifted into the typed wire model. Parse failures map to
//! `MalformedDocument`; shape decisions that need the registry are left to the
//! binder.

use super::types::{Document, Linkage, OperationsDocument, RelationshipData, ResourceIdentifier};
use crate::error::{BindError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A parsed request body
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Document(Document),
    Operations(OperationsDocument),
}

/// Decode a text buffer with simd-json. The input is copied once since
/// simd-json parses in place.
pub(crate) fn from_str<T: DeserializeOwned>(input: &str) -> std::result::Result<T, simd_json::Error> {
    let mut bytes = input.as_bytes().to_vec();
    simd_json::serde::from_slice(&mut bytes)
}

/// Parse a request body into a generic tree
pub fn parse_tree(raw: &str) -> Result<Value> {
    from_str::<Value>(raw).map_err(|e| BindError::malformed_with("body is not valid JSON", e))
}

/// Whether a tree is a bulk operations request
pub fn is_operations_request(tree: &Value) -> bool {
    tree.as_object()
        .is_some_and(|obj| obj.contains_key("operations"))
}

/// Parse a request body, detecting operations bodies when enabled
pub fn parse_envelope(raw: &str, enable_operations: bool) -> Result<Envelope> {
    let tree = parse_tree(raw)?;

    if enable_operations && is_operations_request(&tree) {
        let operations: OperationsDocument = serde_json::from_value(tree)
            .map_err(|e| BindError::malformed_with("Failed to deserialize operations request", e))?;
        return Ok(Envelope::Operations(operations));
    }

    lift(tree).map(Envelope::Document)
}

/// Lift a generic tree into a [`Document`]
pub fn lift(tree: Value) -> Result<Document> {
    if !tree.is_object() {
        return Err(BindError::malformed("document must be a JSON object"));
    }
    serde_json::from_value(tree).map_err(|e| BindError::malformed_with("invalid json:api document", e))
}

/// Parse a relationship endpoint body (`{"data": identifier | [identifier] | null}`)
pub fn parse_relationship_body(raw: &str) -> Result<Vec<ResourceIdentifier>> {
    let tree = parse_tree(raw)?;
    let body: RelationshipData = serde_json::from_value(tree)
        .map_err(|e| BindError::malformed_with("invalid relationship body", e))?;

    Ok(match body.data {
        Some(Linkage::One(identifier)) => vec![identifier],
        Some(Linkage::Many(identifiers)) => identifiers,
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::types::PrimaryData;

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse_envelope("{\"data\": ", false).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedDocument);
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = parse_envelope("[1, 2]", false).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedDocument);
    }

    #[test]
    fn test_single_and_list_primary_data() {
        let Envelope::Document(single) =
            parse_envelope(r#"{"data": {"type": "articles", "id": "1"}}"#, false).unwrap()
        else {
            panic!("expected document");
        };
        assert!(matches!(single.data, Some(PrimaryData::One(_))));

        let Envelope::Document(list) = parse_envelope(
            r#"{"data": [{"type": "articles", "id": "1"}, {"type": "articles", "id": "2"}]}"#,
            false,
        )
        .unwrap() else {
            panic!("expected document");
        };
        match list.data {
            Some(PrimaryData::Many(items)) => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_operations_only_when_enabled() {
        let body = r#"{"operations": [{"op": "get", "ref": {"type": "articles"}}]}"#;

        assert!(matches!(
            parse_envelope(body, true).unwrap(),
            Envelope::Operations(_)
        ));

        // Without the switch the body is an ordinary document with no data
        match parse_envelope(body, false).unwrap() {
            Envelope::Document(doc) => assert!(doc.data.is_none()),
            other => panic!("expected document, got {:?}", other),
        }
    }

    #[test]
    fn test_relationship_body() {
        let one = parse_relationship_body(r#"{"data": {"type": "people", "id": "1"}}"#).unwrap();
        assert_eq!(one, vec![ResourceIdentifier::new("people", "1")]);

        let many = parse_relationship_body(
            r#"{"data": [{"type": "tags", "id": "1"}, {"type": "tags", "id": "2"}]}"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);

        let none = parse_relationship_body(r#"{"data": null}"#).unwrap();
        assert!(none.is_empty());
    }
}
