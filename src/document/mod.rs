//! JSON:API wire model
//!
//! Typed representation of request documents, resource objects and resource
//! linkage, plus the parse boundary that turns request text into them.

pub mod parse;
pub mod types;

pub use parse::{is_operations_request, parse_envelope, parse_relationship_body, parse_tree, Envelope};
pub use types::{
    Document, Linkage, Operation, OperationCode, OperationsDocument, PrimaryData, RelationshipData,
    ResourceIdentifier, ResourceObject,
};

use crate::error::{BindError, Result};

/// Find the single included resource object matching an identifier.
///
/// A compound document must not carry two resource objects with the same
/// (type, id) pair; that case is an error rather than a first-match pick.
pub fn find_included<'a>(
    identifier: &ResourceIdentifier,
    included: &'a [ResourceObject],
) -> Result<Option<&'a ResourceObject>> {
    let mut matches = included.iter().filter(|resource| identifier.matches(resource));

    let Some(found) = matches.next() else {
        return Ok(None);
    };

    if matches.next().is_some() {
        return Err(BindError::DuplicateIncludedResource {
            type_name: identifier.type_name.clone(),
            id: identifier.id.clone().unwrap_or_default(),
        });
    }

    Ok(Some(found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person(id: &str, name: &str) -> ResourceObject {
        serde_json::from_value(json!({
            "type": "people",
            "id": id,
            "attributes": {"name": name}
        }))
        .unwrap()
    }

    #[test]
    fn test_find_included_single_match() {
        let included = vec![person("1", "Ann"), person("2", "Bo")];
        let found = find_included(&ResourceIdentifier::new("people", "2"), &included)
            .unwrap()
            .unwrap();
        assert_eq!(found.attributes.as_ref().unwrap()["name"], "Bo");
    }

    #[test]
    fn test_find_included_no_match() {
        let included = vec![person("1", "Ann")];
        let found = find_included(&ResourceIdentifier::new("articles", "1"), &included).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_find_included_duplicate_pair() {
        // Differing attributes do not make the pair distinct
        let included = vec![person("1", "Ann"), person("1", "Other")];
        let err = find_included(&ResourceIdentifier::new("people", "1"), &included).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DuplicateIncludedResource);
    }
}
