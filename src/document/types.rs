use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level envelope of a resource request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Primary data: one resource object or a list of them
    #[serde(default)]
    pub data: Option<PrimaryData>,

    /// Resources referenced by relationships in the primary data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<ResourceObject>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl Document {
    pub fn included(&self) -> &[ResourceObject] {
        self.included.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Many(Vec<ResourceObject>),
    One(Box<ResourceObject>),
}

/// One wire-format unit describing a single domain entity (a "data node")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub type_name: String,

    /// Absent on creation requests
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<BTreeMap<String, RelationshipData>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl ResourceObject {
    pub fn new(type_name: impl Into<String>) -> Self {
        ResourceObject {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier {
            type_name: self.type_name.clone(),
            id: self.id.clone(),
        }
    }
}

/// The minimal (type, id) pair referencing a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
}

impl ResourceIdentifier {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        ResourceIdentifier {
            type_name: type_name.into(),
            id: Some(id.into()),
        }
    }

    /// Whether a resource object carries this exact (type, id) pair
    pub fn matches(&self, resource: &ResourceObject) -> bool {
        resource.type_name == self.type_name && resource.id == self.id
    }
}

/// Value of one entry in a resource object's `relationships` map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipData {
    /// `None` when the payload carries `"data": null` or omits `data`
    #[serde(default)]
    pub data: Option<Linkage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl RelationshipData {
    pub fn one(identifier: ResourceIdentifier) -> Self {
        RelationshipData {
            data: Some(Linkage::One(identifier)),
            meta: None,
        }
    }

    pub fn many(identifiers: Vec<ResourceIdentifier>) -> Self {
        RelationshipData {
            data: Some(Linkage::Many(identifiers)),
            meta: None,
        }
    }

    pub fn identifiers(&self) -> &[ResourceIdentifier] {
        match &self.data {
            Some(Linkage::One(identifier)) => std::slice::from_ref(identifier),
            Some(Linkage::Many(identifiers)) => identifiers,
            None => &[],
        }
    }
}

/// Resource linkage: has-one or has-many
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    One(ResourceIdentifier),
    Many(Vec<ResourceIdentifier>),
}

/// Bulk request body, passed through unresolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationsDocument {
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub op: OperationCode,

    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationCode {
    Get,
    Add,
    Update,
    Replace,
    Remove,
}

/// Accepts string ids and numeric ids, keeping the string form
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "resource id must be a string, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_object_shape() {
        let resource: ResourceObject = serde_json::from_value(json!({
            "type": "articles",
            "id": "1",
            "attributes": {"title": "Hi"},
            "relationships": {
                "author": {"data": {"type": "people", "id": "9"}},
                "tags": {"data": [{"type": "tags", "id": "1"}, {"type": "tags", "id": "2"}]},
                "editor": {"data": null}
            }
        }))
        .unwrap();

        assert_eq!(resource.type_name, "articles");
        assert_eq!(resource.id.as_deref(), Some("1"));

        let relationships = resource.relationships.unwrap();
        assert!(matches!(relationships["author"].data, Some(Linkage::One(_))));
        assert_eq!(relationships["tags"].identifiers().len(), 2);
        assert!(relationships["editor"].data.is_none());
    }

    #[test]
    fn test_numeric_id_kept_as_string() {
        let identifier: ResourceIdentifier =
            serde_json::from_value(json!({"type": "people", "id": 9})).unwrap();
        assert_eq!(identifier.id.as_deref(), Some("9"));

        let err = serde_json::from_value::<ResourceIdentifier>(json!({"type": "people", "id": [1]}));
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_id_on_create() {
        let resource: ResourceObject =
            serde_json::from_value(json!({"type": "articles", "attributes": {"title": "New"}}))
                .unwrap();
        assert!(resource.id.is_none());
    }

    #[test]
    fn test_operation_codes() {
        let doc: OperationsDocument = serde_json::from_value(json!({
            "operations": [
                {"op": "add", "data": {"type": "articles"}},
                {"op": "remove", "ref": {"type": "articles", "id": "1"}}
            ]
        }))
        .unwrap();

        assert_eq!(doc.operations[0].op, OperationCode::Add);
        assert_eq!(doc.operations[1].op, OperationCode::Remove);
        assert!(doc.operations[1].reference.is_some());
    }
}
