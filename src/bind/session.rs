//! Per-document binding state
//!
//! A [`BindingSession`] is created by the binder for exactly one document and
//! handed back with the result. Its maps tell a persistence layer which fields
//! the payload actually supplied, as opposed to fields left at their defaults.

use crate::registry::Resource;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Identifies one attribute or relationship of one resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub resource_type: String,
    pub name: String,
}

impl FieldKey {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        FieldKey {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

#[derive(Debug, Default)]
pub struct BindingSession {
    request_entity: Option<String>,
    bulk_operation: bool,
    document_meta: Option<Map<String, Value>>,

    /// Mutable attributes supplied in the payload, with their converted values
    attributes_to_update: HashMap<FieldKey, Value>,

    /// Has-one foreign keys set from the payload
    relationships_to_update: HashMap<FieldKey, Value>,

    /// Related entities attached through has-one relationships
    has_one_pointers: HashMap<FieldKey, Box<dyn Resource>>,

    /// Related entities attached through has-many relationships, in payload order
    has_many_pointers: HashMap<FieldKey, Vec<Box<dyn Resource>>>,
}

impl BindingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Public name of the resource type most recently materialized
    pub fn request_entity(&self) -> Option<&str> {
        self.request_entity.as_deref()
    }

    pub fn is_bulk_operation_request(&self) -> bool {
        self.bulk_operation
    }

    pub fn document_meta(&self) -> Option<&Map<String, Value>> {
        self.document_meta.as_ref()
    }

    pub fn attributes_to_update(&self) -> &HashMap<FieldKey, Value> {
        &self.attributes_to_update
    }

    pub fn relationships_to_update(&self) -> &HashMap<FieldKey, Value> {
        &self.relationships_to_update
    }

    pub fn has_one_pointers(&self) -> &HashMap<FieldKey, Box<dyn Resource>> {
        &self.has_one_pointers
    }

    pub fn has_many_pointers(&self) -> &HashMap<FieldKey, Vec<Box<dyn Resource>>> {
        &self.has_many_pointers
    }

    pub fn attribute(&self, resource_type: &str, name: &str) -> Option<&Value> {
        self.attributes_to_update.get(&FieldKey::new(resource_type, name))
    }

    pub fn foreign_key(&self, resource_type: &str, relationship: &str) -> Option<&Value> {
        self.relationships_to_update
            .get(&FieldKey::new(resource_type, relationship))
    }

    pub fn has_one(&self, resource_type: &str, relationship: &str) -> Option<&dyn Resource> {
        self.has_one_pointers
            .get(&FieldKey::new(resource_type, relationship))
            .map(|related| &**related)
    }

    pub fn has_many(&self, resource_type: &str, relationship: &str) -> Option<&[Box<dyn Resource>]> {
        self.has_many_pointers
            .get(&FieldKey::new(resource_type, relationship))
            .map(Vec::as_slice)
    }

    pub(crate) fn set_request_entity(&mut self, resource_type: &str) {
        self.request_entity = Some(resource_type.to_string());
    }

    pub(crate) fn mark_bulk_operation(&mut self) {
        self.bulk_operation = true;
    }

    pub(crate) fn set_document_meta(&mut self, meta: Option<Map<String, Value>>) {
        self.document_meta = meta;
    }

    pub(crate) fn record_attribute(&mut self, key: FieldKey, value: Value) {
        self.attributes_to_update.insert(key, value);
    }

    pub(crate) fn record_foreign_key(&mut self, key: FieldKey, value: Value) {
        self.relationships_to_update.insert(key, value);
    }

    pub(crate) fn record_has_one(&mut self, key: FieldKey, related: Box<dyn Resource>) {
        self.has_one_pointers.insert(key, related);
    }

    pub(crate) fn record_has_many(&mut self, key: FieldKey, related: Vec<Box<dyn Resource>>) {
        self.has_many_pointers.insert(key, related);
    }

    /// Fold the state of a completed binding into this session. Entries of
    /// `other` win on repeated keys.
    pub(crate) fn absorb(&mut self, other: BindingSession) {
        if other.request_entity.is_some() {
            self.request_entity = other.request_entity;
        }
        self.attributes_to_update.extend(other.attributes_to_update);
        self.relationships_to_update.extend(other.relationships_to_update);
        self.has_one_pointers.extend(other.has_one_pointers);
        self.has_many_pointers.extend(other.has_many_pointers);
    }
}
