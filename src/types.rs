use serde::{Deserialize, Serialize};

/// How object keys inside structured attribute values are rewritten before
/// they are decoded into the target property type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStyle {
    /// Keys are passed through untouched
    #[default]
    AsIs,
    /// `camelCase` and `kebab-case` keys become `snake_case`
    SnakeCase,
}

/// Options for the typed decode of nested object/array attribute values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredOptions {
    pub key_style: KeyStyle,
}

/// Configuration for the binding process
#[derive(Debug, Clone, Default)]
pub struct BindConfig {
    /// Detect `{ "operations": [...] }` bodies and return them unresolved
    pub enable_operations: bool,

    /// Options handed to the structured decode path
    pub structured: StructuredOptions,

    /// Reject payload relationships the resource type does not declare
    pub strict_relationships: bool,
}

impl BindConfig {
    pub fn with_operations(mut self) -> Self {
        self.enable_operations = true;
        self
    }

    pub fn with_key_style(mut self, key_style: KeyStyle) -> Self {
        self.structured.key_style = key_style;
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict_relationships = true;
        self
    }
}
