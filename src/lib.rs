//! # jsonapi-binder - JSON:API request binding
//!
//! Converts JSON:API request documents into native Rust entities, resolving
//! attributes, relationships and included resources against resource types
//! registered at startup.
//!
//! ## Modules
//!
//! - **bind**: the document binder and per-document session state
//! - **registry**: resource-type descriptors and the lookup interface
//! - **convert**: wire value to property type conversion
//! - **document**: the JSON:API wire model and parse boundary
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonapi_binder::{Attr, DocumentBinder, Identifiable, ResourceGraph, ResourceType};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Article {
//!     id: String,
//!     title: String,
//! }
//!
//! impl Identifiable for Article {
//!     fn string_id(&self) -> Option<String> {
//!         Some(self.id.clone())
//!     }
//!
//!     fn set_string_id(&mut self, id: &str) {
//!         self.id = id.to_string();
//!     }
//! }
//!
//! # fn main() -> Result<(), jsonapi_binder::BindError> {
//! let graph = ResourceGraph::new().with(
//!     ResourceType::new::<Article>("articles")
//!         .attribute(Attr::new("title", |a: &mut Article, v: String| a.title = v)),
//! );
//!
//! let binder = DocumentBinder::new(&graph);
//! let (article, session) = binder.bind_as::<Article>(
//!     r#"{"data": {"type": "articles", "id": "1", "attributes": {"title": "Hi"}}}"#,
//! )?;
//!
//! assert_eq!(article.title, "Hi");
//! assert!(session.attribute("articles", "title").is_some());
//! # Ok(())
//! # }
//! ```

pub mod bind;
pub mod convert;
pub mod document;
pub mod error;
pub mod registry;
pub mod types;

// Re-export commonly used types for convenience
pub use bind::{BindOutput, Binding, BindingSession, DocumentBinder, FieldKey};
pub use convert::{Property, PropertyType};
pub use document::{Document, OperationsDocument, ResourceIdentifier, ResourceObject};
pub use error::{status_code, BindError, ErrorKind, Result};
pub use registry::{
    Attr, ForeignKey, Identifiable, Relationship, Resource, ResourceGraph, ResourceRegistry,
    ResourceType,
};
pub use types::{BindConfig, KeyStyle, StructuredOptions};

/// Bind a single request body with the default configuration
pub fn bind_document(registry: &dyn ResourceRegistry, raw: &str) -> Result<Binding> {
    DocumentBinder::new(registry).bind(raw)
}
