//! Document binding
//!
//! [`DocumentBinder`] turns a request body into native entities:
//!
//! 1. the text is parsed into a generic tree,
//! 2. operations bodies are detected and passed through unresolved (when
//!    enabled in [`BindConfig`]),
//! 3. otherwise each primary resource object is materialized and its
//!    relationships resolved against the included pool.
//!
//! Binding is all-or-nothing: on error no entity and no session are returned.

pub mod materialize;
pub mod relationships;
pub mod session;

pub use session::{BindingSession, FieldKey};

use crate::convert;
use crate::document::{
    self, Envelope, OperationsDocument, PrimaryData, ResourceIdentifier, ResourceObject,
};
use crate::error::{BindError, Result};
use crate::registry::{Resource, ResourceRegistry};
use crate::types::BindConfig;
use tracing::debug;

/// Read-only inputs shared by every step of one binding
pub(crate) struct BindContext<'a> {
    pub registry: &'a dyn ResourceRegistry,
    pub config: &'a BindConfig,
}

/// What a request body bound to
#[derive(Debug)]
pub enum BindOutput {
    Entity(Box<dyn Resource>),
    Entities(Vec<Box<dyn Resource>>),
    Operations(OperationsDocument),
}

impl BindOutput {
    pub fn into_entity(self) -> Option<Box<dyn Resource>> {
        match self {
            BindOutput::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn into_entities(self) -> Option<Vec<Box<dyn Resource>>> {
        match self {
            BindOutput::Entities(entities) => Some(entities),
            _ => None,
        }
    }

    pub fn into_operations(self) -> Option<OperationsDocument> {
        match self {
            BindOutput::Operations(operations) => Some(operations),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            BindOutput::Entity(_) => "single resource",
            BindOutput::Entities(_) => "resource list",
            BindOutput::Operations(_) => "operations document",
        }
    }
}

/// Result of binding one document
#[derive(Debug)]
pub struct Binding {
    pub output: BindOutput,
    pub session: BindingSession,
}

/// Binds request bodies against a resource registry
pub struct DocumentBinder<'r> {
    registry: &'r dyn ResourceRegistry,
    config: BindConfig,
}

impl<'r> DocumentBinder<'r> {
    pub fn new(registry: &'r dyn ResourceRegistry) -> Self {
        Self::with_config(registry, BindConfig::default())
    }

    pub fn with_config(registry: &'r dyn ResourceRegistry, config: BindConfig) -> Self {
        DocumentBinder { registry, config }
    }

    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    fn context(&self) -> BindContext<'_> {
        BindContext {
            registry: self.registry,
            config: &self.config,
        }
    }

    /// Bind a request body into one entity, a list of entities, or a
    /// pass-through operations document
    pub fn bind(&self, raw: &str) -> Result<Binding> {
        let span = tracing::debug_span!("bind", bytes = raw.len());
        let _guard = span.enter();

        let mut session = BindingSession::new();

        let document = match document::parse_envelope(raw, self.config.enable_operations)? {
            Envelope::Operations(operations) => {
                session.mark_bulk_operation();
                debug!(count = operations.operations.len(), "passing operations request through");
                return Ok(Binding {
                    output: BindOutput::Operations(operations),
                    session,
                });
            }
            Envelope::Document(document) => document,
        };

        session.set_document_meta(document.meta.clone());

        let ctx = self.context();
        let included = document.included();

        let output = match &document.data {
            None => return Err(missing_primary_data()),
            Some(PrimaryData::One(data)) => {
                BindOutput::Entity(materialize::resource_to_entity(&ctx, &mut session, data, included)?)
            }
            Some(PrimaryData::Many(items)) => {
                BindOutput::Entities(bind_each(&ctx, &mut session, items, included)?)
            }
        };

        Ok(Binding { output, session })
    }

    /// Bind a single-resource document straight into its native type
    pub fn bind_as<T: Resource>(&self, raw: &str) -> Result<(T, BindingSession)> {
        let Binding { output, session } = self.bind(raw)?;

        match output {
            BindOutput::Entity(entity) => Ok((convert::downcast::<T>(entity)?, session)),
            other => Err(BindError::TypeConversionFailed {
                raw: other.describe().to_string(),
                target: std::any::type_name::<T>().to_string(),
                source: None,
            }),
        }
    }

    /// Bind a resource-array document, keeping input order
    pub fn bind_list(&self, raw: &str) -> Result<(Vec<Box<dyn Resource>>, BindingSession)> {
        let tree = document::parse_tree(raw)?;
        let document = document::parse::lift(tree)?;

        let mut session = BindingSession::new();
        session.set_document_meta(document.meta.clone());

        let items = match &document.data {
            None => return Err(missing_primary_data()),
            Some(PrimaryData::One(_)) => {
                return Err(BindError::malformed("expected an array of resource objects"))
            }
            Some(PrimaryData::Many(items)) => items,
        };

        let entities = bind_each(&self.context(), &mut session, items, document.included())?;
        Ok((entities, session))
    }

    /// Parse a relationship endpoint body into resource identifiers
    pub fn bind_relationship(&self, raw: &str) -> Result<Vec<ResourceIdentifier>> {
        document::parse_relationship_body(raw)
    }

    /// Materialize one resource object against an existing session.
    ///
    /// `session` only changes when the whole resource binds.
    pub fn resource_to_entity(
        &self,
        session: &mut BindingSession,
        data: &ResourceObject,
        included: &[ResourceObject],
    ) -> Result<Box<dyn Resource>> {
        let mut scratch = BindingSession::new();
        let entity = materialize::resource_to_entity(&self.context(), &mut scratch, data, included)?;
        session.absorb(scratch);
        Ok(entity)
    }
}

fn bind_each(
    ctx: &BindContext<'_>,
    session: &mut BindingSession,
    items: &[ResourceObject],
    included: &[ResourceObject],
) -> Result<Vec<Box<dyn Resource>>> {
    items
        .iter()
        .map(|data| materialize::resource_to_entity(ctx, session, data, included))
        .collect()
}

fn missing_primary_data() -> BindError {
    BindError::UnprocessableDocument("missing primary data".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Attr, Identifiable, ResourceGraph, ResourceType};
    use crate::ErrorKind;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Note {
        id: String,
        body: String,
        pinned: bool,
    }

    impl Identifiable for Note {
        fn string_id(&self) -> Option<String> {
            Some(self.id.clone())
        }

        fn set_string_id(&mut self, id: &str) {
            self.id = id.to_string();
        }
    }

    fn graph() -> ResourceGraph {
        ResourceGraph::new().with(
            ResourceType::new::<Note>("notes")
                .attribute(Attr::new("body", |n: &mut Note, v: String| n.body = v))
                .attribute(Attr::new("pinned", |n: &mut Note, v: bool| n.pinned = v)),
        )
    }

    #[test]
    fn test_bind_single() {
        let graph = graph();
        let binder = DocumentBinder::new(&graph);

        let (note, session) = binder
            .bind_as::<Note>(r#"{"data": {"type": "notes", "id": "3", "attributes": {"body": "hello"}}}"#)
            .unwrap();

        assert_eq!(note.id, "3");
        assert_eq!(note.body, "hello");
        assert!(!note.pinned);
        assert_eq!(session.request_entity(), Some("notes"));
        assert!(session.attribute("notes", "pinned").is_none());
    }

    #[test]
    fn test_missing_primary_data() {
        let graph = graph();
        let binder = DocumentBinder::new(&graph);

        for body in [r#"{"data": null}"#, r#"{"meta": {"a": 1}}"#] {
            let err = binder.bind(body).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnprocessableDocument);
            assert_eq!(err.status(), 422);
        }
    }

    #[test]
    fn test_bind_list_rejects_single_resource() {
        let graph = graph();
        let binder = DocumentBinder::new(&graph);

        let err = binder
            .bind_list(r#"{"data": {"type": "notes", "id": "1"}}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
    }

    #[test]
    fn test_bind_as_wrong_shape() {
        let graph = graph();
        let binder = DocumentBinder::new(&graph);

        let err = binder
            .bind_as::<Note>(r#"{"data": [{"type": "notes", "id": "1"}]}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeConversionFailed);
    }

    #[test]
    fn test_operations_pass_through() {
        let graph = graph();
        let binder = DocumentBinder::with_config(&graph, BindConfig::default().with_operations());

        let binding = binder
            .bind(r#"{"operations": [{"op": "add", "data": {"type": "notes"}}]}"#)
            .unwrap();

        assert!(binding.session.is_bulk_operation_request());
        let operations = binding.output.into_operations().unwrap();
        assert_eq!(operations.operations.len(), 1);
    }

    #[test]
    fn test_document_meta_recorded() {
        let graph = graph();
        let binder = DocumentBinder::new(&graph);

        let binding = binder
            .bind(r#"{"data": {"type": "notes"}, "meta": {"requestId": "abc"}}"#)
            .unwrap();

        assert_eq!(binding.session.document_meta().unwrap()["requestId"], "abc");
    }

    #[test]
    fn test_resource_to_entity_leaves_session_untouched_on_failure() {
        let graph = graph();
        let binder = DocumentBinder::new(&graph);
        let mut session = BindingSession::new();

        let bad: ResourceObject = serde_json::from_value(serde_json::json!({
            "type": "notes",
            "id": "1",
            "attributes": {"body": "kept?", "pinned": "maybe"}
        }))
        .unwrap();
        let err = binder.resource_to_entity(&mut session, &bad, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeConversionFailed);
        assert!(session.request_entity().is_none());
        assert!(session.attributes_to_update().is_empty());

        let good: ResourceObject = serde_json::from_value(serde_json::json!({
            "type": "notes",
            "id": "2",
            "attributes": {"body": "hello"}
        }))
        .unwrap();
        binder.resource_to_entity(&mut session, &good, &[]).unwrap();
        assert_eq!(session.request_entity(), Some("notes"));
        assert_eq!(session.attribute("notes", "body").unwrap(), "hello");
    }
}
