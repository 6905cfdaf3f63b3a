//! Resource-type registry
//!
//! The binder consumes registered resource types through the read-only
//! [`ResourceRegistry`] lookup interface. [`ResourceGraph`] is a plain
//! in-memory implementation, built once at startup and shared freely across
//! binding sessions.

pub mod descriptor;
pub mod resource;

pub use descriptor::{Attr, ForeignKey, Relationship, ResourceType};
pub use resource::{Factory, Identifiable, Resource};

use std::any::TypeId;
use std::collections::HashMap;

/// Lookup of registered resource types
pub trait ResourceRegistry: Send + Sync {
    fn lookup_by_public_name(&self, name: &str) -> Option<&ResourceType>;

    fn lookup_by_native_type(&self, native: TypeId) -> Option<&ResourceType>;
}

/// In-memory registry keyed by public name and native type
#[derive(Debug, Default, Clone)]
pub struct ResourceGraph {
    types: Vec<ResourceType>,
    by_name: HashMap<String, usize>,
    by_native: HashMap<TypeId, usize>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource type, replacing any earlier registration with the
    /// same public name
    pub fn register(&mut self, resource_type: ResourceType) {
        let idx = match self.by_name.get(resource_type.public_name()) {
            Some(&idx) => {
                self.by_native.remove(&self.types[idx].native());
                self.types[idx] = resource_type;
                idx
            }
            None => {
                self.types.push(resource_type);
                self.types.len() - 1
            }
        };

        let registered = &self.types[idx];
        tracing::trace!(
            resource_type = registered.public_name(),
            native = registered.native_name(),
            "registered resource type"
        );
        self.by_name.insert(registered.public_name().to_string(), idx);
        self.by_native.insert(registered.native(), idx);
    }

    pub fn with(mut self, resource_type: ResourceType) -> Self {
        self.register(resource_type);
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceType> {
        self.types.iter()
    }
}

impl ResourceRegistry for ResourceGraph {
    fn lookup_by_public_name(&self, name: &str) -> Option<&ResourceType> {
        self.by_name.get(name).map(|&idx| &self.types[idx])
    }

    fn lookup_by_native_type(&self, native: TypeId) -> Option<&ResourceType> {
        self.by_native.get(&native).map(|&idx| &self.types[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Person {
        id: String,
        name: String,
    }

    impl Identifiable for Person {
        fn string_id(&self) -> Option<String> {
            Some(self.id.clone())
        }

        fn set_string_id(&mut self, id: &str) {
            self.id = id.to_string();
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Team {
        id: String,
    }

    impl Identifiable for Team {
        fn string_id(&self) -> Option<String> {
            Some(self.id.clone())
        }

        fn set_string_id(&mut self, id: &str) {
            self.id = id.to_string();
        }
    }

    fn people() -> ResourceType {
        ResourceType::new::<Person>("people")
            .attribute(Attr::new("name", |p: &mut Person, v: String| p.name = v))
    }

    #[test]
    fn test_lookup_by_name_and_native_type() {
        let graph = ResourceGraph::new().with(people());

        let by_name = graph.lookup_by_public_name("people").unwrap();
        assert_eq!(by_name.attributes().len(), 1);

        let by_native = graph.lookup_by_native_type(TypeId::of::<Person>()).unwrap();
        assert_eq!(by_native.public_name(), "people");

        assert!(graph.lookup_by_public_name("widgets").is_none());
        assert!(graph.lookup_by_native_type(TypeId::of::<Team>()).is_none());
    }

    #[test]
    fn test_reregistration_replaces() {
        let graph = ResourceGraph::new()
            .with(people())
            .with(ResourceType::new::<Team>("people"));

        assert_eq!(graph.len(), 1);
        assert!(graph.lookup_by_native_type(TypeId::of::<Person>()).is_none());
        assert!(graph.lookup_by_native_type(TypeId::of::<Team>()).is_some());
    }

    #[test]
    fn test_instantiate_gives_zero_value() {
        let graph = ResourceGraph::new().with(people());
        let entity = graph.lookup_by_public_name("people").unwrap().instantiate();

        let person = entity.downcast_ref::<Person>().unwrap();
        assert!(person.id.is_empty());
        assert!(person.name.is_empty());
    }
}
