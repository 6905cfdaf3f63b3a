//! Statically-typed resource descriptors
//!
//! A [`ResourceType`] is the binder's whole view of a native type: its public
//! name, a constructor, and typed setter closures for every attribute, foreign
//! key and relationship. Setters are built from ordinary Rust closures, so the
//! binder never needs reflection.

use super::resource::{new_boxed, Factory, Resource};
use crate::convert::{self, Property, PropertyType};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

type ValueSetter = Arc<dyn Fn(&mut dyn Resource, &Value) -> Result<()> + Send + Sync>;
type OneSetter = Arc<dyn Fn(&mut dyn Resource, Box<dyn Resource>) -> Result<()> + Send + Sync>;
type ManySetter = Arc<dyn Fn(&mut dyn Resource, Vec<Box<dyn Resource>>) -> Result<()> + Send + Sync>;

/// `null` decodes to `None` for optional properties and resets every other
/// property to its default.
fn value_setter<E, T, F>(set: F) -> ValueSetter
where
    E: Resource,
    T: DeserializeOwned + Default + 'static,
    F: Fn(&mut E, T) + Send + Sync + 'static,
{
    Arc::new(move |entity: &mut dyn Resource, value: &Value| {
        let typed: T = if value.is_null() {
            convert::decode_into(value).unwrap_or_default()
        } else {
            convert::decode_into(value)?
        };
        set(convert::downcast_mut::<E>(entity)?, typed);
        Ok(())
    })
}

/// A public attribute backed by a native property
#[derive(Clone)]
pub struct Attr {
    public_name: String,
    property_type: PropertyType,
    immutable: bool,
    set: ValueSetter,
}

impl Attr {
    /// Attribute whose property type follows from the setter's value type
    pub fn new<E, T, F>(public_name: impl Into<String>, set: F) -> Self
    where
        E: Resource,
        T: Property + Default + 'static,
        F: Fn(&mut E, T) + Send + Sync + 'static,
    {
        Self::with_type(public_name, T::property_type(), set)
    }

    /// Attribute with an explicit property type, for enums and nested structs
    pub fn with_type<E, T, F>(public_name: impl Into<String>, property_type: PropertyType, set: F) -> Self
    where
        E: Resource,
        T: DeserializeOwned + Default + 'static,
        F: Fn(&mut E, T) + Send + Sync + 'static,
    {
        Attr {
            public_name: public_name.into(),
            property_type,
            immutable: false,
            set: value_setter(set),
        }
    }

    /// Immutable attributes are still assigned but never reported as pending updates
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn public_name(&self) -> &str {
        &self.public_name
    }

    pub fn property_type(&self) -> &PropertyType {
        &self.property_type
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    pub(crate) fn assign(&self, entity: &mut dyn Resource, value: &Value) -> Result<()> {
        (self.set)(entity, value)
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attr")
            .field("public_name", &self.public_name)
            .field("property_type", &self.property_type)
            .field("immutable", &self.immutable)
            .finish_non_exhaustive()
    }
}

/// Scalar property holding the id of a has-one related resource
#[derive(Clone)]
pub struct ForeignKey {
    property_name: String,
    property_type: PropertyType,
    set: ValueSetter,
}

impl ForeignKey {
    pub fn new<E, T, F>(property_name: impl Into<String>, set: F) -> Self
    where
        E: Resource,
        T: Property + Default + 'static,
        F: Fn(&mut E, T) + Send + Sync + 'static,
    {
        ForeignKey {
            property_name: property_name.into(),
            property_type: T::property_type(),
            set: value_setter(set),
        }
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn property_type(&self) -> &PropertyType {
        &self.property_type
    }

    pub(crate) fn assign(&self, entity: &mut dyn Resource, value: &Value) -> Result<()> {
        (self.set)(entity, value)
    }
}

impl fmt::Debug for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignKey")
            .field("property_name", &self.property_name)
            .field("property_type", &self.property_type)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
enum Navigation {
    HasOne { foreign_key: String, set: OneSetter },
    HasMany { set: ManySetter },
}

/// A has-one or has-many relationship to another registered type
#[derive(Clone)]
pub struct Relationship {
    public_name: String,
    target: TypeId,
    target_name: &'static str,
    new_target: Factory,
    navigation: Navigation,
}

impl Relationship {
    /// Has-one relationship. The foreign key defaults to `<public_name>_id`
    /// in snake case.
    pub fn has_one<E, T, F>(public_name: impl Into<String>, set: F) -> Self
    where
        E: Resource,
        T: Resource + Default,
        F: Fn(&mut E, T) + Send + Sync + 'static,
    {
        let public_name = public_name.into();
        let foreign_key = format!("{}_id", convert::to_snake_case(&public_name));

        let set: OneSetter = Arc::new(move |entity: &mut dyn Resource, related: Box<dyn Resource>| {
            let related = convert::downcast::<T>(related)?;
            set(convert::downcast_mut::<E>(entity)?, related);
            Ok(())
        });

        Relationship {
            public_name,
            target: TypeId::of::<T>(),
            target_name: std::any::type_name::<T>(),
            new_target: new_boxed::<T>,
            navigation: Navigation::HasOne { foreign_key, set },
        }
    }

    /// Has-many relationship assigned as any collection of the target type
    pub fn has_many<E, C, F>(public_name: impl Into<String>, set: F) -> Self
    where
        E: Resource,
        C: IntoIterator + FromIterator<<C as IntoIterator>::Item> + 'static,
        <C as IntoIterator>::Item: Resource + Default,
        F: Fn(&mut E, C) + Send + Sync + 'static,
    {
        let set: ManySetter =
            Arc::new(move |entity: &mut dyn Resource, related: Vec<Box<dyn Resource>>| {
                let collection: C = convert::convert_collection(related)?;
                set(convert::downcast_mut::<E>(entity)?, collection);
                Ok(())
            });

        Relationship {
            public_name: public_name.into(),
            target: TypeId::of::<C::Item>(),
            target_name: std::any::type_name::<C::Item>(),
            new_target: new_boxed::<C::Item>,
            navigation: Navigation::HasMany { set },
        }
    }

    /// Override the foreign-key property name of a has-one relationship
    pub fn foreign_key(mut self, property_name: impl Into<String>) -> Self {
        if let Navigation::HasOne { foreign_key, .. } = &mut self.navigation {
            *foreign_key = property_name.into();
        }
        self
    }

    pub fn public_name(&self) -> &str {
        &self.public_name
    }

    pub fn is_has_one(&self) -> bool {
        matches!(self.navigation, Navigation::HasOne { .. })
    }

    /// Foreign-key property name; `None` for has-many
    pub fn foreign_key_name(&self) -> Option<&str> {
        match &self.navigation {
            Navigation::HasOne { foreign_key, .. } => Some(foreign_key),
            Navigation::HasMany { .. } => None,
        }
    }

    pub fn target(&self) -> TypeId {
        self.target
    }

    pub fn target_name(&self) -> &'static str {
        self.target_name
    }

    /// Fresh instance of the target type
    pub fn instantiate_target(&self) -> Box<dyn Resource> {
        (self.new_target)()
    }

    pub(crate) fn assign_one(&self, entity: &mut dyn Resource, related: Box<dyn Resource>) -> Result<()> {
        match &self.navigation {
            Navigation::HasOne { set, .. } => set(entity, related),
            Navigation::HasMany { .. } => Err(crate::error::BindError::malformed(format!(
                "relationship '{}' is has-many and expects a list of resource identifiers",
                self.public_name
            ))),
        }
    }

    pub(crate) fn assign_many(&self, entity: &mut dyn Resource, related: Vec<Box<dyn Resource>>) -> Result<()> {
        match &self.navigation {
            Navigation::HasMany { set } => set(entity, related),
            Navigation::HasOne { .. } => Err(crate::error::BindError::malformed(format!(
                "relationship '{}' is has-one and expects a single resource identifier",
                self.public_name
            ))),
        }
    }
}

impl fmt::Debug for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relationship")
            .field("public_name", &self.public_name)
            .field("has_one", &self.is_has_one())
            .field("foreign_key", &self.foreign_key_name())
            .field("target", &self.target_name)
            .finish_non_exhaustive()
    }
}

/// Descriptor of one registered resource type
#[derive(Clone)]
pub struct ResourceType {
    public_name: String,
    native: TypeId,
    native_name: &'static str,
    factory: Factory,
    attributes: Vec<Attr>,
    foreign_keys: Vec<ForeignKey>,
    relationships: Vec<Relationship>,
}

impl ResourceType {
    pub fn new<E: Resource + Default>(public_name: impl Into<String>) -> Self {
        ResourceType {
            public_name: public_name.into(),
            native: TypeId::of::<E>(),
            native_name: std::any::type_name::<E>(),
            factory: new_boxed::<E>,
            attributes: Vec::new(),
            foreign_keys: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn attribute(mut self, attr: Attr) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn public_name(&self) -> &str {
        &self.public_name
    }

    pub fn native(&self) -> TypeId {
        self.native
    }

    pub fn native_name(&self) -> &'static str {
        self.native_name
    }

    pub fn attributes(&self) -> &[Attr] {
        &self.attributes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn find_relationship(&self, public_name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.public_name == public_name)
    }

    pub fn find_foreign_key(&self, property_name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.property_name == property_name)
    }

    /// Zero-value instance of the native type
    pub fn instantiate(&self) -> Box<dyn Resource> {
        (self.factory)()
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceType")
            .field("public_name", &self.public_name)
            .field("native", &self.native_name)
            .field("attributes", &self.attributes)
            .field("foreign_keys", &self.foreign_keys)
            .field("relationships", &self.relationships)
            .finish()
    }
}
