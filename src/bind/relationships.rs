//! Has-one and has-many relationship resolution
//!
//! Every relationship declared on the resource type is considered once,
//! whether or not the payload mentions it. Related entities start as
//! placeholders carrying only their id and are enriched from the included
//! pool, one level deep.

use super::materialize;
use super::session::{BindingSession, FieldKey};
use super::BindContext;
use crate::convert::convert_scalar;
use crate::document::{self, Linkage, RelationshipData, ResourceIdentifier, ResourceObject};
use crate::error::{BindError, Result};
use crate::registry::{Relationship, Resource, ResourceType};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, trace};

pub(crate) fn set_relationships(
    ctx: &BindContext<'_>,
    session: &mut BindingSession,
    entity: &mut dyn Resource,
    resource_type: &ResourceType,
    relationships: Option<&BTreeMap<String, RelationshipData>>,
    included: &[ResourceObject],
) -> Result<()> {
    let Some(relationships) = relationships else {
        return Ok(());
    };
    if relationships.is_empty() {
        return Ok(());
    }

    if ctx.config.strict_relationships {
        if let Some(name) = relationships
            .keys()
            .find(|name| resource_type.find_relationship(name).is_none())
        {
            return Err(BindError::UnknownRelationship {
                resource_type: resource_type.public_name().to_string(),
                relationship: name.clone(),
            });
        }
    }

    for relationship in resource_type.relationships() {
        if relationship.is_has_one() {
            set_has_one(ctx, session, entity, resource_type, relationship, relationships, included)?;
        } else {
            set_has_many(ctx, session, entity, resource_type, relationship, relationships, included)?;
        }
    }

    Ok(())
}

fn set_has_one(
    ctx: &BindContext<'_>,
    session: &mut BindingSession,
    entity: &mut dyn Resource,
    resource_type: &ResourceType,
    relationship: &Relationship,
    relationships: &BTreeMap<String, RelationshipData>,
    included: &[ResourceObject],
) -> Result<()> {
    let name = relationship.public_name();
    let Some(data) = relationships.get(name) else {
        return Ok(());
    };

    // The name has to be declared by the type currently being bound
    let current = session
        .request_entity()
        .and_then(|current| ctx.registry.lookup_by_public_name(current))
        .unwrap_or(resource_type);
    if current.find_relationship(name).is_none() {
        return Err(BindError::UnknownRelationship {
            resource_type: current.public_name().to_string(),
            relationship: name.to_string(),
        });
    }

    let identifier = match &data.data {
        None => None,
        Some(Linkage::One(identifier)) => Some(identifier),
        Some(Linkage::Many(_)) => {
            return Err(BindError::malformed(format!(
                "relationship '{name}' is has-one and expects a single resource identifier"
            )))
        }
    };

    let foreign_key = relationship
        .foreign_key_name()
        .and_then(|property| resource_type.find_foreign_key(property));

    if foreign_key.is_none() && identifier.is_none() {
        return Ok(());
    }

    let key = FieldKey::new(resource_type.public_name(), name);

    if let Some(foreign_key) = foreign_key {
        if identifier.is_none() && !foreign_key.property_type().is_nullable() {
            return Err(BindError::InvalidNullRelationship {
                foreign_key: foreign_key.property_name().to_string(),
            });
        }

        let raw = identifier
            .and_then(|identifier| identifier.id.clone())
            .map_or(Value::Null, Value::String);
        let converted = convert_scalar(&raw, foreign_key.property_type())?;
        foreign_key.assign(entity, &converted)?;

        trace!(relationship = name, foreign_key = foreign_key.property_name(), value = %converted, "set foreign key");
        session.record_foreign_key(key.clone(), converted);
    }

    if let Some(identifier) = identifier.filter(|identifier| identifier.id.is_some()) {
        let related = resolve_related(ctx, session, identifier, included, relationship)?;
        relationship.assign_one(entity, related.clone())?;
        session.record_has_one(key, related);
    }

    Ok(())
}

fn set_has_many(
    ctx: &BindContext<'_>,
    session: &mut BindingSession,
    entity: &mut dyn Resource,
    resource_type: &ResourceType,
    relationship: &Relationship,
    relationships: &BTreeMap<String, RelationshipData>,
    included: &[ResourceObject],
) -> Result<()> {
    let name = relationship.public_name();
    let Some(data) = relationships.get(name) else {
        return Ok(());
    };

    let identifiers = match &data.data {
        None => return Ok(()),
        Some(Linkage::Many(identifiers)) => identifiers,
        Some(Linkage::One(_)) => {
            return Err(BindError::malformed(format!(
                "relationship '{name}' is has-many and expects a list of resource identifiers"
            )))
        }
    };

    // An empty list leaves the collection untouched, same as null
    if identifiers.is_empty() {
        trace!(relationship = name, "empty has-many linkage ignored");
        return Ok(());
    }

    let related = identifiers
        .iter()
        .map(|identifier| resolve_related(ctx, session, identifier, included, relationship))
        .collect::<Result<Vec<_>>>()?;

    relationship.assign_many(entity, related.clone())?;

    debug!(relationship = name, count = related.len(), "attached has-many resources");
    session.record_has_many(FieldKey::new(resource_type.public_name(), name), related);

    Ok(())
}

/// Related entity for one resource identifier.
///
/// Always returns at least a placeholder with the identifier's id. When the
/// included pool carries the matching resource object, its attributes are
/// applied; its own relationships are not followed.
pub(crate) fn resolve_related(
    ctx: &BindContext<'_>,
    session: &mut BindingSession,
    identifier: &ResourceIdentifier,
    included: &[ResourceObject],
    relationship: &Relationship,
) -> Result<Box<dyn Resource>> {
    let mut related = relationship.instantiate_target();
    if let Some(id) = &identifier.id {
        related.set_string_id(id);
    }

    if included.is_empty() {
        return Ok(related);
    }

    let Some(resource) = document::find_included(identifier, included)? else {
        return Ok(related);
    };

    let resource_type = ctx
        .registry
        .lookup_by_native_type(relationship.target())
        .ok_or_else(|| BindError::unregistered(&resource.type_name))?;

    materialize::set_attributes(ctx, session, related.as_mut(), resource_type, resource.attributes.as_ref())?;

    trace!(
        resource_type = resource_type.public_name(),
        id = identifier.id.as_deref(),
        "enriched related resource from included pool"
    );

    Ok(related)
}
