//! Resource object to entity materialization

use super::relationships;
use super::session::{BindingSession, FieldKey};
use super::BindContext;
use crate::convert::{convert_scalar, convert_structured, PropertyType};
use crate::document::ResourceObject;
use crate::error::{BindError, Result};
use crate::registry::{Resource, ResourceType};
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Produce one instantiated, populated entity from a resource object
pub(crate) fn resource_to_entity(
    ctx: &BindContext<'_>,
    session: &mut BindingSession,
    data: &ResourceObject,
    included: &[ResourceObject],
) -> Result<Box<dyn Resource>> {
    let resource_type = ctx
        .registry
        .lookup_by_public_name(&data.type_name)
        .ok_or_else(|| BindError::unregistered(&data.type_name))?;

    session.set_request_entity(resource_type.public_name());

    let mut entity = resource_type.instantiate();

    set_attributes(ctx, session, entity.as_mut(), resource_type, data.attributes.as_ref())?;
    relationships::set_relationships(
        ctx,
        session,
        entity.as_mut(),
        resource_type,
        data.relationships.as_ref(),
        included,
    )?;

    if let Some(id) = &data.id {
        entity.set_string_id(id);
    }

    debug!(
        resource_type = resource_type.public_name(),
        id = data.id.as_deref(),
        "materialized resource"
    );

    Ok(entity)
}

/// Assign every declared attribute present in `values`.
///
/// Attributes missing from the map, or a missing map, leave the entity's
/// fields at whatever value they already hold.
pub(crate) fn set_attributes(
    ctx: &BindContext<'_>,
    session: &mut BindingSession,
    entity: &mut dyn Resource,
    resource_type: &ResourceType,
    values: Option<&Map<String, Value>>,
) -> Result<()> {
    let Some(values) = values else {
        return Ok(());
    };

    for attr in resource_type.attributes() {
        let Some(raw) = values.get(attr.public_name()) else {
            continue;
        };

        let converted = convert_attr_value(ctx, raw, attr.property_type())?;
        attr.assign(entity, &converted)?;

        if attr.is_immutable() {
            trace!(attribute = attr.public_name(), "immutable attribute not tracked");
            continue;
        }

        session.record_attribute(
            FieldKey::new(resource_type.public_name(), attr.public_name()),
            converted,
        );
    }

    Ok(())
}

fn convert_attr_value(ctx: &BindContext<'_>, raw: &Value, target: &PropertyType) -> Result<Value> {
    match raw {
        Value::Object(_) | Value::Array(_) => Ok(convert_structured(raw, &ctx.config.structured)),
        _ => convert_scalar(raw, target),
    }
}
