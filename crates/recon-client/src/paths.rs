//! Relative paths of the store's metadata and data surfaces
//!
//! All paths are relative to [`StoreConfig::api_root`](crate::StoreConfig::api_root).

/// Entity-definition collection
pub const ENTITY_DEFINITIONS: &str = "EntityDefinitions";

/// Unbound create-entity action
pub const CREATE_ENTITY_ACTION: &str = "CreateEntity";

/// Same action under its namespace-qualified path
pub const CREATE_ENTITY_ACTION_QUALIFIED: &str = "Microsoft.Dynamics.CRM.CreateEntity";

/// Quote a value as an OData string literal
#[must_use]
pub fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Describe one entity by logical name
#[must_use]
pub fn entity_definition(logical_name: &str) -> String {
    format!(
        "{ENTITY_DEFINITIONS}(LogicalName={})?$select=LogicalName,EntitySetName,MetadataId",
        literal(logical_name)
    )
}

/// Entities whose logical name ends with `suffix`
#[must_use]
pub fn entities_ending_with(suffix: &str) -> String {
    format!(
        "{ENTITY_DEFINITIONS}?$select=LogicalName,EntitySetName&$filter=endswith(LogicalName,{})",
        literal(suffix)
    )
}

/// Describe one attribute of an entity
#[must_use]
pub fn attribute_definition(entity: &str, attribute: &str) -> String {
    format!(
        "{ENTITY_DEFINITIONS}(LogicalName={})/Attributes(LogicalName={})?$select=LogicalName,AttributeType",
        literal(entity),
        literal(attribute)
    )
}

/// List the logical names of an entity's attributes
#[must_use]
pub fn attribute_names(entity: &str) -> String {
    format!(
        "{ENTITY_DEFINITIONS}(LogicalName={})/Attributes?$select=LogicalName",
        literal(entity)
    )
}

/// Attribute collection of an entity, the target for attribute creation
#[must_use]
pub fn attribute_collection(entity: &str) -> String {
    format!("{ENTITY_DEFINITIONS}(LogicalName={})/Attributes", literal(entity))
}

/// One record of a collection
#[must_use]
pub fn record(collection_id: &str, id: &str) -> String {
    format!("{collection_id}({id})")
}

/// Bind reference to a record, used as a lookup value
#[must_use]
pub fn bind_reference(collection_id: &str, id: &str) -> String {
    format!("/{}", record(collection_id, id))
}
