//! Metadata API payloads for entity and attribute creation
//!
//! Entity creation has several accepted shapes depending on the server
//! version; [`entity_strategies`] returns all of them in the order they
//! should be tried. Attribute payloads are shaped by [`AttributeKind`].

use crate::definition::{AttributeKind, AttributeSpec, EntitySpec};
use recon_client::paths;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const NS: &str = "Microsoft.Dynamics.CRM";

/// Label settings for created metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    /// Language code for localized labels
    pub language_code: u32,
}

impl Default for Labels {
    fn default() -> Self {
        Self { language_code: 1033 }
    }
}

impl Labels {
    /// Localized label object
    #[must_use]
    pub fn label(&self, text: &str) -> Value {
        json!({
            "@odata.type": format!("{NS}.Label"),
            "LocalizedLabels": [{
                "@odata.type": format!("{NS}.LocalizedLabel"),
                "Label": text,
                "LanguageCode": self.language_code,
            }],
        })
    }
}

/// One way of asking the server to create an entity
#[derive(Debug, Clone, PartialEq)]
pub struct CreationStrategy {
    /// Short name for logs
    pub name: &'static str,
    /// Relative POST path
    pub path: String,
    /// Request body
    pub body: Value,
}

/// Schema name for a logical name: publisher prefix kept, first letter after it upper-cased
///
/// Lower-casing the result yields the logical name again.
#[must_use]
pub fn schema_name(logical_name: &str) -> String {
    let (prefix, rest) = match logical_name.split_once('_') {
        Some((prefix, rest)) => (Some(prefix), rest),
        None => (None, logical_name),
    };

    let mut chars = rest.chars();
    let capitalised: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    match prefix {
        Some(prefix) => format!("{prefix}_{capitalised}"),
        None => capitalised,
    }
}

/// Requirement level for created attributes; existing rows may lack the field
fn optional_level() -> Value {
    json!({
        "Value": "None",
        "CanBeChanged": true,
        "ManagedPropertyLogicalName": "canmodifyrequirementlevelsettings",
    })
}

fn primary_attribute(entity: &EntitySpec, labels: &Labels) -> Value {
    json!({
        "@odata.type": format!("{NS}.StringAttributeMetadata"),
        "SchemaName": schema_name(&entity.primary_attribute),
        "IsPrimaryName": true,
        "MaxLength": entity.primary_max_length,
        "FormatName": { "Value": "Text" },
        "DisplayName": labels.label("Name"),
        "RequiredLevel": optional_level(),
    })
}

fn entity_metadata(entity: &EntitySpec, labels: &Labels) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("@odata.type".into(), json!(format!("{NS}.EntityMetadata")));
    body.insert("SchemaName".into(), json!(schema_name(&entity.logical_name)));
    body.insert("DisplayName".into(), labels.label(&entity.display_name));
    body.insert("DisplayCollectionName".into(), labels.label(&entity.display_plural));
    if let Some(description) = &entity.description {
        body.insert("Description".into(), labels.label(description));
    }
    body.insert("OwnershipType".into(), json!("UserOwned"));
    body.insert("IsActivity".into(), json!(false));
    body.insert("HasNotes".into(), json!(false));
    body.insert("HasActivities".into(), json!(false));
    body
}

/// Entity creation payloads in the order they should be tried
///
/// 1. create-entity action with the primary attribute supplied separately
/// 2. the same action under its namespace-qualified path
/// 3. POST to the entity-definition collection with the primary attribute nested
/// 4. POST to the entity-definition collection with only a primary-name hint
#[must_use]
pub fn entity_strategies(entity: &EntitySpec, labels: &Labels) -> Vec<CreationStrategy> {
    let metadata = entity_metadata(entity, labels);
    let primary = primary_attribute(entity, labels);

    let action_body = json!({
        "Entity": Value::Object(metadata.clone()),
        "PrimaryAttribute": primary.clone(),
    });

    let mut nested = metadata.clone();
    nested.insert("Attributes".into(), Value::Array(vec![primary]));

    let mut hinted = metadata;
    hinted.insert(
        "PrimaryNameAttribute".into(),
        json!(entity.primary_attribute),
    );

    vec![
        CreationStrategy {
            name: "create-entity action",
            path: paths::CREATE_ENTITY_ACTION.to_string(),
            body: action_body.clone(),
        },
        CreationStrategy {
            name: "qualified create-entity action",
            path: paths::CREATE_ENTITY_ACTION_QUALIFIED.to_string(),
            body: action_body,
        },
        CreationStrategy {
            name: "entity definitions with nested primary attribute",
            path: paths::ENTITY_DEFINITIONS.to_string(),
            body: Value::Object(nested),
        },
        CreationStrategy {
            name: "entity definitions with primary name hint",
            path: paths::ENTITY_DEFINITIONS.to_string(),
            body: Value::Object(hinted),
        },
    ]
}

/// Attribute creation payload shaped by kind
#[must_use]
pub fn attribute_payload(attribute: &AttributeSpec, labels: &Labels) -> Value {
    let mut body = Map::new();
    body.insert("SchemaName".into(), json!(schema_name(&attribute.logical_name)));
    body.insert("DisplayName".into(), labels.label(&attribute.label));
    body.insert("RequiredLevel".into(), optional_level());

    let (odata_type, extra) = match &attribute.kind {
        AttributeKind::String { max_length } => (
            "StringAttributeMetadata",
            json!({ "MaxLength": max_length, "FormatName": { "Value": "Text" } }),
        ),
        AttributeKind::Url { max_length } => (
            "StringAttributeMetadata",
            json!({ "MaxLength": max_length, "FormatName": { "Value": "Url" } }),
        ),
        AttributeKind::Integer { min, max } => (
            "IntegerAttributeMetadata",
            json!({ "MinValue": min, "MaxValue": max, "Format": "None" }),
        ),
        AttributeKind::Boolean => (
            "BooleanAttributeMetadata",
            json!({
                "DefaultValue": false,
                "OptionSet": {
                    "@odata.type": format!("{NS}.BooleanOptionSetMetadata"),
                    "OptionSetType": "Boolean",
                    "TrueOption": { "Value": 1, "Label": labels.label("Yes") },
                    "FalseOption": { "Value": 0, "Label": labels.label("No") },
                },
            }),
        ),
        AttributeKind::DateOnly => (
            "DateTimeAttributeMetadata",
            json!({ "Format": "DateOnly", "DateTimeBehavior": { "Value": "DateOnly" } }),
        ),
        AttributeKind::DateTime { behavior } => (
            "DateTimeAttributeMetadata",
            json!({
                "Format": "DateAndTime",
                "DateTimeBehavior": { "Value": behavior.metadata_value() },
            }),
        ),
        AttributeKind::Lookup { target } => (
            "LookupAttributeMetadata",
            json!({ "Targets": [target] }),
        ),
    };

    body.insert("@odata.type".into(), json!(format!("{NS}.{odata_type}")));
    if let Value::Object(extra) = extra {
        body.extend(extra);
    }
    Value::Object(body)
}
