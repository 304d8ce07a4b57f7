//! The acknowledgement application's schema
//!
//! Businesses publish batches of documents that recipients acknowledge.
//! Every name is built from the deployment's publisher prefix, so the same
//! definitions serve any installation.

use recon_catalog::{AttributeKind, AttributeSpec, Catalog, DateTimeBehavior, EntitySpec};
use recon_resolve::{FieldQuery, RoleBinding, RoleBindings};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Publisher prefix used when none is configured
pub const DEFAULT_PREFIX: &str = "acme";

/// Role of business records
pub const BUSINESSES: &str = "businesses";
/// Role of batch records
pub const BATCHES: &str = "batches";
/// Role of document records
pub const DOCUMENTS: &str = "documents";
/// Role of recipient records
pub const RECIPIENTS: &str = "recipients";

fn name(prefix: &str, suffix: &str) -> String {
    format!("{prefix}_{suffix}")
}

fn business(prefix: &str) -> EntitySpec {
    EntitySpec::new(name(prefix, "business"), "Business", "Businesses", name(prefix, "name"))
        .with_description("Organisation publishing documents")
        .with_attribute(AttributeSpec::new(
            name(prefix, "email"),
            "Email",
            AttributeKind::string(100),
        ))
        .with_attribute(AttributeSpec::new(
            name(prefix, "website"),
            "Website",
            AttributeKind::url(200),
        ))
}

fn batch(prefix: &str) -> EntitySpec {
    EntitySpec::new(name(prefix, "batch"), "Batch", "Batches", name(prefix, "name"))
        .with_description("Documents sent out together for acknowledgement")
        .with_attribute(AttributeSpec::new(
            name(prefix, "business"),
            "Business",
            AttributeKind::lookup(name(prefix, "business")),
        ))
        .with_attribute(AttributeSpec::new(
            name(prefix, "duedate"),
            "Due Date",
            AttributeKind::DateOnly,
        ))
        .with_attribute(AttributeSpec::new(
            name(prefix, "description"),
            "Description",
            AttributeKind::string(2000),
        ))
}

fn document(prefix: &str) -> EntitySpec {
    EntitySpec::new(name(prefix, "document"), "Document", "Documents", name(prefix, "name"))
        .with_attribute(AttributeSpec::new(
            name(prefix, "batch"),
            "Batch",
            AttributeKind::lookup(name(prefix, "batch")),
        ))
        .with_attribute(AttributeSpec::new(
            name(prefix, "documenturl"),
            "Document Url",
            AttributeKind::url(1000),
        ))
        .with_attribute(AttributeSpec::new(
            name(prefix, "version"),
            "Version",
            AttributeKind::integer_between(1, 10_000),
        ))
}

fn recipient(prefix: &str) -> EntitySpec {
    EntitySpec::new(name(prefix, "recipient"), "Recipient", "Recipients", name(prefix, "name"))
        .with_attribute(AttributeSpec::new(
            name(prefix, "batch"),
            "Batch",
            AttributeKind::lookup(name(prefix, "batch")),
        ))
        .with_attribute(AttributeSpec::new(
            name(prefix, "email"),
            "Email",
            AttributeKind::string(100),
        ))
        .with_attribute(AttributeSpec::new(
            name(prefix, "primarygroup"),
            "Primary Group",
            AttributeKind::string(100),
        ))
        .with_attribute(AttributeSpec::new(
            name(prefix, "acknowledged"),
            "Acknowledged",
            AttributeKind::Boolean,
        ))
        .with_attribute(AttributeSpec::new(
            name(prefix, "acknowledgedon"),
            "Acknowledged On",
            AttributeKind::DateTime {
                behavior: DateTimeBehavior::UserLocal,
            },
        ))
}

/// Entities the application needs, in declaration order
#[must_use]
pub fn app_catalog(prefix: &str) -> Catalog {
    Catalog::new()
        .with_entity(business(prefix))
        .with_entity(batch(prefix))
        .with_entity(document(prefix))
        .with_entity(recipient(prefix))
}

/// Bindings for the four application roles
///
/// Fallbacks point at the collections [`app_catalog`] would create.
#[must_use]
pub fn default_bindings(prefix: &str) -> RoleBindings {
    let bind = |role: &str, suffixes: &[&str], entity: EntitySpec| {
        RoleBinding::new(role, suffixes.iter().copied(), entity.conventional_collection())
            .with_default_entity(entity.logical_name)
    };
    RoleBindings::new()
        .with_binding(bind(BUSINESSES, &["business"], business(prefix)))
        .with_binding(bind(BATCHES, &["batch"], batch(prefix)))
        .with_binding(bind(DOCUMENTS, &["batchdocument", "document"], document(prefix)))
        .with_binding(bind(RECIPIENTS, &["batchrecipient", "recipient"], recipient(prefix)))
}

/// Semantic field roles the application writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    /// Primary display text
    Title,
    /// Contact email
    Email,
    /// Recipient's group or department
    PrimaryGroup,
    /// Acknowledgement deadline
    DueDate,
    /// Link to the document content
    DocumentUrl,
    /// Acknowledgement flag
    Acknowledged,
    /// Lookup to the batch
    Batch,
    /// Lookup to the business
    Business,
}

impl FieldRole {
    /// All roles
    pub const ALL: [Self; 8] = [
        Self::Title,
        Self::Email,
        Self::PrimaryGroup,
        Self::DueDate,
        Self::DocumentUrl,
        Self::Acknowledged,
        Self::Batch,
        Self::Business,
    ];

    /// Short name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Email => "email",
            Self::PrimaryGroup => "primary_group",
            Self::DueDate => "due_date",
            Self::DocumentUrl => "document_url",
            Self::Acknowledged => "acknowledged",
            Self::Batch => "batch",
            Self::Business => "business",
        }
    }

    /// Role by short name
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == text)
    }

    /// Attribute query for this role under a publisher prefix
    #[must_use]
    pub fn query(self, prefix: &str) -> FieldQuery {
        let p = |suffix: &str| name(prefix, suffix);
        match self {
            Self::Title => FieldQuery::new()
                .with_preferred(p("name"))
                .with_candidates([p("title"), "name".to_string(), "title".to_string()])
                .with_substrings(["name", "title"]),
            Self::Email => FieldQuery::new()
                .with_preferred(p("email"))
                .with_candidates([p("emailaddress"), "emailaddress1".to_string()])
                .with_substrings(["email", "mail"]),
            Self::PrimaryGroup => FieldQuery::new()
                .with_preferred(p("primarygroup"))
                .with_candidates([p("group"), p("department")])
                .with_substrings(["group", "department"]),
            Self::DueDate => FieldQuery::new()
                .with_preferred(p("duedate"))
                .with_candidates([p("deadline"), p("due")])
                .with_substrings(["due", "deadline"]),
            Self::DocumentUrl => FieldQuery::new()
                .with_preferred(p("documenturl"))
                .with_candidates([p("url"), p("fileurl"), p("link")])
                .with_substrings(["url", "link"]),
            Self::Acknowledged => FieldQuery::new()
                .with_preferred(p("acknowledged"))
                .with_candidates([p("isacknowledged"), p("ack")])
                .with_substrings(["acknowledged"]),
            Self::Batch => FieldQuery::new()
                .with_preferred(p("batch"))
                .with_candidates([p("batchid")])
                .with_substrings(["batch"]),
            Self::Business => FieldQuery::new()
                .with_preferred(p("business"))
                .with_candidates([p("businessid")])
                .with_substrings(["business"]),
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
