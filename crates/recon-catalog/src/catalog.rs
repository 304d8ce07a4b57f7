//! Ordered set of entity definitions

use crate::definition::EntitySpec;
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Entities to provision, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    entities: Vec<EntitySpec>,
}

impl Catalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entity
    #[inline]
    #[must_use]
    pub fn with_entity(mut self, entity: EntitySpec) -> Self {
        self.entities.push(entity);
        self
    }

    /// Entities in declaration order
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[EntitySpec] {
        &self.entities
    }

    /// Entity by logical name
    #[must_use]
    pub fn get(&self, logical_name: &str) -> Option<&EntitySpec> {
        self.entities.iter().find(|e| e.logical_name == logical_name)
    }

    /// Number of entities
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the catalog has no entities
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Check names are unique and non-empty
    ///
    /// # Errors
    /// - `CatalogError::Duplicate` for a repeated entity or attribute name
    /// - `CatalogError::Invalid` for an empty name or zero-length text field
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut entities = HashSet::new();
        for entity in &self.entities {
            if entity.logical_name.is_empty() || entity.primary_attribute.is_empty() {
                return Err(CatalogError::invalid(
                    &entity.logical_name,
                    "logical name and primary attribute are required",
                ));
            }
            if !entities.insert(entity.logical_name.as_str()) {
                return Err(CatalogError::duplicate_entity(&entity.logical_name));
            }

            let mut attributes = HashSet::new();
            attributes.insert(entity.primary_attribute.as_str());
            for attribute in &entity.attributes {
                if attribute.logical_name.is_empty() {
                    return Err(CatalogError::invalid(&entity.logical_name, "empty attribute name"));
                }
                if !attributes.insert(attribute.logical_name.as_str()) {
                    return Err(CatalogError::duplicate_attribute(format!(
                        "{}.{}",
                        entity.logical_name, attribute.logical_name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Entities ordered so lookup targets come before their referrers
    ///
    /// Declaration order is kept wherever dependencies allow. Targets
    /// outside the catalog are treated as pre-existing. Self-references
    /// impose no ordering.
    ///
    /// # Errors
    /// - Any error from [`Catalog::validate`]
    /// - `CatalogError::DependencyCycle` if lookups form a cycle
    pub fn dependency_order(&self) -> Result<Vec<&EntitySpec>, CatalogError> {
        self.validate()?;

        let mut placed: HashSet<&str> = HashSet::new();
        let mut ordered = Vec::with_capacity(self.entities.len());
        let mut remaining: Vec<&EntitySpec> = self.entities.iter().collect();

        while !remaining.is_empty() {
            let ready = remaining.iter().position(|entity| {
                entity.lookup_targets().all(|target| {
                    target == entity.logical_name
                        || placed.contains(target)
                        || self.get(target).is_none()
                })
            });

            match ready {
                Some(idx) => {
                    let entity = remaining.remove(idx);
                    placed.insert(entity.logical_name.as_str());
                    ordered.push(entity);
                }
                None => {
                    return Err(CatalogError::DependencyCycle(
                        remaining.iter().map(|e| e.logical_name.clone()).collect(),
                    ));
                }
            }
        }

        Ok(ordered)
    }
}

impl FromIterator<EntitySpec> for Catalog {
    fn from_iter<I: IntoIterator<Item = EntitySpec>>(iter: I) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}
