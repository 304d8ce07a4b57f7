//! Provisioning log
//!
//! One entry per entity and per attribute, in the order they were
//! attempted, so an operator sees the whole pass rather than the first
//! failure.

use serde::{Deserialize, Serialize};
use std::fmt;

const SKIPPED: &str = "skipped: ";

/// Outcome of one provisioning step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionStep {
    /// What was attempted, e.g. `entity acme_batch`
    pub step: String,
    /// Whether it succeeded
    pub ok: bool,
    /// Detail or diagnostic text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProvisionStep {
    /// Successful step
    #[must_use]
    pub fn ok(step: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            ok: true,
            detail: Some(detail.into()),
        }
    }

    /// Failed step
    #[must_use]
    pub fn failed(step: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            ok: false,
            detail: Some(detail.into()),
        }
    }

    /// Step not attempted because a prerequisite failed
    #[must_use]
    pub fn skipped(step: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::failed(step, format!("{SKIPPED}{reason}"))
    }

    /// Whether the step was skipped rather than attempted
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        !self.ok && self.detail.as_deref().is_some_and(|d| d.starts_with(SKIPPED))
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.ok { "ok" } else { "FAILED" };
        match &self.detail {
            Some(detail) => write!(f, "[{mark}] {}: {detail}", self.step),
            None => write!(f, "[{mark}] {}", self.step),
        }
    }
}

/// Step name for an entity
#[must_use]
pub fn entity_step(entity: &str) -> String {
    format!("entity {entity}")
}

/// Step name for an attribute
#[must_use]
pub fn attribute_step(entity: &str, attribute: &str) -> String {
    format!("attribute {entity}.{attribute}")
}

/// Ordered record of a provisioning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvisioningLog {
    steps: Vec<ProvisionStep>,
}

impl ProvisioningLog {
    /// Create empty log
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append step and emit it as a tracing event
    pub fn push(&mut self, step: ProvisionStep) {
        if step.ok {
            tracing::info!(
                step = %step.step,
                detail = step.detail.as_deref().unwrap_or(""),
                "provisioned"
            );
        } else {
            tracing::warn!(
                step = %step.step,
                detail = step.detail.as_deref().unwrap_or(""),
                "provisioning step failed"
            );
        }
        self.steps.push(step);
    }

    /// Steps in order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[ProvisionStep] {
        &self.steps
    }

    /// Whether every step succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.ok)
    }

    /// Failed and skipped steps
    pub fn failures(&self) -> impl Iterator<Item = &ProvisionStep> {
        self.steps.iter().filter(|s| !s.ok)
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no step was recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append all steps of another log
    pub fn extend(&mut self, other: ProvisioningLog) {
        self.steps.extend(other.steps);
    }
}

impl fmt::Display for ProvisioningLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{step}")?;
        }
        Ok(())
    }
}

impl IntoIterator for ProvisioningLog {
    type Item = ProvisionStep;
    type IntoIter = std::vec::IntoIter<ProvisionStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl<'a> IntoIterator for &'a ProvisioningLog {
    type Item = &'a ProvisionStep;
    type IntoIter = std::slice::Iter<'a, ProvisionStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
