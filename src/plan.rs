//! Lesson plans: ordered units, each holding ordered phrases.

use crate::{Error, ErrorContext, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping from unit name to the phrases taught in that unit.
///
/// Insertion order is playback order. A unit may have no phrases, in which
/// case only its name and the unit-level pauses are rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonPlan {
    units: IndexMap<String, Vec<String>>,
}

impl LessonPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style unit insertion. Re-adding an existing name replaces its
    /// phrases but keeps the original position.
    pub fn with_unit<I, S>(mut self, name: impl Into<String>, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.units
            .insert(name.into(), phrases.into_iter().map(Into::into).collect());
        self
    }

    pub fn units(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.units.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn phrase_count(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }

    /// Number of synthesis calls a run performs: one per unit name plus one
    /// per phrase (each phrase's second repetition reuses the first).
    pub fn synthesis_calls(&self) -> usize {
        self.unit_count() + self.phrase_count()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Reject plans that would send blank text to a backend.
    pub fn validate(&self) -> Result<()> {
        if self.units.is_empty() {
            return Err(Error::validation_with_context(
                "lesson plan has no units",
                ErrorContext::new().with_field_path("plan"),
            ));
        }
        for (unit, phrases) in &self.units {
            if unit.trim().is_empty() {
                return Err(Error::validation_with_context(
                    "unit name is blank",
                    ErrorContext::new().with_field_path("plan"),
                ));
            }
            if let Some(idx) = phrases.iter().position(|p| p.trim().is_empty()) {
                return Err(Error::validation_with_context(
                    "phrase is blank",
                    ErrorContext::new().with_field_path(format!("plan.{}[{}]", unit, idx)),
                ));
            }
        }
        Ok(())
    }
}

impl<K, V, S> FromIterator<(K, V)> for LessonPlan
where
    K: Into<String>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(LessonPlan::new(), |plan, (name, phrases)| plan.with_unit(name, phrases))
    }
}
