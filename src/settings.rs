//! Voice settings and pause schedule.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};

const RATIO_RANGE: std::ops::RangeInclusive<f32> = 0.5..=2.0;

/// Voice parameters shared read-only by every synthesis call of a run.
///
/// Ratios are backend-neutral: 1.0 is the voice's natural speed, volume and
/// pitch. Each backend maps them onto its own request fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Voice identity; `None` selects the backend default.
    #[serde(default, alias = "voice")]
    pub name: Option<String>,
    #[serde(default = "neutral")]
    pub speed: f32,
    #[serde(default = "neutral")]
    pub volume: f32,
    #[serde(default = "neutral")]
    pub pitch: f32,
}

fn neutral() -> f32 {
    1.0
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            name: None,
            speed: 1.0,
            volume: 1.0,
            pitch: 1.0,
        }
    }
}

impl VoiceSettings {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Voice name or the given backend default.
    pub fn name_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(default)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("voice.speed", self.speed),
            ("voice.volume", self.volume),
            ("voice.pitch", self.pitch),
        ] {
            if !RATIO_RANGE.contains(&value) {
                return Err(Error::validation_with_context(
                    "voice ratio out of range",
                    ErrorContext::new()
                        .with_field_path(field)
                        .with_details(format!("expected 0.5..=2.0, got {}", value)),
                ));
            }
        }
        if matches!(self.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(Error::validation_with_context(
                "voice name is blank",
                ErrorContext::new().with_field_path("voice.name"),
            ));
        }
        Ok(())
    }
}

/// Silence inserted around spoken items, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseSchedule {
    /// After each unit name.
    #[serde(default = "default_after_unit")]
    pub after_unit_ms: u64,
    /// Between the two repetitions of a phrase.
    #[serde(default = "default_between_repeat")]
    pub between_repeat_ms: u64,
    /// After the second repetition, leaving time to repeat aloud.
    #[serde(default = "default_after_word")]
    pub after_word_ms: u64,
    /// After the last phrase of a unit.
    #[serde(default = "default_between_units")]
    pub between_units_ms: u64,
}

fn default_after_unit() -> u64 {
    1500
}

fn default_between_repeat() -> u64 {
    1000
}

fn default_after_word() -> u64 {
    1000
}

fn default_between_units() -> u64 {
    1500
}

impl Default for PauseSchedule {
    fn default() -> Self {
        Self {
            after_unit_ms: default_after_unit(),
            between_repeat_ms: default_between_repeat(),
            after_word_ms: default_after_word(),
            between_units_ms: default_between_units(),
        }
    }
}

impl PauseSchedule {
    pub const fn new(
        after_unit_ms: u64,
        between_repeat_ms: u64,
        after_word_ms: u64,
        between_units_ms: u64,
    ) -> Self {
        Self {
            after_unit_ms,
            between_repeat_ms,
            after_word_ms,
            between_units_ms,
        }
    }

    /// Total silence a plan with `units` units and `phrases` phrases receives.
    pub fn total_silence_ms(&self, units: usize, phrases: usize) -> u64 {
        units as u64 * (self.after_unit_ms + self.between_units_ms)
            + phrases as u64 * (self.between_repeat_ms + self.after_word_ms)
    }
}
