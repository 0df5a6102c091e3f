//! Lesson configuration file.
//!
//! One YAML document describes a whole run: the plan, the voice, the pauses,
//! the backend and where the track is written.

use crate::audio::{AudioFormat, AudioSpec, ExportSettings};
use crate::plan::LessonPlan;
use crate::settings::{PauseSchedule, VoiceSettings};
use crate::tts::BackendConfig;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT: &str = "Unit_English_Rhythm.mp3";

/// Everything needed for one run, resolved before the first synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonConfig {
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub voice: VoiceSettings,
    #[serde(default)]
    pub pauses: PauseSchedule,
    #[serde(default)]
    pub audio: AudioSpec,
    #[serde(default)]
    pub export: ExportSettings,
    pub plan: LessonPlan,
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

impl LessonConfig {
    /// Config with defaults for everything but the plan.
    pub fn new(plan: LessonPlan) -> Self {
        Self {
            output: default_output(),
            backend: BackendConfig::default(),
            voice: VoiceSettings::default(),
            pauses: PauseSchedule::default(),
            audio: AudioSpec::default(),
            export: ExportSettings::default(),
            plan,
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: LessonConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file. A relative `output` is resolved
    /// against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read config: {}", e),
                ErrorContext::new()
                    .with_source("config_loader")
                    .with_details(path.display().to_string()),
            )
        })?;
        let mut config = Self::from_yaml_str(&text)?;
        if config.output.is_relative() {
            if let Some(dir) = path.parent() {
                config.output = dir.join(&config.output);
            }
        }
        Ok(config)
    }

    /// Replace the backend with the defaults for `kind`. Voice names are
    /// backend specific, so a configured name is dropped when the kind
    /// actually changes and the new backend's default voice applies.
    pub fn switch_backend(&mut self, kind: &str) -> Result<()> {
        let backend = BackendConfig::from_kind(kind)?;
        if backend.kind() != self.backend.kind() {
            self.backend = backend;
            self.voice.name = None;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.plan.validate()?;
        self.voice.validate()?;
        if self.audio.sample_rate == 0 {
            return Err(Error::validation_with_context(
                "sample rate must be positive",
                ErrorContext::new().with_field_path("audio.sample_rate"),
            ));
        }
        if !(1..=8).contains(&self.audio.channels) {
            return Err(Error::validation_with_context(
                "unsupported channel count",
                ErrorContext::new()
                    .with_field_path("audio.channels")
                    .with_details(format!("expected 1..=8, got {}", self.audio.channels)),
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(Error::validation_with_context(
                "output path is empty",
                ErrorContext::new().with_field_path("output"),
            ));
        }
        if AudioFormat::from_path(&self.output).is_none() {
            return Err(Error::validation_with_context(
                "unsupported output extension",
                ErrorContext::new()
                    .with_field_path("output")
                    .with_details(format!("{} (expected .mp3 or .wav)", self.output.display())),
            ));
        }
        Ok(())
    }
}
