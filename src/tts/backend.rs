//! Backend selection from configuration.

use super::Synthesizer;
use crate::audio::AudioFormat;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which synthesis backend to use, with its backend-specific options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Edge(EdgeConfig),
    Doubao(DoubaoConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Edge(EdgeConfig::default())
    }
}

impl BackendConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Edge(_) => "edge",
            BackendConfig::Doubao(_) => "doubao",
        }
    }

    /// Default configuration for a backend named on the command line.
    pub fn from_kind(kind: &str) -> Result<Self> {
        match kind.to_lowercase().as_str() {
            "edge" => Ok(BackendConfig::Edge(EdgeConfig::default())),
            "doubao" => Ok(BackendConfig::Doubao(DoubaoConfig::default())),
            other => Err(Error::configuration(format!(
                "unknown backend '{}' (expected edge or doubao)",
                other
            ))),
        }
    }
}

/// Options for the Edge read-aloud backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Service output format, e.g. `audio-24khz-48kbitrate-mono-mp3`.
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Options for the Doubao HTTP backend. Unset credentials come from the
/// keyring or `DOUBAO_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubaoConfig {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub encoding: Option<AudioFormat>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Instantiate the configured backend.
pub fn build_synthesizer(config: &BackendConfig) -> Result<Box<dyn Synthesizer>> {
    match config {
        #[cfg(feature = "edge")]
        BackendConfig::Edge(cfg) => {
            let mut builder = super::edge::EdgeClient::builder();
            if let Some(format) = &cfg.output_format {
                builder = builder.output_format(format);
            }
            if let Some(secs) = cfg.timeout_secs {
                builder = builder.timeout_secs(secs);
            }
            Ok(Box::new(builder.build()?))
        }
        #[cfg(feature = "doubao")]
        BackendConfig::Doubao(cfg) => {
            let mut builder = super::doubao::DoubaoClient::builder();
            if let Some(app_id) = &cfg.app_id {
                builder = builder.app_id(app_id);
            }
            if let Some(token) = &cfg.access_token {
                builder = builder.access_token(token);
            }
            if let Some(cluster) = &cfg.cluster {
                builder = builder.cluster(cluster);
            }
            if let Some(base_url) = &cfg.base_url {
                builder = builder.base_url(base_url);
            }
            if let Some(uid) = &cfg.uid {
                builder = builder.uid(uid);
            }
            if let Some(encoding) = cfg.encoding {
                builder = builder.encoding(encoding);
            }
            if let Some(secs) = cfg.timeout_secs {
                builder = builder.timeout_secs(secs);
            }
            Ok(Box::new(builder.build()?))
        }
        #[allow(unreachable_patterns)]
        other => Err(Error::configuration(format!(
            "backend '{}' is not compiled in (enable the `{}` feature)",
            other.kind(),
            other.kind()
        ))),
    }
}
