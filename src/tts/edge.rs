//! Microsoft Edge "Read Aloud" neural voices via the `msedge-tts` client.
//!
//! The client is blocking, so every synthesis runs on tokio's blocking pool
//! with its own connection. Voice ratios are mapped to SSML prosody offsets
//! and the returned bytes are decoded like any other backend's.

use super::types::EncodedAudio;
use super::Synthesizer;
use crate::audio::{AudioFormat, AudioSegment};
use crate::error::SynthesisError;
use crate::settings::VoiceSettings;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use msedge_tts::tts::client::connect;
use msedge_tts::tts::SpeechConfig;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";
pub const DEFAULT_OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client for the Edge read-aloud service.
pub struct EdgeClient {
    output_format: String,
    audio_format: AudioFormat,
    timeout: Duration,
}

impl EdgeClient {
    pub fn builder() -> EdgeClientBuilder {
        EdgeClientBuilder::new()
    }

    pub fn output_format(&self) -> &str {
        &self.output_format
    }

    /// Request settings for one call: the voice name (or Jenny) plus
    /// prosody offsets derived from the voice ratios.
    pub fn speech_config(&self, voice: &VoiceSettings) -> SpeechConfig {
        SpeechConfig {
            voice_name: voice.name_or(DEFAULT_VOICE).to_string(),
            audio_format: self.output_format.clone(),
            pitch: percent_offset(voice.pitch),
            rate: percent_offset(voice.speed),
            volume: percent_offset(voice.volume),
        }
    }

    pub async fn synthesize_encoded(
        &self,
        text: &str,
        voice: &VoiceSettings,
    ) -> std::result::Result<EncodedAudio, SynthesisError> {
        let config = self.speech_config(voice);
        let text = text.to_string();
        debug!(
            "Edge TTS request: {} chars with {}",
            text.chars().count(),
            config.voice_name
        );

        let task = tokio::task::spawn_blocking(move || -> std::result::Result<Vec<u8>, SynthesisError> {
            let mut client = connect().map_err(|e| {
                SynthesisError::Transport(format!("Failed to connect to Edge TTS: {}", e))
            })?;
            client
                .synthesize(&text, &config)
                .map(|audio| audio.audio_bytes)
                .map_err(|e| SynthesisError::Transport(format!("Edge TTS request failed: {}", e)))
        });
        let audio = timeout(self.timeout, task)
            .await
            .map_err(|_| {
                SynthesisError::Transport(format!(
                    "Edge TTS timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| SynthesisError::Transport(format!("Edge TTS worker failed: {}", e)))??;

        if audio.is_empty() {
            return Err(SynthesisError::backend("no audio received"));
        }
        Ok(EncodedAudio::new(audio, self.audio_format))
    }
}

#[async_trait]
impl Synthesizer for EdgeClient {
    fn name(&self) -> &str {
        "edge"
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSettings,
    ) -> std::result::Result<AudioSegment, SynthesisError> {
        self.synthesize_encoded(text, voice).await?.decode()
    }
}

pub struct EdgeClientBuilder {
    output_format: Option<String>,
    timeout_secs: u64,
}

impl EdgeClientBuilder {
    pub fn new() -> Self {
        Self {
            output_format: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    /// Upper bound for connecting and receiving one clip.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<EdgeClient> {
        let output_format = self
            .output_format
            .unwrap_or_else(|| DEFAULT_OUTPUT_FORMAT.to_string());
        let audio_format = container_of(&output_format).ok_or_else(|| {
            Error::configuration_with_context(
                "unsupported Edge output format",
                ErrorContext::new()
                    .with_field_path("backend.output_format")
                    .with_details(format!("{} (expected an mp3 or riff format)", output_format)),
            )
        })?;
        Ok(EdgeClient {
            output_format,
            audio_format,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

impl Default for EdgeClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Container of an Edge output format name such as `riff-24khz-16bit-mono-pcm`.
fn container_of(output_format: &str) -> Option<AudioFormat> {
    if output_format.starts_with("riff-") {
        Some(AudioFormat::Wav)
    } else if output_format.ends_with("-mp3") {
        Some(AudioFormat::Mp3)
    } else {
        None
    }
}

/// Ratio to a signed offset: 0.9 -> -10, 1.25 -> +25. Rate and volume are
/// percentages; the service reads the pitch offset in Hz.
fn percent_offset(ratio: f32) -> i32 {
    ((ratio - 1.0) * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_become_signed_offsets() {
        assert_eq!(percent_offset(0.9), -10);
        assert_eq!(percent_offset(1.0), 0);
        assert_eq!(percent_offset(1.25), 25);
        assert_eq!(percent_offset(0.5), -50);
    }

    #[test]
    fn speech_config_uses_default_voice_and_offsets() {
        let client = EdgeClient::builder().build().unwrap();
        let voice = VoiceSettings::default().with_speed(0.9);
        let config = client.speech_config(&voice);

        assert_eq!(config.voice_name, DEFAULT_VOICE);
        assert_eq!(config.audio_format, DEFAULT_OUTPUT_FORMAT);
        assert_eq!(config.rate, -10);
        assert_eq!(config.volume, 0);
        assert_eq!(config.pitch, 0);
    }

    #[test]
    fn configured_voice_overrides_default() {
        let client = EdgeClient::builder()
            .output_format("riff-24khz-16bit-mono-pcm")
            .build()
            .unwrap();
        let voice = VoiceSettings::default().with_name("en-GB-SoniaNeural");
        let config = client.speech_config(&voice);

        assert_eq!(config.voice_name, "en-GB-SoniaNeural");
        assert_eq!(config.audio_format, "riff-24khz-16bit-mono-pcm");
    }

    #[test]
    fn output_format_selects_container() {
        assert_eq!(container_of(DEFAULT_OUTPUT_FORMAT), Some(AudioFormat::Mp3));
        assert_eq!(container_of("riff-24khz-16bit-mono-pcm"), Some(AudioFormat::Wav));
        assert_eq!(container_of("webm-24khz-16bit-mono-opus"), None);
        assert!(EdgeClient::builder()
            .output_format("webm-24khz-16bit-mono-opus")
            .build()
            .is_err());
    }
}
