//! Volcengine Doubao HTTP TTS client.
//!
//! One `POST /api/v1/tts` per text; the audio comes back base64-encoded in
//! the `data` field of the JSON response.

use super::types::EncodedAudio;
use super::Synthesizer;
use crate::audio::{AudioFormat, AudioSegment};
use crate::error::SynthesisError;
use crate::settings::VoiceSettings;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use keyring::Entry;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://openspeech.bytedance.com";
pub const DEFAULT_ENDPOINT_PATH: &str = "/api/v1/tts";
pub const DEFAULT_CLUSTER: &str = "volcano_tts";
pub const DEFAULT_VOICE: &str = "BV040_streaming";
pub const DEFAULT_UID: &str = "lesson_audio";

/// Client for the Doubao text-to-speech API.
pub struct DoubaoClient {
    http_client: reqwest::Client,
    base_url: String,
    endpoint_path: String,
    app_id: String,
    access_token: String,
    cluster: String,
    uid: String,
    default_voice: String,
    encoding: AudioFormat,
}

#[derive(Debug, Deserialize)]
struct DoubaoResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

impl DoubaoClient {
    pub fn builder() -> DoubaoClientBuilder {
        DoubaoClientBuilder::new()
    }

    /// JSON body for one synthesis request.
    pub fn request_body(&self, text: &str, voice: &VoiceSettings) -> serde_json::Value {
        serde_json::json!({
            "app": {
                "appid": self.app_id,
                "token": self.access_token,
                "cluster": self.cluster,
            },
            "user": {
                "uid": self.uid,
            },
            "audio": {
                "voice_type": voice.name_or(&self.default_voice),
                "encoding": self.encoding.extension(),
                "speed_ratio": voice.speed,
                "volume_ratio": voice.volume,
                "pitch_ratio": voice.pitch,
            },
            "request": {
                "reqid": uuid::Uuid::new_v4().to_string(),
                "text": text,
                "text_type": "plain",
                "operation": "query",
                "with_frontend": 1,
                "frontend_type": "unitTson",
            }
        })
    }

    pub async fn synthesize_encoded(
        &self,
        text: &str,
        voice: &VoiceSettings,
    ) -> std::result::Result<EncodedAudio, SynthesisError> {
        let endpoint = format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoint_path);
        let body = self.request_body(text, voice);
        debug!("Doubao TTS request: {} chars to {}", text.chars().count(), endpoint);

        // The service expects "Bearer;<token>", not the standard "Bearer <token>".
        let response = self
            .http_client
            .post(&endpoint)
            .header("Authorization", format!("Bearer;{}", self.access_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| SynthesisError::Transport(format!("TTS request failed: {}", e)))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Transport(format!("Failed to read TTS response: {}", e)))?;

        let parsed: DoubaoResponse = match serde_json::from_slice(&bytes) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(SynthesisError::Backend {
                    code: Some(status.as_u16() as i64),
                    message: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }
            Err(e) => {
                return Err(SynthesisError::Decode(format!("invalid TTS response JSON: {}", e)));
            }
        };

        match parsed.data.filter(|d| !d.is_empty()) {
            Some(data) => {
                let audio = base64::engine::general_purpose::STANDARD
                    .decode(data.as_bytes())
                    .map_err(|e| SynthesisError::Decode(format!("invalid base64 audio: {}", e)))?;
                Ok(EncodedAudio::new(audio, self.encoding))
            }
            None => Err(SynthesisError::Backend {
                code: parsed.code,
                message: parsed.message.unwrap_or_else(|| "unknown error".to_string()),
            }),
        }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }
}

#[async_trait]
impl Synthesizer for DoubaoClient {
    fn name(&self) -> &str {
        "doubao"
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSettings,
    ) -> std::result::Result<AudioSegment, SynthesisError> {
        self.synthesize_encoded(text, voice).await?.decode()
    }
}

pub struct DoubaoClientBuilder {
    app_id: Option<String>,
    access_token: Option<String>,
    cluster: Option<String>,
    default_voice: Option<String>,
    base_url: Option<String>,
    endpoint_path: Option<String>,
    uid: Option<String>,
    encoding: AudioFormat,
    timeout_secs: u64,
}

impl DoubaoClientBuilder {
    pub fn new() -> Self {
        Self {
            app_id: None,
            access_token: None,
            cluster: None,
            default_voice: None,
            base_url: None,
            endpoint_path: None,
            uid: None,
            encoding: AudioFormat::Mp3,
            timeout_secs: 60,
        }
    }
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
    pub fn cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }
    pub fn default_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = Some(voice.into());
        self
    }
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
    pub fn endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = Some(path.into());
        self
    }
    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }
    pub fn encoding(mut self, encoding: AudioFormat) -> Self {
        self.encoding = encoding;
        self
    }
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<DoubaoClient> {
        let app_id = self
            .app_id
            .or_else(|| env::var("DOUBAO_APPID").ok())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::configuration("Doubao app id required (DOUBAO_APPID)"))?;
        let access_token = self
            .access_token
            .or_else(lookup_access_token)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::configuration("Doubao access token required (DOUBAO_ACCESS_TOKEN)")
            })?;
        let cluster = self
            .cluster
            .or_else(|| env::var("DOUBAO_CLUSTER").ok())
            .unwrap_or_else(|| DEFAULT_CLUSTER.to_string());
        let default_voice = self
            .default_voice
            .or_else(|| env::var("DOUBAO_VOICE_TYPE").ok())
            .unwrap_or_else(|| DEFAULT_VOICE.to_string());
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let endpoint_path = self
            .endpoint_path
            .unwrap_or_else(|| DEFAULT_ENDPOINT_PATH.to_string());
        let endpoint_path = if endpoint_path.starts_with('/') {
            endpoint_path
        } else {
            format!("/{}", endpoint_path)
        };
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(DoubaoClient {
            http_client,
            base_url,
            endpoint_path,
            app_id,
            access_token,
            cluster,
            uid: self.uid.unwrap_or_else(|| DEFAULT_UID.to_string()),
            default_voice,
            encoding: self.encoding,
        })
    }
}

impl Default for DoubaoClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup_access_token() -> Option<String> {
    // 1. Try Keyring
    if let Ok(entry) = Entry::new("lesson-audio", "doubao") {
        if let Ok(token) = entry.get_password() {
            return Some(token);
        }
    }

    // 2. Try Environment Variable
    env::var("DOUBAO_ACCESS_TOKEN").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DoubaoClient {
        DoubaoClient::builder()
            .app_id("app-1")
            .access_token("tok")
            .cluster("volcano_tts")
            .default_voice("BV040_streaming")
            .build()
            .unwrap()
    }

    #[test]
    fn request_body_carries_voice_ratios() {
        let voice = VoiceSettings::default().with_speed(0.9);
        let body = client().request_body("fish ball", &voice);
        assert_eq!(body["app"]["appid"], "app-1");
        assert_eq!(body["app"]["cluster"], "volcano_tts");
        assert_eq!(body["audio"]["voice_type"], "BV040_streaming");
        assert_eq!(body["audio"]["encoding"], "mp3");
        assert!((body["audio"]["speed_ratio"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        assert_eq!(body["request"]["text"], "fish ball");
        assert_eq!(body["request"]["operation"], "query");
        assert_eq!(body["request"]["frontend_type"], "unitTson");
    }

    #[test]
    fn explicit_voice_overrides_default() {
        let voice = VoiceSettings::default().with_name("BV001_streaming");
        let body = client().request_body("cake", &voice);
        assert_eq!(body["audio"]["voice_type"], "BV001_streaming");
    }

    #[test]
    fn request_ids_are_unique() {
        let c = client();
        let v = VoiceSettings::default();
        assert_ne!(
            c.request_body("a", &v)["request"]["reqid"],
            c.request_body("a", &v)["request"]["reqid"]
        );
    }

    #[test]
    fn endpoint_path_gets_leading_slash() {
        let c = DoubaoClient::builder()
            .app_id("a")
            .access_token("t")
            .endpoint_path("api/v1/tts")
            .build()
            .unwrap();
        assert_eq!(c.endpoint_path, "/api/v1/tts");
    }
}
