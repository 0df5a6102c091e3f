//! Shared test fixtures: a scripted synthesizer that needs no network.

#![allow(dead_code)]

use async_trait::async_trait;
use lesson_audio::{AudioSegment, AudioSpec, SynthesisError, Synthesizer, VoiceSettings};
use std::sync::Mutex;

/// Returns a fixed-length clip for every text and records each call.
///
/// Clip amplitude is derived from the text so different items can be told
/// apart in the output samples.
pub struct StubSynthesizer {
    clip_ms: u64,
    spec: AudioSpec,
    fail_on: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl StubSynthesizer {
    pub fn new(clip_ms: u64) -> Self {
        Self {
            clip_ms,
            spec: AudioSpec::default(),
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_spec(mut self, spec: AudioSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Fail with a backend error when asked to speak `text`.
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.fail_on = Some(text.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

pub fn level_for(text: &str) -> f32 {
    let sum: u32 = text.bytes().map(u32::from).sum();
    0.1 + (sum % 50) as f32 / 100.0
}

#[async_trait]
impl Synthesizer for StubSynthesizer {
    fn name(&self) -> &str {
        "stub"
    }

    async fn synthesize(
        &self,
        text: &str,
        _voice: &VoiceSettings,
    ) -> Result<AudioSegment, SynthesisError> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.fail_on.as_deref() == Some(text) {
            return Err(SynthesisError::backend(format!("refused '{}'", text)));
        }
        let frames = self.spec.frames_for_ms(self.clip_ms);
        Ok(AudioSegment::from_interleaved(
            self.spec,
            vec![level_for(text); frames * self.spec.channels as usize],
        ))
    }
}
