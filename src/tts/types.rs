//! TTS (Text-to-Speech) types.

use crate::audio::{self, AudioFormat, AudioSegment};
use crate::error::SynthesisError;

/// Encoded audio as returned by a backend, before decoding.
#[derive(Debug, Clone)]
pub struct EncodedAudio {
    pub data: Vec<u8>,
    pub format: AudioFormat,
}

impl EncodedAudio {
    pub fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }

    pub fn decode(&self) -> Result<AudioSegment, SynthesisError> {
        audio::decode(&self.data, self.format)
    }
}
