//! TTS（文字转语音）模块：统一的合成接口与各后端适配器。
//!
//! Every backend implements [`Synthesizer`]; the assembler only ever sees
//! that trait, so authentication and wire protocol stay inside the adapter.

mod backend;
#[cfg(feature = "doubao")]
pub mod doubao;
#[cfg(feature = "edge")]
pub mod edge;
mod types;

pub use backend::{build_synthesizer, BackendConfig, DoubaoConfig, EdgeConfig};
pub use types::EncodedAudio;

use crate::audio::AudioSegment;
use crate::error::SynthesisError;
use crate::settings::VoiceSettings;
use async_trait::async_trait;

/// Text-to-speech capability consumed by the assembler.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Short backend name for logs and reports.
    fn name(&self) -> &str;

    /// Speak `text` with `voice`, returning decoded audio.
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSettings,
    ) -> Result<AudioSegment, SynthesisError>;
}

#[async_trait]
impl<T: Synthesizer + ?Sized> Synthesizer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSettings,
    ) -> Result<AudioSegment, SynthesisError> {
        (**self).synthesize(text, voice).await
    }
}
