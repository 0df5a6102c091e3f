//! 音频层：PCM 片段、静音生成、解码与导出。
//!
//! Audio layer: PCM segments, silence, decoding of backend output and export.

pub mod decode;
pub mod export;
mod format;
mod segment;

pub use decode::decode;
pub use export::{export, ExportSettings};
pub use format::AudioFormat;
pub use segment::{AudioSegment, AudioSpec};
