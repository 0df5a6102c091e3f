//! # lesson-audio
//!
//! 课程听力音频生成：单元名、每个短语朗读两遍、按配置插入停顿，合成为一条音轨。
//!
//! Builds paced listening tracks for vocabulary lessons. A [`LessonPlan`] of
//! units and phrases is spoken through a text-to-speech backend: each unit
//! name once, each phrase twice, with configurable silences in between. The
//! result is a single MP3 or WAV file and its total duration.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lesson_audio::{LessonConfig, LessonPlan};
//!
//! #[tokio::main]
//! async fn main() -> lesson_audio::Result<()> {
//!     let plan = LessonPlan::new()
//!         .with_unit("Unit 1", ["rice", "fish ball", "congee"])
//!         .with_unit("Unit 2", ["wash my hands", "brush my teeth"]);
//!
//!     let report = lesson_audio::run(&LessonConfig::new(plan)).await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`plan`] | Lesson plans (ordered units and phrases) |
//! | [`settings`] | Voice settings and pause schedule |
//! | [`assembler`] | The assembly loop |
//! | [`tts`] | Synthesis trait and backend adapters (Edge, Doubao) |
//! | [`audio`] | PCM segments, decoding and export |
//! | [`config`] | YAML configuration file |
//! | [`runner`] | End-to-end run and completion report |

pub mod assembler;
pub mod audio;
pub mod config;
pub mod plan;
pub mod runner;
pub mod settings;
pub mod tts;

// Re-export main types for convenience
pub use assembler::{Assembly, AssemblyStats, LessonAssembler};
pub use audio::{AudioFormat, AudioSegment, AudioSpec};
pub use config::LessonConfig;
pub use plan::LessonPlan;
pub use runner::{run, run_with, CompletionReport};
pub use settings::{PauseSchedule, VoiceSettings};
pub use tts::{BackendConfig, Synthesizer};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, SynthesisError};
