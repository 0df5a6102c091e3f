//! End-to-end run: validate, synthesize, export, report.

use crate::assembler::LessonAssembler;
use crate::audio::{self, AudioFormat};
use crate::config::LessonConfig;
use crate::tts::{build_synthesizer, Synthesizer};
use crate::Result;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub output: PathBuf,
    pub format: AudioFormat,
    pub duration_ms: u64,
    pub units: usize,
    pub phrases: usize,
    pub synthesis_calls: usize,
}

impl fmt::Display for CompletionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Audio generated: {} ({:.1}s)",
            self.output.display(),
            self.duration_ms as f64 / 1000.0
        )
    }
}

/// Run `config` against its configured backend.
pub async fn run(config: &LessonConfig) -> Result<CompletionReport> {
    config.validate()?;
    let synthesizer = build_synthesizer(&config.backend)?;
    generate(config, synthesizer.as_ref()).await
}

/// Run `config` against an explicit synthesizer. Nothing is written unless
/// every synthesis call succeeds.
pub async fn run_with<S: Synthesizer + ?Sized>(
    config: &LessonConfig,
    synthesizer: &S,
) -> Result<CompletionReport> {
    config.validate()?;
    generate(config, synthesizer).await
}

/// Assemble and export an already validated config.
async fn generate<S: Synthesizer + ?Sized>(
    config: &LessonConfig,
    synthesizer: &S,
) -> Result<CompletionReport> {
    info!(
        "Generating {} via {} ({} synthesis calls)",
        config.output.display(),
        synthesizer.name(),
        config.plan.synthesis_calls()
    );

    let assembly = LessonAssembler::new(synthesizer, &config.voice, config.pauses)
        .with_output_spec(config.audio)
        .assemble(&config.plan)
        .await?;

    let format = audio::export(&assembly.audio, &config.output, &config.export).await?;

    Ok(CompletionReport {
        output: config.output.clone(),
        format,
        duration_ms: assembly.duration_ms,
        units: assembly.stats.units,
        phrases: assembly.stats.phrases,
        synthesis_calls: assembly.stats.synthesis_calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "doubao")]
    #[tokio::test]
    async fn invalid_config_is_rejected_before_backend_setup() {
        use crate::tts::{BackendConfig, DoubaoConfig};
        use crate::{Error, LessonPlan};

        let mut config = LessonConfig::new(LessonPlan::new().with_unit("Unit 1", ["rice", " "]));
        config.output = PathBuf::from("lesson.wav");
        // no credentials anywhere; building this backend would fail first
        config.backend = BackendConfig::Doubao(DoubaoConfig {
            app_id: Some(String::new()),
            access_token: Some(String::new()),
            ..Default::default()
        });

        let err = run(&config).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }), "{}", err);
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("plan.Unit 1[1]")
        );
    }

    #[test]
    fn report_display_uses_seconds() {
        let report = CompletionReport {
            output: PathBuf::from("Unit_English_Rhythm.mp3"),
            format: AudioFormat::Mp3,
            duration_ms: 9500,
            units: 1,
            phrases: 2,
            synthesis_calls: 3,
        };
        assert_eq!(
            report.to_string(),
            "Audio generated: Unit_English_Rhythm.mp3 (9.5s)"
        );
    }
}
