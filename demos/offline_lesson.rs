//! Offline lesson example
//!
//! Assembles a short lesson with a tone generator standing in for a real TTS
//! backend, then writes it as WAV. No network access or credentials needed.
//!
//! Usage:
//!   cargo run --example offline_lesson -- /tmp/lesson.wav

use async_trait::async_trait;
use lesson_audio::{
    run_with, AudioSegment, AudioSpec, LessonConfig, LessonPlan, SynthesisError, Synthesizer,
    VoiceSettings,
};

/// Speaks every text as a short sine tone whose pitch and length depend on
/// the text.
struct ToneSynthesizer;

#[async_trait]
impl Synthesizer for ToneSynthesizer {
    fn name(&self) -> &str {
        "tone"
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSettings,
    ) -> Result<AudioSegment, SynthesisError> {
        let spec = AudioSpec::default();
        let ms = (200 + 60 * text.chars().count() as u64) as f32 / voice.speed;
        let freq = 220.0 + (text.len() % 12) as f32 * 40.0;
        let frames = spec.frames_for_ms(ms as u64);
        let samples = (0..frames)
            .map(|i| {
                let t = i as f32 / spec.sample_rate as f32;
                0.3 * (2.0 * std::f32::consts::PI * freq * t).sin() * voice.volume
            })
            .collect();
        Ok(AudioSegment::from_interleaved(spec, samples))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "offline_lesson.wav".to_string());

    let plan = LessonPlan::new()
        .with_unit("Unit 1", ["rice", "fish ball", "congee"])
        .with_unit("Unit 4", ["run", "climb", "fly", "walk"])
        .with_unit("Daily expressions", ["Me too", "Don't worry"]);

    let mut config = LessonConfig::new(plan);
    config.output = output.into();
    config.voice = VoiceSettings::default().with_speed(0.9);

    let report = run_with(&config, &ToneSynthesizer).await?;
    println!("{}", report);
    println!(
        "  {} units, {} phrases, {} synthesis calls",
        report.units, report.phrases, report.synthesis_calls
    );
    Ok(())
}
