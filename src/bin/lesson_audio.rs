//! lesson-audio — 根据课程配置生成跟读音频
//!
//! Usage:
//!   lesson-audio <config.yaml>                     Generate the track
//!   lesson-audio <config.yaml> --dry-run           Show what would be synthesized
//!   lesson-audio <config.yaml> --backend doubao    Override the configured backend
//!
//! Logging follows RUST_LOG (default: info).

use anyhow::Context;
use clap::Parser;
use lesson_audio::LessonConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lesson-audio", version, about = "Generate paced listening tracks from a lesson plan")]
struct Cli {
    /// Lesson configuration (YAML)
    config: PathBuf,

    /// Output file (.mp3 or .wav), overriding the config
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Synthesis backend (edge | doubao), overriding the config
    #[arg(short, long)]
    backend: Option<String>,

    /// Print the plan summary without calling any backend
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Generation failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = LessonConfig::from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(output) = cli.output {
        config.output = output;
    }
    if let Some(kind) = cli.backend.as_deref() {
        config.switch_backend(kind)?;
    }

    if cli.dry_run {
        print_summary(&config);
        return Ok(());
    }

    println!("Generating {} ...", config.output.display());
    let report = lesson_audio::run(&config).await?;
    println!("{}", report);
    println!(
        "  {} units, {} phrases, {} synthesis calls",
        report.units, report.phrases, report.synthesis_calls
    );
    Ok(())
}

fn print_summary(config: &LessonConfig) {
    let plan = &config.plan;
    println!("Output:   {}", config.output.display());
    println!("Backend:  {}", config.backend.kind());
    println!(
        "Voice:    {} (speed {}, volume {}, pitch {})",
        config.voice.name.as_deref().unwrap_or("<backend default>"),
        config.voice.speed,
        config.voice.volume,
        config.voice.pitch
    );
    for (unit, phrases) in plan.units() {
        println!("  {} ({})", unit, phrases.join(", "));
    }
    println!(
        "{} units, {} phrases, {} synthesis calls, {:.1}s of silence",
        plan.unit_count(),
        plan.phrase_count(),
        plan.synthesis_calls(),
        config
            .pauses
            .total_silence_ms(plan.unit_count(), plan.phrase_count()) as f64
            / 1000.0
    );
}
