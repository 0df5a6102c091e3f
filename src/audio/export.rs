//! Writing the finished track to disk.
//!
//! WAV is encoded in-process with `hound`. MP3 goes through an external
//! `ffmpeg` (libmp3lame), fed with an intermediate WAV file.

use super::{AudioFormat, AudioSegment};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Settings for the export step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// ffmpeg executable used for MP3 encoding.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    /// Target MP3 bitrate, in ffmpeg notation.
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_bitrate() -> String {
    "128k".to_string()
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            bitrate: default_bitrate(),
        }
    }
}

/// Encode a segment as a 16-bit PCM WAV file in memory.
pub fn encode_wav(segment: &AudioSegment) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: segment.spec().channels,
        sample_rate: segment.spec().sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(wav_error)?;
        for &s in segment.samples() {
            let val = (s * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(val).map_err(wav_error)?;
        }
        writer.finalize().map_err(wav_error)?;
    }
    Ok(cursor.into_inner())
}

fn wav_error(e: hound::Error) -> Error {
    Error::export_with_context(
        format!("WAV encoding failed: {}", e),
        ErrorContext::new().with_source("hound"),
    )
}

/// Write `segment` to `path`, replacing any existing file.
///
/// The format follows the file extension. Output is staged in a temporary
/// file next to the target and only moved into place once complete.
pub async fn export(segment: &AudioSegment, path: &Path, settings: &ExportSettings) -> Result<AudioFormat> {
    let format = AudioFormat::from_path(path).ok_or_else(|| {
        Error::export_with_context(
            "unsupported output extension",
            ErrorContext::new()
                .with_field_path("output")
                .with_details(format!("{} (expected .mp3 or .wav)", path.display())),
        )
    })?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await?;

    let wav = encode_wav(segment)?;
    let mut staged = tempfile::Builder::new()
        .prefix(".lesson-audio-")
        .suffix(&format!(".{}", format.extension()))
        .tempfile_in(&dir)?;

    match format {
        AudioFormat::Wav => {
            staged.write_all(&wav)?;
            staged.flush()?;
        }
        AudioFormat::Mp3 => {
            let mut input = tempfile::Builder::new()
                .prefix("lesson-audio-")
                .suffix(".wav")
                .tempfile()?;
            input.write_all(&wav)?;
            input.flush()?;
            encode_mp3(input.path(), staged.path(), settings).await?;
        }
    }

    staged.persist(path).map_err(|e| Error::Io(e.error))?;
    info!(
        "Exported {} ms of audio to {}",
        segment.duration_ms(),
        path.display()
    );
    Ok(format)
}

async fn encode_mp3(input: &Path, output: &Path, settings: &ExportSettings) -> Result<()> {
    debug!("Encoding MP3 with {} at {}", settings.ffmpeg, settings.bitrate);
    let result = Command::new(&settings.ffmpeg)
        .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
        .arg(input)
        .args(["-codec:a", "libmp3lame", "-b:a", settings.bitrate.as_str(), "-f", "mp3"])
        .arg(output)
        .output()
        .await;

    let out = match result {
        Ok(out) => out,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::export_with_context(
                "ffmpeg executable not found",
                ErrorContext::new()
                    .with_field_path("export.ffmpeg")
                    .with_details(settings.ffmpeg.clone()),
            ));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    if !out.status.success() {
        return Err(Error::export_with_context(
            format!("ffmpeg exited with {}", out.status),
            ErrorContext::new()
                .with_source("ffmpeg")
                .with_details(String::from_utf8_lossy(&out.stderr).trim().to_string()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioSpec;

    #[test]
    fn wav_header_matches_spec() {
        let clip = AudioSegment::silent(250, AudioSpec::new(8_000, 2));
        let bytes = encode_wav(&clip).unwrap();
        let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.duration(), 2_000);
    }

    #[test]
    fn samples_are_clamped() {
        let clip = AudioSegment::from_interleaved(AudioSpec::new(8_000, 1), vec![2.0, -2.0]);
        let bytes = encode_wav(&clip).unwrap();
        let mut reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![32767, -32768]);
    }

    #[tokio::test]
    async fn unknown_extension_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesson.ogg");
        let err = export(&AudioSegment::silent(10, AudioSpec::default()), &path, &ExportSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_ffmpeg_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesson.mp3");
        let settings = ExportSettings {
            ffmpeg: "definitely-not-an-ffmpeg-binary".to_string(),
            ..ExportSettings::default()
        };
        let err = export(&AudioSegment::silent(10, AudioSpec::default()), &path, &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
