//! Decoding of backend output into PCM segments.

use super::{AudioFormat, AudioSegment, AudioSpec};
use crate::error::SynthesisError;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::warn;

/// Decode an encoded clip (MP3 or WAV) held in memory.
pub fn decode(data: &[u8], format: AudioFormat) -> Result<AudioSegment, SynthesisError> {
    if data.is_empty() {
        return Err(SynthesisError::Decode("empty audio payload".to_string()));
    }

    let cursor = std::io::Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());
    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions {
                enable_gapless: true,
                ..Default::default()
            },
            &MetadataOptions::default(),
        )
        .map_err(|e| SynthesisError::Decode(format!("unrecognized {} stream: {}", format.extension(), e)))?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SynthesisError::Decode("no audio track".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| SynthesisError::Decode(format!("unsupported codec: {}", e)))?;

    let mut spec = match (codec_params.sample_rate, codec_params.channels) {
        (Some(rate), Some(channels)) => Some(AudioSpec::new(rate, channels.count() as u16)),
        _ => None,
    };
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(SynthesisError::Decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => {
                let signal = *decoded.spec();
                spec.get_or_insert(AudioSpec::new(signal.rate, signal.channels.count() as u16));
                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, signal);
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping corrupt audio packet: {}", e);
            }
            Err(e) => return Err(SynthesisError::Decode(e.to_string())),
        }
    }

    let spec = spec.ok_or_else(|| SynthesisError::Decode("stream has no sample format".to_string()))?;
    Ok(AudioSegment::from_interleaved(spec, samples))
}
