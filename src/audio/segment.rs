//! In-memory PCM audio segments.

use crate::{Error, ErrorContext, Result};
use rubato::{FftFixedIn, Resampler};
use serde::{Deserialize, Serialize};

/// Sample rate and channel layout of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSpec {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
}

fn default_sample_rate() -> u32 {
    24_000
}

fn default_channels() -> u16 {
    1
}

impl AudioSpec {
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Number of frames covering `duration_ms` at this rate.
    pub fn frames_for_ms(&self, duration_ms: u64) -> usize {
        (self.sample_rate as u64 * duration_ms / 1000) as usize
    }
}

impl Default for AudioSpec {
    fn default() -> Self {
        Self::new(default_sample_rate(), default_channels())
    }
}

/// A decoded clip: interleaved `f32` samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    spec: AudioSpec,
    samples: Vec<f32>,
}

impl AudioSegment {
    pub fn empty(spec: AudioSpec) -> Self {
        Self {
            spec,
            samples: Vec::new(),
        }
    }

    /// Pure silence of the given duration.
    pub fn silent(duration_ms: u64, spec: AudioSpec) -> Self {
        let len = spec.frames_for_ms(duration_ms) * spec.channels as usize;
        Self {
            spec,
            samples: vec![0.0; len],
        }
    }

    /// Wrap interleaved samples. A trailing partial frame is dropped.
    pub fn from_interleaved(spec: AudioSpec, mut samples: Vec<f32>) -> Self {
        let channels = spec.channels.max(1) as usize;
        samples.truncate(samples.len() - samples.len() % channels);
        Self { spec, samples }
    }

    pub fn spec(&self) -> AudioSpec {
        self.spec
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.spec.channels.max(1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in milliseconds, rounded to the nearest millisecond.
    pub fn duration_ms(&self) -> u64 {
        if self.spec.sample_rate == 0 {
            return 0;
        }
        let rate = self.spec.sample_rate as u64;
        (self.frames() as u64 * 1000 + rate / 2) / rate
    }

    /// Append `other`, converting it to this segment's format first if needed.
    pub fn append(&mut self, other: &AudioSegment) -> Result<()> {
        if other.spec == self.spec {
            self.samples.extend_from_slice(&other.samples);
        } else {
            let converted = other.converted(self.spec)?;
            self.samples.extend_from_slice(&converted.samples);
        }
        Ok(())
    }

    /// This segment in the `target` format, converting only when the
    /// formats differ.
    pub fn into_spec(self, target: AudioSpec) -> Result<AudioSegment> {
        if target == self.spec {
            Ok(self)
        } else {
            self.converted(target)
        }
    }

    /// Copy of this segment in the `target` format: channels are remixed,
    /// then each channel is band-limited and resampled.
    pub fn converted(&self, target: AudioSpec) -> Result<AudioSegment> {
        if target == self.spec {
            return Ok(self.clone());
        }
        if self.spec.sample_rate == 0 || target.sample_rate == 0 {
            return Err(Error::audio_with_context(
                "cannot convert to or from a zero sample rate",
                ErrorContext::new().with_details(format!(
                    "{} Hz -> {} Hz",
                    self.spec.sample_rate, target.sample_rate
                )),
            ));
        }
        let remixed = remix(&self.samples, self.spec.channels, target.channels);
        let samples = resample(
            &remixed,
            target.channels.max(1) as usize,
            self.spec.sample_rate,
            target.sample_rate,
        )?;
        Ok(AudioSegment::from_interleaved(target, samples))
    }
}

fn remix(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    let from = from.max(1) as usize;
    let to = to.max(1) as usize;
    if from == to {
        return samples.to_vec();
    }
    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else {
            let mono = frame.iter().sum::<f32>() / from as f32;
            out.extend(std::iter::repeat(mono).take(to));
        }
    }
    out
}

const RESAMPLE_CHUNK: usize = 1024;
const RESAMPLE_SUB_CHUNKS: usize = 2;

fn resample_error(e: impl std::fmt::Display) -> Error {
    Error::audio_with_context(
        "resampling failed",
        ErrorContext::new().with_source(e.to_string()),
    )
}

/// FFT resampling of interleaved `samples`. The resampler's output delay is
/// trimmed so the result lines up with the input and has exactly
/// `frames * to_rate / from_rate` frames (rounded).
fn resample(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    let frames = samples.len() / channels;
    if from_rate == to_rate || frames == 0 {
        return Ok(samples.to_vec());
    }
    let planar: Vec<Vec<f32>> = (0..channels)
        .map(|ch| samples.iter().skip(ch).step_by(channels).copied().collect())
        .collect();

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        RESAMPLE_CHUNK,
        RESAMPLE_SUB_CHUNKS,
        channels,
    )
    .map_err(resample_error)?;
    let delay = resampler.output_delay();
    let wanted = ((frames as u64 * to_rate as u64 + from_rate as u64 / 2) / from_rate as u64) as usize;
    let mut out: Vec<Vec<f32>> = vec![Vec::with_capacity(wanted + delay + RESAMPLE_CHUNK); channels];

    let mut pos = 0;
    while frames - pos >= resampler.input_frames_next() {
        let n = resampler.input_frames_next();
        let block: Vec<&[f32]> = planar.iter().map(|c| &c[pos..pos + n]).collect();
        let chunk = resampler.process(block.as_slice(), None).map_err(resample_error)?;
        extend_planar(&mut out, chunk);
        pos += n;
    }
    if pos < frames {
        let block: Vec<&[f32]> = planar.iter().map(|c| &c[pos..]).collect();
        let chunk = resampler
            .process_partial(Some(block.as_slice()), None)
            .map_err(resample_error)?;
        extend_planar(&mut out, chunk);
    }
    // flush the filter tail
    while out[0].len() < wanted + delay {
        let chunk = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(resample_error)?;
        if chunk[0].is_empty() {
            break;
        }
        extend_planar(&mut out, chunk);
    }

    let available = out[0].len().saturating_sub(delay).min(wanted);
    let mut interleaved = Vec::with_capacity(wanted * channels);
    for i in delay..delay + available {
        interleaved.extend(out.iter().map(|c| c[i]));
    }
    interleaved.resize(wanted * channels, 0.0);
    Ok(interleaved)
}

fn extend_planar(out: &mut [Vec<f32>], chunk: Vec<Vec<f32>>) {
    for (dst, src) in out.iter_mut().zip(chunk) {
        dst.extend_from_slice(&src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONO_24K: AudioSpec = AudioSpec::new(24_000, 1);

    #[test]
    fn silence_has_exact_duration() {
        let s = AudioSegment::silent(1500, MONO_24K);
        assert_eq!(s.frames(), 36_000);
        assert_eq!(s.duration_ms(), 1500);
        assert!(s.samples().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn zero_length_silence_is_empty() {
        let s = AudioSegment::silent(0, MONO_24K);
        assert!(s.is_empty());
        assert_eq!(s.duration_ms(), 0);
    }

    #[test]
    fn append_same_format_concatenates() {
        let mut track = AudioSegment::empty(MONO_24K);
        track.append(&AudioSegment::silent(500, MONO_24K)).unwrap();
        track
            .append(&AudioSegment::from_interleaved(MONO_24K, vec![0.5; 12_000]))
            .unwrap();
        assert_eq!(track.duration_ms(), 1000);
        assert_eq!(track.samples()[12_000], 0.5);
    }

    #[test]
    fn append_converts_rate_and_channels() {
        let stereo_48k = AudioSpec::new(48_000, 2);
        let clip = AudioSegment::from_interleaved(stereo_48k, vec![0.25; 48_000 * 2]);
        let mut track = AudioSegment::empty(MONO_24K);
        track.append(&clip).unwrap();
        assert_eq!(track.spec(), MONO_24K);
        assert_eq!(track.frames(), 24_000);
        assert_eq!(track.duration_ms(), 1000);
        assert!((track.samples()[12_000] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn mono_to_stereo_duplicates_samples() {
        let clip = AudioSegment::from_interleaved(MONO_24K, vec![0.1, 0.2]);
        let stereo = clip.converted(AudioSpec::new(24_000, 2)).unwrap();
        assert_eq!(stereo.samples(), &[0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn partial_frames_are_dropped() {
        let clip = AudioSegment::from_interleaved(AudioSpec::new(8_000, 2), vec![0.0; 5]);
        assert_eq!(clip.frames(), 2);
        assert_eq!(clip.samples().len(), 4);
    }

    fn sine(spec: AudioSpec, freq: f32, amplitude: f32, duration_ms: u64) -> AudioSegment {
        let frames = spec.frames_for_ms(duration_ms);
        let rate = spec.sample_rate as f32;
        let samples = (0..frames)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / rate).sin())
            .collect();
        AudioSegment::from_interleaved(spec, samples)
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn downsampling_removes_content_above_the_new_nyquist() {
        let tone = sine(AudioSpec::new(48_000, 1), 15_000.0, 0.8, 1000);
        let mut track = AudioSegment::empty(MONO_24K);
        track.append(&tone).unwrap();

        assert_eq!(track.frames(), 24_000);
        // skip the edges, where the filter rings
        let middle = &track.samples()[2_000..22_000];
        assert!(rms(middle) < 0.05, "rms {}", rms(middle));
    }

    #[test]
    fn downsampling_keeps_content_below_the_new_nyquist() {
        let tone = sine(AudioSpec::new(48_000, 1), 1_000.0, 0.8, 1000);
        let converted = tone.converted(MONO_24K).unwrap();

        let expected = 0.8 / std::f32::consts::SQRT_2;
        let middle = &converted.samples()[2_000..22_000];
        assert!((rms(middle) - expected).abs() < 0.02, "rms {}", rms(middle));
    }

    #[test]
    fn upsampling_keeps_duration() {
        let clip = sine(AudioSpec::new(22_050, 1), 440.0, 0.5, 700);
        let converted = clip.converted(MONO_24K).unwrap();
        assert_eq!(converted.duration_ms(), 700);
    }

    #[test]
    fn zero_rate_cannot_be_converted() {
        let clip = AudioSegment::from_interleaved(AudioSpec::new(0, 1), vec![0.1; 10]);
        assert!(matches!(
            clip.converted(MONO_24K),
            Err(Error::Audio { .. })
        ));
    }

    #[test]
    fn into_spec_is_identity_for_matching_format() {
        let clip = AudioSegment::from_interleaved(MONO_24K, vec![0.1, 0.2, 0.3]);
        let same = clip.clone().into_spec(MONO_24K).unwrap();
        assert_eq!(same, clip);
    }
}
