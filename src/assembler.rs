//! Lesson assembly: unit names, twice-spoken phrases and silence gaps,
//! concatenated into one track.

use crate::audio::{AudioSegment, AudioSpec};
use crate::plan::LessonPlan;
use crate::settings::{PauseSchedule, VoiceSettings};
use crate::tts::Synthesizer;
use crate::{Error, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Counters for one assembly run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub units: usize,
    pub phrases: usize,
    pub synthesis_calls: usize,
    pub elapsed: Duration,
}

/// The assembled track.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub audio: AudioSegment,
    /// Sum of the durations of every appended segment.
    pub duration_ms: u64,
    pub stats: AssemblyStats,
}

/// Turns a [`LessonPlan`] into one track using a [`Synthesizer`].
///
/// Calls are strictly sequential. The first synthesis failure aborts the run
/// and discards everything accumulated so far.
pub struct LessonAssembler<'a, S: Synthesizer + ?Sized> {
    synthesizer: &'a S,
    voice: &'a VoiceSettings,
    pauses: PauseSchedule,
    output_spec: AudioSpec,
}

impl<'a, S: Synthesizer + ?Sized> LessonAssembler<'a, S> {
    pub fn new(synthesizer: &'a S, voice: &'a VoiceSettings, pauses: PauseSchedule) -> Self {
        Self {
            synthesizer,
            voice,
            pauses,
            output_spec: AudioSpec::default(),
        }
    }

    /// Sample format of the output track; clips in other formats are
    /// converted once, before they are appended.
    pub fn with_output_spec(mut self, spec: AudioSpec) -> Self {
        self.output_spec = spec;
        self
    }

    pub async fn assemble(&self, plan: &LessonPlan) -> Result<Assembly> {
        let start = Instant::now();
        let mut track = Track::new(self.output_spec);
        let mut stats = AssemblyStats::default();

        for (unit, phrases) in plan.units() {
            info!("Processing unit '{}' ({} phrases)", unit, phrases.len());

            let name_audio = self.speak(unit, None, unit, &mut stats).await?;
            track.push(&name_audio)?;
            track.pause(self.pauses.after_unit_ms)?;

            for phrase in phrases {
                debug!("  - {}", phrase);
                let audio = self.speak(phrase, Some(phrase.as_str()), unit, &mut stats).await?;
                track.push(&audio)?;
                track.pause(self.pauses.between_repeat_ms)?;
                track.push(&audio)?;
                track.pause(self.pauses.after_word_ms)?;
                stats.phrases += 1;
            }

            track.pause(self.pauses.between_units_ms)?;
            stats.units += 1;
        }

        stats.elapsed = start.elapsed();
        info!(
            "Assembled {} units / {} phrases with {} synthesis calls via {}: {} ms of audio",
            stats.units,
            stats.phrases,
            stats.synthesis_calls,
            self.synthesizer.name(),
            track.duration_ms
        );
        Ok(Assembly {
            audio: track.audio,
            duration_ms: track.duration_ms,
            stats,
        })
    }

    async fn speak(
        &self,
        text: &str,
        phrase: Option<&str>,
        unit: &str,
        stats: &mut AssemblyStats,
    ) -> Result<AudioSegment> {
        stats.synthesis_calls += 1;
        let clip = self
            .synthesizer
            .synthesize(text, self.voice)
            .await
            .map_err(|source| Error::Synthesis {
                unit: unit.to_string(),
                phrase: phrase.map(str::to_string),
                source,
            })?;
        clip.into_spec(self.output_spec)
    }
}

/// Growing output buffer plus the running duration ledger.
struct Track {
    audio: AudioSegment,
    duration_ms: u64,
}

impl Track {
    fn new(spec: AudioSpec) -> Self {
        Self {
            audio: AudioSegment::empty(spec),
            duration_ms: 0,
        }
    }

    fn push(&mut self, segment: &AudioSegment) -> Result<()> {
        self.audio.append(segment)?;
        self.duration_ms += segment.duration_ms();
        Ok(())
    }

    fn pause(&mut self, duration_ms: u64) -> Result<()> {
        let silence = AudioSegment::silent(duration_ms, self.audio.spec());
        self.push(&silence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynthesisError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every text it is asked to speak and returns 500 ms clips.
    struct Recorder {
        spoken: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Synthesizer for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn synthesize(
            &self,
            text: &str,
            _voice: &VoiceSettings,
        ) -> std::result::Result<AudioSegment, SynthesisError> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(AudioSegment::from_interleaved(
                AudioSpec::default(),
                vec![0.3; AudioSpec::default().frames_for_ms(500)],
            ))
        }
    }

    #[tokio::test]
    async fn unit_name_then_each_phrase_once() {
        let synth = Recorder {
            spoken: Mutex::new(Vec::new()),
        };
        let voice = VoiceSettings::default();
        let plan = LessonPlan::new()
            .with_unit("Unit 4", ["run", "climb"])
            .with_unit("Unit 5", ["kind"]);
        let result = LessonAssembler::new(&synth, &voice, PauseSchedule::default())
            .assemble(&plan)
            .await
            .unwrap();

        assert_eq!(
            *synth.spoken.lock().unwrap(),
            vec!["Unit 4", "run", "climb", "Unit 5", "kind"]
        );
        assert_eq!(result.stats.synthesis_calls, 5);
        assert_eq!(result.stats.units, 2);
        assert_eq!(result.stats.phrases, 3);
        assert_eq!(result.duration_ms, result.audio.duration_ms());
    }

    #[tokio::test]
    async fn second_repetition_is_identical_audio() {
        let synth = Recorder {
            spoken: Mutex::new(Vec::new()),
        };
        let voice = VoiceSettings::default();
        let pauses = PauseSchedule::new(0, 0, 0, 0);
        let plan = LessonPlan::new().with_unit("U", ["a"]);
        let result = LessonAssembler::new(&synth, &voice, pauses)
            .assemble(&plan)
            .await
            .unwrap();
        // unit name + two repetitions, no silence
        assert_eq!(result.duration_ms, 1500);
        let frames = AudioSpec::default().frames_for_ms(500);
        let samples = result.audio.samples();
        assert_eq!(&samples[frames..2 * frames], &samples[2 * frames..3 * frames]);
    }
}
