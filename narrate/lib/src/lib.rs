//! Text-to-speech narration with background audio mixing.
//!
//! This library turns text into spoken MP3 files through a speech provider
//! and, when a job names a background track, overlays the voice on that track
//! with ffmpeg.
//!
//! ## Core Types
//!
//! - [`AudioJob`] - One request: text, output file, language, optional background
//! - [`load_jobs`] - Read the `audio_jobs` list from a JSON job file
//!
//! ## Speech Synthesis
//!
//! - [`SpeechSynthesizer`] - Trait for text-to-speech providers
//! - [`GoogleTts`] - Google Translate speech provider
//! - [`synthesize_to_file`] - Synthesize and write a voice track
//!
//! ## Mixing
//!
//! - [`ExecutableLocator`] - Ordered search for the ffmpeg binary
//! - [`Mixer`] - Runs ffmpeg to overlay voice and background
//!
//! ## Batch Processing
//!
//! - [`BatchRunner`] - Processes jobs sequentially, isolating failures
//! - [`BatchReport`] - Per-batch summary of successes and failures

mod config;
pub mod discovery;
mod error;
mod job;
mod mixer;
mod runner;
pub mod tts;

pub use config::{DEFAULT_CONFIG_FILE, load_jobs};
pub use discovery::{ExecutableLocator, ProbeStrategy};
pub use error::{ConfigError, JobError, MixError, SynthesisError};
pub use job::{AudioJob, DEFAULT_BACKGROUND_VOLUME, DEFAULT_LANGUAGE};
pub use mixer::{MixSettings, Mixer, build_mix_args, mix_filter};
pub use runner::{BatchReport, BatchRunner, JobFailure, JobOutcome, RunnerConfig};
pub use tts::{DEFAULT_TTS_ENDPOINT, GoogleTts, SpeechSynthesizer, split_text, synthesize_to_file};
