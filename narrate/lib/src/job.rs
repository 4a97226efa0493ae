//! The job descriptor: one request to turn text into a (possibly mixed) audio file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Language used when a job does not name one.
pub const DEFAULT_LANGUAGE: &str = "ro";

/// Background multiplier used when a job does not name one.
pub const DEFAULT_BACKGROUND_VOLUME: f64 = 0.3;

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_background_volume() -> f64 {
    DEFAULT_BACKGROUND_VOLUME
}

/// A single unit of work for the batch runner.
///
/// Jobs are built once, either from the job file or from CLI flags, and are
/// only ever borrowed afterwards. Unknown fields in the job file are rejected.
///
/// ## Examples
///
/// ```
/// use narrate_lib::AudioJob;
///
/// let job = AudioJob::new("Alarm", "a.mp3")
///     .with_language("en")
///     .with_background("bg.wav", 0.3);
///
/// assert_eq!(job.language(), "en");
/// assert!(job.background_sound().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioJob {
    text: String,
    output_filename: PathBuf,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default)]
    background_sound: Option<PathBuf>,
    #[serde(default = "default_background_volume")]
    background_volume: f64,
}

impl AudioJob {
    /// Creates a voice-only job with the default language.
    pub fn new(text: impl Into<String>, output_filename: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            output_filename: output_filename.into(),
            language: default_language(),
            background_sound: None,
            background_volume: DEFAULT_BACKGROUND_VOLUME,
        }
    }

    /// Sets the synthesis language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Adds a background track mixed in at `volume`.
    #[must_use]
    pub fn with_background(mut self, path: impl Into<PathBuf>, volume: f64) -> Self {
        self.background_sound = Some(path.into());
        self.background_volume = volume;
        self
    }

    /// Sets the background multiplier without touching the track.
    #[must_use]
    pub fn with_background_volume(mut self, volume: f64) -> Self {
        self.background_volume = volume;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn output_filename(&self) -> &Path {
        &self.output_filename
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn background_sound(&self) -> Option<&Path> {
        self.background_sound.as_deref()
    }

    pub fn background_volume(&self) -> f64 {
        self.background_volume
    }

    /// Returns a short, log-friendly preview of the text.
    ///
    /// Text longer than `max_chars` is cut on a character boundary and
    /// suffixed with `...`.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}
