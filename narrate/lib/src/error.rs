//! Error types for the narrate library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned while loading a job file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The job file does not exist.
    #[error("config file not found: {}", path.display())]
    NotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// The job file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// The path that was requested.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The job file is not a valid job document.
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        /// The path that was parsed.
        path: PathBuf,
        /// The serde error, including line and column.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors returned by a speech synthesis provider.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// There was nothing to say.
    #[error("no text to synthesize")]
    EmptyText,

    /// The provider does not speak the requested language.
    #[error("language not supported: {language}")]
    UnsupportedLanguage {
        /// The language code that was requested.
        language: String,
    },

    /// The HTTP request could not be completed.
    #[error("TTS request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("TTS provider returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the provider.
        body: String,
    },

    /// The response did not contain an audio payload.
    #[error("no audio stream in TTS response")]
    NoAudio,

    /// The audio payload was not valid base64.
    #[error("failed to decode audio payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The synthesized audio could not be written to disk.
    #[error("failed to write voice track {}: {source}", path.display())]
    Write {
        /// Destination of the voice track.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned by the ffmpeg mixer.
#[derive(Debug, Error)]
pub enum MixError {
    /// No usable executable was found by any discovery strategy.
    #[error("could not locate `{name}` (searched: {})", searched.join(", "))]
    ExecutableNotFound {
        /// The executable that was searched for.
        name: String,
        /// Human-readable description of every location probed.
        searched: Vec<String>,
    },

    /// An input audio file is missing.
    #[error("audio file not found: {}", path.display())]
    FileNotFound {
        /// The missing input.
        path: PathBuf,
    },

    /// The mixer process could not be started.
    #[error("failed to spawn {}: {source}", executable.display())]
    Spawn {
        /// The executable that failed to start.
        executable: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The mixer process exited with a non-zero status.
    #[error("ffmpeg failed with exit code {exit_code:?}: {stderr}")]
    Failed {
        /// The exit code, if the process was not killed by a signal.
        exit_code: Option<i32>,
        /// Diagnostic output captured from the process.
        stderr: String,
    },

    /// A filesystem operation around the mix failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned while processing a single job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Generating the voice track failed.
    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Mixing the voice track with the background failed.
    #[error("mixing failed: {0}")]
    Mix(#[from] MixError),
}
