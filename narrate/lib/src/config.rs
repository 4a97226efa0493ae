//! Job file loading.
//!
//! A job file is a JSON object whose `audio_jobs` key holds a list of
//! [`AudioJob`] entries:
//!
//! ```json
//! {
//!   "audio_jobs": [
//!     { "text": "Alarm", "output_filename": "a.mp3", "language": "en",
//!       "background_sound": "bg.wav", "background_volume": 0.3 }
//!   ]
//! }
//! ```
//!
//! Other top-level keys are ignored, so a job file can carry notes or
//! settings for other tools.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::job::AudioJob;

/// Default job file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Deserialize)]
struct JobFile {
    #[serde(default)]
    audio_jobs: Vec<AudioJob>,
}

/// Loads every job from the file at `path`.
///
/// An absent `audio_jobs` key or an empty list yields `Ok(vec![])`; whether
/// that is worth stopping for is left to the caller.
///
/// ## Errors
///
/// - [`ConfigError::NotFound`] if `path` does not exist
/// - [`ConfigError::Read`] if it cannot be read
/// - [`ConfigError::Parse`] if it is not a valid job document
///
/// ## Examples
///
/// ```no_run
/// use narrate_lib::load_jobs;
///
/// let jobs = load_jobs("config.json")?;
/// println!("{} jobs", jobs.len());
/// # Ok::<(), narrate_lib::ConfigError>(())
/// ```
pub fn load_jobs(path: impl AsRef<Path>) -> Result<Vec<AudioJob>, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let jobs = parse_jobs(&contents, path)?;
    debug!(path = %path.display(), count = jobs.len(), "loaded job file");
    Ok(jobs)
}

fn parse_jobs(contents: &str, path: &Path) -> Result<Vec<AudioJob>, ConfigError> {
    let file: JobFile = serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
        path: PathBuf::from(path),
        source,
    })?;
    Ok(file.audio_jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn load_jobs_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.json");
        let err = load_jobs(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { path: p } if p == path));
    }

    #[test]
    fn load_jobs_reads_jobs_in_order() {
        let (_dir, path) = write_config(
            r#"{
                "audio_jobs": [
                    {"text": "first", "output_filename": "1.mp3"},
                    {"text": "second", "output_filename": "2.mp3", "language": "en",
                     "background_sound": "rain.wav", "background_volume": 0.1}
                ]
            }"#,
        );
        let jobs = load_jobs(&path).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].text(), "first");
        assert_eq!(jobs[1].text(), "second");
        assert_eq!(jobs[1].language(), "en");
        assert_eq!(jobs[1].background_sound(), Some(Path::new("rain.wav")));
    }

    #[test]
    fn load_jobs_returns_empty_for_empty_list() {
        let (_dir, path) = write_config(r#"{"audio_jobs": []}"#);
        assert!(load_jobs(&path).unwrap().is_empty());
    }

    #[test]
    fn load_jobs_returns_empty_without_jobs_key() {
        let (_dir, path) = write_config(r#"{"notes": "nothing queued"}"#);
        assert!(load_jobs(&path).unwrap().is_empty());
    }

    #[test]
    fn load_jobs_rejects_malformed_json() {
        let (_dir, path) = write_config(r#"{"audio_jobs": [ {"text": "x", "#);
        let err = load_jobs(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_jobs_rejects_job_without_text() {
        let (_dir, path) = write_config(r#"{"audio_jobs": [{"output_filename": "x.mp3"}]}"#);
        let err = load_jobs(&path).unwrap_err();
        assert!(err.to_string().contains("missing field `text`"));
    }

    #[test]
    fn load_jobs_rejects_wrong_volume_type() {
        let (_dir, path) = write_config(
            r#"{"audio_jobs": [{"text": "x", "output_filename": "x.mp3", "background_volume": "loud"}]}"#,
        );
        assert!(matches!(load_jobs(&path).unwrap_err(), ConfigError::Parse { .. }));
    }

    #[test]
    fn load_jobs_rejects_non_object_document() {
        let (_dir, path) = write_config("[1, 2, 3]");
        assert!(matches!(load_jobs(&path).unwrap_err(), ConfigError::Parse { .. }));
    }
}
