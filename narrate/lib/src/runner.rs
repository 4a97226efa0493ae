//! Sequential batch processing of audio jobs.
//!
//! Every job is attempted exactly once, in order. A failing job is logged
//! and recorded in the [`BatchReport`]; it never stops the jobs after it.
//! Jobs are not run concurrently because ffmpeg and the voice files share
//! the working directory.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::JobError;
use crate::job::AudioJob;
use crate::mixer::Mixer;
use crate::tts::{SpeechSynthesizer, synthesize_to_file};

/// Characters of job text shown in log lines.
const PREVIEW_CHARS: usize = 50;

/// Runner settings that are not tied to a single job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Folder receiving mixed files; created on demand.
    pub output_dir: PathBuf,
    /// Prefix prepended to the voice file name for the mixed file.
    pub mixed_prefix: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            mixed_prefix: "mixed_".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Where the mixed artifact for `voice` is written:
    /// `<output_dir>/<mixed_prefix><file name>`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use narrate_lib::RunnerConfig;
    ///
    /// let config = RunnerConfig::default();
    /// assert_eq!(
    ///     config.mixed_path(Path::new("a.mp3")),
    ///     Path::new("output/mixed_a.mp3"),
    /// );
    /// ```
    pub fn mixed_path(&self, voice: &Path) -> PathBuf {
        let file_name = voice
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.output_dir.join(format!("{}{file_name}", self.mixed_prefix))
    }
}

/// Files produced by one successful job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// The synthesized voice track.
    pub voice: PathBuf,
    /// The mixed artifact, when the job had a background track.
    pub mixed: Option<PathBuf>,
}

impl JobOutcome {
    /// The file a caller should treat as the job's result.
    pub fn final_artifact(&self) -> &Path {
        self.mixed.as_deref().unwrap_or(&self.voice)
    }
}

/// A job that failed during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    /// 1-based position of the job in the batch.
    pub index: usize,
    /// Human-readable description of the failure.
    pub error: String,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of jobs attempted.
    pub total: usize,
    /// Outcomes of the jobs that succeeded, in order.
    pub completed: Vec<JobOutcome>,
    /// Jobs that failed, in order.
    pub failures: Vec<JobFailure>,
}

impl BatchReport {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs jobs through a synthesizer and, where needed, the mixer.
pub struct BatchRunner<S> {
    synthesizer: S,
    mixer: Mixer,
    config: RunnerConfig,
}

impl<S: SpeechSynthesizer> BatchRunner<S> {
    pub fn new(synthesizer: S, mixer: Mixer, config: RunnerConfig) -> Self {
        Self {
            synthesizer,
            mixer,
            config,
        }
    }

    /// Synthesizes one job and mixes it if it names a background track.
    ///
    /// ## Errors
    ///
    /// Returns the first [`JobError`] hit; nothing is retried.
    pub async fn process_job(&self, job: &AudioJob) -> Result<JobOutcome, JobError> {
        info!(text = %job.preview(PREVIEW_CHARS), language = job.language(), "processing job");

        let voice = synthesize_to_file(
            &self.synthesizer,
            job.text(),
            job.language(),
            job.output_filename(),
        )
        .await?;

        let Some(background) = job.background_sound() else {
            return Ok(JobOutcome { voice, mixed: None });
        };

        let volume = job.background_volume();
        if !(0.0..=1.0).contains(&volume) {
            warn!(volume, "background volume outside 0.0-1.0, passing it to ffmpeg unchanged");
        }

        let mixed_path = self.config.mixed_path(&voice);
        let mixed = self.mixer.mix(&voice, background, &mixed_path, volume).await?;
        Ok(JobOutcome {
            voice,
            mixed: Some(mixed),
        })
    }

    /// Processes `jobs` in order, isolating each job's failure.
    pub async fn run_batch(&self, jobs: &[AudioJob]) -> BatchReport {
        let total = jobs.len();
        info!(total, "processing audio jobs");

        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };

        for (idx, job) in jobs.iter().enumerate() {
            let index = idx + 1;
            info!(job = index, total, "starting job");
            match self.process_job(job).await {
                Ok(outcome) => report.completed.push(outcome),
                Err(e) => {
                    error!(
                        job = index,
                        total,
                        text = %job.preview(PREVIEW_CHARS),
                        error = %e,
                        "failed to process job"
                    );
                    report.failures.push(JobFailure {
                        index,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            total,
            succeeded = report.completed.len(),
            failed = report.failures.len(),
            "batch processing complete"
        );
        report
    }
}
