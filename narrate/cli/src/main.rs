//! Narrate CLI - text-to-speech with optional background audio

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use narrate_lib::{
    AudioJob, BatchRunner, ConfigError, DEFAULT_BACKGROUND_VOLUME, DEFAULT_CONFIG_FILE,
    DEFAULT_LANGUAGE, DEFAULT_TTS_ENDPOINT, ExecutableLocator, GoogleTts, JobError, MixError,
    MixSettings, Mixer, RunnerConfig, load_jobs,
};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "narrate")]
#[command(version)]
#[command(about = "Turn text into speech and mix it over background audio", long_about = None)]
struct Cli {
    /// Job file to process when no ad hoc job is given
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Text for a single ad hoc job (requires --output)
    #[arg(long)]
    text: Option<String>,

    /// Voice track file for the ad hoc job (requires --text)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Background audio to mix under the ad hoc job
    #[arg(long, value_name = "PATH")]
    background: Option<PathBuf>,

    /// Background volume multiplier for the ad hoc job
    #[arg(long, default_value_t = DEFAULT_BACKGROUND_VOLUME, allow_negative_numbers = true)]
    volume: f64,

    /// Language code for the ad hoc job
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    lang: String,

    /// Folder receiving mixed files
    #[arg(long, value_name = "DIR", default_value = "output")]
    output_dir: PathBuf,

    /// MP3 encoder quality, 0 (best) to 9
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=9))]
    quality: u8,

    /// Use this ffmpeg binary instead of searching for one
    #[arg(long, value_name = "PATH", env = "NARRATE_FFMPEG")]
    ffmpeg: Option<PathBuf>,

    /// Speech provider host
    #[arg(long, hide = true, env = "NARRATE_TTS_ENDPOINT", default_value = DEFAULT_TTS_ENDPOINT)]
    tts_endpoint: String,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    log_verbosity: u8,

    /// Output logs as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// The ad hoc job, when both `--text` and `--output` are present.
    fn adhoc_job(&self) -> Option<AudioJob> {
        let (text, output) = (self.text.as_ref()?, self.output.as_ref()?);
        let job = AudioJob::new(text.clone(), output.clone()).with_language(self.lang.clone());
        Some(match &self.background {
            Some(background) => job.with_background(background.clone(), self.volume),
            None => job.with_background_volume(self.volume),
        })
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Mixer(#[from] MixError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Job(#[from] JobError),
}

/// Initialize tracing subscriber based on verbosity and output format
fn init_tracing(verbose: u8, json: bool) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn,narrate=info,narrate_lib=info".to_string(),
            1 => "info,narrate=debug,narrate_lib=debug".to_string(),
            _ => "debug,narrate=trace,narrate_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(verbose >= 1)
                    .with_level(true)
                    .with_file(verbose >= 2)
                    .with_line_number(verbose >= 2)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // ffmpeg is required by background jobs; fail before any synthesis.
    let settings = MixSettings {
        quality: cli.quality,
        ..MixSettings::default()
    };
    let mixer = Mixer::locate(&ExecutableLocator::ffmpeg(cli.ffmpeg.clone()), settings)?;
    if let Some(version) = mixer.version().await {
        info!(
            %version,
            path = %mixer.executable().display(),
            quality = mixer.settings().quality,
            "using ffmpeg"
        );
    }

    let tts = GoogleTts::new().with_endpoint(cli.tts_endpoint.clone());
    let config = RunnerConfig {
        output_dir: cli.output_dir.clone(),
        ..RunnerConfig::default()
    };
    let runner = BatchRunner::new(tts, mixer, config);

    if let Some(job) = cli.adhoc_job() {
        let outcome = runner.process_job(&job).await?;
        info!(path = %outcome.final_artifact().display(), "done");
        return Ok(());
    }

    if cli.text.is_some() || cli.output.is_some() {
        warn!("--text and --output must be given together; falling back to the job file");
    }

    let jobs = load_jobs(&cli.config)?;
    if jobs.is_empty() {
        warn!(config = %cli.config.display(), "no audio jobs found");
        return Ok(());
    }

    let report = runner.run_batch(&jobs).await;
    if !report.is_complete_success() {
        warn!(
            failed = report.failures.len(),
            total = report.total,
            "some jobs failed"
        );
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_verbosity, cli.json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}
