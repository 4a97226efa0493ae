//! Overlaying a voice track on background audio with ffmpeg.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::discovery::ExecutableLocator;
use crate::error::MixError;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ffmpeg version (\S+)").expect("version pattern is valid")
});

/// Encoder settings for the mixed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixSettings {
    /// ffmpeg audio encoder name.
    pub codec: String,
    /// Encoder VBR quality (`-q:a`); lower is better for LAME.
    pub quality: u8,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            codec: "libmp3lame".to_string(),
            quality: 2,
        }
    }
}

/// Mixes audio files by running ffmpeg.
///
/// The executable path is resolved once, when the mixer is built, and
/// reused for every mix.
///
/// ## Examples
///
/// ```no_run
/// use narrate_lib::{ExecutableLocator, MixSettings, Mixer};
///
/// # async fn example() -> Result<(), narrate_lib::MixError> {
/// let mixer = Mixer::locate(&ExecutableLocator::ffmpeg(None), MixSettings::default())?;
/// mixer.mix("a.mp3".as_ref(), "bg.wav".as_ref(), "output/mixed_a.mp3".as_ref(), 0.3).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Mixer {
    executable: PathBuf,
    settings: MixSettings,
    working_dir: Option<PathBuf>,
}

impl Mixer {
    /// Resolves the executable with `locator` and builds a mixer around it.
    ///
    /// ## Errors
    ///
    /// Returns [`MixError::ExecutableNotFound`] if the locator comes up empty.
    pub fn locate(locator: &ExecutableLocator, settings: MixSettings) -> Result<Self, MixError> {
        let executable = locator.locate()?;
        Ok(Self::with_executable(executable, settings))
    }

    /// Builds a mixer around a known executable, skipping discovery.
    pub fn with_executable(executable: impl Into<PathBuf>, settings: MixSettings) -> Self {
        Self {
            executable: executable.into(),
            settings,
            working_dir: None,
        }
    }

    /// Runs ffmpeg from `dir` instead of the process working directory.
    ///
    /// Relative voice, background and output paths given to [`Mixer::mix`]
    /// are then resolved against `dir` as well.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn settings(&self) -> &MixSettings {
        &self.settings
    }

    /// Asks ffmpeg for its version string.
    ///
    /// Returns `None` if the process fails or prints something unexpected.
    pub async fn version(&self) -> Option<String> {
        let output = Command::new(&self.executable)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        parse_version(&String::from_utf8_lossy(&output.stdout))
    }

    /// Mixes `voice` over `background` scaled by `volume`, writing `output`.
    ///
    /// The result is as long as the shorter input. `volume` is forwarded to
    /// ffmpeg unchanged. The parent directory of `output` is created if it is
    /// missing and an existing file is overwritten. Returns the path of the
    /// written file, resolved against the working directory if one is set.
    ///
    /// ## Errors
    ///
    /// - [`MixError::FileNotFound`] if either input is missing
    /// - [`MixError::Spawn`] if ffmpeg cannot be started
    /// - [`MixError::Failed`] with ffmpeg's stderr if it exits non-zero
    pub async fn mix(
        &self,
        voice: &Path,
        background: &Path,
        output: &Path,
        volume: f64,
    ) -> Result<PathBuf, MixError> {
        let voice = self.resolve(voice);
        let background = self.resolve(background);
        let output = self.resolve(output);

        for input in [&voice, &background] {
            if !input.exists() {
                return Err(MixError::FileNotFound {
                    path: input.clone(),
                });
            }
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = build_mix_args(&voice, &background, &output, volume, &self.settings);
        debug!(executable = %self.executable.display(), ?args, "running ffmpeg");

        let mut command = Command::new(&self.executable);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let result = command.output().await.map_err(|source| MixError::Spawn {
            executable: self.executable.clone(),
            source,
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            error!(exit_code = ?result.status.code(), %stderr, "ffmpeg failed");
            return Err(MixError::Failed {
                exit_code: result.status.code(),
                stderr,
            });
        }

        info!(path = %output.display(), "mixed audio saved");
        Ok(output)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Filter graph that scales the second input and sums it with the first.
pub fn mix_filter(volume: f64) -> String {
    format!("[1:a]volume={volume}[bg];[0:a][bg]amix=inputs=2:duration=shortest:dropout_transition=0")
}

/// Builds the ffmpeg argument list for one mix.
pub fn build_mix_args(
    voice: &Path,
    background: &Path,
    output: &Path,
    volume: f64,
    settings: &MixSettings,
) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        voice.into(),
        "-i".into(),
        background.into(),
        "-filter_complex".into(),
        mix_filter(volume).into(),
        "-c:a".into(),
        settings.codec.clone().into(),
        "-q:a".into(),
        settings.quality.to_string().into(),
        output.into(),
    ]
}

fn parse_version(banner: &str) -> Option<String> {
    VERSION_RE
        .captures(banner)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
