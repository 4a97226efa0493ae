//! Locating external executables.
//!
//! An [`ExecutableLocator`] walks an ordered list of [`ProbeStrategy`] values
//! and returns the first candidate that exists and is executable. The default
//! order for ffmpeg is:
//!
//! 1. an explicit override (`--ffmpeg` / `NARRATE_FFMPEG`), if given
//! 2. the directory holding the running binary (bundled distribution)
//! 3. the working directory
//! 4. `PATH`
//! 5. well-known install folders (Windows only)

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::MixError;

/// Base name of the mixing tool, without platform suffix.
pub const FFMPEG: &str = "ffmpeg";

/// One place to look for an executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStrategy {
    /// A specific file supplied by the user.
    Explicit(PathBuf),
    /// The directory containing the running binary.
    BesideExecutable,
    /// The process working directory.
    WorkingDirectory,
    /// The executable search path. `None` uses the process `PATH`.
    SearchPath(Option<OsString>),
    /// Platform-specific install folders.
    WellKnown,
    /// An arbitrary directory.
    Directory(PathBuf),
}

impl ProbeStrategy {
    fn describe(&self) -> String {
        match self {
            ProbeStrategy::Explicit(path) => path.display().to_string(),
            ProbeStrategy::BesideExecutable => "executable directory".to_string(),
            ProbeStrategy::WorkingDirectory => "working directory".to_string(),
            ProbeStrategy::SearchPath(_) => "PATH".to_string(),
            ProbeStrategy::WellKnown => "well-known install locations".to_string(),
            ProbeStrategy::Directory(dir) => dir.display().to_string(),
        }
    }

    fn probe(&self, file_name: &str, name: &str) -> Option<PathBuf> {
        match self {
            ProbeStrategy::Explicit(path) => is_executable(path).then(|| path.clone()),
            ProbeStrategy::BesideExecutable => {
                let exe = std::env::current_exe().ok()?;
                probe_dir(exe.parent()?, file_name)
            }
            ProbeStrategy::WorkingDirectory => {
                let cwd = std::env::current_dir().ok()?;
                probe_dir(&cwd, file_name)
            }
            ProbeStrategy::SearchPath(None) => which::which(name).ok(),
            ProbeStrategy::SearchPath(Some(paths)) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(name, Some(paths), cwd).ok()
            }
            ProbeStrategy::WellKnown => well_known_dirs()
                .iter()
                .find_map(|dir| probe_dir(dir, file_name)),
            ProbeStrategy::Directory(dir) => probe_dir(dir, file_name),
        }
    }
}

/// Finds an executable by trying strategies in order; first match wins.
///
/// ## Examples
///
/// ```no_run
/// use narrate_lib::ExecutableLocator;
///
/// let ffmpeg = ExecutableLocator::ffmpeg(None).locate()?;
/// println!("using {}", ffmpeg.display());
/// # Ok::<(), narrate_lib::MixError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ExecutableLocator {
    name: String,
    strategies: Vec<ProbeStrategy>,
}

impl ExecutableLocator {
    /// Creates a locator for `name` with an explicit strategy list.
    pub fn new(name: impl Into<String>, strategies: Vec<ProbeStrategy>) -> Self {
        Self {
            name: name.into(),
            strategies,
        }
    }

    /// The default ffmpeg search order, optionally preceded by an override.
    pub fn ffmpeg(explicit: Option<PathBuf>) -> Self {
        let mut strategies = Vec::with_capacity(5);
        if let Some(path) = explicit {
            strategies.push(ProbeStrategy::Explicit(path));
        }
        strategies.extend([
            ProbeStrategy::BesideExecutable,
            ProbeStrategy::WorkingDirectory,
            ProbeStrategy::SearchPath(None),
            ProbeStrategy::WellKnown,
        ]);
        Self::new(FFMPEG, strategies)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategies(&self) -> &[ProbeStrategy] {
        &self.strategies
    }

    /// Runs the strategies in order.
    ///
    /// ## Errors
    ///
    /// Returns [`MixError::ExecutableNotFound`] listing every location tried
    /// when no strategy yields an executable.
    pub fn locate(&self) -> Result<PathBuf, MixError> {
        let file_name = executable_file_name(&self.name);

        for strategy in &self.strategies {
            if let Some(path) = strategy.probe(&file_name, &self.name) {
                info!(
                    executable = %self.name,
                    path = %path.display(),
                    via = %strategy.describe(),
                    "located executable"
                );
                return Ok(path);
            }
            debug!(executable = %self.name, via = %strategy.describe(), "not found");
        }

        Err(MixError::ExecutableNotFound {
            name: self.name.clone(),
            searched: self.strategies.iter().map(ProbeStrategy::describe).collect(),
        })
    }
}

/// Appends the platform executable suffix (`.exe` on Windows).
pub fn executable_file_name(name: &str) -> String {
    format!("{name}{}", std::env::consts::EXE_SUFFIX)
}

fn probe_dir(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let candidate = dir.join(file_name);
    is_executable(&candidate).then_some(candidate)
}

#[cfg(not(target_os = "windows"))]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(target_os = "windows")]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(target_os = "windows")]
fn well_known_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(r"C:\ffmpeg\bin")];
    if let Some(program_files) = std::env::var_os("ProgramFiles") {
        dirs.push(PathBuf::from(program_files).join("ffmpeg").join("bin"));
    }
    if let Some(local) = std::env::var_os("LOCALAPPDATA") {
        dirs.push(
            PathBuf::from(local)
                .join("Microsoft")
                .join("WinGet")
                .join("Links"),
        );
    }
    dirs
}

#[cfg(not(target_os = "windows"))]
fn well_known_dirs() -> Vec<PathBuf> {
    Vec::new()
}
