//! Post-processing of downloaded chord sheets into `song.json`.
//!
//! The converter is a TypeScript script from the frontend, run through
//! `npx tsx`. It is optional: when the script cannot be found the step is
//! skipped entirely.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use super::SongError;

/// Name of the generated metadata file.
pub const SONG_JSON_FILE: &str = "song.json";

/// Runs `<program> <args..> <script> <chords.html> <song.json>`.
#[derive(Debug, Clone)]
pub struct Songify {
    program: OsString,
    args: Vec<OsString>,
    script: PathBuf,
    workdir: Option<PathBuf>,
}

impl Songify {
    /// The standard invocation: `npx --yes --no-install tsx <script>`.
    pub fn npx(script: PathBuf, workdir: Option<PathBuf>) -> Self {
        Self::with_command("npx", ["--yes", "--no-install", "tsx"], script, workdir)
    }

    /// Custom launcher; the script path and the two file paths are appended.
    pub fn with_command<I, S>(
        program: impl Into<OsString>,
        args: I,
        script: PathBuf,
        workdir: Option<PathBuf>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            script,
            workdir,
        }
    }

    /// Locates the converter for a songs directory.
    ///
    /// The repository root is the parent of `songs_dir`. `script_override`
    /// (the `SONGIFY_SCRIPT` setting) is taken as-is when absolute and
    /// relative to the repository root otherwise; the default is
    /// `<root>/frontend/scripts/songify.ts`. Returns `None` when the script
    /// does not exist.
    pub fn discover(songs_dir: &Path, script_override: Option<&str>) -> Option<Self> {
        let repo_root = songs_dir.parent().unwrap_or(songs_dir);
        let frontend_dir = repo_root.join("frontend");

        let script = match script_override.filter(|s| !s.is_empty()) {
            Some(path) if Path::new(path).is_absolute() => PathBuf::from(path),
            Some(path) => repo_root.join(path),
            None => frontend_dir.join("scripts").join("songify.ts"),
        };

        if !script.exists() {
            debug!("songify script not found at {}", script.display());
            return None;
        }

        let workdir = frontend_dir.is_dir().then_some(frontend_dir);
        Some(Self::npx(script, workdir))
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Converts `chords_path` into a `song.json` next to it.
    ///
    /// A non-zero exit becomes [`SongError::Songify`] carrying the trimmed
    /// stderr of the process.
    pub async fn run(&self, chords_path: &Path) -> Result<PathBuf, SongError> {
        let output_path = chords_path
            .parent()
            .map(|dir| dir.join(SONG_JSON_FILE))
            .unwrap_or_else(|| PathBuf::from(SONG_JSON_FILE));

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(&self.script)
            .arg(chords_path)
            .arg(&output_path)
            .kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let file_name = chords_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let output = cmd
            .output()
            .await
            .map_err(|e| SongError::Songify(format!("songify {}: {}", file_name, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SongError::Songify(format!(
                "songify {}: {} ({})",
                file_name,
                output.status,
                stderr.trim()
            )));
        }

        info!("Generated {}", output_path.display());
        Ok(output_path)
    }
}
