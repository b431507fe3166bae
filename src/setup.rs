//! The public entry point: configuration, the fallback controller, the
//! sanity check, and search-path publishing.

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use serde::Serialize;

use crate::{
    error::{SetupNasmError, SetupNasmResult},
    exec,
    platform::Platform,
    strategy::{self, AcquireMethod},
};

/// Default destination, as a subdirectory of the caller's home directory.
pub const DEFAULT_DESTINATION: &str = "nasm";

/// Official NASM release archive root.
pub const NASM_RELEASES_URL: &str = "https://www.nasm.us/pub/nasm/releasebuilds";

/// Everything one run needs, with fluent setters and a terminal [`run`]
/// (Self::run). Nothing is persisted across runs; each invocation starts
/// from whatever is (not) on disk and ends with a verified executable on
/// `PATH` or an error.
///
/// ```rust,no_run
/// use setup_nasm::{NasmSetup, Platform};
///
/// fn main() -> setup_nasm::SetupNasmResult<()> {
///     let outcome = NasmSetup::new("2.15.05")
///         .destination("tools/nasm")
///         .from_source("false")
///         .run()?;
///     println!("nasm at {}", outcome.bin_path.display());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct NasmSetup {
    version: String,
    destination: PathBuf,
    platform: Option<Platform>,
    try_binary: bool,
    try_source: bool,
    release_mirror: String,
}

impl NasmSetup {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            destination: PathBuf::from(DEFAULT_DESTINATION),
            platform: None,
            try_binary: true,
            try_source: true,
            release_mirror: NASM_RELEASES_URL.to_string(),
        }
    }

    /// Where the executable ends up. Relative paths are resolved under the
    /// invoking user's home directory.
    pub fn destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.destination = dir.into();
        self
    }

    /// Skip host detection and use this platform tag verbatim.
    pub fn platform(mut self, tag: Platform) -> Self {
        self.platform = Some(tag);
        self
    }

    /// The action's tri-state string: `"true"` forces a source build,
    /// `"false"` forces the prebuilt binary, and anything else keeps both
    /// enabled with the binary preferred.
    pub fn from_source(mut self, flag: &str) -> Self {
        self.try_binary = flag != "true";
        self.try_source = flag != "false";
        self
    }

    /// Enable or disable the prebuilt-binary strategy directly.
    pub fn try_binary(mut self, enabled: bool) -> Self {
        self.try_binary = enabled;
        self
    }

    /// Enable or disable the source-build strategy directly.
    pub fn try_source(mut self, enabled: bool) -> Self {
        self.try_source = enabled;
        self
    }

    /// Alternative download root (mirrors, test servers). Trailing slashes
    /// are trimmed so URL construction stays uniform.
    pub fn release_mirror(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.release_mirror = base_url;
        self
    }

    /// Execute the whole workflow: resolve the platform, try each enabled
    /// strategy in order, sanity-check the result, publish the directory.
    ///
    /// Per-strategy errors are logged as warnings and consumed; the errors
    /// that escape from here are the fatal ones (unsupported platform,
    /// every strategy exhausted, or a broken executable).
    pub fn run(&self) -> SetupNasmResult<SetupOutcome> {
        let t0 = Instant::now();

        if self.version.is_empty() {
            return Err(SetupNasmError::InvalidConfig {
                field: "version",
                reason: "cannot be empty".into(),
            });
        }

        let platform = Platform::resolve(self.platform)?;
        let dest_dir = self.resolve_destination()?;
        std::fs::create_dir_all(&dest_dir)
            .map_err(|e| SetupNasmError::file_system("create destination directory", &dest_dir, e))?;

        let methods = strategy::plan(platform, &self.version, self.try_binary, self.try_source);

        let mut acquired = None;
        for method in methods {
            crate::info!("Trying the {method} of NASM {}...", self.version);
            match self.attempt(method, platform, &dest_dir) {
                Ok(bin_path) => {
                    acquired = Some((method, bin_path));
                    break;
                }
                Err(e) => crate::warn!("{method} did not work: {e}"),
            }
        }
        let (method, bin_path) = acquired.ok_or(SetupNasmError::StrategiesExhausted)?;

        sanity_check(&bin_path)?;
        publish_search_path(&dest_dir)?;

        Ok(SetupOutcome {
            duration: t0.elapsed(),
            version: self.version.clone(),
            platform,
            method,
            bin_path,
        })
    }

    fn attempt(
        &self,
        method: AcquireMethod,
        platform: Platform,
        dest_dir: &Path,
    ) -> SetupNasmResult<PathBuf> {
        match method {
            AcquireMethod::Binary => strategy::install_prebuilt(
                &self.release_mirror,
                &self.version,
                platform,
                dest_dir,
            ),
            AcquireMethod::Source => strategy::build_from_source(
                &self.release_mirror,
                &self.version,
                platform,
                dest_dir,
            ),
        }
    }

    fn resolve_destination(&self) -> SetupNasmResult<PathBuf> {
        if self.destination.is_absolute() {
            return Ok(self.destination.clone());
        }
        let user_dirs =
            directories::UserDirs::new().ok_or_else(|| SetupNasmError::InvalidConfig {
                field: "destination",
                reason: "relative path given but no home directory could be resolved".into(),
            })?;
        Ok(user_dirs.home_dir().join(&self.destination))
    }
}

/// Run the acquired executable once so a silently broken artifact fails the
/// run here instead of three CI steps later. Unlike strategy errors, this
/// one is fatal.
fn sanity_check(bin_path: &Path) -> SetupNasmResult<()> {
    let cwd = bin_path.parent().unwrap_or_else(|| Path::new("."));
    exec::run_in(cwd, bin_path, &["-v"]).map_err(|e| SetupNasmError::SanityCheck(e.to_string()))
}

/// Append `dir` to the process `PATH` (at most once, so repeated runs do
/// not pile up entries) and, when running under a GitHub Actions runner, to
/// the `GITHUB_PATH` file so later job steps inherit it too. Process-wide,
/// one-shot, no rollback.
pub fn publish_search_path(dir: &Path) -> SetupNasmResult<()> {
    let mut paths: Vec<PathBuf> = match std::env::var_os("PATH") {
        Some(value) => std::env::split_paths(&value).collect(),
        None => Vec::new(),
    };
    if !paths.iter().any(|p| p == dir) {
        paths.push(dir.to_path_buf());
        let joined = std::env::join_paths(paths)
            .map_err(|e| SetupNasmError::Internal(format!("joining PATH entries: {e}")))?;
        std::env::set_var("PATH", &joined);
        crate::info!("Added {} to PATH", dir.display());
    }

    if let Some(github_path) = std::env::var_os("GITHUB_PATH") {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&github_path)
            .map_err(|e| {
                SetupNasmError::file_system("open GITHUB_PATH file", PathBuf::from(&github_path), e)
            })?;
        writeln!(file, "{}", dir.display()).map_err(|e| {
            SetupNasmError::file_system("append to GITHUB_PATH file", PathBuf::from(&github_path), e)
        })?;
    }
    Ok(())
}

/// Summary of one successful run.
#[derive(Serialize, Debug)]
pub struct SetupOutcome {
    /// End-to-end wall-clock time.
    pub duration: Duration,
    /// Release that was installed.
    pub version: String,
    /// Platform tag the run resolved to.
    pub platform: Platform,
    /// Which strategy produced the executable.
    pub method: AcquireMethod,
    /// Absolute path of the verified executable.
    pub bin_path: PathBuf,
}

impl SetupOutcome {
    /// Directory that was appended to the search path.
    pub fn bin_dir(&self) -> Option<&Path> {
        self.bin_path.parent()
    }
}

impl std::fmt::Display for SetupOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use std::fmt::Write;
        writeln!(f, "SetupOutcome:")?;
        let mut indented = indenter::indented(f).with_str("   ");
        writeln!(indented, "Duration: {:?}", self.duration)?;
        writeln!(indented, "Version: {}", self.version)?;
        writeln!(indented, "Platform: {}", self.platform)?;
        writeln!(indented, "Acquired via: {}", self.method)?;
        writeln!(indented, "Executable: {}", self.bin_path.display())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    // ── from-source tri-state semantics ─────────────────────────────────────

    #[test]
    fn from_source_tri_state() {
        let cases = [
            ("true", false, true),
            ("false", true, false),
            ("", true, true),
            ("banana", true, true),
        ];
        for (flag, binary, source) in cases {
            let setup = NasmSetup::new("2.15.05").from_source(flag);
            assert_eq!(setup.try_binary, binary, "flag: {flag:?}");
            assert_eq!(setup.try_source, source, "flag: {flag:?}");
        }
    }

    #[test]
    fn empty_version_is_rejected_before_anything_runs() {
        let err = NasmSetup::new("").run().unwrap_err();
        assert!(matches!(err, SetupNasmError::InvalidConfig { field: "version", .. }));
    }

    #[test]
    fn disabling_both_strategies_exhausts_immediately() {
        let dest = tempfile::tempdir().unwrap();
        let err = NasmSetup::new("2.15.05")
            .platform(Platform::Linux)
            .destination(dest.path())
            .try_binary(false)
            .try_source(false)
            .run()
            .unwrap_err();
        assert!(matches!(err, SetupNasmError::StrategiesExhausted));
    }

    #[test]
    fn absolute_destination_is_used_verbatim() {
        let dest = tempfile::tempdir().unwrap();
        let setup = NasmSetup::new("2.15.05").destination(dest.path());
        assert_eq!(setup.resolve_destination().unwrap(), dest.path());
    }

    #[test]
    fn relative_destination_lands_under_home() {
        let setup = NasmSetup::new("2.15.05");
        let resolved = setup.resolve_destination().unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with(DEFAULT_DESTINATION));
    }

    #[test]
    fn mirror_trailing_slashes_are_trimmed() {
        let setup = NasmSetup::new("2.15.05").release_mirror("http://mirror.test/nasm///");
        assert_eq!(setup.release_mirror, "http://mirror.test/nasm");
    }

    // ── search-path publishing ──────────────────────────────────────────────

    #[test]
    #[serial]
    fn publish_appends_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let old_path = std::env::var_os("PATH");

        publish_search_path(dir.path()).unwrap();
        publish_search_path(dir.path()).unwrap();

        let path = std::env::var("PATH").unwrap();
        let hits = std::env::split_paths(&path)
            .filter(|p| p == dir.path())
            .count();
        assert_eq!(hits, 1, "directory must be appended exactly once");

        match old_path {
            Some(v) => std::env::set_var("PATH", v),
            None => std::env::remove_var("PATH"),
        }
    }

    #[test]
    #[serial]
    fn publish_writes_the_github_path_file() {
        let dir = tempfile::tempdir().unwrap();
        let gh_file = tempfile::NamedTempFile::new().unwrap();
        let old_path = std::env::var_os("PATH");
        let old_gh = std::env::var_os("GITHUB_PATH");
        std::env::set_var("GITHUB_PATH", gh_file.path());

        publish_search_path(dir.path()).unwrap();

        let contents = std::fs::read_to_string(gh_file.path()).unwrap();
        assert!(contents.contains(&dir.path().display().to_string()));

        match old_gh {
            Some(v) => std::env::set_var("GITHUB_PATH", v),
            None => std::env::remove_var("GITHUB_PATH"),
        }
        match old_path {
            Some(v) => std::env::set_var("PATH", v),
            None => std::env::remove_var("PATH"),
        }
    }

    // ── outcome display ─────────────────────────────────────────────────────

    #[test]
    fn outcome_display_mentions_the_essentials() {
        let outcome = SetupOutcome {
            duration: Duration::from_millis(1500),
            version: "2.15.05".to_string(),
            platform: Platform::Linux,
            method: AcquireMethod::Binary,
            bin_path: PathBuf::from("/home/ci/nasm/nasm"),
        };
        let rendered = outcome.to_string();
        assert!(rendered.contains("2.15.05"));
        assert!(rendered.contains("linux"));
        assert!(rendered.contains("prebuilt binary"));
        assert!(rendered.contains("/home/ci/nasm/nasm"));
    }
}
