//! setup-nasm — install a pinned NASM release
//! ==========================================
//!
//! A thin command-line wrapper around the `setup_nasm` library that
//! **downloads or builds** the requested [NASM](https://www.nasm.us)
//! release, verifies it runs, and appends its directory to `PATH` (and to
//! the `GITHUB_PATH` file when running inside a GitHub Actions job).
//!
//! ---
//! ## Quick start
//! ```bash
//! setup-nasm 2.15.05
//! ```
//!
//! ## Flags
//! | Flag / arg                 | Default                       | Purpose                                                |
//! |----------------------------|-------------------------------|--------------------------------------------------------|
//! | `VERSION`                  | _(required)_                  | Exact release to install, e.g. `2.15.05`.              |
//! | `--destination <DIR>`      | `nasm` (under home)           | Where the executable lands.                            |
//! | `--platform <TAG>`         | detected from the host        | Force `linux`, `macosx`, or `win64`.                   |
//! | `--from-source <BOOL-ISH>` | _(empty)_                     | `true`: source build only; `false`: prebuilt only.     |
//!
//! Every flag also reads the GitHub-Actions-style environment variable
//! (`INPUT_VERSION`, `INPUT_DESTINATION`, `INPUT_PLATFORM`,
//! `INPUT_FROM_SOURCE`), so the binary drops straight into a composite
//! action step.
//!
//! ## Exit codes
//! * `0` — NASM installed, verified, and on `PATH`
//! * `1` — setup error (download, build, or sanity check)
//! * `2` — argument parsing error (from **clap**)

use std::process::ExitCode;

use setup_nasm::{NasmSetup, Platform};
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Parser)]
#[command(name = "setup-nasm", version, about, disable_version_flag = true)]
struct Cli {
    /// Exact NASM release to install (e.g. "2.15.05").
    #[arg(value_name = "VERSION", env = "INPUT_VERSION")]
    version: String,

    /// Directory for the executable; relative paths are resolved under the
    /// home directory.
    #[arg(long, value_name = "DIR", env = "INPUT_DESTINATION")]
    destination: Option<std::path::PathBuf>,

    /// Skip host detection and download for this platform instead.
    #[arg(long, value_name = "TAG", env = "INPUT_PLATFORM")]
    platform: Option<Platform>,

    /// "true" builds from source only, "false" uses the prebuilt binary
    /// only, anything else tries the binary first with a source fallback.
    #[arg(long, value_name = "BOOL-ISH", env = "INPUT_FROM_SOURCE", default_value = "")]
    from_source: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        // Diagnostics go to stderr; stdout carries only the outcome report.
        .with_writer(std::io::stderr)
        .init();

    let cli = <Cli as clap::Parser>::parse();

    let mut setup = NasmSetup::new(cli.version).from_source(&cli.from_source);
    if let Some(destination) = cli.destination {
        setup = setup.destination(destination);
    }
    if let Some(platform) = cli.platform {
        setup = setup.platform(platform);
    }

    match setup.run() {
        Ok(outcome) => {
            println!("{outcome}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
