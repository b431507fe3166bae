use serde::{Deserialize, Serialize};

use crate::error::{SetupNasmError, SetupNasmResult};

/// Platform tag exactly as it appears in NASM's release archive names.
///
/// The vendor publishes under `releasebuilds/<version>/<tag>/`, so the
/// `Display` form of this enum has to match those directory names byte for
/// byte; it is used verbatim when download URLs are built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Platform {
    Linux,
    Macosx,
    Win64,
}

impl Platform {
    /// Resolve the platform tag once per run: an explicit override wins,
    /// otherwise the host OS decides. Hosts the vendor does not publish for
    /// are a fatal error before any strategy runs.
    pub fn resolve(override_tag: Option<Platform>) -> SetupNasmResult<Platform> {
        if let Some(tag) = override_tag {
            return Ok(tag);
        }
        match std::env::consts::OS {
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::Macosx),
            "windows" => Ok(Platform::Win64),
            os => Err(SetupNasmError::UnsupportedPlatform { os: os.to_string() }),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Macosx => "macosx",
            Platform::Win64 => "win64",
        }
    }

    /// Name of the executable, both inside release archives and on disk.
    pub fn executable(&self) -> &'static str {
        match self {
            Platform::Win64 => "nasm.exe",
            _ => "nasm",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// First two dot-separated numeric components of a release string.
///
/// Trailing non-digits in a component are ignored, so `"2.14rc2"` parses as
/// `(2, 14)`. Returns `None` when either component has no leading digits.
pub fn parse_major_minor(version: &str) -> Option<(u32, u32)> {
    fn leading_number(part: &str) -> Option<u32> {
        let digits: &str = part
            .split_once(|c: char| !c.is_ascii_digit())
            .map_or(part, |(head, _)| head);
        if digits.is_empty() {
            None
        } else {
            digits.parse().ok()
        }
    }

    let mut parts = version.split('.');
    let major = leading_number(parts.next()?)?;
    let minor = leading_number(parts.next()?)?;
    Some((major, minor))
}

/// NASM shipped macOS binaries with a 32-bit code slice up to 2.14; modern
/// macOS refuses to run those with "Bad CPU type in executable". Versions
/// that do not parse are not gated and fail later in the strategies, where
/// the error is diagnosable.
pub fn prebuilt_broken_on_macos(version: &str) -> bool {
    match parse_major_minor(version) {
        Some((major, minor)) => major < 2 || (major == 2 && minor < 14),
        None => false,
    }
}
