//! Source-build strategy: fetch the source zip, run the usual
//! configure-then-make dance, and move the freshly built executable to its
//! canonical place.

use std::path::{Path, PathBuf};

use crate::{
    error::{SetupNasmError, SetupNasmResult},
    exec, fetch,
    platform::Platform,
};

/// Append-only portability fixes for older releases, keyed by platform set
/// and a version substring. Applied after `configure` and before `make`.
///
/// NASM's autoconf setup misdetects several libc functions on these
/// platform/release combinations; appending the defines (or the missing
/// include) is how the upstream workflow has always worked around it.
/// Nothing here is idempotent: running the strategy twice on one tree
/// appends the lines twice, an accepted limitation.
struct CompatPatch {
    platforms: &'static [Platform],
    version_contains: &'static str,
    file: &'static str,
    lines: &'static [&'static str],
}

const COMPAT_PATCHES: &[CompatPatch] = &[
    CompatPatch {
        platforms: &[Platform::Linux, Platform::Macosx],
        version_contains: "2.14",
        file: "include/compiler.h",
        lines: &["#include <time.h>"],
    },
    CompatPatch {
        platforms: &[Platform::Macosx],
        version_contains: "2.14",
        file: "config/config.h",
        lines: &[
            "#define HAVE_SNPRINTF 1",
            "#define HAVE_VSNPRINTF 1",
            "#define HAVE_INTTYPES_H 1",
        ],
    },
    CompatPatch {
        platforms: &[Platform::Macosx],
        version_contains: "2.13",
        file: "config/config.h",
        lines: &[
            "#define HAVE_STRLCPY 1",
            "#define HAVE_DECL_STRLCPY 1",
            "#define HAVE_SNPRINTF 1",
            "#define HAVE_VSNPRINTF 1",
            "#define HAVE_INTTYPES_H 1",
        ],
    },
    // 2.12 predates the config/ subdirectory.
    CompatPatch {
        platforms: &[Platform::Macosx],
        version_contains: "2.12",
        file: "config.h",
        lines: &[
            "#define HAVE_STRLCPY 1",
            "#define HAVE_DECL_STRLCPY 1",
            "#define HAVE_SNPRINTF 1",
            "#define HAVE_VSNPRINTF 1",
        ],
    },
];

/// Download `nasm-<version>.zip`, unpack it under the destination directory
/// (the archive's own `nasm-<version>/` folder becomes the build root),
/// configure, patch, build only the assembler, and relocate it to
/// `<destination>/<exe>`.
pub(crate) fn build_from_source(
    mirror: &str,
    version: &str,
    platform: Platform,
    dest_dir: &Path,
) -> SetupNasmResult<PathBuf> {
    let exe = platform.executable();
    let url = format!("{mirror}/{version}/nasm-{version}.zip");

    let archive = fetch::fetch_bytes(&url)?;
    fetch::extract_zip_all(&archive, dest_dir)?;

    let build_root = dest_dir.join(format!("nasm-{version}"));
    let configure = build_root.join("configure");
    if !configure.is_file() {
        return Err(SetupNasmError::BuildFailed(format!(
            "configure script missing from {}; unexpected source archive layout",
            build_root.display()
        )));
    }

    // Zip archives tend to carry DOS line endings, which break the shebang
    // on non-Windows machines.
    dos2unix(&configure)?;
    exec::make_executable(&configure)?;
    exec::run_in(&build_root, &configure, &[])?;

    apply_compat_patches(&build_root, platform, version)?;

    // Only the assembler itself; the full distribution drags in docs and
    // the rdoff tools.
    exec::run_in(&build_root, "make", &["nasm"])?;

    let built = build_root.join(exe);
    if !built.is_file() {
        return Err(SetupNasmError::BuildFailed(format!(
            "make reported success but {} was not produced",
            built.display()
        )));
    }
    let bin_path = dest_dir.join(exe);
    std::fs::rename(&built, &bin_path)
        .map_err(|e| SetupNasmError::file_system("relocate built executable", &bin_path, e))?;
    exec::make_executable(&bin_path)?;

    crate::debug!("Compiled NASM {} in {}", version, build_root.display());
    Ok(bin_path)
}

/// Apply every patch whose platform set and version substring match.
pub(crate) fn apply_compat_patches(
    build_root: &Path,
    platform: Platform,
    version: &str,
) -> SetupNasmResult<()> {
    for patch in COMPAT_PATCHES {
        if !patch.platforms.contains(&platform) || !version.contains(patch.version_contains) {
            continue;
        }
        let path = build_root.join(patch.file);
        crate::debug!("Patching {} for NASM {}", path.display(), version);
        append_lines(&path, patch.lines)?;
    }
    Ok(())
}

fn append_lines(path: &Path, lines: &[&str]) -> SetupNasmResult<()> {
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| SetupNasmError::file_system("open file for patching", path, e))?;

    let mut content = String::from("\n");
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    file.write_all(content.as_bytes())
        .map_err(|e| SetupNasmError::file_system("append patch lines", path, e))?;
    Ok(())
}

/// Rewrite CRLF line endings in place, staging through a sibling file so a
/// crash mid-write never leaves a half-converted script behind.
fn dos2unix(path: &Path) -> SetupNasmResult<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SetupNasmError::file_system("read script", path, e))?;
    if !content.contains("\r\n") {
        return Ok(());
    }

    let unixified = content.replace("\r\n", "\n");
    let staged = path.with_extension("unix");
    std::fs::write(&staged, unixified)
        .map_err(|e| SetupNasmError::file_system("write converted script", &staged, e))?;
    std::fs::rename(&staged, path)
        .map_err(|e| SetupNasmError::file_system("replace script", path, e))?;
    Ok(())
}
