//! Child-process plumbing shared by the strategies and the sanity check.

use std::{
    ffi::OsStr,
    path::Path,
    process::{Command, Stdio},
};

use crate::error::{SetupNasmError, SetupNasmResult};

/// Run a child process to completion with inherited stdio, so configure and
/// make output lands in the CI log live instead of buffered. Blocks until
/// the child exits; no timeout is enforced.
pub(crate) fn run_in<S: AsRef<OsStr>>(cwd: &Path, program: S, args: &[&str]) -> SetupNasmResult<()> {
    let mut cmd = Command::new(program.as_ref());
    cmd.args(args)
        .current_dir(cwd)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    crate::trace!("Running command: {:?}", cmd);
    let status = cmd.status().map_err(|e| SetupNasmError::FileSystem {
        operation: "spawn child process",
        path: Path::new(program.as_ref()).to_path_buf(),
        source: e,
    })?;

    if status.success() {
        return Ok(());
    }

    let name = Path::new(program.as_ref())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.as_ref().to_string_lossy().into_owned());
    match status.code() {
        Some(code) => Err(SetupNasmError::BuildFailed(format!(
            "{name} failed with exit code {code}"
        ))),
        None => Err(SetupNasmError::BuildFailed(format!(
            "{name} was terminated by a signal"
        ))),
    }
}

/// Change the mode bits to `755` (`rwxr-xr-x`). No-op on non-Unix targets.
pub(crate) fn make_executable(path: &Path) -> SetupNasmResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| SetupNasmError::file_system("make executable", path, e))?;
    }
    Ok(())
}
