//! Whole-buffer HTTP downloads and zip extraction.
//!
//! Release archives are a few megabytes, so they are fetched straight into
//! memory and never touch disk in compressed form. One attempt per URL; a
//! hung transfer blocks the run (known limitation of this workflow).

use std::{
    io::Read,
    path::{Path, PathBuf},
};

use crate::error::{SetupNasmError, SetupNasmResult};

/// Blocking GET returning the response body. Anything other than a 200
/// (transport errors included) is a `DownloadFailed`, which the fallback
/// controller treats as "this strategy is unavailable".
pub(crate) fn fetch_bytes(url: &str) -> SetupNasmResult<Vec<u8>> {
    let url = url::Url::parse(url)
        .map_err(|e| SetupNasmError::DownloadFailed(format!("invalid URL `{url}`: {e}")))?;

    crate::trace!("Downloading {url}");
    // ureq 3 turns non-2xx statuses into `Err` by default; disable that so
    // they arrive on the `Ok` branch and the non-200 arm below applies.
    let request = ureq::get(url.as_str())
        .config()
        .http_status_as_error(false)
        .build();
    match request.call() {
        Ok(resp) if resp.status() == 200 => {
            let mut buffer = Vec::new();
            resp.into_body()
                .into_reader()
                .read_to_end(&mut buffer)
                .map_err(|e| {
                    SetupNasmError::DownloadFailed(format!("reading response body of {url}: {e}"))
                })?;
            crate::trace!("Downloaded {} bytes", buffer.len());
            Ok(buffer)
        }
        Ok(resp) => Err(SetupNasmError::DownloadFailed(format!(
            "HTTP {} for {url}",
            resp.status()
        ))),
        Err(e) => Err(SetupNasmError::DownloadFailed(format!(
            "request for {url}: {e}"
        ))),
    }
}

/// Extract exactly one named entry into `dest_dir/<out_name>`, overwriting
/// whatever is there. Returns the path of the extracted file.
pub(crate) fn extract_zip_entry(
    archive: &[u8],
    entry_name: &str,
    dest_dir: &Path,
    out_name: &str,
) -> SetupNasmResult<PathBuf> {
    let mut zip = open_archive(archive)?;

    let mut entry = match zip.by_name(entry_name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(SetupNasmError::MissingArchiveEntry {
                entry: entry_name.to_string(),
            })
        }
        Err(e) => return Err(SetupNasmError::Internal(format!("reading zip entry: {e}"))),
    };

    let out = dest_dir.join(out_name);
    let mut out_file = std::fs::File::create(&out)
        .map_err(|e| SetupNasmError::file_system("create extracted file", &out, e))?;
    std::io::copy(&mut entry, &mut out_file)
        .map_err(|e| SetupNasmError::file_system("write extracted file", &out, e))?;

    Ok(out)
}

/// Extract a whole archive into `dest_dir`, keeping the archive's own
/// directory layout (NASM source zips namespace everything under
/// `nasm-<version>/`, and that folder becomes the build root).
pub(crate) fn extract_zip_all(archive: &[u8], dest_dir: &Path) -> SetupNasmResult<()> {
    let mut zip = open_archive(archive)?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| SetupNasmError::Internal(format!("reading zip entry: {e}")))?;

        // Skip entries with invalid or malicious names.
        let rel = match entry.enclosed_name() {
            Some(p) => p.to_owned(),
            None => continue,
        };
        let out = dest_dir.join(rel);

        if entry.is_dir() {
            std::fs::create_dir_all(&out).map_err(|e| {
                SetupNasmError::file_system("create directory from zip entry", &out, e)
            })?;
            continue;
        }

        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SetupNasmError::file_system("create parent directory from zip entry", parent, e)
            })?;
        }
        let mut out_file = std::fs::File::create(&out)
            .map_err(|e| SetupNasmError::file_system("create file from zip entry", &out, e))?;
        std::io::copy(&mut entry, &mut out_file)
            .map_err(|e| SetupNasmError::file_system("copy contents from zip entry", &out, e))?;

        // Restore Unix permissions when the archive recorded them.
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out, std::fs::Permissions::from_mode(mode)).map_err(|e| {
                SetupNasmError::file_system("set Unix permissions from zip entry", &out, e)
            })?;
        }
    }

    Ok(())
}

fn open_archive(
    archive: &[u8],
) -> SetupNasmResult<zip::ZipArchive<std::io::Cursor<&[u8]>>> {
    zip::ZipArchive::new(std::io::Cursor::new(archive))
        .map_err(|e| SetupNasmError::DownloadFailed(format!("corrupt or truncated archive: {e}")))
}
