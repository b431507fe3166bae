// top-level error for the public API

#[derive(serde::Serialize, Debug, thiserror::Error)]
pub enum SetupNasmError {
    #[error("unsupported platform: '{os}'")]
    UnsupportedPlatform { os: String },

    #[error("invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("expected entry `{entry}` missing from archive")]
    MissingArchiveEntry { entry: String },

    #[error("not implemented: {what} ({context})")]
    NotImplemented {
        what: &'static str,
        context: String,
    },

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("sanity check of the acquired executable failed: {0}")]
    SanityCheck(String),

    #[error("every enabled acquisition strategy failed; no nasm executable was produced")]
    StrategiesExhausted,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("{operation} failed for '{path}'")]
    FileSystem {
        operation: &'static str,
        path: std::path::PathBuf,
        #[source]
        #[serde(serialize_with = "std_io_error_to_string")]
        source: std::io::Error,
    },
}

pub type SetupNasmResult<T> = std::result::Result<T, SetupNasmError>;

impl SetupNasmError {
    pub fn file_system(
        operation: &'static str,
        path: impl Into<std::path::PathBuf>,
        err: impl Into<std::io::Error>,
    ) -> Self {
        Self::FileSystem {
            operation,
            path: path.into(),
            source: err.into(),
        }
    }
}

pub(crate) fn std_io_error_to_string<S>(e: &impl std::fmt::Display, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&e.to_string())
}
