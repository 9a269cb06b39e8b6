/// Crate-level error types for the folio content pipeline.
use std::path::PathBuf;

/// Every error names the resource, section, or reason for failure so the
/// diagnostic renderer can explain it without further context. None of these
/// is fatal to the pipeline: the controller contains each one to its section.
#[allow(clippy::error_impl_error, reason = "crate-wide error type shared by library and binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither the installed clipboard nor the selection fallback could copy.
    #[error("clipboard unavailable")]
    ClipboardUnavailable,

    /// A resource was missing, answered non-2xx, or carried a malformed payload.
    #[error(
        "fetch failed: {url}{}{}",
        status.map(|s| return format!(" (status {s})")).unwrap_or_default(),
        cause.as_deref().map(|c| return format!(": {c}")).unwrap_or_default()
    )]
    Fetch {
        /// Underlying transport or decoding failure, when there was one.
        cause: Option<String>,
        /// HTTP-style status code, when a response arrived.
        status: Option<u16>,
        /// URL that was requested, including any cache-busting parameter.
        url: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The shell has no `.section-content` container for this section.
    #[error("no `.section-content` container for section `{section}`")]
    MissingContainer {
        /// Section id the renderer tried to mount into.
        section: String,
    },

    /// A file the command needs does not exist on disk.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A section id is not part of the configured section list.
    #[error("unknown section: `{id}`")]
    UnknownSection {
        /// Section id that was requested.
        id: String,
    },

    /// The filesystem watcher could not be set up.
    #[error("watch failed: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },
}
