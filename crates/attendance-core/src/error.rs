use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the attendance tracker.
///
/// The first group aborts a run: once a session name or file cannot be
/// trusted, neither can the roster built from it. The second group is
/// recoverable and is only ever logged while the offending row or student is
/// skipped.
#[derive(Error, Debug)]
pub enum AttendanceError {
    /// A session file name did not match `YYMMDD-HH-D`.
    #[error("Malformed session name {name:?}: {reason}")]
    MalformedSessionName { name: String, reason: String },

    /// The date or hour printed in a session header disagrees with the file name.
    #[error("Session {session} does not match its header timestamp {stamp:?}")]
    SessionHeaderMismatch { session: String, stamp: String },

    /// A session file has fewer non-blank lines than the export always emits.
    #[error("Truncated session file {path}: {lines} non-blank lines, need at least {required}")]
    TruncatedSessionFile {
        path: PathBuf,
        lines: usize,
        required: usize,
    },

    /// A row in an older session names a student outside the roster.
    #[error("Unknown student {name:?} ({matric_no}) in session {session}; row dropped")]
    UnknownStudentRow {
        name: String,
        matric_no: String,
        session: String,
    },

    /// A data row did not have enough fields for the selected row format.
    #[error("Malformed row in session {session}: {line:?}")]
    MalformedRow { session: String, line: String },

    /// The course code carries no usable hours-per-absence digit.
    #[error("Invalid course code {0:?}: no duration digit at position 8")]
    InvalidCourseCode(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sessions folder does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No session text files were found in the sessions folder.
    #[error("No session files found in {0}")]
    NoSessionFiles(PathBuf),

    /// The exclusion table exists but lacks a required column.
    #[error("Exclusion table {path}: {reason}")]
    ExclusionTable { path: PathBuf, reason: String },

    /// A JSON document could not be produced or parsed.
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A tabular file could not be read or written.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AttendanceError {
    /// Whether a run can continue after this error by dropping one data point.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AttendanceError::UnknownStudentRow { .. }
                | AttendanceError::MalformedRow { .. }
                | AttendanceError::InvalidCourseCode(_)
        )
    }
}

/// Convenience alias used throughout the attendance crates.
pub type Result<T> = std::result::Result<T, AttendanceError>;
