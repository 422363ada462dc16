//! Session file discovery and loading.
//!
//! Every session is one plain-text export named `YYMMDD-HH-D.txt`. Its
//! non-blank lines are laid out as five header lines, one table header line,
//! the data rows, and a trailing summary line the export always appends.

use std::path::{Path, PathBuf};

use attendance_core::error::{AttendanceError, Result};
use attendance_core::session::Session;
use tracing::debug;

/// Number of header lines preceding the table.
pub const HEADER_LINES: usize = 5;

/// Header lines, table header, at least one data row and the summary line.
pub const MIN_SESSION_LINES: usize = HEADER_LINES + 3;

// ── Public types ──────────────────────────────────────────────────────────────

/// A session export on disk together with the identity decoded from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    pub path: PathBuf,
    pub session: Session,
}

/// The non-blank lines of a session export, split by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionText {
    /// Exactly [`HEADER_LINES`] lines.
    pub header: Vec<String>,
    pub table_header: String,
    /// Table lines between the table header and the summary line. May still
    /// contain wrapped continuation lines.
    pub data_lines: Vec<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find every `.txt` export directly inside `dir`, newest session first.
///
/// Other files are ignored. Any `.txt` whose name is not a valid session name
/// aborts discovery with [`AttendanceError::MalformedSessionName`], so a typo
/// can never silently drop a session.
pub fn find_session_files(dir: &Path) -> Result<Vec<SessionFile>> {
    if !dir.is_dir() {
        return Err(AttendanceError::DataPathNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| AttendanceError::FileRead {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: e.into(),
        })?;
        let is_txt = entry
            .path()
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);
        if !entry.file_type().is_file() || !is_txt {
            continue;
        }
        let session = Session::from_path(entry.path())?;
        files.push(SessionFile {
            path: entry.into_path(),
            session,
        });
    }

    if files.is_empty() {
        return Err(AttendanceError::NoSessionFiles(dir.to_path_buf()));
    }

    files.sort_by(|a, b| b.session.cmp(&a.session).then_with(|| a.path.cmp(&b.path)));
    debug!("Found {} session files in {}", files.len(), dir.display());
    Ok(files)
}

/// Read a session export from disk and split it into header and data lines.
pub fn load_session_text(path: &Path) -> Result<SessionText> {
    let content = std::fs::read_to_string(path).map_err(|source| AttendanceError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    split_session_text(path, &content)
}

/// Split already-read export text. `path` is only used in error messages.
pub fn split_session_text(path: &Path, content: &str) -> Result<SessionText> {
    let lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.len() < MIN_SESSION_LINES {
        return Err(AttendanceError::TruncatedSessionFile {
            path: path.to_path_buf(),
            lines: lines.len(),
            required: MIN_SESSION_LINES,
        });
    }

    let to_owned = |slice: &[&str]| slice.iter().map(|l| l.to_string()).collect::<Vec<_>>();
    Ok(SessionText {
        header: to_owned(&lines[..HEADER_LINES]),
        table_header: lines[HEADER_LINES].to_string(),
        data_lines: to_owned(&lines[HEADER_LINES + 1..lines.len() - 1]),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
