//! End-to-end aggregation pipeline.
//!
//! Discovers the session exports, loads the exclusion table once, and folds
//! every session into a [`Roster`], newest first. Any structural problem in a
//! session name or file, or a header timestamp that contradicts the file
//! name, aborts the whole run before anything is returned.

use std::path::Path;

use attendance_core::error::{AttendanceError, Result};
use attendance_core::models::RawRow;
use tracing::{debug, info, warn};

use crate::aggregator::{Roster, RosterAggregator};
use crate::exclusion::ExclusionTable;
use crate::header::{extract_course_info, extract_session_stamp};
use crate::reader::{find_session_files, load_session_text, SessionFile};
use crate::row_parser::{is_data_row, FormatSelection, RowFormat};

/// Run the full aggregation.
///
/// 1. Discover and name-check every session export in `sessions_dir`.
/// 2. Load the exclusion table (absent table = nobody excused).
/// 3. For each session, newest first: load, check the header against the
///    file name, pick the row layout, parse the rows, fold them into the
///    roster.
pub fn aggregate_sessions(
    sessions_dir: &Path,
    exclusions_path: Option<&Path>,
    row_format: impl Into<FormatSelection>,
) -> Result<Roster> {
    let files = find_session_files(sessions_dir)?;
    let exclusions = match exclusions_path {
        Some(path) => ExclusionTable::load(path)?,
        None => ExclusionTable::empty(),
    };
    aggregate_with_table(&files, &exclusions, row_format)
}

/// Aggregate already-discovered files against a loaded exclusion table.
///
/// `files` must be ordered newest first, as returned by
/// [`find_session_files`].
pub fn aggregate_with_table(
    files: &[SessionFile],
    exclusions: &ExclusionTable,
    row_format: impl Into<FormatSelection>,
) -> Result<Roster> {
    let selection: FormatSelection = row_format.into();
    let mut aggregator = RosterAggregator::new(exclusions);

    for file in files {
        let text = load_session_text(&file.path)?;
        check_header_stamp(file, &text.header)?;
        let course = extract_course_info(&text.header);
        let label = file.session.label();
        let format = selection.resolve(&text.table_header);
        let rows = parse_rows(&label, &text.data_lines, format)?;

        debug!(
            "Session {}: {} layout, {} data lines, {} rows parsed",
            label,
            format,
            text.data_lines.len(),
            rows.len()
        );
        aggregator.fold_session(file.session, &course, &rows);
    }

    let roster = aggregator.finish();
    info!(
        students = roster.students.len(),
        sessions = roster.sessions.len(),
        dropped_rows = roster.dropped_rows,
        "aggregation complete"
    );
    Ok(roster)
}

/// Reject a session whose header prints a different date or start hour than
/// its file name. Exports without a timestamp pass unchecked.
fn check_header_stamp(file: &SessionFile, header: &[String]) -> Result<()> {
    let Some(stamp) = extract_session_stamp(header) else {
        debug!("Session {}: no header timestamp", file.session);
        return Ok(());
    };
    let hour_matches = stamp.hour.map_or(true, |hour| hour == file.session.hour);
    if stamp.date != file.session.date || !hour_matches {
        return Err(AttendanceError::SessionHeaderMismatch {
            session: file.session.label(),
            stamp: stamp.raw,
        });
    }
    Ok(())
}

/// Parse one data row, naming the session when it does not fit the layout.
pub fn parse_row(session_label: &str, line: &str, row_format: RowFormat) -> Result<RawRow> {
    row_format.parse(line).ok_or_else(|| AttendanceError::MalformedRow {
        session: session_label.to_string(),
        line: line.trim().to_string(),
    })
}

/// Parse every data row of a session. Rows that do not fit the layout are
/// logged and skipped.
pub fn parse_rows(
    session_label: &str,
    lines: &[String],
    row_format: RowFormat,
) -> Result<Vec<RawRow>> {
    let mut rows = Vec::new();
    for line in lines.iter().filter(|line| is_data_row(line)) {
        match parse_row(session_label, line, row_format) {
            Ok(row) => rows.push(row),
            Err(e) if e.is_recoverable() => warn!("{}", e),
            Err(e) => return Err(e),
        }
    }
    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
