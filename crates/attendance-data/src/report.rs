//! Tabular attendance report.
//!
//! One row per roster student with fixed summary columns followed by one
//! column per session holding `""` (absent), the check-in time, or
//! `Excluded`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use attendance_core::calculations::AttendanceCalculator;
use attendance_core::error::{AttendanceError, Result};
use attendance_core::formatting::{format_percentage, format_session_list};
use attendance_core::session::Session;
use csv::WriterBuilder;
use tracing::debug;

use crate::aggregator::Roster;

/// Summary columns preceding the per-session columns.
pub const SUMMARY_COLUMNS: [&str; 10] = [
    "No.",
    "Name",
    "MatricNo",
    "Programme",
    "Year",
    "Attended",
    "Absent",
    "Percentage",
    "AbsentList",
    "AbsentDurationHours",
];

/// Prefix of the report file name; the newest session label is appended.
pub const REPORT_PREFIX: &str = "attendance_processed";

/// Order of the per-session columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SessionOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SessionOrder::Ascending),
            "desc" => Ok(SessionOrder::Descending),
            other => Err(format!("unknown session order: {other}")),
        }
    }
}

fn ordered_sessions(roster: &Roster, order: SessionOrder) -> Vec<Session> {
    let mut sessions = roster.sessions_ascending();
    if order == SessionOrder::Descending {
        sessions.reverse();
    }
    sessions
}

/// Column headers for `roster`.
pub fn report_header(roster: &Roster, order: SessionOrder) -> Vec<String> {
    SUMMARY_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(ordered_sessions(roster, order).iter().map(Session::label))
        .collect()
}

/// One row of cells per student, in roster order.
pub fn report_rows(roster: &Roster, order: SessionOrder) -> Vec<Vec<String>> {
    let sessions = ordered_sessions(roster, order);
    roster
        .students
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let mut row = vec![
                (i + 1).to_string(),
                s.name.clone(),
                s.matric_no.clone(),
                s.programme.clone(),
                s.year.clone(),
                s.attended_count.to_string(),
                s.absent_count.to_string(),
                format_percentage(AttendanceCalculator::record_percentage(s)),
                format_session_list(&s.absent_sessions),
                s.absent_duration_hours.to_string(),
            ];
            row.extend(sessions.iter().map(|session| {
                s.attendance
                    .get(session)
                    .map(|status| status.report_value().to_string())
                    .unwrap_or_default()
            }));
            row
        })
        .collect()
}

/// Write the report as CSV to any writer.
pub fn write_report<W: Write>(roster: &Roster, order: SessionOrder, writer: W) -> Result<()> {
    let csv_err = |e: csv::Error| AttendanceError::Csv(e.to_string());
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    csv_writer
        .write_record(report_header(roster, order))
        .map_err(csv_err)?;
    for row in report_rows(roster, order) {
        csv_writer.write_record(&row).map_err(csv_err)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// File name of the report for `roster`, e.g.
/// `attendance_processed_240401-09-1.csv`.
pub fn report_file_name(roster: &Roster) -> String {
    match roster.newest_session() {
        Some(session) => format!("{}_{}.csv", REPORT_PREFIX, session.label()),
        None => format!("{}.csv", REPORT_PREFIX),
    }
}

/// Write the report into `output_dir`, replacing any previous report of the
/// same name. Returns the path written.
pub fn write_report_file(roster: &Roster, order: SessionOrder, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(report_file_name(roster));
    let file = std::fs::File::create(&path)?;
    write_report(roster, order, file)?;
    debug!(path = %path.display(), rows = roster.students.len(), "report written");
    Ok(path)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
