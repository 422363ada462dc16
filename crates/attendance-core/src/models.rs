use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::session::Session;

/// One parsed data row of a session table, before it is matched to a student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Student matriculation number, e.g. `A20EM0123`.
    pub matric_no: String,
    /// Displayed student name; may contain internal spaces.
    pub name: String,
    /// Programme code the student is enrolled in.
    pub programme: String,
    /// Year of study as printed on the sheet.
    pub year: String,
    /// Check-in time such as `9:02 AM`, or `None` when no check-in was recorded.
    pub time_in: Option<String>,
}

impl RawRow {
    /// Identity of the student this row belongs to.
    pub fn key(&self) -> StudentKey {
        StudentKey::new(&self.matric_no, &self.name)
    }
}

/// Course details printed in a session header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInfo {
    pub course_code: String,
    pub course_name: String,
    pub section: String,
}

/// Outcome of one session for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    /// Checked in at the given time.
    Present(String),
    /// No check-in and no approved exclusion.
    Absent,
    /// No check-in, but the session is in the student's exclusion set.
    Excluded,
}

impl AttendanceStatus {
    /// The string written into a session column of the report.
    pub fn report_value(&self) -> &str {
        match self {
            AttendanceStatus::Present(time) => time.as_str(),
            AttendanceStatus::Absent => "",
            AttendanceStatus::Excluded => "Excluded",
        }
    }
}

/// Roster key: matric number plus name, or name alone when the sheet printed
/// no matric number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StudentKey {
    pub matric_no: Option<String>,
    pub name: String,
}

impl StudentKey {
    pub fn new(matric_no: &str, name: &str) -> Self {
        let matric_no = matric_no.trim();
        Self {
            matric_no: (!matric_no.is_empty()).then(|| matric_no.to_string()),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for StudentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matric_no {
            Some(m) => write!(f, "{} ({})", self.name, m),
            None => f.write_str(&self.name),
        }
    }
}

/// Everything known about one student across the semester.
///
/// Identity fields and course details come from the newest session and are
/// never overwritten. Counters move only through
/// [`AttendanceCalculator::record`](crate::calculations::AttendanceCalculator::record).
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub name: String,
    pub matric_no: String,
    pub programme: String,
    pub year: String,
    pub course: CourseInfo,
    /// Exactly one entry per processed session.
    pub attendance: BTreeMap<Session, AttendanceStatus>,
    pub attended_count: u32,
    pub absent_count: u32,
    pub absent_duration_hours: u32,
    /// Sessions marked [`AttendanceStatus::Absent`], in processing order.
    pub absent_sessions: Vec<Session>,
    /// Sessions pre-approved as excused for this student.
    pub exclusions: BTreeSet<Session>,
}

impl StudentRecord {
    /// Start a record from a row of the newest session.
    pub fn from_row(row: &RawRow, course: &CourseInfo, exclusions: BTreeSet<Session>) -> Self {
        Self {
            name: row.name.clone(),
            matric_no: row.matric_no.clone(),
            programme: row.programme.clone(),
            year: row.year.clone(),
            course: course.clone(),
            attendance: BTreeMap::new(),
            attended_count: 0,
            absent_count: 0,
            absent_duration_hours: 0,
            absent_sessions: Vec::new(),
            exclusions,
        }
    }

    pub fn key(&self) -> StudentKey {
        StudentKey::new(&self.matric_no, &self.name)
    }

    /// Number of sessions folded into this record so far.
    pub fn sessions_recorded(&self) -> usize {
        self.attendance.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(matric: &str, name: &str) -> RawRow {
        RawRow {
            matric_no: matric.to_string(),
            name: name.to_string(),
            programme: "SEMM".to_string(),
            year: "2".to_string(),
            time_in: None,
        }
    }

    #[test]
    fn test_report_value() {
        assert_eq!(AttendanceStatus::Present("9:02 AM".into()).report_value(), "9:02 AM");
        assert_eq!(AttendanceStatus::Absent.report_value(), "");
        assert_eq!(AttendanceStatus::Excluded.report_value(), "Excluded");
    }

    #[test]
    fn test_key_uses_matric_when_present() {
        let key = row("A20EM0001", "ALI BIN ABU").key();
        assert_eq!(key.matric_no.as_deref(), Some("A20EM0001"));
        assert_eq!(key.to_string(), "ALI BIN ABU (A20EM0001)");
    }

    #[test]
    fn test_key_falls_back_to_name() {
        let key = row("  ", "ALI BIN ABU").key();
        assert!(key.matric_no.is_none());
        assert_eq!(key.to_string(), "ALI BIN ABU");
    }

    #[test]
    fn test_same_name_different_matric_are_distinct() {
        assert_ne!(row("A1", "ALI").key(), row("A2", "ALI").key());
    }

    #[test]
    fn test_from_row_starts_empty() {
        let course = CourseInfo {
            course_code: "SKMM2313".into(),
            course_name: "MECHANICS".into(),
            section: "01".into(),
        };
        let rec = StudentRecord::from_row(&row("A1", "ALI"), &course, BTreeSet::new());
        assert_eq!(rec.sessions_recorded(), 0);
        assert_eq!(rec.attended_count, 0);
        assert_eq!(rec.course.section, "01");
        assert_eq!(rec.key(), row("A1", "ALI").key());
    }
}
