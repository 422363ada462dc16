//! Roster construction and per-session folding.
//!
//! Sessions must be fed newest first. The first session fixes the roster:
//! every row it yields becomes a [`StudentRecord`], and no later (older)
//! session can add anyone. Each later session is folded onto the existing
//! records; rows for unknown students are logged and dropped.

use std::collections::{HashMap, HashSet};

use attendance_core::calculations::AttendanceCalculator;
use attendance_core::error::AttendanceError;
use attendance_core::models::{CourseInfo, RawRow, StudentKey, StudentRecord};
use attendance_core::session::Session;
use tracing::{debug, warn};

use crate::exclusion::ExclusionTable;

// ── Roster ────────────────────────────────────────────────────────────────────

/// The finished aggregation. Read-only once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    /// Course details from the newest session header.
    pub course: CourseInfo,
    /// Sessions in the order they were folded (newest first).
    pub sessions: Vec<Session>,
    /// Students in the row order of the newest session.
    pub students: Vec<StudentRecord>,
    /// Rows from older sessions that matched nobody on the roster.
    pub dropped_rows: usize,
}

impl Roster {
    /// Processed sessions, oldest first.
    pub fn sessions_ascending(&self) -> Vec<Session> {
        let mut sessions = self.sessions.clone();
        sessions.sort();
        sessions
    }

    /// The newest session, which defined the roster.
    pub fn newest_session(&self) -> Option<Session> {
        self.sessions.first().copied()
    }
}

// ── RosterAggregator ──────────────────────────────────────────────────────────

/// Owns the roster while sessions are being folded in.
pub struct RosterAggregator<'a> {
    exclusions: &'a ExclusionTable,
    course: CourseInfo,
    sessions: Vec<Session>,
    students: Vec<StudentRecord>,
    by_key: HashMap<StudentKey, usize>,
    by_name: HashMap<String, Vec<usize>>,
    dropped_rows: usize,
}

impl<'a> RosterAggregator<'a> {
    pub fn new(exclusions: &'a ExclusionTable) -> Self {
        Self {
            exclusions,
            course: CourseInfo::default(),
            sessions: Vec::new(),
            students: Vec::new(),
            by_key: HashMap::new(),
            by_name: HashMap::new(),
            dropped_rows: 0,
        }
    }

    /// Fold one session's rows into the roster.
    ///
    /// The first call establishes the roster and the course details. Every
    /// roster student ends up with exactly one status for `session`: students
    /// with no row in it are recorded without a check-in.
    pub fn fold_session(&mut self, session: Session, course: &CourseInfo, rows: &[RawRow]) {
        if self.sessions.contains(&session) {
            warn!(session = %session, "session already folded; skipping");
            return;
        }
        let establishing = !self.has_roster();
        if establishing {
            self.course = course.clone();
        } else if course.course_code != self.course.course_code {
            warn!(
                session = %session,
                expected = %self.course.course_code,
                found = %course.course_code,
                "session belongs to a different course"
            );
        }
        self.sessions.push(session);

        let mut seen: HashSet<usize> = HashSet::new();
        for row in rows {
            let idx = match self.lookup(row) {
                Some(idx) => idx,
                None if establishing => self.enrol(row),
                None => {
                    let err = AttendanceError::UnknownStudentRow {
                        name: row.name.clone(),
                        matric_no: row.matric_no.clone(),
                        session: session.label(),
                    };
                    warn!("{}", err);
                    self.dropped_rows += 1;
                    continue;
                }
            };

            if !seen.insert(idx) {
                warn!(
                    session = %session,
                    student = %row.key(),
                    "duplicate row for student; keeping the first"
                );
                continue;
            }
            AttendanceCalculator::record(&mut self.students[idx], session, row.time_in.as_deref());
        }

        for (idx, record) in self.students.iter_mut().enumerate() {
            if seen.contains(&idx) {
                continue;
            }
            debug!(session = %session, student = %record.name, "no row in session; recording no check-in");
            AttendanceCalculator::record(record, session, None);
        }

        debug!(
            session = %session,
            rows = rows.len(),
            roster = self.students.len(),
            dropped = self.dropped_rows,
            "session folded"
        );
    }

    /// Hand over the finished roster.
    pub fn finish(self) -> Roster {
        Roster {
            course: self.course,
            sessions: self.sessions,
            students: self.students,
            dropped_rows: self.dropped_rows,
        }
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Whether the roster has been fixed by a first session.
    fn has_roster(&self) -> bool {
        !self.sessions.is_empty()
    }

    /// Find the roster entry for a row: exact matric-and-name first, then the
    /// name alone when either side lacks a matric number.
    fn lookup(&self, row: &RawRow) -> Option<usize> {
        let key = row.key();
        if let Some(&idx) = self.by_key.get(&key) {
            return Some(idx);
        }
        let candidates = self.by_name.get(&row.name)?;
        let mut fallback = candidates
            .iter()
            .copied()
            .filter(|&idx| key.matric_no.is_none() || self.students[idx].key().matric_no.is_none());
        match (fallback.next(), fallback.next()) {
            (Some(idx), None) => Some(idx),
            (Some(_), Some(_)) => {
                warn!(student = %row.name, "name matches several students; row not matched");
                None
            }
            _ => None,
        }
    }

    fn enrol(&mut self, row: &RawRow) -> usize {
        if let Some(existing) = self.by_name.get(&row.name) {
            warn!(
                student = %row.key(),
                others = existing.len(),
                "another student with the same name is already on the roster"
            );
        }
        let exclusions = self.exclusions.exclusions_for(&row.name);
        let idx = self.students.len();
        self.students
            .push(StudentRecord::from_row(row, &self.course, exclusions));
        self.by_key.insert(row.key(), idx);
        self.by_name.entry(row.name.clone()).or_default().push(idx);
        idx
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_core::models::AttendanceStatus;

    fn session(label: &str) -> Session {
        Session::parse(label).unwrap()
    }

    fn course() -> CourseInfo {
        CourseInfo {
            course_code: "SKMM2312".into(),
            course_name: "STATICS".into(),
            section: "01".into(),
        }
    }

    fn row(matric: &str, name: &str, time_in: Option<&str>) -> RawRow {
        RawRow {
            matric_no: matric.into(),
            name: name.into(),
            programme: "SEMM".into(),
            year: "2".into(),
            time_in: time_in.map(str::to_string),
        }
    }

    #[test]
    fn test_first_session_establishes_roster() {
        let excl = ExclusionTable::empty();
        let mut agg = RosterAggregator::new(&excl);
        agg.fold_session(
            session("240401-09-1"),
            &course(),
            &[row("A1", "ALI", Some("9:00 AM")), row("A2", "SITI", None)],
        );
        let roster = agg.finish();

        assert_eq!(roster.students.len(), 2);
        assert_eq!(roster.students[0].name, "ALI");
        assert_eq!(roster.students[1].name, "SITI");
        assert_eq!(roster.course, course());
        assert_eq!(roster.students[0].course.course_code, "SKMM2312");
    }

    #[test]
    fn test_older_session_cannot_grow_roster() {
        let excl = ExclusionTable::empty();
        let mut agg = RosterAggregator::new(&excl);
        agg.fold_session(session("240401-09-1"), &course(), &[row("A1", "ALI", None)]);
        agg.fold_session(
            session("240331-14-2"),
            &course(),
            &[row("A1", "ALI", Some("2:00 PM")), row("A9", "DROPPED OUT", None)],
        );
        let roster = agg.finish();

        assert_eq!(roster.students.len(), 1);
        assert_eq!(roster.dropped_rows, 1);
    }

    #[test]
    fn test_missing_row_recorded_as_no_check_in() {
        let excl = ExclusionTable::empty();
        let mut agg = RosterAggregator::new(&excl);
        agg.fold_session(
            session("240401-09-1"),
            &course(),
            &[row("A1", "ALI", Some("9:00 AM")), row("A2", "SITI", Some("9:01 AM"))],
        );
        agg.fold_session(session("240331-14-2"), &course(), &[row("A1", "ALI", Some("2:00 PM"))]);
        let roster = agg.finish();

        let siti = &roster.students[1];
        assert_eq!(siti.sessions_recorded(), 2);
        assert_eq!(siti.absent_count, 1);
        assert_eq!(siti.absent_duration_hours, 2);
        assert_eq!(siti.attendance[&session("240331-14-2")], AttendanceStatus::Absent);
    }

    #[test]
    fn test_duplicate_row_in_roster_session_is_ignored() {
        let excl = ExclusionTable::empty();
        let mut agg = RosterAggregator::new(&excl);
        agg.fold_session(
            session("240401-09-1"),
            &course(),
            &[row("A1", "ALI", None), row("A1", "ALI", Some("9:00 AM"))],
        );
        let roster = agg.finish();

        assert_eq!(roster.students.len(), 1);
        assert_eq!(roster.students[0].absent_count, 1);
        assert_eq!(roster.students[0].attended_count, 0);
    }

    #[test]
    fn test_same_name_different_matric_are_separate_students() {
        let excl = ExclusionTable::empty();
        let mut agg = RosterAggregator::new(&excl);
        agg.fold_session(
            session("240401-09-1"),
            &course(),
            &[row("A1", "NUR AINA", Some("9:00 AM")), row("A2", "NUR AINA", None)],
        );
        agg.fold_session(
            session("240331-14-2"),
            &course(),
            &[row("A2", "NUR AINA", Some("2:00 PM")), row("A1", "NUR AINA", None)],
        );
        let roster = agg.finish();

        assert_eq!(roster.students.len(), 2);
        assert_eq!(roster.students[0].attended_count, 1);
        assert_eq!(roster.students[0].absent_count, 1);
        assert_eq!(roster.students[1].attended_count, 1);
        assert_eq!(roster.students[1].absent_count, 1);
    }

    #[test]
    fn test_name_fallback_when_matric_missing() {
        let excl = ExclusionTable::empty();
        let mut agg = RosterAggregator::new(&excl);
        agg.fold_session(session("240401-09-1"), &course(), &[row("A1", "ALI", None)]);
        agg.fold_session(session("240331-14-2"), &course(), &[row("", "ALI", Some("2:00 PM"))]);
        let roster = agg.finish();

        assert_eq!(roster.dropped_rows, 0);
        assert_eq!(roster.students[0].attended_count, 1);
    }

    #[test]
    fn test_exclusions_captured_at_enrolment() {
        let excl = ExclusionTable::from_reader("Name,Exclude\nALI,240331-14-2\n".as_bytes()).unwrap();
        let mut agg = RosterAggregator::new(&excl);
        agg.fold_session(session("240401-09-1"), &course(), &[row("A1", "ALI", None)]);
        agg.fold_session(session("240331-14-2"), &course(), &[row("A1", "ALI", None)]);
        let roster = agg.finish();

        let ali = &roster.students[0];
        assert_eq!(ali.attendance[&session("240331-14-2")], AttendanceStatus::Excluded);
        assert_eq!(ali.attended_count, 1);
        assert_eq!(ali.absent_count, 1);
        assert_eq!(ali.absent_duration_hours, 1);
    }

    #[test]
    fn test_repeated_session_is_skipped() {
        let excl = ExclusionTable::empty();
        let mut agg = RosterAggregator::new(&excl);
        agg.fold_session(session("240401-09-1"), &course(), &[row("A1", "ALI", None)]);
        agg.fold_session(session("240401-09-1"), &course(), &[row("A1", "ALI", None)]);
        let roster = agg.finish();

        assert_eq!(roster.sessions.len(), 1);
        assert_eq!(roster.students[0].absent_count, 1);
    }

    #[test]
    fn test_sessions_ascending_and_newest() {
        let excl = ExclusionTable::empty();
        let mut agg = RosterAggregator::new(&excl);
        agg.fold_session(session("240401-09-1"), &course(), &[row("A1", "ALI", None)]);
        agg.fold_session(session("240331-14-2"), &course(), &[]);
        let roster = agg.finish();

        assert_eq!(roster.newest_session(), Some(session("240401-09-1")));
        assert_eq!(
            roster.sessions_ascending(),
            vec![session("240331-14-2"), session("240401-09-1")]
        );
    }
}
