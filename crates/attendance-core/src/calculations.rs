use crate::models::{AttendanceStatus, StudentRecord};
use crate::session::Session;

// ── AttendanceCalculator ──────────────────────────────────────────────────────

/// Stateless collection of attendance bookkeeping rules.
pub struct AttendanceCalculator;

impl AttendanceCalculator {
    /// Classify one session outcome and fold it into `record`.
    ///
    /// * A check-in time makes the student present.
    /// * No check-in on an excluded session counts as attended, not absent.
    /// * Anything else is an absence charged at the session's duration.
    ///
    /// Returns the status stored for the session. A session already present in
    /// the record is left untouched and its existing status returned, so the
    /// counters never see the same session twice.
    pub fn record(
        record: &mut StudentRecord,
        session: Session,
        time_in: Option<&str>,
    ) -> AttendanceStatus {
        if let Some(existing) = record.attendance.get(&session) {
            return existing.clone();
        }

        let status = Self::classify(session, time_in, record);
        match &status {
            AttendanceStatus::Present(_) | AttendanceStatus::Excluded => {
                // TODO: confirm with the faculty whether excused absences should
                // leave the percentage denominator instead of counting as attended.
                record.attended_count += 1;
            }
            AttendanceStatus::Absent => {
                record.absent_count += 1;
                record.absent_sessions.push(session);
                record.absent_duration_hours += u32::from(session.duration_hours);
            }
        }
        record.attendance.insert(session, status.clone());
        status
    }

    fn classify(session: Session, time_in: Option<&str>, record: &StudentRecord) -> AttendanceStatus {
        match time_in.map(str::trim).filter(|t| !t.is_empty()) {
            Some(time) => AttendanceStatus::Present(time.to_string()),
            None if record.exclusions.contains(&session) => AttendanceStatus::Excluded,
            None => AttendanceStatus::Absent,
        }
    }

    /// Attendance percentage, `0.0` when nothing has been recorded.
    pub fn percentage(attended: u32, absent: u32) -> f64 {
        let total = attended + absent;
        if total == 0 {
            return 0.0;
        }
        f64::from(attended) / f64::from(total) * 100.0
    }

    /// Convenience wrapper over [`percentage`](Self::percentage) for a record.
    pub fn record_percentage(record: &StudentRecord) -> f64 {
        Self::percentage(record.attended_count, record.absent_count)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
