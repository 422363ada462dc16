//! Absence-warning letter triggers.
//!
//! A course code such as `SKMM2313` encodes, at its eighth character, how many
//! hours one absence unit is worth for that course. Each tier fires once the
//! student's absent hours reach `unit × tier`. Tiers are evaluated
//! independently, so a student deep into absences gets one request for every
//! tier crossed.
//!
//! Rendering the letters is the job of an external document renderer; this
//! module only produces [`LetterRequest`]s for it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, Result};
use crate::formatting::{ordinal, path_safe_name};
use crate::models::StudentRecord;

/// Highest tier that can be triggered.
pub const MAX_TIER: u8 = 3;

/// Zero-based position of the hours-per-absence digit inside a course code.
const DURATION_DIGIT_INDEX: usize = 7;

// ── TierTemplates ─────────────────────────────────────────────────────────────

/// Which letter template the renderer should use for each tier.
///
/// Historically the third reminder reused the second reminder's wording, so
/// the default maps tier 3 to template 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTemplates(BTreeMap<u8, u8>);

impl Default for TierTemplates {
    fn default() -> Self {
        Self(BTreeMap::from([(1, 1), (2, 2), (3, 2)]))
    }
}

impl TierTemplates {
    /// Default mapping with the tier-3 template replaced.
    pub fn with_tier3(template: u8) -> Self {
        let mut t = Self::default();
        t.0.insert(3, template);
        t
    }

    /// Template for `tier`, defaulting to the tier number itself.
    pub fn template_for(&self, tier: u8) -> u8 {
        self.0.get(&tier).copied().unwrap_or(tier)
    }
}

// ── Lecturer ──────────────────────────────────────────────────────────────────

/// Signatory details printed on every letter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecturer {
    pub name: String,
    pub phone: String,
    pub faculty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_path: Option<String>,
}

// ── LetterRequest ─────────────────────────────────────────────────────────────

/// One letter the renderer should produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterRequest {
    pub student_name: String,
    pub matric_no: String,
    pub year: String,
    pub course_code: String,
    pub course_name: String,
    pub section: String,
    pub tier: u8,
    pub template: u8,
    pub absent_session_list: Vec<String>,
    pub absent_duration_hours: u32,
    /// Suggested file name, e.g. `SKMM2313-01-ALI BIN ABU-2nd_reminder.pdf`.
    pub output_file: String,
    pub lecturer: Lecturer,
}

// ── LetterTrigger ─────────────────────────────────────────────────────────────

/// Evaluates students against the three absence tiers.
#[derive(Debug, Clone, Default)]
pub struct LetterTrigger {
    templates: TierTemplates,
    lecturer: Lecturer,
}

impl LetterTrigger {
    pub fn new(templates: TierTemplates, lecturer: Lecturer) -> Self {
        Self {
            templates,
            lecturer,
        }
    }

    /// Hours charged per absence unit, read from the course code.
    pub fn duration_unit(course_code: &str) -> Result<u32> {
        course_code
            .chars()
            .nth(DURATION_DIGIT_INDEX)
            .and_then(|c| c.to_digit(10))
            // TODO: confirm with the faculty what a `0` hours digit means; a
            // zero unit would fire every tier for every student.
            .filter(|&unit| unit > 0)
            .ok_or_else(|| AttendanceError::InvalidCourseCode(course_code.to_string()))
    }

    /// Every tier whose threshold `unit × tier` has been reached.
    pub fn fired_tiers(absent_hours: u32, unit: u32) -> Vec<u8> {
        (1..=MAX_TIER)
            .filter(|&tier| absent_hours >= unit * u32::from(tier))
            .collect()
    }

    /// Letter requests for a single student.
    ///
    /// Fails with [`AttendanceError::InvalidCourseCode`] when the course code
    /// carries no usable digit; callers treat that as recoverable.
    pub fn evaluate(&self, record: &StudentRecord) -> Result<Vec<LetterRequest>> {
        let unit = Self::duration_unit(&record.course.course_code)?;
        Ok(Self::fired_tiers(record.absent_duration_hours, unit)
            .into_iter()
            .map(|tier| self.request_for(record, tier))
            .collect())
    }

    /// Letter requests for the whole roster, in roster order.
    ///
    /// Students whose course code cannot be interpreted are logged and skipped;
    /// any other error aborts the evaluation.
    pub fn evaluate_all<'a>(
        &self,
        records: impl IntoIterator<Item = &'a StudentRecord>,
    ) -> Result<Vec<LetterRequest>> {
        let mut requests = Vec::new();
        for record in records {
            match self.evaluate(record) {
                Ok(found) => requests.extend(found),
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(student = %record.name, error = %e, "no letters evaluated")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(requests)
    }

    fn request_for(&self, record: &StudentRecord, tier: u8) -> LetterRequest {
        let safe_name = path_safe_name(&record.name);
        LetterRequest {
            student_name: record.name.clone(),
            matric_no: record.matric_no.clone(),
            year: record.year.clone(),
            course_code: record.course.course_code.clone(),
            course_name: record.course.course_name.clone(),
            section: record.course.section.clone(),
            tier,
            template: self.templates.template_for(tier),
            absent_session_list: record.absent_sessions.iter().map(|s| s.label()).collect(),
            absent_duration_hours: record.absent_duration_hours,
            output_file: format!(
                "{}/{}-{}-{}-{}_reminder.pdf",
                safe_name,
                record.course.course_code,
                record.course.section,
                safe_name,
                ordinal(tier)
            ),
            lecturer: self.lecturer.clone(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseInfo, RawRow};
    use crate::session::Session;
    use std::collections::BTreeSet;

    fn record(course_code: &str, absent_hours: u32) -> StudentRecord {
        let row = RawRow {
            matric_no: "A20EM0001".into(),
            name: "MUTHU A/L RAMAN".into(),
            programme: "SEMM".into(),
            year: "2".into(),
            time_in: None,
        };
        let course = CourseInfo {
            course_code: course_code.into(),
            course_name: "THERMODYNAMICS".into(),
            section: "01".into(),
        };
        let mut rec = StudentRecord::from_row(&row, &course, BTreeSet::new());
        rec.absent_duration_hours = absent_hours;
        rec.absent_sessions = vec![Session::parse("240331-14-2").unwrap()];
        rec
    }

    #[test]
    fn test_duration_unit_reads_eighth_character() {
        assert_eq!(LetterTrigger::duration_unit("SKMM2323").unwrap(), 3);
        assert_eq!(LetterTrigger::duration_unit("SKMM2312").unwrap(), 2);
    }

    #[test]
    fn test_duration_unit_rejects_short_or_non_digit() {
        assert!(LetterTrigger::duration_unit("SKMM231").is_err());
        assert!(LetterTrigger::duration_unit("SKMM231X").is_err());
        assert!(LetterTrigger::duration_unit("SKMM2310").is_err());
        assert!(LetterTrigger::duration_unit("").is_err());
    }

    #[test]
    fn test_fired_tiers_unit_two_five_hours() {
        assert_eq!(LetterTrigger::fired_tiers(5, 2), vec![1, 2]);
    }

    #[test]
    fn test_fired_tiers_boundaries() {
        assert!(LetterTrigger::fired_tiers(0, 2).is_empty());
        assert!(LetterTrigger::fired_tiers(1, 2).is_empty());
        assert_eq!(LetterTrigger::fired_tiers(2, 2), vec![1]);
        assert_eq!(LetterTrigger::fired_tiers(6, 2), vec![1, 2, 3]);
        assert_eq!(LetterTrigger::fired_tiers(40, 2), vec![1, 2, 3]);
    }

    #[test]
    fn test_evaluate_builds_requests() {
        let trigger = LetterTrigger::default();
        let requests = trigger.evaluate(&record("SKMM2312", 5)).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tier, 1);
        assert_eq!(requests[1].tier, 2);
        assert_eq!(requests[0].absent_session_list, vec!["240331-14-2"]);
        assert_eq!(
            requests[1].output_file,
            "MUTHU A_L RAMAN/SKMM2312-01-MUTHU A_L RAMAN-2nd_reminder.pdf"
        );
    }

    #[test]
    fn test_tier_three_reuses_tier_two_template_by_default() {
        let trigger = LetterTrigger::default();
        let requests = trigger.evaluate(&record("SKMM2311", 3)).unwrap();
        let templates: Vec<u8> = requests.iter().map(|r| r.template).collect();
        assert_eq!(templates, vec![1, 2, 2]);
    }

    #[test]
    fn test_tier_three_template_configurable() {
        let trigger = LetterTrigger::new(TierTemplates::with_tier3(3), Lecturer::default());
        let requests = trigger.evaluate(&record("SKMM2311", 3)).unwrap();
        assert_eq!(requests[2].template, 3);
    }

    #[test]
    fn test_evaluate_all_skips_invalid_course_code() {
        let trigger = LetterTrigger::default();
        let good = record("SKMM2311", 1);
        let bad = record("X", 10);
        let requests = trigger.evaluate_all([&bad, &good]).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].course_code, "SKMM2311");
    }

    #[test]
    fn test_zero_hours_digit_fires_nothing() {
        let trigger = LetterTrigger::default();
        let zero = record("SKMM2310", 10);
        assert!(matches!(
            LetterTrigger::duration_unit("SKMM2310"),
            Err(AttendanceError::InvalidCourseCode(_))
        ));
        assert!(trigger.evaluate_all([&zero]).unwrap().is_empty());
    }

    #[test]
    fn test_request_serialises_camel_case() {
        let trigger = LetterTrigger::default();
        let requests = trigger.evaluate(&record("SKMM2311", 1)).unwrap();
        let json = serde_json::to_value(&requests[0]).unwrap();
        assert_eq!(json["studentName"], "MUTHU A/L RAMAN");
        assert_eq!(json["absentSessionList"][0], "240331-14-2");
        assert_eq!(json["tier"], 1);
    }
}
