//! Course metadata from the fixed header lines of a session export.
//!
//! Header line 3 reads `COURSE : <code> <title...>` and header line 4 reads
//! `SECTION : <section>`, followed from column 29 by the date and time the
//! session was taken. The offsets are fixed by the export format.

use attendance_core::models::CourseInfo;
use chrono::{NaiveDate, NaiveTime, Timelike};
use tracing::warn;

const COURSE_LINE: usize = 3;
const SECTION_LINE: usize = 4;
/// Character column where the session timestamp starts on the section line.
const STAMP_COLUMN: usize = 29;

const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%d/%m/%y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];
/// Tokens 0 and 1 are the label and the colon.
const VALUE_TOKEN: usize = 2;

/// Soft hyphen inserted by the text conversion at line-break opportunities.
const SOFT_HYPHEN: char = '\u{00AD}';

/// Pull course code, course title and section out of the header lines.
///
/// Missing tokens leave the corresponding field empty and are logged; they do
/// not abort the run.
pub fn extract_course_info(header: &[String]) -> CourseInfo {
    let course_tokens = header
        .get(COURSE_LINE)
        .map(|l| tokens(l))
        .unwrap_or_default();
    let section_tokens = header
        .get(SECTION_LINE)
        .map(|l| tokens(l))
        .unwrap_or_default();

    let course_code = course_tokens.get(VALUE_TOKEN).cloned().unwrap_or_default();
    let course_name = course_tokens
        .get(VALUE_TOKEN + 1..)
        .map(|rest| rest.join(" "))
        .unwrap_or_default();
    let section = section_tokens.get(VALUE_TOKEN).cloned().unwrap_or_default();

    if course_code.is_empty() {
        warn!("Session header has no course code: {:?}", header.get(COURSE_LINE));
    }
    if section.is_empty() {
        warn!("Session header has no section: {:?}", header.get(SECTION_LINE));
    }

    CourseInfo {
        course_code,
        course_name,
        section,
    }
}

/// Date and optional start hour printed in a session header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderStamp {
    pub date: NaiveDate,
    pub hour: Option<u8>,
    /// The text the stamp was read from, for error messages.
    pub raw: String,
}

/// Read the session timestamp from the section line, if the export printed
/// one. Returns `None` when the field is empty or holds no recognisable date.
pub fn extract_session_stamp(header: &[String]) -> Option<HeaderStamp> {
    let field: String = header.get(SECTION_LINE)?.chars().skip(STAMP_COLUMN).collect();
    let tokens = tokens(&field);
    let date = tokens.iter().find_map(|t| parse_date(t))?;
    let hour = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.contains(':'))
        .find_map(|(i, t)| parse_hour(t, tokens.get(i + 1).map(String::as_str)));

    Some(HeaderStamp {
        date,
        hour,
        raw: tokens.join(" "),
    })
}

fn parse_date(token: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
}

/// `14:00`, `14:00:00`, or `2:00` followed by an `AM`/`PM` token.
fn parse_hour(token: &str, next: Option<&str>) -> Option<u8> {
    let time = match next.map(str::to_ascii_uppercase).as_deref() {
        Some(meridiem @ ("AM" | "PM")) => {
            NaiveTime::parse_from_str(&format!("{token} {meridiem}"), "%I:%M %p").ok()
        }
        _ => TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(token, fmt).ok()),
    }?;
    u8::try_from(time.hour()).ok()
}

fn tokens(line: &str) -> Vec<String> {
    let cleaned: String = line
        .chars()
        .filter(|&c| c != SOFT_HYPHEN && !(c.is_control() && !c.is_whitespace()))
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}
