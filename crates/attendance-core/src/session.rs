//! Session identity decoded from a session file name.
//!
//! Each sign-in sheet export is named `YYMMDD-HH-D`: a two-digit year,
//! month and day, the starting hour, and a single digit giving the session
//! length in hours. `240331-14-2` is 31 March 2024, 14:00, two hours.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, Result};

fn session_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2})(\d{2})(\d{2})-(\d{2})-(\d)$").expect("regex is valid"))
}

// ── Session ───────────────────────────────────────────────────────────────────

/// One attendance-taking event.
///
/// Ordering is chronological (date, then hour, then duration), which is what
/// the aggregator relies on to visit the newest session first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Session {
    pub date: NaiveDate,
    pub hour: u8,
    pub duration_hours: u8,
}

impl Session {
    /// Decode a bare session name such as `240331-14-2`.
    pub fn parse(name: &str) -> Result<Self> {
        let malformed = |reason: &str| AttendanceError::MalformedSessionName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let caps = session_name_regex()
            .captures(name)
            .ok_or_else(|| malformed("expected YYMMDD-HH-D"))?;

        // Every group is all digits, so these parses cannot fail.
        let field = |i: usize| caps[i].parse::<u32>().unwrap_or_default();
        let (yy, month, day, hour, duration) = (field(1), field(2), field(3), field(4), field(5));

        let date = NaiveDate::from_ymd_opt(2000 + yy as i32, month, day)
            .ok_or_else(|| malformed("not a calendar date"))?;
        if hour > 23 {
            return Err(malformed("hour must be 00-23"));
        }
        if duration == 0 {
            return Err(malformed("duration must be 1-9 hours"));
        }

        Ok(Self {
            date,
            hour: hour as u8,
            duration_hours: duration as u8,
        })
    }

    /// Decode the session from a file path, ignoring directory and extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::parse(&stem)
    }

    /// The canonical `YYMMDD-HH-D` label, also used as report column header.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}{:02}{:02}-{:02}-{}",
            self.date.year() % 100,
            self.date.month(),
            self.date.day(),
            self.hour,
            self.duration_hours
        )
    }
}

impl FromStr for Session {
    type Err = AttendanceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
