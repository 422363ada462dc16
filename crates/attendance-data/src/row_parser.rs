//! Data-row parsing for the two export layouts.
//!
//! Older exports print every field at a fixed character column. Newer exports
//! collapse the padding, so fields can only be recovered by counting tokens
//! from the end of the line: names contain spaces, but the trailing fields
//! (programme, year and the optional `h:mm AM` check-in) never do.

use std::fmt;
use std::str::FromStr;

use attendance_core::models::RawRow;

/// Width of the running row-number column that marks a data row.
const ROW_NUMBER_WIDTH: usize = 4;

/// Which layout a session export uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowFormat {
    /// Whitespace-separated fields, counted from the end of the line.
    #[default]
    Tokens,
    /// Fixed character columns.
    Columns,
}

impl RowFormat {
    /// Parse one table line. Returns `None` for continuation lines and for
    /// data rows that lack the fields this layout needs.
    pub fn parse(self, line: &str) -> Option<RawRow> {
        if !is_data_row(line) {
            return None;
        }
        match self {
            RowFormat::Tokens => parse_tokens(line),
            RowFormat::Columns => parse_columns(line),
        }
    }

    /// Pick the layout from a session's table header line.
    ///
    /// Fixed-column exports pad the heading row to the same columns as the
    /// data, so the check-in heading sits at the check-in column. Token-era
    /// exports collapse that padding.
    pub fn detect(table_header: &str) -> RowFormat {
        let upper = table_header.to_ascii_uppercase();
        match upper.find("TIME") {
            Some(byte_idx) if upper[..byte_idx].chars().count() >= COLUMN_HEADING_MIN => {
                RowFormat::Columns
            }
            _ => RowFormat::Tokens,
        }
    }
}

impl FromStr for RowFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tokens" => Ok(RowFormat::Tokens),
            "columns" => Ok(RowFormat::Columns),
            other => Err(format!("unknown row format: {other}")),
        }
    }
}

impl fmt::Display for RowFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RowFormat::Tokens => "tokens",
            RowFormat::Columns => "columns",
        })
    }
}

/// How the layout is chosen for each session of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatSelection {
    /// Detect per session from the table header.
    #[default]
    Detect,
    /// Use one layout for every session.
    Fixed(RowFormat),
}

impl FormatSelection {
    pub fn resolve(self, table_header: &str) -> RowFormat {
        match self {
            FormatSelection::Detect => RowFormat::detect(table_header),
            FormatSelection::Fixed(format) => format,
        }
    }
}

impl From<RowFormat> for FormatSelection {
    fn from(format: RowFormat) -> Self {
        FormatSelection::Fixed(format)
    }
}

impl FromStr for FormatSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(FormatSelection::Detect);
        }
        s.parse().map(FormatSelection::Fixed)
    }
}

impl fmt::Display for FormatSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatSelection::Detect => f.write_str("auto"),
            FormatSelection::Fixed(format) => fmt::Display::fmt(format, f),
        }
    }
}

/// A line is a data row when its row-number column holds anything at all.
/// Wrapped name continuations are indented past that column.
pub fn is_data_row(line: &str) -> bool {
    line.chars()
        .take(ROW_NUMBER_WIDTH)
        .any(|c| !c.is_whitespace())
}

// ── Token layout ──────────────────────────────────────────────────────────────

/// `<no> <matric> <name...> <programme> <year> [<h:mm> <AM|PM>]`
///
/// The check-in is present exactly when the last token ends in `M`.
pub fn parse_tokens(line: &str) -> Option<RawRow> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let present = tokens.last()?.ends_with('M');
    let tail = if present { 4 } else { 2 };

    // Row number, matric number, at least one name token, then the tail.
    if tokens.len() < 3 + tail {
        return None;
    }
    let tail_start = tokens.len() - tail;

    Some(RawRow {
        matric_no: tokens[1].to_string(),
        name: tokens[2..tail_start].join(" "),
        programme: tokens[tail_start].to_string(),
        year: tokens[tail_start + 1].to_string(),
        time_in: present.then(|| tokens[tail_start + 2..].join(" ")),
    })
}

// ── Column layout ─────────────────────────────────────────────────────────────

const MATRIC_COLS: (usize, usize) = (9, 20);
const NAME_COLS: (usize, usize) = (21, 82);
const PROGRAMME_COLS: (usize, usize) = (83, 96);
const YEAR_COLS: (usize, usize) = (97, 103);
const TIME_IN_START: usize = 104;
/// Token-era headings never reach this far; fixed-column ones always do.
const COLUMN_HEADING_MIN: usize = YEAR_COLS.1;

/// Fixed character columns of the older export.
pub fn parse_columns(line: &str) -> Option<RawRow> {
    let chars: Vec<char> = line.chars().collect();
    let field = |start: usize, end: usize| -> String {
        let end = end.min(chars.len());
        if start >= end {
            return String::new();
        }
        chars[start..end].iter().collect::<String>().trim().to_string()
    };

    let name = field(NAME_COLS.0, NAME_COLS.1);
    if name.is_empty() {
        return None;
    }
    let time_in = field(TIME_IN_START, chars.len());

    Some(RawRow {
        matric_no: field(MATRIC_COLS.0, MATRIC_COLS.1),
        name,
        programme: field(PROGRAMME_COLS.0, PROGRAMME_COLS.1),
        year: field(YEAR_COLS.0, YEAR_COLS.1),
        time_in: (!time_in.is_empty()).then_some(time_in),
    })
}
