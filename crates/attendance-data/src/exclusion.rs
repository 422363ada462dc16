//! Pre-approved absences (medical leave, approved activities).
//!
//! The exclusion table is a CSV with at least a `Name` and an `Exclude`
//! column. `Exclude` holds session names separated by commas or whitespace,
//! e.g. `240331-14-2, 240401-09-1`. The table is read once per run.

use std::collections::BTreeSet;
use std::path::Path;

use attendance_core::error::{AttendanceError, Result};
use attendance_core::session::Session;
use tracing::{debug, info, warn};

/// One `Name`/`Exclude` pair from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExclusionRow {
    name: String,
    exclude: String,
}

/// In-memory exclusion table. Empty when no table was supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionTable {
    rows: Vec<ExclusionRow>,
}

impl ExclusionTable {
    /// An empty table: nobody is excused from anything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table from `path`.
    ///
    /// A missing file is not an error and yields an empty table. A file that
    /// exists but lacks the `Name` or `Exclude` column is rejected.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "No exclusion table at {}; every absence will be charged",
                path.display()
            );
            return Ok(Self::empty());
        }

        let file = std::fs::File::open(path).map_err(|source| AttendanceError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file).map_err(|reason| AttendanceError::ExclusionTable {
            path: path.to_path_buf(),
            reason,
        })?;
        debug!("Loaded {} exclusion rows from {}", table.rows.len(), path.display());
        Ok(table)
    }

    /// Parse a CSV stream. Errors are returned as a human-readable reason.
    pub fn from_reader<R: std::io::Read>(reader: R) -> std::result::Result<Self, String> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers().map_err(|e| e.to_string())?.clone();
        let column = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(wanted))
                .ok_or_else(|| format!("missing column {wanted:?}"))
        };
        let name_col = column("Name")?;
        let exclude_col = column("Exclude")?;

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(|e| e.to_string())?;
            let name = record.get(name_col).unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            rows.push(ExclusionRow {
                name: name.to_string(),
                exclude: record.get(exclude_col).unwrap_or_default().to_string(),
            });
        }
        Ok(Self { rows })
    }

    /// Sessions excused for the student with exactly this name.
    ///
    /// Every row for the name contributes. Entries that are not valid session
    /// names are logged and ignored.
    pub fn exclusions_for(&self, name: &str) -> BTreeSet<Session> {
        self.rows
            .iter()
            .filter(|row| row.name == name)
            .flat_map(|row| split_sessions(&row.exclude))
            .filter_map(|token| match normalise_session(token) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(student = name, error = %e, "ignoring exclusion entry");
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn split_sessions(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|t| !t.is_empty())
}

/// Accept `240331-14-2` as well as file names like `240331-14-2.pdf`.
fn normalise_session(token: &str) -> Result<Session> {
    let lower = token.to_ascii_lowercase();
    let stem = [".txt", ".pdf"]
        .iter()
        .find_map(|&ext| lower.strip_suffix(ext).map(|_| &token[..token.len() - ext.len()]))
        .unwrap_or(token);
    Session::parse(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table(csv: &str) -> ExclusionTable {
        ExclusionTable::from_reader(csv.as_bytes()).unwrap()
    }

    fn labels(set: &BTreeSet<Session>) -> Vec<String> {
        set.iter().map(Session::label).collect()
    }

    #[test]
    fn test_exclusions_for_comma_and_space_separated() {
        let t = table("Name,Exclude\nALI BIN ABU,\"240401-09-1, 240331-14-2 240315-08-3\"\n");
        let set = t.exclusions_for("ALI BIN ABU");
        assert_eq!(labels(&set), vec!["240315-08-3", "240331-14-2", "240401-09-1"]);
    }

    #[test]
    fn test_exclusions_exact_name_match_only() {
        let t = table("Name,Exclude\nALI BIN ABU,240401-09-1\n");
        assert!(t.exclusions_for("ALI").is_empty());
        assert!(t.exclusions_for("ali bin abu").is_empty());
        assert!(t.exclusions_for("ALI BIN ABU BAKAR").is_empty());
        assert_eq!(t.exclusions_for("ALI BIN ABU").len(), 1);
    }

    #[test]
    fn test_exclusions_multiple_rows_merge() {
        let t = table("Name,Exclude\nSITI,240401-09-1\nSITI,240331-14-2\n");
        assert_eq!(t.exclusions_for("SITI").len(), 2);
    }

    #[test]
    fn test_exclusions_ignore_invalid_entries_and_accept_extensions() {
        let t = table("Name,Exclude\nSITI,\"MC, 240401-09-1.pdf, 240399-09-1\"\n");
        assert_eq!(labels(&t.exclusions_for("SITI")), vec!["240401-09-1"]);
    }

    #[test]
    fn test_extra_columns_and_header_case() {
        let t = table("No.,name,Reason,EXCLUDE\n1,SITI,MC,240401-09-1\n");
        assert_eq!(t.len(), 1);
        assert_eq!(t.exclusions_for("SITI").len(), 1);
    }

    #[test]
    fn test_missing_column_rejected() {
        let err = ExclusionTable::from_reader("Name,Reason\nSITI,MC\n".as_bytes()).unwrap_err();
        assert!(err.contains("Exclude"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let t = ExclusionTable::load(&dir.path().join("attendance_exclude.csv")).unwrap();
        assert!(t.is_empty());
        assert!(t.exclusions_for("ANYONE").is_empty());
    }

    #[test]
    fn test_load_bad_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("attendance_exclude.csv");
        std::fs::write(&path, "Student,Sessions\nSITI,240401-09-1\n").unwrap();
        let err = ExclusionTable::load(&path).unwrap_err();
        assert!(matches!(err, AttendanceError::ExclusionTable { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("attendance_exclude.csv");
        std::fs::write(&path, "Name,Exclude\nSITI,240401-09-1\n").unwrap();
        let t = ExclusionTable::load(&path).unwrap();
        assert_eq!(t.len(), 1);
    }
}
