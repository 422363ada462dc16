mod bootstrap;
mod letters;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use attendance_core::letters::LetterTrigger;
use attendance_core::settings::Settings;
use attendance_data::analysis::aggregate_sessions;
use attendance_data::report::{write_report_file, SessionOrder};
use attendance_data::row_parser::FormatSelection;

/// What a successful run produced.
#[derive(Debug)]
struct RunSummary {
    students: usize,
    sessions: usize,
    report: PathBuf,
    letters: Option<(PathBuf, usize)>,
}

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Attendance tracker v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Sessions: {}, row format: {}, exclusions: {}",
        settings.sessions.display(),
        settings.row_format,
        settings.exclusions.display()
    );

    let summary = run(&settings)?;

    tracing::info!(
        "{} students over {} sessions written to {}",
        summary.students,
        summary.sessions,
        summary.report.display()
    );
    match summary.letters {
        Some((path, count)) => {
            tracing::info!("{} letter requests written to {}", count, path.display())
        }
        None => tracing::info!("Letter generation skipped"),
    }

    Ok(())
}

/// Aggregate every session, then write the report and letter requests.
///
/// Nothing is written unless the whole aggregation succeeds.
fn run(settings: &Settings) -> Result<RunSummary> {
    let row_format: FormatSelection = settings
        .row_format
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let order: SessionOrder = settings
        .session_order
        .parse()
        .map_err(|e: String| anyhow!(e))?;

    let roster = aggregate_sessions(&settings.sessions, Some(&settings.exclusions), row_format)?;

    let report = write_report_file(&roster, order, &settings.output_dir)?;

    let letters = if settings.no_letters {
        None
    } else {
        let trigger = LetterTrigger::new(settings.tier_templates(), settings.lecturer());
        let requests = trigger.evaluate_all(&roster.students)?;
        let path = letters::write_letter_requests(&requests, &settings.output_dir)?;
        Some((path, requests.len()))
    };

    Ok(RunSummary {
        students: roster.students.len(),
        sessions: roster.sessions.len(),
        report,
        letters,
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────
