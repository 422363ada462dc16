//! Hand-off of letter requests to the external document renderer.

use std::path::{Path, PathBuf};

use attendance_core::letters::LetterRequest;

/// File the renderer picks the requests up from.
pub const LETTER_REQUESTS_FILE: &str = "letter_requests.json";

/// Write `requests` as a pretty-printed JSON array into `output_dir`.
///
/// The file is always written, even when empty, so a stale request list from
/// an earlier run is never left behind.
pub fn write_letter_requests(requests: &[LetterRequest], output_dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(LETTER_REQUESTS_FILE);
    let json = serde_json::to_string_pretty(requests)?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, &path)?;

    tracing::debug!(path = %path.display(), count = requests.len(), "letter requests written");
    Ok(path)
}
