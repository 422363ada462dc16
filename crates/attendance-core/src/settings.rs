use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::letters::{Lecturer, TierTemplates};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Reconcile sign-in sheet exports into a semester attendance report
#[derive(Parser, Debug, Clone)]
#[command(
    name = "attendance-tracker",
    about = "Reconcile sign-in sheet exports into a semester attendance report",
    version
)]
pub struct Settings {
    /// Folder holding one YYMMDD-HH-D.txt export per session
    #[arg(long, default_value = "txt")]
    pub sessions: PathBuf,

    /// Exclusion table (CSV with Name and Exclude columns); optional
    #[arg(long, default_value = "attendance_exclude.csv")]
    pub exclusions: PathBuf,

    /// Folder the report and letter requests are written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Layout of the session table rows; `auto` detects it per session
    #[arg(long, default_value = "auto", value_parser = ["auto", "tokens", "columns"])]
    pub row_format: String,

    /// Order of the per-session columns in the report
    #[arg(long, default_value = "asc", value_parser = ["asc", "desc"])]
    pub session_order: String,

    /// Letter template used for third-tier reminders
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u8).range(1..=3))]
    pub tier3_template: u8,

    /// Lecturer name printed on letters
    #[arg(long)]
    pub lecturer_name: Option<String>,

    /// Lecturer telephone number printed on letters
    #[arg(long)]
    pub lecturer_phone: Option<String>,

    /// Faculty printed on letters
    #[arg(long)]
    pub faculty: Option<String>,

    /// Signature image passed through to the letter renderer
    #[arg(long)]
    pub signature: Option<PathBuf>,

    /// Skip letter-request generation
    #[arg(long)]
    pub no_letters: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved lecturer details
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted lecturer details saved to `~/.attendance-tracker/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecturer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecturer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<PathBuf>,
}

impl LastUsedParams {
    /// Default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".attendance-tracker").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and fill lecturer details from the last run where
    /// none were given, then persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`load_with_last_used`](Self::load_with_last_used) with explicit
    /// arguments and config path, so tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "failed to clear saved settings");
            }
            return settings;
        }

        // CLI always wins over the persisted values.
        let last = LastUsedParams::load_from(config_path);
        if !is_arg_explicitly_set(&matches, "lecturer_name") {
            settings.lecturer_name = last.lecturer_name;
        }
        if !is_arg_explicitly_set(&matches, "lecturer_phone") {
            settings.lecturer_phone = last.lecturer_phone;
        }
        if !is_arg_explicitly_set(&matches, "faculty") {
            settings.faculty = last.faculty;
        }
        if !is_arg_explicitly_set(&matches, "signature") {
            settings.signature = last.signature;
        }

        if let Err(e) = LastUsedParams::from(&settings).save_to(config_path) {
            tracing::warn!(error = %e, "failed to persist settings");
        }

        settings
    }

    /// Lecturer details for the letter renderer.
    pub fn lecturer(&self) -> Lecturer {
        Lecturer {
            name: self.lecturer_name.clone().unwrap_or_default(),
            phone: self.lecturer_phone.clone().unwrap_or_default(),
            faculty: self.faculty.clone().unwrap_or_default(),
            signature_path: self
                .signature
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
        }
    }

    /// Tier-to-template mapping honouring `--tier3-template`.
    pub fn tier_templates(&self) -> TierTemplates {
        TierTemplates::with_tier3(self.tier3_template)
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            lecturer_name: s.lecturer_name.clone(),
            lecturer_phone: s.lecturer_phone.clone(),
            faculty: s.faculty.clone(),
            signature: s.signature.clone(),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
