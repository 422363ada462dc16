//! Domain layer for the attendance tracker.
//!
//! Session identities, student records, the attendance bookkeeping rules,
//! absence-letter triggers, report formatting helpers and command-line
//! settings. Nothing here touches the session files themselves.

pub mod calculations;
pub mod error;
pub mod formatting;
pub mod letters;
pub mod models;
pub mod session;
pub mod settings;

pub use error::{AttendanceError, Result};
