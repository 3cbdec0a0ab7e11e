//! Clinical-note extraction and reconciliation pipeline.
//!
//! Raw OCR text of one clinical note goes in; a structured document comes
//! out and is merged into the patient's longitudinal history in SQLite.
//! Obtaining the text (file storage, OCR, the intake surface) is the
//! caller's concern.

pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

/// Initialize tracing from `RUST_LOG`, falling back to the built-in filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
