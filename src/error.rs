// report-pdf: Error types

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

/// One failed attempt at fetching a font source.
#[derive(Debug, Clone, PartialEq)]
pub struct FontAttempt {
    pub source: String,
    pub reason: String,
}

impl fmt::Display for FontAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.source, self.reason)
    }
}

fn format_attempts(attempts: &[FontAttempt]) -> String {
    if attempts.is_empty() {
        return "no sources configured".to_string();
    }
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Font '{variant}' unavailable, all sources failed: {}", format_attempts(.attempts))]
    FontUnavailable {
        variant: String,
        attempts: Vec<FontAttempt>,
    },
    #[error("Document does not match the report schema: {0}")]
    SchemaViolation(String),
    #[error("Failed to read document: {0}")]
    DocumentError(String),
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
    #[error("Failed to parse font: {0}")]
    FontParse(String),
    #[error("Failed to create PDF: {0}")]
    PdfError(String),
    #[error("Invalid date format: {0}")]
    DateError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
