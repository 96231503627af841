use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Invalid exchange rate {rate} for {currency}: must be greater than zero")]
    InvalidRate { currency: String, rate: String },

    #[error("Invalid window: {months_back} months back, {months_forward} months forward (forward must be at most {max_forward})")]
    InvalidWindow {
        months_back: u32,
        months_forward: u32,
        max_forward: u32,
    },

    #[error("Invalid month key '{0}': expected format 'MMM yyyy' (e.g. 'Jan 2024')")]
    InvalidMonthKey(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Validation error for '{record}': {details}")]
    ValidationError { record: String, details: String },

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Integrity violation in {month}: {details}")]
    IntegrityViolation { month: String, details: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "remote-rates")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
