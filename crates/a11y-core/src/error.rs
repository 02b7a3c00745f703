use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid heading level: {0} (expected 1-6)")]
    InvalidHeadingLevel(u8),

    #[error("Invalid percentage for {field}: {value} (expected 0-100)")]
    InvalidPercentage { field: &'static str, value: f64 },
}
