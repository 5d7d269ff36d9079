use thiserror::Error;

/// Application-wide error types.
///
/// Every fallible operation in the harvester returns this enum. Most variants
/// are scoped to a single harvest unit: the pagination engine and the
/// orchestrator turn them into a truncated record sequence plus a log line,
/// never into a run-level failure. Only configuration problems and
/// [`AppError::TargetNotFound`] abort a run.
///
/// # Error Conversion
///
/// Library errors convert automatically through `#[from]`:
/// - `serde_json::Error` → `AppError::SerializationError`
/// - `std::io::Error` → `AppError::IoError`
/// - `csv::Error` → `AppError::CsvError`
///
/// # Examples
///
/// ```
/// use catalogo_core::error::AppError;
///
/// fn lookup(name: &str) -> Result<(), AppError> {
///     Err(AppError::TargetNotFound(name.to_string()))
/// }
///
/// let err = lookup("Atlantis").unwrap_err();
/// assert_eq!(err.to_string(), "Target not found in configuration: Atlantis");
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or the server answered with an unexpected status.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// The source reported that the requested domain or endpoint does not exist.
    ///
    /// This is an expected condition when enumerating many portal domains and
    /// is logged differently from genuine failures.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A registry API answered without `success: true`.
    #[error("Unsuccessful response from {0}")]
    UnsuccessfulResponse(String),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Writing a CSV sink failed.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network or connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The user selected a target name that is not configured.
    #[error("Target not found in configuration: {0}")]
    TargetNotFound(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic application error for cases not covered by specific variants.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ClientError(msg) => {
                if msg.contains("timeout") || msg.contains("timed out") {
                    "Request timed out. The portal may be slow or unreachable.".to_string()
                } else {
                    format!("API error: {}", msg)
                }
            }
            AppError::NotFound(what) => {
                format!("{} is not known to the catalog API.", what)
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!(
                    "Request timed out after {} seconds.\n   The portal may be overloaded.",
                    secs
                )
            }
            AppError::TargetNotFound(name) => {
                format!(
                    "Target '{}' is not configured.\n   Run `catalogo targets` to list configured targets.",
                    name
                )
            }
            AppError::ConfigError(msg) => {
                format!(
                    "Configuration error: {}\n   Check your targets file.",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }

    /// Returns true for the "absent resource" condition (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}
