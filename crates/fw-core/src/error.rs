/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by core types and config persistence.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Reading or writing the persisted blob failed.
    #[error("config store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted blob is not a valid config record.
    #[error("config blob is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An argument failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}
