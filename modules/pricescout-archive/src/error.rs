/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors raised while building the archive. Fetches themselves never error;
/// they report failure through their return values.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Render engine error: {0}")]
    Engine(#[from] browserless_client::BrowserlessError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
