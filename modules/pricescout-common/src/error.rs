use thiserror::Error;

pub type Result<T> = std::result::Result<T, PriceScoutError>;

/// Failures that escape a request. Per-site fetch failures never show up here;
/// they are absorbed into a `SourceResult` instead.
#[derive(Error, Debug)]
pub enum PriceScoutError {
    #[error("X-API-KEY header is required")]
    CredentialMissing,

    #[error("Failed to extract content from any target websites ({sites} tried)")]
    AcquisitionExhausted { sites: usize },

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PriceScoutError {
    /// HTTP-style status code for the caller.
    pub fn status_code(&self) -> u16 {
        match self {
            PriceScoutError::CredentialMissing => 400,
            PriceScoutError::AcquisitionExhausted { .. }
            | PriceScoutError::AnalysisFailed(_)
            | PriceScoutError::Config(_)
            | PriceScoutError::Other(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_a_client_error() {
        assert_eq!(PriceScoutError::CredentialMissing.status_code(), 400);
    }

    #[test]
    fn exhausted_acquisition_is_a_server_error() {
        let err = PriceScoutError::AcquisitionExhausted { sites: 3 };
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("3 tried"));
    }
}
