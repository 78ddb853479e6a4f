//! Orchestrator-level failure taxonomy.
//!
//! Every failure surfaces to the rendering collaborator as one short
//! human-readable reason string; nothing here triggers automatic retries.

use sublens_client::ClientError;
use sublens_stream::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExplainError {
    /// No API key configured; quick and deep calls refuse early.
    #[error("no API credential configured")]
    MissingCredential,

    /// Transport failure or a non-success endpoint response.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// Well-formed response signaling the provider declined.
    #[error("provider declined: {0}")]
    RefusalOrSafetyBlock(String),

    /// Response body did not match any expected shape.
    #[error("unexpected response shape: {0}")]
    ParseFailure(String),

    /// Parsed cleanly but both expected fields were blank.
    #[error("response contained no usable text")]
    EmptyResult,

    /// The deep stream ended without a complete event.
    #[error("stream ended before completion")]
    StreamIncomplete,

    /// Both persistent stores refused the operation.
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),
}

impl ExplainError {
    /// The reason string carried on a `REQUEST_FAILED` notification.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    pub(crate) fn cache<E: std::error::Error>(err: E) -> Self {
        ExplainError::CacheUnavailable(err.to_string())
    }
}

impl From<ClientError> for ExplainError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::MissingCredential => ExplainError::MissingCredential,
            ClientError::Network(err) => ExplainError::NetworkFailure(err.to_string()),
            ClientError::Endpoint { status, body } => {
                ExplainError::NetworkFailure(format!("endpoint returned {status}: {body}"))
            }
            ClientError::Refusal(reason) => ExplainError::RefusalOrSafetyBlock(reason),
            ClientError::Parse(detail) => ExplainError::ParseFailure(detail),
            ClientError::EmptyResult => ExplainError::EmptyResult,
            ClientError::Stream(DecodeError::Incomplete) => ExplainError::StreamIncomplete,
            ClientError::Stream(DecodeError::StreamError(reason)) => {
                ExplainError::NetworkFailure(reason)
            }
            ClientError::Stream(DecodeError::MalformedRecord(err)) => {
                ExplainError::ParseFailure(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_incomplete_maps_through() {
        let err = ExplainError::from(ClientError::Stream(DecodeError::Incomplete));
        assert!(matches!(err, ExplainError::StreamIncomplete));
    }

    #[test]
    fn test_reason_is_short_and_human_readable() {
        let reason = ExplainError::MissingCredential.reason();
        assert_eq!(reason, "no API credential configured");
    }
}
