//! HTTP client for the external explanation service.
//!
//! Two call shapes: a direct completion call for quick glosses and a
//! chunked streaming call for deep explanations. Response bodies come in
//! several shapes depending on the backing provider, so text extraction is
//! a declared list of strategies tried in order rather than ad hoc
//! property probing.

mod backend;
mod client;
mod extract;

pub use backend::{EventStream, ExplainBackend};
pub use client::{ExplainClient, DEFAULT_BASE_URL};
pub use extract::{extract_output_text, refusal_reason, split_quick_output};

use sublens_stream::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no API credential configured")]
    MissingCredential,
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),
    #[error("endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },
    #[error("provider declined: {0}")]
    Refusal(String),
    #[error("unexpected response shape: {0}")]
    Parse(String),
    #[error("response contained no usable text")]
    EmptyResult,
    #[error(transparent)]
    Stream(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
