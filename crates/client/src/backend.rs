//! Backend seam between the orchestrator and the network.

use crate::Result;
use futures::stream::BoxStream;
use sublens_explain::{Credentials, ExplainRequest, QuickExplanation};
use sublens_stream::StreamEvent;

/// Decoded deep-explain events as they arrive off the wire.
pub type EventStream = BoxStream<'static, Result<StreamEvent>>;

/// The explanation service as the orchestrator sees it. The production
/// implementation is [`crate::ExplainClient`]; tests script their own.
#[async_trait::async_trait]
pub trait ExplainBackend: Send + Sync {
    /// Direct completion call for a quick gloss.
    async fn quick_explain(
        &self,
        credentials: &Credentials,
        request: &ExplainRequest,
    ) -> Result<QuickExplanation>;

    /// Streaming call for a deep explanation.
    async fn deep_explain(
        &self,
        credentials: &Credentials,
        request: &ExplainRequest,
    ) -> Result<EventStream>;
}
