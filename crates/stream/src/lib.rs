//! Incremental decoder for the deep-explain byte stream.
//!
//! The explanation service answers a deep request with newline-delimited
//! records, each terminated by a blank line:
//!
//! ```text
//! event: progress
//! data: {"background": {"summary": "..."}}
//!
//! event: complete
//! data: {...full payload...}
//! ```
//!
//! Network chunks split records at arbitrary byte offsets, so the decoder
//! keeps the unconsumed tail between [`StreamDecoder::feed`] calls and the
//! caller flushes the final unterminated record with
//! [`StreamDecoder::finish`].

use sublens_explain::{DeepExplanation, DeepPatch};

/// Decoded stream events, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Accumulated partial payload after merging one progress record.
    Progress(DeepPatch),
    /// Final payload; decoding has terminated successfully.
    Complete(Box<DeepExplanation>),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The service emitted an `error` record.
    #[error("{0}")]
    StreamError(String),
    /// A record's data lines were not the expected JSON shape.
    #[error("malformed stream record: {0}")]
    MalformedRecord(#[from] serde_json::Error),
    /// The stream ended without a `complete` record.
    #[error("stream ended before completion")]
    Incomplete,
}

/// Incremental record decoder for one deep-explain request.
///
/// Owns the scratch buffer and the accumulated partial payload; dropped at
/// stream end or on abort.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: String,
    partial: DeepPatch,
    completed: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns every event completed by it.
    ///
    /// A record boundary falling mid-chunk is fine: the unconsumed buffer
    /// carries over to the next call.
    pub fn feed(&mut self, chunk: &str) -> Result<Vec<StreamEvent>, DecodeError> {
        self.pending.push_str(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.find("\n\n") {
            let record: String = self.pending.drain(..pos + 2).collect();
            if let Some(event) = self.decode_record(&record)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Signal end of stream, flushing any unterminated final record.
    ///
    /// Fails with [`DecodeError::Incomplete`] when no `complete` record was
    /// ever seen.
    pub fn finish(mut self) -> Result<Vec<StreamEvent>, DecodeError> {
        let tail = std::mem::take(&mut self.pending);
        let mut events = Vec::new();
        if let Some(event) = self.decode_record(&tail)? {
            events.push(event);
        }
        if self.completed {
            Ok(events)
        } else {
            Err(DecodeError::Incomplete)
        }
    }

    /// Whether a `complete` record has been decoded.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// The partial payload accumulated from progress records so far.
    pub fn partial(&self) -> &DeepPatch {
        &self.partial
    }

    fn decode_record(&mut self, record: &str) -> Result<Option<StreamEvent>, DecodeError> {
        let mut event_name: Option<&str> = None;
        let mut data_lines: Vec<&str> = Vec::new();

        for line in record.lines() {
            let line = line.trim_end_matches('\r');
            if let Some(value) = line.strip_prefix("event:") {
                event_name = Some(value.trim());
            } else if let Some(value) = line.strip_prefix("data:") {
                data_lines.push(value.strip_prefix(' ').unwrap_or(value));
            }
        }

        let data = data_lines.join("\n");
        let name = match event_name {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(None),
        };

        if self.completed {
            tracing::debug!(event = name, "record after completion, ignoring");
            return Ok(None);
        }

        match name {
            "progress" => {
                let patch: DeepPatch = serde_json::from_str(&data)?;
                self.partial.merge(patch);
                Ok(Some(StreamEvent::Progress(self.partial.clone())))
            }
            "complete" => {
                let payload: DeepExplanation = serde_json::from_str(&data)?;
                self.completed = true;
                Ok(Some(StreamEvent::Complete(Box::new(payload))))
            }
            "error" => Err(DecodeError::StreamError(extract_reason(&data))),
            other => {
                tracing::debug!(event = other, "unknown stream event, skipping");
                Ok(None)
            }
        }
    }
}

/// Pull the human-readable reason out of an `error` record's data.
fn extract_reason(data: &str) -> String {
    serde_json::from_str::<serde_json::Value>(data)
        .ok()
        .and_then(|value| {
            value
                .get("reason")
                .and_then(|reason| reason.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| data.trim().to_string())
}
