use crate::backend::{EventStream, ExplainBackend};
use crate::extract::{extract_output_text, refusal_reason, split_quick_output};
use crate::{ClientError, Result};
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use sublens_explain::{Credentials, ExplainRequest, QuickExplanation, DEFAULT_QUICK_TTL_MINUTES};
use sublens_stream::StreamDecoder;

/// Default endpoint: a locally-run explanation service. No transport
/// trust is assumed beyond the bearer credential.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for the explanation service.
pub struct ExplainClient {
    http: reqwest::Client,
}

impl ExplainClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    fn endpoint(credentials: &Credentials, path: &str) -> String {
        let base = credentials
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{base}{path}")
    }

    /// Turn a completion response body into the quick payload.
    fn parse_quick(request: &ExplainRequest, body: &Value) -> Result<QuickExplanation> {
        if let Some(reason) = refusal_reason(body) {
            return Err(ClientError::Refusal(reason));
        }

        // The service may answer with the fields directly, or wrap the
        // model output in one of the known provider shapes.
        let (literal, context) = match (
            body.get("literal").and_then(Value::as_str),
            body.get("context").and_then(Value::as_str),
        ) {
            (Some(literal), Some(context)) => (literal.to_string(), context.to_string()),
            _ => {
                let text = extract_output_text(body)
                    .ok_or_else(|| ClientError::Parse("no recognizable output text".to_string()))?;
                split_quick_output(&text)
            }
        };

        if literal.trim().is_empty() && context.trim().is_empty() {
            return Err(ClientError::EmptyResult);
        }

        let now = sublens_explain::now_ms();
        Ok(QuickExplanation {
            request_id: request.request_id,
            literal,
            context,
            languages: request.languages.clone(),
            detected_at: body.get("detectedAt").and_then(Value::as_i64).unwrap_or(now),
            expires_at: body
                .get("expiresAt")
                .and_then(Value::as_i64)
                .unwrap_or(now + DEFAULT_QUICK_TTL_MINUTES as i64 * 60 * 1000),
        })
    }
}

#[async_trait::async_trait]
impl ExplainBackend for ExplainClient {
    async fn quick_explain(
        &self,
        credentials: &Credentials,
        request: &ExplainRequest,
    ) -> Result<QuickExplanation> {
        let url = Self::endpoint(credentials, "/explain/quick");
        tracing::debug!(%url, request_id = %request.request_id, "quick explain call");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Endpoint {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let body: Value = response.json().await?;
        Self::parse_quick(request, &body)
    }

    async fn deep_explain(
        &self,
        credentials: &Credentials,
        request: &ExplainRequest,
    ) -> Result<EventStream> {
        let url = Self::endpoint(credentials, "/explain/deep");
        tracing::debug!(%url, request_id = %request.request_id, "deep explain call");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Endpoint {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let mut bytes = response.bytes_stream();
        let stream = async_stream::try_stream! {
            let mut decoder = StreamDecoder::new();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(ClientError::Network)?;
                buffer.extend_from_slice(&chunk);
                let text = drain_valid_utf8(&mut buffer);
                for event in decoder.feed(&text)? {
                    yield event;
                }
            }

            for event in decoder.finish()? {
                yield event;
            }
        };
        Ok(stream.boxed())
    }
}

/// Drain the longest valid UTF-8 prefix of `buffer`; a multi-byte
/// character split across network chunks stays buffered for the next read.
fn drain_valid_utf8(buffer: &mut Vec<u8>) -> String {
    let valid_len = match std::str::from_utf8(buffer) {
        Ok(_) => buffer.len(),
        Err(err) => err.valid_up_to(),
    };
    let drained: Vec<u8> = buffer.drain(..valid_len).collect();
    String::from_utf8(drained).unwrap_or_default()
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sublens_explain::{ExplainMode, LanguagePair};

    fn request() -> ExplainRequest {
        ExplainRequest::new(ExplainMode::Quick, "that's cap", LanguagePair::new("en"))
    }

    #[test]
    fn test_parse_quick_direct_fields() {
        let body = json!({"literal": "that's fake", "context": "dismissive"});
        let quick = ExplainClient::parse_quick(&request(), &body).unwrap();
        assert_eq!(quick.literal, "that's fake");
        assert_eq!(quick.context, "dismissive");
        assert!(quick.expires_at > quick.detected_at);
    }

    #[test]
    fn test_parse_quick_wrapped_output() {
        let body = json!({"output_text": "{\"literal\": \"fake\", \"context\": \"slang\"}"});
        let quick = ExplainClient::parse_quick(&request(), &body).unwrap();
        assert_eq!(quick.literal, "fake");
        assert_eq!(quick.context, "slang");
    }

    #[test]
    fn test_parse_quick_refusal() {
        let body = json!({"refusal": "declined"});
        assert!(matches!(
            ExplainClient::parse_quick(&request(), &body),
            Err(ClientError::Refusal(_))
        ));
    }

    #[test]
    fn test_parse_quick_empty_result() {
        let body = json!({"output_text": "  "});
        assert!(matches!(
            ExplainClient::parse_quick(&request(), &body),
            Err(ClientError::EmptyResult)
        ));
    }

    #[test]
    fn test_parse_quick_unrecognized_shape() {
        let body = json!({"something": "else"});
        assert!(matches!(
            ExplainClient::parse_quick(&request(), &body),
            Err(ClientError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_quick_honors_endpoint_expiry() {
        let body = json!({
            "literal": "fake", "context": "slang",
            "detectedAt": 1000, "expiresAt": 2000
        });
        let quick = ExplainClient::parse_quick(&request(), &body).unwrap();
        assert_eq!(quick.detected_at, 1000);
        assert_eq!(quick.expires_at, 2000);
    }

    #[test]
    fn test_drain_valid_utf8_holds_split_char() {
        // "café" with the last byte of 'é' missing.
        let mut buffer = "caf\u{e9}".as_bytes().to_vec();
        let last = buffer.pop().unwrap();

        let text = drain_valid_utf8(&mut buffer);
        assert_eq!(text, "caf");
        assert_eq!(buffer.len(), 1);

        buffer.push(last);
        assert_eq!(drain_valid_utf8(&mut buffer), "\u{e9}");
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let creds = Credentials {
            api_key: "k".into(),
            base_url: Some("http://localhost:9999/".into()),
        };
        assert_eq!(
            ExplainClient::endpoint(&creds, "/explain/quick"),
            "http://localhost:9999/explain/quick"
        );
    }

    #[test]
    fn test_endpoint_default_base() {
        let creds = Credentials {
            api_key: "k".into(),
            base_url: None,
        };
        assert!(ExplainClient::endpoint(&creds, "/explain/deep").starts_with(DEFAULT_BASE_URL));
    }
}
