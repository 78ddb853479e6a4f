//! Text extraction from provider response bodies.
//!
//! Providers disagree on where "the text the model produced" lives. Each
//! strategy is declared with a name and tried in order; the first one that
//! yields text wins.

use serde_json::Value;

type Strategy = fn(&Value) -> Option<String>;

/// Ordered extraction strategies over known response shapes.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("output_text string", output_text_string),
    ("output_text lines", output_text_lines),
    ("output content items", output_content_items),
    ("chat choices", chat_choices),
];

fn output_text_string(value: &Value) -> Option<String> {
    value.get("output_text")?.as_str().map(str::to_string)
}

fn output_text_lines(value: &Value) -> Option<String> {
    let lines = value.get("output_text")?.as_array()?;
    let joined = lines
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    (!joined.is_empty()).then_some(joined)
}

fn output_content_items(value: &Value) -> Option<String> {
    let items = value.get("output")?.as_array()?;
    let mut parts = Vec::new();
    for item in items {
        if let Some(content) = item.get("content").and_then(Value::as_array) {
            for block in content {
                if let Some(text) = block.get("text").and_then(Value::as_str) {
                    parts.push(text);
                }
            }
        }
    }
    (!parts.is_empty()).then(|| parts.join("\n"))
}

fn chat_choices(value: &Value) -> Option<String> {
    value
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// Extract the produced text from a response body, trying each declared
/// strategy in order.
pub fn extract_output_text(value: &Value) -> Option<String> {
    for (name, strategy) in STRATEGIES {
        if let Some(text) = strategy(value) {
            tracing::debug!(strategy = %name, "extracted output text");
            return Some(text);
        }
    }
    None
}

/// Detect a well-formed response signaling that the provider declined.
pub fn refusal_reason(value: &Value) -> Option<String> {
    if let Some(reason) = value.get("refusal").and_then(Value::as_str) {
        return Some(reason.to_string());
    }

    if let Some(choice) = value.get("choices").and_then(Value::as_array).and_then(|c| c.first()) {
        if let Some(reason) = choice
            .get("message")
            .and_then(|m| m.get("refusal"))
            .and_then(Value::as_str)
        {
            return Some(reason.to_string());
        }
        if choice.get("finish_reason").and_then(Value::as_str) == Some("content_filter") {
            return Some("content filtered by provider".to_string());
        }
    }

    if let Some(items) = value.get("output").and_then(Value::as_array) {
        for item in items {
            if item.get("type").and_then(Value::as_str) == Some("refusal") {
                let reason = item
                    .get("refusal")
                    .and_then(Value::as_str)
                    .unwrap_or("request refused by provider");
                return Some(reason.to_string());
            }
        }
    }

    None
}

/// Split extracted text into the quick `(literal, context)` pair: a JSON
/// object with those fields when the model followed instructions, first
/// line plus remainder when it did not.
pub fn split_quick_output(text: &str) -> (String, String) {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if value.is_object() {
            let literal = value
                .get("literal")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let context = value
                .get("context")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return (literal, context);
        }
    }

    let mut lines = text.lines();
    let literal = lines.next().unwrap_or_default().to_string();
    let context = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    (literal, context)
}
