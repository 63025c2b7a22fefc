use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static JSON_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("valid fenced json regex")
});

/// Pulls a JSON value out of a model reply.
///
/// The whole reply is tried first, then every ```json fenced block in order
/// of appearance. The first candidate that parses wins. `None` means the
/// reply needs a reformat.
pub fn extract(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return Some(value);
    }

    for captures in JSON_BLOCK_RE.captures_iter(raw) {
        let candidate = captures.get(1).map_or("", |m| m.as_str()).trim();

        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return Some(value),
            Err(err) => {
                let preview: String = candidate.chars().take(100).collect();
                tracing::debug!("Skipping invalid JSON block ({}): {}...", err, preview);
            }
        }
    }

    None
}
