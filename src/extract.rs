// Pulling the JSON payload out of free-text model replies.
//
// Generation prompts demand a single fenced ```json block, but replies still
// arrive with greetings, markdown, or a bare object. The fenced regex is the
// primary path; an outermost-brace scan covers unfenced replies.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;

lazy_static! {
    static ref FENCED_JSON: Regex =
        Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("fenced JSON regex");
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON block found in model reply")]
    NoJson,
    #[error("reply JSON did not match the expected shape: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        snippet: String,
    },
}

/// Extract the JSON object text from a model reply, fenced or bare.
pub fn json_block(reply: &str) -> Option<&str> {
    if let Some(caps) = FENCED_JSON.captures(reply) {
        return caps.get(1).map(|m| m.as_str());
    }
    // Unfenced fallback: take the outermost object span.
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&reply[start..=end])
}

/// Extract and deserialize the payload a generation prompt asked for.
pub fn payload<T: DeserializeOwned>(reply: &str) -> Result<T, ExtractError> {
    let block = json_block(reply).ok_or(ExtractError::NoJson)?;
    serde_json::from_str(block).map_err(|source| ExtractError::Parse {
        source,
        snippet: snippet(block),
    })
}

/// Truncate a reply for log lines and error bodies.
pub fn snippet(reply: &str) -> String {
    const MAX: usize = 400;
    if reply.len() <= MAX {
        return reply.to_string();
    }
    let mut end = MAX;
    while !reply.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &reply[..end])
}
