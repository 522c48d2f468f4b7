//! Extracts candidate messages from outbound Bot API call results.
//!
//! Calls that can create or change media group members return differently
//! shaped results. The shape knowledge lives in [`CALL_RULES`] only.

use serde_json::Value;

/// How to pull messages out of one call's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractRule {
    /// The result is a list of messages. Anything else yields nothing.
    Array,
    /// The result is a single message.
    Singleton,
    /// The result is either a message or `true` (an inline message was
    /// edited and nothing is returned).
    OptionalObject,
}

impl ExtractRule {
    #[must_use]
    pub fn extract(self, result: &Value) -> Vec<Value> {
        match self {
            Self::Array => match result {
                Value::Array(items) => items.clone(),
                _ => Vec::new(),
            },
            Self::Singleton => vec![result.clone()],
            Self::OptionalObject => match result {
                Value::Object(_) => vec![result.clone()],
                _ => Vec::new(),
            },
        }
    }
}

/// Calls whose results may contain media group members, by Bot API name.
pub const CALL_RULES: &[(&str, ExtractRule)] = &[
    ("sendMediaGroup", ExtractRule::Array),
    ("forwardMessage", ExtractRule::Singleton),
    ("editMessageCaption", ExtractRule::OptionalObject),
    ("editMessageMedia", ExtractRule::OptionalObject),
    ("editMessageReplyMarkup", ExtractRule::OptionalObject),
];

/// Look up the rule for a call.
///
/// Accepts the Bot API name (`sendMediaGroup`) as well as teloxide's method
/// (`send_media_group`) and payload (`SendMediaGroup`) spellings. teloxide's
/// `*_inline` edit variants map to the same Bot API call.
#[must_use]
pub fn rule_for(call: &str) -> Option<ExtractRule> {
    let wanted = normalize(call);
    CALL_RULES
        .iter()
        .find(|(name, _)| normalize(name) == wanted)
        .map(|(_, rule)| *rule)
}

/// Candidate messages in the result of `call`. Unknown calls yield nothing.
#[must_use]
pub fn extract_candidates(call: &str, result: &Value) -> Vec<Value> {
    rule_for(call)
        .map(|rule| rule.extract(result))
        .unwrap_or_default()
}

fn normalize(call: &str) -> String {
    let name: String = call
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match name.strip_suffix("inline") {
        Some(base) => base.to_string(),
        None => name,
    }
}
