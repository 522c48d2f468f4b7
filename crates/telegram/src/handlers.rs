//! Turning teloxide messages and updates into stored fragments.

use {
    serde_json::Value,
    teloxide::types::{Message, Update, UpdateKind},
    tracing::warn,
};

use mediagroups_engine::Fragment;

use crate::Result;

/// Messages nested in an inbound message that may belong to a media group.
const NESTED_MESSAGES: &[&str] = &["reply_to_message", "pinned_message"];

/// Convert one message into a fragment.
pub fn fragment_from_message(msg: &Message) -> Result<Fragment> {
    let raw = serde_json::to_value(msg)?;
    Ok(serde_json::from_value(raw)?)
}

/// The message, then its replied-to and pinned messages when present.
///
/// Parts that cannot be decoded are logged and skipped.
pub fn fragments_in_message(msg: &Message) -> Vec<Fragment> {
    let raw = match serde_json::to_value(msg) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(message_id = msg.id.0, error = %e, "failed to serialize message");
            return Vec::new();
        },
    };

    let nested = NESTED_MESSAGES.iter().filter_map(|field| {
        raw.get(*field)
            .filter(|value| !value.is_null())
            .map(|value| (*field, value))
    });
    std::iter::once(("message", &raw))
        .chain(nested)
        .filter_map(|(part, value)| decode_fragment(part, value))
        .collect()
}

/// The replied-to message of `msg`, if any.
pub fn reply_fragment(msg: &Message) -> Result<Option<Fragment>> {
    nested_fragment(msg, "reply_to_message")
}

/// The pinned message carried by a pin service message, if any.
pub fn pinned_fragment(msg: &Message) -> Result<Option<Fragment>> {
    nested_fragment(msg, "pinned_message")
}

fn nested_fragment(msg: &Message, field: &str) -> Result<Option<Fragment>> {
    let mut raw = serde_json::to_value(msg)?;
    match raw.get_mut(field).map(Value::take) {
        Some(Value::Null) | None => Ok(None),
        Some(nested) => Ok(Some(serde_json::from_value(nested)?)),
    }
}

/// The message carried by an update, for the update kinds that carry one.
pub fn message_of_update(update: &Update) -> Option<&Message> {
    match &update.kind {
        UpdateKind::Message(msg)
        | UpdateKind::EditedMessage(msg)
        | UpdateKind::ChannelPost(msg)
        | UpdateKind::EditedChannelPost(msg) => Some(msg),
        _ => None,
    }
}

/// Decode one message value, logging and skipping it when it does not fit.
pub(crate) fn decode_fragment(part: &str, value: &Value) -> Option<Fragment> {
    match serde_json::from_value(value.clone()) {
        Ok(fragment) => Some(fragment),
        Err(e) => {
            warn!(
                part,
                message_id = ?value.get("message_id"),
                error = %e,
                "skipping undecodable message"
            );
            None
        },
    }
}
