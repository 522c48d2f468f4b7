//! Turns a stored media group back into `sendMediaGroup` input.

use {
    serde::Serialize,
    serde_json::Value,
    teloxide::types::{MessageEntity, ParseMode},
};

use crate::fragment::{Fragment, Media};

/// Rich-text formatting for an overriding caption.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptionFormat {
    ParseMode(ParseMode),
    Entities(Vec<MessageEntity>),
}

/// Options for [`to_outbound_media`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaOptions {
    /// Replaces the caption of the first item. The first item's own caption,
    /// entities and placement are dropped when this is set.
    pub caption: Option<String>,
    /// Formatting for `caption`; ignored without it.
    pub caption_format: Option<CaptionFormat>,
    /// Placement for `caption`; ignored without it.
    pub show_caption_above_media: Option<bool>,
    /// Applied to every photo and video item.
    pub has_spoiler: Option<bool>,
}

/// One item of a `sendMediaGroup` request, serialized as Bot API `InputMedia`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMedia {
    Photo(VisualMedia),
    Video(VisualMedia),
    Document(FileMedia),
    Audio(FileMedia),
}

/// Photo or video item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisualMedia {
    pub media: String,
    #[serde(flatten)]
    pub caption: CaptionFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_caption_above_media: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_spoiler: Option<bool>,
}

/// Document or audio item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileMedia {
    pub media: String,
    #[serde(flatten)]
    pub caption: CaptionFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaptionFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_entities: Option<CaptionEntities>,
}

/// Caption entities, kept in the form they came in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CaptionEntities {
    /// Copied verbatim from a stored message.
    Stored(Vec<Value>),
    /// Supplied with an overriding caption.
    Override(Vec<MessageEntity>),
}

impl OutboundMedia {
    /// The `file_id` this item re-sends.
    #[must_use]
    pub fn media(&self) -> &str {
        match self {
            Self::Photo(m) | Self::Video(m) => &m.media,
            Self::Document(m) | Self::Audio(m) => &m.media,
        }
    }

    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        match self {
            Self::Photo(m) | Self::Video(m) => m.caption.caption.as_deref(),
            Self::Document(m) | Self::Audio(m) => m.caption.caption.as_deref(),
        }
    }
}

/// Convert a stored group into media group input, preserving order.
///
/// Photos use their largest size, animations become videos, and fragments
/// without a supported payload are left out.
#[must_use]
pub fn to_outbound_media(fragments: &[Fragment], options: &MediaOptions) -> Vec<OutboundMedia> {
    fragments
        .iter()
        .enumerate()
        .filter_map(|(index, fragment)| convert_one(fragment, index == 0, options))
        .collect()
}

fn convert_one(fragment: &Fragment, first: bool, options: &MediaOptions) -> Option<OutboundMedia> {
    let (caption, show_above) = match (&options.caption, first) {
        (Some(text), true) => (
            override_caption(text, options.caption_format.as_ref()),
            options.show_caption_above_media,
        ),
        _ => (
            CaptionFields {
                caption: fragment.caption.clone(),
                parse_mode: None,
                caption_entities: fragment.caption_entities.clone().map(CaptionEntities::Stored),
            },
            fragment.show_caption_above_media,
        ),
    };

    let visual = |file_id: &str| VisualMedia {
        media: file_id.to_string(),
        caption: caption.clone(),
        show_caption_above_media: show_above,
        has_spoiler: options.has_spoiler,
    };
    let plain = |file_id: &str| FileMedia {
        media: file_id.to_string(),
        caption: caption.clone(),
    };

    match fragment.media()? {
        Media::Photo(sizes) => sizes
            .last()
            .map(|largest| OutboundMedia::Photo(visual(&largest.file_id))),
        // sendMediaGroup has no animation type.
        Media::Video(file) | Media::Animation(file) => {
            Some(OutboundMedia::Video(visual(&file.file_id)))
        },
        Media::Document(file) => Some(OutboundMedia::Document(plain(&file.file_id))),
        Media::Audio(file) => Some(OutboundMedia::Audio(plain(&file.file_id))),
    }
}

fn override_caption(text: &str, format: Option<&CaptionFormat>) -> CaptionFields {
    let (parse_mode, caption_entities) = match format {
        Some(CaptionFormat::ParseMode(mode)) => (Some(*mode), None),
        Some(CaptionFormat::Entities(entities)) => {
            (None, Some(CaptionEntities::Override(entities.clone())))
        },
        None => (None, None),
    };
    CaptionFields {
        caption: Some(text.to_string()),
        parse_mode,
        caption_entities,
    }
}
