//! Media group aggregation for Telegram bots.
//!
//! Messages sent as one album arrive one by one with a shared
//! `media_group_id`. [`FragmentStore`] accumulates them per group on a
//! pluggable [`GroupBackend`], [`classify`] pulls messages out of outbound
//! call results, and [`convert`] turns a stored group back into
//! `sendMediaGroup` input.

pub mod backend;
pub mod classify;
pub mod convert;
pub mod error;
pub mod fragment;
pub mod memory;
pub mod store;

pub use {
    backend::GroupBackend,
    classify::{ExtractRule, extract_candidates},
    convert::{CaptionEntities, CaptionFormat, MediaOptions, OutboundMedia, to_outbound_media},
    error::{Error, Result},
    fragment::{Fragment, FragmentId, Media, MediaFile},
    memory::MemoryBackend,
    store::FragmentStore,
};
