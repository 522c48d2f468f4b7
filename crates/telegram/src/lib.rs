//! Telegram integration for media group collection.
//!
//! Wraps the engine for teloxide bots: converts inbound messages and updates
//! into fragments, records outbound call results, and looks groups up for a
//! message, its reply or its pin.

pub mod config;
pub mod error;
pub mod handlers;
pub mod plugin;

pub use {
    config::{BackendKind, MediaGroupsConfig, load_config},
    error::{Error, Result},
    plugin::MediaGroups,
};
