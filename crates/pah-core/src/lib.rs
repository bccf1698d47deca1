//! Core library for the Personal Agentic Hub chat client.
//!
//! Protocol types, the message-part reconciliation pipeline, and the
//! hub-facing network clients live here. Terminal rendering lives in
//! `pah-tui`; this crate has no UI dependencies.

pub mod callback;
pub mod components;
pub mod config;
pub mod dedup;
pub mod draft;
pub mod error;
pub mod events;
pub mod feed;
pub mod parts;
pub mod push;
pub mod transport;
