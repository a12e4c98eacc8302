//! Adapter implementations for port traits.
//!
//! - `live/` — Telegram Bot API transport and HTTP avatar fetcher

pub mod live;
