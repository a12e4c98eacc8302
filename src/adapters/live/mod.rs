//! Adapters that talk to real services.

pub mod http;
pub mod telegram;
