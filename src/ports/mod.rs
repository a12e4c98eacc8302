//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system. Implementations live in `src/adapters/`.

pub mod avatar;
pub mod transport;

pub use avatar::AvatarFetcher;
pub use transport::ChatTransport;
