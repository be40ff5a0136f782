//! Notification relay for Hearts.
//!
//! Every relay instance consumes the `notifications` topic and hands each payload to the
//! users connected to its own [`realtime_hub::Hub`]. Nothing is persisted here; a user with
//! no connection on this instance simply does not receive the event from it.

pub mod config;
pub mod error;
pub mod logging;
pub mod relay;

pub use error::RelayError;
pub use relay::NotificationRelay;
