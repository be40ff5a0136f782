//! Match service: likes, match detection, notifications and chat for Hearts.
//!
//! A like is written synchronously and a match check is published to the broker. The
//! [`worker::MatchCheckWorker`] consumes match checks, re-reads both directions from the
//! database and, on a mutual like, stores a notification for each user and pushes it
//! through the local hub and the `notifications` topic.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod repository;
pub mod services;
pub mod state;
pub mod websocket;
pub mod worker;

pub use error::{AppError, AppResult};
pub use state::{AppState, Repositories};
pub use worker::MatchCheckWorker;
