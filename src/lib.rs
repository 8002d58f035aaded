//! Realtime update and status-derivation layer for the Valiflow invoice
//! review dashboard.
//!
//! Backend events arrive over server-sent events, are rebroadcast on an
//! explicit [`EventBus`](services::event_bus::EventBus) by an
//! [`EventBridge`](services::bridge::EventBridge), and reach feature code
//! through the filtering hooks in [`services::hooks`]. Everything a user sees
//! is rendered through [`utils::status`] and [`utils::format`].

pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{RealtimeError, Result};
