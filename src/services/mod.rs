pub mod api;
pub mod bridge;
pub mod event_bus;
pub mod hooks;
pub mod sse;
pub mod state;
