//! State Management
//!
//! Global application state and the live update channel.

pub mod global;
pub mod websocket;

pub use global::{provide_global_state, GlobalState};
pub use websocket::start_live_feed;
