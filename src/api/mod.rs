//! API Client
//!
//! GraphQL client construction and operation execution.

pub mod client;

pub use client::ApiClient;
