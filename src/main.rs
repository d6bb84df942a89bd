//! Kindling
//!
//! Community link-sharing feed built with Leptos (WASM).
//!
//! # Features
//!
//! - Paginated and vote-ranked views of submitted links
//! - Voting for signed-in users
//! - Live feed updates (new links, new votes) over WebSocket
//!
//! # Architecture
//!
//! This is a client-side rendered (CSR) Leptos application that compiles to
//! WebAssembly. It talks to the Kindling GraphQL API over HTTP for queries
//! and mutations and over a persistent WebSocket for subscriptions.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;
mod time;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    // Mount the app to the document body
    mount_to_body(|| view! { <app::App /> });
}
