//! UI Components
//!
//! Reusable Leptos components for the feed.

pub mod link_row;
pub mod loading;
pub mod nav;
pub mod toast;

pub use link_row::LinkRow;
pub use loading::Loading;
pub use nav::Nav;
pub use toast::Toast;
