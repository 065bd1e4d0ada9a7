//! Twitter/X surface: handle normalization, the v2 API client, upstream response models
//! and the extractors that turn API JSON, mirror JSON and Nitter HTML into [`crate::Item`]s.
pub mod client;
pub mod extract;
pub mod handle;
pub mod types;

pub use client::TwitterApi;
