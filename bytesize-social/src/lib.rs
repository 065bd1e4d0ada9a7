//! Tweet acquisition for the ByteSize newsletter.
//!
//! A [`resolver::Resolver`] walks an ordered list of [`strategy::Strategy`] implementations
//! (Twitter API, JSON mirrors, Nitter scraping) and returns the first non-empty batch of
//! [`item::Item`]s. When every source fails it falls back to the
//! [`strategy::SyntheticBackstop`], whose items are flagged as placeholders so downstream
//! consumers never present them as real tweets.
//!
//! The [`digest`] module composes resolution with the external collaborators of the
//! newsletter (item store, summarizer, email notifier).
pub mod digest;
pub mod item;
pub mod resolver;
pub mod strategy;
pub mod twitter;

pub use item::Item;
pub use resolver::{Resolution, ResolveError, Resolver, normalize_identifier};
pub use strategy::{Strategy, StrategyError, SyntheticBackstop};
pub use twitter::handle::normalize_handle;
