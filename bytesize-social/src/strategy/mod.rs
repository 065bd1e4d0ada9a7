//! Acquisition strategies tried in order by the [`crate::Resolver`].
//!
//! Every real strategy fetches from one upstream and may fail; the
//! [`SyntheticBackstop`] is deliberately not a [`Strategy`] because it cannot fail.
use crate::item::Item;
use async_trait::async_trait;
use bytesize_http::HttpError;
use std::time::Duration;
use thiserror::Error;

mod mirror;
mod nitter;
mod synthetic;
mod twitter_api;

pub use mirror::MirrorStrategy;
pub use nitter::NitterStrategy;
pub use synthetic::{DEFAULT_TOPICS, SyntheticBackstop};
pub use twitter_api::TwitterApiStrategy;

pub const DEFAULT_STRATEGY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("strategy misconfigured: {0}")]
    Config(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// One way of acquiring recent tweets for a normalized handle.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Stable name used in logs and in [`crate::Resolution::source`].
    fn name(&self) -> &str;

    /// Upper bound the resolver enforces on a single [`Strategy::fetch`] call.
    fn timeout(&self) -> Duration {
        DEFAULT_STRATEGY_TIMEOUT
    }

    /// Fetch up to `max_items` items, newest first. An empty `Ok` counts as a miss.
    async fn fetch(&self, handle: &str, max_items: usize) -> Result<Vec<Item>, StrategyError>;
}
