//! Ordered, sequential fallback across acquisition strategies.
//!
//! Strategies run one at a time in configuration order. The first strategy that returns
//! at least one item wins and no later strategy is invoked. Errors, timeouts and empty
//! results are logged and advance to the next strategy; when the list is exhausted the
//! [`SyntheticBackstop`] produces placeholder items and the resolution is flagged
//! `synthetic`.
//!
//! Cancellation is cooperative through a [`CancellationToken`]: the in-flight strategy is
//! dropped and nothing else runs, including the backstop.
use crate::item::Item;
use crate::strategy::{Strategy, StrategyError, SyntheticBackstop};
use crate::twitter::handle::{is_valid_handle, normalize_handle};
use bytesize_common::BytesizeError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

pub use bytesize_common::{DEFAULT_MAX_ITEMS, MAX_ITEMS_LIMIT};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("identifier is empty")]
    EmptyIdentifier,
    #[error("identifier {0:?} does not contain a valid handle")]
    InvalidIdentifier(String),
    #[error("max items must be between 1 and {MAX_ITEMS_LIMIT}, got {0}")]
    InvalidMaxItems(usize),
    #[error("resolution cancelled")]
    Cancelled,
}

impl From<ResolveError> for BytesizeError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Cancelled => BytesizeError::Cancelled,
            other => BytesizeError::Input(other.to_string()),
        }
    }
}

/// Items for one handle plus where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub handle: String,
    pub items: Vec<Item>,
    /// True when every real strategy missed and the items are placeholders.
    pub synthetic: bool,
    /// Name of the strategy that produced `items`.
    pub source: String,
}

pub struct Resolver {
    strategies: Vec<Arc<dyn Strategy>>,
    backstop: SyntheticBackstop,
    default_max_items: usize,
}

impl Resolver {
    pub fn new(strategies: Vec<Arc<dyn Strategy>>) -> Self {
        Self {
            strategies,
            backstop: SyntheticBackstop::default(),
            default_max_items: DEFAULT_MAX_ITEMS,
        }
    }

    pub fn with_backstop(mut self, backstop: SyntheticBackstop) -> Self {
        self.backstop = backstop;
        self
    }

    /// Count used when callers pass `None`; clamped into `1..=MAX_ITEMS_LIMIT`.
    pub fn with_default_max_items(mut self, n: usize) -> Self {
        self.default_max_items = n.clamp(1, MAX_ITEMS_LIMIT);
        self
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(
        &self,
        identifier: &str,
        max_items: Option<usize>,
    ) -> Result<Resolution, ResolveError> {
        self.resolve_with_cancel(identifier, max_items, &CancellationToken::new())
            .await
    }

    pub async fn resolve_with_cancel(
        &self,
        identifier: &str,
        max_items: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        let handle = normalize_identifier(identifier)?;
        let max_items = match max_items {
            None => self.default_max_items,
            Some(n) if (1..=MAX_ITEMS_LIMIT).contains(&n) => n,
            Some(n) => return Err(ResolveError::InvalidMaxItems(n)),
        };

        for strategy in &self.strategies {
            let name = strategy.name();
            let limit = strategy.timeout();
            let started = std::time::Instant::now();
            tracing::debug!(%handle, strategy = name, max_items, "resolver.strategy.start");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(%handle, strategy = name, "resolver.cancelled");
                    return Err(ResolveError::Cancelled);
                }
                res = tokio::time::timeout(limit, strategy.fetch(&handle, max_items)) => {
                    res.unwrap_or(Err(StrategyError::Timeout(limit)))
                }
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(items) if !items.is_empty() => {
                    let items = finalize(items, max_items);
                    tracing::info!(
                        %handle,
                        strategy = name,
                        count = items.len(),
                        elapsed_ms,
                        "resolver.strategy.succeeded"
                    );
                    return Ok(Resolution {
                        handle,
                        items,
                        synthetic: false,
                        source: name.to_string(),
                    });
                }
                Ok(_) => {
                    tracing::warn!(%handle, strategy = name, elapsed_ms, "resolver.strategy.empty");
                }
                Err(err) => {
                    tracing::warn!(
                        %handle,
                        strategy = name,
                        elapsed_ms,
                        error = %err,
                        "resolver.strategy.failed"
                    );
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        tracing::warn!(
            %handle,
            tried = self.strategies.len(),
            max_items,
            "resolver.backstop"
        );
        Ok(Resolution {
            items: self
                .backstop
                .generate(&handle, max_items, OffsetDateTime::now_utc()),
            handle,
            synthetic: true,
            source: SyntheticBackstop::NAME.to_string(),
        })
    }
}

/// Normalize a raw identifier and reject anything that is not a usable handle.
pub fn normalize_identifier(identifier: &str) -> Result<String, ResolveError> {
    if identifier.trim().is_empty() {
        return Err(ResolveError::EmptyIdentifier);
    }
    let handle = normalize_handle(identifier);
    if !is_valid_handle(&handle) {
        return Err(ResolveError::InvalidIdentifier(identifier.to_string()));
    }
    Ok(handle)
}

/// Drop duplicate ids, order newest first, cap at `max_items`.
///
/// Status ids grow over time, so when every id is numeric they decide the order. Scraped
/// items without a parseable date carry the fetch time, which would otherwise float them
/// above newer dated posts.
fn finalize(items: Vec<Item>, max_items: usize) -> Vec<Item> {
    let mut seen = HashSet::new();
    let mut items: Vec<Item> = items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect();
    let status_ids: Option<Vec<u64>> = items.iter().map(|i| i.id.parse().ok()).collect();
    match status_ids {
        Some(ids) => {
            let mut keyed: Vec<(u64, Item)> = ids.into_iter().zip(items).collect();
            keyed.sort_by_key(|(id, _)| std::cmp::Reverse(*id));
            items = keyed.into_iter().map(|(_, item)| item).collect();
        }
        None => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    items.truncate(max_items);
    items
}
