use super::{DEFAULT_STRATEGY_TIMEOUT, Strategy, StrategyError};
use crate::item::Item;
use crate::twitter::{TwitterApi, extract};
use async_trait::async_trait;
use std::time::Duration;
use time::OffsetDateTime;

/// Structured source: Twitter API v2 user timeline.
pub struct TwitterApiStrategy {
    name: String,
    api: Option<TwitterApi>,
    timeout: Duration,
}

impl TwitterApiStrategy {
    pub fn new(name: impl Into<String>, api: TwitterApi) -> Self {
        Self {
            name: name.into(),
            api: Some(api),
            timeout: DEFAULT_STRATEGY_TIMEOUT,
        }
    }

    /// A configured slot with no bearer token; every fetch fails with a config error.
    pub fn without_credentials(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api: None,
            timeout: DEFAULT_STRATEGY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Strategy for TwitterApiStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, handle: &str, max_items: usize) -> Result<Vec<Item>, StrategyError> {
        let api = self
            .api
            .as_ref()
            .ok_or_else(|| StrategyError::Config("missing twitter bearer token".into()))?;
        let user = api
            .user_by_username(handle)
            .await?
            .ok_or_else(|| StrategyError::NotFound(format!("no twitter user @{handle}")))?;

        let resp = api.user_tweets(&user.id, max_items).await?;
        let mut items = extract::items_from_timeline(
            handle,
            resp.data.unwrap_or_default(),
            OffsetDateTime::now_utc(),
        );
        items.truncate(max_items);
        Ok(items)
    }
}
