use super::{DEFAULT_STRATEGY_TIMEOUT, Strategy, StrategyError};
use crate::item::Item;
use crate::twitter::extract;
use async_trait::async_trait;
use bytesize_http::{HttpClient, RequestOpts};
use std::time::Duration;
use time::OffsetDateTime;

/// HTML scrape of one Nitter instance's profile page.
pub struct NitterStrategy {
    name: String,
    http: HttpClient,
    timeout: Duration,
}

impl NitterStrategy {
    pub fn new(name: impl Into<String>, http: HttpClient) -> Self {
        Self {
            name: name.into(),
            http,
            timeout: DEFAULT_STRATEGY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Strategy for NitterStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, handle: &str, max_items: usize) -> Result<Vec<Item>, StrategyError> {
        let html = self.http.get_text(handle, RequestOpts::default()).await?;
        let mut items = extract::items_from_nitter_html(handle, &html, OffsetDateTime::now_utc())?;
        items.truncate(max_items);
        Ok(items)
    }
}
