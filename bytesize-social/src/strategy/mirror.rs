use super::{DEFAULT_STRATEGY_TIMEOUT, Strategy, StrategyError};
use crate::item::Item;
use crate::twitter::extract;
use crate::twitter::types::MirrorResponse;
use async_trait::async_trait;
use bytesize_http::{HttpClient, RequestOpts};
use std::time::Duration;
use time::OffsetDateTime;

/// Twint-style JSON mirror: `GET {base}/{path}?username=..&limit=..`.
pub struct MirrorStrategy {
    name: String,
    http: HttpClient,
    path: String,
    timeout: Duration,
}

impl MirrorStrategy {
    pub fn new(name: impl Into<String>, http: HttpClient, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            http,
            path: path.into().trim_start_matches('/').to_string(),
            timeout: DEFAULT_STRATEGY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Strategy for MirrorStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, handle: &str, max_items: usize) -> Result<Vec<Item>, StrategyError> {
        let resp: MirrorResponse = self
            .http
            .get_json(
                &self.path,
                RequestOpts {
                    query: Some(vec![
                        ("username", handle.into()),
                        ("limit", max_items.to_string().into()),
                    ]),
                    ..Default::default()
                },
            )
            .await?;

        let mut items = extract::items_from_mirror(handle, resp, OffsetDateTime::now_utc());
        items.truncate(max_items);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn strategy_for(server: &MockServer) -> MirrorStrategy {
        let http = HttpClient::new(&server.uri()).unwrap().with_retries(0);
        MirrorStrategy::new("twint", http, "/api/twint")
    }

    #[tokio::test]
    async fn maps_mirror_tweets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/twint"))
            .and(query_param("username", "jack"))
            .and(query_param("limit", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tweets": [
                    { "id": 11, "tweet": "newer", "date": "2024-02-02 10:00:00" },
                    { "id": "10", "tweet": "older", "date": "2024-02-01 10:00:00" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items = strategy_for(&server).fetch("jack", 3).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "11");
        assert_eq!(items[1].content, "older");
    }

    #[tokio::test]
    async fn empty_payload_is_an_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/twint"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tweets": [] })))
            .mount(&server)
            .await;

        assert!(strategy_for(&server).fetch("jack", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn html_instead_of_json_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>deployment paused</html>"))
            .mount(&server)
            .await;

        assert!(strategy_for(&server).fetch("jack", 3).await.is_err());
    }
}
