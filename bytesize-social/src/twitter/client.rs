//! Minimal wrapper around the Twitter/X v2 user timeline endpoints.
//!
//! Resolves a username to a user id, then reads the user's recent original tweets
//! (retweets and replies excluded). Retry behaviour comes from the shared HTTP client.
use crate::twitter::types::{TimelineResponse, User, UserLookupResponse};
use bytesize_http::{HttpClient, HttpError, RequestOpts};

pub const DEFAULT_TWITTER_API: &str = "https://api.twitter.com";

/// The timeline endpoint rejects `max_results` outside this window.
const TIMELINE_MIN_RESULTS: usize = 5;
const TIMELINE_MAX_RESULTS: usize = 100;

#[derive(Clone, Debug)]
pub struct TwitterApi {
    http: HttpClient,
    bearer: String,
}

impl TwitterApi {
    pub fn new(bearer_token: String) -> Result<Self, HttpError> {
        Ok(Self::with_http(HttpClient::new(DEFAULT_TWITTER_API)?, bearer_token))
    }

    /// Use a preconfigured client (custom base URL, timeout or retry budget).
    pub fn with_http(http: HttpClient, bearer_token: String) -> Self {
        Self {
            http,
            bearer: bearer_token,
        }
    }

    /// Look up a user by username. `Ok(None)` when Twitter reports no such user.
    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, HttpError> {
        let resp: UserLookupResponse = self
            .http
            .get_json(
                &format!("2/users/by/username/{username}"),
                RequestOpts {
                    bearer: Some(&self.bearer),
                    ..Default::default()
                },
            )
            .await?;

        if resp.data.is_none() {
            tracing::debug!(username, errors = ?resp.errors, "twitter.user_lookup.not_found");
        }
        Ok(resp.data)
    }

    /// Most recent original tweets for `user_id`, newest first.
    pub async fn user_tweets(
        &self,
        user_id: &str,
        max_results: usize,
    ) -> Result<TimelineResponse, HttpError> {
        let max_results = max_results.clamp(TIMELINE_MIN_RESULTS, TIMELINE_MAX_RESULTS);
        let resp: TimelineResponse = self
            .http
            .get_json(
                &format!("2/users/{user_id}/tweets"),
                RequestOpts {
                    bearer: Some(&self.bearer),
                    query: Some(vec![
                        ("max_results", max_results.to_string().into()),
                        ("tweet.fields", "created_at,text".into()),
                        ("exclude", "retweets,replies".into()),
                    ]),
                },
            )
            .await?;

        tracing::debug!(
            user_id,
            result_count = ?resp.meta.as_ref().and_then(|m| m.result_count),
            "twitter.user_tweets"
        );
        Ok(resp)
    }
}
