use serde::{Deserialize, Serialize};

/// `GET /2/users/by/username/{username}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLookupResponse {
    #[serde(default)]
    pub data: Option<User>,
    #[serde(default)]
    pub errors: Option<Vec<ApiProblem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Partial-error entries Twitter returns alongside (or instead of) `data`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiProblem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// `GET /2/users/{id}/tweets`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineResponse {
    #[serde(default)]
    pub data: Option<Vec<Tweet>>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Meta {
    #[serde(default)]
    pub result_count: Option<u32>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Twint-style mirror payload: `{ "tweets": [ { "id", "tweet", "date" } ] }`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MirrorResponse {
    #[serde(default)]
    pub tweets: Vec<MirrorTweet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorTweet {
    pub id: MirrorId,
    pub tweet: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// Mirrors disagree on whether ids are JSON strings or numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MirrorId {
    Text(String),
    Number(u64),
}

impl std::fmt::Display for MirrorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MirrorId::Text(s) => f.write_str(s),
            MirrorId::Number(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mirror_ids_accept_strings_and_numbers() {
        let resp: MirrorResponse = serde_json::from_value(json!({
            "tweets": [
                { "id": "1700000000000000001", "tweet": "a", "date": "2023-09-08 10:00:00" },
                { "id": 1700000000000000002u64, "tweet": "b" }
            ]
        }))
        .unwrap();
        assert_eq!(resp.tweets[0].id.to_string(), "1700000000000000001");
        assert_eq!(resp.tweets[1].id.to_string(), "1700000000000000002");
        assert!(resp.tweets[1].date.is_none());
    }

    #[test]
    fn missing_user_lookup_keeps_errors() {
        let resp: UserLookupResponse = serde_json::from_value(json!({
            "errors": [{ "title": "Not Found Error", "detail": "Could not find user with username: [nobody]." }]
        }))
        .unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors.unwrap()[0].title.as_deref(), Some("Not Found Error"));
    }
}
