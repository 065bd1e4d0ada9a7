use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One normalized tweet, real or synthetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Upstream status id; the persistence key.
    pub id: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub url: String,
    /// Normalized handle that owns the item.
    pub handle: String,
    /// Placeholder content produced by the synthetic backstop.
    #[serde(default)]
    pub synthetic: bool,
}

impl Item {
    /// Build a real item with the canonical status URL.
    pub fn tweet(handle: &str, id: String, content: String, created_at: OffsetDateTime) -> Self {
        let url = status_url(handle, &id);
        Self {
            id,
            content,
            created_at,
            url,
            handle: handle.to_string(),
            synthetic: false,
        }
    }
}

pub fn status_url(handle: &str, id: &str) -> String {
    format!("https://twitter.com/{handle}/status/{id}")
}

pub fn profile_url(handle: &str) -> String {
    format!("https://twitter.com/{handle}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn serializes_timestamp_as_rfc3339() {
        let item = Item::tweet(
            "jack",
            "20".into(),
            "just setting up my twttr".into(),
            datetime!(2006-03-21 20:50:00 UTC),
        );
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["created_at"], "2006-03-21T20:50:00Z");
        assert_eq!(v["url"], "https://twitter.com/jack/status/20");
        assert_eq!(v["synthetic"], false);
    }
}
