use crate::item::{Item, profile_url};
use time::{Duration, OffsetDateTime};

pub const DEFAULT_TOPICS: [&str; 6] = [
    "technology",
    "AI",
    "software",
    "crypto",
    "startups",
    "innovation",
];

/// Terminal fallback that fabricates clearly-marked placeholder items.
#[derive(Debug, Clone)]
pub struct SyntheticBackstop {
    topics: Vec<String>,
}

impl Default for SyntheticBackstop {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SyntheticBackstop {
    pub const NAME: &'static str = "synthetic";

    /// An empty topic list falls back to [`DEFAULT_TOPICS`].
    pub fn new(topics: Vec<String>) -> Self {
        let topics = if topics.is_empty() {
            DEFAULT_TOPICS.iter().map(|t| (*t).to_string()).collect()
        } else {
            topics
        };
        Self { topics }
    }

    /// Exactly `count` items, newest first, one minute apart, all flagged synthetic.
    pub fn generate(&self, handle: &str, count: usize, now: OffsetDateTime) -> Vec<Item> {
        let stamp = (now.unix_timestamp_nanos() / 1_000_000) as i64;
        (0..count)
            .map(|i| {
                let topic = &self.topics[i % self.topics.len()];
                Item {
                    id: format!("synthetic-{handle}-{stamp}-{i}"),
                    content: format!(
                        "Placeholder update #{} about {topic} from @{handle}. \
                         Live sources were unavailable for this digest.",
                        i + 1
                    ),
                    created_at: now - Duration::minutes(i as i64),
                    url: profile_url(handle),
                    handle: handle.to_string(),
                    synthetic: true,
                }
            })
            .collect()
    }
}
