//! Newsletter digest: resolve, persist, summarize, email.
//!
//! The store, summarizer and notifier are external services; they are reached through the
//! traits below so the pipeline can be driven by in-memory fakes.
use crate::item::Item;
use crate::resolver::Resolver;
use async_trait::async_trait;
use bytesize_common::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;

/// Persistence for acquired items. `upsert` must be idempotent per `Item::id`.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn upsert(&self, item: &Item) -> Result<()>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, items: &[Item], handle: &str) -> Result<String>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html: &str) -> Result<DeliveryReceipt>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    pub id: String,
}

#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: Mutex<BTreeMap<String, Item>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<Item> {
        self.items.lock().await.get(id).cloned()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn upsert(&self, item: &Item) -> Result<()> {
        self.items
            .lock()
            .await
            .insert(item.id.clone(), item.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub html: String,
}

/// Build the digest email for `handle` dated `date`.
pub fn compose_email(handle: &str, summary: &str, synthetic: bool, date: Date) -> Email {
    let date = format!(
        "{}, {} {}, {}",
        date.weekday(),
        date.month(),
        date.day(),
        date.year()
    );
    let mut subject = format!("ByteSize Newsletter: {handle} Updates - {date}");
    if synthetic {
        subject.insert_str(0, "[PLACEHOLDER] ");
    }

    let handle = escape_html(handle);
    let mut html = String::new();
    html.push_str("<div style=\"font-family: sans-serif; max-width: 640px;\">\n");
    html.push_str(&format!("<h1>@{handle} Updates</h1>\n<p>{date}</p>\n"));
    if synthetic {
        html.push_str(
            "<p style=\"background: #fff3cd; padding: 8px;\"><strong>Warning:</strong> \
             live sources were unavailable, so this digest contains placeholder content \
             rather than real posts.</p>\n",
        );
    }
    html.push_str(&format!(
        "<div>{}</div>\n",
        escape_html(summary).replace('\n', "<br>")
    ));
    html.push_str("</div>\n");

    Email { subject, html }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestReport {
    pub handle: String,
    pub items_stored: usize,
    pub synthetic: bool,
    pub receipt: DeliveryReceipt,
}

pub struct DigestPipeline {
    resolver: Arc<Resolver>,
    store: Arc<dyn ItemStore>,
    summarizer: Arc<dyn Summarizer>,
    notifier: Arc<dyn Notifier>,
    max_items: Option<usize>,
}

impl DigestPipeline {
    pub fn new(
        resolver: Arc<Resolver>,
        store: Arc<dyn ItemStore>,
        summarizer: Arc<dyn Summarizer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resolver,
            store,
            summarizer,
            notifier,
            max_items: None,
        }
    }

    pub fn with_max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    pub async fn run(&self, recipient: &str, identifier: &str) -> Result<DigestReport> {
        let resolution = self.resolver.resolve(identifier, self.max_items).await?;
        let handle = resolution.handle;

        for item in &resolution.items {
            self.store.upsert(item).await?;
        }
        tracing::info!(
            %handle,
            stored = resolution.items.len(),
            synthetic = resolution.synthetic,
            source = %resolution.source,
            "digest.persisted"
        );

        let summary = self
            .summarizer
            .summarize(&resolution.items, &handle)
            .await
            .inspect_err(|e| tracing::error!(%handle, error = %e, "digest.summarize.failed"))?;

        let email = compose_email(
            &handle,
            &summary,
            resolution.synthetic,
            OffsetDateTime::now_utc().date(),
        );
        let receipt = self
            .notifier
            .send(recipient, &email.subject, &email.html)
            .await?;
        tracing::info!(%handle, receipt = %receipt.id, "digest.sent");

        Ok(DigestReport {
            handle,
            items_stored: resolution.items.len(),
            synthetic: resolution.synthetic,
            receipt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytesize_common::BytesizeError;
    use crate::strategy::{Strategy, StrategyError};
    use std::sync::Mutex as StdMutex;
    use time::macros::date;

    struct Fixed(usize);

    #[async_trait]
    impl Strategy for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch(&self, handle: &str, _max: usize) -> std::result::Result<Vec<Item>, StrategyError> {
            Ok((0..self.0)
                .map(|i| {
                    Item::tweet(
                        handle,
                        i.to_string(),
                        format!("post {i}"),
                        OffsetDateTime::UNIX_EPOCH,
                    )
                })
                .collect())
        }
    }

    struct EchoSummarizer;

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        async fn summarize(&self, items: &[Item], handle: &str) -> Result<String> {
            Ok(format!("{} posts from {handle}\n<b>bold</b>", items.len()))
        }
    }

    struct BrokenSummarizer;

    #[async_trait]
    impl Summarizer for BrokenSummarizer {
        async fn summarize(&self, _items: &[Item], _handle: &str) -> Result<String> {
            Err(BytesizeError::Collaborator("model unavailable".into()))
        }
    }

    #[derive(Default)]
    struct Outbox(StdMutex<Vec<(String, String, String)>>);

    #[async_trait]
    impl Notifier for Outbox {
        async fn send(&self, recipient: &str, subject: &str, html: &str) -> Result<DeliveryReceipt> {
            let mut sent = self.0.lock().unwrap();
            sent.push((recipient.into(), subject.into(), html.into()));
            Ok(DeliveryReceipt {
                id: format!("msg-{}", sent.len()),
            })
        }
    }

    fn pipeline(
        strategies: Vec<Arc<dyn Strategy>>,
        store: Arc<InMemoryItemStore>,
        summarizer: Arc<dyn Summarizer>,
        outbox: Arc<Outbox>,
    ) -> DigestPipeline {
        DigestPipeline::new(Arc::new(Resolver::new(strategies)), store, summarizer, outbox)
    }

    #[tokio::test]
    async fn stores_summarizes_and_sends() {
        let store = Arc::new(InMemoryItemStore::new());
        let outbox = Arc::new(Outbox::default());
        let report = pipeline(
            vec![Arc::new(Fixed(3))],
            store.clone(),
            Arc::new(EchoSummarizer),
            outbox.clone(),
        )
        .run("reader@example.com", "@jack")
        .await
        .unwrap();

        assert_eq!(report.handle, "jack");
        assert_eq!(report.items_stored, 3);
        assert!(!report.synthetic);
        assert_eq!(report.receipt.id, "msg-1");
        assert_eq!(store.len().await, 3);

        let sent = outbox.0.lock().unwrap();
        assert_eq!(sent[0].0, "reader@example.com");
        assert!(sent[0].1.starts_with("ByteSize Newsletter: jack Updates - "));
        assert!(sent[0].2.contains("3 posts from jack<br>&lt;b&gt;bold&lt;/b&gt;"));
    }

    #[tokio::test]
    async fn upsert_is_idempotent_across_runs() {
        let store = Arc::new(InMemoryItemStore::new());
        let p = pipeline(
            vec![Arc::new(Fixed(2))],
            store.clone(),
            Arc::new(EchoSummarizer),
            Arc::new(Outbox::default()),
        );
        p.run("a@example.com", "jack").await.unwrap();
        p.run("a@example.com", "jack").await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn synthetic_digest_is_flagged_in_subject_and_body() {
        let outbox = Arc::new(Outbox::default());
        let report = pipeline(
            Vec::new(),
            Arc::new(InMemoryItemStore::new()),
            Arc::new(EchoSummarizer),
            outbox.clone(),
        )
        .run("a@example.com", "jack")
        .await
        .unwrap();

        assert!(report.synthetic);
        let sent = outbox.0.lock().unwrap();
        assert!(sent[0].1.starts_with("[PLACEHOLDER] ByteSize Newsletter"));
        assert!(sent[0].2.contains("placeholder content"));
    }

    #[tokio::test]
    async fn summarizer_failure_is_reported_after_items_are_stored() {
        let store = Arc::new(InMemoryItemStore::new());
        let outbox = Arc::new(Outbox::default());
        let err = pipeline(
            vec![Arc::new(Fixed(2))],
            store.clone(),
            Arc::new(BrokenSummarizer),
            outbox.clone(),
        )
        .run("a@example.com", "jack")
        .await
        .unwrap_err();

        assert!(matches!(err, BytesizeError::Collaborator(_)));
        assert_eq!(store.len().await, 2);
        assert!(outbox.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn input_errors_propagate_without_side_effects() {
        let store = Arc::new(InMemoryItemStore::new());
        let err = pipeline(
            vec![Arc::new(Fixed(2))],
            store.clone(),
            Arc::new(EchoSummarizer),
            Arc::new(Outbox::default()),
        )
        .run("a@example.com", "  ")
        .await
        .unwrap_err();

        assert!(err.is_input());
        assert!(store.is_empty().await);
    }

    #[test]
    fn subject_uses_long_date() {
        let email = compose_email("jack", "hi", false, date!(2024 - 03 - 04));
        assert_eq!(
            email.subject,
            "ByteSize Newsletter: jack Updates - Monday, March 4, 2024"
        );
        assert!(!email.html.contains("Warning"));
    }
}
