//! Convert upstream payloads (API JSON, mirror JSON, Nitter HTML) into [`Item`]s.
use crate::item::Item;
use crate::strategy::StrategyError;
use crate::twitter::types::{MirrorResponse, Tweet};
use scraper::{ElementRef, Html, Selector};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Parse the timestamp shapes seen across sources; all naive times are UTC.
///
/// Accepts RFC 3339 (`2024-01-05T15:04:00.000Z`), `2024-01-05 15:04:00` and Nitter's
/// `Jan 5, 2024 · 3:04 PM UTC`.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    let sql = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    if let Ok(ts) = PrimitiveDateTime::parse(raw, sql) {
        return Some(ts.assume_utc());
    }
    let nitter = format_description!(
        "[month repr:short] [day padding:none], [year] [hour repr:12 padding:none]:[minute] [period] UTC"
    );
    let flattened = raw
        .replace('\u{b7}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    PrimitiveDateTime::parse(&flattened, nitter)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

fn timestamp_or(raw: Option<&str>, fallback: OffsetDateTime) -> OffsetDateTime {
    match raw.and_then(parse_timestamp) {
        Some(ts) => ts,
        None => {
            tracing::debug!(raw = ?raw, "extract.timestamp.fallback");
            fallback
        }
    }
}

/// Map v2 timeline tweets; missing timestamps become `fetched_at`.
pub fn items_from_timeline(handle: &str, tweets: Vec<Tweet>, fetched_at: OffsetDateTime) -> Vec<Item> {
    tweets
        .into_iter()
        .map(|tw| {
            let created_at = timestamp_or(tw.created_at.as_deref(), fetched_at);
            Item::tweet(handle, tw.id, tw.text, created_at)
        })
        .collect()
}

pub fn items_from_mirror(handle: &str, resp: MirrorResponse, fetched_at: OffsetDateTime) -> Vec<Item> {
    resp.tweets
        .into_iter()
        .filter(|tw| !tw.tweet.trim().is_empty())
        .map(|tw| {
            let created_at = timestamp_or(tw.date.as_deref(), fetched_at);
            Item::tweet(handle, tw.id.to_string(), tw.tweet, created_at)
        })
        .collect()
}

fn selector(css: &str) -> Result<Selector, StrategyError> {
    Selector::parse(css).map_err(|e| StrategyError::Malformed(format!("selector {css}: {e:?}")))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Status id from a Nitter link such as `/jack/status/20#m`.
fn status_id(href: &str) -> Option<String> {
    let tail = href.split("/status/").nth(1)?;
    let id: String = tail.chars().take_while(char::is_ascii_digit).collect();
    (!id.is_empty()).then_some(id)
}

/// Extract timeline tweets from a Nitter profile page.
///
/// Pinned tweets and retweets are skipped so the result matches the API strategy's
/// "recent original tweets" view. Items that lack an id or text are dropped.
pub fn items_from_nitter_html(
    handle: &str,
    html: &str,
    fetched_at: OffsetDateTime,
) -> Result<Vec<Item>, StrategyError> {
    let document = Html::parse_document(html);
    let timeline_item = selector(".timeline-item")?;
    let link = selector("a.tweet-link")?;
    let content = selector(".tweet-content")?;
    let date = selector(".tweet-date a")?;
    let pinned = selector(".pinned")?;
    let retweet = selector(".retweet-header")?;

    let mut items = Vec::new();
    for node in document.select(&timeline_item) {
        if node.select(&pinned).next().is_some() || node.select(&retweet).next().is_some() {
            continue;
        }
        let Some(id) = node
            .select(&link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(status_id)
        else {
            continue;
        };
        let Some(text) = node.select(&content).next().map(text_of) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        let created_at = timestamp_or(
            node.select(&date).next().and_then(|a| a.value().attr("title")),
            fetched_at,
        );
        items.push(Item::tweet(handle, id, text, created_at));
    }

    tracing::debug!(handle, count = items.len(), "extract.nitter");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::types::{MirrorId, MirrorTweet};
    use time::macros::datetime;

    const FETCHED: OffsetDateTime = datetime!(2024-06-01 12:00:00 UTC);

    #[test]
    fn parses_known_timestamp_shapes() {
        assert_eq!(
            parse_timestamp("2024-01-05T15:04:00.000Z"),
            Some(datetime!(2024-01-05 15:04:00 UTC))
        );
        assert_eq!(
            parse_timestamp("2024-01-05 15:04:00"),
            Some(datetime!(2024-01-05 15:04:00 UTC))
        );
        assert_eq!(
            parse_timestamp("Jan 5, 2024 \u{b7} 3:04 PM UTC"),
            Some(datetime!(2024-01-05 15:04:00 UTC))
        );
        assert_eq!(
            parse_timestamp("Mar 21, 2006 \u{b7} 8:50 PM UTC"),
            Some(datetime!(2006-03-21 20:50:00 UTC))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn mirror_items_fall_back_to_fetch_time() {
        let resp = MirrorResponse {
            tweets: vec![
                MirrorTweet {
                    id: MirrorId::Number(7),
                    tweet: "hello".into(),
                    date: Some("not a date".into()),
                },
                MirrorTweet {
                    id: MirrorId::Text("8".into()),
                    tweet: "   ".into(),
                    date: None,
                },
            ],
        };
        let items = items_from_mirror("jack", resp, FETCHED);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "7");
        assert_eq!(items[0].created_at, FETCHED);
        assert_eq!(items[0].url, "https://twitter.com/jack/status/7");
    }

    const NITTER_PAGE: &str = r##"
<html><body><div class="timeline">
  <div class="timeline-item" data-username="jack">
    <a class="tweet-link" href="/jack/status/100#m"></a>
    <div class="tweet-body">
      <div class="pinned"><span>Pinned Tweet</span></div>
      <div class="tweet-content media-body">old pinned news</div>
    </div>
  </div>
  <div class="timeline-item" data-username="jack">
    <a class="tweet-link" href="/jack/status/300#m"></a>
    <div class="tweet-body">
      <span class="tweet-date"><a href="/jack/status/300#m" title="Jan 5, 2024 · 3:04 PM UTC">Jan 5</a></span>
      <div class="tweet-content media-body">shipping  the
        new thing</div>
    </div>
  </div>
  <div class="timeline-item" data-username="someone">
    <a class="tweet-link" href="/someone/status/250#m"></a>
    <div class="tweet-body">
      <div class="retweet-header">jack retweeted</div>
      <div class="tweet-content media-body">not jack's words</div>
    </div>
  </div>
  <div class="timeline-item" data-username="jack">
    <a class="tweet-link" href="/jack/status/200#m"></a>
    <div class="tweet-body">
      <div class="tweet-content media-body">no date here</div>
    </div>
  </div>
  <div class="show-more"><a href="?cursor=abc">Load more</a></div>
</div></body></html>
"##;

    #[test]
    fn nitter_page_skips_pinned_and_retweets() {
        let items = items_from_nitter_html("jack", NITTER_PAGE, FETCHED).unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["300", "200"]);
        assert_eq!(items[0].content, "shipping the new thing");
        assert_eq!(items[0].created_at, datetime!(2024-01-05 15:04:00 UTC));
        assert_eq!(items[1].created_at, FETCHED);
        assert!(items.iter().all(|i| !i.synthetic && i.handle == "jack"));
    }

    #[test]
    fn inline_markup_does_not_add_spaces() {
        let html = r#"<div class="timeline-item"><a class="tweet-link" href="/jack/status/9#m"></a>
  <div class="tweet-content">see <a href="/x">this link</a>. and <b>bold</b>,
    ok</div></div>"#;
        let items = items_from_nitter_html("jack", html, FETCHED).unwrap();
        assert_eq!(items[0].content, "see this link. and bold, ok");
    }

    #[test]
    fn nitter_error_page_yields_no_items() {
        let html = r#"<html><body><div class="error-panel"><span>User "nobody" not found</span></div></body></html>"#;
        assert!(items_from_nitter_html("nobody", html, FETCHED).unwrap().is_empty());
    }
}
