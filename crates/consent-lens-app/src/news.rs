//! News-feed read-state bookkeeping.
//!
//! The feed endpoint itself is an external collaborator; this module only
//! decodes its JSON shape, resolves item links against the public base, and
//! keeps the mode-scoped read sets in the store.

use consent_lens_core::Mode;
use consent_lens_store::{KeyValueStore, ReadSet, StoreError};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppError;

/// Public site base used to resolve relative feed links.
pub const NEWS_BASE_URL: &str = "https://gaeinjjeongbo.netlify.app/";

/// Feed JSON for the free tier.
pub const NEWS_JSON_URL_FREE: &str = "https://gaeinjjeongbo.netlify.app/news-only.json";

/// Feed JSON for the full tier.
pub const NEWS_JSON_URL_FULL: &str = "https://gaeinjjeongbo.netlify.app/news-only-full.json";

/// One feed entry; every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsItem {
    /// Stable item id.
    pub id: Option<String>,
    /// Article link, possibly relative to [`NEWS_BASE_URL`].
    pub url: Option<String>,
    /// Headline.
    pub title: Option<String>,
    /// Category chip.
    pub category: Option<String>,
    /// Thumbnail path, possibly relative.
    pub image: Option<String>,
    /// Premium flag.
    pub premium: bool,
    /// Badge chips; `PRO` also marks premium.
    pub badges: Vec<String>,
    /// Featured flag on the item itself.
    pub featured: bool,
    /// Raw publish date.
    pub date: Option<String>,
    /// Preformatted display date.
    pub display_date: Option<String>,
}

/// Decoded feed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsFeed {
    /// Entries in feed order.
    pub items: Vec<NewsItem>,
    /// Id of the feed-level featured entry.
    pub featured_id: Option<String>,
}

/// Returns the feed JSON URL for `mode`.
pub fn feed_json_url(mode: Mode) -> &'static str {
    match mode {
        Mode::Free => NEWS_JSON_URL_FREE,
        Mode::Full => NEWS_JSON_URL_FULL,
    }
}

/// Decodes one feed document.
///
/// # Errors
/// Returns [`AppError::Feed`] for invalid JSON.
pub fn parse_feed(raw: &str) -> Result<NewsFeed, AppError> {
    serde_json::from_str(raw).map_err(AppError::Feed)
}

/// Identity used for read-state tracking: `id`, else `url`, else `title`.
pub fn item_identity(item: &NewsItem) -> Option<&str> {
    [&item.id, &item.url, &item.title]
        .into_iter()
        .find_map(|field| field.as_deref())
        .filter(|identity| !identity.trim().is_empty())
}

/// Returns `true` for premium entries (`premium` flag or a `PRO` badge).
pub fn is_premium(item: &NewsItem) -> bool {
    item.premium || item.badges.iter().any(|badge| badge == "PRO")
}

/// Returns `true` when `item` is featured directly or by the feed.
pub fn is_featured(feed: &NewsFeed, item: &NewsItem) -> bool {
    if item.featured {
        return true;
    }
    match (&feed.featured_id, &item.id) {
        (Some(featured), Some(id)) => featured == id,
        _ => false,
    }
}

/// Counts unseen entries for the badge.
///
/// Only entries with an explicit `id` count, matching the shipped badge
/// logic; identity fallbacks apply to read-marking, not to the count.
pub fn unread_count(feed: &NewsFeed, read: &ReadSet) -> usize {
    feed.items
        .iter()
        .filter(|item| match item.id.as_deref() {
            Some(id) if !id.trim().is_empty() => !read.contains(id),
            _ => false,
        })
        .count()
}

/// Resolves a possibly-relative feed link against the public base.
///
/// Unresolvable inputs pass through unchanged; an empty path resolves to
/// the base itself.
pub fn resolve_news_url(path: &str) -> String {
    match Url::parse(NEWS_BASE_URL).and_then(|base| base.join(path)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => path.to_string(),
    }
}

/// Marks one item read and returns the resolved URL to open.
///
/// Items without any identity still open but are never tracked.
///
/// # Errors
/// Returns [`StoreError`] when the read set cannot be persisted.
pub fn open_item(
    store: &dyn KeyValueStore,
    mode: Mode,
    item: &NewsItem,
) -> Result<Option<String>, StoreError> {
    let target = item.url.as_deref().map(resolve_news_url);

    if let Some(identity) = item_identity(item) {
        let mut read = ReadSet::load(store, mode)?;
        read.mark_read(identity);
        read.save(store, mode)?;
    }

    Ok(target)
}
