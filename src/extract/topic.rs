use serde_json::Value;
use url::form_urlencoded;

use crate::auth::Token;
use crate::shape::{TOPIC_SHAPES, first_string, match_list};

/// Page size of the topics endpoint
pub const PAGE_SIZE: u64 = 20;

/// Pages tried when a subject does not declare its item count
pub const FALLBACK_PAGES: u64 = 10;

const UNTITLED: &str = "Untitled";

/// One content entry as listed by the topics endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicItem {
    pub title: String,
    /// Empty when the item has no recognised URL field
    pub source_url: String,
}

/// A topic item paired with its derived player link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRecord {
    pub title: String,
    pub source_url: String,
    /// Empty exactly when `source_url` is empty
    pub player_url: String,
}

impl ExtractionRecord {
    pub fn new(item: TopicItem, player_template: &str, token: &Token) -> Self {
        let player_url = if item.source_url.is_empty() {
            String::new()
        } else {
            player_url(player_template, &item.source_url, token)
        };

        Self {
            title: item.title,
            source_url: item.source_url,
            player_url,
        }
    }

    /// Render as `Title : sourceUrl | playerUrl`
    pub fn to_line(&self) -> String {
        format!("{} : {} | {}", self.title, self.source_url, self.player_url)
    }
}

/// Number of pages to request for a subject declaring `item_count` items
pub fn page_bound(item_count: u64) -> u64 {
    if item_count > 0 {
        item_count.div_ceil(PAGE_SIZE)
    } else {
        FALLBACK_PAGES
    }
}

/// Fill `{url}` (form-encoded source URL) and `{token}` into the player template
pub fn player_url(template: &str, source_url: &str, token: &Token) -> String {
    let encoded: String = form_urlencoded::byte_serialize(source_url.as_bytes()).collect();
    template
        .replace("{url}", &encoded)
        .replace("{token}", token.as_str())
}

/// Items on one page of the topics listing; unknown layouts read as empty
pub fn parse_topics(data: &Value) -> Vec<TopicItem> {
    match_list(data, TOPIC_SHAPES)
        .map(|items| items.iter().map(parse_topic).collect())
        .unwrap_or_default()
}

fn parse_topic(item: &Value) -> TopicItem {
    TopicItem {
        title: first_string(item, &["topic", "title", "name"])
            .unwrap_or_else(|| UNTITLED.to_string()),
        source_url: first_string(item, &["url", "resourceUrl", "attachmentUrl"])
            .unwrap_or_default(),
    }
}
