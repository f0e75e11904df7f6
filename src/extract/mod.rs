mod pipeline;
mod topic;

pub use pipeline::{ExtractOptions, ExtractSummary, ExtractTarget, extract, fetch_topic_page};
pub use topic::{
    ExtractionRecord, FALLBACK_PAGES, PAGE_SIZE, TopicItem, page_bound, parse_topics, player_url,
};
