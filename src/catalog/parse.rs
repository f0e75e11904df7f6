use serde_json::Value;

use crate::shape::{BATCH_SHAPES, SUBJECT_SHAPES, first_count, first_string, match_list};

/// An enrolled course batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub id: String,
    pub name: String,
}

/// A subject inside a batch, with its declared number of topic items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub item_count: u64,
}

/// Turn a batch listing response into batches, in listed order
pub fn parse_batches(data: &Value) -> Vec<Batch> {
    match_list(data, BATCH_SHAPES)
        .map(|items| items.iter().map(parse_batch).collect())
        .unwrap_or_default()
}

/// Turn a batch details response into its subjects, in listed order
pub fn parse_subjects(data: &Value) -> Vec<Subject> {
    match_list(data, SUBJECT_SHAPES)
        .map(|items| items.iter().map(parse_subject).collect())
        .unwrap_or_default()
}

fn parse_batch(item: &Value) -> Batch {
    Batch {
        id: first_string(item, &["_id", "batchId", "id"]).unwrap_or_default(),
        name: first_string(item, &["name", "title"])
            .unwrap_or_else(|| "Unnamed Batch".to_string()),
    }
}

fn parse_subject(item: &Value) -> Subject {
    Subject {
        id: first_string(item, &["subjectId", "_id", "id"]).unwrap_or_default(),
        name: first_string(item, &["subject", "name"]).unwrap_or_else(|| "Unnamed".to_string()),
        item_count: first_count(item, &["tagCount", "count"]).unwrap_or(0),
    }
}
