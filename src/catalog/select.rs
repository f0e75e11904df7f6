use crate::error::CatalogError;

use super::parse::{Batch, Subject};

const UNKNOWN_BATCH_NAME: &str = "Batch";

/// Resolve the user's batch choice.
///
/// An all-digit reply is a 1-based index into `batches` as listed. Anything
/// else is taken as a batch id; an id missing from the list still selects,
/// with a placeholder name.
pub fn select_batch(batches: &[Batch], input: &str) -> Result<Batch, CatalogError> {
    let input = input.trim();

    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        let out_of_range = || CatalogError::InvalidIndex {
            index: input.parse().unwrap_or(usize::MAX),
            available: batches.len(),
        };
        let index: usize = input.parse().map_err(|_| out_of_range())?;
        return index
            .checked_sub(1)
            .and_then(|i| batches.get(i))
            .cloned()
            .ok_or_else(out_of_range);
    }

    let name = batches
        .iter()
        .find(|b| b.id == input)
        .map(|b| b.name.clone())
        .unwrap_or_else(|| UNKNOWN_BATCH_NAME.to_string());

    Ok(Batch {
        id: input.to_string(),
        name,
    })
}

/// Ids of every listed subject, used as the "download everything" choice
pub fn default_subject_ids(subjects: &[Subject]) -> Vec<String> {
    subjects
        .iter()
        .filter(|s| !s.id.is_empty())
        .map(|s| s.id.clone())
        .collect()
}

/// Split a reply like `s1&s2&s3` into subject ids, keeping order and duplicates
pub fn parse_subject_selection(input: &str) -> Result<Vec<String>, CatalogError> {
    let ids: Vec<String> = input
        .split('&')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if ids.is_empty() {
        return Err(CatalogError::NoSubjectIdsProvided);
    }
    Ok(ids)
}
