mod fetch;
mod parse;
mod select;

pub use fetch::{list_batches, list_subjects};
pub use parse::{Batch, Subject, parse_batches, parse_subjects};
pub use select::{default_subject_ids, parse_subject_selection, select_batch};
