// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::artifact::TextSink;
use crate::auth::AuthContext;
use crate::catalog::Subject;
use crate::config::ApiConfig;
use crate::error::{ApiError, ExtractError};
use crate::http::{ApiRequest, HttpClient, request_json};
use crate::progress::{ProgressEvent, SharedProgressReporter};

use super::topic::{ExtractionRecord, TopicItem, page_bound, parse_topics};

/// Options for an extraction run
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Drop items that carry no recognised URL field instead of writing
    /// them with empty links
    pub skip_items_without_url: bool,
}

/// Result of an extraction run
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    /// Number of subjects processed, duplicates included
    pub subjects: usize,
    /// Number of record lines written
    pub records: usize,
    /// Subjects whose pagination stopped on an error (subject id, error message)
    pub failed_subjects: Vec<(String, String)>,
}

/// The batch being exported and the subjects it was listed with
pub struct ExtractTarget<'a> {
    pub batch_id: &'a str,
    pub subjects: &'a [Subject],
    pub selected_ids: &'a [String],
}

/// Export every selected subject of a batch into `sink`.
///
/// Subjects are processed in the order given. A failed page ends that
/// subject only; an empty page is the normal end of a subject. Only sink
/// write failures abort the run.
pub async fn extract<C, S>(
    client: &C,
    config: &ApiConfig,
    auth: &AuthContext,
    target: &ExtractTarget<'_>,
    sink: &mut S,
    options: &ExtractOptions,
    reporter: &SharedProgressReporter,
) -> Result<ExtractSummary, ExtractError>
where
    C: HttpClient + ?Sized,
    S: TextSink + ?Sized,
{
    let mut summary = ExtractSummary::default();
    let total_subjects = target.selected_ids.len();

    for (subject_index, subject_id) in target.selected_ids.iter().enumerate() {
        let subject = target.subjects.iter().find(|s| &s.id == subject_id);
        let subject_name = subject.map_or(subject_id.as_str(), |s| s.name.as_str());
        let bound = page_bound(subject.map_or(0, |s| s.item_count));

        reporter.report(ProgressEvent::SubjectStarted {
            subject_id: subject_id.clone(),
            subject_name: subject_name.to_string(),
            subject_index,
            total_subjects,
            page_bound: bound,
        });

        sink.append_line(&format!("===== {subject_name} ({subject_id}) ====="))?;

        let mut records = 0;
        for page in 1..=bound {
            let items =
                match fetch_topic_page(client, config, auth, target.batch_id, subject_id, page)
                    .await
                {
                    Ok(items) => items,
                    Err(e) => {
                        tracing::warn!(
                            subject_id = %subject_id,
                            page,
                            error = %e,
                            "topic page failed, skipping rest of subject"
                        );
                        reporter.report(ProgressEvent::SubjectFailed {
                            subject_id: subject_id.clone(),
                            page,
                            error: e.to_string(),
                        });
                        summary
                            .failed_subjects
                            .push((subject_id.clone(), e.to_string()));
                        break;
                    }
                };

            reporter.report(ProgressEvent::PageFetched {
                subject_id: subject_id.clone(),
                page,
                items: items.len(),
            });

            if items.is_empty() {
                tracing::debug!(subject_id = %subject_id, page, "empty topic page, subject done");
                break;
            }

            for item in items {
                if options.skip_items_without_url && item.source_url.is_empty() {
                    continue;
                }
                let record = ExtractionRecord::new(item, &config.player_template, auth.token());
                sink.append_line(&record.to_line())?;
                records += 1;
            }
        }

        sink.append_line("")?;
        summary.subjects += 1;
        summary.records += records;

        reporter.report(ProgressEvent::SubjectCompleted {
            subject_id: subject_id.clone(),
            records,
        });
    }

    reporter.report(ProgressEvent::ExtractionCompleted {
        subjects: summary.subjects,
        records: summary.records,
        failed_subjects: summary.failed_subjects.len(),
    });

    Ok(summary)
}

/// Fetch one page of a subject's topics
pub async fn fetch_topic_page<C: HttpClient + ?Sized>(
    client: &C,
    config: &ApiConfig,
    auth: &AuthContext,
    batch_id: &str,
    subject_id: &str,
    page: u64,
) -> Result<Vec<TopicItem>, ApiError> {
    let request = ApiRequest::get(config.v3(&format!(
        "batches/{batch_id}/subject/{subject_id}/topics"
    )))
    .query([("page", page.to_string())])
    .headers(auth.headers())
    .timeout(config.timeout);

    let data = request_json(client, &request).await?;
    Ok(parse_topics(&data))
}
