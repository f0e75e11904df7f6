use std::sync::Arc;

/// Events emitted during a session for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Batch listing is being fetched
    FetchingBatches,

    /// Subjects of the selected batch are being fetched
    FetchingSubjects { batch_name: String },

    /// Extraction of one subject is starting
    SubjectStarted {
        subject_id: String,
        subject_name: String,
        /// Index of this subject in the selection
        subject_index: usize,
        /// Total number of selected subjects
        total_subjects: usize,
        /// Highest page that will be requested
        page_bound: u64,
    },

    /// A page of topics was fetched
    PageFetched {
        subject_id: String,
        page: u64,
        items: usize,
    },

    /// Pagination of a subject stopped early because a page failed
    SubjectFailed {
        subject_id: String,
        page: u64,
        error: String,
    },

    /// A subject has been fully processed
    SubjectCompleted { subject_id: String, records: usize },

    /// All selected subjects have been processed
    ExtractionCompleted {
        subjects: usize,
        records: usize,
        failed_subjects: usize,
    },
}

/// Trait for reporting progress events during a session.
///
/// Implementations can use this to display spinners, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
