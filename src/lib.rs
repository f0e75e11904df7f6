pub mod artifact;
pub mod auth;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod progress;
pub mod session;
pub mod shape;

// Re-export main types for convenience
pub use artifact::{Artifact, ArtifactHeader, TextSink};
pub use auth::{AuthContext, Token, exchange_token, request_otp};
pub use catalog::{Batch, Subject, list_batches, list_subjects, select_batch};
pub use chat::ChatSession;
pub use config::ApiConfig;
pub use error::{ApiError, AuthError, CatalogError, ChatError, ExtractError, SessionError};
pub use extract::{ExtractOptions, ExtractSummary, ExtractionRecord, TopicItem, extract};
pub use http::{ApiRequest, HttpClient, HttpResponse, Method, ReqwestClient, request_json};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use session::{LoginMethod, SessionOptions, SessionSummary, run_session};
