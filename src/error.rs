use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by a single upstream API call
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid JSON response from server (status {status})")]
    Decode { status: u16 },

    #[error("{0}")]
    Logical(String),
}

/// Errors that can occur while acquiring a bearer token
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to generate OTP: {0}")]
    OtpRequest(#[source] ApiError),

    #[error("Token request failed: {0}")]
    TokenRequest(#[source] ApiError),

    #[error("Could not extract token from response")]
    TokenMissing,

    #[error("No token provided")]
    EmptyToken,

    #[error("Failed to encode request: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors that can occur while browsing batches and subjects
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to fetch batches: {0}")]
    Batches(#[source] ApiError),

    #[error("Failed to fetch batch details: {0}")]
    Details(#[source] ApiError),

    #[error("No batches found in account")]
    NoBatchesFound,

    #[error("No subjects found in the selected batch")]
    NoSubjectsFound,

    #[error("Invalid batch index {index} (expected 1 to {available})")]
    InvalidIndex { index: usize, available: usize },

    #[error("No subject IDs provided")]
    NoSubjectIdsProvided,
}

/// Errors that abort an extraction run
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to write to artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the chat transport
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Failed to read reply: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("Conversation closed before a reply was received")]
    Closed,

    #[error("Failed to deliver {path}: {source}")]
    Delivery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level errors for an interactive session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Error while extracting: {0}")]
    Extract(#[from] ExtractError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Failed to create artifact in {path}: {source}")]
    ArtifactCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove artifact {path}: {source}")]
    ArtifactRemove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
