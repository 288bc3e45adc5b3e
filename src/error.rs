//! Error types for siteweave

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid upload: {0}")]
    Validation(String),

    #[error("No upload result matches tree path: {0}")]
    Match(String),

    #[error("Record too large to split: {path} is {size} bytes serialized (limit {limit})")]
    SizeLimit {
        path: String,
        size: usize,
        limit: usize,
    },

    #[error("Directory {path} has {count} entries (limit {limit})")]
    EntryLimit {
        path: String,
        count: usize,
        limit: usize,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid record URI: {0}")]
    InvalidUri(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
