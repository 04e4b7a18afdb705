//! Error types for the verification harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("No calculator artifact matching {prefix}*{suffix} found in {dir}")]
    ArtifactNotFound {
        dir: String,
        prefix: String,
        suffix: String,
    },

    #[error("Node.js not found. Install Node and run: npx playwright install chromium")]
    NodeNotFound,

    #[error("Document failed to load: {0}")]
    Load(String),

    #[error("Timeout after {ms}ms waiting for: {what}")]
    Timeout { what: String, ms: u64 },

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Could not parse output of {field} as a number: {text:?}")]
    Parse { field: String, text: String },

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Failed to write report: {0}")]
    ReportWrite(String),

    #[error("Scenario spec error: {0}")]
    SpecParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type VerifyResult<T> = Result<T, VerifyError>;
