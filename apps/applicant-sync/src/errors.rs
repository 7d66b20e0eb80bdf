use thiserror::Error;

use crate::llm_client::LlmError;
use crate::table_client::StoreError;

/// Error type shared by the batch jobs.
///
/// Per-record errors are logged by the job loop and never abort a batch; only a
/// failure to read the source tables is returned to `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Table store error: {0}")]
    Store(#[from] StoreError),

    #[error("Completion service error: {0}")]
    Llm(#[from] LlmError),

    #[error("Invalid JSON for applicant {applicant_id}: {source}")]
    MalformedDocument {
        applicant_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}
