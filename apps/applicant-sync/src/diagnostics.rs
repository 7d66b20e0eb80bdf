//! Connectivity smoke test: which credentials are configured, and whether the
//! Applicants table answers.

use tracing::{error, info};

use crate::models::tables;
use crate::table_client::{StoreError, TableStore};

pub const REQUIRED_VARIABLES: [&str; 2] = ["AIRTABLE_API_KEY", "AIRTABLE_BASE_ID"];
pub const OPTIONAL_VARIABLES: [&str; 1] = ["GEMINI_API_KEY"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStatus {
    pub variable: &'static str,
    pub present: bool,
    pub required: bool,
}

/// Presence of every credential the jobs use. Blank values count as missing.
pub fn credential_status(lookup: impl Fn(&str) -> Option<String>) -> Vec<CredentialStatus> {
    let required = REQUIRED_VARIABLES.iter().map(|v| (*v, true));
    let optional = OPTIONAL_VARIABLES.iter().map(|v| (*v, false));

    required
        .chain(optional)
        .map(|(variable, required)| CredentialStatus {
            variable,
            present: lookup(variable).is_some_and(|v| !v.trim().is_empty()),
            required,
        })
        .collect()
}

/// Logs one line per credential; returns false when a required one is missing.
pub fn report_credentials(statuses: &[CredentialStatus]) -> bool {
    for status in statuses {
        let mark = if status.present { "✓" } else { "✗" };
        info!("{}: {mark}", status.variable);
    }
    statuses.iter().all(|s| s.present || !s.required)
}

/// Fetches Applicants once and reports the outcome. Returns the record count.
pub async fn check_table_store(store: &dyn TableStore) -> Result<usize, StoreError> {
    match store.list(tables::APPLICANTS).await {
        Ok(records) => {
            info!(
                "✓ Table store connection successful ({} applicants)",
                records.len()
            );
            Ok(records.len())
        }
        Err(StoreError::Api { status, body }) => {
            error!("✗ Table store error (status {status}): {body}");
            Err(StoreError::Api { status, body })
        }
        Err(e) => {
            error!("✗ Connection error: {e}");
            Err(e)
        }
    }
}
