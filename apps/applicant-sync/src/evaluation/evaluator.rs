use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::evaluation::parser::{parse_evaluation, LlmEvaluation};
use crate::evaluation::prompts::build_evaluation_prompt;
use crate::llm_client::{complete_with_retry, CompletionService};
use crate::models::document::AggregatedDocument;
use crate::models::report::BatchReport;
use crate::models::tables::{self, applicant, text_field};
use crate::table_client::{Fields, TableStore};

/// Flat pause after every applicant sent to the completion service.
pub const REQUEST_DELAY: Duration = Duration::from_secs(1);

/// Generates summary, score, and follow-ups for applicants not yet evaluated.
///
/// An applicant that already has an `LLM Summary` is skipped even if its
/// document changed since; clear the summary to force a re-evaluation.
pub async fn evaluate_all(
    store: &dyn TableStore,
    llm: &dyn CompletionService,
) -> Result<BatchReport, AppError> {
    let applicants = store.list(tables::APPLICANTS).await?;
    let mut report = BatchReport::default();

    for record in &applicants {
        let blob = text_field(&record.fields, applicant::COMPRESSED_JSON);
        let existing_summary = text_field(&record.fields, applicant::LLM_SUMMARY);

        if !existing_summary.is_empty() && !blob.is_empty() {
            debug!("Applicant {} already evaluated, skipping", record.id);
            report.skipped += 1;
            continue;
        }
        if blob.trim().is_empty() {
            info!("No compressed JSON for applicant {}", record.id);
            report.skipped += 1;
            continue;
        }

        let document = match AggregatedDocument::parse(&blob) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Invalid JSON for applicant {}: {e}", record.id);
                report.failed += 1;
                continue;
            }
        };

        match evaluate_applicant(store, llm, &record.id, &document).await {
            Ok(evaluation) => {
                info!(
                    "Updated LLM evaluation for applicant {} (score {})",
                    record.id, evaluation.score
                );
                report.processed += 1;
            }
            Err(e) => {
                error!("LLM evaluation failed for applicant {}: {e}", record.id);
                report.failed += 1;
            }
        }

        tokio::time::sleep(REQUEST_DELAY).await;
    }

    report.log("LLM evaluation");
    Ok(report)
}

async fn evaluate_applicant(
    store: &dyn TableStore,
    llm: &dyn CompletionService,
    applicant_id: &str,
    document: &AggregatedDocument,
) -> Result<LlmEvaluation, AppError> {
    let prompt = build_evaluation_prompt(document)?;
    let response = complete_with_retry(llm, &prompt).await?;
    let evaluation = parse_evaluation(&response);

    let mut fields = Fields::new();
    fields.insert(
        applicant::LLM_SUMMARY.to_string(),
        Value::from(evaluation.summary.as_str()),
    );
    fields.insert(applicant::LLM_SCORE.to_string(), Value::from(evaluation.score));
    fields.insert(
        applicant::LLM_FOLLOW_UPS.to_string(),
        Value::from(evaluation.follow_ups.as_str()),
    );
    store
        .update(tables::APPLICANTS, applicant_id, fields)
        .await?;

    Ok(evaluation)
}
