use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::document::AggregatedDocument;
use crate::models::report::BatchReport;
use crate::models::tables::{self, applicant, back_reference, lead, text_field, APPLICANT_LINK};
use crate::shortlist::criteria::{ShortlistCriteria, ShortlistDecision};
use crate::table_client::{Fields, Record, TableStore};

/// Applies the shortlist rules to every applicant with a stored document.
///
/// Writes `Shortlist Status` for each one and creates a lead for each qualifier.
/// Leads are not deduplicated: a second run shortlists the same applicants again.
pub async fn evaluate_all(
    store: &dyn TableStore,
    criteria: &ShortlistCriteria,
) -> Result<BatchReport, AppError> {
    let applicants = store.list(tables::APPLICANTS).await?;
    let today = Utc::now().date_naive();
    let mut report = BatchReport::default();
    let mut shortlisted = 0;

    for record in &applicants {
        let blob = text_field(&record.fields, applicant::COMPRESSED_JSON);
        if blob.trim().is_empty() {
            report.skipped += 1;
            continue;
        }

        match shortlist_applicant(store, criteria, record, &blob, today).await {
            Ok(decision) => {
                if decision.qualified {
                    shortlisted += 1;
                }
                report.processed += 1;
            }
            Err(e) => {
                error!("Shortlisting failed for applicant {}: {e}", record.id);
                report.failed += 1;
            }
        }
    }

    info!("{shortlisted} applicant(s) shortlisted");
    report.log("Shortlisting");
    Ok(report)
}

async fn shortlist_applicant(
    store: &dyn TableStore,
    criteria: &ShortlistCriteria,
    record: &Record,
    blob: &str,
    today: NaiveDate,
) -> Result<ShortlistDecision, AppError> {
    let document = AggregatedDocument::parse(blob).map_err(|source| {
        AppError::MalformedDocument {
            applicant_id: record.id.clone(),
            source,
        }
    })?;

    let decision = criteria.evaluate(&document, today);

    let mut status = Fields::new();
    status.insert(
        applicant::SHORTLIST_STATUS.to_string(),
        Value::from(decision.status()),
    );
    // A lost status write does not block lead creation.
    if let Err(e) = store.update(tables::APPLICANTS, &record.id, status).await {
        warn!("Could not write shortlist status for {}: {e}", record.id);
    }

    if decision.qualified {
        store
            .create(
                tables::SHORTLISTED_LEADS,
                lead_fields(&record.id, blob, &decision),
            )
            .await?;
        info!("Shortlisted applicant: {}", document.display_name());
    }

    Ok(decision)
}

fn lead_fields(applicant_id: &str, blob: &str, decision: &ShortlistDecision) -> Fields {
    let mut fields = Fields::new();
    fields.insert(APPLICANT_LINK.to_string(), back_reference(applicant_id));
    fields.insert(lead::COMPRESSED_JSON.to_string(), Value::from(blob));
    fields.insert(
        lead::SCORE_REASON.to_string(),
        Value::from(decision.score_reason()),
    );
    fields.insert(
        lead::CREATED_AT.to_string(),
        Value::from(Utc::now().to_rfc3339()),
    );
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_client::memory::MemoryStore;
    use serde_json::json;

    fn blob(rate: f64, location: &str, company: &str) -> String {
        json!({
            "personal": {"name": "Alan Turing", "email": "", "location": location, "linkedin": ""},
            "experience": [{
                "company": company, "title": "Researcher",
                "start_date": "2020-01-01", "end_date": "2021-01-01", "technologies": ""
            }],
            "salary": {"preferred_rate": rate, "minimum_rate": 60.0, "currency": "USD", "availability": 30.0}
        })
        .to_string()
    }

    fn status_of(store: &MemoryStore, id: &str) -> Value {
        store.record(tables::APPLICANTS, id).unwrap().fields[applicant::SHORTLIST_STATUS].clone()
    }

    #[tokio::test]
    async fn test_qualified_applicant_gets_yes_and_one_lead() {
        let store = MemoryStore::new();
        let text = blob(90.0, "Remote, United Kingdom", "Google");
        store.insert(tables::APPLICANTS, "recA", json!({"Compressed JSON": text.clone()}));

        let report = evaluate_all(&store, &ShortlistCriteria::default()).await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(status_of(&store, "recA"), json!("Yes"));
        let leads = store.records(tables::SHORTLISTED_LEADS);
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].fields["Applicant"], json!(["recA"]));
        assert_eq!(leads[0].fields["Compressed JSON"], json!(text));
        assert!(leads[0].fields["Score Reason"]
            .as_str()
            .unwrap()
            .contains("Worked at Tier-1 company: Google"));
        assert!(leads[0].fields.contains_key("Created At"));
    }

    #[tokio::test]
    async fn test_failing_any_axis_gets_no_and_zero_leads() {
        let store = MemoryStore::new();
        store.insert(
            tables::APPLICANTS,
            "recRate",
            json!({"Compressed JSON": blob(150.0, "USA", "Google")}),
        );
        store.insert(
            tables::APPLICANTS,
            "recPlace",
            json!({"Compressed JSON": blob(90.0, "Paris, France", "Google")}),
        );
        store.insert(
            tables::APPLICANTS,
            "recJunior",
            json!({"Compressed JSON": blob(90.0, "USA", "Acme")}),
        );

        evaluate_all(&store, &ShortlistCriteria::default()).await.unwrap();

        for id in ["recRate", "recPlace", "recJunior"] {
            assert_eq!(status_of(&store, id), json!("No"), "{id}");
        }
        assert!(store.records(tables::SHORTLISTED_LEADS).is_empty());
    }

    #[tokio::test]
    async fn test_rerun_duplicates_leads() {
        let store = MemoryStore::new();
        store.insert(
            tables::APPLICANTS,
            "recA",
            json!({"Compressed JSON": blob(90.0, "India", "Netflix")}),
        );

        evaluate_all(&store, &ShortlistCriteria::default()).await.unwrap();
        evaluate_all(&store, &ShortlistCriteria::default()).await.unwrap();

        assert_eq!(store.records(tables::SHORTLISTED_LEADS).len(), 2);
    }

    #[tokio::test]
    async fn test_missing_and_invalid_documents_are_skipped() {
        let store = MemoryStore::new();
        store.insert(tables::APPLICANTS, "recNone", json!({"Applicant ID": "A-1"}));
        store.insert(tables::APPLICANTS, "recBad", json!({"Compressed JSON": "[broken"}));

        let report = evaluate_all(&store, &ShortlistCriteria::default()).await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert!(!store
            .record(tables::APPLICANTS, "recBad")
            .unwrap()
            .fields
            .contains_key(applicant::SHORTLIST_STATUS));
    }

    #[tokio::test]
    async fn test_lead_failure_is_counted_and_batch_continues() {
        let store = MemoryStore::new();
        store.insert(
            tables::APPLICANTS,
            "recA",
            json!({"Compressed JSON": blob(90.0, "USA", "Apple")}),
        );
        store.insert(
            tables::APPLICANTS,
            "recB",
            json!({"Compressed JSON": blob(150.0, "USA", "Apple")}),
        );
        store.fail_table(tables::SHORTLISTED_LEADS);

        let report = evaluate_all(&store, &ShortlistCriteria::default()).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(status_of(&store, "recA"), json!("Yes"));
        assert_eq!(status_of(&store, "recB"), json!("No"));
    }
}
