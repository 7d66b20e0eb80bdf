use serde_json::Value;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::document::{AggregatedDocument, ExperienceEntry, PersonalSection, SalarySection};
use crate::models::report::BatchReport;
use crate::models::tables::{
    self, applicant, experience, is_linked_to, number_field, personal, salary, text_field,
};
use crate::table_client::{Fields, Record, TableStore};

const DEFAULT_CURRENCY: &str = "USD";

/// Rebuilds `Compressed JSON` for every applicant that has an Applicant ID.
///
/// Listing failures abort the run. A failed write is logged and the next
/// applicant is processed; re-running is safe since the output only depends
/// on the source tables.
pub async fn compress_all(store: &dyn TableStore) -> Result<BatchReport, AppError> {
    let applicants = store.list(tables::APPLICANTS).await?;
    let personal_details = store.list(tables::PERSONAL_DETAILS).await?;
    let work_experience = store.list(tables::WORK_EXPERIENCE).await?;
    let salary_preferences = store.list(tables::SALARY_PREFERENCES).await?;

    info!(
        "Compressing {} applicants ({} personal, {} experience, {} salary records)",
        applicants.len(),
        personal_details.len(),
        work_experience.len(),
        salary_preferences.len()
    );

    let mut report = BatchReport::default();

    for record in &applicants {
        let code = text_field(&record.fields, applicant::APPLICANT_ID);
        if code.is_empty() {
            report.skipped += 1;
            continue;
        }

        let document = build_document(
            &record.id,
            &personal_details,
            &work_experience,
            &salary_preferences,
        );

        match write_document(store, &record.id, &document).await {
            Ok(()) => {
                info!("Compressed data for applicant {code}");
                report.processed += 1;
            }
            Err(e) => {
                error!("Error updating applicant {code}: {e}");
                report.failed += 1;
            }
        }
    }

    report.log("Compression");
    Ok(report)
}

/// Joins the satellite records that back-reference `applicant_id`.
/// One-to-one tables use their first match; experience keeps source order.
pub fn build_document(
    applicant_id: &str,
    personal_details: &[Record],
    work_experience: &[Record],
    salary_preferences: &[Record],
) -> AggregatedDocument {
    let personal = personal_details
        .iter()
        .find(|r| is_linked_to(r, applicant_id))
        .map(|r| personal_section(&r.fields))
        .unwrap_or_default();

    let experience = work_experience
        .iter()
        .filter(|r| is_linked_to(r, applicant_id))
        .map(|r| experience_entry(&r.fields))
        .collect();

    let salary = salary_preferences
        .iter()
        .find(|r| is_linked_to(r, applicant_id))
        .map(|r| salary_section(&r.fields))
        .unwrap_or_default();

    AggregatedDocument {
        personal,
        experience,
        salary,
    }
}

fn personal_section(fields: &Fields) -> PersonalSection {
    PersonalSection {
        name: Some(text_field(fields, personal::FULL_NAME)),
        email: Some(text_field(fields, personal::EMAIL)),
        location: Some(text_field(fields, personal::LOCATION)),
        linkedin: Some(text_field(fields, personal::LINKEDIN)),
    }
}

fn experience_entry(fields: &Fields) -> ExperienceEntry {
    ExperienceEntry {
        company: text_field(fields, experience::COMPANY),
        title: text_field(fields, experience::TITLE),
        start_date: text_field(fields, experience::START_DATE),
        end_date: text_field(fields, experience::END_DATE),
        technologies: text_field(fields, experience::TECHNOLOGIES),
    }
}

fn salary_section(fields: &Fields) -> SalarySection {
    let currency = text_field(fields, salary::CURRENCY);
    SalarySection {
        preferred_rate: Some(number_field(fields, salary::PREFERRED_RATE).unwrap_or(0.0)),
        minimum_rate: Some(number_field(fields, salary::MINIMUM_RATE).unwrap_or(0.0)),
        currency: Some(if currency.is_empty() {
            DEFAULT_CURRENCY.to_string()
        } else {
            currency
        }),
        availability: Some(number_field(fields, salary::AVAILABILITY).unwrap_or(0.0)),
    }
}

async fn write_document(
    store: &dyn TableStore,
    applicant_id: &str,
    document: &AggregatedDocument,
) -> Result<(), AppError> {
    let mut fields = Fields::new();
    fields.insert(
        applicant::COMPRESSED_JSON.to_string(),
        Value::String(document.to_pretty_json()?),
    );
    store
        .update(tables::APPLICANTS, applicant_id, fields)
        .await?;
    Ok(())
}
