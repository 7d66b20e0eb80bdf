use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::document::{AggregatedDocument, ExperienceEntry, PersonalSection, SalarySection};
use crate::models::report::BatchReport;
use crate::models::tables::{
    self, applicant, back_reference, experience, personal, salary, text_field, APPLICANT_LINK,
};
use crate::table_client::{Fields, TableStore};

/// Fans every stored document back out into the satellite tables.
///
/// Always creates, never updates: running this twice duplicates the satellite
/// records of every applicant.
pub async fn decompress_all(store: &dyn TableStore) -> Result<BatchReport, AppError> {
    let applicants = store.list(tables::APPLICANTS).await?;
    let mut report = BatchReport::default();

    for record in &applicants {
        let blob = text_field(&record.fields, applicant::COMPRESSED_JSON);
        if blob.trim().is_empty() {
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

        let failures = restore_applicant(store, &record.id, &document).await;
        if failures == 0 {
            info!("Decompressed data for applicant {}", record.id);
            report.processed += 1;
        } else {
            warn!(
                "Decompressed applicant {} with {failures} failed region write(s)",
                record.id
            );
            report.failed += 1;
        }
    }

    report.log("Decompression");
    Ok(report)
}

/// Writes each region independently and returns how many creates failed.
async fn restore_applicant(
    store: &dyn TableStore,
    applicant_id: &str,
    document: &AggregatedDocument,
) -> usize {
    let mut writes = vec![(
        tables::PERSONAL_DETAILS,
        personal_fields(&document.personal, applicant_id),
    )];
    writes.extend(
        document
            .experience
            .iter()
            .map(|entry| (tables::WORK_EXPERIENCE, experience_fields(entry, applicant_id))),
    );
    writes.push((
        tables::SALARY_PREFERENCES,
        salary_fields(&document.salary, applicant_id),
    ));

    let mut failures = 0;
    for (table, fields) in writes {
        if let Err(e) = store.create(table, fields).await {
            error!("Error writing {table} for applicant {applicant_id}: {e}");
            failures += 1;
        }
    }
    failures
}

fn linked_fields(applicant_id: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert(APPLICANT_LINK.to_string(), back_reference(applicant_id));
    fields
}

fn insert_opt(fields: &mut Fields, name: &str, value: Option<Value>) {
    if let Some(value) = value {
        fields.insert(name.to_string(), value);
    }
}

/// Date columns reject `""`; an empty date is written as a cleared cell.
fn date_value(date: &str) -> Value {
    if date.trim().is_empty() {
        Value::Null
    } else {
        Value::String(date.to_string())
    }
}

pub fn personal_fields(section: &PersonalSection, applicant_id: &str) -> Fields {
    let mut fields = linked_fields(applicant_id);
    insert_opt(&mut fields, personal::FULL_NAME, section.name.clone().map(Value::from));
    insert_opt(&mut fields, personal::EMAIL, section.email.clone().map(Value::from));
    insert_opt(&mut fields, personal::LOCATION, section.location.clone().map(Value::from));
    insert_opt(&mut fields, personal::LINKEDIN, section.linkedin.clone().map(Value::from));
    fields
}

pub fn experience_fields(entry: &ExperienceEntry, applicant_id: &str) -> Fields {
    let mut fields = linked_fields(applicant_id);
    fields.insert(experience::COMPANY.to_string(), Value::from(entry.company.as_str()));
    fields.insert(experience::TITLE.to_string(), Value::from(entry.title.as_str()));
    fields.insert(experience::START_DATE.to_string(), date_value(&entry.start_date));
    fields.insert(experience::END_DATE.to_string(), date_value(&entry.end_date));
    fields.insert(
        experience::TECHNOLOGIES.to_string(),
        Value::from(entry.technologies.as_str()),
    );
    fields
}

pub fn salary_fields(section: &SalarySection, applicant_id: &str) -> Fields {
    let mut fields = linked_fields(applicant_id);
    insert_opt(&mut fields, salary::PREFERRED_RATE, section.preferred_rate.map(Value::from));
    insert_opt(&mut fields, salary::MINIMUM_RATE, section.minimum_rate.map(Value::from));
    insert_opt(&mut fields, salary::CURRENCY, section.currency.clone().map(Value::from));
    insert_opt(&mut fields, salary::AVAILABILITY, section.availability.map(Value::from));
    fields
}
