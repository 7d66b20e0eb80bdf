//! Fixed table and column names of the applicant base, plus helpers for reading
//! loosely typed field values.

use serde_json::{json, Value};

use crate::table_client::{Fields, Record};

pub const APPLICANTS: &str = "Applicants";
pub const PERSONAL_DETAILS: &str = "Personal Details";
pub const WORK_EXPERIENCE: &str = "Work Experience";
pub const SALARY_PREFERENCES: &str = "Salary Preferences";
pub const SHORTLISTED_LEADS: &str = "Shortlisted Leads";

/// Back-reference column carried by every satellite table and by leads.
pub const APPLICANT_LINK: &str = "Applicant";

pub mod applicant {
    pub const APPLICANT_ID: &str = "Applicant ID";
    pub const COMPRESSED_JSON: &str = "Compressed JSON";
    pub const SHORTLIST_STATUS: &str = "Shortlist Status";
    pub const LLM_SUMMARY: &str = "LLM Summary";
    pub const LLM_SCORE: &str = "LLM Score";
    pub const LLM_FOLLOW_UPS: &str = "LLM Follow-Ups";
}

pub mod personal {
    pub const FULL_NAME: &str = "Full Name";
    pub const EMAIL: &str = "Email";
    pub const LOCATION: &str = "Location";
    pub const LINKEDIN: &str = "LinkedIn";
}

pub mod experience {
    pub const COMPANY: &str = "Company";
    pub const TITLE: &str = "Title";
    pub const START_DATE: &str = "Start Date";
    pub const END_DATE: &str = "End Date";
    pub const TECHNOLOGIES: &str = "Technologies";
}

pub mod salary {
    pub const PREFERRED_RATE: &str = "Preferred Rate";
    pub const MINIMUM_RATE: &str = "Minimum Rate";
    pub const CURRENCY: &str = "Currency";
    pub const AVAILABILITY: &str = "Availability";
}

pub mod lead {
    pub const COMPRESSED_JSON: &str = "Compressed JSON";
    pub const SCORE_REASON: &str = "Score Reason";
    pub const CREATED_AT: &str = "Created At";
}

/// The link-field value pointing at `applicant_id`: a single-element list.
pub fn back_reference(applicant_id: &str) -> Value {
    json!([applicant_id])
}

/// Exact match of the record's back-reference against `[applicant_id]`.
pub fn is_linked_to(record: &Record, applicant_id: &str) -> bool {
    record.fields.get(APPLICANT_LINK) == Some(&back_reference(applicant_id))
}

/// Reads a field as text. Numbers are rendered, lists of strings (multi-selects)
/// are joined with ", ", everything else reads as empty.
pub fn text_field(fields: &Fields, name: &str) -> String {
    match fields.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

/// Reads a field as a number; numeric strings are accepted.
pub fn number_field(fields: &Fields, name: &str) -> Option<f64> {
    match fields.get(name) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}
