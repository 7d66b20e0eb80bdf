// Prompt templates for the applicant evaluation.

use crate::models::document::AggregatedDocument;

pub const EVALUATION_PROMPT: &str = r#"You are a recruiting analyst. Given this JSON applicant profile, do four things:

1. Provide a concise 75-word summary.
2. Rate overall candidate quality from 1-10 (higher is better).
3. List any data gaps or inconsistencies you notice.
4. Suggest up to three follow-up questions to clarify gaps.

Applicant Data:
{applicant_json}

Return exactly in this format:
Summary: <text>
Score: <integer>
Issues: <comma-separated list or 'None'>
Follow-Ups: <bullet list>"#;

pub fn build_evaluation_prompt(document: &AggregatedDocument) -> Result<String, serde_json::Error> {
    Ok(EVALUATION_PROMPT.replace("{applicant_json}", &document.to_pretty_json()?))
}
