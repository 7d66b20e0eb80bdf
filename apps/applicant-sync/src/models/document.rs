use serde::{Deserialize, Serialize};

/// The denormalized per-applicant document stored in `Compressed JSON`.
///
/// All three regions are always serialized. A region built from a missing
/// satellite record serializes as `{}` (or `[]`), never as an absent key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedDocument {
    #[serde(default)]
    pub personal: PersonalSection,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub salary: SalarySection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub company: String,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub technologies: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalarySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<f64>,
}

impl AggregatedDocument {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Two-space indented JSON, readable in the table store's cell viewer.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn location(&self) -> &str {
        self.personal.location.as_deref().unwrap_or("")
    }

    pub fn display_name(&self) -> &str {
        self.personal.name.as_deref().unwrap_or("Unknown")
    }
}
