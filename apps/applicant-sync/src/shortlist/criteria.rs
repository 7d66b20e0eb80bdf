use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::document::AggregatedDocument;
use crate::shortlist::dates::experience_years;

pub const TIER_1_COMPANIES: [&str; 7] = [
    "Google",
    "Meta",
    "OpenAI",
    "Microsoft",
    "Apple",
    "Amazon",
    "Netflix",
];

pub const APPROVED_LOCATIONS: [&str; 8] = [
    "US",
    "USA",
    "United States",
    "Canada",
    "UK",
    "United Kingdom",
    "Germany",
    "India",
];

/// Hiring rules. Every sub-check must pass; there is no weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortlistCriteria {
    pub min_experience_years: f64,
    pub max_preferred_rate: f64,
    pub min_availability_hours: f64,
    pub tier1_companies: Vec<String>,
    pub approved_locations: Vec<String>,
}

impl Default for ShortlistCriteria {
    fn default() -> Self {
        Self {
            min_experience_years: 4.0,
            max_preferred_rate: 100.0,
            min_availability_hours: 20.0,
            tier1_companies: TIER_1_COMPANIES.iter().map(|c| c.to_string()).collect(),
            approved_locations: APPROVED_LOCATIONS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Outcome of the rule set for one applicant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortlistDecision {
    pub experience_years: f64,
    pub tier1_companies: Vec<String>,
    pub experience_qualified: bool,
    pub compensation_qualified: bool,
    pub location_qualified: bool,
    pub qualified: bool,
    /// One sentence per satisfied sub-criterion, in evaluation order.
    pub reasons: Vec<String>,
}

impl ShortlistDecision {
    pub fn status(&self) -> &'static str {
        if self.qualified {
            "Yes"
        } else {
            "No"
        }
    }

    pub fn score_reason(&self) -> String {
        self.reasons.join("; ")
    }
}

impl ShortlistCriteria {
    pub fn evaluate(&self, document: &AggregatedDocument, today: NaiveDate) -> ShortlistDecision {
        let mut reasons = Vec::new();

        // Experience: enough years, or any tier-1 employer.
        let years = experience_years(&document.experience, today);
        let tier1: Vec<String> = document
            .experience
            .iter()
            .filter(|e| self.tier1_companies.iter().any(|c| c == &e.company))
            .map(|e| e.company.clone())
            .collect();

        if years >= self.min_experience_years {
            reasons.push(format!("Has {years:.1} years of experience"));
        }
        if !tier1.is_empty() {
            reasons.push(format!("Worked at Tier-1 company: {}", tier1.join(", ")));
        }
        let experience_qualified = years >= self.min_experience_years || !tier1.is_empty();

        // Compensation: an absent preferred rate never fits the budget.
        let preferred_rate = document.salary.preferred_rate.unwrap_or(f64::INFINITY);
        let availability = document.salary.availability.unwrap_or(0.0);

        let rate_ok = preferred_rate <= self.max_preferred_rate;
        let availability_ok = availability >= self.min_availability_hours;
        if rate_ok {
            reasons.push(format!(
                "Preferred rate ${}/hr is within budget",
                format_amount(preferred_rate)
            ));
        }
        if availability_ok {
            reasons.push(format!(
                "Available {} hours/week",
                format_amount(availability)
            ));
        }
        let compensation_qualified = rate_ok && availability_ok;

        // Location: case-insensitive substring against the approved list.
        let location = document.location().trim();
        let location_lower = location.to_lowercase();
        let location_qualified = self
            .approved_locations
            .iter()
            .any(|loc| location_lower.contains(&loc.to_lowercase()));
        if location_qualified {
            reasons.push(format!("Located in approved region: {location}"));
        }

        ShortlistDecision {
            experience_years: years,
            tier1_companies: tier1,
            experience_qualified,
            compensation_qualified,
            location_qualified,
            qualified: experience_qualified && compensation_qualified && location_qualified,
            reasons,
        }
    }
}

/// Whole amounts print without a decimal part.
fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
