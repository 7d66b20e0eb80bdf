use chrono::{DateTime, Datelike, NaiveDate};

use crate::models::document::ExperienceEntry;

const DAY_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%d %B %Y"];
const MONTH_FORMATS: [&str; 4] = ["%Y-%m", "%Y/%m", "%B %Y", "%b %Y"];

/// Lenient date parsing for hand-entered experience dates.
/// Month-only values resolve to the first of the month, a bare year to January 1.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    if let Some(date) = DAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }

    let with_day = format!("{text} 1");
    if let Some(date) = MONTH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_day, &format!("{fmt} %d")).ok())
    {
        return Some(date);
    }

    if text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()) {
        return text
            .parse()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
    }

    None
}

/// Whole calendar months from `start` to `end`; the day of month is ignored.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32)
}

/// Total experience in fractional years. An empty end date means "still there"
/// and counts up to `today`; unparseable dates make that entry contribute nothing.
pub fn experience_years(entries: &[ExperienceEntry], today: NaiveDate) -> f64 {
    let total_months: i32 = entries
        .iter()
        .filter_map(|entry| {
            let start = parse_date(&entry.start_date)?;
            let end = if entry.end_date.trim().is_empty() {
                today
            } else {
                parse_date(&entry.end_date)?
            };
            Some(months_between(start, end))
        })
        .sum();

    total_months as f64 / 12.0
}
