use serde::{Deserialize, Serialize};

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 10;

const SUMMARY: &str = "Summary:";
const SCORE: &str = "Score:";
const ISSUES: &str = "Issues:";
const FOLLOW_UPS: &str = "Follow-Ups:";

/// Fields recovered from the completion text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmEvaluation {
    pub summary: String,
    pub score: i64,
    pub issues: String,
    /// Bullet lines kept verbatim (glyph included), newline-separated.
    pub follow_ups: String,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Summary,
    Score,
    Issues,
    FollowUps,
}

/// Line-oriented, lenient parse of the `Summary:/Score:/Issues:/Follow-Ups:` layout.
///
/// Prefixes are matched exactly (case and spacing). Unrecognized lines are
/// dropped, a non-integer score reads as 0, and the score is clamped to 1..=10.
pub fn parse_evaluation(text: &str) -> LlmEvaluation {
    let mut summary = String::new();
    let mut score = 0_i64;
    let mut issues = "None".to_string();
    let mut follow_ups: Vec<&str> = Vec::new();
    let mut section: Option<Section> = None;

    for line in text.trim().lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix(SUMMARY) {
            summary = rest.trim().to_string();
            section = Some(Section::Summary);
        } else if let Some(rest) = line.strip_prefix(SCORE) {
            score = rest.trim().parse().unwrap_or(0);
            section = Some(Section::Score);
        } else if let Some(rest) = line.strip_prefix(ISSUES) {
            issues = rest.trim().to_string();
            section = Some(Section::Issues);
        } else if line.starts_with(FOLLOW_UPS) {
            section = Some(Section::FollowUps);
        } else if is_bullet(line) && section == Some(Section::FollowUps) {
            follow_ups.push(line);
        }
    }

    LlmEvaluation {
        summary,
        score: score.clamp(MIN_SCORE, MAX_SCORE),
        issues,
        follow_ups: follow_ups.join("\n"),
    }
}

fn is_bullet(line: &str) -> bool {
    line.starts_with('•') || line.starts_with('-')
}
