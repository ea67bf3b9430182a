use serde::Serialize;

use crate::{Finding, GoodVibeCheck, ReviewResult, Score, Severity};

/// Derive the overall verdict from findings and checks. First matching rule wins:
///
/// 1. any Critical finding: Red
/// 2. any High finding: Yellow
/// 3. every finding Low (including no findings): Green
/// 4. all checks passed and a Medium finding present: Yellow
/// 5. anything else: Yellow
pub fn derive_score(findings: &[Finding], checks: &[GoodVibeCheck]) -> Score {
    let any = |severity: Severity| findings.iter().any(|f| f.severity == severity);

    if any(Severity::Critical) {
        return Score::Red;
    }
    if any(Severity::High) {
        return Score::Yellow;
    }
    if findings.iter().all(|f| f.severity == Severity::Low) {
        return Score::Green;
    }
    if checks.iter().all(|c| c.passed) && any(Severity::Medium) {
        return Score::Yellow;
    }
    Score::Yellow
}

/// The capability's self-reported score next to the rule-derived one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreCheck {
    pub reported: Score,
    pub derived: Score,
}

impl ScoreCheck {
    pub fn agrees(&self) -> bool {
        self.reported == self.derived
    }
}

/// Cross-check a result's reported score against the derivation rules.
pub fn check_reported(result: &ReviewResult) -> ScoreCheck {
    ScoreCheck {
        reported: result.overall_score,
        derived: derive_score(&result.findings, &result.good_vibes),
    }
}
