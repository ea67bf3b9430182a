pub mod capability;
pub mod cli;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod reference;
pub mod score;
pub mod source;
pub mod tui;
pub mod validate;
pub mod window;

use serde::{Deserialize, Serialize};

/// Finding category. Exactly three findings per category are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Security,
    Performance,
    Logic,
    #[serde(rename = "Best Practices", alias = "BestPractices")]
    BestPractices,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Security,
        Category::Performance,
        Category::Logic,
        Category::BestPractices,
    ];

    /// Wire name, as it appears in the output schema.
    pub fn label(self) -> &'static str {
        match self {
            Category::Security => "Security",
            Category::Performance => "Performance",
            Category::Logic => "Logic",
            Category::BestPractices => "Best Practices",
        }
    }
}

/// Severity of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    /// Short badge shown next to a finding.
    pub fn badge(self) -> &'static str {
        match self {
            Severity::Critical => "BIG YIKES",
            Severity::High => "GLOW UP",
            Severity::Medium => "PRO-TIP",
            Severity::Low => "TINY TWEAK",
        }
    }
}

/// Traffic-light verdict for a whole review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Score {
    Green,
    Yellow,
    Red,
}

impl Score {
    pub const ALL: [Score; 3] = [Score::Green, Score::Yellow, Score::Red];

    pub fn label(self) -> &'static str {
        match self {
            Score::Green => "GREEN",
            Score::Yellow => "YELLOW",
            Score::Red => "RED",
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Score::Green => {
                "OKAY OKAY we get it — you can code. Ship It Before Something Changes!"
            }
            Score::Yellow => "It Works… If You Don’t Look at It",
            Score::Red => "Your Code Is on Fire (in the Bad Way)",
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One of the four fixed best-practice checks, reported pass/fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodVibeCheck {
    pub check: String,
    pub passed: bool,
}

/// A categorized, severity-rated issue or advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    pub severity: Severity,
    pub description: String,
    pub impact: String,
    pub remediation: String,
}

/// Structured output of the reviewer capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub overall_score: Score,
    #[serde(default)]
    pub good_vibes: Vec<GoodVibeCheck>,
    #[serde(default, alias = "vulnerabilities")]
    pub findings: Vec<Finding>,
}

/// A selected repository file. `content` is the sentinel marker when its fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    /// File body wrapped in a path banner so findings can be attributed.
    pub fn wrapped(&self) -> String {
        format!(
            "\n// Path: {}\n// --- START OF FILE ---\n{}\n// --- END OF FILE ---\n",
            self.path, self.content
        )
    }
}
