//! Builds the fixed-schema request sent to the reviewer capability.
//!
//! Everything here is pure: the same files always produce the same request.

use serde::Serialize;
use serde_json::{Value, json};

use crate::{Category, Score, Severity, SourceFile};

/// The four Good-Vibes checks, worded exactly as the capability must echo them.
pub const GOOD_VIBE_CHECKS: [&str; 4] = [
    "No hardcoded API keys or secrets found.",
    "Code is free of large, commented-out blocks.",
    "Error handling is consistently applied.",
    "Code follows a consistent naming convention.",
];

const CHECK_HINTS: [&str; 4] = [
    "Check for strings that look like keys, e.g., 'sk_live_', 'AIzaSy', etc.",
    "Check for big blocks of commented code that indicate dead code.",
    "Check if 'try...catch' blocks, '.catch()', or other error handlers are used in async operations or sensitive areas.",
    "Check for camelCase, PascalCase, or snake_case consistency.",
];

/// Findings requested per category.
pub const FINDINGS_PER_CATEGORY: usize = 3;

/// A complete request for the reviewer capability.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub model: String,
    pub instruction_document: String,
    pub output_schema: Value,
}

/// Concatenate wrapped file bodies in selection order.
pub fn render_sources(files: &[SourceFile]) -> String {
    files
        .iter()
        .map(SourceFile::wrapped)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Assemble the request for `files`.
pub fn build_request(files: &[SourceFile], model: &str) -> ReviewRequest {
    ReviewRequest {
        model: model.to_string(),
        instruction_document: instruction_document(&render_sources(files)),
        output_schema: output_schema(),
    }
}

fn instruction_document(code: &str) -> String {
    let checks = GOOD_VIBE_CHECKS
        .iter()
        .zip(CHECK_HINTS)
        .map(|(check, hint)| format!("    - \"{check}\" ({hint})"))
        .collect::<Vec<_>>()
        .join("\n");

    let categories = Category::ALL
        .iter()
        .map(|c| format!("'{}'", c.label()))
        .collect::<Vec<_>>()
        .join(", ");

    let total = FINDINGS_PER_CATEGORY * Category::ALL.len();

    format!(
        r#"
    You are 'VibeSmashCode', an expert code reviewer for no-code and vibe-driven developers. Your goal is to provide a helpful and fun code review as fast as possible.
    Your analysis must be returned in two parts: a "Good Vibes Checklist" and a "Detailed Breakdown".

    Code to review:
    ```
{code}
    ```

    **Part 1: Good Vibes Checklist**
    First, check the code for the following common mistakes. For the 'goodVibes' array in the JSON, populate it with these exact check descriptions and a 'passed' status of true or false.
{checks}

    **Part 2: Detailed Breakdown**
    Next, provide a detailed breakdown with exactly {total} findings in total, in the 'findings' array.
    1.  You MUST identify exactly {per} items for EACH of the following categories: {categories}.
    2.  If you cannot find a genuine vulnerability for a category, provide an "improvement suggestion" or "advisory" instead. Frame it constructively. For example, for perfect security, an advisory could be: "Advisory: Consider adding a Content Security Policy (CSP) header for an extra layer of defense."
    3.  For each finding, assign a 'severity' level: 'CRITICAL' (a big yikes issue), 'HIGH' (a major glow up opportunity), 'MEDIUM' (a pro-tip), or 'LOW' (a tiny tweak).
    4.  For each finding, provide a concise but clear 'description'. Crucially, mention the file path (e.g., "In 'src/api.js', ...").
    5.  For each finding, provide a simple 'impact' explanation of 'Why this is bad' and its potential negative consequences.
    6.  For each finding, create a simple, copy-pasteable 'remediation' prompt that a no-code developer could use.

    **Part 3: Overall Score**
    Based on your findings, determine the 'overallScore' using these specific rules in this exact order:
    1. If ANY finding in the Detailed Breakdown has a 'CRITICAL' severity, the score MUST be 'RED'.
    2. If ANY finding has a 'HIGH' severity (and no 'CRITICAL' ones), the score MUST be 'YELLOW'.
    3. If ALL findings in the Detailed Breakdown have a 'LOW' severity, the score MUST be 'GREEN'. This is the best possible score.
    4. If the "Good Vibes Checklist" is entirely 'passed: true' AND the detailed findings contain 'MEDIUM' severity issues (but no 'HIGH' or 'CRITICAL'), the score should be 'YELLOW'.
    5. In all other cases (e.g., a mix of 'MEDIUM' and 'LOW' severities), the score is 'YELLOW'.

    Respond strictly in the provided JSON format. Do not include any markdown formatting like ```json.
  "#,
        per = FINDINGS_PER_CATEGORY,
    )
}

/// The output schema the capability must conform to.
///
/// Uses the capability's schema dialect (upper-case type names).
pub fn output_schema() -> Value {
    let scores: Vec<&str> = Score::ALL.iter().map(|s| s.label()).collect();
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
    let severities: Vec<&str> = Severity::ALL.iter().map(|s| s.label()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "overallScore": {
                "type": "STRING",
                "enum": scores,
                "description": "Overall traffic light score for the code.",
            },
            "goodVibes": {
                "type": "ARRAY",
                "description": "A checklist of common best practices and whether the code passed them.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "check": { "type": "STRING", "description": "The description of the check." },
                        "passed": { "type": "BOOLEAN", "description": "Whether the code passed this check." },
                    },
                    "required": ["check", "passed"],
                },
            },
            "findings": {
                "type": "ARRAY",
                "description": "A list of identified vulnerabilities, improvements, or advisories.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "category": {
                            "type": "STRING",
                            "enum": categories,
                            "description": "The category of the finding.",
                        },
                        "severity": {
                            "type": "STRING",
                            "enum": severities,
                            "description": "The severity of the finding.",
                        },
                        "description": {
                            "type": "STRING",
                            "description": "A concise description of the vulnerability, improvement, or advisory, including the file path.",
                        },
                        "impact": {
                            "type": "STRING",
                            "description": "A simple explanation of 'Why this is bad' and its potential impact.",
                        },
                        "remediation": {
                            "type": "STRING",
                            "description": "A simple, copy-pasteable prompt for a no-code tool to fix the issue or implement the suggestion.",
                        },
                    },
                    "required": ["category", "severity", "description", "impact", "remediation"],
                },
            },
        },
        "required": ["overallScore", "goodVibes", "findings"],
    })
}
