use tracing::{debug, warn};

use crate::ReviewResult;
use crate::error::{Result, ReviewError};

/// Parse the capability's raw text payload into a [`ReviewResult`].
///
/// The payload must look like a single JSON object once trimmed. Fields are
/// deserialized into the closed enums, so a value of the wrong type or an
/// unknown enum member is rejected as [`ReviewError::InvalidJson`]. The
/// twelve-finding count is a request-time instruction and is not enforced.
pub fn parse_review_response(raw: &str) -> Result<ReviewResult> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        warn!(len = trimmed.len(), "reviewer response is not a JSON object");
        return Err(ReviewError::MalformedResponse);
    }

    let result: ReviewResult = serde_json::from_str(trimmed)?;
    debug!(
        score = %result.overall_score,
        findings = result.findings.len(),
        checks = result.good_vibes.len(),
        "parsed reviewer response"
    );
    Ok(result)
}
