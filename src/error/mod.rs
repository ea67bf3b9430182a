use thiserror::Error;

/// Errors that terminate an in-flight review.
///
/// None of these are retried. Per-file content failures never show up here;
/// they are replaced with a sentinel body inside the source selector.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("no repository reference given")]
    MissingReference,
    #[error("invalid repository reference: {input}")]
    InvalidReference { input: String },
    #[error("repository not found: {repo}")]
    NotFound { repo: String },
    #[error("hosting API rate limit exceeded")]
    RateLimited,
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("hosting API returned status {status}")]
    HostingApi { status: u16 },
    #[error("unreadable repository listing: {0}")]
    ListingParse(String),
    #[error("no supported source files in repository root")]
    NoSupportedFiles,
    #[error("reviewer response is not a JSON object")]
    MalformedResponse,
    #[error("reviewer response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("reviewer capability failed: {0}")]
    CapabilityFailure(String),
}

pub type Result<T> = std::result::Result<T, ReviewError>;

impl ReviewError {
    /// The single human-readable message shown to whoever submitted the review.
    pub fn user_message(&self) -> String {
        let message = match self {
            ReviewError::MissingReference => "Gotta drop a GitHub URL, friend.",
            ReviewError::InvalidReference { .. } => {
                "Invalid GitHub repository URL. Please use a format like https://github.com/owner/repo."
            }
            ReviewError::NotFound { .. } => {
                "Repository not found. Make sure the URL is correct and the repository is public."
            }
            ReviewError::RateLimited => {
                "GitHub API rate limit exceeded. Please wait a bit before trying again."
            }
            ReviewError::NetworkError(_) => {
                "Could not connect to GitHub. Check your network connection."
            }
            ReviewError::HostingApi { .. } | ReviewError::ListingParse(_) => {
                "Failed to fetch repository contents from GitHub."
            }
            ReviewError::NoSupportedFiles => {
                "Could not find any supported source code files in the repository's root directory. The vibe is... empty?"
            }
            ReviewError::MalformedResponse => "The AI returned an unexpected response format.",
            ReviewError::InvalidJson(_) => {
                "The AI returned an invalid response. The vibe is off. Please try again."
            }
            ReviewError::CapabilityFailure(msg) if msg.trim().is_empty() => {
                "Failed to get code review from AI. The vibe is off."
            }
            ReviewError::CapabilityFailure(msg) => msg.as_str(),
        };
        message.to_string()
    }
}
