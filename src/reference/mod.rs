use reqwest::Url;

use crate::error::{Result, ReviewError};

/// Host every repository reference must point at.
pub const DEFAULT_HOST: &str = "github.com";

/// An `owner/name` pair parsed from a repository URL. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryReference {
    owner: String,
    name: String,
}

impl RepositoryReference {
    /// Parse a URL such as `https://github.com/owner/repo`.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with_host(input, DEFAULT_HOST)
    }

    /// Parse a URL whose host must equal `host`.
    ///
    /// Extra path segments after the first two are ignored, so tree and blob
    /// URLs resolve to their repository.
    pub fn parse_with_host(input: &str, host: &str) -> Result<Self> {
        let input = input.trim();
        let invalid = || ReviewError::InvalidReference {
            input: input.to_string(),
        };

        let url = Url::parse(input).map_err(|_| invalid())?;
        if url.host_str() != Some(host) {
            return Err(invalid());
        }

        let mut segments = url
            .path_segments()
            .ok_or_else(invalid)?
            .filter(|s| !s.is_empty());

        match (segments.next(), segments.next()) {
            (Some(owner), Some(name)) => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(invalid()),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Leaderboard key, `owner/name`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
