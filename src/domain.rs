use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Raw observation from one source, before any metadata extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCandidate {
    pub name: String,
    pub released_at: DateTime<Utc>,
    pub url: String,
}

/// Platform tag recovered from a filename, packaging variant included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows32,
    Windows64,
    Windows32Portable,
    Windows64Portable,
    Mac,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows32 => "windows32",
            Platform::Windows64 => "windows64",
            Platform::Windows32Portable => "windows32portable",
            Platform::Windows64Portable => "windows64portable",
            Platform::Mac => "mac",
        }
    }

    pub fn windows(bitness: &str, portable: bool) -> Option<Self> {
        match (bitness, portable) {
            ("32", false) => Some(Platform::Windows32),
            ("64", false) => Some(Platform::Windows64),
            ("32", true) => Some(Platform::Windows32Portable),
            ("64", true) => Some(Platform::Windows64Portable),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parser output: one normalized artifact, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArtifact {
    pub filename: String,
    pub platform: Platform,
    pub version_name: String,
    pub released_at: DateTime<Utc>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId(String);

impl RepoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RepoId {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let mut parts = trimmed.splitn(2, '/');
        let owner = parts.next().unwrap_or("");
        let name = parts.next().unwrap_or("");
        let segment_ok = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
        };
        if !segment_ok(owner) || !segment_ok(name) {
            return Err(TrackerError::InvalidRepoId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Durable version entity. Unique on `name`, created lazily, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRecord {
    pub name: String,
}

/// Durable download entity. Identity is the full five-field tuple, URL
/// included: mirrors and signing variants of the same filename stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub filename: String,
    pub platform: Platform,
    pub released_at: DateTime<Utc>,
    pub version: VersionRecord,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_repo_id_valid() {
        let repo: RepoId = "git-for-windows/git".parse().unwrap();
        assert_eq!(repo.as_str(), "git-for-windows/git");
    }

    #[test]
    fn parse_repo_id_invalid() {
        let err = "no-slash".parse::<RepoId>().unwrap_err();
        assert_matches!(err, TrackerError::InvalidRepoId(_));

        let err = "owner/".parse::<RepoId>().unwrap_err();
        assert_matches!(err, TrackerError::InvalidRepoId(_));
    }

    #[test]
    fn platform_tags() {
        assert_eq!(Platform::Windows64.as_str(), "windows64");
        assert_eq!(Platform::Windows32Portable.as_str(), "windows32portable");
        assert_eq!(Platform::windows("64", true), Some(Platform::Windows64Portable));
        assert_eq!(Platform::windows("16", false), None);
    }
}
