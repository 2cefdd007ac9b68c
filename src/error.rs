use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TrackerError {
    #[error("invalid repository identifier (expected owner/name): {0}")]
    InvalidRepoId(String),

    #[error("GitHub request failed: {0}")]
    GithubHttp(String),

    #[error("GitHub returned status {status}: {message}")]
    GithubStatus { status: u16, message: String },

    #[error("feed request failed: {0}")]
    FeedHttp(String),

    #[error("feed did not parse as RSS: {0}")]
    FeedParse(String),

    #[error("version name already exists: {0}")]
    VersionConflict(String),

    #[error("download record rejected: {0}")]
    DownloadRejected(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl TrackerError {
    /// True when the upstream source could not be read at all, as opposed to a
    /// per-record persistence problem.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            TrackerError::GithubHttp(_)
                | TrackerError::GithubStatus { .. }
                | TrackerError::FeedHttp(_)
                | TrackerError::FeedParse(_)
        )
    }
}
