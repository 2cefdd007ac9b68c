use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::domain::{ArtifactCandidate, RepoId};
use crate::error::TrackerError;

const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub updated_at: DateTime<Utc>,
    pub browser_download_url: String,
}

pub trait GithubClient: Send + Sync {
    /// All release assets of the repository, flattened into candidates in the
    /// API's enumeration order. One logical fetch per invocation; paging is
    /// internal.
    fn releases(&self, repo: &RepoId) -> Result<Vec<ArtifactCandidate>, TrackerError>;
}

#[derive(Clone)]
pub struct GithubHttpClient {
    client: Client,
    base_url: String,
}

impl GithubHttpClient {
    pub fn new() -> Result<Self, TrackerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("git-download-tracker/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| TrackerError::GithubHttp(err.to_string()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.trim().is_empty() {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                        .map_err(|err| TrackerError::GithubHttp(err.to_string()))?,
                );
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| TrackerError::GithubHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: "https://api.github.com".to_string(),
        })
    }

    fn fetch_page(&self, repo: &RepoId, page: usize) -> Result<Vec<Release>, TrackerError> {
        let url = format!("{}/repos/{}/releases", self.base_url, repo.as_str());
        let response = self.send_with_retries(|| {
            self.client.get(&url).query(&[
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ])
        })?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "GitHub request failed".to_string());
            return Err(TrackerError::GithubStatus { status, message });
        }
        response
            .json()
            .map_err(|err| TrackerError::GithubHttp(err.to_string()))
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, TrackerError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(TrackerError::GithubHttp(err.to_string()));
                }
            }
        }
    }
}

impl GithubClient for GithubHttpClient {
    fn releases(&self, repo: &RepoId) -> Result<Vec<ArtifactCandidate>, TrackerError> {
        let mut releases = Vec::new();
        let mut page = 1usize;
        loop {
            let batch = self.fetch_page(repo, page)?;
            let done = batch.len() < PER_PAGE;
            releases.extend(batch);
            if done {
                break;
            }
            page += 1;
        }
        Ok(candidates_from_releases(releases))
    }
}

/// Flattens release listings into candidates, keeping the API's order and
/// filtering nothing. Deciding what counts as an artifact is the parser's job.
pub fn candidates_from_releases(releases: Vec<Release>) -> Vec<ArtifactCandidate> {
    let mut candidates = Vec::new();
    for release in releases {
        for asset in release.assets {
            candidates.push(ArtifactCandidate {
                name: asset.name,
                released_at: asset.updated_at,
                url: asset.browser_download_url,
            });
        }
    }
    candidates
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_releases_preserves_order() {
        let payload = r#"[
            {"assets": [
                {"name": "Git-2.30.0-64-bit.exe",
                 "updated_at": "2021-01-04T10:00:00Z",
                 "browser_download_url": "https://example.com/a"},
                {"name": "checksums.txt",
                 "updated_at": "2021-01-04T10:01:00Z",
                 "browser_download_url": "https://example.com/b"}
            ]},
            {"assets": [
                {"name": "Git-2.29.0-32-bit.exe",
                 "updated_at": "2020-10-29T09:00:00Z",
                 "browser_download_url": "https://example.com/c"}
            ]},
            {}
        ]"#;
        let releases: Vec<Release> = serde_json::from_str(payload).unwrap();
        let candidates = candidates_from_releases(releases);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].name, "Git-2.30.0-64-bit.exe");
        assert_eq!(candidates[1].name, "checksums.txt");
        assert_eq!(candidates[2].url, "https://example.com/c");
    }
}
