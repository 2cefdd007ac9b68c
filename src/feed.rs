use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::domain::ArtifactCandidate;
use crate::error::TrackerError;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default, rename = "item")]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    link: String,
    #[serde(rename = "pubDate")]
    pub_date: String,
}

pub trait FeedClient: Send + Sync {
    /// All feed items as candidates, in document order. The item link doubles
    /// as the provisional name and the URL placeholder; rule set B derives the
    /// real filename and rebuilds the URL.
    fn items(&self, feed_url: &str) -> Result<Vec<ArtifactCandidate>, TrackerError>;
}

#[derive(Clone)]
pub struct FeedHttpClient {
    client: Client,
}

impl FeedHttpClient {
    pub fn new() -> Result<Self, TrackerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("git-download-tracker/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| TrackerError::FeedHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| TrackerError::FeedHttp(err.to_string()))?;
        Ok(Self { client })
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
                    return Err(TrackerError::FeedHttp(err.to_string()));
                }
            }
        }
    }
}

impl FeedClient for FeedHttpClient {
    fn items(&self, feed_url: &str) -> Result<Vec<ArtifactCandidate>, TrackerError> {
        let response = self.send_with_retries(|| self.client.get(feed_url))?;
        if !response.status().is_success() {
            return Err(TrackerError::FeedHttp(format!(
                "feed returned status {}",
                response.status().as_u16()
            )));
        }
        let body = response
            .text()
            .map_err(|err| TrackerError::FeedHttp(err.to_string()))?;
        candidates_from_feed(&body)
    }
}

/// Parses an RSS document into candidates. A document that is not well-formed
/// RSS, or an item date that is not RFC 2822, fails the whole feed run.
pub fn candidates_from_feed(xml: &str) -> Result<Vec<ArtifactCandidate>, TrackerError> {
    let rss: Rss =
        quick_xml::de::from_str(xml).map_err(|err| TrackerError::FeedParse(err.to_string()))?;

    let mut candidates = Vec::new();
    for item in rss.channel.items {
        let released_at = DateTime::parse_from_rfc2822(item.pub_date.trim())
            .map_err(|err| {
                TrackerError::FeedParse(format!("bad pubDate {:?}: {}", item.pub_date, err))
            })?
            .with_timezone(&Utc);
        candidates.push(ArtifactCandidate {
            name: item.link.clone(),
            released_at,
            url: item.link,
        });
    }
    Ok(candidates)
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
