use serde::Serialize;
use tracing::{error, info, warn};

use crate::domain::{DownloadRecord, ParsedArtifact, Platform, RepoId, VersionRecord};
use crate::error::TrackerError;
use crate::feed::FeedClient;
use crate::github::GithubClient;
use crate::parser::{parse_mac_link, parse_windows_asset};
use crate::store::ArtifactStore;

/// Git for Windows publishes installers as GitHub release assets.
pub const GIT_FOR_WINDOWS_REPO: &str = "git-for-windows/git";

/// The macOS installer project only exposes new files through its RSS feed.
pub const GIT_OSX_INSTALLER_FEED: &str =
    "https://sourceforge.net/projects/git-osx-installer/rss?limit=20";

/// Summary of one source run. A rerun over an unchanged source reports
/// `created == 0` with everything previously stored counted as `known`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub candidates: usize,
    pub matched: usize,
    pub created: usize,
    pub known: usize,
    pub rejected: usize,
}

/// Per-source results of a full run. One source failing to fetch never affects
/// the other; persistence problems never show up here at all.
#[derive(Debug)]
pub struct SyncOutcome {
    pub windows: Result<SyncReport, TrackerError>,
    pub mac: Result<SyncReport, TrackerError>,
}

pub struct App<G: GithubClient, F: FeedClient, S: ArtifactStore> {
    github: G,
    feed: F,
    store: S,
}

impl<G: GithubClient, F: FeedClient, S: ArtifactStore> App<G, F, S> {
    pub fn new(github: G, feed: F, store: S) -> Self {
        Self { github, feed, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs both sources. Order between them is irrelevant: the pipelines
    /// touch disjoint candidate sets before the shared store.
    pub fn sync_all(&self, repo: &RepoId, feed_url: &str) -> SyncOutcome {
        let windows = self.sync_windows(repo);
        if let Err(err) = &windows {
            error!("windows source unavailable: {err}");
        }
        let mac = self.sync_mac(feed_url);
        if let Err(err) = &mac {
            error!("mac source unavailable: {err}");
        }
        SyncOutcome { windows, mac }
    }

    /// Discovers Git for Windows installers from GitHub release assets.
    pub fn sync_windows(&self, repo: &RepoId) -> Result<SyncReport, TrackerError> {
        let candidates = self.github.releases(repo)?;
        let mut report = SyncReport {
            candidates: candidates.len(),
            ..SyncReport::default()
        };

        for candidate in candidates {
            let Some(asset) = parse_windows_asset(&candidate.name) else {
                continue;
            };
            report.matched += 1;
            let artifact = ParsedArtifact {
                filename: candidate.name.clone(),
                platform: asset.platform,
                version_name: asset.version_name,
                released_at: candidate.released_at,
                url: candidate.url,
            };
            self.record_artifact(artifact, &mut report)?;
        }

        info!(
            "windows sync: {} candidates, {} matched, {} created, {} known, {} rejected",
            report.candidates, report.matched, report.created, report.known, report.rejected
        );
        Ok(report)
    }

    /// Discovers macOS installers from the SourceForge feed.
    pub fn sync_mac(&self, feed_url: &str) -> Result<SyncReport, TrackerError> {
        let candidates = self.feed.items(feed_url)?;
        let mut report = SyncReport {
            candidates: candidates.len(),
            ..SyncReport::default()
        };

        for candidate in candidates {
            let Some(file) = parse_mac_link(&candidate.url) else {
                continue;
            };
            report.matched += 1;
            let artifact = ParsedArtifact {
                filename: file.version_name.clone(),
                platform: Platform::Mac,
                version_name: file.version_name,
                released_at: candidate.released_at,
                url: file.url,
            };
            self.record_artifact(artifact, &mut report)?;
        }

        info!(
            "mac sync: {} candidates, {} matched, {} created, {} known, {} rejected",
            report.candidates, report.matched, report.created, report.known, report.rejected
        );
        Ok(report)
    }

    /// Ensures a version with this name exists, racing politely with any
    /// concurrent run. A conflict means the other writer committed the same
    /// name, so the next lookup is guaranteed to find it; the retry is
    /// unbounded because the condition is transient by construction.
    fn find_or_create_version(&self, name: &str) -> Result<VersionRecord, TrackerError> {
        loop {
            if let Some(version) = self.store.find_version(name)? {
                return Ok(version);
            }
            match self.store.create_version(name) {
                Ok(version) => return Ok(version),
                Err(TrackerError::VersionConflict(_)) => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Version resolution always completes before the download write, since
    /// the download references the version. A rejected download is logged and
    /// skipped; it must never abort the batch.
    fn record_artifact(
        &self,
        artifact: ParsedArtifact,
        report: &mut SyncReport,
    ) -> Result<(), TrackerError> {
        let version = self.find_or_create_version(&artifact.version_name)?;
        let record = DownloadRecord {
            filename: artifact.filename,
            platform: artifact.platform,
            released_at: artifact.released_at,
            version,
            url: artifact.url,
        };

        if let Some(existing) = self.store.find_download(&record)? {
            info!("download record found: {} ({})", existing.filename, existing.platform);
            report.known += 1;
            return Ok(());
        }

        match self.store.create_download(record) {
            Ok(created) => {
                info!("download record created: {} ({})", created.filename, created.platform);
                report.created += 1;
                Ok(())
            }
            Err(TrackerError::DownloadRejected(reason)) => {
                warn!("download record rejected: {reason}");
                report.rejected += 1;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
