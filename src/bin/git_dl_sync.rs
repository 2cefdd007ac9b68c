use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use git_download_tracker::app::{App, GIT_FOR_WINDOWS_REPO, GIT_OSX_INSTALLER_FEED, SyncOutcome};
use git_download_tracker::domain::RepoId;
use git_download_tracker::error::TrackerError;
use git_download_tracker::feed::FeedHttpClient;
use git_download_tracker::github::GithubHttpClient;
use git_download_tracker::store::MemoryStore;

#[derive(Parser)]
#[command(name = "git-dl-sync")]
#[command(about = "Discover Git build artifacts from GitHub releases and SourceForge RSS")]
#[command(version, author)]
struct Cli {
    /// Repository queried for Windows installers, owner/name form.
    #[arg(long, default_value = GIT_FOR_WINDOWS_REPO)]
    repo: String,

    /// RSS feed queried for macOS installers.
    #[arg(long, default_value = GIT_OSX_INSTALLER_FEED)]
    feed_url: String,

    #[arg(long, value_enum, default_value_t = Source::All)]
    source: Source,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Windows,
    Mac,
    All,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<TrackerError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &TrackerError) -> u8 {
    if error.is_source_unavailable() {
        return 3;
    }
    match error {
        TrackerError::InvalidRepoId(_) => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let repo: RepoId = cli.repo.parse().into_diagnostic()?;

    let github = GithubHttpClient::new().into_diagnostic()?;
    let feed = FeedHttpClient::new().into_diagnostic()?;
    let app = App::new(github, feed, MemoryStore::new());

    match cli.source {
        Source::Windows => {
            let report = app.sync_windows(&repo).into_diagnostic()?;
            print_report("windows", &report)?;
        }
        Source::Mac => {
            let report = app.sync_mac(&cli.feed_url).into_diagnostic()?;
            print_report("mac", &report)?;
        }
        Source::All => {
            let SyncOutcome { windows, mac } = app.sync_all(&repo, &cli.feed_url);
            let windows = windows.into_diagnostic()?;
            let mac = mac.into_diagnostic()?;
            print_report("windows", &windows)?;
            print_report("mac", &mac)?;
        }
    }

    Ok(())
}

fn print_report(
    source: &str,
    report: &git_download_tracker::app::SyncReport,
) -> miette::Result<()> {
    let json = serde_json::to_string_pretty(report).into_diagnostic()?;
    println!("{source}: {json}");
    Ok(())
}
