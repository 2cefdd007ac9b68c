use std::fs;

use chrono::{TimeZone, Utc};

use git_download_tracker::feed::candidates_from_feed;
use git_download_tracker::parser::parse_mac_link;

#[test]
fn parse_feed_fixture() {
    let raw = fs::read_to_string("tests/fixtures/git_osx_installer.rss").unwrap();
    let candidates = candidates_from_feed(&raw).unwrap();

    assert_eq!(candidates.len(), 3);
    assert_eq!(
        candidates[0].url,
        "https://sourceforge.net/projects/git-osx-installer/files/git-2.23.0-intel-universal-mavericks.dmg/download"
    );
    assert_eq!(
        candidates[0].released_at,
        Utc.with_ymd_and_hms(2019, 8, 17, 14, 33, 38).unwrap()
    );
    assert_eq!(
        candidates[1].released_at,
        Utc.with_ymd_and_hms(2019, 6, 11, 7, 10, 20).unwrap()
    );
}

#[test]
fn fixture_links_match_or_reject_per_rule() {
    let raw = fs::read_to_string("tests/fixtures/git_osx_installer.rss").unwrap();
    let candidates = candidates_from_feed(&raw).unwrap();

    let file = parse_mac_link(&candidates[0].url).unwrap();
    assert_eq!(file.version_name, "2.23.0");
    assert_eq!(file.raw_name, "git-2.23.0-intel-universal-mavericks.dmg");

    let file = parse_mac_link(&candidates[1].url).unwrap();
    assert_eq!(file.version_name, "2.22.0");

    // README.txt does not follow the git-<version>- convention.
    assert!(parse_mac_link(&candidates[2].url).is_none());
}
