use regex::Regex;

use crate::domain::Platform;

const GIT_OSX_INSTALLER_PROJECT: &str = "git-osx-installer";

/// Metadata recovered from a Git for Windows release asset name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowsAsset {
    pub version_name: String,
    pub platform: Platform,
}

/// Metadata recovered from a SourceForge feed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacFile {
    pub raw_name: String,
    pub version_name: String,
    pub url: String,
}

/// Rule set A: Git for Windows installer names, shaped
/// `[Portable]Git-#.#.#[.#][-qualifier-...]-32/64-bit[.7z].exe`.
///
/// The version name is the full asset name, not just the numeric portion, so
/// qualifiers such as `-dev-preview` keep distinct versions distinct.
/// Anything else (checksums, source archives) is a silent reject.
pub fn parse_windows_asset(name: &str) -> Option<WindowsAsset> {
    let re =
        Regex::new(r"^(Portable)?Git-(\d+\.\d+\.\d+(?:\.\d+)?)-(?:.+-)*(32|64)-bit(?:\..*)?\.exe")
            .unwrap();
    let captures = re.captures(name)?;

    let portable = captures.get(1).is_some();
    let bitness = captures.get(3)?.as_str();
    let platform = Platform::windows(bitness, portable)?;

    Some(WindowsAsset {
        version_name: name.to_string(),
        platform,
    })
}

/// Rule set B: SourceForge feed links point at a landing page, so the real
/// filename is the second-to-last path segment. Matching names look like
/// `git-<version>-<anything>`; the download URL is rebuilt as a canonical
/// mirror-selection URL rather than taken from the feed item.
pub fn parse_mac_link(link: &str) -> Option<MacFile> {
    let raw_name = link.split('/').rev().nth(1)?;
    let re = Regex::new(r"git-(.*?)-").unwrap();
    let captures = re.captures(raw_name)?;
    let version_name = captures.get(1)?.as_str();
    if version_name.is_empty() {
        return None;
    }

    Some(MacFile {
        raw_name: raw_name.to_string(),
        version_name: version_name.to_string(),
        url: sourceforge_project_download_url(GIT_OSX_INSTALLER_PROJECT, raw_name),
    })
}

pub fn sourceforge_project_download_url(project: &str, filename: &str) -> String {
    format!("https://sourceforge.net/projects/{project}/files/{filename}/download?use_mirror=autoselect")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_installer_64() {
        let asset = parse_windows_asset("Git-2.30.0-64-bit.exe").unwrap();
        assert_eq!(asset.platform, Platform::Windows64);
        assert_eq!(asset.version_name, "Git-2.30.0-64-bit.exe");
    }

    #[test]
    fn windows_portable_32_with_inner_extension() {
        let asset = parse_windows_asset("PortableGit-2.30.0.2-32-bit.7z.exe").unwrap();
        assert_eq!(asset.platform, Platform::Windows32Portable);
        assert_eq!(asset.version_name, "PortableGit-2.30.0.2-32-bit.7z.exe");
    }

    #[test]
    fn windows_qualifier_between_version_and_bitness() {
        let asset = parse_windows_asset("Git-2.20.0-rc1-dev-preview-64-bit.exe").unwrap();
        assert_eq!(asset.platform, Platform::Windows64);
    }

    #[test]
    fn windows_platform_matrix() {
        let cases = [
            ("Git-2.30.0-32-bit.exe", Platform::Windows32),
            ("Git-2.30.0-64-bit.exe", Platform::Windows64),
            ("PortableGit-2.30.0-32-bit.7z.exe", Platform::Windows32Portable),
            ("PortableGit-2.30.0-64-bit.7z.exe", Platform::Windows64Portable),
        ];
        for (name, expected) in cases {
            let asset = parse_windows_asset(name).unwrap();
            assert_eq!(asset.platform, expected, "{name}");
        }
    }

    #[test]
    fn windows_rejects_non_installers() {
        assert!(parse_windows_asset("checksums.txt").is_none());
        assert!(parse_windows_asset("Git-2.30.0-64-bit.tar.bz2").is_none());
        assert!(parse_windows_asset("MinGit-2.30.0-64-bit.zip").is_none());
        assert!(parse_windows_asset("Git-2.30-64-bit.exe").is_none());
    }

    #[test]
    fn mac_link_segment_and_rebuilt_url() {
        let link = "https://sourceforge.net/projects/git-osx-installer/files/git-2.23.0-intel-universal-mavericks.dmg/download";
        let file = parse_mac_link(link).unwrap();
        assert_eq!(file.raw_name, "git-2.23.0-intel-universal-mavericks.dmg");
        assert_eq!(file.version_name, "2.23.0");
        assert_eq!(
            file.url,
            "https://sourceforge.net/projects/git-osx-installer/files/git-2.23.0-intel-universal-mavericks.dmg/download?use_mirror=autoselect"
        );
    }

    #[test]
    fn mac_rejects_non_matching_segments() {
        assert!(parse_mac_link("https://sourceforge.net/projects/git-osx-installer/files/README.md/download").is_none());
        assert!(parse_mac_link("https://example.com").is_none());
    }
}
