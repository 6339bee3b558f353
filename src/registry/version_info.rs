//! Version information from the registry
//!
//! `PackageVersions` is the cheap version list (abbreviated npm document),
//! `PackageMetadata` the full document with publish dates.

use crate::domain::Version;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All published versions of a package plus its dist-tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersions {
    pub name: String,
    /// Published versions, ascending
    pub versions: Vec<Version>,
    /// Dist-tags such as `latest` or `next`
    pub dist_tags: BTreeMap<String, Version>,
}

impl PackageVersions {
    /// Creates a version list, sorting and de-duplicating the versions
    pub fn new(name: impl Into<String>, mut versions: Vec<Version>) -> Self {
        versions.sort();
        versions.dedup();
        Self {
            name: name.into(),
            versions,
            dist_tags: BTreeMap::new(),
        }
    }

    /// Sets a dist-tag (builder pattern)
    pub fn with_tag(mut self, tag: impl Into<String>, version: Version) -> Self {
        self.dist_tags.insert(tag.into(), version);
        self
    }

    /// The `latest` dist-tag, if published
    pub fn latest(&self) -> Option<&Version> {
        self.dist_tags.get("latest")
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Information about a package version from the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: Version,
    /// When this version was published
    pub released_at: Option<DateTime<Utc>>,
    /// Whether the version carries a deprecation notice
    pub deprecated: bool,
}

impl VersionInfo {
    pub fn new(version: Version, released_at: Option<DateTime<Utc>>) -> Self {
        Self {
            version,
            released_at,
            deprecated: false,
        }
    }

    /// Marks the version deprecated (builder pattern)
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

impl Ord for VersionInfo {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.version.cmp(&other.version)
    }
}

impl PartialOrd for VersionInfo {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Full package document: per-version publish dates and project links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    /// Versions with publish information, ascending
    pub versions: Vec<VersionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

impl PackageMetadata {
    pub fn new(name: impl Into<String>, mut versions: Vec<VersionInfo>) -> Self {
        versions.sort();
        Self {
            name: name.into(),
            versions,
            homepage: None,
            repository: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_package_versions_sorted_and_deduped() {
        let versions = PackageVersions::new(
            "react",
            vec![v("18.2.0"), v("17.0.2"), v("18.2.0"), v("16.14.0")],
        );
        assert_eq!(versions.versions, vec![v("16.14.0"), v("17.0.2"), v("18.2.0")]);
        assert!(versions.latest().is_none());
    }

    #[test]
    fn test_package_versions_latest_tag() {
        let versions =
            PackageVersions::new("react", vec![v("18.2.0")]).with_tag("latest", v("18.2.0"));
        assert_eq!(versions.latest(), Some(&v("18.2.0")));
    }

    #[test]
    fn test_version_info_sorting_uses_semver() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let mut infos = vec![
            VersionInfo::new(v("1.10.0"), Some(date)),
            VersionInfo::new(v("1.9.0"), Some(date)),
            VersionInfo::new(v("1.10.0-rc.1"), None),
        ];
        infos.sort();
        let order: Vec<String> = infos.iter().map(|i| i.version.to_string()).collect();
        assert_eq!(order, vec!["1.9.0", "1.10.0-rc.1", "1.10.0"]);
    }

    #[test]
    fn test_version_info_deprecated_builder() {
        let info = VersionInfo::new(v("1.0.0"), None).deprecated();
        assert!(info.deprecated);
    }

    #[test]
    fn test_serde_version_info() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let info = VersionInfo::new(v("1.2.3"), Some(date));

        let json = serde_json::to_string(&info).unwrap();
        let parsed: VersionInfo = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.version, v("1.2.3"));
        assert_eq!(parsed.released_at, Some(date));
    }
}
