//! Semantic version model
//!
//! Wraps `semver::Version` with npm's loose parsing (`v1.2.3`, `=1.2.3`)
//! and an ordering that ignores build metadata.

use crate::domain::VersionRange;
use crate::error::VersionError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Classification of a version transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    /// Same major.minor.patch
    None,
    /// Only the patch component differs
    Patch,
    /// The minor component differs
    Minor,
    /// The major component differs
    Major,
}

impl UpdateType {
    /// Returns the lowercase name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::None => "none",
            UpdateType::Patch => "patch",
            UpdateType::Minor => "minor",
            UpdateType::Major => "major",
        }
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable semantic version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(semver::Version);

impl Version {
    /// Creates a release version from its numeric components
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Parses a version string, accepting a leading `v` or `=`
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let stripped = trimmed
            .strip_prefix('=')
            .unwrap_or(trimmed)
            .trim_start()
            .trim_start_matches(['v', 'V']);

        semver::Version::parse(stripped)
            .map(Self)
            .map_err(|e| VersionError::invalid_version(input, e.to_string()))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Prerelease identifiers as written (empty for releases)
    pub fn prerelease(&self) -> &str {
        self.0.pre.as_str()
    }

    /// Build metadata as written (empty when absent)
    pub fn build(&self) -> &str {
        self.0.build.as_str()
    }

    /// Returns true if this version carries prerelease identifiers
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    /// Compares by semver precedence; build metadata is ignored
    pub fn compare(&self, other: &Version) -> Ordering {
        (self.0.major, self.0.minor, self.0.patch)
            .cmp(&(other.0.major, other.0.minor, other.0.patch))
            .then_with(|| self.0.pre.cmp(&other.0.pre))
    }

    /// Returns true if this version has strictly higher precedence
    pub fn is_newer_than(&self, other: &Version) -> bool {
        self.compare(other) == Ordering::Greater
    }

    /// Classifies the transition from `self` to `to`
    pub fn difference_type(&self, to: &Version) -> UpdateType {
        if self.0.major != to.0.major {
            UpdateType::Major
        } else if self.0.minor != to.0.minor {
            UpdateType::Minor
        } else if self.0.patch != to.0.patch {
            UpdateType::Patch
        } else {
            UpdateType::None
        }
    }

    /// Checks this version against a range string
    pub fn satisfies(&self, range: &str) -> Result<bool, VersionError> {
        Ok(VersionRange::parse(range)?.matches(self))
    }

    pub(crate) fn as_semver(&self) -> &semver::Version {
        &self.0
    }

    pub(crate) fn from_semver(version: semver::Version) -> Self {
        Self(version)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.major.hash(state);
        self.0.minor.hash(state);
        self.0.patch.hash(state);
        self.0.pre.hash(state);
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
