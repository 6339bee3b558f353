//! npm version ranges
//!
//! Handles range forms found in catalogs:
//! - Exact: `1.2.3`, `=1.2.3`
//! - Caret: `^1.2.3`
//! - Tilde: `~1.2.3`
//! - Comparison: `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`
//! - Wildcard: `*`, `1.x`, `1.2.*`, `1.2`
//! - Range: `>=1.0.0 <2.0.0`, `1.0.0 - 2.0.0`, `^1.0.0 || ^2.0.0`
//!
//! Each `||` alternative is translated to a `semver::VersionReq`, whose
//! prerelease matching rules are the same as npm's.

use crate::domain::Version;
use crate::error::VersionError;
use semver::{Comparator, Op, Prerelease, VersionReq};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of range, used to write updates back in the same style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    /// Exact/pinned version (e.g., `1.2.3`)
    Exact,
    /// Caret range (e.g., `^1.2.3`) - compatible with major version
    Caret,
    /// Tilde range (e.g., `~1.2.3`) - compatible with minor version
    Tilde,
    /// Greater than or equal (e.g., `>=1.2.3`)
    GreaterOrEqual,
    /// Greater than (e.g., `>1.2.3`)
    Greater,
    /// Less than or equal (e.g., `<=1.2.3`)
    LessOrEqual,
    /// Less than (e.g., `<1.2.3`)
    Less,
    /// Wildcard (e.g., `1.2.*`, `*`)
    Wildcard,
    /// Compound, hyphen or `||` range
    Range,
}

impl RangeKind {
    /// Returns true if this range kind pins a single version
    pub fn is_pinned(&self) -> bool {
        matches!(self, RangeKind::Exact)
    }
}

/// A parsed npm range with its minimum satisfying version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    raw: String,
    kind: RangeKind,
    prefix: Option<String>,
    alternatives: Vec<VersionReq>,
    min_version: Version,
}

impl VersionRange {
    /// Parses an npm range string
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let raw = input.trim();

        if raw.contains(':') {
            // workspace:, npm:, catalog:, file: and friends are not ranges
            return Err(VersionError::invalid_range(input, "unsupported protocol"));
        }

        let alternatives = raw
            .split("||")
            .map(|set| translate_set(input, set))
            .collect::<Result<Vec<_>, _>>()?;

        let (kind, prefix) = classify(raw);
        let min_version = min_version(&alternatives)
            .ok_or_else(|| VersionError::invalid_range(input, "no version satisfies range"))?;

        Ok(Self {
            raw: raw.to_string(),
            kind,
            prefix,
            alternatives,
            min_version,
        })
    }

    /// The range as written
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> RangeKind {
        self.kind
    }

    /// Operator prefix preserved on update (`^`, `~`, `>=`, ...)
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The lowest version admitted by this range
    pub fn min_version(&self) -> &Version {
        &self.min_version
    }

    /// Returns true if the version falls inside the range
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|req| req.matches(version.as_semver()))
    }

    /// Renders a range pointing at `version` in this range's style
    ///
    /// Ranges without a single lower-bound operator become caret ranges.
    pub fn with_version(&self, version: &Version) -> String {
        match self.kind {
            RangeKind::Exact | RangeKind::Caret | RangeKind::Tilde | RangeKind::GreaterOrEqual => {
                format!("{}{}", self.prefix.as_deref().unwrap_or(""), version)
            }
            RangeKind::Greater => format!(">={}", version),
            RangeKind::LessOrEqual | RangeKind::Less | RangeKind::Wildcard | RangeKind::Range => {
                format!("^{}", version)
            }
        }
    }
}

impl TryFrom<String> for VersionRange {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionRange> for String {
    fn from(range: VersionRange) -> Self {
        range.raw
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_wildcard_token(token: &str) -> bool {
    token
        .split('.')
        .any(|part| matches!(part, "*" | "x" | "X"))
}

/// Translates one `||` alternative into a semver requirement
fn translate_set(input: &str, set: &str) -> Result<VersionReq, VersionError> {
    let set = set.trim();
    if set.is_empty() {
        return Ok(VersionReq::STAR);
    }

    let mut comparators: Vec<String> = Vec::new();

    if let Some((low, high)) = set.split_once(" - ") {
        comparators.push(format!(">={}", strip_v(low.trim())));
        comparators.push(format!("<={}", strip_v(high.trim())));
    } else {
        let mut pending_op: Option<&str> = None;
        for token in set.split_whitespace() {
            let op_len = token
                .find(|c: char| !matches!(c, '<' | '>' | '=' | '^' | '~'))
                .unwrap_or(token.len());
            let (op, version) = token.split_at(op_len);

            if version.is_empty() {
                // operator separated from its version by whitespace
                pending_op = Some(op);
                continue;
            }

            let op = pending_op.take().unwrap_or(op);
            let version = strip_v(version);
            let comparator = if op.is_empty() {
                if is_wildcard_token(version) {
                    version.to_string()
                } else {
                    format!("={}", version)
                }
            } else {
                format!("{}{}", op, version)
            };
            comparators.push(comparator);
        }

        if pending_op.is_some() {
            return Err(VersionError::invalid_range(input, "dangling operator"));
        }
    }

    VersionReq::parse(&comparators.join(", "))
        .map_err(|e| VersionError::invalid_range(input, e.to_string()))
}

fn strip_v(version: &str) -> &str {
    version.trim_start_matches(['v', 'V'])
}

fn classify(raw: &str) -> (RangeKind, Option<String>) {
    if raw.is_empty() || raw == "*" || raw == "x" || raw == "X" {
        return (RangeKind::Wildcard, None);
    }
    if raw.contains("||") || raw.contains(" - ") || raw.contains(char::is_whitespace) {
        return (RangeKind::Range, None);
    }

    let prefixed = [
        (">=", RangeKind::GreaterOrEqual),
        ("<=", RangeKind::LessOrEqual),
        (">", RangeKind::Greater),
        ("<", RangeKind::Less),
        ("^", RangeKind::Caret),
        ("~", RangeKind::Tilde),
        ("=", RangeKind::Exact),
    ];
    for (prefix, kind) in prefixed {
        if raw.starts_with(prefix) {
            return (kind, Some(prefix.to_string()));
        }
    }

    let core = strip_v(raw).split(['-', '+']).next().unwrap_or("");
    if is_wildcard_token(raw) || core.split('.').count() < 3 {
        (RangeKind::Wildcard, None)
    } else {
        (RangeKind::Exact, None)
    }
}

/// Lowest version a single comparator admits, if it has a lower bound
fn lower_bound(comparator: &Comparator) -> Option<semver::Version> {
    let major = comparator.major;
    let minor = comparator.minor.unwrap_or(0);
    let patch = comparator.patch.unwrap_or(0);

    match comparator.op {
        Op::Exact | Op::GreaterEq | Op::Tilde | Op::Caret | Op::Wildcard => {
            let mut version = semver::Version::new(major, minor, patch);
            version.pre = comparator.pre.clone();
            Some(version)
        }
        Op::Greater => match (comparator.minor, comparator.patch) {
            (None, _) => Some(semver::Version::new(major + 1, 0, 0)),
            (Some(minor), None) => Some(semver::Version::new(major, minor + 1, 0)),
            (Some(minor), Some(patch)) if comparator.pre.is_empty() => {
                Some(semver::Version::new(major, minor, patch + 1))
            }
            (Some(minor), Some(patch)) => {
                let mut version = semver::Version::new(major, minor, patch);
                version.pre = Prerelease::new(&format!("{}.0", comparator.pre)).ok()?;
                Some(version)
            }
        },
        _ => None,
    }
}

/// npm `minVersion`: the smallest version any alternative admits
fn min_version(alternatives: &[VersionReq]) -> Option<Version> {
    let candidate = alternatives
        .iter()
        .map(|req| {
            req.comparators
                .iter()
                .filter_map(lower_bound)
                .max()
                .unwrap_or_else(|| semver::Version::new(0, 0, 0))
        })
        .min()?;

    alternatives
        .iter()
        .any(|req| req.matches(&candidate))
        .then(|| Version::from_semver(candidate))
}
