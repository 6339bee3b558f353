//! Target version selection
//!
//! Pure functions mapping a registry version list and the current range to
//! the candidate version a target policy picks.

use crate::domain::{TargetPolicy, Version, VersionRange};
use crate::error::RegistryError;
use crate::registry::{PackageMetadata, PackageVersions};

/// Prereleases are candidates only when asked for or already in use
fn allows_prerelease(current: &VersionRange, include_prerelease: bool) -> bool {
    include_prerelease || current.min_version().is_prerelease()
}

/// Picks the target for every policy except `Newest`
///
/// `Minor`, `Patch` and `Greatest` return the current minimum version when
/// nothing higher is reachable.
pub fn select_target(
    versions: &PackageVersions,
    current: &VersionRange,
    policy: TargetPolicy,
    include_prerelease: bool,
) -> Result<Version, RegistryError> {
    if versions.is_empty() {
        return Err(RegistryError::empty_versions(&versions.name));
    }

    let prerelease_ok = allows_prerelease(current, include_prerelease);
    let candidates = versions
        .versions
        .iter()
        .filter(|v| prerelease_ok || !v.is_prerelease());
    let base = current.min_version();

    let selected = match policy {
        TargetPolicy::Latest => {
            if let Some(latest) = versions.latest() {
                return Ok(latest.clone());
            }
            candidates.max()
        }
        TargetPolicy::Greatest => candidates.filter(|v| current.matches(v)).max(),
        TargetPolicy::Minor => candidates
            .filter(|v| v.major() == base.major() && !base.is_newer_than(v))
            .max(),
        TargetPolicy::Patch => candidates
            .filter(|v| {
                v.major() == base.major() && v.minor() == base.minor() && !base.is_newer_than(v)
            })
            .max(),
        TargetPolicy::Newest => {
            return Err(RegistryError::InvalidResponse {
                package: versions.name.clone(),
                registry: "npm".to_string(),
                message: "newest policy requires publish dates".to_string(),
            })
        }
    };

    match (policy, selected) {
        (_, Some(version)) => Ok(version.clone()),
        (TargetPolicy::Latest, None) => Err(RegistryError::empty_versions(&versions.name)),
        (_, None) => Ok(base.clone()),
    }
}

/// Picks the most recently published, non-deprecated version
///
/// Versions without a publish date are ignored; falls back to the current
/// minimum version when no candidate remains.
pub fn select_newest(
    metadata: &PackageMetadata,
    current: &VersionRange,
    include_prerelease: bool,
) -> Result<Version, RegistryError> {
    if metadata.versions.is_empty() {
        return Err(RegistryError::empty_versions(&metadata.name));
    }

    let prerelease_ok = allows_prerelease(current, include_prerelease);
    let newest = metadata
        .versions
        .iter()
        .filter(|info| !info.deprecated)
        .filter(|info| prerelease_ok || !info.version.is_prerelease())
        .filter_map(|info| info.released_at.map(|at| (at, &info.version)))
        .max_by(|(a_at, a), (b_at, b)| a_at.cmp(b_at).then_with(|| a.cmp(b)));

    Ok(newest
        .map(|(_, version)| version.clone())
        .unwrap_or_else(|| current.min_version().clone()))
}
