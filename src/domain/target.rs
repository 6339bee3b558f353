//! Target policy for picking a candidate version

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy used to pick the version a catalog entry should move to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TargetPolicy {
    /// The `latest` dist-tag
    #[default]
    Latest,
    /// Greatest version still satisfying the current range
    Greatest,
    /// Most recently published version
    Newest,
    /// Highest version without crossing a major boundary
    Minor,
    /// Highest version without crossing a minor boundary
    Patch,
}

impl TargetPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPolicy::Latest => "latest",
            TargetPolicy::Greatest => "greatest",
            TargetPolicy::Newest => "newest",
            TargetPolicy::Minor => "minor",
            TargetPolicy::Patch => "patch",
        }
    }
}

impl fmt::Display for TargetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
