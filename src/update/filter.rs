//! Package name filter
//!
//! Include/exclude lists use a minimal glob dialect: `*` matches any run of
//! characters, `?` a single character, everything else is literal.

use crate::error::ConfigError;
use regex::Regex;

/// Filter configuration for detection
#[derive(Debug, Clone, Default)]
pub struct PackageFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

/// Translate a glob pattern into an anchored regex
fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    let mut source = String::with_capacity(pattern.len() + 2);
    source.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');

    Regex::new(&source).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|p| compile_pattern(p)).collect()
}

impl PackageFilter {
    /// Create a filter that admits every package
    pub fn new() -> Self {
        Self::default()
    }

    /// Set packages to include (only list)
    pub fn with_include(mut self, patterns: &[String]) -> Result<Self, ConfigError> {
        self.include = compile_all(patterns)?;
        Ok(self)
    }

    /// Set packages to exclude
    pub fn with_exclude(mut self, patterns: &[String]) -> Result<Self, ConfigError> {
        self.exclude = compile_all(patterns)?;
        Ok(self)
    }

    /// Check if a package should be processed
    ///
    /// Exclusion wins over inclusion; a non-empty include list admits only
    /// matching names.
    pub fn should_process_package(&self, name: &str) -> bool {
        if self.exclude.iter().any(|re| re.is_match(name)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(name))
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}
