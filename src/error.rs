//! Application error types using thiserror
//!
//! Error hierarchy:
//! - VersionError: Malformed versions and ranges
//! - RegistryError: Issues with npm registry communication
//! - WorkspaceError: Workspace, catalog and persistence failures
//! - ConfigError: Issues with CLI or file configuration

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Version or range parsing errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Package registry related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Workspace and catalog related errors
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised by the version model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The string is not a semantic version
    #[error("invalid version '{input}': {message}")]
    InvalidVersion { input: String, message: String },

    /// The string is not a supported version range
    #[error("invalid version range '{input}': {message}")]
    InvalidRange { input: String, message: String },
}

/// Errors related to package registry communication
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },

    /// The registry knows the package but lists no usable versions
    #[error("no versions published for '{package}'")]
    EmptyVersions { package: String },
}

/// Errors related to the workspace model and its persistence
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// No pnpm workspace at or above the path
    #[error("no pnpm workspace found at {path}")]
    WorkspaceNotFound { path: PathBuf },

    /// Named catalog does not exist in the workspace
    #[error("catalog '{catalog}' not found in workspace")]
    CatalogNotFound { catalog: String },

    /// Package is not declared in the named catalog
    #[error("package '{package}' not found in catalog '{catalog}'")]
    PackageNotFound { catalog: String, package: String },

    /// Failed to read a workspace file
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a workspace file
    #[error("failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// Failed to write a workspace file
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid package glob in pnpm-workspace.yaml
    #[error("invalid package pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid include/exclude pattern
    #[error("invalid package pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Invalid configuration file
    #[error("invalid config file {path}: {message}")]
    InvalidFile { path: PathBuf, message: String },
}

impl VersionError {
    /// Creates a new InvalidVersion error
    pub fn invalid_version(input: impl Into<String>, message: impl Into<String>) -> Self {
        VersionError::InvalidVersion {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidRange error
    pub fn invalid_range(input: impl Into<String>, message: impl Into<String>) -> Self {
        VersionError::InvalidRange {
            input: input.into(),
            message: message.into(),
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new EmptyVersions error
    pub fn empty_versions(package: impl Into<String>) -> Self {
        RegistryError::EmptyVersions {
            package: package.into(),
        }
    }
}

impl WorkspaceError {
    /// Creates a new WorkspaceNotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        WorkspaceError::WorkspaceNotFound { path: path.into() }
    }

    /// Creates a new CatalogNotFound error
    pub fn catalog_not_found(catalog: impl Into<String>) -> Self {
        WorkspaceError::CatalogNotFound {
            catalog: catalog.into(),
        }
    }

    /// Creates a new PackageNotFound error
    pub fn package_not_found(catalog: impl Into<String>, package: impl Into<String>) -> Self {
        WorkspaceError::PackageNotFound {
            catalog: catalog.into(),
            package: package.into(),
        }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkspaceError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new ParseError
    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        WorkspaceError::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkspaceError::WriteError {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_error_invalid_version() {
        let err = VersionError::invalid_version("not-a-version", "unexpected character");
        let msg = format!("{}", err);
        assert!(msg.contains("invalid version 'not-a-version'"));
        assert!(msg.contains("unexpected character"));
    }

    #[test]
    fn test_version_error_invalid_range() {
        let err = VersionError::invalid_range("^^1", "empty comparator");
        let msg = format!("{}", err);
        assert!(msg.contains("invalid version range '^^1'"));
    }

    #[test]
    fn test_registry_error_package_not_found() {
        let err = RegistryError::package_not_found("nonexistent-package", "npm");
        let msg = format!("{}", err);
        assert!(msg.contains("package 'nonexistent-package' not found"));
        assert!(msg.contains("npm"));
    }

    #[test]
    fn test_registry_error_network() {
        let err = RegistryError::network_error("lodash", "npm", "connection refused");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to fetch"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_registry_error_rate_limit() {
        let err = RegistryError::rate_limit_exceeded("npm");
        assert!(err.to_string().contains("rate limit exceeded"));
    }

    #[test]
    fn test_registry_error_timeout() {
        let err = RegistryError::timeout("react", "npm");
        let msg = format!("{}", err);
        assert!(msg.contains("timeout"));
        assert!(msg.contains("react"));
    }

    #[test]
    fn test_registry_error_empty_versions() {
        let err = RegistryError::empty_versions("ghost");
        assert_eq!(err.to_string(), "no versions published for 'ghost'");
    }

    #[test]
    fn test_workspace_error_messages() {
        let err = WorkspaceError::not_found("/missing");
        assert!(err.to_string().contains("no pnpm workspace found"));

        let err = WorkspaceError::catalog_not_found("react17");
        assert_eq!(err.to_string(), "catalog 'react17' not found in workspace");

        let err = WorkspaceError::package_not_found("default", "vue");
        assert_eq!(
            err.to_string(),
            "package 'vue' not found in catalog 'default'"
        );
    }

    #[test]
    fn test_workspace_error_write() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = WorkspaceError::write_error("/ws/pnpm-workspace.yaml", io);
        let msg = err.to_string();
        assert!(msg.contains("failed to write"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_app_error_from_version_error() {
        let app_err: AppError = VersionError::invalid_version("x", "bad").into();
        assert!(app_err.to_string().contains("invalid version 'x'"));
    }

    #[test]
    fn test_app_error_from_registry_error() {
        let app_err: AppError = RegistryError::package_not_found("pkg", "npm").into();
        assert!(app_err.to_string().contains("package 'pkg' not found"));
    }

    #[test]
    fn test_app_error_from_workspace_error() {
        let app_err: AppError = WorkspaceError::catalog_not_found("legacy").into();
        assert!(app_err.to_string().contains("catalog 'legacy'"));
    }

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::InvalidFile {
            path: PathBuf::from(".catuprc.json"),
            message: "expected value".to_string(),
        }
        .into();
        assert!(app_err.to_string().contains("invalid config file .catuprc.json"));
    }
}
