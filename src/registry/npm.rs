//! npm Registry gateway
//!
//! Fetches version lists and package documents from an npm-compatible
//! registry and queries its bulk advisory endpoint.
//! API endpoints:
//! - `GET {registry}/{package}` (abbreviated and full documents)
//! - `POST {registry}/-/npm/v1/security/advisories/bulk`

use crate::domain::{SecurityReport, Severity, Version, Vulnerability};
use crate::error::RegistryError;
use crate::registry::{
    HttpClient, PackageMetadata, PackageVersions, RegistryCache, RegistryGateway, VersionInfo,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Public npm registry base URL
pub const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Accept header selecting the abbreviated ("corgi") document
const ABBREVIATED_ACCEPT: &str = "application/vnd.npm.install-v1+json";

/// Accept header selecting the full document
const FULL_ACCEPT: &str = "application/json";

/// Bulk advisory endpoint, relative to the registry URL
const ADVISORIES_PATH: &str = "-/npm/v1/security/advisories/bulk";

/// npm registry gateway
pub struct NpmRegistry {
    client: HttpClient,
    registry_url: String,
    cache: Arc<RegistryCache>,
}

/// Abbreviated package document
#[derive(Debug, Deserialize)]
struct AbbreviatedDocument {
    #[serde(default, rename = "dist-tags")]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    versions: HashMap<String, serde_json::Value>,
}

/// Full package document (only the fields in use)
#[derive(Debug, Deserialize)]
struct FullDocument {
    #[serde(default)]
    time: HashMap<String, String>,
    #[serde(default)]
    versions: HashMap<String, FullVersion>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    repository: Option<Repository>,
}

#[derive(Debug, Deserialize)]
struct FullVersion {
    #[serde(default)]
    deprecated: Option<serde_json::Value>,
}

/// `repository` is either a URL string or an object with a `url`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Repository {
    Url(String),
    Object { url: Option<String> },
}

impl Repository {
    fn into_url(self) -> Option<String> {
        match self {
            Repository::Url(url) => Some(url),
            Repository::Object { url } => url,
        }
    }
}

/// One entry of the bulk advisory response
#[derive(Debug, Deserialize)]
struct Advisory {
    id: serde_json::Value,
    #[serde(default)]
    title: String,
    /// Raw label; unknown values map to moderate
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    vulnerable_versions: Option<String>,
}

impl From<Advisory> for Vulnerability {
    fn from(advisory: Advisory) -> Self {
        let id = match advisory.id {
            serde_json::Value::String(id) => id,
            other => other.to_string(),
        };
        Vulnerability {
            id,
            title: advisory.title,
            severity: advisory
                .severity
                .as_deref()
                .and_then(Severity::from_label)
                .unwrap_or(Severity::Moderate),
            url: advisory.url,
            vulnerable_versions: advisory.vulnerable_versions,
        }
    }
}

impl NpmRegistry {
    /// Create a gateway for the public registry
    pub fn new(client: HttpClient, cache: Arc<RegistryCache>) -> Self {
        Self::with_registry_url(client, cache, NPM_REGISTRY_URL)
    }

    /// Create a gateway for a custom registry URL
    pub fn with_registry_url(
        client: HttpClient,
        cache: Arc<RegistryCache>,
        registry_url: impl Into<String>,
    ) -> Self {
        let registry_url = registry_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            registry_url,
            cache,
        }
    }

    /// Build the document URL for a package; scoped names keep `@` and encode `/`
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}", self.registry_url, package.replace('/', "%2f"))
    }

    fn advisories_url(&self) -> String {
        format!("{}/{}", self.registry_url, ADVISORIES_PATH)
    }

    fn parse_versions(package: &str, document: AbbreviatedDocument) -> PackageVersions {
        let versions = document
            .versions
            .keys()
            .filter_map(|raw| match Version::parse(raw) {
                Ok(version) => Some(version),
                Err(e) => {
                    log::debug!("ignoring unparsable version of {}: {}", package, e);
                    None
                }
            })
            .collect();

        let mut result = PackageVersions::new(package, versions);
        for (tag, raw) in document.dist_tags {
            if let Ok(version) = Version::parse(&raw) {
                result = result.with_tag(tag, version);
            }
        }
        result
    }

    fn parse_metadata(package: &str, document: FullDocument) -> PackageMetadata {
        let infos = document
            .versions
            .iter()
            .filter_map(|(raw, details)| {
                let version = Version::parse(raw).ok()?;
                let released_at = document
                    .time
                    .get(raw)
                    .and_then(|t| t.parse::<DateTime<Utc>>().ok());
                let info = VersionInfo::new(version, released_at);
                // npm sets `deprecated` to a message string; an empty one clears it
                let deprecated = matches!(
                    &details.deprecated,
                    Some(serde_json::Value::String(msg)) if !msg.is_empty()
                ) || matches!(&details.deprecated, Some(serde_json::Value::Bool(true)));
                Some(if deprecated { info.deprecated() } else { info })
            })
            .collect();

        let mut metadata = PackageMetadata::new(package, infos);
        metadata.homepage = document.homepage;
        metadata.repository = document.repository.and_then(Repository::into_url);
        metadata
    }

    async fn fetch_advisories(
        &self,
        package: &str,
        version: &Version,
    ) -> Result<SecurityReport, RegistryError> {
        let mut body = BTreeMap::new();
        body.insert(package.to_string(), vec![version.to_string()]);

        let mut response: HashMap<String, Vec<Advisory>> = self
            .client
            .post_json(&self.advisories_url(), &body, package)
            .await?;

        let vulnerabilities = response
            .remove(package)
            .unwrap_or_default()
            .into_iter()
            .map(Vulnerability::from)
            .collect();
        Ok(SecurityReport::from_vulnerabilities(vulnerabilities))
    }
}

#[async_trait]
impl RegistryGateway for NpmRegistry {
    fn registry_url(&self) -> &str {
        &self.registry_url
    }

    async fn fetch_versions(&self, package: &str) -> Result<PackageVersions, RegistryError> {
        if let Some(cached) = self.cache.versions(&self.registry_url, package).await {
            return Ok(cached);
        }

        let document: AbbreviatedDocument = self
            .client
            .get_json(&self.build_url(package), ABBREVIATED_ACCEPT, package)
            .await?;
        let versions = Self::parse_versions(package, document);
        if versions.is_empty() {
            return Err(RegistryError::empty_versions(package));
        }

        self.cache
            .put_versions(&self.registry_url, versions.clone())
            .await;
        Ok(versions)
    }

    async fn fetch_metadata(&self, package: &str) -> Result<PackageMetadata, RegistryError> {
        if let Some(cached) = self.cache.metadata(&self.registry_url, package).await {
            return Ok(cached);
        }

        let document: FullDocument = self
            .client
            .get_json(&self.build_url(package), FULL_ACCEPT, package)
            .await?;
        let metadata = Self::parse_metadata(package, document);
        if metadata.versions.is_empty() {
            return Err(RegistryError::empty_versions(package));
        }

        self.cache
            .put_metadata(&self.registry_url, metadata.clone())
            .await;
        Ok(metadata)
    }

    async fn security_report(&self, package: &str, version: &Version) -> SecurityReport {
        let key = version.to_string();
        if let Some(cached) = self.cache.security(&self.registry_url, package, &key).await {
            return cached;
        }

        match self.fetch_advisories(package, version).await {
            Ok(report) => {
                self.cache
                    .put_security(&self.registry_url, package, &key, report.clone())
                    .await;
                report
            }
            Err(e) => {
                log::warn!(
                    "security check failed for {}@{}, assuming no advisories: {}",
                    package,
                    version,
                    e
                );
                SecurityReport::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NpmRegistry {
        NpmRegistry::new(HttpClient::new().unwrap(), Arc::new(RegistryCache::new()))
    }

    #[test]
    fn test_build_url() {
        assert_eq!(
            registry().build_url("lodash"),
            "https://registry.npmjs.org/lodash"
        );
    }

    #[test]
    fn test_build_url_scoped_package() {
        assert_eq!(
            registry().build_url("@types/node"),
            "https://registry.npmjs.org/@types%2fnode"
        );
    }

    #[test]
    fn test_custom_registry_url_trailing_slash() {
        let registry = NpmRegistry::with_registry_url(
            HttpClient::new().unwrap(),
            Arc::new(RegistryCache::new()),
            "https://npm.example.com/",
        );
        assert_eq!(registry.registry_url(), "https://npm.example.com");
        assert_eq!(
            registry.advisories_url(),
            "https://npm.example.com/-/npm/v1/security/advisories/bulk"
        );
    }

    #[test]
    fn test_parse_abbreviated_document() {
        let document: AbbreviatedDocument = serde_json::from_str(
            r#"{
                "name": "react",
                "dist-tags": {"latest": "18.2.0", "next": "19.0.0-rc.1"},
                "versions": {
                    "17.0.2": {},
                    "18.2.0": {},
                    "19.0.0-rc.1": {},
                    "not-a-version": {}
                }
            }"#,
        )
        .unwrap();

        let versions = NpmRegistry::parse_versions("react", document);
        assert_eq!(versions.versions.len(), 3);
        assert_eq!(versions.latest(), Some(&Version::new(18, 2, 0)));
        assert_eq!(versions.versions[0], Version::new(17, 0, 2));
    }

    #[test]
    fn test_parse_full_document() {
        let document: FullDocument = serde_json::from_str(
            r#"{
                "name": "left-pad",
                "time": {
                    "created": "2014-03-01T00:00:00.000Z",
                    "1.0.0": "2014-03-01T00:00:00.000Z",
                    "1.3.0": "2018-04-09T00:00:00.000Z"
                },
                "versions": {
                    "1.0.0": {},
                    "1.3.0": {"deprecated": "use String.prototype.padStart()"}
                },
                "homepage": "https://github.com/stevemao/left-pad",
                "repository": {"type": "git", "url": "git+https://github.com/stevemao/left-pad.git"}
            }"#,
        )
        .unwrap();

        let metadata = NpmRegistry::parse_metadata("left-pad", document);
        assert_eq!(metadata.versions.len(), 2);
        assert!(!metadata.versions[0].deprecated);
        assert!(metadata.versions[1].deprecated);
        assert!(metadata.versions[1].released_at.is_some());
        assert_eq!(
            metadata.repository.as_deref(),
            Some("git+https://github.com/stevemao/left-pad.git")
        );
    }

    #[test]
    fn test_advisory_conversion() {
        let advisories: HashMap<String, Vec<Advisory>> = serde_json::from_str(
            r#"{
                "lodash": [{
                    "id": 1523,
                    "title": "Prototype Pollution",
                    "severity": "high",
                    "url": "https://github.com/advisories/GHSA-p6mc-m468-83gw",
                    "vulnerable_versions": "<4.17.19"
                }]
            }"#,
        )
        .unwrap();

        let vulnerability: Vulnerability = advisories
            .into_values()
            .flatten()
            .next()
            .map(Vulnerability::from)
            .unwrap();
        assert_eq!(vulnerability.id, "1523");
        assert_eq!(vulnerability.severity, Severity::High);
        assert_eq!(vulnerability.vulnerable_versions.as_deref(), Some("<4.17.19"));
    }

    #[test]
    fn test_unknown_severity_keeps_other_advisories() {
        let advisories: HashMap<String, Vec<Advisory>> = serde_json::from_str(
            r#"{
                "minimist": [
                    {"id": 1, "title": "Odd label", "severity": "urgent"},
                    {"id": 2, "title": "Prototype Pollution", "severity": "Critical"},
                    {"id": 3, "title": "No label", "severity": null}
                ]
            }"#,
        )
        .unwrap();

        let severities: Vec<Severity> = advisories
            .into_values()
            .flatten()
            .map(|a| Vulnerability::from(a).severity)
            .collect();
        assert_eq!(
            severities,
            vec![Severity::Moderate, Severity::Critical, Severity::Moderate]
        );
    }

    #[tokio::test]
    async fn test_security_report_fails_open() {
        let client = HttpClient::with_timeout(std::time::Duration::from_millis(200))
            .unwrap()
            .with_max_retries(0);
        let cache = Arc::new(RegistryCache::new());
        let registry =
            NpmRegistry::with_registry_url(client, Arc::clone(&cache), "http://127.0.0.1:9");

        let report = registry
            .security_report("lodash", &Version::new(4, 17, 0))
            .await;
        assert_eq!(report, SecurityReport::empty());
        // failures are not cached
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cached_versions_skip_network() {
        let cache = Arc::new(RegistryCache::new());
        let registry = NpmRegistry::with_registry_url(
            HttpClient::new().unwrap().with_max_retries(0),
            Arc::clone(&cache),
            "http://127.0.0.1:9",
        );
        let versions = PackageVersions::new("react", vec![Version::new(18, 2, 0)]);
        cache.put_versions("http://127.0.0.1:9", versions.clone()).await;

        assert_eq!(registry.fetch_versions("react").await.unwrap(), versions);
    }
}
