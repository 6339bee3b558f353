//! Registry response cache
//!
//! One cache is created per command and shared between lookups through an
//! `Arc`. Entries are keyed by (kind, registry url, package[, version]) and
//! expire after a per-kind TTL.

use crate::domain::SecurityReport;
use crate::registry::{PackageMetadata, PackageVersions};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default TTL for version lists
const VERSION_LIST_TTL: Duration = Duration::from_secs(5 * 60);

/// Default TTL for full package documents
const PACKAGE_METADATA_TTL: Duration = Duration::from_secs(60 * 60);

/// Default TTL for advisory reports
const SECURITY_REPORT_TTL: Duration = Duration::from_secs(30 * 60);

/// The kind of data a cache entry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    VersionList,
    PackageMetadata,
    SecurityReport,
}

/// Time-to-live per data kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub version_list: Duration,
    pub package_metadata: Duration,
    pub security_report: Duration,
}

impl CacheTtl {
    /// TTL applying to a kind
    pub fn for_kind(&self, kind: CacheKind) -> Duration {
        match kind {
            CacheKind::VersionList => self.version_list,
            CacheKind::PackageMetadata => self.package_metadata,
            CacheKind::SecurityReport => self.security_report,
        }
    }
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            version_list: VERSION_LIST_TTL,
            package_metadata: PACKAGE_METADATA_TTL,
            security_report: SECURITY_REPORT_TTL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    kind: CacheKind,
    registry_url: String,
    package: String,
    version: Option<String>,
}

impl CacheKey {
    fn new(kind: CacheKind, registry_url: &str, package: &str, version: Option<&str>) -> Self {
        Self {
            kind,
            registry_url: registry_url.to_string(),
            package: package.to_string(),
            version: version.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
enum CachedValue {
    Versions(PackageVersions),
    Metadata(PackageMetadata),
    Security(SecurityReport),
}

#[derive(Debug)]
struct CacheEntry {
    stored_at: Instant,
    value: CachedValue,
}

/// Concurrent TTL cache for registry responses
#[derive(Debug, Default)]
pub struct RegistryCache {
    ttl: CacheTtl,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl RegistryCache {
    /// Create a cache with default TTLs
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with custom TTLs
    pub fn with_ttl(ttl: CacheTtl) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> CacheTtl {
        self.ttl
    }

    async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let ttl = self.ttl.for_kind(key.kind);
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.stored_at.elapsed() < ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        self.evict_expired(key).await;
        None
    }

    /// Remove `key` if it is still expired once the write lock is held
    async fn evict_expired(&self, key: &CacheKey) {
        let ttl = self.ttl.for_kind(key.kind);
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.stored_at.elapsed() >= ttl)
        {
            entries.remove(key);
        }
    }

    async fn put(&self, key: CacheKey, value: CachedValue) {
        let entry = CacheEntry {
            stored_at: Instant::now(),
            value,
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Cached version list for a package
    pub async fn versions(&self, registry_url: &str, package: &str) -> Option<PackageVersions> {
        let key = CacheKey::new(CacheKind::VersionList, registry_url, package, None);
        match self.get(&key).await? {
            CachedValue::Versions(versions) => Some(versions),
            _ => None,
        }
    }

    pub async fn put_versions(&self, registry_url: &str, versions: PackageVersions) {
        let key = CacheKey::new(CacheKind::VersionList, registry_url, &versions.name, None);
        self.put(key, CachedValue::Versions(versions)).await;
    }

    /// Cached full document for a package
    pub async fn metadata(&self, registry_url: &str, package: &str) -> Option<PackageMetadata> {
        let key = CacheKey::new(CacheKind::PackageMetadata, registry_url, package, None);
        match self.get(&key).await? {
            CachedValue::Metadata(metadata) => Some(metadata),
            _ => None,
        }
    }

    pub async fn put_metadata(&self, registry_url: &str, metadata: PackageMetadata) {
        let key = CacheKey::new(CacheKind::PackageMetadata, registry_url, &metadata.name, None);
        self.put(key, CachedValue::Metadata(metadata)).await;
    }

    /// Cached advisory report for one package version
    pub async fn security(
        &self,
        registry_url: &str,
        package: &str,
        version: &str,
    ) -> Option<SecurityReport> {
        let key = CacheKey::new(CacheKind::SecurityReport, registry_url, package, Some(version));
        match self.get(&key).await? {
            CachedValue::Security(report) => Some(report),
            _ => None,
        }
    }

    pub async fn put_security(
        &self,
        registry_url: &str,
        package: &str,
        version: &str,
        report: SecurityReport,
    ) {
        let key = CacheKey::new(CacheKind::SecurityReport, registry_url, package, Some(version));
        self.put(key, CachedValue::Security(report)).await;
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Version;
    use std::sync::Arc;

    const NPM: &str = "https://registry.npmjs.org";

    fn versions(name: &str) -> PackageVersions {
        PackageVersions::new(name, vec![Version::new(1, 0, 0)])
    }

    #[tokio::test]
    async fn test_versions_roundtrip() {
        let cache = RegistryCache::new();
        assert!(cache.versions(NPM, "react").await.is_none());

        cache.put_versions(NPM, versions("react")).await;
        assert_eq!(cache.versions(NPM, "react").await, Some(versions("react")));
    }

    #[tokio::test]
    async fn test_keys_include_registry_and_kind() {
        let cache = RegistryCache::new();
        cache.put_versions(NPM, versions("react")).await;

        assert!(cache.versions("https://npm.example.com", "react").await.is_none());
        assert!(cache.metadata(NPM, "react").await.is_none());
    }

    #[tokio::test]
    async fn test_security_keyed_by_version() {
        let cache = RegistryCache::new();
        cache
            .put_security(NPM, "lodash", "4.17.0", SecurityReport::empty())
            .await;

        assert!(cache.security(NPM, "lodash", "4.17.0").await.is_some());
        assert!(cache.security(NPM, "lodash", "4.17.21").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let cache = RegistryCache::with_ttl(CacheTtl {
            version_list: Duration::ZERO,
            ..CacheTtl::default()
        });
        cache.put_versions(NPM, versions("react")).await;
        cache
            .put_security(NPM, "react", "17.0.0", SecurityReport::empty())
            .await;

        assert!(cache.versions(NPM, "react").await.is_none());
        // security reports have their own TTL
        assert!(cache.security(NPM, "react", "17.0.0").await.is_some());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_eviction_keeps_entry_refreshed_meanwhile() {
        let cache = RegistryCache::new();
        let key = CacheKey::new(CacheKind::VersionList, NPM, "react", None);
        // a reader saw a stale entry, then a writer stored a fresh one
        cache.put_versions(NPM, versions("react")).await;
        cache.evict_expired(&key).await;
        assert_eq!(cache.versions(NPM, "react").await, Some(versions("react")));

        let expiring = RegistryCache::with_ttl(CacheTtl {
            version_list: Duration::ZERO,
            ..CacheTtl::default()
        });
        expiring.put_versions(NPM, versions("react")).await;
        expiring.evict_expired(&key).await;
        assert!(expiring.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let cache = Arc::new(RegistryCache::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.put_versions(NPM, versions(&format!("pkg-{}", i))).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(cache.len().await, 32);
    }

    #[test]
    fn test_default_ttls_differ_by_kind() {
        let ttl = CacheTtl::default();
        assert!(ttl.for_kind(CacheKind::VersionList) < ttl.for_kind(CacheKind::SecurityReport));
        assert!(
            ttl.for_kind(CacheKind::SecurityReport) < ttl.for_kind(CacheKind::PackageMetadata)
        );
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = RegistryCache::new();
        cache.put_versions(NPM, versions("a")).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
