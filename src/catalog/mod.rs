//! Kubernetes version catalog lookup
//!
//! The resolver needs exactly one external fact: the newest Kubernetes version
//! matching a prefix. [`VersionCatalog`] is the seam; [`DigitalOceanCatalog`]
//! asks the provider API and [`StaticCatalog`] answers from memory (offline runs
//! and tests). [`VersionLookup`] memoises answers for a single resolution pass.

use std::cmp::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Public DigitalOcean API endpoint
pub const DEFAULT_API_URL: &str = "https://api.digitalocean.com";

/// Errors from the version catalog
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("Version lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("Version lookup request failed: {0}")]
    Request(String),

    #[error("Version catalog returned HTTP {0}")]
    Status(u16),

    #[error("Version catalog response could not be decoded: {0}")]
    Decode(String),

    #[error("No Kubernetes version matches prefix '{0}'")]
    NoMatchingVersion(String),
}

/// A version offered by the provider, e.g. slug `1.31.1-do.4`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KubernetesVersion {
    pub slug: String,
    pub kubernetes_version: String,
}

impl KubernetesVersion {
    pub fn new(slug: impl Into<String>, kubernetes_version: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            kubernetes_version: kubernetes_version.into(),
        }
    }

    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.slug.starts_with(prefix) || self.kubernetes_version.starts_with(prefix)
    }
}

#[derive(Debug, Deserialize)]
struct OptionsResponse {
    options: Options,
}

#[derive(Debug, Deserialize)]
struct Options {
    #[serde(default)]
    versions: Vec<KubernetesVersion>,
}

// ============================================================================
// SBIO: Pure selection logic (no I/O)
// ============================================================================

/// Numeric components of a version string; `1.31.1-do.4` → `[1, 31, 1, 4]`
fn version_key(version: &str) -> Vec<u64> {
    version
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect()
}

fn compare_versions(a: &KubernetesVersion, b: &KubernetesVersion) -> Ordering {
    version_key(&a.slug)
        .cmp(&version_key(&b.slug))
        .then_with(|| a.slug.cmp(&b.slug))
}

/// Pick the newest version whose slug or upstream version starts with `prefix`.
/// Pure function - no I/O.
pub fn select_latest(versions: &[KubernetesVersion], prefix: &str) -> Option<KubernetesVersion> {
    versions
        .iter()
        .filter(|v| v.matches_prefix(prefix))
        .max_by(|a, b| compare_versions(a, b))
        .cloned()
}

/// Source of available Kubernetes versions
#[async_trait]
pub trait VersionCatalog: Send + Sync {
    async fn available_versions(&self) -> Result<Vec<KubernetesVersion>, LookupError>;

    /// Newest version slug matching `prefix`
    async fn latest_version(&self, prefix: &str) -> Result<String, LookupError> {
        let versions = self.available_versions().await?;
        select_latest(&versions, prefix)
            .map(|v| v.slug)
            .ok_or_else(|| LookupError::NoMatchingVersion(prefix.to_string()))
    }
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    versions: Vec<KubernetesVersion>,
}

impl StaticCatalog {
    pub fn new(versions: Vec<KubernetesVersion>) -> Self {
        Self { versions }
    }

    /// Catalog from bare slugs; the upstream version is the part before `-`
    pub fn from_slugs<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let versions = slugs
            .into_iter()
            .map(|slug| {
                let slug = slug.into();
                let upstream = slug.split('-').next().unwrap_or(&slug).to_string();
                KubernetesVersion::new(slug, upstream)
            })
            .collect();
        Self { versions }
    }
}

#[async_trait]
impl VersionCatalog for StaticCatalog {
    async fn available_versions(&self) -> Result<Vec<KubernetesVersion>, LookupError> {
        Ok(self.versions.clone())
    }
}

/// Catalog backed by `GET /v2/kubernetes/options`
pub struct DigitalOceanCatalog {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl DigitalOceanCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            timeout,
        }
    }

    /// Set the API token sent as a bearer credential
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn build_request(&self) -> reqwest::RequestBuilder {
        let url = format!("{}/v2/kubernetes/options", self.base_url);
        let mut req = self.client.get(&url);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn fetch(&self) -> Result<Vec<KubernetesVersion>, LookupError> {
        let resp = self
            .build_request()
            .send()
            .await
            .map_err(|e| LookupError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(LookupError::Status(resp.status().as_u16()));
        }

        let body: OptionsResponse = resp
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;
        Ok(body.options.versions)
    }
}

#[async_trait]
impl VersionCatalog for DigitalOceanCatalog {
    async fn available_versions(&self) -> Result<Vec<KubernetesVersion>, LookupError> {
        debug!("Fetching Kubernetes versions from {}", self.base_url);
        // Single bounded attempt; retrying is the caller's decision
        match tokio::time::timeout(self.timeout, self.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout(self.timeout)),
        }
    }
}

/// Per-pass memo over a catalog: each prefix hits the catalog at most once
pub struct VersionLookup<'a> {
    catalog: &'a dyn VersionCatalog,
    cache: DashMap<String, String>,
}

impl<'a> VersionLookup<'a> {
    pub fn new(catalog: &'a dyn VersionCatalog) -> Self {
        Self {
            catalog,
            cache: DashMap::new(),
        }
    }

    pub async fn resolve(&self, prefix: &str) -> Result<String, LookupError> {
        if let Some(hit) = self.cache.get(prefix) {
            return Ok(hit.value().clone());
        }

        let version = self.catalog.latest_version(prefix).await?;
        info!("Resolved Kubernetes version prefix '{}' to {}", prefix, version);
        self.cache.insert(prefix.to_string(), version.clone());
        Ok(version)
    }
}
