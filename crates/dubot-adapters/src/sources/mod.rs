//! Remote data sources the adapters draw from.
//!
//! Each trait is the narrow interface one source family exposes to the
//! adapters. The reqwest-backed clients live in [`http`]; tests substitute
//! in-memory stubs. Source calls report [`SourceError`] and leave the
//! user-facing wording to the adapter layer.

pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result alias for source calls.
pub type SourceResult<T> = Result<T, SourceError>;

/// Failures talking to a remote source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// One deployable-unit record from the catalog's filtered search. Fields the
/// catalog did not populate stay `None`; absent is never rewritten to a
/// default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "deployableUnitVersion")]
    pub version: Option<String>,
    #[serde(default, rename = "promotedAt")]
    pub promoted_at: Option<String>,
    #[serde(default, rename = "lifecycleVersion")]
    pub lifecycle_version: Option<String>,
}

/// One support window: a cadence whose support runs until `end_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportWindow {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub end_at: String,
}

/// Commit stats as reported by the repository host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub total: u64,
}

/// One commit from the repository host, newest first in API order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    #[serde(default)]
    pub committer_name: String,
    #[serde(default)]
    pub committed_date: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub stats: CommitStats,
}

/// One registered test container from the test-ownership registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestContainerRecord {
    #[serde(default)]
    pub du_name: String,
    #[serde(default)]
    pub maintainer: String,
    #[serde(default)]
    pub description: String,
}

/// Version sort order for catalog searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOrder {
    Ascending,
    Descending,
}

impl Default for VersionOrder {
    fn default() -> Self {
        Self::Ascending
    }
}

/// Filter for [`UnitCatalog::search_units`]. Only release-level units are
/// ever searched.
#[derive(Debug, Clone, Default)]
pub struct UnitFilter {
    /// Unit names to match.
    pub names: Vec<String>,
    /// Exact version, when narrowing to one.
    pub version: Option<String>,
    /// Promotion stage, when narrowing to one.
    pub stage: Option<String>,
    /// Version sort order.
    pub order: VersionOrder,
}

impl UnitFilter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn at_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = VersionOrder::Descending;
        self
    }
}

/// The unit catalog: filtered search over deployable units, sellable-unit
/// resolution, and support windows. Four endpoints of one service.
#[async_trait]
pub trait UnitCatalog: Send + Sync {
    /// Release-level unit records matching the filter, in the filter's
    /// version order. An empty result is a normal outcome, not an error.
    async fn search_units(&self, filter: &UnitFilter) -> SourceResult<Vec<UnitRecord>>;

    /// Resolves an orderable code to its sellable-unit root name, if the
    /// catalog knows the code.
    async fn resolve_root_name(&self, orderable: &str) -> SourceResult<Option<String>>;

    /// Names of the deployable units reachable from a sellable-unit root.
    async fn units_for_root(&self, root_name: &str) -> SourceResult<Vec<String>>;

    /// Support windows at `stage` whose end time lies after `now`.
    async fn active_windows(
        &self,
        stage: &str,
        now: DateTime<Utc>,
    ) -> SourceResult<Vec<SupportWindow>>;
}

/// Wiki page-content endpoint. Returns the raw response body; callers scan
/// it for the fragments they need.
#[async_trait]
pub trait WikiSource: Send + Sync {
    async fn page_body(&self, page_id: &str) -> SourceResult<String>;
}

/// Commit-history proxy plus the repository host it points at.
#[async_trait]
pub trait CommitHistorySource: Send + Sync {
    /// Repository URLs registered for a unit name. Several entries mean the
    /// unit has mirrors or auxiliary repositories; the first is primary.
    async fn repository_urls(&self, du_name: &str) -> SourceResult<Vec<String>>;

    /// Commits from a canonical commits-API URL, newest first.
    async fn recent_commits(&self, commits_url: &str) -> SourceResult<Vec<CommitRecord>>;
}

/// Test-ownership registry.
#[async_trait]
pub trait TestRegistrySource: Send + Sync {
    /// Every registered test container.
    async fn registered_containers(&self) -> SourceResult<Vec<TestContainerRecord>>;
}
