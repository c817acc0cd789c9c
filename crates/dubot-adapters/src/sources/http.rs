//! Reqwest-backed source clients.
//!
//! All clients share the configured per-request timeout and identify
//! themselves with the configured app name. The catalog speaks a filter DSL
//! in its `query` parameter; [`unit_query`] builds those expressions.

use super::{
    CommitHistorySource, CommitRecord, SourceError, SourceResult, SupportWindow,
    TestContainerRecord, TestRegistrySource, UnitCatalog, UnitFilter, UnitRecord, VersionOrder,
    WikiSource,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dubot_core::BotConfig;
use std::time::Duration;

fn build_client(cfg: &BotConfig) -> SourceResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.http_timeout_secs))
        .user_agent(format!("{}/1.0", cfg.app_name))
        .build()?;
    Ok(client)
}

fn check_status(resp: reqwest::Response) -> SourceResult<reqwest::Response> {
    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    Ok(resp)
}

/// Catalog filter expression for a unit search. Only release-level builds
/// are searched; version and stage clauses are added when the filter
/// narrows to them.
fn unit_query(filter: &UnitFilter) -> String {
    let mut clauses = vec![r#"EQ(DEPLOYABLE_UNIT.BUILD_LEVEL, "RELEASE")"#.to_string()];
    if let Some(version) = &filter.version {
        clauses.push(format!(r#"EQ(DEPLOYABLE_UNIT.VERSION, "{version}")"#));
    }
    if let Some(stage) = &filter.stage {
        clauses.push(format!(r#"EQ(DEPLOYABLE_UNIT.PROMOTION_STAGE, "{stage}")"#));
    }
    let names = filter
        .names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "AND( AND({}), IN(DEPLOYABLE_UNIT.NAME, {}))",
        clauses.join(", "),
        names
    )
}

/// The unit catalog over HTTP. Every request carries the configured client
/// identity and release context.
pub struct HttpUnitCatalog {
    client: reqwest::Client,
    base_url: String,
    client_user_id: String,
    client_app_name: String,
    release_context: String,
}

impl HttpUnitCatalog {
    pub fn new(cfg: &BotConfig) -> SourceResult<Self> {
        Ok(Self {
            client: build_client(cfg)?,
            base_url: cfg.catalog_url.trim_end_matches('/').to_string(),
            client_user_id: cfg.client_user_id.clone(),
            client_app_name: cfg.client_app_name.clone(),
            release_context: cfg.release_context.clone(),
        })
    }

    fn identity_params(&self) -> [(&'static str, &str); 3] {
        [
            ("clientUserid", self.client_user_id.as_str()),
            ("clientAppName", self.client_app_name.as_str()),
            ("releaseContext", self.release_context.as_str()),
        ]
    }

    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> SourceResult<serde_json::Value> {
        tracing::debug!(target: "dubot::source", url, "catalog request");
        let resp = self
            .client
            .get(url)
            .query(&self.identity_params())
            .query(params)
            .send()
            .await?;
        Ok(check_status(resp)?.json().await?)
    }
}

#[async_trait]
impl UnitCatalog for HttpUnitCatalog {
    async fn search_units(&self, filter: &UnitFilter) -> SourceResult<Vec<UnitRecord>> {
        let url = format!("{}/deployableUnits", self.base_url);
        let sort_by = match filter.order {
            VersionOrder::Ascending => "DEPLOYABLE_UNIT.VERSION:ascending",
            VersionOrder::Descending => "DEPLOYABLE_UNIT.VERSION:descending",
        };
        let value = self
            .get_json(
                &url,
                &[
                    ("sortBy", sort_by.to_string()),
                    ("query", unit_query(filter)),
                ],
            )
            .await?;
        serde_json::from_value(value).map_err(|err| SourceError::Malformed(err.to_string()))
    }

    async fn resolve_root_name(&self, orderable: &str) -> SourceResult<Option<String>> {
        let url = format!("{}/sellableUnits", self.base_url);
        let value = self
            .get_json(
                &url,
                &[("query", format!(r#"EQ(SELLABLE_UNIT.CODE, "{orderable}")"#))],
            )
            .await?;
        Ok(value
            .as_array()
            .and_then(|records| records.first())
            .and_then(|record| record.get("name"))
            .and_then(|name| name.as_str())
            .map(String::from))
    }

    async fn units_for_root(&self, root_name: &str) -> SourceResult<Vec<String>> {
        let url = format!("{}/traversals/mostSatisfying", self.base_url);
        let value = self
            .get_json(
                &url,
                &[
                    ("entityType", "SellableUnit".to_string()),
                    ("buildLevel", "RELEASE".to_string()),
                    ("promotionStage", "testready".to_string()),
                    ("rootName", root_name.to_string()),
                ],
            )
            .await?;
        let units = value
            .get("deployableUnits")
            .and_then(|du| du.as_array())
            .map(|records| {
                records
                    .iter()
                    .filter_map(|record| record.get("name"))
                    .filter_map(|name| name.as_str())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(units)
    }

    async fn active_windows(
        &self,
        stage: &str,
        now: DateTime<Utc>,
    ) -> SourceResult<Vec<SupportWindow>> {
        let url = format!("{}/supportCadences", self.base_url);
        // The cadence table stores stages in lower case.
        let query = format!(
            "AND(GT(SUPPORT_CADENCE.END_AT, '{}'), EQ(SUPPORT_CADENCE.PROMOTION_STAGE, '{}'))",
            now.to_rfc3339(),
            stage.to_lowercase()
        );
        let value = self.get_json(&url, &[("query", query)]).await?;
        serde_json::from_value(value).map_err(|err| SourceError::Malformed(err.to_string()))
    }
}

/// Wiki content API over HTTP. `page_body` returns the raw response body,
/// storage markup included.
pub struct HttpWiki {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWiki {
    pub fn new(cfg: &BotConfig) -> SourceResult<Self> {
        Ok(Self {
            client: build_client(cfg)?,
            base_url: cfg.wiki_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WikiSource for HttpWiki {
    async fn page_body(&self, page_id: &str) -> SourceResult<String> {
        let url = format!("{}/{}", self.base_url, page_id);
        tracing::debug!(target: "dubot::source", url, "wiki request");
        let resp = self
            .client
            .get(&url)
            .query(&[("expand", "body.storage")])
            .send()
            .await?;
        Ok(check_status(resp)?.text().await?)
    }
}

/// Commit-history proxy plus the repository host commits API.
pub struct HttpCommitProxy {
    client: reqwest::Client,
    proxy_url: String,
    repo_api_token: String,
}

impl HttpCommitProxy {
    pub fn new(cfg: &BotConfig) -> SourceResult<Self> {
        Ok(Self {
            client: build_client(cfg)?,
            proxy_url: cfg.commit_proxy_url.trim_end_matches('/').to_string(),
            repo_api_token: cfg.repo_api_token.clone(),
        })
    }
}

#[async_trait]
impl CommitHistorySource for HttpCommitProxy {
    async fn repository_urls(&self, du_name: &str) -> SourceResult<Vec<String>> {
        let url = format!("{}/deployableUnits", self.proxy_url);
        tracing::debug!(target: "dubot::source", url, du_name, "repository lookup");
        let resp = self
            .client
            .get(&url)
            .query(&[("name", du_name)])
            .send()
            .await?;
        let value: serde_json::Value = check_status(resp)?.json().await?;
        let urls = value
            .as_array()
            .map(|records| {
                records
                    .iter()
                    .filter_map(|record| record.get("replicationURL"))
                    .filter_map(|url| url.as_str())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(urls)
    }

    async fn recent_commits(&self, commits_url: &str) -> SourceResult<Vec<CommitRecord>> {
        tracing::debug!(target: "dubot::source", url = commits_url, "commit history request");
        let mut request = self.client.get(commits_url);
        if !self.repo_api_token.is_empty() {
            request = request.bearer_auth(self.repo_api_token.trim());
        }
        let resp = request.send().await?;
        let value: serde_json::Value = check_status(resp)?.json().await?;
        serde_json::from_value(value).map_err(|err| SourceError::Malformed(err.to_string()))
    }
}

/// Test-container registry over HTTP.
pub struct HttpTestRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTestRegistry {
    pub fn new(cfg: &BotConfig) -> SourceResult<Self> {
        Ok(Self {
            client: build_client(cfg)?,
            base_url: cfg.test_registry_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TestRegistrySource for HttpTestRegistry {
    async fn registered_containers(&self) -> SourceResult<Vec<TestContainerRecord>> {
        let url = format!("{}/get_registered_test_containers", self.base_url);
        tracing::debug!(target: "dubot::source", url, "registry request");
        let resp = self.client.get(&url).send().await?;
        let value: serde_json::Value = check_status(resp)?.json().await?;
        let results = value
            .get("content")
            .and_then(|content| content.get("results"))
            .cloned()
            .ok_or_else(|| {
                SourceError::Malformed("registry payload missing content.results".to_string())
            })?;
        serde_json::from_value(results).map_err(|err| SourceError::Malformed(err.to_string()))
    }
}
