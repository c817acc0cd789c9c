//! Bot configuration. Load from TOML or env.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Endpoint and runtime configuration shared by the gateway and the source
/// clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Application identity (shows up in logs and catalog requests).
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Base directory for the Sled query store.
    pub storage_path: String,
    /// Order definition file: YAML with an `orderables` list of sellable
    /// unit names.
    pub order_file: String,

    /// Unit catalog base URL (deployable units, sellable units, traversals,
    /// support cadences).
    pub catalog_url: String,
    /// Wiki content API base URL.
    pub wiki_url: String,
    /// Wiki page id holding the cluster table.
    pub wiki_page_id: String,
    /// Commit-history proxy base URL (unit name to repository URLs).
    pub commit_proxy_url: String,
    /// Repository host API base (commits endpoint).
    pub repo_api_base: String,
    /// Bearer token for the repository host API. Empty means unauthenticated.
    #[serde(default)]
    pub repo_api_token: String,
    /// Test-container registry base URL.
    pub test_registry_url: String,

    /// Client identity attached to every catalog request.
    pub client_user_id: String,
    pub client_app_name: String,
    /// Release context attached to every catalog request.
    pub release_context: String,
    /// Per-request timeout for all source clients, in seconds.
    pub http_timeout_secs: u64,

    /// Help pointers quoted in not-found replies, per source family.
    pub catalog_reference: String,
    pub wiki_reference: String,
    pub commits_reference: String,
    pub registry_reference: String,
}

impl BotConfig {
    /// Load config from file and environment. Precedence: env `DUBOT_CONFIG`
    /// path > `config/gateway.toml` > defaults, then `DUBOT__*` env
    /// overrides on top.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("DUBOT_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "dubot")?
            .set_default("port", 8010_i64)?
            .set_default("storage_path", "./data")?
            .set_default("order_file", "./config/order.yaml")?
            .set_default("catalog_url", "http://catalog.internal/rest/v1")?
            .set_default("wiki_url", "http://wiki.internal/rest/api/content")?
            .set_default("wiki_page_id", "0")?
            .set_default("commit_proxy_url", "http://scribe.internal/api/v1")?
            .set_default("repo_api_base", "http://git.internal/api/v4")?
            .set_default("repo_api_token", "")?
            .set_default("test_registry_url", "http://teemo.internal")?
            .set_default("client_user_id", "dubot automation")?
            .set_default("client_app_name", "dubot automation")?
            .set_default("release_context", "release_current")?
            .set_default("http_timeout_secs", 30_i64)?
            .set_default("catalog_reference", "the deployment data portal")?
            .set_default("wiki_reference", "the cluster wiki page")?
            .set_default("commits_reference", "the repository browser")?
            .set_default("registry_reference", "the test-container registry")?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("DUBOT").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    /// Directory of the query store, derived from the storage base.
    pub fn query_store_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("dubot_queries")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_stand_alone() {
        let cfg = BotConfig::load().unwrap();
        assert_eq!(cfg.app_name, "dubot");
        assert_eq!(cfg.port, 8010);
        assert_eq!(cfg.http_timeout_secs, 30);
        assert!(cfg.repo_api_token.is_empty());
        assert_eq!(
            cfg.query_store_path(),
            PathBuf::from("./data").join("dubot_queries")
        );
    }
}
