//! Concrete logic adapters and the remote sources they draw from.

pub mod sources;

mod collection;
mod confluence;
mod du_queries;
mod orderables;
mod scribe;
mod support;
mod teemo;
mod time;
mod util;

pub use collection::Collection;
pub use confluence::Confluence;
pub use du_queries::{DuQueries, UnitFeature};
pub use orderables::Orderables;
pub use scribe::Scribe;
pub use support::Support;
pub use teemo::Teemo;
pub use time::Time;

use dubot_core::{AdapterRegistry, BotConfig};
use sources::{
    http::{HttpCommitProxy, HttpTestRegistry, HttpUnitCatalog, HttpWiki},
    CommitHistorySource, SourceResult, TestRegistrySource, UnitCatalog, WikiSource,
};
use std::sync::Arc;

/// Builds the full adapter set over reqwest-backed sources.
///
/// Dispatch is first match on category, so every adapter here must keep a
/// distinct category string.
pub fn standard_registry(cfg: &BotConfig) -> SourceResult<AdapterRegistry> {
    let catalog: Arc<dyn UnitCatalog> = Arc::new(HttpUnitCatalog::new(cfg)?);
    let wiki: Arc<dyn WikiSource> = Arc::new(HttpWiki::new(cfg)?);
    let commits: Arc<dyn CommitHistorySource> = Arc::new(HttpCommitProxy::new(cfg)?);
    let containers: Arc<dyn TestRegistrySource> = Arc::new(HttpTestRegistry::new(cfg)?);

    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(Collection::new(
        catalog.clone(),
        &cfg.order_file,
        &cfg.catalog_reference,
    )));
    registry.register(Arc::new(Confluence::new(
        wiki,
        &cfg.wiki_page_id,
        &cfg.wiki_reference,
    )));
    registry.register(Arc::new(DuQueries::new(
        catalog.clone(),
        &cfg.catalog_reference,
    )));
    registry.register(Arc::new(Orderables::new(
        &cfg.order_file,
        &cfg.catalog_reference,
    )));
    registry.register(Arc::new(Scribe::new(
        commits,
        &cfg.repo_api_base,
        &cfg.commits_reference,
    )));
    registry.register(Arc::new(Support::new(
        catalog.clone(),
        &cfg.catalog_reference,
    )));
    registry.register(Arc::new(Teemo::new(containers, &cfg.registry_reference)));
    registry.register(Arc::new(Time::new(catalog, &cfg.catalog_reference)));
    Ok(registry)
}
