//! New-unit promotion events for the orderable set at a stage and date.

use crate::orderables::load_order_definition;
use crate::sources::{UnitCatalog, UnitFilter};
use crate::util::upsert_ordered;
use dubot_core::{AnswerError, AnswerResult, LogicAdapter, ParamMap, QueryRecord};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

const CATEGORY: &str = "collection";
const REQUIREMENTS: &[&str] = &["promotion_stage", "date"];

const NO_EVENTS: &str = "No promotion events found.";

/// Answers which deployable units in the orderable set were promoted to a
/// stage on a calendar date.
///
/// The orderable set is resolved through the catalog on every call: each
/// orderable code maps to a sellable-unit root, each root contributes its
/// reachable units, and one filtered search covers all the collected names.
pub struct Collection {
    catalog: Arc<dyn UnitCatalog>,
    order_file: PathBuf,
    reference: String,
}

impl Collection {
    pub fn new(
        catalog: Arc<dyn UnitCatalog>,
        order_file: impl Into<PathBuf>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            order_file: order_file.into(),
            reference: reference.into(),
        }
    }

    /// Deployable unit names reachable from the orderable set, first-seen
    /// order, no duplicates.
    async fn orderable_units(&self) -> AnswerResult<Vec<String>> {
        let orderables = load_order_definition(&self.order_file).map_err(|detail| {
            AnswerError::upstream("the order definition", &self.reference, detail)
        })?;

        let mut roots = Vec::new();
        for orderable in &orderables {
            let resolved = self
                .catalog
                .resolve_root_name(orderable)
                .await
                .map_err(|err| {
                    AnswerError::upstream("the orderable units", &self.reference, err.to_string())
                })?;
            match resolved {
                Some(root) => roots.push(root),
                None => {
                    tracing::debug!(
                        target: "dubot::adapter",
                        orderable = %orderable,
                        "orderable has no sellable-unit root, skipping"
                    );
                }
            }
        }

        let mut seen = HashSet::new();
        let mut units = Vec::new();
        for root in &roots {
            let reachable = self.catalog.units_for_root(root).await.map_err(|err| {
                AnswerError::upstream("the orderable units", &self.reference, err.to_string())
            })?;
            for unit in reachable {
                if seen.insert(unit.clone()) {
                    units.push(unit);
                }
            }
        }
        Ok(units)
    }
}

#[async_trait::async_trait]
impl LogicAdapter for Collection {
    fn category(&self) -> &str {
        CATEGORY
    }

    fn requirements(&self) -> &[&'static str] {
        REQUIREMENTS
    }

    async fn process(&self, _query: &QueryRecord, params: &ParamMap) -> AnswerResult<String> {
        let stage = params.require("promotion_stage")?;
        let date = params.require("date")?;

        let unit_names = self.orderable_units().await?;
        if unit_names.is_empty() {
            return Ok(NO_EVENTS.to_string());
        }

        let filter = UnitFilter {
            names: unit_names,
            stage: Some(stage.to_string()),
            ..UnitFilter::default()
        };
        let units = self.catalog.search_units(&filter).await.map_err(|err| {
            AnswerError::upstream("the promotion events", &self.reference, err.to_string())
        })?;

        // Last record per unit name wins, then the calendar-date test is a
        // plain string match on the first ten characters of the timestamp.
        // No timezone normalization.
        let mut promoted: Vec<(String, String)> = Vec::new();
        for unit in units {
            if let Some(timestamp) = unit.promoted_at {
                upsert_ordered(&mut promoted, unit.name, timestamp);
            }
        }
        let matched: Vec<String> = promoted
            .into_iter()
            .filter(|(_, timestamp)| timestamp.get(..10) == Some(date))
            .map(|(name, _)| name)
            .collect();

        if matched.is_empty() {
            Ok(NO_EVENTS.to_string())
        } else {
            Ok(matched.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{SourceResult, SupportWindow, UnitRecord};
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    struct StubCatalog {
        roots: HashMap<&'static str, &'static str>,
        units_by_root: HashMap<&'static str, Vec<&'static str>>,
        records: Vec<UnitRecord>,
    }

    #[async_trait::async_trait]
    impl UnitCatalog for StubCatalog {
        async fn search_units(&self, filter: &UnitFilter) -> SourceResult<Vec<UnitRecord>> {
            Ok(self
                .records
                .iter()
                .filter(|record| filter.names.contains(&record.name))
                .cloned()
                .collect())
        }

        async fn resolve_root_name(&self, orderable: &str) -> SourceResult<Option<String>> {
            Ok(self.roots.get(orderable).map(|root| root.to_string()))
        }

        async fn units_for_root(&self, root_name: &str) -> SourceResult<Vec<String>> {
            Ok(self
                .units_by_root
                .get(root_name)
                .map(|units| units.iter().map(|unit| unit.to_string()).collect())
                .unwrap_or_default())
        }

        async fn active_windows(
            &self,
            _stage: &str,
            _now: DateTime<Utc>,
        ) -> SourceResult<Vec<SupportWindow>> {
            Ok(Vec::new())
        }
    }

    fn record(name: &str, promoted_at: Option<&str>) -> UnitRecord {
        UnitRecord {
            name: name.to_string(),
            promoted_at: promoted_at.map(String::from),
            ..UnitRecord::default()
        }
    }

    fn write_order_file(dir: &std::path::Path, names: &[&str]) -> PathBuf {
        let path = dir.join("order.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "orderables:").unwrap();
        for name in names {
            writeln!(file, "  - {name}").unwrap();
        }
        path
    }

    #[tokio::test]
    async fn lists_units_promoted_on_the_requested_date() {
        let dir = tempdir().unwrap();
        let order_file = write_order_file(dir.path(), &["SAS-REPORTDATA", "SAS-AUDIT"]);
        let catalog = StubCatalog {
            roots: HashMap::from([("SAS-REPORTDATA", "Report Data"), ("SAS-AUDIT", "Audit")]),
            units_by_root: HashMap::from([
                ("Report Data", vec!["reportdata", "reportcommon"]),
                ("Audit", vec!["audit", "reportcommon"]),
            ]),
            records: vec![
                record("reportdata", Some("2021-06-01T09:30:00+0000")),
                record("reportcommon", Some("2021-06-02T00:10:00+0000")),
                record("audit", Some("2021-06-01T23:59:59+0000")),
            ],
        };
        let adapter = Collection::new(Arc::new(catalog), &order_file, "the deployment portal");
        let query = QueryRecord::new(1, "collection", "what was promoted?");
        let params: ParamMap = [("id", "1"), ("promotion_stage", "prod"), ("date", "2021-06-01")]
            .into_iter()
            .collect();

        assert_eq!(
            adapter.process(&query, &params).await.unwrap(),
            "reportdata, audit"
        );
    }

    #[tokio::test]
    async fn no_matches_is_a_fixed_reply_not_an_error() {
        let dir = tempdir().unwrap();
        let order_file = write_order_file(dir.path(), &["SAS-REPORTDATA"]);
        let catalog = StubCatalog {
            roots: HashMap::from([("SAS-REPORTDATA", "Report Data")]),
            units_by_root: HashMap::from([("Report Data", vec!["reportdata"])]),
            records: vec![record("reportdata", Some("2021-06-02T00:00:00+0000"))],
        };
        let adapter = Collection::new(Arc::new(catalog), &order_file, "the deployment portal");
        let query = QueryRecord::new(1, "collection", "what was promoted?");
        let params: ParamMap = [("promotion_stage", "prod"), ("date", "2021-06-01")]
            .into_iter()
            .collect();

        assert_eq!(adapter.process(&query, &params).await.unwrap(), "No promotion events found.");
    }

    #[tokio::test]
    async fn unresolvable_orderables_are_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let order_file = write_order_file(dir.path(), &["SAS-GHOST", "SAS-AUDIT"]);
        let catalog = StubCatalog {
            roots: HashMap::from([("SAS-AUDIT", "Audit")]),
            units_by_root: HashMap::from([("Audit", vec!["audit"])]),
            records: vec![record("audit", Some("2021-06-01T12:00:00+0000"))],
        };
        let adapter = Collection::new(Arc::new(catalog), &order_file, "the deployment portal");
        let query = QueryRecord::new(1, "collection", "what was promoted?");
        let params: ParamMap = [("promotion_stage", "prod"), ("date", "2021-06-01")]
            .into_iter()
            .collect();

        assert_eq!(adapter.process(&query, &params).await.unwrap(), "audit");
    }

    #[tokio::test]
    async fn units_without_promotion_timestamps_never_match() {
        let dir = tempdir().unwrap();
        let order_file = write_order_file(dir.path(), &["SAS-AUDIT"]);
        let catalog = StubCatalog {
            roots: HashMap::from([("SAS-AUDIT", "Audit")]),
            units_by_root: HashMap::from([("Audit", vec!["audit"])]),
            records: vec![record("audit", None)],
        };
        let adapter = Collection::new(Arc::new(catalog), &order_file, "the deployment portal");
        let query = QueryRecord::new(1, "collection", "what was promoted?");
        let params: ParamMap = [("promotion_stage", "prod"), ("date", "2021-06-01")]
            .into_iter()
            .collect();

        assert_eq!(adapter.process(&query, &params).await.unwrap(), "No promotion events found.");
    }
}
