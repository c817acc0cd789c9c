//! Currently supported cadences across the promotion stages.

use crate::sources::UnitCatalog;
use chrono::Utc;
use dubot_core::{AnswerError, AnswerResult, LogicAdapter, ParamMap, QueryRecord};
use std::sync::Arc;

const CATEGORY: &str = "support";
const REQUIREMENTS: &[&str] = &[];

/// Stage display order. Every stage is reported even when it has no active
/// windows.
const STAGES: [&str; 4] = ["TESTREADY", "VERIFIED", "PROD", "SHIPPED"];

/// Answers which cadences are under active support, one line per promotion
/// stage. Takes no user parameters; "now" is the wall clock at call time.
pub struct Support {
    catalog: Arc<dyn UnitCatalog>,
    reference: String,
}

impl Support {
    pub fn new(catalog: Arc<dyn UnitCatalog>, reference: impl Into<String>) -> Self {
        Self {
            catalog,
            reference: reference.into(),
        }
    }
}

#[async_trait::async_trait]
impl LogicAdapter for Support {
    fn category(&self) -> &str {
        CATEGORY
    }

    fn requirements(&self) -> &[&'static str] {
        REQUIREMENTS
    }

    async fn process(&self, _query: &QueryRecord, _params: &ParamMap) -> AnswerResult<String> {
        let now = Utc::now();
        let mut lines = Vec::with_capacity(STAGES.len());
        let mut any_active = false;
        for stage in STAGES {
            let windows = self.catalog.active_windows(stage, now).await.map_err(|err| {
                AnswerError::upstream("the supported cadences", &self.reference, err.to_string())
            })?;
            any_active |= !windows.is_empty();
            let cadences = windows
                .iter()
                .map(|window| format!("{}:{}", window.name, window.version))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("{stage}: {cadences}"));
        }
        if !any_active {
            return Err(AnswerError::not_found(
                "the supported cadences",
                &self.reference,
            ));
        }
        Ok(lines.join(",\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{SourceResult, SupportWindow, UnitFilter, UnitRecord};
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;

    struct StubCatalog {
        windows: HashMap<&'static str, Vec<SupportWindow>>,
    }

    fn window(name: &str, version: &str) -> SupportWindow {
        SupportWindow {
            name: name.to_string(),
            version: version.to_string(),
            end_at: "2030-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[async_trait::async_trait]
    impl UnitCatalog for StubCatalog {
        async fn search_units(&self, _filter: &UnitFilter) -> SourceResult<Vec<UnitRecord>> {
            Ok(Vec::new())
        }

        async fn resolve_root_name(&self, _orderable: &str) -> SourceResult<Option<String>> {
            Ok(None)
        }

        async fn units_for_root(&self, _root_name: &str) -> SourceResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn active_windows(
            &self,
            stage: &str,
            _now: DateTime<Utc>,
        ) -> SourceResult<Vec<SupportWindow>> {
            Ok(self.windows.get(stage).cloned().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn reports_every_stage_even_when_empty() {
        let catalog = StubCatalog {
            windows: HashMap::from([
                ("TESTREADY", vec![window("cadence1", "2021.1.6"), window("cadence2", "2021.1.5")]),
                ("PROD", vec![window("cadence1", "2021.1.4")]),
            ]),
        };
        let adapter = Support::new(Arc::new(catalog), "the deployment portal");
        let query = QueryRecord::new(6, "support", "what is supported?");

        let answer = adapter.process(&query, &ParamMap::new()).await.unwrap();
        assert_eq!(
            answer,
            "TESTREADY: cadence1:2021.1.6, cadence2:2021.1.5,\n\
             VERIFIED: ,\n\
             PROD: cadence1:2021.1.4,\n\
             SHIPPED: "
        );
    }

    #[tokio::test]
    async fn no_active_windows_anywhere_is_not_found() {
        let adapter = Support::new(
            Arc::new(StubCatalog {
                windows: HashMap::new(),
            }),
            "the deployment portal",
        );
        let query = QueryRecord::new(6, "support", "what is supported?");

        let err = adapter.process(&query, &ParamMap::new()).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "Sorry, I could not find the supported cadences. Please try again or refer to the deployment portal."
        );
    }
}
