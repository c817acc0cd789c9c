//! Single-unit catalog lookups: version, promotion time, lifecycle version.

use crate::sources::{UnitCatalog, UnitFilter, UnitRecord};
use dubot_core::{AnswerError, AnswerResult, LogicAdapter, ParamMap, QueryRecord};
use std::sync::Arc;

const CATEGORY: &str = "du_queries";
const REQUIREMENTS: &[&str] = &["du_name", "du_promotion_stage", "feature"];

/// Feature of a unit record the user can ask for. Chosen by an explicit
/// request parameter; the stored query text plays no part in the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFeature {
    Version,
    PromotedAt,
    LifecycleVersion,
}

impl UnitFeature {
    /// Accepts `version`, `promoted`, and `lifecycle version` (space or
    /// underscore, any case).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace('_', " ").as_str() {
            "version" => Some(Self::Version),
            "promoted" | "promoted at" => Some(Self::PromotedAt),
            "lifecycle version" | "lifecycle" => Some(Self::LifecycleVersion),
            _ => None,
        }
    }

    /// Label leading the answer line.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Version => "Version",
            Self::PromotedAt => "Promoted",
            Self::LifecycleVersion => "Lifecycle version",
        }
    }

    fn pick(&self, unit: &UnitRecord) -> Option<String> {
        match self {
            Self::Version => unit.version.clone(),
            Self::PromotedAt => unit.promoted_at.clone(),
            Self::LifecycleVersion => unit.lifecycle_version.clone(),
        }
    }
}

/// Answers one feature of one unit at one promotion stage.
pub struct DuQueries {
    catalog: Arc<dyn UnitCatalog>,
    reference: String,
}

impl DuQueries {
    pub fn new(catalog: Arc<dyn UnitCatalog>, reference: impl Into<String>) -> Self {
        Self {
            catalog,
            reference: reference.into(),
        }
    }
}

#[async_trait::async_trait]
impl LogicAdapter for DuQueries {
    fn category(&self) -> &str {
        CATEGORY
    }

    fn requirements(&self) -> &[&'static str] {
        REQUIREMENTS
    }

    async fn process(&self, _query: &QueryRecord, params: &ParamMap) -> AnswerResult<String> {
        let du_name = params.require("du_name")?;
        let stage = params.require("du_promotion_stage")?;
        let raw_feature = params.require("feature")?;
        let feature = UnitFeature::parse(raw_feature).ok_or_else(|| {
            AnswerError::InvalidParameter {
                name: "feature".to_string(),
                reason: format!(
                    "expected one of version, promoted, lifecycle version; got '{raw_feature}'"
                ),
            }
        })?;

        let filter = UnitFilter::named(du_name).at_stage(stage);
        let units = self.catalog.search_units(&filter).await.map_err(|err| {
            AnswerError::upstream("your DU", &self.reference, err.to_string())
        })?;
        let value = units
            .iter()
            .find_map(|unit| feature.pick(unit))
            .ok_or_else(|| AnswerError::not_found("your DU", &self.reference))?;
        Ok(format!("{}: {}", feature.label(), value))
    }
}
