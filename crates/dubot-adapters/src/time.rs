//! Cross-version promotion-latency aggregation.
//!
//! Answers how long a unit takes to move between two promotion stages,
//! averaged over the last K versions that have a recorded timestamp at both
//! stages. Stage records live independently per stage, so the two
//! timestamps are looked up separately for every version; the latest
//! version at one stage is not necessarily the latest at the other.

use crate::sources::{UnitCatalog, UnitFilter};
use chrono::NaiveDateTime;
use dubot_core::{AnswerError, AnswerResult, LogicAdapter, ParamMap, QueryRecord};
use std::collections::HashSet;
use std::sync::Arc;

const CATEGORY: &str = "time";
const REQUIREMENTS: &[&str] = &[
    "du_name",
    "first_promotion_stage",
    "second_promotion_stage",
    "num_last_promotions_to_analyze",
];

/// Wall-clock part of a promotion timestamp. The catalog appends a zone
/// offset; the first 19 characters are the part that gets compared.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses the leading wall-clock part of a promotion timestamp, dropping
/// the trailing offset. Timezones are deliberately not normalized; the
/// catalog reports every stage in the same zone.
pub(crate) fn parse_promotion_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let wall_clock = raw.get(..19)?;
    NaiveDateTime::parse_from_str(wall_clock, TIMESTAMP_FORMAT).ok()
}

/// Removes duplicate versions, keeping first-seen order. The catalog
/// returns one record per stage, so a version usually appears several
/// times.
pub(crate) fn dedup_first_seen(versions: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    versions
        .into_iter()
        .filter(|version| seen.insert(version.clone()))
        .collect()
}

/// Renders a second count as `D days, H hours, M minutes and S seconds`.
pub(crate) fn format_duration_secs(total_secs: i64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    format!("{days} days, {hours} hours, {minutes} minutes and {seconds} seconds")
}

/// Average promotion time between two stages over the last K fully-recorded
/// versions of a unit.
pub struct Time {
    catalog: Arc<dyn UnitCatalog>,
    reference: String,
}

impl Time {
    pub fn new(catalog: Arc<dyn UnitCatalog>, reference: impl Into<String>) -> Self {
        Self {
            catalog,
            reference: reference.into(),
        }
    }

    fn upstream(&self, err: impl ToString) -> AnswerError {
        AnswerError::upstream("your DU", &self.reference, err.to_string())
    }

    /// Version history of the unit, newest first, duplicates removed.
    async fn version_history(&self, du_name: &str) -> AnswerResult<Vec<String>> {
        let filter = UnitFilter::named(du_name).newest_first();
        let units = self
            .catalog
            .search_units(&filter)
            .await
            .map_err(|err| self.upstream(err))?;
        Ok(dedup_first_seen(
            units.into_iter().filter_map(|unit| unit.version),
        ))
    }

    /// Promotion timestamp of one version at one stage. `None` when the
    /// version never reached the stage; an unparseable timestamp is a
    /// catalog fault, not a miss.
    async fn promoted_at(
        &self,
        du_name: &str,
        version: &str,
        stage: &str,
    ) -> AnswerResult<Option<NaiveDateTime>> {
        let filter = UnitFilter::named(du_name)
            .with_version(version)
            .at_stage(stage);
        let units = self
            .catalog
            .search_units(&filter)
            .await
            .map_err(|err| self.upstream(err))?;
        match units.into_iter().find_map(|unit| unit.promoted_at) {
            None => Ok(None),
            Some(raw) => parse_promotion_timestamp(&raw).map(Some).ok_or_else(|| {
                self.upstream(format!("unparseable promotion timestamp '{raw}'"))
            }),
        }
    }
}

#[async_trait::async_trait]
impl LogicAdapter for Time {
    fn category(&self) -> &str {
        CATEGORY
    }

    fn requirements(&self) -> &[&'static str] {
        REQUIREMENTS
    }

    async fn process(&self, _query: &QueryRecord, params: &ParamMap) -> AnswerResult<String> {
        let du_name = params.require("du_name")?;
        let first_stage = params.require("first_promotion_stage")?;
        let second_stage = params.require("second_promotion_stage")?;
        let raw_count = params.require("num_last_promotions_to_analyze")?;
        let target: usize = raw_count
            .trim()
            .parse()
            .ok()
            .filter(|count| *count >= 1)
            .ok_or_else(|| AnswerError::InvalidParameter {
                name: "num_last_promotions_to_analyze".to_string(),
                reason: format!("expected a whole number of at least 1, got '{raw_count}'"),
            })?;

        let versions = self.version_history(du_name).await?;
        if versions.is_empty() {
            return Err(AnswerError::not_found("your DU", &self.reference));
        }

        // Walk newest to oldest. A version counts only when both stages
        // have a parseable timestamp; otherwise the walk moves on.
        let mut latencies: Vec<i64> = Vec::with_capacity(target);
        for version in &versions {
            let first = self.promoted_at(du_name, version, first_stage).await?;
            let second = self.promoted_at(du_name, version, second_stage).await?;
            let (Some(first), Some(second)) = (first, second) else {
                tracing::debug!(
                    target: "dubot::adapter",
                    version = %version,
                    "version lacks promotion data at both stages, skipping"
                );
                continue;
            };
            latencies.push((second - first).num_seconds().abs());
            if latencies.len() == target {
                break;
            }
        }

        if latencies.is_empty() {
            return Err(AnswerError::not_found(
                format!(
                    "promotion data for {du_name} at both {first_stage} and {second_stage}"
                ),
                &self.reference,
            ));
        }
        if latencies.len() < target {
            return Err(AnswerError::not_found(
                format!(
                    "{target} versions of {du_name} with promotion data at both {first_stage} \
                     and {second_stage} (only {} qualified)",
                    latencies.len()
                ),
                &self.reference,
            ));
        }

        let average_secs = latencies.iter().sum::<i64>() / target as i64;
        Ok(format!(
            "Average time to promote from {first_stage} to {second_stage}, \
             based on the last {target} promotions: {}",
            format_duration_secs(average_secs)
        ))
    }
}
