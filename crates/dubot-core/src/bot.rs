//! Dispatcher: resolves a query id to its owning adapter and runs it.

use crate::adapter::{LogicAdapter, ParamMap};
use crate::error::{AnswerError, AnswerResult};
use crate::store::{QueryRecord, QueryStore, StoreError};
use std::sync::Arc;

/// Registry of logic adapters consulted in registration order.
///
/// Resolution is first-match-wins, so registration order is priority order.
/// Two registered adapters must never share a category: the later one would
/// be shadowed for every query of that category.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn LogicAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    pub fn register(&mut self, adapter: Arc<dyn LogicAdapter>) {
        self.adapters.push(adapter);
    }

    /// First registered adapter whose category matches the record.
    pub fn owner_of(&self, record: &QueryRecord) -> Option<Arc<dyn LogicAdapter>> {
        self.adapters
            .iter()
            .find(|adapter| adapter.can_process(record))
            .cloned()
    }

    /// Categories of all registered adapters, in priority order.
    pub fn categories(&self) -> Vec<String> {
        self.adapters
            .iter()
            .map(|adapter| adapter.category().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The bot facade: query store plus adapter registry.
///
/// Exposes the three operations of the question-answering surface: listing
/// supported query texts, naming the requirements of one query, and
/// computing an answer. Requests never run concurrently inside one call;
/// each answer is a single sequential pass.
pub struct Bot {
    store: Arc<QueryStore>,
    registry: AdapterRegistry,
}

impl Bot {
    pub fn new(store: Arc<QueryStore>, registry: AdapterRegistry) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &Arc<QueryStore> {
        &self.store
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Display texts of every supported query.
    pub fn supported_query_texts(&self) -> Result<Vec<String>, StoreError> {
        self.store.all_texts()
    }

    /// Looks up the record for a raw id string. Every failure mode (a
    /// non-numeric id, an unknown id, a store fault) collapses into
    /// `Unsupported`; callers cannot tell them apart, by contract.
    fn resolve(&self, raw_id: &str) -> AnswerResult<QueryRecord> {
        let id: u64 = raw_id.trim().parse().map_err(|_| AnswerError::Unsupported)?;
        match self.store.get_by_id(id) {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(AnswerError::Unsupported),
            Err(err) => {
                tracing::warn!(target: "dubot::bot", id, error = %err, "query lookup failed");
                Err(AnswerError::Unsupported)
            }
        }
    }

    /// Requirement names for the chosen query, in the owning adapter's
    /// declared order.
    pub fn specify_requirements(&self, raw_id: &str) -> AnswerResult<Vec<String>> {
        let record = self.resolve(raw_id)?;
        let adapter = self
            .registry
            .owner_of(&record)
            .ok_or(AnswerError::Unsupported)?;
        tracing::info!(
            target: "dubot::bot",
            id = record.id,
            category = %record.category,
            "requirements requested for '{}'",
            record.text
        );
        Ok(adapter
            .requirements()
            .iter()
            .map(|name| name.to_string())
            .collect())
    }

    /// Computes the answer for the query named by the reserved `id` key.
    /// The parameter map is checked against the owning adapter's declared
    /// requirements before `process` runs.
    pub async fn answer(&self, params: &ParamMap) -> AnswerResult<String> {
        let raw_id = params.query_id().ok_or(AnswerError::Unsupported)?;
        let record = self.resolve(raw_id)?;
        let adapter = self
            .registry
            .owner_of(&record)
            .ok_or(AnswerError::Unsupported)?;
        for name in adapter.requirements() {
            if params.get(name).is_none() {
                return Err(AnswerError::MissingParameter((*name).to_string()));
            }
        }
        tracing::info!(
            target: "dubot::bot",
            id = record.id,
            category = %record.category,
            "answering '{}'",
            record.text
        );
        adapter.process(&record, params).await
    }
}
