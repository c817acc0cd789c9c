//! The logic adapter contract and the user parameter map.

use crate::error::{AnswerError, AnswerResult};
use crate::store::QueryRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved parameter key carrying the query id in an answer request.
pub const QUERY_ID_KEY: &str = "id";

/// User-supplied parameter values keyed by requirement name, plus the query
/// id under [`QUERY_ID_KEY`]. Lookup is by name only; the order parameters
/// arrive in carries no meaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamMap(HashMap<String, String>);

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from a JSON object, coercing scalar values to strings
    /// (clients send ids and counts as numbers). Non-object payloads and
    /// nested values are rejected.
    pub fn from_json(value: &serde_json::Value) -> AnswerResult<Self> {
        let object = value.as_object().ok_or_else(|| AnswerError::InvalidParameter {
            name: "body".to_string(),
            reason: "expected a JSON object of parameter values".to_string(),
        })?;
        let mut map = HashMap::with_capacity(object.len());
        for (name, value) in object {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(AnswerError::InvalidParameter {
                        name: name.clone(),
                        reason: "expected a scalar value".to_string(),
                    })
                }
            };
            map.insert(name.clone(), text);
        }
        Ok(Self(map))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Value for a declared requirement, or the named missing-parameter
    /// error.
    pub fn require(&self, name: &str) -> AnswerResult<&str> {
        self.get(name)
            .ok_or_else(|| AnswerError::MissingParameter(name.to_string()))
    }

    /// The raw query id string under the reserved key, if present.
    pub fn query_id(&self) -> Option<&str> {
        self.get(QUERY_ID_KEY)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Capability contract every logic adapter implements.
///
/// One adapter owns exactly one category. The dispatcher resolves a query
/// record to its owning adapter and threads the matched record into
/// [`LogicAdapter::process`] as call context, so adapters carry no
/// per-request mutable state and stay safe behind shared references.
#[async_trait::async_trait]
pub trait LogicAdapter: Send + Sync {
    /// The query family this adapter answers.
    fn category(&self) -> &str;

    /// Parameter names the user must supply, in presentation order.
    fn requirements(&self) -> &[&'static str];

    /// True when this adapter owns the record's category. Exact equality,
    /// no keyword sniffing of the query text.
    fn can_process(&self, record: &QueryRecord) -> bool {
        record.category == self.category()
    }

    /// Computes the answer for a matched record. The dispatcher has already
    /// checked that every declared requirement is present in `params`;
    /// value validation stays with the adapter.
    async fn process(&self, query: &QueryRecord, params: &ParamMap) -> AnswerResult<String>;
}
