//! Test-engineer lookup from the test-container registry.

use crate::sources::TestRegistrySource;
use crate::util::upsert_ordered;
use dubot_core::{AnswerError, AnswerResult, LogicAdapter, ParamMap, QueryRecord};
use std::sync::Arc;

const CATEGORY: &str = "teemo";
const REQUIREMENTS: &[&str] = &["du_name"];

/// Reformats a registry contact, `Jane Doe <jane@example.com>` to
/// `Jane Doe, jane@example.com`.
pub(crate) fn format_maintainer(raw: &str) -> String {
    raw.replace(" <", ", ").replace('>', "")
}

/// Answers who maintains the test containers registered for a unit, one
/// line per container description. Only exact unit-name matches count.
pub struct Teemo {
    registry: Arc<dyn TestRegistrySource>,
    reference: String,
}

impl Teemo {
    pub fn new(registry: Arc<dyn TestRegistrySource>, reference: impl Into<String>) -> Self {
        Self {
            registry,
            reference: reference.into(),
        }
    }
}

#[async_trait::async_trait]
impl LogicAdapter for Teemo {
    fn category(&self) -> &str {
        CATEGORY
    }

    fn requirements(&self) -> &[&'static str] {
        REQUIREMENTS
    }

    async fn process(&self, _query: &QueryRecord, params: &ParamMap) -> AnswerResult<String> {
        let du_name = params.require("du_name")?;
        let containers = self.registry.registered_containers().await.map_err(|err| {
            AnswerError::upstream("your DU", &self.reference, err.to_string())
        })?;

        let mut maintainers: Vec<(String, String)> = Vec::new();
        for container in containers {
            if container.du_name == du_name {
                upsert_ordered(
                    &mut maintainers,
                    container.description,
                    format_maintainer(&container.maintainer),
                );
            }
        }
        if maintainers.is_empty() {
            return Err(AnswerError::not_found("your DU", &self.reference));
        }
        Ok(maintainers
            .into_iter()
            .map(|(description, maintainer)| format!("{description}: {maintainer}"))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
