//! Membership test of a sellable unit against the order definition file.

use dubot_core::{AnswerError, AnswerResult, LogicAdapter, ParamMap, QueryRecord};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CATEGORY: &str = "orderables";
const REQUIREMENTS: &[&str] = &["sellable_unit_name"];

const FOUND: &str = "Yes, found.";
const NOT_FOUND: &str = "No, not found.";

/// Shape of the order definition file: a YAML document with an `orderables`
/// list of sellable unit names, conventionally in upper case.
#[derive(Debug, Deserialize)]
struct OrderDefinition {
    orderables: Vec<String>,
}

/// Reads the orderable names from a YAML order definition, in file order.
pub(crate) fn load_order_definition(path: &Path) -> Result<Vec<String>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("{}: {err}", path.display()))?;
    let definition: OrderDefinition =
        serde_yaml::from_str(&raw).map_err(|err| format!("{}: {err}", path.display()))?;
    Ok(definition.orderables)
}

/// Answers whether a sellable unit is in the order. The file is re-read on
/// every call so edits take effect without a restart; the requested name is
/// upper-cased before the membership test.
pub struct Orderables {
    order_file: PathBuf,
    reference: String,
}

impl Orderables {
    pub fn new(order_file: impl Into<PathBuf>, reference: impl Into<String>) -> Self {
        Self {
            order_file: order_file.into(),
            reference: reference.into(),
        }
    }
}

#[async_trait::async_trait]
impl LogicAdapter for Orderables {
    fn category(&self) -> &str {
        CATEGORY
    }

    fn requirements(&self) -> &[&'static str] {
        REQUIREMENTS
    }

    async fn process(&self, _query: &QueryRecord, params: &ParamMap) -> AnswerResult<String> {
        let name = params.require("sellable_unit_name")?.to_uppercase();
        let orderables = load_order_definition(&self.order_file).map_err(|detail| {
            AnswerError::upstream("the order definition", &self.reference, detail)
        })?;
        if orderables.iter().any(|entry| *entry == name) {
            Ok(FOUND.to_string())
        } else {
            Ok(NOT_FOUND.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dubot_core::{AdapterRegistry, Bot, QueryStore};
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn write_order_file(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("order.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_keeps_file_order() {
        let dir = tempdir().unwrap();
        let path = write_order_file(
            dir.path(),
            "orderables:\n  - SAS-REPORTDATA\n  - SAS-AUDIT\n  - SAS-CASMGMT\n",
        );
        assert_eq!(
            load_order_definition(&path).unwrap(),
            vec!["SAS-REPORTDATA", "SAS-AUDIT", "SAS-CASMGMT"]
        );
    }

    #[tokio::test]
    async fn membership_is_case_insensitive_on_the_request() {
        let dir = tempdir().unwrap();
        let path = write_order_file(dir.path(), "orderables:\n  - SAS-REPORTDATA\n");
        let adapter = Orderables::new(&path, "the order portal");
        let query = QueryRecord::new(4, "orderables", "in the order?");

        let params: ParamMap = [("sellable_unit_name", "sas-ReportData")].into_iter().collect();
        assert_eq!(adapter.process(&query, &params).await.unwrap(), "Yes, found.");

        let params: ParamMap = [("sellable_unit_name", "sas-unknown")].into_iter().collect();
        assert_eq!(adapter.process(&query, &params).await.unwrap(), "No, not found.");
    }

    #[tokio::test]
    async fn unreadable_order_file_reports_the_reference() {
        let dir = tempdir().unwrap();
        let adapter = Orderables::new(dir.path().join("missing.yaml"), "the order portal");
        let query = QueryRecord::new(4, "orderables", "in the order?");
        let params: ParamMap = [("sellable_unit_name", "sas-audit")].into_iter().collect();

        let err = adapter.process(&query, &params).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "Sorry, I could not find the order definition. Please try again or refer to the order portal."
        );
    }

    // End to end through the dispatcher: store record, resolve by id, answer.
    #[tokio::test]
    async fn answers_by_query_id_through_the_bot() {
        let store_dir = tempdir().unwrap();
        let order_dir = tempdir().unwrap();
        let path = write_order_file(order_dir.path(), "orderables:\n  - SAS-REPORTDATA\n");

        let store = Arc::new(QueryStore::open_path(store_dir.path()).unwrap());
        store
            .insert(&QueryRecord::new(7, "orderables", "Is my unit in the order?"))
            .unwrap();
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(Orderables::new(&path, "the order portal")));
        let bot = Bot::new(store, registry);

        assert_eq!(
            bot.specify_requirements("7").unwrap(),
            vec!["sellable_unit_name"]
        );
        let params: ParamMap = [("id", "7"), ("sellable_unit_name", "sas-reportdata")]
            .into_iter()
            .collect();
        assert_eq!(bot.answer(&params).await.unwrap(), "Yes, found.");
    }
}
