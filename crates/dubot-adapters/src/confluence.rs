//! Cluster-to-Kubernetes-version lookup from a wiki page.

use crate::sources::WikiSource;
use dubot_core::{AnswerError, AnswerResult, LogicAdapter, ParamMap, QueryRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

const CATEGORY: &str = "confluence";
const REQUIREMENTS: &[&str] = &["cadence_cluster"];

/// Table-cell fragments of the form `>Stable Cluster - K8S 1.20.1<` in the
/// page markup. The minor version on the page is always two digits.
static CLUSTER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">([^>]* - K8S [0-9].[0-9][0-9].[0-9][^<]*)<").unwrap());

/// Extracts the cluster table from a raw page body. Keys are lower-cased
/// cluster names; a cluster listed twice keeps the later version.
pub(crate) fn extract_cluster_versions(body: &str) -> HashMap<String, String> {
    let mut table = HashMap::new();
    for captures in CLUSTER_PATTERN.captures_iter(body) {
        let fragment = &captures[1];
        let mut parts = fragment.split(" - ");
        let (Some(cluster), Some(version)) = (parts.next(), parts.next()) else {
            continue;
        };
        table.insert(cluster.to_lowercase(), version.to_string());
    }
    table
}

/// Answers which Kubernetes version a cadence cluster runs, read from the
/// cluster table on one wiki page.
pub struct Confluence {
    wiki: Arc<dyn WikiSource>,
    page_id: String,
    reference: String,
}

impl Confluence {
    pub fn new(
        wiki: Arc<dyn WikiSource>,
        page_id: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            wiki,
            page_id: page_id.into(),
            reference: reference.into(),
        }
    }
}

#[async_trait::async_trait]
impl LogicAdapter for Confluence {
    fn category(&self) -> &str {
        CATEGORY
    }

    fn requirements(&self) -> &[&'static str] {
        REQUIREMENTS
    }

    async fn process(&self, _query: &QueryRecord, params: &ParamMap) -> AnswerResult<String> {
        let cluster = params.require("cadence_cluster")?.to_lowercase();
        let body = self.wiki.page_body(&self.page_id).await.map_err(|err| {
            AnswerError::upstream("your cluster", &self.reference, err.to_string())
        })?;
        extract_cluster_versions(&body)
            .remove(&cluster)
            .ok_or_else(|| AnswerError::not_found("your cluster", &self.reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{SourceError, SourceResult};

    const PAGE: &str = concat!(
        r#"{"body":{"storage":{"value":"<td>Stable Cluster - K8S 1.20.1</td>"#,
        r#"<td>Release TestReady (TR) Cluster - K8S 1.19.8</td>"#,
        r#"<td>Edge Cluster - K8S 1.9.8</td>"#,
        r#"<td>Not a cluster cell</td>"}}}"#
    );

    #[test]
    fn extracts_clusters_with_lowercased_keys() {
        let table = extract_cluster_versions(PAGE);
        assert_eq!(table.get("stable cluster").map(String::as_str), Some("K8S 1.20.1"));
        assert_eq!(
            table.get("release testready (tr) cluster").map(String::as_str),
            Some("K8S 1.19.8")
        );
    }

    #[test]
    fn single_digit_minor_versions_are_not_in_the_table() {
        // The page's table always carries two-digit minors; anything else is
        // assumed to be prose, not a cluster cell.
        let table = extract_cluster_versions(PAGE);
        assert!(!table.contains_key("edge cluster"));
    }

    struct StubWiki {
        body: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl WikiSource for StubWiki {
        async fn page_body(&self, _page_id: &str) -> SourceResult<String> {
            match self.body {
                Some(body) => Ok(body.to_string()),
                None => Err(SourceError::Status(503)),
            }
        }
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let adapter = Confluence::new(
            Arc::new(StubWiki { body: Some(PAGE) }),
            "12345",
            "the cluster wiki",
        );
        let query = QueryRecord::new(2, "confluence", "what k8s version?");
        let params: ParamMap = [("cadence_cluster", "STABLE Cluster")].into_iter().collect();

        assert_eq!(adapter.process(&query, &params).await.unwrap(), "K8S 1.20.1");
    }

    #[tokio::test]
    async fn unknown_cluster_and_wiki_outage_read_the_same_to_users() {
        let query = QueryRecord::new(2, "confluence", "what k8s version?");
        let params: ParamMap = [("cadence_cluster", "mystery cluster")].into_iter().collect();
        let expected =
            "Sorry, I could not find your cluster. Please try again or refer to the cluster wiki.";

        let adapter = Confluence::new(
            Arc::new(StubWiki { body: Some(PAGE) }),
            "12345",
            "the cluster wiki",
        );
        let err = adapter.process(&query, &params).await.unwrap_err();
        assert!(matches!(err, AnswerError::NotFound { .. }));
        assert_eq!(err.user_message(), expected);

        let adapter = Confluence::new(Arc::new(StubWiki { body: None }), "12345", "the cluster wiki");
        let err = adapter.process(&query, &params).await.unwrap_err();
        assert!(matches!(err, AnswerError::Upstream { .. }));
        assert_eq!(err.user_message(), expected);
    }
}
