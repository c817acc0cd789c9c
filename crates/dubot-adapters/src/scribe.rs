//! Recent-commit summaries for a unit's primary repository.

use crate::sources::{CommitHistorySource, CommitRecord};
use dubot_core::{AnswerError, AnswerResult, LogicAdapter, ParamMap, QueryRecord};
use std::sync::Arc;

const CATEGORY: &str = "scribe";
const REQUIREMENTS: &[&str] = &["du_name", "num_recent_commits"];

/// Canonical commits-API URL for a repository page URL.
///
/// `https://host/{namespace}/{project}` becomes
/// `{api_base}/projects/{namespace}%2F{project}/repository/commits?with_stats=true`.
/// URLs without both path segments are unrecognizable.
pub(crate) fn canonical_commits_url(api_base: &str, repo_url: &str) -> Option<String> {
    let mut segments = repo_url.split('/');
    let namespace = segments.nth(3)?;
    let project = segments.next()?;
    if namespace.is_empty() || project.is_empty() {
        return None;
    }
    Some(format!(
        "{}/projects/{namespace}%2F{project}/repository/commits?with_stats=true",
        api_base.trim_end_matches('/')
    ))
}

fn format_commits(repo_url: &str, commits: &[CommitRecord], extra_urls: &[String]) -> String {
    let mut lines = vec![format!("Evaluating {repo_url}")];
    for (index, commit) in commits.iter().enumerate() {
        lines.push(format!("Commit #{}:", index + 1));
        lines.push(format!("  Committer name: {}", commit.committer_name));
        lines.push(format!("  Committed date: {}", commit.committed_date));
        lines.push(format!("  ID: {}", commit.id));
        lines.push(format!("  Title: {}", commit.title));
        lines.push(format!(
            "  Stats: additions: {}, deletions: {}, total: {}",
            commit.stats.additions, commit.stats.deletions, commit.stats.total
        ));
    }
    if !extra_urls.is_empty() {
        lines.push("Other links found.".to_string());
        lines.push(extra_urls.join(", "));
    }
    lines.join("\n")
}

/// Answers with the most recent commits of a unit's primary repository.
/// Secondary repository URLs are listed, not expanded.
pub struct Scribe {
    commits: Arc<dyn CommitHistorySource>,
    repo_api_base: String,
    reference: String,
}

impl Scribe {
    pub fn new(
        commits: Arc<dyn CommitHistorySource>,
        repo_api_base: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            commits,
            repo_api_base: repo_api_base.into(),
            reference: reference.into(),
        }
    }
}

#[async_trait::async_trait]
impl LogicAdapter for Scribe {
    fn category(&self) -> &str {
        CATEGORY
    }

    fn requirements(&self) -> &[&'static str] {
        REQUIREMENTS
    }

    async fn process(&self, _query: &QueryRecord, params: &ParamMap) -> AnswerResult<String> {
        let du_name = params.require("du_name")?;
        let raw_count = params.require("num_recent_commits")?;
        let count: usize = raw_count.trim().parse().map_err(|_| {
            AnswerError::InvalidParameter {
                name: "num_recent_commits".to_string(),
                reason: format!("expected a whole number, got '{raw_count}'"),
            }
        })?;

        let urls = self.commits.repository_urls(du_name).await.map_err(|err| {
            AnswerError::upstream("your DU", &self.reference, err.to_string())
        })?;
        let Some(primary) = urls.first() else {
            return Err(AnswerError::not_found("your DU", &self.reference));
        };
        let commits_url =
            canonical_commits_url(&self.repo_api_base, primary).ok_or_else(|| {
                AnswerError::upstream(
                    "your DU",
                    &self.reference,
                    format!("unrecognized repository URL '{primary}'"),
                )
            })?;

        let commits = self.commits.recent_commits(&commits_url).await.map_err(|err| {
            AnswerError::upstream("your DU", &self.reference, err.to_string())
        })?;
        let shown: Vec<CommitRecord> = commits.into_iter().take(count).collect();
        Ok(format_commits(primary, &shown, &urls[1..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{CommitStats, SourceResult};
    use std::collections::HashMap;

    #[test]
    fn canonical_url_splits_namespace_and_project() {
        assert_eq!(
            canonical_commits_url(
                "https://git.example.com/api/v4",
                "https://git.example.com/dockerpkg/dkrreportdata"
            )
            .unwrap(),
            "https://git.example.com/api/v4/projects/dockerpkg%2Fdkrreportdata/repository/commits?with_stats=true"
        );
    }

    #[test]
    fn urls_without_two_path_segments_are_rejected() {
        assert!(canonical_commits_url("https://api", "https://git.example.com").is_none());
        assert!(canonical_commits_url("https://api", "https://git.example.com/only").is_none());
        assert!(canonical_commits_url("https://api", "not a url").is_none());
    }

    struct StubCommits {
        urls: Vec<&'static str>,
        commits: HashMap<String, Vec<CommitRecord>>,
    }

    #[async_trait::async_trait]
    impl CommitHistorySource for StubCommits {
        async fn repository_urls(&self, _du_name: &str) -> SourceResult<Vec<String>> {
            Ok(self.urls.iter().map(|url| url.to_string()).collect())
        }

        async fn recent_commits(&self, commits_url: &str) -> SourceResult<Vec<CommitRecord>> {
            Ok(self.commits.get(commits_url).cloned().unwrap_or_default())
        }
    }

    fn commit(id: &str, title: &str) -> CommitRecord {
        CommitRecord {
            committer_name: "Sam Venn".to_string(),
            committed_date: "2021-06-01T10:00:00.000+00:00".to_string(),
            id: id.to_string(),
            title: title.to_string(),
            stats: CommitStats {
                additions: 10,
                deletions: 2,
                total: 12,
            },
        }
    }

    #[tokio::test]
    async fn formats_the_requested_number_of_commits() {
        let api_url = "https://git.example.com/api/v4/projects/dockerpkg%2Fdkrreportdata/repository/commits?with_stats=true";
        let stub = StubCommits {
            urls: vec![
                "https://git.example.com/dockerpkg/dkrreportdata",
                "https://mirror.example.com/dockerpkg/dkrreportdata",
            ],
            commits: HashMap::from([(
                api_url.to_string(),
                vec![commit("abc123", "Fix the build"), commit("def456", "Add metrics")],
            )]),
        };
        let adapter = Scribe::new(
            Arc::new(stub),
            "https://git.example.com/api/v4",
            "the repository browser",
        );
        let query = QueryRecord::new(5, "scribe", "recent changes?");
        let params: ParamMap = [("du_name", "reportdata"), ("num_recent_commits", "1")]
            .into_iter()
            .collect();

        let answer = adapter.process(&query, &params).await.unwrap();
        assert!(answer.starts_with("Evaluating https://git.example.com/dockerpkg/dkrreportdata\n"));
        assert!(answer.contains("Commit #1:"));
        assert!(answer.contains("  Committer name: Sam Venn"));
        assert!(answer.contains("  ID: abc123"));
        assert!(answer.contains("  Stats: additions: 10, deletions: 2, total: 12"));
        // only one commit was requested
        assert!(!answer.contains("Commit #2:"));
        // the mirror shows up as a link, unexpanded
        assert!(answer.contains("Other links found.\nhttps://mirror.example.com/dockerpkg/dkrreportdata"));
    }

    #[tokio::test]
    async fn unit_without_repositories_is_not_found() {
        let adapter = Scribe::new(
            Arc::new(StubCommits {
                urls: Vec::new(),
                commits: HashMap::new(),
            }),
            "https://git.example.com/api/v4",
            "the repository browser",
        );
        let query = QueryRecord::new(5, "scribe", "recent changes?");
        let params: ParamMap = [("du_name", "ghost"), ("num_recent_commits", "3")]
            .into_iter()
            .collect();

        let err = adapter.process(&query, &params).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "Sorry, I could not find your DU. Please try again or refer to the repository browser."
        );
    }

    #[tokio::test]
    async fn commit_count_must_be_a_whole_number() {
        let adapter = Scribe::new(
            Arc::new(StubCommits {
                urls: Vec::new(),
                commits: HashMap::new(),
            }),
            "https://git.example.com/api/v4",
            "the repository browser",
        );
        let query = QueryRecord::new(5, "scribe", "recent changes?");
        let params: ParamMap = [("du_name", "reportdata"), ("num_recent_commits", "a few")]
            .into_iter()
            .collect();

        let err = adapter.process(&query, &params).await.unwrap_err();
        assert!(matches!(
            err,
            AnswerError::InvalidParameter { ref name, .. } if name == "num_recent_commits"
        ));
    }
}
