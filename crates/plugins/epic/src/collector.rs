//! Update collection across issues.

use std::collections::HashSet;
use std::sync::Arc;

use epicwatch_core::{
    DateFilter, EpicCollection, EpicUpdateRecord, IssueFailure, IssueSource, IssueSummary,
    RepoRef, Result,
};
use tracing::{debug, info, warn};

use crate::parser::parse_epic_update;
use crate::template::TemplateMatcher;

/// What to collect.
#[derive(Debug, Clone)]
pub struct CollectRequest {
    pub repo: RepoRef,
    /// Processed in this order; repeats are ignored
    pub issue_numbers: Vec<u64>,
    pub filter: DateFilter,
}

/// Repository-wide collection over an inclusive date window.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub repo: RepoRef,
    /// `YYYY-MM-DD`; also the "updated since" bound for listing issues
    pub start: String,
    pub end: String,
}

/// Gathers parsed EPIC updates from a set of issues.
///
/// Issues are processed one after another. A failing issue is recorded in
/// the collection's failures and does not stop the others.
pub struct EpicCollector {
    source: Arc<dyn IssueSource>,
    matcher: TemplateMatcher,
}

impl EpicCollector {
    pub fn new(source: Arc<dyn IssueSource>) -> Self {
        Self {
            source,
            matcher: TemplateMatcher::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: TemplateMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub async fn collect(&self, request: &CollectRequest) -> EpicCollection {
        let issue_numbers = dedupe(&request.issue_numbers);
        info!(
            repo = %request.repo,
            issues = issue_numbers.len(),
            source = self.source.source_name(),
            "Collecting EPIC updates"
        );

        let mut batch = Batch::default();
        for &number in &issue_numbers {
            let result = match self.source.get_issue(&request.repo, number).await {
                Ok(issue) => self.issue_updates(&request.repo, &issue, &request.filter).await,
                Err(e) => Err(e),
            };
            batch.record(number, result);
        }

        batch.finish(request.repo.to_string(), issue_numbers)
    }

    /// Collect from every open issue updated since `start`.
    ///
    /// Only a failure to list the repository's issues is an error; issues
    /// that fail afterwards land in the collection's failures.
    pub async fn crawl(&self, request: &CrawlRequest) -> Result<EpicCollection> {
        let mut issues = self
            .source
            .list_issues(&request.repo, &request.start)
            .await?;
        issues.sort_by_key(|issue| issue.number);
        info!(
            repo = %request.repo,
            start = %request.start,
            end = %request.end,
            issues = issues.len(),
            source = self.source.source_name(),
            "Crawling repository for EPIC updates"
        );

        let filter = DateFilter::Range {
            start: request.start.clone(),
            end: request.end.clone(),
        };
        let mut batch = Batch::default();
        for issue in &issues {
            let result = self.issue_updates(&request.repo, issue, &filter).await;
            batch.record(issue.number, result);
        }

        let numbers = issues.iter().map(|issue| issue.number).collect();
        Ok(batch.finish(request.repo.to_string(), numbers))
    }

    async fn issue_updates(
        &self,
        repo: &RepoRef,
        issue: &IssueSummary,
        filter: &DateFilter,
    ) -> Result<Vec<EpicUpdateRecord>> {
        let number = issue.number;
        let comments = self.source.get_comments(repo, number).await?;

        let mut records = Vec::new();
        for comment in comments {
            if !self.matcher.is_epic_update(&comment.body) {
                debug!(issue = number, comment = comment.id, "Not an EPIC update");
                continue;
            }

            let parsed = match parse_epic_update(&comment.body) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(
                        issue = number,
                        comment = comment.id,
                        error = %e,
                        "Could not parse EPIC update, skipping"
                    );
                    continue;
                }
            };

            if !filter.matches(parsed.date.as_deref()) {
                debug!(
                    issue = number,
                    comment = comment.id,
                    date = ?parsed.date,
                    "EPIC update outside date filter"
                );
                continue;
            }

            records.push(EpicUpdateRecord {
                issue_number: number,
                issue_title: issue.title.clone(),
                comment_id: comment.id,
                comment_body: comment.body,
                author: comment.author,
                created_at: comment.created_at,
                repo: repo.to_string(),
                parsed_data: parsed,
            });
        }

        Ok(records)
    }
}

/// Per-issue results gathered so far.
#[derive(Default)]
struct Batch {
    updates: Vec<EpicUpdateRecord>,
    failures: Vec<IssueFailure>,
}

impl Batch {
    fn record(&mut self, number: u64, result: Result<Vec<EpicUpdateRecord>>) {
        match result {
            Ok(records) => {
                debug!(issue = number, updates = records.len(), "Issue processed");
                self.updates.extend(records);
            }
            Err(e) => {
                warn!(issue = number, error = %e, "Failed to fetch issue, skipping");
                self.failures.push(IssueFailure::from_error(number, &e));
            }
        }
    }

    fn finish(self, repo: String, issue_numbers: Vec<u64>) -> EpicCollection {
        info!(
            updates = self.updates.len(),
            failed = self.failures.len(),
            "Collection finished"
        );
        EpicCollection::new(repo, issue_numbers, self.updates, self.failures)
    }
}

/// Drop repeated issue numbers, keeping the first occurrence.
fn dedupe(numbers: &[u64]) -> Vec<u64> {
    let mut seen = HashSet::new();
    numbers.iter().copied().filter(|n| seen.insert(*n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use epicwatch_core::{Error, IssueSummary, RawComment};
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        pub Source {}

        #[async_trait]
        impl IssueSource for Source {
            fn source_name(&self) -> &'static str;
            async fn list_issues(&self, repo: &RepoRef, since: &str) -> Result<Vec<IssueSummary>>;
            async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<IssueSummary>;
            async fn get_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<RawComment>>;
        }
    }

    fn update_body(date: &str, note: &str) -> String {
        format!(
            "<!-- epic-update-template -->\n## 🚀 Epic Update\n**Date:** {}\n**Owner:** @alice\n### Status\n- **Current status:** On Track\n- **Progress (%):** 40%\n### What happened since last update\n- {}\n",
            date, note
        )
    }

    fn summary(number: u64) -> IssueSummary {
        IssueSummary {
            number,
            title: format!("EPIC {}", number),
            state: "open".to_string(),
            html_url: None,
        }
    }

    fn comment(id: u64, issue_number: u64, body: &str) -> RawComment {
        RawComment {
            id,
            author: "alice".to_string(),
            created_at: "2025-08-07T09:00:00Z".to_string(),
            body: body.to_string(),
            issue_number,
        }
    }

    fn source() -> MockSource {
        let mut source = MockSource::new();
        source.expect_source_name().return_const("mock");
        source
    }

    fn request(issue_numbers: Vec<u64>, filter: DateFilter) -> CollectRequest {
        CollectRequest {
            repo: RepoRef::new("LDFLK", "launch"),
            issue_numbers,
            filter,
        }
    }

    #[tokio::test]
    async fn test_collects_only_epic_updates() {
        let mut source = source();
        source
            .expect_get_issue()
            .with(mockall::predicate::always(), eq(151))
            .returning(|_, n| Ok(summary(n)));
        source.expect_get_comments().returning(|_, n| {
            Ok(vec![
                comment(1, n, "@epic-update"),
                comment(2, n, &update_body("2025-08-07", "shipped loader")),
                comment(3, n, "Thanks, looks good!"),
            ])
        });

        let collection = EpicCollector::new(Arc::new(source))
            .collect(&request(vec![151], DateFilter::Any))
            .await;

        assert_eq!(collection.total_updates(), 1);
        let record = &collection.updates()[0];
        assert_eq!(record.comment_id, 2);
        assert_eq!(record.issue_title, "EPIC 151");
        assert_eq!(record.repo, "LDFLK/launch");
        assert_eq!(record.author, "alice");
        assert_eq!(record.parsed_data.what_happened, vec!["shipped loader"]);
        assert!(collection.failures().is_empty());
    }

    #[tokio::test]
    async fn test_date_filter_keeps_exact_day() {
        let mut source = source();
        source.expect_get_issue().returning(|_, n| Ok(summary(n)));
        source.expect_get_comments().returning(|_, n| {
            Ok(vec![
                comment(1, n, &update_body("2025-08-07", "first")),
                comment(2, n, &update_body("2025-08-08", "second")),
            ])
        });

        let collection = EpicCollector::new(Arc::new(source))
            .collect(&request(vec![1], DateFilter::On("2025-08-07".to_string())))
            .await;

        assert_eq!(collection.total_updates(), 1);
        assert_eq!(collection.updates()[0].comment_id, 1);
        assert_eq!(
            collection.updates()[0].parsed_data.date.as_deref(),
            Some("2025-08-07")
        );
    }

    #[tokio::test]
    async fn test_date_range_and_undated() {
        let mut source = source();
        source.expect_get_issue().returning(|_, n| Ok(summary(n)));
        source.expect_get_comments().returning(|_, n| {
            Ok(vec![
                comment(1, n, &update_body("2025-08-01", "before")),
                comment(2, n, &update_body("2025-08-05", "inside")),
                comment(3, n, &update_body("2025-08-10", "end")),
                comment(4, n, &update_body("someday", "undated")),
            ])
        });
        let collector = EpicCollector::new(Arc::new(source));

        let ranged = collector
            .collect(&request(
                vec![1],
                DateFilter::Range {
                    start: "2025-08-05".to_string(),
                    end: "2025-08-10".to_string(),
                },
            ))
            .await;
        let ids: Vec<u64> = ranged.updates().iter().map(|u| u.comment_id).collect();
        assert_eq!(ids, vec![2, 3]);

        // Undated records are kept only without a filter
        let all = collector.collect(&request(vec![1], DateFilter::Any)).await;
        assert_eq!(all.total_updates(), 4);
        assert_eq!(all.updates()[3].parsed_data.date, None);
    }

    #[tokio::test]
    async fn test_missing_issue_recorded_as_failure() {
        let mut source = source();
        source.expect_get_issue().returning(|_, n| {
            if n == 999 {
                Err(Error::NotFound("Issue #999 not found".to_string()))
            } else {
                Ok(summary(n))
            }
        });
        source
            .expect_get_comments()
            .returning(|_, n| Ok(vec![comment(n * 10, n, &update_body("2025-08-07", "work"))]));

        let collection = EpicCollector::new(Arc::new(source))
            .collect(&request(vec![151, 999, 152], DateFilter::Any))
            .await;

        let issues: Vec<u64> = collection
            .updates()
            .iter()
            .map(|u| u.issue_number)
            .collect();
        assert_eq!(issues, vec![151, 152]);
        assert_eq!(collection.failures().len(), 1);
        assert_eq!(collection.failures()[0].issue_number, 999);
        assert_eq!(collection.failures()[0].kind, "not_found");
        assert_eq!(collection.issue_numbers(), &[151, 999, 152]);
    }

    #[tokio::test]
    async fn test_comment_fetch_failure_recorded() {
        let mut source = source();
        source.expect_get_issue().returning(|_, n| Ok(summary(n)));
        source.expect_get_comments().returning(|_, _| {
            Err(Error::RateLimited {
                message: "API rate limit exceeded".to_string(),
                retry_after: Some(3600),
            })
        });

        let collection = EpicCollector::new(Arc::new(source))
            .collect(&request(vec![7], DateFilter::Any))
            .await;

        assert!(collection.is_empty());
        assert_eq!(collection.failures()[0].kind, "rate_limited");
    }

    #[tokio::test]
    async fn test_unparseable_update_skipped() {
        let mut source = source();
        source.expect_get_issue().returning(|_, n| Ok(summary(n)));
        source.expect_get_comments().returning(|_, n| {
            Ok(vec![
                comment(
                    1,
                    n,
                    "## Epic Update\nNothing structured here, only a paragraph of prose.",
                ),
                comment(2, n, &update_body("2025-08-07", "ok")),
            ])
        });

        let collection = EpicCollector::new(Arc::new(source))
            .collect(&request(vec![3], DateFilter::Any))
            .await;

        assert_eq!(collection.total_updates(), 1);
        assert_eq!(collection.updates()[0].comment_id, 2);
        assert!(collection.failures().is_empty());
    }

    #[tokio::test]
    async fn test_order_and_duplicates() {
        let mut source = source();
        source.expect_get_issue().times(3).returning(|_, n| Ok(summary(n)));
        source.expect_get_comments().times(3).returning(|_, n| {
            Ok(vec![
                comment(n * 10 + 1, n, &update_body("2025-08-07", "a")),
                comment(n * 10 + 2, n, &update_body("2025-08-07", "b")),
            ])
        });

        let collection = EpicCollector::new(Arc::new(source))
            .collect(&request(vec![5, 2, 5, 9, 2], DateFilter::Any))
            .await;

        let ids: Vec<u64> = collection.updates().iter().map(|u| u.comment_id).collect();
        assert_eq!(ids, vec![51, 52, 21, 22, 91, 92]);
        assert_eq!(collection.issue_numbers(), &[5, 2, 9]);
    }

    #[tokio::test]
    async fn test_custom_matcher_threshold() {
        let mut source = source();
        source.expect_get_issue().returning(|_, n| Ok(summary(n)));
        source
            .expect_get_comments()
            .returning(|_, n| Ok(vec![comment(1, n, &update_body("2025-08-07", "x"))]));

        let collection = EpicCollector::new(Arc::new(source))
            .with_matcher(TemplateMatcher::with_min_body_len(10_000))
            .collect(&request(vec![1], DateFilter::Any))
            .await;

        assert!(collection.is_empty());
    }

    fn crawl_request() -> CrawlRequest {
        CrawlRequest {
            repo: RepoRef::new("LDFLK", "launch"),
            start: "2025-08-01".to_string(),
            end: "2025-08-07".to_string(),
        }
    }

    #[tokio::test]
    async fn test_crawl_lists_then_collects_in_window() {
        let mut source = source();
        source
            .expect_list_issues()
            .withf(|_, since| since == "2025-08-01")
            .times(1)
            .returning(|_, _| Ok(vec![summary(152), summary(151)]));
        source.expect_get_issue().never();
        source.expect_get_comments().times(2).returning(|_, n| {
            Ok(vec![
                comment(n * 10 + 1, n, &update_body("2025-07-31", "too early")),
                comment(n * 10 + 2, n, &update_body("2025-08-03", "inside")),
                comment(n * 10 + 3, n, &update_body("2025-08-07", "last day")),
                comment(n * 10 + 4, n, "@epic-update"),
            ])
        });

        let collection = EpicCollector::new(Arc::new(source))
            .crawl(&crawl_request())
            .await
            .unwrap();

        assert_eq!(collection.issue_numbers(), &[151, 152]);
        let ids: Vec<u64> = collection.updates().iter().map(|u| u.comment_id).collect();
        assert_eq!(ids, vec![1512, 1513, 1522, 1523]);
        assert_eq!(collection.updates()[0].issue_title, "EPIC 151");
    }

    #[tokio::test]
    async fn test_crawl_issue_failure_is_recorded() {
        let mut source = source();
        source
            .expect_list_issues()
            .returning(|_, _| Ok(vec![summary(1), summary(2)]));
        source.expect_get_comments().returning(|_, n| {
            if n == 1 {
                Err(Error::Http("connection reset".to_string()))
            } else {
                Ok(vec![comment(20, n, &update_body("2025-08-05", "ok"))])
            }
        });

        let collection = EpicCollector::new(Arc::new(source))
            .crawl(&crawl_request())
            .await
            .unwrap();

        assert_eq!(collection.total_updates(), 1);
        assert_eq!(collection.failures()[0].issue_number, 1);
        assert_eq!(collection.failures()[0].kind, "http");
    }

    #[tokio::test]
    async fn test_crawl_listing_failure_is_an_error() {
        let mut source = source();
        source
            .expect_list_issues()
            .returning(|_, _| Err(Error::Unauthorized("Bad credentials".to_string())));
        source.expect_get_comments().never();

        let err = EpicCollector::new(Arc::new(source))
            .crawl(&crawl_request())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn test_dedupe() {
        assert_eq!(dedupe(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedupe(&[]).is_empty());
    }
}
