//! GitHub GraphQL client backing the card.
//!
//! One consolidated profile query covers everything the card displays; the
//! all-time commit total needs the commit search REST endpoint instead, since
//! `contributionsCollection` only spans a single year window.

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use reqwest::Client;
use reqwest::header::{ACCEPT, RETRY_AFTER, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::FetchError;
use crate::stats::{Stats, calculate_rank};

const GRAPHQL_URL: &str = "https://api.github.com/graphql";
const SEARCH_COMMITS_URL: &str = "https://api.github.com/search/commits";
const AGENT: &str = "gh-stats-card";
const MAX_RETRIES: usize = 4;

/// Everything the handler decides about a fetch, bundled.
#[derive(Debug, Clone, Default)]
pub struct StatsRequest {
    pub username: String,
    pub include_all_commits: bool,
    pub exclude_repos: Vec<String>,
    pub include_merged_prs: bool,
    pub include_discussions_started: bool,
    pub include_discussions_answered: bool,
}

/// Seam between the request handler and the upstream API, so tests can swap
/// in a canned fetcher.
#[async_trait]
pub trait StatsFetcher: Send + Sync {
    async fn fetch_stats(&self, request: &StatsRequest) -> Result<Stats, FetchError>;
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    http: Client,
}

#[derive(Deserialize)]
struct CountObj {
    #[serde(rename = "totalCount")]
    total_count: u64,
}

#[derive(Deserialize)]
struct OverviewResponse {
    data: Option<OverviewData>,
}

#[derive(Deserialize)]
struct OverviewData {
    user: Option<OverviewUser>,
}

#[derive(Deserialize)]
struct OverviewUser {
    name: Option<String>,
    login: String,
    followers: CountObj,
    #[serde(rename = "pullRequests")]
    pull_requests: CountObj,
    #[serde(rename = "mergedPullRequests")]
    merged_pull_requests: Option<CountObj>,
    #[serde(rename = "openIssues")]
    open_issues: CountObj,
    #[serde(rename = "closedIssues")]
    closed_issues: CountObj,
    #[serde(rename = "repositoriesContributedTo")]
    contributed_to: CountObj,
    #[serde(rename = "contributionsCollection")]
    contributions: Contributions,
    repositories: RepoConnection,
    #[serde(rename = "repositoryDiscussions")]
    discussions_started: Option<CountObj>,
    #[serde(rename = "repositoryDiscussionComments")]
    discussions_answered: Option<CountObj>,
}

#[derive(Deserialize)]
struct Contributions {
    #[serde(rename = "totalCommitContributions")]
    total_commit_contributions: u64,
}

#[derive(Deserialize)]
struct RepoConnection {
    nodes: Option<Vec<RepoNode>>,
}

#[derive(Deserialize)]
struct RepoNode {
    name: String,
    stargazers: CountObj,
}

#[derive(Deserialize)]
struct SearchCommitsResponse {
    total_count: u64,
}

/// Sum stargazers over the fetched repositories, skipping excluded names.
fn star_total(nodes: &[RepoNode], exclude: &[String]) -> u64 {
    let excluded: HashSet<&str> = exclude.iter().map(String::as_str).collect();
    nodes
        .iter()
        .filter(|node| !excluded.contains(node.name.as_str()))
        .map(|node| node.stargazers.total_count)
        .sum()
}

fn profile_query(request: &StatsRequest) -> String {
    let username = &request.username;
    // Contribution commits are counted from Jan 1 of the current year.
    let from = format!("{}-01-01T00:00:00Z", Utc::now().year());

    let mut optional = String::new();
    if request.include_merged_prs {
        optional.push_str(
            "\n                    mergedPullRequests: pullRequests(states: MERGED) { totalCount }",
        );
    }
    if request.include_discussions_started {
        optional.push_str("\n                    repositoryDiscussions { totalCount }");
    }
    if request.include_discussions_answered {
        optional.push_str(
            "\n                    repositoryDiscussionComments(onlyAnswers: true) { totalCount }",
        );
    }

    format!(
        r#"
            {{
                user(login: "{username}") {{
                    name
                    login
                    followers {{ totalCount }}
                    pullRequests {{ totalCount }}
                    openIssues: issues(states: OPEN) {{ totalCount }}
                    closedIssues: issues(states: CLOSED) {{ totalCount }}
                    repositoriesContributedTo(contributionTypes: [COMMIT, ISSUE, PULL_REQUEST, REPOSITORY]) {{ totalCount }}
                    contributionsCollection(from: "{from}") {{ totalCommitContributions }}
                    repositories(ownerAffiliations: OWNER, first: 100, orderBy: {{field: STARGAZERS, direction: DESC}}) {{
                        nodes {{
                            name
                            stargazers {{ totalCount }}
                        }}
                    }}{optional}
                }}
            }}
        "#
    )
}

impl GithubClient {
    /// Build a client around a GitHub token. Outbound calls carry a bounded
    /// timeout so a stalled upstream turns into an error card instead of a
    /// hung request.
    pub fn new(token: String) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(Duration::from_secs(20)).build()?;
        Ok(Self {
            token: Arc::new(token),
            http,
        })
    }

    /// Low-level GraphQL request with retry/backoff and `errors` inspection.
    async fn graphql(&self, username: &str, query: &str) -> Result<Value, FetchError> {
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let resp = self
                .http
                .post(GRAPHQL_URL)
                .bearer_auth(&*self.token)
                .header(USER_AGENT, AGENT)
                .json(&serde_json::json!({ "query": query }))
                .send()
                .await?;

            let status = resp.status();
            let headers = resp.headers().clone();

            if status.as_u16() == 429 {
                if attempt >= MAX_RETRIES {
                    return Err(FetchError::RateLimited);
                }
                let wait_secs = headers
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2);
                sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            if status.is_server_error() {
                if attempt >= MAX_RETRIES {
                    return Err(FetchError::Upstream {
                        status: status.as_u16(),
                        detail: "GitHub GraphQL API kept failing".to_string(),
                    });
                }
                let backoff = Duration::from_millis(250u64.saturating_mul(1 << (attempt - 1)));
                sleep(backoff).await;
                continue;
            }

            // Parse JSON even on non-2xx to capture the error payload.
            let json: Value = resp
                .json()
                .await
                .map_err(|e| FetchError::Malformed(format!("invalid JSON from GitHub: {e}")))?;

            if let Some(errors) = json.get("errors").and_then(Value::as_array) {
                let error_type = |e: &Value| {
                    e.get("type")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                if errors.iter().any(|e| error_type(e) == "RATE_LIMITED") {
                    return Err(FetchError::RateLimited);
                }
                if errors.iter().any(|e| error_type(e) == "NOT_FOUND") {
                    return Err(FetchError::UserNotFound {
                        username: username.to_string(),
                    });
                }
                return Err(FetchError::Malformed(format!(
                    "GraphQL reported errors: {errors:?}"
                )));
            }

            if !status.is_success() {
                return Err(FetchError::Upstream {
                    status: status.as_u16(),
                    detail: json.to_string(),
                });
            }

            return Ok(json);
        }
    }

    async fn user_overview(&self, request: &StatsRequest) -> Result<OverviewUser, FetchError> {
        let query = profile_query(request);
        let json = self.graphql(&request.username, &query).await?;

        let parsed: OverviewResponse = serde_json::from_value(json)
            .map_err(|e| FetchError::Malformed(format!("unexpected profile shape: {e}")))?;

        parsed
            .data
            .and_then(|d| d.user)
            .ok_or_else(|| FetchError::UserNotFound {
                username: request.username.clone(),
            })
    }

    /// All-time commit total via the commit search endpoint.
    async fn all_time_commits(&self, username: &str) -> Result<u64, FetchError> {
        let resp = self
            .http
            .get(SEARCH_COMMITS_URL)
            .query(&[("q", format!("author:{username}")), ("per_page", "1".into())])
            .bearer_auth(&*self.token)
            .header(USER_AGENT, AGENT)
            .header(ACCEPT, "application/vnd.github.cloak-preview")
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 403 || status.as_u16() == 429 {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                detail: "commit search failed".to_string(),
            });
        }

        let parsed: SearchCommitsResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::Malformed(format!("unexpected search shape: {e}")))?;
        Ok(parsed.total_count)
    }
}

#[async_trait]
impl StatsFetcher for GithubClient {
    async fn fetch_stats(&self, request: &StatsRequest) -> Result<Stats, FetchError> {
        let user = self.user_overview(request).await?;

        let total_commits = if request.include_all_commits {
            self.all_time_commits(&request.username).await?
        } else {
            user.contributions.total_commit_contributions
        };

        let repo_nodes = user.repositories.nodes.unwrap_or_default();
        let total_stars = star_total(&repo_nodes, &request.exclude_repos);

        let total_prs = user.pull_requests.total_count;
        let total_prs_merged = user
            .merged_pull_requests
            .map(|c| c.total_count)
            .unwrap_or(0);
        let merged_prs_percentage = if total_prs > 0 {
            total_prs_merged as f64 / total_prs as f64 * 100.0
        } else {
            0.0
        };

        let total_issues = user.open_issues.total_count + user.closed_issues.total_count;
        let followers = user.followers.total_count;

        let rank = calculate_rank(
            request.include_all_commits,
            total_commits,
            total_prs,
            total_issues,
            total_stars,
            followers,
        );

        Ok(Stats {
            name: user.name.unwrap_or(user.login),
            total_stars,
            total_commits,
            total_prs,
            total_prs_merged,
            merged_prs_percentage,
            total_issues,
            total_discussions_started: user
                .discussions_started
                .map(|c| c.total_count)
                .unwrap_or(0),
            total_discussions_answered: user
                .discussions_answered
                .map(|c| c.total_count)
                .unwrap_or(0),
            contributed_to: user.contributed_to.total_count,
            followers,
            rank,
        })
    }
}
