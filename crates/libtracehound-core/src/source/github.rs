//! GitHub issues source.
//!
//! Pulls issues (and their comments) from the GitHub REST API, walking
//! `rel="next"` link headers for pagination. Both open and closed issues
//! are listed and combined.

use std::time::Duration;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{IssueSource, NormalizedIssue};
use crate::config::BugDbConfig;
use crate::error::TracehoundError;

pub const DEFAULT_HOST: &str = "https://api.github.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ISSUE_STATES: [&str; 2] = ["open", "closed"];

/// One configured GitHub repository
#[derive(Debug)]
pub struct GithubSource {
    agent: ureq::Agent,
    host: String,
    repo: String,
    auth_header: String,
}

#[derive(Debug, Deserialize)]
struct GhIssue {
    number: u64,
    html_url: String,
    title: String,
    body: Option<String>,
    #[serde(default)]
    comments: u64,
}

#[derive(Debug, Deserialize)]
struct GhComment {
    body: Option<String>,
}

impl GithubSource {
    /// Registry factory; requires `repo`, `api_user` and `api_password`
    pub fn from_config(config: &BugDbConfig) -> Result<Box<dyn IssueSource>, TracehoundError> {
        let repo = require(config, "repo", &config.repo)?;
        let user = require(config, "api_user", &config.api_user)?;
        let password = require(config, "api_password", &config.api_password)?;
        let host = config
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        Ok(Box::new(Self::new(host, repo, &user, &password)))
    }

    pub fn new(host: String, repo: String, user: &str, password: &str) -> Self {
        // Non-success statuses are handled manually so the response body
        // can be carried as diagnostic text.
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();
        let credentials =
            base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
        Self {
            agent,
            host: host.trim_end_matches('/').to_string(),
            repo,
            auth_header: format!("Basic {credentials}"),
        }
    }

    fn issues_url(&self, state: &str, since: Option<DateTime<Utc>>) -> String {
        let mut url = format!("{}/repos/{}/issues?state={}", self.host, self.repo, state);
        if let Some(since) = since {
            url.push_str("&since=");
            url.push_str(&format_since(since));
        }
        url
    }

    fn issue_body_text(&self, issue: &GhIssue) -> Result<String, TracehoundError> {
        let comments = if issue.comments > 0 {
            debug!(issue = issue.number, "issue has comments, fetching them");
            let url = format!(
                "{}/repos/{}/issues/{}/comments",
                self.host, self.repo, issue.number
            );
            self.collect_pages::<GhComment>(&url)?
        } else {
            Vec::new()
        };
        Ok(join_bodies(issue.body.clone(), comments))
    }

    /// Walk every result page starting at `url`, following `rel="next"`
    /// links until none remains
    fn collect_pages<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, TracehoundError> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        while let Some(url) = next {
            let (page, next_url) = self.fetch_page::<T>(&url)?;
            items.extend(page);
            next = next_url;
        }
        Ok(items)
    }

    /// Fetch one page, returning its decoded items and the next-page URL
    /// if the response advertises one
    fn fetch_page<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<(Vec<T>, Option<String>), TracehoundError> {
        debug!(%url, "hitting github url");
        let mut response = self
            .agent
            .get(url)
            .header("Authorization", self.auth_header.as_str())
            .header("User-Agent", "tracehound")
            .call()
            .map_err(|e| TracehoundError::RemoteFetch(format!("request to {url} failed: {e}")))?;

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TracehoundError::RemoteFetch(format!("reading {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TracehoundError::RemoteFetch(format!(
                "github api error ({}): {}",
                response.status(),
                body
            )));
        }

        let next = response
            .headers()
            .get("link")
            .and_then(|value| value.to_str().ok())
            .and_then(next_link);

        let items = serde_json::from_str(&body)
            .map_err(|e| TracehoundError::RemoteFetch(format!("decoding {url} failed: {e}")))?;

        Ok((items, next))
    }
}

impl IssueSource for GithubSource {
    fn source_type(&self) -> &str {
        "github"
    }

    fn key(&self) -> &str {
        &self.repo
    }

    fn fetch_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<NormalizedIssue>, TracehoundError> {
        let mut issues = Vec::new();
        for state in ISSUE_STATES {
            for issue in self.collect_pages::<GhIssue>(&self.issues_url(state, since))? {
                let body_text = self.issue_body_text(&issue)?;
                issues.push(NormalizedIssue {
                    native_id: issue.number.to_string(),
                    url: issue.html_url,
                    title: issue.title,
                    body_text,
                });
            }
        }
        Ok(issues)
    }
}

fn require(
    config: &BugDbConfig,
    field: &str,
    value: &Option<String>,
) -> Result<String, TracehoundError> {
    value.clone().ok_or_else(|| {
        TracehoundError::InvalidConfig(format!(
            "{} bug db requires a \"{}\" field",
            config.db_type.trim(),
            field
        ))
    })
}

/// Description then comment bodies, blank-line separated
fn join_bodies(body: Option<String>, comments: Vec<GhComment>) -> String {
    let mut parts = vec![body.unwrap_or_default()];
    parts.extend(comments.into_iter().map(|c| c.body.unwrap_or_default()));
    parts.join("\n\n")
}

/// Pull the `rel="next"` target out of a `link` response header
fn next_link(header: &str) -> Option<String> {
    for entry in header.split(',') {
        let mut pieces = entry.split(';').map(str::trim);
        let url = pieces.next().unwrap_or_default();
        if pieces.any(|piece| piece == r#"rel="next""#) {
            return Some(url.trim_matches(['<', '>']).to_string());
        }
    }
    None
}

/// Format a timestamp the way the github api expects (UTC)
fn format_since(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
