//! GitHub REST API client.
//! The only place that builds API endpoints, sends requests to GitHub and
//! interprets its responses.

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderValue, InvalidHeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT,
};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::constants::{github, DEFAULT_BRANCH};
use crate::error::{Error, Result};

/// Repository details returned by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub owner: String,
    pub name: String,
    pub html_url: String,
    pub clone_url: String,
    pub default_branch: String,
}

impl RepoInfo {
    /// Extracts repository details from an API payload.
    pub fn from_payload(owner: &str, name: &str, payload: &Value) -> Result<Self> {
        let field = |key: &str| {
            payload.get(key).and_then(Value::as_str).map(str::to_string).ok_or_else(|| {
                Error::GitHubError(format!("response for {owner}/{name} has no '{key}'"))
            })
        };

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            html_url: field("html_url")?,
            clone_url: field("clone_url")?,
            default_branch: payload
                .get("default_branch")
                .and_then(Value::as_str)
                .filter(|branch| !branch.is_empty())
                .unwrap_or(DEFAULT_BRANCH)
                .to_string(),
        })
    }
}

/// Body of a repository creation request.
#[derive(Debug, Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    private: bool,
    description: &'a str,
    auto_init: bool,
    has_issues: bool,
    has_projects: bool,
    has_wiki: bool,
}

pub struct GitHubClient {
    client: Client,
    api_base: String,
}

impl GitHubClient {
    /// Creates a client for the public GitHub API.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_api_base(token, github::API_BASE)
    }

    /// Creates a client for an alternative API base, such as GitHub Enterprise.
    ///
    /// # Errors
    /// * `Error::GitHubError` if the token is blank or the base is not a valid URL
    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::GitHubError("GitHub token is required".to_string()));
        }
        Url::parse(api_base)
            .map_err(|e| Error::GitHubError(format!("invalid API base '{api_base}': {e}")))?;

        let client = Client::builder()
            .default_headers(default_headers(token)?)
            .timeout(Duration::from_secs(github::TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, api_base: api_base.trim_end_matches('/').to_string() })
    }

    /// Full URL of an API path such as `/user`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Sends a request and returns its JSON payload, if any.
    ///
    /// With `allow_missing`, a `404 Not Found` yields `Ok(None)` instead of an error.
    fn request<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        allow_missing: bool,
    ) -> Result<Option<Value>> {
        debug!("GitHub API {method} {path}");
        let mut request = self.client.request(method.clone(), self.endpoint(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        read_response(status, &method, path, &text, allow_missing)
    }

    /// Looks up `owner/name`; a 404 means the repository does not exist (or is not visible).
    pub fn get_repo(&self, owner: &str, name: &str) -> Result<Option<RepoInfo>> {
        let path = format!("/repos/{owner}/{name}");
        match self.request::<()>(Method::GET, &path, None, true)? {
            Some(payload) => RepoInfo::from_payload(owner, name, &payload).map(Some),
            None => {
                debug!("Repository {owner}/{name} not found");
                Ok(None)
            }
        }
    }

    /// Creates `owner/name` for the authenticated user, or in the organization `owner`
    /// when it is not the authenticated user's login.
    pub fn create_repo(
        &self,
        owner: &str,
        name: &str,
        private: bool,
        description: &str,
    ) -> Result<RepoInfo> {
        let viewer = self.request::<()>(Method::GET, "/user", None, false)?.unwrap_or(Value::Null);
        let viewer_login = viewer.get("login").and_then(Value::as_str).unwrap_or_default();

        let body = CreateRepoRequest {
            name,
            private,
            description,
            auto_init: false,
            has_issues: true,
            has_projects: false,
            has_wiki: false,
        };
        let path = create_repo_path(owner, viewer_login);
        let payload = self.request(Method::POST, &path, Some(&body), false)?.ok_or_else(|| {
            Error::GitHubError(format!("empty response creating {owner}/{name}"))
        })?;

        RepoInfo::from_payload(owner, name, &payload)
    }
}

fn default_headers(token: &str) -> Result<HeaderMap> {
    let invalid = |e: InvalidHeaderValue| Error::GitHubError(format!("invalid header value: {e}"));
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(github::ACCEPT));
    headers.insert(USER_AGENT, HeaderValue::from_static(github::USER_AGENT));
    headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(github::API_VERSION));

    let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(invalid)?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    Ok(headers)
}

/// Repositories of the authenticated user go to `/user/repos`, all others to the organization.
fn create_repo_path(owner: &str, viewer_login: &str) -> String {
    if owner == viewer_login {
        "/user/repos".to_string()
    } else {
        format!("/orgs/{owner}/repos")
    }
}

/// Interprets a response: error statuses become `Error::GitHubError`, empty or
/// `204 No Content` bodies become `None`.
fn read_response(
    status: StatusCode,
    method: &Method,
    path: &str,
    body: &str,
    allow_missing: bool,
) -> Result<Option<Value>> {
    if allow_missing && status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if status.is_client_error() || status.is_server_error() {
        return Err(api_error(status, method, path, body));
    }
    if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(body)?))
}

/// Builds the error for a failed API call, preferring the JSON `message` field.
fn api_error(status: StatusCode, method: &Method, path: &str, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|payload| payload.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string());
    Error::GitHubError(format!(
        "GitHub API error {} {method} {path}: {message}",
        status.as_u16()
    ))
}
