//! GitHub organisation, team and membership API.

use crate::config::GhSyncConfig;
use crate::error::{GhSyncError, GhSyncResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::Display;
use tracing::debug;

const API_VERSION: &str = "2022-11-28";

#[async_trait]
pub trait GithubClient: Send + Sync {
    async fn list_members(&self, page: Option<&str>) -> GhSyncResult<Page<RemoteUser>>;
    async fn list_teams(&self, page: Option<&str>) -> GhSyncResult<Page<RemoteTeam>>;
    async fn list_team_members(
        &self,
        team_id: u64,
        role: TeamRole,
        page: Option<&str>
    ) -> GhSyncResult<Page<RemoteUser>>;
    async fn create_team(&self, team: &TeamSpec) -> GhSyncResult<RemoteTeam>;
    async fn edit_team(&self, team_id: u64, team: &TeamSpec) -> GhSyncResult<RemoteTeam>;
    async fn delete_team(&self, team_id: u64) -> GhSyncResult<()>;
    async fn add_team_membership(&self, team_id: u64, login: &str, role: TeamRole)
    -> GhSyncResult<()>;
    async fn remove_team_membership(&self, team_id: u64, login: &str) -> GhSyncResult<()>;
}

/// One page of a listing call. `next_page` is the cursor for the following
/// page, absent on the last one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<String>
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: u64,
    pub login: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamParent {
    pub id: u64,
    pub name: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTeam {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub privacy: Option<TeamPrivacy>,
    #[serde(default)]
    pub parent: Option<TeamParent>,
    /// Synthesized locally by a dry run; GitHub has never seen it.
    #[serde(skip)]
    pub placeholder: bool
}

impl RemoteTeam {
    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_ref().map(|p| p.name.as_str())
    }

    pub fn as_parent(&self) -> TeamParent {
        TeamParent {
            id: self.id,
            name: self.name.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TeamPrivacy {
    Secret,
    Closed
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TeamRole {
    Member,
    Maintainer
}

/// Body of team create and edit calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSpec {
    pub name: String,
    pub description: String,
    pub privacy: TeamPrivacy,
    /// Serialized as `null` when absent so an edit clears the parent.
    pub parent_team_id: Option<u64>
}

#[derive(Serialize)]
struct MembershipBody {
    role: TeamRole
}

pub struct RestGithubClient {
    client: Client,
    config: GhSyncConfig
}

impl RestGithubClient {
    pub fn new(config: GhSyncConfig) -> GhSyncResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("org-chart-gh-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GhSyncError::HttpError)?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn org(&self) -> String {
        urlencoding::encode(&self.config.organization).into_owned()
    }

    fn paged(&self, path: &str, page: Option<&str>) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        match page {
            Some(page) => format!(
                "{}{}per_page={}&page={}",
                path,
                separator,
                self.config.per_page,
                urlencoding::encode(page)
            ),
            None => format!("{}{}per_page={}", path, separator, self.config.per_page)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(method = %method, url = %url, "Making GitHub API request");

        self.client
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> GhSyncResult<Response> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(GhSyncError::AuthenticationError(
                "Invalid GitHub token".to_string()
            )),
            StatusCode::TOO_MANY_REQUESTS => Err(GhSyncError::RateLimited {
                retry_after_seconds: retry_after(response.headers())
            }),
            StatusCode::FORBIDDEN if rate_limit_exhausted(response.headers()) => {
                Err(GhSyncError::RateLimited {
                    retry_after_seconds: retry_after(response.headers())
                })
            }
            StatusCode::NOT_FOUND => Err(GhSyncError::NotFound(path.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(GhSyncError::GithubApiError {
                    status: status.as_u16(),
                    message: body
                })
            }
        }
    }

    async fn get_page<T: DeserializeOwned>(&self, path: &str) -> GhSyncResult<Page<T>> {
        let response = self.send(self.request(Method::GET, path), path).await?;
        let next_page = next_page(response.headers());
        let items = response.json::<Vec<T>>().await?;
        Ok(Page { items, next_page })
    }

    async fn send_team(&self, method: Method, path: &str, team: &TeamSpec) -> GhSyncResult<RemoteTeam> {
        let response = self
            .send(self.request(method, path).json(team), path)
            .await?;
        Ok(response.json::<RemoteTeam>().await?)
    }
}

/// Page number of the `rel="next"` entry of a `Link` header.
fn next_page(headers: &HeaderMap) -> Option<String> {
    let link = headers.get("link")?.to_str().ok()?;

    for part in link.split(',') {
        if part.contains("rel=\"next\"") {
            let url = part
                .split(';')
                .next()?
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>');
            let query = url.split_once('?')?.1;
            return query
                .split('&')
                .find_map(|pair| pair.strip_prefix("page="))
                .map(|page| page.to_string());
        }
    }
    None
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

fn retry_after(headers: &HeaderMap) -> u64 {
    let header_u64 = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
    };

    header_u64("retry-after")
        .or_else(|| {
            header_u64("x-ratelimit-reset").map(|reset| {
                let now = Utc::now().timestamp().max(0) as u64;
                reset.saturating_sub(now)
            })
        })
        .unwrap_or(60)
}

#[async_trait]
impl GithubClient for RestGithubClient {
    async fn list_members(&self, page: Option<&str>) -> GhSyncResult<Page<RemoteUser>> {
        let path = self.paged(&format!("/orgs/{}/members", self.org()), page);
        self.get_page(&path).await
    }

    async fn list_teams(&self, page: Option<&str>) -> GhSyncResult<Page<RemoteTeam>> {
        let path = self.paged(&format!("/orgs/{}/teams", self.org()), page);
        self.get_page(&path).await
    }

    async fn list_team_members(
        &self,
        team_id: u64,
        role: TeamRole,
        page: Option<&str>
    ) -> GhSyncResult<Page<RemoteUser>> {
        let path = self.paged(&format!("/teams/{}/members?role={}", team_id, role), page);
        self.get_page(&path).await
    }

    async fn create_team(&self, team: &TeamSpec) -> GhSyncResult<RemoteTeam> {
        let path = format!("/orgs/{}/teams", self.org());
        self.send_team(Method::POST, &path, team).await
    }

    async fn edit_team(&self, team_id: u64, team: &TeamSpec) -> GhSyncResult<RemoteTeam> {
        let path = format!("/teams/{}", team_id);
        self.send_team(Method::PATCH, &path, team).await
    }

    async fn delete_team(&self, team_id: u64) -> GhSyncResult<()> {
        let path = format!("/teams/{}", team_id);
        self.send(self.request(Method::DELETE, &path), &path)
            .await?;
        Ok(())
    }

    async fn add_team_membership(
        &self,
        team_id: u64,
        login: &str,
        role: TeamRole
    ) -> GhSyncResult<()> {
        let path = format!(
            "/teams/{}/memberships/{}",
            team_id,
            urlencoding::encode(login)
        );
        self.send(
            self.request(Method::PUT, &path)
                .json(&MembershipBody { role }),
            &path
        )
        .await?;
        Ok(())
    }

    async fn remove_team_membership(&self, team_id: u64, login: &str) -> GhSyncResult<()> {
        let path = format!(
            "/teams/{}/memberships/{}",
            team_id,
            urlencoding::encode(login)
        );
        self.send(self.request(Method::DELETE, &path), &path)
            .await?;
        Ok(())
    }
}

pub fn create_github_client(config: GhSyncConfig) -> GhSyncResult<Arc<dyn GithubClient>> {
    Ok(Arc::new(RestGithubClient::new(config)?))
}
