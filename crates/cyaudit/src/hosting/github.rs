//! GitHub REST API backend.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{OrgHandle, Permission, RemoteHost, RemoteRepository, Result};
use crate::error::ProvisionError;
use crate::secrets::AuthToken;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Public GitHub web host, used to build clone URLs.
pub const DEFAULT_WEB_URL: &str = "https://github.com";

const API_VERSION: &str = "2022-11-28";
const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("cyaudit/", env!("CARGO_PKG_VERSION"));

/// Maximum length for error bodies to prevent log flooding.
const MAX_ERROR_BODY_LENGTH: usize = 200;

fn truncate_error_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_LENGTH {
        let head: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated)", head)
    } else {
        body.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct OrgResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    private: bool,
    #[serde(default = "default_branch")]
    default_branch: String,
    owner: OwnerResponse,
    clone_url: String,
    html_url: String,
}

fn default_branch() -> String {
    crate::provision::MAIN_BRANCH_NAME.to_string()
}

impl From<RepoResponse> for RemoteRepository {
    fn from(repo: RepoResponse) -> Self {
        Self {
            name: repo.name,
            organization: repo.owner.login,
            is_private: repo.private,
            default_branch: repo.default_branch,
            clone_url: repo.clone_url,
            html_url: repo.html_url,
        }
    }
}

/// GitHub client bound to one token.
pub struct GitHubClient {
    http: Client,
    api_url: String,
    web_url: String,
    token: AuthToken,
}

impl GitHubClient {
    /// Creates a client for github.com.
    pub fn new(token: AuthToken) -> Result<Self> {
        Self::with_urls(token, DEFAULT_API_URL, DEFAULT_WEB_URL)
    }

    /// Creates a client for a GitHub Enterprise instance or a test server.
    pub fn with_urls(token: AuthToken, api_url: &str, web_url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProvisionError::Remote(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            web_url: web_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(self.token.expose())
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        builder
            .send()
            .await
            .map_err(|e| ProvisionError::Remote(self.token.redact(&e.to_string())))
    }

    /// Maps a non-success response onto the error taxonomy.
    async fn error_from(&self, response: Response, kind: &str, name: &str) -> ProvisionError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = self.token.redact(&truncate_error_body(body.trim()));

        match status {
            StatusCode::UNAUTHORIZED => ProvisionError::Auth(format!("{} ({})", detail, status)),
            StatusCode::FORBIDDEN => {
                ProvisionError::Permission(format!("{} {}: {}", kind, name, detail))
            }
            StatusCode::NOT_FOUND => ProvisionError::NotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            _ => ProvisionError::Remote(format!("{} {}: {} ({})", kind, name, detail, status)),
        }
    }
}

#[async_trait]
impl RemoteHost for GitHubClient {
    async fn organization(&self, org: &str) -> Result<OrgHandle> {
        let response = self
            .send(self.request(Method::GET, &format!("/orgs/{}", org)))
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from(response, "Organization", org).await);
        }

        let body: OrgResponse = response
            .json()
            .await
            .map_err(|e| ProvisionError::Remote(format!("invalid organization response: {}", e)))?;

        debug!("Organization {} is accessible", body.login);
        Ok(OrgHandle { login: body.login })
    }

    async fn repository_exists(&self, org: &str, name: &str) -> Result<bool> {
        let response = self
            .send(self.request(Method::GET, &format!("/repos/{}/{}", org, name)))
            .await?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(self
                .error_from(response, "Repository", &format!("{}/{}", org, name))
                .await),
        }
    }

    async fn create_private_repository(
        &self,
        org: &OrgHandle,
        name: &str,
    ) -> Result<RemoteRepository> {
        let response = self
            .send(
                self.request(Method::POST, &format!("/orgs/{}/repos", org.login))
                    .json(&json!({
                        "name": name,
                        "private": true,
                        "auto_init": false,
                    })),
            )
            .await?;

        let full_name = format!("{}/{}", org.login, name);
        match response.status() {
            s if s.is_success() => {
                let body: RepoResponse = response.json().await.map_err(|e| {
                    ProvisionError::Remote(format!("invalid repository response: {}", e))
                })?;
                info!("Created private repository {}", full_name);
                Ok(body.into())
            }
            StatusCode::UNPROCESSABLE_ENTITY => Err(ProvisionError::AlreadyExists {
                owner: org.login.clone(),
                name: name.to_string(),
            }),
            // GitHub answers 404 when the token cannot create repositories in the org
            StatusCode::NOT_FOUND => Err(ProvisionError::Permission(format!(
                "cannot create repositories in {}",
                org.login
            ))),
            _ => Err(self.error_from(response, "Repository", &full_name).await),
        }
    }

    async fn delete_repository(&self, repo: &RemoteRepository) -> Result<()> {
        let response = self
            .send(self.request(
                Method::DELETE,
                &format!("/repos/{}/{}", repo.organization, repo.name),
            ))
            .await?;

        match response.status() {
            s if s.is_success() => {
                info!("Deleted repository {}", repo.full_name());
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                warn!("Repository {} was already gone", repo.full_name());
                Ok(())
            }
            _ => Err(self
                .error_from(response, "Repository", &repo.full_name())
                .await),
        }
    }

    async fn set_default_branch(&self, repo: &RemoteRepository, branch: &str) -> Result<()> {
        let response = self
            .send(
                self.request(
                    Method::PATCH,
                    &format!("/repos/{}/{}", repo.organization, repo.name),
                )
                .json(&json!({ "default_branch": branch })),
            )
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self
                .error_from(response, "Repository", &repo.full_name())
                .await)
        }
    }

    async fn add_collaborator(
        &self,
        repo: &RemoteRepository,
        username: &str,
        permission: Permission,
    ) -> Result<()> {
        let response = self
            .send(
                self.request(
                    Method::PUT,
                    &format!(
                        "/repos/{}/{}/collaborators/{}",
                        repo.organization, repo.name, username
                    ),
                )
                .json(&json!({ "permission": permission.to_string() })),
            )
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.error_from(response, "User", username).await)
        }
    }

    fn clone_url(&self, owner: &str, name: &str) -> String {
        format!("{}/{}/{}.git", self.web_url, owner, name)
    }
}
