//! Target identity-management HTTP client (spec.md §4.3, §6).
//!
//! Every method maps a transport failure or 5xx to `TargetTransient` and
//! a 4xx to `TargetRejected` with the response body attached, per
//! spec.md §7 — the executors decide what to do with each, this client
//! only classifies.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::target::types::{
    CreateDepartmentResponse, CreateOrgResponse, CreateUserResponse, NameBody, RootInfo, RootListResponse, TargetUserInfo,
    TreeNode, TreeResponse, UpdateUserEnvelope, UserListResponse, UserPayload,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const USER_PAGE_LIMIT: u32 = 100;
const ROOT_PAGE_LIMIT: u32 = 1000;

/// Everything the planner/executor layer needs from the target, behind a
/// trait so tests can swap in a fake without standing up a mock server
/// (spec.md §9's two-baseline polymorphism note applies here too: the
/// executors are written once, against the trait).
#[async_trait]
pub trait TargetApi: Send + Sync {
    async fn list_roots(&self) -> Result<Vec<RootInfo>, AgentError>;
    async fn list_tree(&self, org_id: &str) -> Result<Vec<TreeNode>, AgentError>;
    async fn list_users(&self) -> Result<Vec<TargetUserInfo>, AgentError>;

    async fn create_root(&self, name: &str, origin_id: &str) -> Result<String, AgentError>;
    async fn create_department(
        &self,
        org_id: &str,
        name: &str,
        origin_id: &str,
        parent_id: Option<&str>,
    ) -> Result<String, AgentError>;
    async fn rename_department(&self, org_id: &str, dep_id: &str, name: &str) -> Result<(), AgentError>;
    async fn move_department(&self, org_id: &str, dep_id: &str, new_parent_id: &str) -> Result<(), AgentError>;
    async fn delete_department(&self, org_id: &str, dep_id: &str) -> Result<(), AgentError>;

    async fn create_user(&self, payload: &UserPayload) -> Result<String, AgentError>;
    async fn update_user(&self, user_id: &str, payload: &UserPayload) -> Result<(), AgentError>;
    async fn move_user(&self, user_id: &str, org_id: &str, dep_id: &str) -> Result<(), AgentError>;
    async fn remove_user(&self, user_id: &str) -> Result<(), AgentError>;
}

pub struct TargetClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TargetClient {
    pub fn new(config: &AgentConfig) -> TargetClient {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builder should not fail with static config");

        TargetClient {
            http,
            base_url: config.target_base_url(),
            token: config.target.token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AgentError> {
        let response = self
            .http
            .get(self.url(path))
            .header("Authorization", &self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;
        Self::parse(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, AgentError> {
        let response = self
            .http
            .post(self.url(path))
            .header("Authorization", &self.token)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::parse(response).await
    }

    async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<(), AgentError> {
        let response = self
            .http
            .put(self.url(path))
            .header("Authorization", &self.token)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::parse_empty(response).await
    }

    async fn put_empty(&self, path: &str) -> Result<(), AgentError> {
        let response = self
            .http
            .put(self.url(path))
            .header("Authorization", &self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;
        Self::parse_empty(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), AgentError> {
        let response = self
            .http
            .delete(self.url(path))
            .header("Authorization", &self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;
        Self::parse_empty(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AgentError> {
        let status = response.status();
        // 200 and 201 are both accepted (spec.md §6); anything else is
        // classified by status family below.
        if status.is_success() {
            let body = response.text().await.map_err(transport_error)?;
            return serde_json::from_str(&body).map_err(|e| AgentError::TargetTransient {
                status: Some(status.as_u16()),
                source: format!("unparseable response body: {} ({})", e, body),
            });
        }
        Err(Self::status_error(response).await)
    }

    async fn parse_empty(response: reqwest::Response) -> Result<(), AgentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::status_error(response).await)
    }

    async fn status_error(response: reqwest::Response) -> AgentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            AgentError::TargetTransient {
                status: Some(status.as_u16()),
                source: body,
            }
        } else {
            AgentError::TargetRejected {
                status: status.as_u16(),
                body,
            }
        }
    }
}

fn transport_error(source: reqwest::Error) -> AgentError {
    AgentError::TargetTransient {
        status: source.status().map(|s| s.as_u16()),
        source: source.to_string(),
    }
}

#[async_trait]
impl TargetApi for TargetClient {
    async fn list_roots(&self) -> Result<Vec<RootInfo>, AgentError> {
        // spec.md §9(c): a single page at `limit=1000`, no cursor loop.
        let path = format!("/api/v1/account/org?page=1&limit={}", ROOT_PAGE_LIMIT);
        let response: RootListResponse = self.get(&path).await?;
        Ok(response.organizations)
    }

    async fn list_tree(&self, org_id: &str) -> Result<Vec<TreeNode>, AgentError> {
        let path = format!("/api/v1/account/org/{}/tree", org_id);
        let response: TreeResponse = self.get(&path).await?;
        Ok(response.tree_struct)
    }

    async fn list_users(&self) -> Result<Vec<TargetUserInfo>, AgentError> {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let path = format!("/api/v1/account/user?page={}&limit={}", page, USER_PAGE_LIMIT);
            let response: UserListResponse = self.get(&path).await?;
            if response.users.is_empty() {
                break;
            }
            all.extend(response.users);
            page += 1;
        }
        Ok(all)
    }

    async fn create_root(&self, name: &str, origin_id: &str) -> Result<String, AgentError> {
        let path = format!("/api/v1/account/org?orgName={}&originId={}", name, origin_id);
        let response: CreateOrgResponse = self.post(&path, &()).await?;
        Ok(response.org_id)
    }

    async fn create_department(
        &self,
        org_id: &str,
        name: &str,
        origin_id: &str,
        parent_id: Option<&str>,
    ) -> Result<String, AgentError> {
        let mut path = format!(
            "/api/v1/account/org/{}/department?department={}&originId={}",
            org_id, name, origin_id
        );
        if let Some(parent_id) = parent_id {
            path.push_str(&format!("&parentId={}", parent_id));
        }
        let response: CreateDepartmentResponse = self.post(&path, &()).await?;
        Ok(response.dep_id)
    }

    async fn rename_department(&self, org_id: &str, dep_id: &str, name: &str) -> Result<(), AgentError> {
        let path = format!("/api/v1/account/org/{}/department/{}", org_id, dep_id);
        self.put(&path, &NameBody { name }).await
    }

    async fn move_department(&self, org_id: &str, dep_id: &str, new_parent_id: &str) -> Result<(), AgentError> {
        let path = format!(
            "/api/v1/account/org/{}/department/{}/shift/{}",
            org_id, dep_id, new_parent_id
        );
        self.put_empty(&path).await
    }

    async fn delete_department(&self, org_id: &str, dep_id: &str) -> Result<(), AgentError> {
        let path = format!("/api/v1/account/org/{}/department/{}", org_id, dep_id);
        self.delete(&path).await
    }

    async fn create_user(&self, payload: &UserPayload) -> Result<String, AgentError> {
        let response: CreateUserResponse = self.post("/api/v1/account/user", payload).await?;
        Ok(response.user_id)
    }

    async fn update_user(&self, user_id: &str, payload: &UserPayload) -> Result<(), AgentError> {
        let path = format!("/api/v1/account/user/{}", user_id);
        self.put(&path, &UpdateUserEnvelope { propval: payload }).await
    }

    async fn move_user(&self, user_id: &str, org_id: &str, dep_id: &str) -> Result<(), AgentError> {
        let path = format!("/api/v1/account/user/{}/org/{}/department/{}", user_id, org_id, dep_id);
        self.put_empty(&path).await
    }

    async fn remove_user(&self, user_id: &str) -> Result<(), AgentError> {
        let path = format!("/api/v1/account/user/{}/lifecycle/remove", user_id);
        self.put_empty(&path).await
    }
}
