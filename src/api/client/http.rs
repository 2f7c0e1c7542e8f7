//! HTTP client implementation
//!
//! Talks to a running promptshelf server through its JSON API.

use std::sync::Arc;

use reqwest::{Client as ReqwestClient, Error as ReqwestError, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::Client;
use crate::api::server::{
    ApiResponse, CreatePromptRequest, NameRequest, OrderRequest, SelectRequest, SettingsRequest,
    TitleRequest, ViewModeRequest,
};
use crate::config::DEFAULT_PORT;
use crate::models::{
    Language, ProjectId, PromptId, PromptUpdate, Snapshot, StoreResponse, SweepReport, TaskId,
    Theme, TrashEntry, ViewMode,
};

/// API client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://localhost:{}", DEFAULT_PORT),
        }
    }
}

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] ReqwestError),

    #[error("API error: {0}")]
    Api(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Missing data in response")]
    MissingData,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// API client for a promptshelf server
#[derive(Debug, Clone)]
pub struct HttpClient {
    http_client: Arc<ReqwestClient>,
    config: ClientConfig,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Create a new client with default configuration
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            http_client: Arc::new(ReqwestClient::new()),
            config,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn project_path(project_id: ProjectId) -> String {
        format!("/projects/{}", project_id)
    }

    fn task_path(project_id: ProjectId, task_id: TaskId) -> String {
        format!("/projects/{}/tasks/{}", project_id, task_id)
    }

    fn prompt_path(project_id: ProjectId, task_id: TaskId, prompt_id: PromptId) -> String {
        format!(
            "/projects/{}/tasks/{}/prompts/{}",
            project_id, task_id, prompt_id
        )
    }

    /// Sends the request and unwraps the response envelope
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        let api_response: ApiResponse<T> = match response.json().await {
            Ok(api_response) => api_response,
            // Extractor rejections are plain text, not the envelope
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api(format!("HTTP error: {}", status)))
            }
            Err(e) => return Err(ClientError::Http(e)),
        };

        if api_response.success {
            return api_response.data.ok_or(ClientError::MissingData);
        }

        let message = api_response
            .error
            .unwrap_or_else(|| "Unknown API error".to_string());
        if status == StatusCode::NOT_FOUND {
            Err(ClientError::NotFound(message))
        } else {
            Err(ClientError::Api(message))
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.http_client.get(self.url(path))).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.http_client.post(self.url(path))).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.http_client.delete(self.url(path))).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.http_client.post(self.url(path)).json(body))
            .await
    }

    async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.http_client.put(self.url(path)).json(body))
            .await
    }
}

#[async_trait::async_trait]
impl Client for HttpClient {
    async fn snapshot(&self) -> Result<Snapshot, ClientError> {
        self.get("/snapshot").await
    }

    async fn trash(&self) -> Result<Vec<TrashEntry>, ClientError> {
        self.get("/trash").await
    }

    async fn create_project(&self, name: String) -> Result<StoreResponse<ProjectId>, ClientError> {
        self.post_json("/projects", &NameRequest { name }).await
    }

    async fn rename_project(
        &self,
        project_id: ProjectId,
        name: String,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.put_json(&Self::project_path(project_id), &NameRequest { name })
            .await
    }

    async fn soft_delete_project(
        &self,
        project_id: ProjectId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.delete(&Self::project_path(project_id)).await
    }

    async fn restore_project(&self, project_id: ProjectId) -> Result<StoreResponse<()>, ClientError> {
        self.post(&format!("{}/restore", Self::project_path(project_id)))
            .await
    }

    async fn permanently_delete_project(
        &self,
        project_id: ProjectId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.delete(&format!("{}/permanent", Self::project_path(project_id)))
            .await
    }

    async fn reorder_projects(
        &self,
        order: Vec<ProjectId>,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.put_json("/projects", &OrderRequest { ids: order }).await
    }

    async fn create_task(
        &self,
        project_id: ProjectId,
        name: String,
    ) -> Result<StoreResponse<TaskId>, ClientError> {
        self.post_json(
            &format!("{}/tasks", Self::project_path(project_id)),
            &NameRequest { name },
        )
        .await
    }

    async fn rename_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        name: String,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.put_json(&Self::task_path(project_id, task_id), &NameRequest { name })
            .await
    }

    async fn soft_delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.delete(&Self::task_path(project_id, task_id)).await
    }

    async fn restore_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.post(&format!("{}/restore", Self::task_path(project_id, task_id)))
            .await
    }

    async fn permanently_delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.delete(&format!("{}/permanent", Self::task_path(project_id, task_id)))
            .await
    }

    async fn reorder_tasks(
        &self,
        project_id: ProjectId,
        order: Vec<TaskId>,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.put_json(
            &format!("{}/tasks", Self::project_path(project_id)),
            &OrderRequest { ids: order },
        )
        .await
    }

    async fn create_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        title: String,
        content: String,
    ) -> Result<StoreResponse<PromptId>, ClientError> {
        self.post_json(
            &format!("{}/prompts", Self::task_path(project_id, task_id)),
            &CreatePromptRequest { title, content },
        )
        .await
    }

    async fn rename_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
        title: String,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.put_json(
            &Self::prompt_path(project_id, task_id, prompt_id),
            &TitleRequest { title },
        )
        .await
    }

    async fn update_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
        update: PromptUpdate,
    ) -> Result<StoreResponse<()>, ClientError> {
        let request = self
            .http_client
            .patch(self.url(&Self::prompt_path(project_id, task_id, prompt_id)))
            .json(&update);
        self.send(request).await
    }

    async fn soft_delete_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.delete(&Self::prompt_path(project_id, task_id, prompt_id))
            .await
    }

    async fn restore_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.post(&format!(
            "{}/restore",
            Self::prompt_path(project_id, task_id, prompt_id)
        ))
        .await
    }

    async fn permanently_delete_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.delete(&format!(
            "{}/permanent",
            Self::prompt_path(project_id, task_id, prompt_id)
        ))
        .await
    }

    async fn reorder_prompts(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        order: Vec<PromptId>,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.put_json(
            &format!("{}/prompts", Self::task_path(project_id, task_id)),
            &OrderRequest { ids: order },
        )
        .await
    }

    async fn set_current_project(
        &self,
        project_id: Option<ProjectId>,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.put_json("/selection/project", &SelectRequest { id: project_id })
            .await
    }

    async fn set_current_task(
        &self,
        task_id: Option<TaskId>,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.put_json("/selection/task", &SelectRequest { id: task_id })
            .await
    }

    async fn update_settings(
        &self,
        language: Option<Language>,
        theme: Option<Theme>,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.put_json("/settings", &SettingsRequest { language, theme })
            .await
    }

    async fn set_view_mode(&self, mode: ViewMode) -> Result<StoreResponse<()>, ClientError> {
        self.put_json("/view-mode", &ViewModeRequest { mode }).await
    }

    async fn sweep(&self) -> Result<StoreResponse<SweepReport>, ClientError> {
        self.post("/sweep").await
    }
}
