//! Core client implementation
//!
//! This module provides a client implementation that wraps Core directly,
//! providing the same interface as HttpClient but without HTTP overhead.

use super::{Client, ClientError};
use crate::models::{
    Language, ProjectId, PromptId, PromptUpdate, Snapshot, StoreResponse, SweepReport, TaskId,
    Theme, TrashEntry, ViewMode,
};
use crate::{Core, StoreError};

/// A client implementation that wraps Core directly
#[derive(Clone)]
pub struct CoreClient {
    core: Core,
}

impl CoreClient {
    /// Create a new CoreClient with the given Core instance
    pub fn new(core: Core) -> Self {
        Self { core }
    }
}

/// Convert StoreError to ClientError for interface compatibility
impl From<StoreError> for ClientError {
    fn from(error: StoreError) -> Self {
        ClientError::NotFound(error.to_string())
    }
}

#[async_trait::async_trait]
impl Client for CoreClient {
    async fn snapshot(&self) -> Result<Snapshot, ClientError> {
        Ok(self.core.snapshot())
    }

    async fn trash(&self) -> Result<Vec<TrashEntry>, ClientError> {
        Ok(self.core.trash())
    }

    async fn create_project(&self, name: String) -> Result<StoreResponse<ProjectId>, ClientError> {
        Ok(self.core.create_project(name))
    }

    async fn rename_project(
        &self,
        project_id: ProjectId,
        name: String,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .rename_project(project_id, name)
            .map_err(ClientError::from)
    }

    async fn soft_delete_project(
        &self,
        project_id: ProjectId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .soft_delete_project(project_id)
            .map_err(ClientError::from)
    }

    async fn restore_project(&self, project_id: ProjectId) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .restore_project(project_id)
            .map_err(ClientError::from)
    }

    async fn permanently_delete_project(
        &self,
        project_id: ProjectId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .permanently_delete_project(project_id)
            .map_err(ClientError::from)
    }

    async fn reorder_projects(
        &self,
        order: Vec<ProjectId>,
    ) -> Result<StoreResponse<()>, ClientError> {
        Ok(self.core.reorder_projects(order))
    }

    async fn create_task(
        &self,
        project_id: ProjectId,
        name: String,
    ) -> Result<StoreResponse<TaskId>, ClientError> {
        self.core
            .create_task(project_id, name)
            .map_err(ClientError::from)
    }

    async fn rename_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        name: String,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .rename_task(project_id, task_id, name)
            .map_err(ClientError::from)
    }

    async fn soft_delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .soft_delete_task(project_id, task_id)
            .map_err(ClientError::from)
    }

    async fn restore_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .restore_task(project_id, task_id)
            .map_err(ClientError::from)
    }

    async fn permanently_delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .permanently_delete_task(project_id, task_id)
            .map_err(ClientError::from)
    }

    async fn reorder_tasks(
        &self,
        project_id: ProjectId,
        order: Vec<TaskId>,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .reorder_tasks(project_id, order)
            .map_err(ClientError::from)
    }

    async fn create_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        title: String,
        content: String,
    ) -> Result<StoreResponse<PromptId>, ClientError> {
        self.core
            .create_prompt(project_id, task_id, title, content)
            .map_err(ClientError::from)
    }

    async fn rename_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
        title: String,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .rename_prompt(project_id, task_id, prompt_id, title)
            .map_err(ClientError::from)
    }

    async fn update_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
        update: PromptUpdate,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .update_prompt_fields(project_id, task_id, prompt_id, update)
            .map_err(ClientError::from)
    }

    async fn soft_delete_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .soft_delete_prompt(project_id, task_id, prompt_id)
            .map_err(ClientError::from)
    }

    async fn restore_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .restore_prompt(project_id, task_id, prompt_id)
            .map_err(ClientError::from)
    }

    async fn permanently_delete_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .permanently_delete_prompt(project_id, task_id, prompt_id)
            .map_err(ClientError::from)
    }

    async fn reorder_prompts(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        order: Vec<PromptId>,
    ) -> Result<StoreResponse<()>, ClientError> {
        self.core
            .reorder_prompts(project_id, task_id, order)
            .map_err(ClientError::from)
    }

    async fn set_current_project(
        &self,
        project_id: Option<ProjectId>,
    ) -> Result<StoreResponse<()>, ClientError> {
        Ok(self.core.set_current_project(project_id))
    }

    async fn set_current_task(
        &self,
        task_id: Option<TaskId>,
    ) -> Result<StoreResponse<()>, ClientError> {
        Ok(self.core.set_current_task(task_id))
    }

    async fn update_settings(
        &self,
        language: Option<Language>,
        theme: Option<Theme>,
    ) -> Result<StoreResponse<()>, ClientError> {
        Ok(self.core.update_settings(language, theme))
    }

    async fn set_view_mode(&self, mode: ViewMode) -> Result<StoreResponse<()>, ClientError> {
        Ok(self.core.set_view_mode(mode))
    }

    async fn sweep(&self) -> Result<StoreResponse<SweepReport>, ClientError> {
        Ok(self.core.sweep())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CoreClient {
        CoreClient::new(Core::default())
    }

    #[tokio::test]
    async fn test_core_client_round_trip() {
        let client = client();
        let project_id = client
            .create_project("Marketing Campaign".to_string())
            .await
            .unwrap()
            .into_inner();
        let task_id = client
            .create_task(project_id, "Social Media".to_string())
            .await
            .unwrap()
            .into_inner();
        let prompt_id = client
            .create_prompt(
                project_id,
                task_id,
                "Instagram Caption".to_string(),
                String::new(),
            )
            .await
            .unwrap()
            .into_inner();

        let response = client
            .update_prompt(
                project_id,
                task_id,
                prompt_id,
                PromptUpdate::content("Write a caption"),
            )
            .await
            .unwrap();
        let prompt = response
            .snapshot
            .prompt(project_id, task_id, prompt_id)
            .unwrap();
        assert_eq!(prompt.title, "Instagram Caption");
        assert_eq!(prompt.content, "Write a caption");
        assert_eq!(client.snapshot().await.unwrap(), response.snapshot);
    }

    #[tokio::test]
    async fn test_core_client_maps_not_found() {
        let client = client();
        let ghost = ProjectId::new();

        let err = client
            .create_task(ghost, "Orphan".to_string())
            .await
            .unwrap_err();
        match err {
            ClientError::NotFound(message) => {
                assert_eq!(message, format!("project {} not found", ghost))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_core_client_trash_and_restore() {
        let client = client();
        let project_id = client
            .create_project("P".to_string())
            .await
            .unwrap()
            .into_inner();

        client.soft_delete_project(project_id).await.unwrap();
        let trash = client.trash().await.unwrap();
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].project_id, project_id);

        client.restore_project(project_id).await.unwrap();
        assert!(client.trash().await.unwrap().is_empty());
    }
}
