//! Client trait definition
//!
//! This module defines the `Client` trait that abstracts over different client implementations.

use super::ClientError;
use crate::models::{
    Language, ProjectId, PromptId, PromptUpdate, Snapshot, StoreResponse, SweepReport, TaskId,
    Theme, TrashEntry, ViewMode,
};

/// Trait defining the API client interface for the promptshelf store
#[async_trait::async_trait]
pub trait Client {
    /// Get the current state of the whole store
    async fn snapshot(&self) -> Result<Snapshot, ClientError>;

    /// List every soft-deleted entity, newest first
    async fn trash(&self) -> Result<Vec<TrashEntry>, ClientError>;

    /// Create a project and make it the current one
    async fn create_project(&self, name: String) -> Result<StoreResponse<ProjectId>, ClientError>;

    async fn rename_project(
        &self,
        project_id: ProjectId,
        name: String,
    ) -> Result<StoreResponse<()>, ClientError>;

    /// Move a project to the trash; its tasks keep their own flags
    async fn soft_delete_project(
        &self,
        project_id: ProjectId,
    ) -> Result<StoreResponse<()>, ClientError>;

    async fn restore_project(&self, project_id: ProjectId) -> Result<StoreResponse<()>, ClientError>;

    /// Remove a project and everything under it
    async fn permanently_delete_project(
        &self,
        project_id: ProjectId,
    ) -> Result<StoreResponse<()>, ClientError>;

    /// Reorder the active projects; trashed ones move to the end in their old order
    async fn reorder_projects(&self, order: Vec<ProjectId>)
        -> Result<StoreResponse<()>, ClientError>;

    /// Create a task under a project and make it the current one
    async fn create_task(
        &self,
        project_id: ProjectId,
        name: String,
    ) -> Result<StoreResponse<TaskId>, ClientError>;

    async fn rename_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        name: String,
    ) -> Result<StoreResponse<()>, ClientError>;

    async fn soft_delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<StoreResponse<()>, ClientError>;

    async fn restore_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<StoreResponse<()>, ClientError>;

    async fn permanently_delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<StoreResponse<()>, ClientError>;

    async fn reorder_tasks(
        &self,
        project_id: ProjectId,
        order: Vec<TaskId>,
    ) -> Result<StoreResponse<()>, ClientError>;

    /// Add a prompt at the head of a task's list
    async fn create_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        title: String,
        content: String,
    ) -> Result<StoreResponse<PromptId>, ClientError>;

    async fn rename_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
        title: String,
    ) -> Result<StoreResponse<()>, ClientError>;

    /// Apply a partial update to a prompt
    async fn update_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
        update: PromptUpdate,
    ) -> Result<StoreResponse<()>, ClientError>;

    async fn soft_delete_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<StoreResponse<()>, ClientError>;

    async fn restore_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<StoreResponse<()>, ClientError>;

    async fn permanently_delete_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<StoreResponse<()>, ClientError>;

    async fn reorder_prompts(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        order: Vec<PromptId>,
    ) -> Result<StoreResponse<()>, ClientError>;

    /// Select a project (or none); always clears the current task
    async fn set_current_project(
        &self,
        project_id: Option<ProjectId>,
    ) -> Result<StoreResponse<()>, ClientError>;

    async fn set_current_task(&self, task_id: Option<TaskId>)
        -> Result<StoreResponse<()>, ClientError>;

    /// Change whichever settings are given
    async fn update_settings(
        &self,
        language: Option<Language>,
        theme: Option<Theme>,
    ) -> Result<StoreResponse<()>, ClientError>;

    async fn set_view_mode(&self, mode: ViewMode) -> Result<StoreResponse<()>, ClientError>;

    /// Purge trash older than the retention window right away
    async fn sweep(&self) -> Result<StoreResponse<SweepReport>, ClientError>;
}
