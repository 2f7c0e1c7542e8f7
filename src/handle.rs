//! Shared handle to the store
//!
//! [`Core`] is what the server, clients and the sweeper hold. Every operation
//! runs under one lock, so a sweep can never observe or interleave with a
//! half-applied mutation, and the snapshot returned with each result is the
//! state that operation produced.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::config::StoreConfig;
use crate::models::{
    Language, ProjectId, PromptId, PromptUpdate, Snapshot, StoreResponse, SweepReport, TaskId,
    Theme, TrashEntry, ViewMode,
};
use crate::store::{StoreError, Workspace};

pub type CoreResult<T> = Result<StoreResponse<T>, StoreError>;

#[derive(Clone)]
pub struct Core {
    inner: Arc<Mutex<Workspace>>,
    update_tx: Arc<broadcast::Sender<u64>>,
}

impl Default for Core {
    fn default() -> Self {
        Self::new(Workspace::default())
    }
}

impl Core {
    pub fn new(workspace: Workspace) -> Self {
        // Create a broadcast channel with capacity for 100 messages
        let (tx, _rx) = broadcast::channel(100);

        Self {
            inner: Arc::new(Mutex::new(workspace)),
            update_tx: Arc::new(tx),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Workspace> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("workspace lock was poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }

    // Runs `f` under the lock and tells subscribers when the revision moved
    fn with_workspace<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Workspace) -> R,
    {
        let mut workspace = self.lock();
        let before = workspace.revision();

        let result = f(&mut workspace);

        let after = workspace.revision();
        if after != before {
            // No receivers is fine
            let _ = self.update_tx.send(after);
        }

        result
    }

    fn apply<T, F>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Workspace) -> Result<T, StoreError>,
    {
        self.with_workspace(|workspace| {
            let res = f(workspace)?;
            Ok(StoreResponse::new(res, workspace.snapshot()))
        })
    }

    fn apply_infallible<T, F>(&self, f: F) -> StoreResponse<T>
    where
        F: FnOnce(&mut Workspace) -> T,
    {
        self.with_workspace(|workspace| {
            let res = f(workspace);
            StoreResponse::new(res, workspace.snapshot())
        })
    }

    /// Receives the new revision after every applied mutation
    pub fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.update_tx.subscribe()
    }

    pub fn config(&self) -> StoreConfig {
        *self.lock().config()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn trash(&self) -> Vec<TrashEntry> {
        self.snapshot().trash()
    }

    // --- Projects ---

    pub fn create_project(&self, name: String) -> StoreResponse<ProjectId> {
        self.apply_infallible(|ws| ws.create_project(name))
    }

    pub fn rename_project(&self, id: ProjectId, name: String) -> CoreResult<()> {
        self.apply(|ws| ws.rename_project(id, name))
    }

    pub fn soft_delete_project(&self, id: ProjectId) -> CoreResult<()> {
        self.apply(|ws| ws.soft_delete_project(id))
    }

    pub fn restore_project(&self, id: ProjectId) -> CoreResult<()> {
        self.apply(|ws| ws.restore_project(id))
    }

    pub fn permanently_delete_project(&self, id: ProjectId) -> CoreResult<()> {
        self.apply(|ws| ws.permanently_delete_project(id))
    }

    pub fn reorder_projects(&self, order: Vec<ProjectId>) -> StoreResponse<()> {
        self.apply_infallible(|ws| ws.reorder_projects(&order))
    }

    // --- Tasks ---

    pub fn create_task(&self, project_id: ProjectId, name: String) -> CoreResult<TaskId> {
        self.apply(|ws| ws.create_task(project_id, name))
    }

    pub fn rename_task(&self, project_id: ProjectId, task_id: TaskId, name: String) -> CoreResult<()> {
        self.apply(|ws| ws.rename_task(project_id, task_id, name))
    }

    pub fn soft_delete_task(&self, project_id: ProjectId, task_id: TaskId) -> CoreResult<()> {
        self.apply(|ws| ws.soft_delete_task(project_id, task_id))
    }

    pub fn restore_task(&self, project_id: ProjectId, task_id: TaskId) -> CoreResult<()> {
        self.apply(|ws| ws.restore_task(project_id, task_id))
    }

    pub fn permanently_delete_task(&self, project_id: ProjectId, task_id: TaskId) -> CoreResult<()> {
        self.apply(|ws| ws.permanently_delete_task(project_id, task_id))
    }

    pub fn reorder_tasks(&self, project_id: ProjectId, order: Vec<TaskId>) -> CoreResult<()> {
        self.apply(|ws| ws.reorder_tasks(project_id, &order))
    }

    // --- Prompts ---

    pub fn create_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        title: String,
        content: String,
    ) -> CoreResult<PromptId> {
        self.apply(|ws| ws.create_prompt(project_id, task_id, title, content))
    }

    pub fn rename_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
        title: String,
    ) -> CoreResult<()> {
        self.apply(|ws| ws.rename_prompt(project_id, task_id, prompt_id, title))
    }

    pub fn update_prompt_fields(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
        update: PromptUpdate,
    ) -> CoreResult<()> {
        self.apply(|ws| ws.update_prompt_fields(project_id, task_id, prompt_id, update))
    }

    pub fn soft_delete_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> CoreResult<()> {
        self.apply(|ws| ws.soft_delete_prompt(project_id, task_id, prompt_id))
    }

    pub fn restore_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> CoreResult<()> {
        self.apply(|ws| ws.restore_prompt(project_id, task_id, prompt_id))
    }

    pub fn permanently_delete_prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> CoreResult<()> {
        self.apply(|ws| ws.permanently_delete_prompt(project_id, task_id, prompt_id))
    }

    pub fn reorder_prompts(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        order: Vec<PromptId>,
    ) -> CoreResult<()> {
        self.apply(|ws| ws.reorder_prompts(project_id, task_id, &order))
    }

    // --- Selection and settings ---

    pub fn set_current_project(&self, id: Option<ProjectId>) -> StoreResponse<()> {
        self.apply_infallible(|ws| ws.set_current_project(id))
    }

    pub fn set_current_task(&self, id: Option<TaskId>) -> StoreResponse<()> {
        self.apply_infallible(|ws| ws.set_current_task(id))
    }

    /// Updates whichever settings are given
    pub fn update_settings(&self, language: Option<Language>, theme: Option<Theme>) -> StoreResponse<()> {
        self.apply_infallible(|ws| ws.update_settings(language, theme))
    }

    pub fn set_view_mode(&self, view_mode: ViewMode) -> StoreResponse<()> {
        self.apply_infallible(|ws| ws.set_view_mode(view_mode))
    }

    /// Runs one sweep pass now
    pub fn sweep(&self) -> StoreResponse<SweepReport> {
        let response = self.apply_infallible(|ws| ws.sweep());
        let report = response.inner();
        if report.is_empty() {
            tracing::trace!("sweep found nothing to purge");
        } else {
            tracing::info!(
                projects = report.projects,
                tasks = report.tasks,
                prompts = report.prompts,
                "purged expired trash"
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, Utc};

    fn core_with_clock() -> (Core, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let core = Core::new(Workspace::default().with_clock(Arc::new(clock.clone())));
        (core, clock)
    }

    #[test]
    fn test_core_returns_snapshot_of_its_own_mutation() {
        let (core, _) = core_with_clock();
        let created = core.create_project("P".to_string());
        let project_id = *created.inner();
        assert_eq!(created.snapshot.current_project_id, Some(project_id));
        assert_eq!(created.snapshot.revision, 1);

        let task = core.create_task(project_id, "T".to_string()).unwrap();
        assert_eq!(task.snapshot.current_task_id, Some(*task.inner()));
        assert_eq!(core.snapshot().revision, 2);
    }

    #[test]
    fn test_core_surfaces_not_found() {
        let (core, _) = core_with_clock();
        let ghost = ProjectId::new();
        let err = core.soft_delete_project(ghost).unwrap_err();
        assert_eq!(err, StoreError::ProjectNotFound(ghost));
        assert_eq!(core.snapshot().revision, 0);
    }

    #[tokio::test]
    async fn test_subscribers_see_each_applied_revision() {
        let (core, _) = core_with_clock();
        let mut rx = core.subscribe();

        let project = *core.create_project("P".to_string()).inner();
        assert!(core.restore_project(ProjectId::new()).is_err());
        core.soft_delete_project(project).unwrap();

        assert_eq!(rx.recv().await.unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_core_sweep_and_trash() {
        let (core, clock) = core_with_clock();
        let project = *core.create_project("P".to_string()).inner();
        core.soft_delete_project(project).unwrap();
        assert_eq!(core.trash().len(), 1);

        clock.advance(Duration::hours(25));
        let swept = core.sweep();
        assert_eq!(swept.inner().projects, 1);
        assert!(swept.snapshot.projects.is_empty());
        assert!(core.trash().is_empty());
    }

    #[test]
    fn test_update_settings_applies_given_fields() {
        let core = Core::default();
        core.update_settings(Some(Language::De), None);
        let settings = core.snapshot().settings;
        assert_eq!(settings.language, Language::De);
        assert_eq!(settings.theme, Theme::Light);

        core.update_settings(None, Some(Theme::Dark));
        assert_eq!(core.snapshot().settings.language, Language::De);
        assert_eq!(core.snapshot().settings.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn test_update_settings_is_one_revision() {
        let (core, _) = core_with_clock();
        let mut rx = core.subscribe();

        let updated = core.update_settings(Some(Language::Fr), Some(Theme::Dark));
        assert_eq!(updated.snapshot.revision, 1);
        assert_eq!(updated.snapshot.settings.language, Language::Fr);
        assert_eq!(updated.snapshot.settings.theme, Theme::Dark);

        core.update_settings(None, None);
        assert_eq!(core.snapshot().revision, 1);

        assert_eq!(rx.recv().await.unwrap(), 1);
        assert!(rx.try_recv().is_err());
    }
}
