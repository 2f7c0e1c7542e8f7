//! The project tree store
//!
//! [`Workspace`] owns the Project → Task → Prompt tree together with the
//! current selection and settings. Every applied mutation swaps in a freshly
//! built tree and bumps the revision, so a [`Snapshot`] handed out earlier
//! never changes underneath its reader.
//!
//! Operations addressed by identifier return [`StoreError`] when the target
//! does not exist; the store is left exactly as it was in that case.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::models::{
    Language, Project, ProjectId, Prompt, PromptId, PromptUpdate, Settings, Snapshot,
    SweepReport, Task, TaskId, Theme, Trashable, ViewMode,
};
use crate::seed::seed_projects;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error("task {task_id} not found in project {project_id}")]
    TaskNotFound {
        project_id: ProjectId,
        task_id: TaskId,
    },

    #[error("prompt {prompt_id} not found in task {task_id}")]
    PromptNotFound { task_id: TaskId, prompt_id: PromptId },
}

/// The in-memory tree plus selection state
#[derive(Debug)]
pub struct Workspace {
    projects: Arc<Vec<Project>>,
    current_project_id: Option<ProjectId>,
    current_task_id: Option<TaskId>,
    settings: Settings,
    view_mode: ViewMode,
    revision: u64,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl Workspace {
    /// Creates an empty workspace on the system clock
    pub fn new(config: StoreConfig) -> Self {
        Self {
            projects: Arc::new(Vec::new()),
            current_project_id: None,
            current_task_id: None,
            settings: Settings::default(),
            view_mode: ViewMode::default(),
            revision: 0,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the tree with the example project and selects its first task
    pub fn with_seed(mut self) -> Self {
        let projects = seed_projects(self.clock.now());
        self.current_project_id = projects.first().map(|p| p.id);
        self.current_task_id = projects
            .first()
            .and_then(|p| p.tasks.first())
            .map(|t| t.id);
        self.projects = Arc::new(projects);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn current_project_id(&self) -> Option<ProjectId> {
        self.current_project_id
    }

    pub fn current_task_id(&self) -> Option<TaskId> {
        self.current_task_id
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Captures the current state. Cheap: the tree is shared, not copied.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            revision: self.revision,
            projects: Arc::clone(&self.projects),
            current_project_id: self.current_project_id,
            current_task_id: self.current_task_id,
            settings: self.settings,
            view_mode: self.view_mode,
            retention_secs: self.config.retention.num_seconds(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Applies `f` to a copy of the tree and publishes the copy
    fn rebuild(&mut self, f: impl FnOnce(&mut Vec<Project>)) {
        let mut next = Vec::clone(&self.projects);
        f(&mut next);
        self.projects = Arc::new(next);
        self.revision += 1;
    }

    /// Like [`Self::rebuild`], but nothing is published when `f` fails
    fn commit<T>(
        &mut self,
        f: impl FnOnce(&mut Vec<Project>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut next = Vec::clone(&self.projects);
        let out = f(&mut next)?;
        self.projects = Arc::new(next);
        self.revision += 1;
        Ok(out)
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    /// Clears selection pointers whose target no longer exists
    fn drop_dangling_selection(&mut self) {
        if let Some(id) = self.current_project_id {
            if !self.projects.iter().any(|p| p.id == id) {
                self.current_project_id = None;
                self.current_task_id = None;
            }
        }
        if let Some(id) = self.current_task_id {
            if !self.projects.iter().any(|p| p.task(id).is_some()) {
                self.current_task_id = None;
            }
        }
    }

    // --- Projects ---

    /// Appends a project and makes it the current one
    pub fn create_project(&mut self, name: String) -> ProjectId {
        let project = Project::new(name, self.now());
        let id = project.id;
        tracing::debug!(project = %id, name = %project.name, "create project");

        self.rebuild(|projects| projects.push(project));
        self.current_project_id = Some(id);
        self.current_task_id = None;
        id
    }

    pub fn rename_project(&mut self, id: ProjectId, name: String) -> Result<(), StoreError> {
        tracing::debug!(project = %id, name = %name, "rename project");
        self.commit(|projects| {
            project_mut(projects, id)?.name = name;
            Ok(())
        })
    }

    /// Moves a project to the trash. Its tasks and prompts keep their own flags.
    pub fn soft_delete_project(&mut self, id: ProjectId) -> Result<(), StoreError> {
        let now = self.now();
        tracing::debug!(project = %id, "soft delete project");
        self.commit(|projects| {
            project_mut(projects, id)?.set_deleted_at(Some(now));
            Ok(())
        })?;

        if self.current_project_id == Some(id) {
            self.current_project_id = None;
            self.current_task_id = None;
        }
        Ok(())
    }

    pub fn restore_project(&mut self, id: ProjectId) -> Result<(), StoreError> {
        tracing::debug!(project = %id, "restore project");
        self.commit(|projects| {
            project_mut(projects, id)?.set_deleted_at(None);
            Ok(())
        })
    }

    pub fn permanently_delete_project(&mut self, id: ProjectId) -> Result<(), StoreError> {
        tracing::debug!(project = %id, "permanently delete project");
        self.commit(|projects| remove_by_id(projects, id).ok_or(StoreError::ProjectNotFound(id)))?;
        self.drop_dangling_selection();
        Ok(())
    }

    /// Puts the active projects in the given order, trash last
    pub fn reorder_projects(&mut self, order: &[ProjectId]) {
        tracing::debug!(count = order.len(), "reorder projects");
        self.rebuild(|projects| reorder_active(projects, order));
    }

    // --- Tasks ---

    /// Appends a task to a project and makes it the current task
    pub fn create_task(&mut self, project_id: ProjectId, name: String) -> Result<TaskId, StoreError> {
        let task = Task::new(name);
        let id = task.id;
        tracing::debug!(project = %project_id, task = %id, name = %task.name, "create task");

        self.commit(|projects| {
            project_mut(projects, project_id)?.tasks.push(task);
            Ok(())
        })?;

        self.current_task_id = Some(id);
        Ok(id)
    }

    pub fn rename_task(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        name: String,
    ) -> Result<(), StoreError> {
        tracing::debug!(project = %project_id, task = %task_id, name = %name, "rename task");
        self.commit(|projects| {
            task_mut(projects, project_id, task_id)?.name = name;
            Ok(())
        })
    }

    pub fn soft_delete_task(&mut self, project_id: ProjectId, task_id: TaskId) -> Result<(), StoreError> {
        let now = self.now();
        tracing::debug!(project = %project_id, task = %task_id, "soft delete task");
        self.commit(|projects| {
            task_mut(projects, project_id, task_id)?.set_deleted_at(Some(now));
            Ok(())
        })?;

        if self.current_task_id == Some(task_id) {
            self.current_task_id = None;
        }
        Ok(())
    }

    pub fn restore_task(&mut self, project_id: ProjectId, task_id: TaskId) -> Result<(), StoreError> {
        tracing::debug!(project = %project_id, task = %task_id, "restore task");
        self.commit(|projects| {
            task_mut(projects, project_id, task_id)?.set_deleted_at(None);
            Ok(())
        })
    }

    pub fn permanently_delete_task(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<(), StoreError> {
        tracing::debug!(project = %project_id, task = %task_id, "permanently delete task");
        self.commit(|projects| {
            remove_by_id(&mut project_mut(projects, project_id)?.tasks, task_id).ok_or(
                StoreError::TaskNotFound {
                    project_id,
                    task_id,
                },
            )
        })?;
        self.drop_dangling_selection();
        Ok(())
    }

    pub fn reorder_tasks(&mut self, project_id: ProjectId, order: &[TaskId]) -> Result<(), StoreError> {
        tracing::debug!(project = %project_id, count = order.len(), "reorder tasks");
        self.commit(|projects| {
            reorder_active(&mut project_mut(projects, project_id)?.tasks, order);
            Ok(())
        })
    }

    // --- Prompts ---

    /// Inserts a prompt at the head of its task, newest first
    pub fn create_prompt(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        title: String,
        content: String,
    ) -> Result<PromptId, StoreError> {
        let prompt = Prompt::new(title, content, self.now());
        let id = prompt.id;
        tracing::debug!(project = %project_id, task = %task_id, prompt = %id, "create prompt");

        self.commit(|projects| {
            task_mut(projects, project_id, task_id)?
                .prompts
                .insert(0, prompt);
            Ok(id)
        })
    }

    pub fn rename_prompt(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
        title: String,
    ) -> Result<(), StoreError> {
        self.update_prompt_fields(project_id, task_id, prompt_id, PromptUpdate::title(title))
    }

    /// Merges any subset of title, content and deletion flag into a prompt
    pub fn update_prompt_fields(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
        update: PromptUpdate,
    ) -> Result<(), StoreError> {
        tracing::debug!(project = %project_id, task = %task_id, prompt = %prompt_id, ?update, "update prompt");
        self.commit(|projects| {
            prompt_mut(projects, project_id, task_id, prompt_id)?.apply(update);
            Ok(())
        })
    }

    pub fn soft_delete_prompt(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<(), StoreError> {
        let now = self.now();
        self.update_prompt_fields(
            project_id,
            task_id,
            prompt_id,
            PromptUpdate::deleted_at(Some(now)),
        )
    }

    pub fn restore_prompt(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<(), StoreError> {
        self.update_prompt_fields(project_id, task_id, prompt_id, PromptUpdate::deleted_at(None))
    }

    pub fn permanently_delete_prompt(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Result<(), StoreError> {
        tracing::debug!(project = %project_id, task = %task_id, prompt = %prompt_id, "permanently delete prompt");
        self.commit(|projects| {
            remove_by_id(&mut task_mut(projects, project_id, task_id)?.prompts, prompt_id).ok_or(
                StoreError::PromptNotFound { task_id, prompt_id },
            )
        })?;
        Ok(())
    }

    pub fn reorder_prompts(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        order: &[PromptId],
    ) -> Result<(), StoreError> {
        tracing::debug!(project = %project_id, task = %task_id, count = order.len(), "reorder prompts");
        self.commit(|projects| {
            reorder_active(&mut task_mut(projects, project_id, task_id)?.prompts, order);
            Ok(())
        })
    }

    // --- Selection and settings ---

    /// Selects a project (or none). The task selection is always cleared.
    pub fn set_current_project(&mut self, id: Option<ProjectId>) {
        self.current_project_id = id;
        self.current_task_id = None;
        self.bump();
    }

    pub fn set_current_task(&mut self, id: Option<TaskId>) {
        self.current_task_id = id;
        self.bump();
    }

    /// Changes whichever settings are given as one mutation.
    /// Nothing given is a no-op and keeps the revision.
    pub fn update_settings(&mut self, language: Option<Language>, theme: Option<Theme>) {
        if language.is_none() && theme.is_none() {
            return;
        }
        if let Some(language) = language {
            self.settings.language = language;
        }
        if let Some(theme) = theme {
            self.settings.theme = theme;
        }
        self.bump();
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.view_mode = view_mode;
        self.bump();
    }

    // --- Sweep ---

    /// Removes every entity whose deletion is at least one retention window old.
    ///
    /// Each level is filtered on its own: an expired prompt goes even when its
    /// task stays, and a removed project takes all of its children with it.
    pub fn sweep(&mut self) -> SweepReport {
        let cutoff = self.now() - self.config.retention;
        let mut next = Vec::clone(&self.projects);
        let mut report = SweepReport {
            projects: purge_expired(&mut next, cutoff),
            ..SweepReport::default()
        };

        for project in next.iter_mut() {
            report.tasks += purge_expired(&mut project.tasks, cutoff);
            for task in project.tasks.iter_mut() {
                report.prompts += purge_expired(&mut task.prompts, cutoff);
            }
        }

        if !report.is_empty() {
            self.projects = Arc::new(next);
            self.bump();
            self.drop_dangling_selection();
        }
        report
    }
}

fn project_mut(projects: &mut [Project], id: ProjectId) -> Result<&mut Project, StoreError> {
    projects
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or(StoreError::ProjectNotFound(id))
}

fn task_mut(
    projects: &mut [Project],
    project_id: ProjectId,
    task_id: TaskId,
) -> Result<&mut Task, StoreError> {
    project_mut(projects, project_id)?
        .tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or(StoreError::TaskNotFound {
            project_id,
            task_id,
        })
}

fn prompt_mut(
    projects: &mut [Project],
    project_id: ProjectId,
    task_id: TaskId,
    prompt_id: PromptId,
) -> Result<&mut Prompt, StoreError> {
    task_mut(projects, project_id, task_id)?
        .prompts
        .iter_mut()
        .find(|p| p.id == prompt_id)
        .ok_or(StoreError::PromptNotFound { task_id, prompt_id })
}

/// Removes the item with `id`, returning it if it was there
fn remove_by_id<T: Trashable>(items: &mut Vec<T>, id: T::Id) -> Option<T> {
    let position = items.iter().position(|item| item.id() == id)?;
    Some(items.remove(position))
}

/// Rebuilds `items` as: active items named in `order` (in that order), then
/// active items `order` left out (in their old order), then the trash (in its
/// old order). Unknown, trashed and repeated ids in `order` are skipped.
fn reorder_active<T: Trashable>(items: &mut Vec<T>, order: &[T::Id]) {
    let (mut active, trashed): (Vec<T>, Vec<T>) =
        std::mem::take(items).into_iter().partition(|item| item.is_active());

    let mut reordered = Vec::with_capacity(active.len() + trashed.len());
    for id in order {
        if let Some(position) = active.iter().position(|item| item.id() == *id) {
            reordered.push(active.remove(position));
        }
    }
    reordered.extend(active);
    reordered.extend(trashed);
    *items = reordered;
}

/// Drops expired items and returns how many went
fn purge_expired<T: Trashable>(items: &mut Vec<T>, cutoff: DateTime<Utc>) -> usize {
    let before = items.len();
    items.retain(|item| !item.is_expired(cutoff));
    before - items.len()
}
