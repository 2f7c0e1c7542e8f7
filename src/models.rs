//! Core models for the promptshelf library
//!
//! This module contains the entity records of the Project → Task → Prompt tree,
//! the partial-update and settings types, and the immutable [`Snapshot`] that
//! consumers read after every mutation.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Project`]
    ProjectId
);
entity_id!(
    /// Identifier of a [`Task`]
    TaskId
);
entity_id!(
    /// Identifier of a [`Prompt`]
    PromptId
);

/// Records that can sit in the trash.
///
/// Generic list helpers in the store (reorder, purge, soft delete) work over
/// any collection of these.
pub trait Trashable {
    type Id: Copy + PartialEq + fmt::Display;

    fn id(&self) -> Self::Id;
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
    fn set_deleted_at(&mut self, deleted_at: Option<DateTime<Utc>>);

    fn is_active(&self) -> bool {
        self.deleted_at().is_none()
    }

    /// True when the record was soft-deleted at or before `cutoff`
    fn is_expired(&self, cutoff: DateTime<Utc>) -> bool {
        matches!(self.deleted_at(), Some(deleted_at) if deleted_at <= cutoff)
    }
}

/// A reusable piece of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: PromptId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Prompt {
    pub fn new(title: String, content: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: PromptId::new(),
            title,
            content,
            created_at,
            deleted_at: None,
        }
    }

    /// Merges a partial update into this prompt
    pub(crate) fn apply(&mut self, update: PromptUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(deleted_at) = update.deleted_at {
            self.deleted_at = deleted_at;
        }
    }
}

/// A group of prompts inside a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub prompts: Vec<Prompt>,
}

impl Task {
    pub fn new(name: String) -> Self {
        Self {
            id: TaskId::new(),
            name,
            deleted_at: None,
            prompts: Vec::new(),
        }
    }

    /// Prompts whose own deletion flag is unset, in display order
    pub fn active_prompts(&self) -> impl Iterator<Item = &Prompt> {
        self.prompts.iter().filter(|p| p.is_active())
    }

    pub fn prompt(&self, id: PromptId) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == id)
    }
}

/// The top-level grouping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub tasks: Vec<Task>,
}

impl Project {
    pub fn new(name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ProjectId::new(),
            name,
            created_at,
            deleted_at: None,
            tasks: Vec::new(),
        }
    }

    /// Tasks whose own deletion flag is unset, in display order
    pub fn active_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.is_active())
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

macro_rules! impl_trashable {
    ($ty:ty, $id:ty) => {
        impl Trashable for $ty {
            type Id = $id;

            fn id(&self) -> $id {
                self.id
            }

            fn deleted_at(&self) -> Option<DateTime<Utc>> {
                self.deleted_at
            }

            fn set_deleted_at(&mut self, deleted_at: Option<DateTime<Utc>>) {
                self.deleted_at = deleted_at;
            }
        }
    };
}

impl_trashable!(Project, ProjectId);
impl_trashable!(Task, TaskId);
impl_trashable!(Prompt, PromptId);

/// A partial update of a prompt. Absent fields are left untouched.
///
/// `deleted_at` distinguishes "leave as is" (`None`) from "clear the flag"
/// (`Some(None)`); in JSON that is a missing key versus an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<Option<DateTime<Utc>>>,
}

impl PromptUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        Self {
            deleted_at: Some(deleted_at),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.deleted_at.is_none()
    }
}

// A key that is present (even as null) deserializes to Some.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Interface language of the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
    De,
    Es,
    #[default]
    It,
    Ru,
}

impl Language {
    /// Name of the language in that language
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Fr => "Français",
            Language::De => "Deutsch",
            Language::Es => "Español",
            Language::It => "Italiano",
            Language::Ru => "Русский",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// How the consumer presents the prompts of the current task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Flow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub language: Language,
    pub theme: Theme,
}

/// Which level of the tree a trash entry comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrashKind {
    Project,
    Task,
    Prompt,
}

/// One soft-deleted entity, flattened for listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashEntry {
    pub kind: TrashKind,
    /// Identifier of the deleted entity itself
    pub id: Uuid,
    pub project_id: ProjectId,
    pub task_id: Option<TaskId>,
    pub name: String,
    pub deleted_at: DateTime<Utc>,
    /// When a sweep may remove it for good
    pub expires_at: DateTime<Utc>,
    /// Where the entity lives, e.g. `"Marketing Campaign / Social Media"`
    pub context: String,
}

/// How many entities a sweep pass removed at each level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SweepReport {
    pub projects: usize,
    pub tasks: usize,
    pub prompts: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.projects + self.tasks + self.prompts
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// An immutable view of the whole store at one revision.
///
/// The project tree is shared with the store until the next mutation, which
/// swaps in a new tree and leaves this one untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub revision: u64,
    pub projects: Arc<Vec<Project>>,
    pub current_project_id: Option<ProjectId>,
    pub current_task_id: Option<TaskId>,
    pub settings: Settings,
    pub view_mode: ViewMode,
    /// Retention window of the store that produced this snapshot
    pub retention_secs: i64,
}

impl Snapshot {
    pub fn retention(&self) -> Duration {
        Duration::seconds(self.retention_secs)
    }

    pub fn active_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| p.is_active())
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn task(&self, project_id: ProjectId, task_id: TaskId) -> Option<&Task> {
        self.project(project_id)?.task(task_id)
    }

    pub fn prompt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        prompt_id: PromptId,
    ) -> Option<&Prompt> {
        self.task(project_id, task_id)?.prompt(prompt_id)
    }

    /// Active tasks of a project; empty when the project is unknown
    pub fn active_tasks(&self, project_id: ProjectId) -> Vec<&Task> {
        self.project(project_id)
            .map(|p| p.active_tasks().collect())
            .unwrap_or_default()
    }

    /// Active prompts of a task; empty when the task is unknown
    pub fn active_prompts(&self, project_id: ProjectId, task_id: TaskId) -> Vec<&Prompt> {
        self.task(project_id, task_id)
            .map(|t| t.active_prompts().collect())
            .unwrap_or_default()
    }

    /// The selected project, unless it is missing or in the trash
    pub fn current_project(&self) -> Option<&Project> {
        self.current_project_id
            .and_then(|id| self.project(id))
            .filter(|p| p.is_active())
    }

    /// The selected task of the selected project, unless either is in the trash
    pub fn current_task(&self) -> Option<&Task> {
        let task_id = self.current_task_id?;
        self.current_project()?
            .task(task_id)
            .filter(|t| t.is_active())
    }

    /// Every soft-deleted entity at any depth, most recently deleted first
    pub fn trash(&self) -> Vec<TrashEntry> {
        let retention = self.retention();
        let mut entries = Vec::new();

        for project in self.projects.iter() {
            if let Some(deleted_at) = project.deleted_at {
                entries.push(TrashEntry {
                    kind: TrashKind::Project,
                    id: *project.id.as_uuid(),
                    project_id: project.id,
                    task_id: None,
                    name: project.name.clone(),
                    deleted_at,
                    expires_at: deleted_at + retention,
                    context: "Project".to_string(),
                });
            }

            for task in &project.tasks {
                if let Some(deleted_at) = task.deleted_at {
                    entries.push(TrashEntry {
                        kind: TrashKind::Task,
                        id: *task.id.as_uuid(),
                        project_id: project.id,
                        task_id: Some(task.id),
                        name: task.name.clone(),
                        deleted_at,
                        expires_at: deleted_at + retention,
                        context: format!("Project: {}", project.name),
                    });
                }

                for prompt in &task.prompts {
                    if let Some(deleted_at) = prompt.deleted_at {
                        entries.push(TrashEntry {
                            kind: TrashKind::Prompt,
                            id: *prompt.id.as_uuid(),
                            project_id: project.id,
                            task_id: Some(task.id),
                            name: prompt.title.clone(),
                            deleted_at,
                            expires_at: deleted_at + retention,
                            context: format!("{} / {}", project.name, task.name),
                        });
                    }
                }
            }
        }

        // Stable sort keeps tree order among equal timestamps
        entries.sort_by_key(|entry| Reverse(entry.deleted_at));
        entries
    }
}

/// A result together with the state it produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreResponse<T> {
    pub res: T,
    pub snapshot: Snapshot,
}

impl<T> StoreResponse<T> {
    pub fn new(res: T, snapshot: Snapshot) -> Self {
        Self { res, snapshot }
    }

    pub fn inner(&self) -> &T {
        &self.res
    }

    pub fn into_inner(self) -> T {
        self.res
    }

    pub fn replace<B>(self, res: B) -> StoreResponse<B> {
        StoreResponse {
            res,
            snapshot: self.snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_id_round_trips_through_display() {
        let id = TaskId::new();
        let parsed: TaskId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<TaskId>().is_err());
    }

    #[test]
    fn test_expiry_is_inclusive_of_cutoff() {
        let mut prompt = Prompt::new("Title".to_string(), String::new(), at(0));
        assert!(!prompt.is_expired(at(100)));

        prompt.set_deleted_at(Some(at(100)));
        assert!(prompt.is_expired(at(100)));
        assert!(prompt.is_expired(at(101)));
        assert!(!prompt.is_expired(at(99)));
    }

    #[test]
    fn test_prompt_update_merges_only_present_fields() {
        let mut prompt = Prompt::new("Old".to_string(), "Body".to_string(), at(0));
        prompt.apply(PromptUpdate::title("New"));
        assert_eq!(prompt.title, "New");
        assert_eq!(prompt.content, "Body");

        prompt.apply(PromptUpdate::deleted_at(Some(at(5))));
        assert_eq!(prompt.deleted_at, Some(at(5)));

        prompt.apply(PromptUpdate::content(""));
        assert_eq!(prompt.content, "");
        assert_eq!(prompt.deleted_at, Some(at(5)));

        prompt.apply(PromptUpdate::deleted_at(None));
        assert_eq!(prompt.deleted_at, None);
    }

    #[test]
    fn test_prompt_update_json_distinguishes_null_from_missing() {
        let missing: PromptUpdate = serde_json::from_str(r#"{"title":"T"}"#).unwrap();
        assert_eq!(missing.deleted_at, None);

        let cleared: PromptUpdate = serde_json::from_str(r#"{"deletedAt":null}"#).unwrap();
        assert_eq!(cleared.deleted_at, Some(None));
        assert!(!cleared.is_empty());
    }

    #[test]
    fn test_trash_lists_every_level_with_context() {
        let mut project = Project::new("Marketing Campaign".to_string(), at(0));
        let mut task = Task::new("Social Media".to_string());
        let mut prompt = Prompt::new("Instagram Caption".to_string(), String::new(), at(0));
        prompt.deleted_at = Some(at(30));
        task.prompts.push(prompt);
        task.deleted_at = Some(at(20));
        project.tasks.push(task);
        project.deleted_at = Some(at(10));

        let snapshot = Snapshot {
            revision: 0,
            projects: Arc::new(vec![project]),
            current_project_id: None,
            current_task_id: None,
            settings: Settings::default(),
            view_mode: ViewMode::default(),
            retention_secs: 24 * 3600,
        };

        let trash = snapshot.trash();
        let summary: Vec<_> = trash
            .iter()
            .map(|e| (e.kind, e.name.as_str(), e.context.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    TrashKind::Prompt,
                    "Instagram Caption",
                    "Marketing Campaign / Social Media"
                ),
                (TrashKind::Task, "Social Media", "Project: Marketing Campaign"),
                (TrashKind::Project, "Marketing Campaign", "Project"),
            ]
        );
        assert!(trash.windows(2).all(|w| w[0].deleted_at >= w[1].deleted_at));
        assert_eq!(trash[0].deleted_at - trash[2].deleted_at, Duration::seconds(20));
        assert_eq!(trash[0].expires_at, at(30) + Duration::hours(24));
    }

    #[test]
    fn test_current_views_hide_deleted_selection() {
        let mut project = Project::new("P".to_string(), at(0));
        let task = Task::new("T".to_string());
        let task_id = task.id;
        project.tasks.push(task);
        let project_id = project.id;

        let mut snapshot = Snapshot {
            revision: 0,
            projects: Arc::new(vec![project]),
            current_project_id: Some(project_id),
            current_task_id: Some(task_id),
            settings: Settings::default(),
            view_mode: ViewMode::default(),
            retention_secs: 24 * 3600,
        };
        assert_eq!(snapshot.current_task().map(|t| t.id), Some(task_id));

        Arc::make_mut(&mut snapshot.projects)[0].deleted_at = Some(at(1));
        assert!(snapshot.current_project().is_none());
        assert!(snapshot.current_task().is_none());
    }

    #[test]
    fn test_language_table() {
        assert_eq!(Language::default(), Language::It);
        assert_eq!(Language::Ru.display_name(), "Русский");
        assert_eq!(
            serde_json::to_string(&[Language::En, Language::Es, Language::Ru]).unwrap(),
            r#"["en","es","ru"]"#
        );
    }
}
