use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;

use promptshelf::clock::{Clock, ManualClock};
use promptshelf::models::{PromptUpdate, Snapshot, TrashKind};
use promptshelf::Workspace;

fn seeded() -> (Workspace, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
    let workspace = Workspace::default()
        .with_clock(Arc::new(clock.clone()))
        .with_seed();
    (workspace, clock)
}

fn prompt_titles(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .current_task()
        .map(|task| task.active_prompts().map(|p| p.title.clone()).collect())
        .unwrap_or_default()
}

#[test]
fn test_seed_is_selected() {
    let (workspace, _) = seeded();
    let snapshot = workspace.snapshot();

    assert_eq!(snapshot.revision, 0);
    assert_eq!(snapshot.current_project().unwrap().name, "Marketing Campaign");
    assert_eq!(snapshot.current_task().unwrap().name, "Social Media");
    assert_eq!(
        prompt_titles(&snapshot),
        vec!["Instagram Caption", "LinkedIn Post"]
    );
    assert!(snapshot.trash().is_empty());
}

#[test]
fn test_trash_and_restore_a_seed_prompt() {
    let (mut workspace, clock) = seeded();
    let before = workspace.snapshot();
    let project = before.current_project().unwrap().id;
    let task = before.current_task().unwrap().id;
    let caption = before.current_task().unwrap().prompts[0].id;

    clock.advance(Duration::minutes(5));
    workspace
        .soft_delete_prompt(project, task, caption)
        .unwrap();

    let deleted = workspace.snapshot();
    assert_eq!(prompt_titles(&deleted), vec!["LinkedIn Post"]);
    let trash = deleted.trash();
    assert_eq!(trash.len(), 1);
    assert_eq!(trash[0].kind, TrashKind::Prompt);
    assert_eq!(trash[0].name, "Instagram Caption");
    assert_eq!(trash[0].context, "Marketing Campaign / Social Media");
    assert_eq!(trash[0].deleted_at, clock.now());

    workspace.restore_prompt(project, task, caption).unwrap();
    let restored = workspace.snapshot();
    assert_eq!(
        prompt_titles(&restored),
        vec!["Instagram Caption", "LinkedIn Post"]
    );
    assert!(restored.trash().is_empty());
    // Same tree as before, only the revision moved on
    assert_eq!(restored.projects, before.projects);
    assert_eq!(restored.revision, 2);

    // The snapshot taken while it was in the trash is untouched
    assert_eq!(prompt_titles(&deleted), vec!["LinkedIn Post"]);
}

#[test]
fn test_trashed_items_expire_after_a_day() {
    let (mut workspace, clock) = seeded();
    let snapshot = workspace.snapshot();
    let project = snapshot.current_project().unwrap().id;
    let task = snapshot.current_task().unwrap().id;
    let prompts: Vec<_> = snapshot.current_task().unwrap().prompts.iter().map(|p| p.id).collect();

    workspace.soft_delete_prompt(project, task, prompts[0]).unwrap();
    clock.advance(Duration::hours(2));
    workspace.soft_delete_prompt(project, task, prompts[1]).unwrap();

    clock.advance(Duration::hours(23));
    let report = workspace.sweep();
    assert_eq!(report.prompts, 1);

    let snapshot = workspace.snapshot();
    let remaining = &snapshot.current_task().unwrap().prompts;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "LinkedIn Post");

    clock.advance(Duration::hours(1));
    assert_eq!(workspace.sweep().prompts, 1);
    assert!(workspace.snapshot().current_task().unwrap().prompts.is_empty());
    // The task itself was never deleted
    assert_eq!(workspace.snapshot().current_task().unwrap().name, "Social Media");
}

#[test]
fn test_project_delete_does_not_cascade() {
    let (mut workspace, clock) = seeded();
    let snapshot = workspace.snapshot();
    let project = snapshot.current_project().unwrap().id;
    let task = snapshot.current_task().unwrap().id;

    workspace.soft_delete_project(project).unwrap();
    let snapshot = workspace.snapshot();
    assert_eq!(snapshot.current_project_id, None);
    assert_eq!(snapshot.current_task_id, None);
    assert_eq!(snapshot.active_projects().count(), 0);
    // Children keep their own flags
    assert!(snapshot.task(project, task).unwrap().deleted_at.is_none());
    assert_eq!(snapshot.trash().len(), 1);

    workspace.restore_project(project).unwrap();
    assert_eq!(workspace.snapshot().active_tasks(project).len(), 1);

    // Expired projects take their subtree with them
    workspace.soft_delete_project(project).unwrap();
    clock.advance(Duration::hours(24));
    let report = workspace.sweep();
    assert_eq!(report.projects, 1);
    assert_eq!(report.tasks, 0);
    assert!(workspace.snapshot().projects.is_empty());
}

#[test]
fn test_edit_and_reorder_within_task() {
    let (mut workspace, _) = seeded();
    let snapshot = workspace.snapshot();
    let project = snapshot.current_project().unwrap().id;
    let task = snapshot.current_task().unwrap().id;

    let newsletter = workspace
        .create_prompt(project, task, "Newsletter".to_string(), String::new())
        .unwrap();
    assert_eq!(
        prompt_titles(&workspace.snapshot()),
        vec!["Newsletter", "Instagram Caption", "LinkedIn Post"]
    );

    workspace
        .update_prompt_fields(
            project,
            task,
            newsletter,
            PromptUpdate::content("Summarize this week's launches"),
        )
        .unwrap();

    let ids: Vec<_> = workspace.snapshot().current_task().unwrap().prompts.iter().map(|p| p.id).collect();
    workspace
        .reorder_prompts(project, task, &[ids[2], ids[1], ids[0]])
        .unwrap();

    let snapshot = workspace.snapshot();
    assert_eq!(
        prompt_titles(&snapshot),
        vec!["LinkedIn Post", "Instagram Caption", "Newsletter"]
    );
    assert_eq!(
        snapshot.prompt(project, task, newsletter).unwrap().content,
        "Summarize this week's launches"
    );
}
