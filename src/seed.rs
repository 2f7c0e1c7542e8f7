//! Example content for a fresh store

use chrono::{DateTime, Utc};

use crate::models::{Project, Prompt, Task};

/// One project with one task and two prompts, shown when nothing else exists
pub fn seed_projects(now: DateTime<Utc>) -> Vec<Project> {
    let mut task = Task::new("Social Media".to_string());
    task.prompts = vec![
        Prompt::new(
            "Instagram Caption".to_string(),
            "Create a witty caption for a coffee shop...".to_string(),
            now,
        ),
        Prompt::new(
            "LinkedIn Post".to_string(),
            "Write a professional post about AI productivity...".to_string(),
            now,
        ),
    ];

    let mut project = Project::new("Marketing Campaign".to_string(), now);
    project.tasks.push(task);

    vec![project]
}
