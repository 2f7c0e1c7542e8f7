//! CLI module
//!
//! This module provides the command-line interface for promptshelf: it either
//! runs the server or talks to one as a thin presentation layer.

use chrono::{Duration, Utc};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;

use crate::{
    api::{serve, Client, ClientConfig, ClientError, HttpClient},
    config::{ServerConfig, DEFAULT_PORT},
    models::{
        Language, ProjectId, PromptId, PromptUpdate, Snapshot, StoreResponse, TaskId, Theme,
        TrashEntry, TrashKind, ViewMode,
    },
    sweeper::spawn_sweeper,
    Core, Workspace,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API server URL
    #[arg(
        short,
        long,
        env = "PROMPTSHELF_SERVER",
        default_value_t = ClientConfig::default().base_url
    )]
    server: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the promptshelf API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PROMPTSHELF_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Start without the example project
        #[arg(long)]
        empty: bool,
    },

    /// Show the active projects, tasks and prompts
    Show,

    /// List everything in the trash
    Trash,

    /// Purge expired trash now instead of waiting for the next sweep
    Sweep,

    /// Project management commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Task management commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Prompt management commands
    Prompt {
        #[command(subcommand)]
        command: PromptCommands,
    },

    /// Change the interface language or theme
    Settings {
        #[arg(long, value_enum)]
        language: Option<Language>,

        #[arg(long, value_enum)]
        theme: Option<Theme>,
    },

    /// Switch between the list and flow views
    View {
        #[arg(value_enum)]
        mode: ViewMode,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectCommands {
    /// Create a project and select it
    Add { name: String },

    Rename { id: ProjectId, name: String },

    /// Move a project to the trash
    Delete { id: ProjectId },

    /// Bring a project back from the trash
    Restore { id: ProjectId },

    /// Delete a project and everything in it for good
    Purge { id: ProjectId },

    /// Reorder the active projects
    Order {
        #[arg(required = true)]
        ids: Vec<ProjectId>,
    },

    /// Select a project; omit the id to clear the selection
    Select { id: Option<ProjectId> },
}

/// Which project a task command applies to
#[derive(Args, Debug, Clone, Copy)]
struct ProjectLocation {
    /// Project id (defaults to the current project)
    #[arg(short, long)]
    project: Option<ProjectId>,
}

/// Which task a prompt command applies to
#[derive(Args, Debug, Clone, Copy)]
struct TaskLocation {
    /// Project id (defaults to the current project)
    #[arg(short, long)]
    project: Option<ProjectId>,

    /// Task id (defaults to the current task)
    #[arg(short, long)]
    task: Option<TaskId>,
}

#[derive(Subcommand, Debug)]
enum TaskCommands {
    /// Create a task and select it
    Add {
        name: String,
        #[command(flatten)]
        at: ProjectLocation,
    },

    Rename {
        id: TaskId,
        name: String,
        #[command(flatten)]
        at: ProjectLocation,
    },

    Delete {
        id: TaskId,
        #[command(flatten)]
        at: ProjectLocation,
    },

    Restore {
        id: TaskId,
        #[command(flatten)]
        at: ProjectLocation,
    },

    Purge {
        id: TaskId,
        #[command(flatten)]
        at: ProjectLocation,
    },

    Order {
        #[arg(required = true)]
        ids: Vec<TaskId>,
        #[command(flatten)]
        at: ProjectLocation,
    },

    /// Select a task; omit the id to clear the selection
    Select { id: Option<TaskId> },
}

#[derive(Subcommand, Debug)]
enum PromptCommands {
    /// Add a prompt at the top of the task
    Add {
        title: String,

        #[arg(short, long, default_value = "")]
        content: String,

        #[command(flatten)]
        at: TaskLocation,
    },

    Rename {
        id: PromptId,
        title: String,
        #[command(flatten)]
        at: TaskLocation,
    },

    /// Change the title and/or content of a prompt
    Edit {
        id: PromptId,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        #[command(flatten)]
        at: TaskLocation,
    },

    Delete {
        id: PromptId,
        #[command(flatten)]
        at: TaskLocation,
    },

    Restore {
        id: PromptId,
        #[command(flatten)]
        at: TaskLocation,
    },

    Purge {
        id: PromptId,
        #[command(flatten)]
        at: TaskLocation,
    },

    Order {
        #[arg(required = true)]
        ids: Vec<PromptId>,
        #[command(flatten)]
        at: TaskLocation,
    },
}

/// Run the CLI application
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, empty } => {
            let workspace = if empty {
                Workspace::default()
            } else {
                Workspace::default().with_seed()
            };
            let core = Core::new(workspace);

            // Runs for as long as the server does
            let _sweeper = spawn_sweeper(core.clone(), core.config().sweep_interval);

            println!("Starting promptshelf API server on port {}...", port);
            serve(core, ServerConfig::with_port(port)).await?;
            Ok(())
        }

        Commands::Completions { shell } => {
            // Generate completions for the specified shell
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut io::stdout());
            Ok(())
        }

        command => {
            let client = create_client(&cli.server);
            execute(&client, command).await?;
            Ok(())
        }
    }
}

fn create_client(server_url: &str) -> HttpClient {
    let config = ClientConfig {
        base_url: server_url.to_string(),
    };
    HttpClient::with_config(config)
}

/// Runs one client-side command
async fn execute<C: Client + Sync>(client: &C, command: Commands) -> Result<(), ClientError> {
    match command {
        Commands::Show => {
            let snapshot = client.snapshot().await?;
            print_snapshot(&snapshot);
        }

        Commands::Trash => {
            let entries = client.trash().await?;
            print_trash(&entries);
        }

        Commands::Sweep => {
            let response = client.sweep().await?;
            print_response(&response, |report| {
                if report.is_empty() {
                    println!("Nothing has expired yet");
                } else {
                    println!(
                        "Purged {} project(s), {} task(s), {} prompt(s)",
                        report.projects, report.tasks, report.prompts
                    );
                }
            });
        }

        Commands::Project { command } => execute_project(client, command).await?,
        Commands::Task { command } => execute_task(client, command).await?,
        Commands::Prompt { command } => execute_prompt(client, command).await?,

        Commands::Settings { language, theme } => {
            if language.is_none() && theme.is_none() {
                let settings = client.snapshot().await?.settings;
                println!("Language: {}", settings.language.display_name());
                println!("Theme: {:?}", settings.theme);
                return Ok(());
            }
            let response = client.update_settings(language, theme).await?;
            print_response(&response, |_| {
                let settings = response.snapshot.settings;
                println!(
                    "Language: {}, theme: {:?}",
                    settings.language.display_name(),
                    settings.theme
                );
            });
        }

        Commands::View { mode } => {
            let response = client.set_view_mode(mode).await?;
            print_response(&response, |_| println!("View mode set to {:?}", mode));
        }

        Commands::Serve { .. } | Commands::Completions { .. } => {
            return Err(ClientError::InvalidInput(
                "command does not talk to a server".to_string(),
            ))
        }
    }

    Ok(())
}

async fn execute_project<C: Client + Sync>(
    client: &C,
    command: ProjectCommands,
) -> Result<(), ClientError> {
    match command {
        ProjectCommands::Add { name } => {
            let name = validate_name(&name, "project name")?;
            let response = client.create_project(name.clone()).await?;
            print_response(&response, |id| {
                println!("Added project \"{}\" ({})", name, id)
            });
        }
        ProjectCommands::Rename { id, name } => {
            let name = validate_name(&name, "project name")?;
            let response = client.rename_project(id, name.clone()).await?;
            print_response(&response, |_| println!("Renamed project to \"{}\"", name));
        }
        ProjectCommands::Delete { id } => {
            let response = client.soft_delete_project(id).await?;
            print_response(&response, |_| println!("Moved project {} to the trash", id));
        }
        ProjectCommands::Restore { id } => {
            let response = client.restore_project(id).await?;
            print_response(&response, |_| println!("Restored project {}", id));
        }
        ProjectCommands::Purge { id } => {
            let response = client.permanently_delete_project(id).await?;
            print_response(&response, |_| println!("Permanently deleted project {}", id));
        }
        ProjectCommands::Order { ids } => {
            let response = client.reorder_projects(ids).await?;
            print_response(&response, |_| println!("Reordered projects"));
        }
        ProjectCommands::Select { id } => {
            let response = client.set_current_project(id).await?;
            print_response(&response, |_| match response.snapshot.current_project() {
                Some(project) => println!("Selected project \"{}\"", project.name),
                None => println!("No project selected"),
            });
        }
    }
    Ok(())
}

async fn execute_task<C: Client + Sync>(
    client: &C,
    command: TaskCommands,
) -> Result<(), ClientError> {
    match command {
        TaskCommands::Add { name, at } => {
            let name = validate_name(&name, "task name")?;
            let project_id = resolve_project(client, at.project).await?;
            let response = client.create_task(project_id, name.clone()).await?;
            print_response(&response, |id| println!("Added task \"{}\" ({})", name, id));
        }
        TaskCommands::Rename { id, name, at } => {
            let name = validate_name(&name, "task name")?;
            let project_id = resolve_project(client, at.project).await?;
            let response = client.rename_task(project_id, id, name.clone()).await?;
            print_response(&response, |_| println!("Renamed task to \"{}\"", name));
        }
        TaskCommands::Delete { id, at } => {
            let project_id = resolve_project(client, at.project).await?;
            let response = client.soft_delete_task(project_id, id).await?;
            print_response(&response, |_| println!("Moved task {} to the trash", id));
        }
        TaskCommands::Restore { id, at } => {
            let project_id = resolve_project(client, at.project).await?;
            let response = client.restore_task(project_id, id).await?;
            print_response(&response, |_| println!("Restored task {}", id));
        }
        TaskCommands::Purge { id, at } => {
            let project_id = resolve_project(client, at.project).await?;
            let response = client.permanently_delete_task(project_id, id).await?;
            print_response(&response, |_| println!("Permanently deleted task {}", id));
        }
        TaskCommands::Order { ids, at } => {
            let project_id = resolve_project(client, at.project).await?;
            let response = client.reorder_tasks(project_id, ids).await?;
            print_response(&response, |_| println!("Reordered tasks"));
        }
        TaskCommands::Select { id } => {
            let response = client.set_current_task(id).await?;
            print_response(&response, |_| match response.snapshot.current_task() {
                Some(task) => println!("Selected task \"{}\"", task.name),
                None => println!("No task selected"),
            });
        }
    }
    Ok(())
}

async fn execute_prompt<C: Client + Sync>(
    client: &C,
    command: PromptCommands,
) -> Result<(), ClientError> {
    match command {
        PromptCommands::Add { title, content, at } => {
            let title = validate_name(&title, "prompt title")?;
            let (project_id, task_id) = resolve_task(client, at).await?;
            let response = client
                .create_prompt(project_id, task_id, title.clone(), content)
                .await?;
            print_response(&response, |id| println!("Added prompt \"{}\" ({})", title, id));
        }
        PromptCommands::Rename { id, title, at } => {
            let title = validate_name(&title, "prompt title")?;
            let (project_id, task_id) = resolve_task(client, at).await?;
            let response = client
                .rename_prompt(project_id, task_id, id, title.clone())
                .await?;
            print_response(&response, |_| println!("Renamed prompt to \"{}\"", title));
        }
        PromptCommands::Edit {
            id,
            title,
            content,
            at,
        } => {
            let update = PromptUpdate {
                title: title
                    .as_deref()
                    .map(|title| validate_name(title, "prompt title"))
                    .transpose()?,
                content,
                deleted_at: None,
            };
            if update.is_empty() {
                return Err(ClientError::InvalidInput(
                    "pass --title and/or --content".to_string(),
                ));
            }
            let (project_id, task_id) = resolve_task(client, at).await?;
            let response = client
                .update_prompt(project_id, task_id, id, update)
                .await?;
            print_response(&response, |_| println!("Updated prompt {}", id));
        }
        PromptCommands::Delete { id, at } => {
            let (project_id, task_id) = resolve_task(client, at).await?;
            let response = client.soft_delete_prompt(project_id, task_id, id).await?;
            print_response(&response, |_| println!("Moved prompt {} to the trash", id));
        }
        PromptCommands::Restore { id, at } => {
            let (project_id, task_id) = resolve_task(client, at).await?;
            let response = client.restore_prompt(project_id, task_id, id).await?;
            print_response(&response, |_| println!("Restored prompt {}", id));
        }
        PromptCommands::Purge { id, at } => {
            let (project_id, task_id) = resolve_task(client, at).await?;
            let response = client
                .permanently_delete_prompt(project_id, task_id, id)
                .await?;
            print_response(&response, |_| println!("Permanently deleted prompt {}", id));
        }
        PromptCommands::Order { ids, at } => {
            let (project_id, task_id) = resolve_task(client, at).await?;
            let response = client.reorder_prompts(project_id, task_id, ids).await?;
            print_response(&response, |_| println!("Reordered prompts"));
        }
    }
    Ok(())
}

/// Trims a user-supplied name, rejecting one that is blank
fn validate_name(value: &str, what: &str) -> Result<String, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidInput(format!("{} cannot be blank", what)));
    }
    Ok(trimmed.to_string())
}

async fn resolve_project<C: Client + Sync>(
    client: &C,
    project: Option<ProjectId>,
) -> Result<ProjectId, ClientError> {
    if let Some(project_id) = project {
        return Ok(project_id);
    }
    client
        .snapshot()
        .await?
        .current_project_id
        .ok_or_else(|| ClientError::InvalidInput("no project selected; pass --project".to_string()))
}

async fn resolve_task<C: Client + Sync>(
    client: &C,
    at: TaskLocation,
) -> Result<(ProjectId, TaskId), ClientError> {
    if let (Some(project_id), Some(task_id)) = (at.project, at.task) {
        return Ok((project_id, task_id));
    }

    let snapshot = client.snapshot().await?;
    let project_id = at
        .project
        .or(snapshot.current_project_id)
        .ok_or_else(|| ClientError::InvalidInput("no project selected; pass --project".to_string()))?;
    let task_id = at
        .task
        .or(snapshot.current_task_id)
        .ok_or_else(|| ClientError::InvalidInput("no task selected; pass --task".to_string()))?;
    Ok((project_id, task_id))
}

/// Generic function to print any StoreResponse<T>
/// Takes a closure to handle printing the inner value
fn print_response<T, F>(response: &StoreResponse<T>, print_inner: F)
where
    F: FnOnce(&T),
{
    print_inner(response.inner());
    println!("{}", format!("revision {}", response.snapshot.revision).dimmed());
}

fn print_snapshot(snapshot: &Snapshot) {
    let mut projects = snapshot.active_projects().peekable();
    if projects.peek().is_none() {
        println!("No projects yet. Add one with 'promptshelf project add'");
    }

    for project in projects {
        let selected = snapshot.current_project_id == Some(project.id);
        println!(
            "{} {}{}",
            project.name.bold(),
            project.id.to_string().dimmed(),
            if selected { " (current)".green() } else { "".normal() }
        );

        for task in project.active_tasks() {
            let selected = selected && snapshot.current_task_id == Some(task.id);
            println!(
                "  {} {}{}",
                task.name,
                task.id.to_string().dimmed(),
                if selected { " (current)".green() } else { "".normal() }
            );

            for (i, prompt) in task.active_prompts().enumerate() {
                println!(
                    "    {}. {} {}",
                    i + 1,
                    prompt.title,
                    prompt.id.to_string().dimmed()
                );
            }
        }
    }

    let trashed = snapshot.trash().len();
    if trashed > 0 {
        println!("\n{} item(s) in the trash", trashed);
    }
    println!(
        "{}",
        format!(
            "language: {}, theme: {:?}, view: {:?}",
            snapshot.settings.language.display_name(),
            snapshot.settings.theme,
            snapshot.view_mode
        )
        .dimmed()
    );
}

fn print_trash(entries: &[TrashEntry]) {
    if entries.is_empty() {
        println!("The trash is empty");
        return;
    }

    let now = Utc::now();
    for entry in entries {
        let kind = match entry.kind {
            TrashKind::Project => "project".blue(),
            TrashKind::Task => "task".cyan(),
            TrashKind::Prompt => "prompt".magenta(),
        };
        let remaining = entry.expires_at - now;
        println!(
            "{:<8} {} ({}) {}",
            kind,
            entry.name,
            entry.context,
            entry.id.to_string().dimmed()
        );
        println!(
            "         deleted {}, {}",
            entry.deleted_at.format("%Y-%m-%d %H:%M UTC"),
            expiry_label(remaining).yellow()
        );
    }
}

fn expiry_label(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        "purged on the next sweep".to_string()
    } else if remaining.num_hours() > 0 {
        format!("purged in about {}h", remaining.num_hours())
    } else {
        format!("purged in about {}m", remaining.num_minutes().max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CoreClient;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["promptshelf"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn seeded_client() -> CoreClient {
        CoreClient::new(Core::new(Workspace::default().with_seed()))
    }

    #[test]
    fn test_validate_name_trims_and_rejects_blank() {
        assert_eq!(validate_name("  Drafts \n", "name").unwrap(), "Drafts");
        assert!(matches!(
            validate_name("   ", "task name"),
            Err(ClientError::InvalidInput(msg)) if msg == "task name cannot be blank"
        ));
    }

    #[test]
    fn test_expiry_label() {
        assert_eq!(expiry_label(Duration::hours(-1)), "purged on the next sweep");
        assert_eq!(expiry_label(Duration::minutes(150)), "purged in about 2h");
        assert_eq!(expiry_label(Duration::seconds(20)), "purged in about 1m");
    }

    #[test]
    fn test_cli_parses_ids_and_enums() {
        let id = ProjectId::new();
        let cli = parse(&["project", "select", &id.to_string()]);
        assert!(matches!(
            cli.command,
            Commands::Project { command: ProjectCommands::Select { id: Some(parsed) } } if parsed == id
        ));

        let cli = parse(&["settings", "--language", "de", "--theme", "dark"]);
        assert!(matches!(
            cli.command,
            Commands::Settings {
                language: Some(Language::De),
                theme: Some(Theme::Dark)
            }
        ));

        assert!(Cli::try_parse_from(["promptshelf", "project", "delete", "not-a-uuid"]).is_err());
    }

    #[test]
    fn test_default_server_follows_default_port() {
        if std::env::var_os("PROMPTSHELF_SERVER").is_some() {
            return;
        }
        let cli = parse(&["show"]);
        assert_eq!(cli.server, format!("http://localhost:{}", DEFAULT_PORT));
    }

    #[tokio::test]
    async fn test_blank_name_never_reaches_the_store() {
        let client = seeded_client();
        let before = client.snapshot().await.unwrap();

        let err = execute(
            &client,
            Commands::Project {
                command: ProjectCommands::Add {
                    name: "  ".to_string(),
                },
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
        assert_eq!(client.snapshot().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_prompt_commands_default_to_current_selection() {
        let client = seeded_client();

        execute(
            &client,
            Commands::Prompt {
                command: PromptCommands::Add {
                    title: " Newsletter Intro ".to_string(),
                    content: String::new(),
                    at: TaskLocation {
                        project: None,
                        task: None,
                    },
                },
            },
        )
        .await
        .unwrap();

        let snapshot = client.snapshot().await.unwrap();
        let task = snapshot.current_task().unwrap();
        assert_eq!(task.prompts[0].title, "Newsletter Intro");
        assert_eq!(task.prompts.len(), 3);
    }

    #[tokio::test]
    async fn test_task_command_without_selection_fails() {
        let client = CoreClient::new(Core::default());
        let err = execute(
            &client,
            Commands::Task {
                command: TaskCommands::Add {
                    name: "Orphan".to_string(),
                    at: ProjectLocation { project: None },
                },
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
        assert!(client.snapshot().await.unwrap().projects.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_edit_requires_a_field() {
        let client = seeded_client();
        let snapshot = client.snapshot().await.unwrap();
        let prompt_id = snapshot.current_task().unwrap().prompts[0].id;

        let err = execute(
            &client,
            Commands::Prompt {
                command: PromptCommands::Edit {
                    id: prompt_id,
                    title: None,
                    content: None,
                    at: TaskLocation {
                        project: None,
                        task: None,
                    },
                },
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }
}
