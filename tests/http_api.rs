use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::net::TcpListener;

use promptshelf::api::{router, Client, ClientConfig, ClientError, HttpClient};
use promptshelf::models::{PromptUpdate, Theme, TrashKind, ViewMode};
use promptshelf::{Core, Workspace};

/// Serves a fresh store on an ephemeral port and returns a client for it
async fn spawn_server(workspace: Workspace) -> (Core, HttpClient) {
    let core = Core::new(workspace);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let app = router(core.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = HttpClient::with_config(ClientConfig {
        base_url: format!("http://{}", address),
    });
    (core, client)
}

#[tokio::test]
async fn test_http_client_builds_and_trashes_a_tree() {
    let (core, client) = spawn_server(Workspace::default()).await;

    let project = client
        .create_project("Marketing Campaign".to_string())
        .await
        .unwrap()
        .into_inner();
    let task = client
        .create_task(project, "Social Media".to_string())
        .await
        .unwrap()
        .into_inner();
    let caption = client
        .create_prompt(
            project,
            task,
            "Instagram Caption".to_string(),
            "Create a witty caption".to_string(),
        )
        .await
        .unwrap()
        .into_inner();

    let renamed = client
        .rename_prompt(project, task, caption, "Caption".to_string())
        .await
        .unwrap();
    assert_eq!(
        renamed.snapshot.prompt(project, task, caption).unwrap().title,
        "Caption"
    );

    let deleted = client.soft_delete_prompt(project, task, caption).await.unwrap();
    assert!(deleted.snapshot.active_prompts(project, task).is_empty());

    let trash = client.trash().await.unwrap();
    assert_eq!(trash.len(), 1);
    assert_eq!(trash[0].kind, TrashKind::Prompt);
    assert_eq!(trash[0].context, "Marketing Campaign / Social Media");

    let restored = client.restore_prompt(project, task, caption).await.unwrap();
    assert_eq!(restored.snapshot.active_prompts(project, task).len(), 1);

    // The server's store and the client's view agree
    assert_eq!(client.snapshot().await.unwrap(), core.snapshot());
}

#[tokio::test]
async fn test_http_client_maps_missing_ids_to_not_found() {
    let (core, client) = spawn_server(Workspace::default().with_seed()).await;
    let snapshot = core.snapshot();
    let project = snapshot.current_project().unwrap().id;
    let ghost_task = promptshelf::models::TaskId::new();

    let err = client
        .update_prompt(
            project,
            ghost_task,
            promptshelf::models::PromptId::new(),
            PromptUpdate::title("Nope"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "got {err:?}");
    assert_eq!(core.snapshot(), snapshot);
}

#[tokio::test]
async fn test_http_client_settings_and_sweep() {
    let (core, client) = spawn_server(Workspace::default()).await;

    client.update_settings(None, Some(Theme::Dark)).await.unwrap();
    client.set_view_mode(ViewMode::Flow).await.unwrap();
    let report = client.sweep().await.unwrap();

    assert!(report.inner().is_empty());
    let snapshot = core.snapshot();
    assert_eq!(snapshot.settings.theme, Theme::Dark);
    assert_eq!(snapshot.view_mode, ViewMode::Flow);
    // A sweep with nothing to purge is not a mutation
    assert_eq!(snapshot.revision, 2);
}

#[tokio::test]
async fn test_event_stream_reports_revisions() {
    let (core, client) = spawn_server(Workspace::default()).await;

    let mut response = reqwest::get(format!("{}/api/events", client.base_url()))
        .await
        .unwrap();
    assert!(response.status().is_success());

    // The handler has subscribed by the time the headers arrive
    core.create_project("P".to_string());

    let mut received = String::new();
    while !received.contains("data: 1") {
        let chunk = tokio::time::timeout(Duration::from_secs(5), response.chunk())
            .await
            .expect("timed out waiting for an event")
            .unwrap()
            .expect("stream ended");
        received.push_str(&String::from_utf8_lossy(&chunk));
    }
    assert!(received.contains("event: update"));
}
