//! Integration tests for the emitdex scan pipeline and queries.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

use emitdex_indexer::scheduler::{CycleReport, Scheduler, SchedulerOptions};
use emitdex_indexer::{Direction, EngineOptions, EventEngine};

/// Helper to create a small client/server resource
fn create_test_workspace(base: &Path) -> PathBuf {
    let workspace = base.join("resource");

    let server = workspace.join("server");
    std::fs::create_dir_all(&server).unwrap();
    std::fs::write(
        server.join("index.ts"),
        r#"import * as alt from 'alt-server';

export const Events = { foo: 'player:foo', nested: { bar: 'player:bar' } };

alt.onClient('ping', (player) => {
    // player id, reason
    alt.emitClient(player, 'ban-player', reason);
    alt.emit('resource:ready');
});
"#,
    )
    .unwrap();

    let client = workspace.join("client");
    std::fs::create_dir_all(&client).unwrap();
    std::fs::write(
        client.join("index.ts"),
        r#"import * as alt from 'alt-client';

alt.onServer('ban-player', () => {
    // amount
    alt.emitServer(Events.foo);
    alt.emitServer(Events.missing);
    alt.emit('local:tick');
});
"#,
    )
    .unwrap();

    let modules = workspace.join("node_modules").join("alt-server");
    std::fs::create_dir_all(&modules).unwrap();
    std::fs::write(modules.join("index.js"), "alt.emit('vendored');\n").unwrap();

    workspace
}

/// One variable cycle then one event cycle
async fn refresh(engine: &EventEngine) {
    engine.refresh_variables().await.unwrap();
    engine.scan_events().await.unwrap();
}

/// Test full scan pipeline end-to-end
#[tokio::test]
async fn test_full_scan_pipeline() {
    let temp_dir = tempdir().unwrap();
    let workspace = create_test_workspace(temp_dir.path());

    let engine = EventEngine::new(EngineOptions::new(&workspace));
    let variables = engine.refresh_variables().await.unwrap();
    assert_eq!(variables.files_seen, 1);
    assert_eq!(engine.resolve("Events.foo"), Some("player:foo".to_string()));
    assert_eq!(
        engine.resolve("Events.nested.bar"),
        Some("player:bar".to_string())
    );

    let report = engine.scan_events().await.unwrap();
    assert_eq!(report.files_seen, 2, "node_modules must not be enumerated");
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.records, 4);

    let server = engine
        .records_for(&workspace.join("server").join("index.ts"))
        .unwrap();
    assert_eq!(server[0].event_name, "ban-player");
    assert_eq!(server[0].direction, Some(Direction::ToClient));
    assert_eq!(server[0].event_suggestion.as_deref(), Some("player id, reason"));
    assert_eq!(server[1].event_name, "resource:ready");
    assert_eq!(server[1].direction, Some(Direction::ServerOnly));

    let client = engine
        .records_for(&workspace.join("client").join("index.ts"))
        .unwrap();
    assert_eq!(client.len(), 2, "unresolved symbol must be dropped");
    assert_eq!(client[0].event_name, "player:foo");
    assert_eq!(client[0].variable_name.as_deref(), Some("Events.foo"));
    assert_eq!(client[0].direction, Some(Direction::ToServer));
    assert_eq!(client[0].event_suggestion.as_deref(), Some("amount"));
    assert_eq!(client[1].event_name, "local:tick");
    assert_eq!(client[1].direction, Some(Direction::ClientOnly));

    assert!(!engine.all_event_names().contains(&"vendored".to_string()));
}

/// Test that an unchanged workspace is not re-parsed
#[tokio::test]
async fn test_rescan_is_idempotent() {
    let temp_dir = tempdir().unwrap();
    let workspace = create_test_workspace(temp_dir.path());

    let engine = EventEngine::new(EngineOptions::new(&workspace));
    refresh(&engine).await;
    let before = engine.index().entries();

    let report = engine.scan_events().await.unwrap();
    assert_eq!(report.files_scanned, 0);
    assert_eq!(report.files_unchanged, 2);
    assert_eq!(engine.index().entries(), before);
}

/// Test that a changed file fully replaces its previous records
#[tokio::test]
async fn test_changed_file_replaces_entry() {
    let temp_dir = tempdir().unwrap();
    let workspace = create_test_workspace(temp_dir.path());
    let client_file = workspace.join("client").join("index.ts");

    let engine = EventEngine::new(EngineOptions::new(&workspace));
    refresh(&engine).await;
    assert_eq!(engine.records_for(&client_file).unwrap().len(), 2);

    std::fs::write(&client_file, "alt.emitServer('only-one', 1);\n").unwrap();
    engine.scan_events().await.unwrap();

    let records = engine.records_for(&client_file).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_name, "only-one");
    assert_eq!(records[0].direction, Some(Direction::ToServer));
}

/// Test that a file emptied and refilled keeps its place in query order
#[tokio::test]
async fn test_emptied_file_keeps_query_order() {
    let temp_dir = tempdir().unwrap();
    let server = temp_dir.path().join("server");
    std::fs::create_dir_all(&server).unwrap();
    std::fs::write(server.join("a.ts"), "alt.emit('a1');\n").unwrap();
    std::fs::write(server.join("b.ts"), "alt.emit('b1');\n").unwrap();

    let engine = EventEngine::new(EngineOptions::new(temp_dir.path()));
    engine.scan_events().await.unwrap();
    assert_eq!(engine.query_by_direction(Direction::ServerOnly), vec!["a1", "b1"]);

    std::fs::write(server.join("a.ts"), "// nothing emitted here anymore\n").unwrap();
    engine.scan_events().await.unwrap();
    assert_eq!(engine.query_by_direction(Direction::ServerOnly), vec!["b1"]);

    std::fs::write(server.join("a.ts"), "alt.emit('a2');\n").unwrap();
    engine.scan_events().await.unwrap();
    assert_eq!(engine.query_by_direction(Direction::ServerOnly), vec!["a2", "b1"]);
}

/// Test direction filtering across files
#[tokio::test]
async fn test_query_by_direction() {
    let temp_dir = tempdir().unwrap();
    let workspace = create_test_workspace(temp_dir.path());

    let engine = EventEngine::new(EngineOptions::new(&workspace));
    refresh(&engine).await;

    assert_eq!(engine.query_by_direction(Direction::ToClient), vec!["ban-player"]);
    assert_eq!(engine.query_by_direction(Direction::ToServer), vec!["player:foo"]);
    assert!(engine.query_by_direction(Direction::ToWebView).is_empty());

    for direction in Direction::ALL {
        for name in engine.query_by_direction(direction) {
            let matching = engine
                .index()
                .entries()
                .into_iter()
                .flat_map(|(_, records)| records)
                .filter(|r| r.event_name == name)
                .any(|r| r.direction == Some(direction));
            assert!(matching, "{} returned for {}", name, direction);
        }
    }
}

/// Test parameter hints matched against a line
#[tokio::test]
async fn test_query_by_context() {
    let temp_dir = tempdir().unwrap();
    let workspace = create_test_workspace(temp_dir.path());

    let engine = EventEngine::new(EngineOptions::new(&workspace));
    refresh(&engine).await;

    let hits = engine.query_by_context("alt.onServer('ban-player', (");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].hint, "player id, reason");
    assert_eq!(hits[0].signature, "(player id, reason) => {}");

    let hits = engine.query_by_context("alt.onClient(Events.foo, (");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].event, "Events.foo");
    assert_eq!(hits[0].hint, "amount");
}

/// Test that late definitions are picked up by the next event cycle
#[tokio::test]
async fn test_definitions_after_events_resolve_next_cycle() {
    let temp_dir = tempdir().unwrap();
    let workspace = create_test_workspace(temp_dir.path());
    let client_file = workspace.join("client").join("index.ts");

    let engine = EventEngine::new(EngineOptions::new(&workspace));
    engine.scan_events().await.unwrap();
    assert_eq!(engine.records_for(&client_file).unwrap().len(), 1);

    engine.refresh_variables().await.unwrap();
    let report = engine.scan_events().await.unwrap();
    assert_eq!(report.files_scanned, 2);
    assert_eq!(engine.records_for(&client_file).unwrap().len(), 2);
}

/// Test that a cycle triggered while one is running is dropped
#[tokio::test]
async fn test_overlapping_trigger_dropped() {
    let temp_dir = tempdir().unwrap();
    let workspace = create_test_workspace(temp_dir.path());

    let engine = EventEngine::new(EngineOptions::new(&workspace));
    let (first, second) = tokio::join!(engine.scan_events(), engine.scan_events());

    assert!(first.is_some());
    assert!(second.is_none());
}

/// Test two engines on different workspaces stay independent
#[tokio::test]
async fn test_engines_are_independent() {
    let first_dir = tempdir().unwrap();
    let second_dir = tempdir().unwrap();
    let first = create_test_workspace(first_dir.path());
    std::fs::create_dir_all(second_dir.path().join("server")).unwrap();
    std::fs::write(
        second_dir.path().join("server").join("main.ts"),
        "alt.emit('other');\n",
    )
    .unwrap();

    let a = EventEngine::new(EngineOptions::new(&first));
    let b = EventEngine::new(EngineOptions::new(second_dir.path()));
    refresh(&a).await;
    refresh(&b).await;

    assert_eq!(b.all_event_names(), vec!["other"]);
    assert_eq!(b.variable_count(), 0);
    assert!(!a.all_event_names().contains(&"other".to_string()));
}

/// Test the scheduler populates the index and stops cleanly
#[tokio::test]
async fn test_scheduler_start_stop() {
    let temp_dir = tempdir().unwrap();
    let workspace = create_test_workspace(temp_dir.path());

    let engine = Arc::new(EventEngine::new(EngineOptions::new(&workspace)));
    let handle = Scheduler::start(
        engine.clone(),
        SchedulerOptions {
            event_interval: Duration::from_millis(20),
            variable_interval: Duration::from_millis(20),
        },
    );
    let mut reports = handle.subscribe();

    let resolved = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Ok(CycleReport::Events(_)) = reports.recv().await {
                if engine.all_event_names().contains(&"player:foo".to_string()) {
                    break;
                }
            }
        }
    })
    .await;
    assert!(resolved.is_ok(), "scheduler never resolved Events.foo");

    handle.stop().await;
    assert_eq!(engine.file_count(), 2);
}
