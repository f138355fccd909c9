//! Integration tests for the watcher, cache, and HTTP surface together.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use iconserver::cache::{CacheStore, Snapshot, SnapshotBuilder};
use iconserver::server::{App, ServerConfig};
use iconserver::watcher::{ChangeEvent, ChangeKind, ChangeWatcher, NotificationSource, NotifySource};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

fn write_icons(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), format!("<svg data-name=\"{name}\"/>")).unwrap();
    }
}

async fn get_json(app: axum::Router, uri: &str) -> serde_json::Value {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Wait until `check` holds or the timeout elapses.
async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}

/// Startup build serves the directory and answers listing queries.
#[tokio::test]
async fn test_startup_snapshot_served() {
    let tmp = TempDir::new().unwrap();
    write_icons(tmp.path(), &["icon-one.svg", "icon-two.svg", "box.svg"]);

    let snapshot = SnapshotBuilder::new(tmp.path()).build().unwrap();
    let store = Arc::new(CacheStore::new(snapshot));
    let app = App::new(ServerConfig::default(), store).router();

    let json = get_json(app.clone(), "/assets/list?search=icon").await;
    assert_eq!(json["files"], serde_json::json!(["icon-one.svg", "icon-two.svg"]));

    let json = get_json(app.clone(), "/assets/list?search=o").await;
    assert_eq!(json["total"], 0);

    let json = get_json(app, "/assets/list?search=on").await;
    assert_eq!(json["files"], serde_json::json!(["icon-one.svg", "icon-two.svg"]));
}

/// Real filesystem changes flow through notify into a rebuilt snapshot.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_directory_change_triggers_rebuild() {
    let tmp = TempDir::new().unwrap();
    write_icons(tmp.path(), &["box.svg"]);

    let builder = SnapshotBuilder::new(tmp.path());
    let store = Arc::new(CacheStore::new(builder.build().unwrap()));

    let (tx, rx) = mpsc::channel(256);
    let mut source = NotifySource::new();
    source.subscribe(tmp.path(), tx).unwrap();
    let watcher = ChangeWatcher::new(builder, Arc::clone(&store), Duration::from_millis(100));
    let _task = watcher.spawn(rx);

    write_icons(tmp.path(), &["arrow-left.svg"]);

    let rebuilt = eventually(Duration::from_secs(10), || {
        store.read().content("arrow-left.svg").is_some()
    })
    .await;
    assert!(rebuilt, "snapshot was not rebuilt after adding an icon");
    assert_eq!(store.read().names(), &["arrow-left.svg", "box.svg"]);

    fs::remove_file(tmp.path().join("box.svg")).unwrap();
    let removed = eventually(Duration::from_secs(10), || {
        store.read().content("box.svg").is_none()
    })
    .await;
    assert!(removed, "snapshot still holds a deleted icon");
}

/// Requests running during rebuilds always see an internally consistent snapshot.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_torn_reads_during_rebuilds() {
    let tmp = TempDir::new().unwrap();
    let initial: Vec<String> = (0..50).map(|i| format!("icon-{i:03}.svg")).collect();
    let initial_refs: Vec<&str> = initial.iter().map(String::as_str).collect();
    write_icons(tmp.path(), &initial_refs);

    let builder = SnapshotBuilder::new(tmp.path());
    let store = Arc::new(CacheStore::new(builder.build().unwrap()));
    let app = App::new(ServerConfig::default(), Arc::clone(&store)).router();

    let (tx, rx) = mpsc::channel(256);
    let watcher = ChangeWatcher::new(builder, Arc::clone(&store), Duration::from_millis(10));
    let watch_task = watcher.spawn(rx);

    let writer_dir = tmp.path().to_path_buf();
    let writer = tokio::spawn(async move {
        for round in 0..20 {
            let name = format!("extra-{round:03}.svg");
            fs::write(writer_dir.join(&name), "<svg/>").unwrap();
            tx.send(ChangeEvent::new(writer_dir.join(&name), ChangeKind::Created))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    });

    let mut readers = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        let app = app.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..50 {
                let snapshot: Arc<Snapshot> = store.read();
                assert!(snapshot.is_consistent());
                for (_, positions) in snapshot.tokens() {
                    assert!(positions.iter().all(|&p| p < snapshot.len()));
                }

                let json = get_json(app.clone(), "/assets/list").await;
                let files = json["files"].as_array().unwrap();
                assert_eq!(json["total"].as_u64().unwrap() as usize, files.len());
                tokio::task::yield_now().await;
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
    watch_task.await.unwrap();

    assert!(store.generation() >= 1);
    assert_eq!(store.read().len(), 70);
}
