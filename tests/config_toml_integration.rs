use gated_queue::cli::{ConfigDiscovery, DemoConfig};
use gated_queue::{ConditionQueue, ConfigError, QueueConfig, RescanPolicy, TaskOutput, TaskSpec};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

fn ok(value: TaskOutput) -> anyhow::Result<TaskOutput> {
    Ok(value)
}

#[test]
fn test_queue_config_from_toml() {
    let config = QueueConfig::from_toml_str(
        r#"
conditions = ["login", "admin"]
rescan_policy = "on_transition"
default_timeout_ms = 250
"#,
    )
    .unwrap();

    assert_eq!(config.conditions, vec!["login", "admin"]);
    assert_eq!(config.rescan_policy, RescanPolicy::OnTransition);
    assert_eq!(config.default_timeout_ms, 250);

    let rendered = config.to_toml_string().unwrap();
    assert_eq!(QueueConfig::from_toml_str(&rendered).unwrap(), config);
}

#[test]
fn test_unknown_rescan_policy_is_rejected() {
    let result = QueueConfig::from_toml_str(r#"rescan_policy = "sometimes""#);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_empty_toml_gives_defaults() {
    let config = QueueConfig::from_toml_str("").unwrap();
    assert_eq!(config, QueueConfig::default());
}

#[test]
fn test_explicit_config_path_wins() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    std::fs::write(
        &path,
        r#"
[queue]
conditions = ["net"]

[demo]
ticks = 2
interval_ms = 10
"#,
    )
    .unwrap();

    let config = ConfigDiscovery::discover_config(Some(path.as_path())).unwrap();

    assert_eq!(config.queue.conditions, vec!["net"]);
    assert_eq!(config.demo.ticks, 2);
    assert_eq!(config.demo.interval_ms, 10);
    assert_eq!(config.demo.task_timeout_ms, DemoConfig::default().demo.task_timeout_ms);
}

#[tokio::test]
async fn test_queue_built_from_config_honours_policy() {
    let config = QueueConfig::from_toml_str(
        r#"
conditions = ["ready"]
rescan_policy = "on_transition"
"#,
    )
    .unwrap();
    let queue = ConditionQueue::with_config(config);
    let runs = Arc::new(AtomicUsize::new(0));

    let counter = runs.clone();
    queue
        .create_task(
            TaskSpec::new(["ready"], move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { ok(json!(null)) }
            })
            .strict(true),
        )
        .await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    queue.set_condition("ready", true).await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    queue.set_condition("ready", false).await.unwrap();
    queue.set_condition("ready", true).await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}
