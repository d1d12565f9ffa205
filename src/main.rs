use gated_queue::cli::{Args, ConfigDiscovery, DemoOptions};
use gated_queue::env;
use gated_queue::{ConditionQueue, TaskOutput, TaskSpec};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.demo_options() {
        Some(options) => {
            init_tracing(options.verbose);
            run_demo(options).await
        }
        None => {
            ConfigDiscovery::show_discovery_info();
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        env::VERBOSE_LOG_FILTER
    } else {
        env::DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_demo(options: DemoOptions) -> anyhow::Result<()> {
    let mut config = ConfigDiscovery::discover_config(options.config.as_deref())?;
    config.apply_overrides(&options);
    info!("Starting demo with {:?}", config.demo);

    let queue = ConditionQueue::with_config(config.queue.clone());
    for name in &config.queue.conditions {
        queue.set_condition(name, false).await?;
    }

    let toggled = env::demo::TOGGLED_CONDITION;
    let spec = TaskSpec::new([toggled], flaky_job)
        .with_description("flaky demo job")
        .strict(true)
        .with_timeout_ms(config.demo.task_timeout_ms);
    let handle = queue.create_task(spec).await;

    let clearing = queue.downgrade();
    let id = handle.id().to_string();
    handle
        .set_success(move |value| {
            let queue = clearing.upgrade();
            let id = id.clone();
            async move {
                info!("Demo task succeeded with {}", value);
                if let Some(queue) = queue {
                    queue.clear(&[id]).await;
                }
            }
        })
        .await;

    // The failing attempt still holds the task's guard, so the retry runs
    // on its own tokio task once the delay has passed.
    let retry = handle.clone();
    handle
        .set_fail(move |failure| {
            let task = retry.clone();
            async move {
                warn!("Demo task failed: {}", failure);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(env::demo::RETRY_DELAY_MS)).await;
                    let outcome = task.run().await;
                    debug!("Retry of demo task finished: {:?}", outcome);
                });
            }
        })
        .await;

    handle
        .set_complete(|| async {
            info!("Demo task attempt complete");
        })
        .await;

    let mut ticker = tokio::time::interval(Duration::from_millis(config.demo.interval_ms.max(1)));
    ticker.tick().await;

    for tick in 1..=config.demo.ticks {
        ticker.tick().await;
        let value = rand::rng().random_bool(0.5);
        info!("Tick {}: setting {} to {}", tick, toggled, value);
        queue.set_condition(toggled, value).await?;

        let pending = queue.get_tasks().await;
        info!(
            "Conditions {:?}, {} pending task(s)",
            queue.get_conditions().await,
            pending.len()
        );
        if pending.is_empty() {
            info!("Demo task is done, stopping early");
            break;
        }
    }

    Ok(())
}

/// Sleeps for a random while, then succeeds or fails with even odds
async fn flaky_job() -> anyhow::Result<TaskOutput> {
    let roll = rand::rng().random::<f64>() * 1000.0;
    tokio::time::sleep(Duration::from_millis(500 + roll as u64)).await;

    if roll > 500.0 {
        Ok(serde_json::json!({ "state": true }))
    } else {
        anyhow::bail!("unlucky roll {:.0}", roll)
    }
}
