//! Bracket Pool Replay
//!
//! Loads a scenario file, replays it against the engine with a manual clock
//! and prints the resulting leaderboards and payouts as JSON. Events are
//! written to the audit trail when AUDIT_LOG_DIR is set.

use anyhow::Context;
use bracket_pool::config::{AppConfig, LogFormat};
use bracket_pool::scenario::{Scenario, ScenarioRunner};
use bracket_pool::services::AuditTrailService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bracket_pool={}", config.log_level).into());

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config);

    info!("Bracket pool replay starting");
    info!("Environment: {}", config.environment);
    info!(
        "Event buffer: {}, max batch size: {}",
        config.engine.event_buffer, config.engine.max_batch_size
    );

    let scenario_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.scenario_path.clone())
        .context("No scenario given: pass a path or set SCENARIO_PATH")?;

    info!("Loading scenario from {:?}", scenario_path);
    let scenario = Scenario::from_file(&scenario_path)
        .with_context(|| format!("Failed to load scenario {:?}", scenario_path))?;

    let runner = ScenarioRunner::new(scenario, config.engine.clone())
        .await
        .context("Failed to seed scenario")?;

    let audit_task = match &config.audit_log_dir {
        Some(dir) => {
            let audit = Arc::new(AuditTrailService::new(dir)?);
            Some(audit.spawn_drain(runner.state().notifier.subscribe()))
        }
        None => None,
    };

    let outcome = runner.run().await;
    let report = match outcome {
        Ok(steps_run) => runner.report(steps_run).await,
        Err(e) => Err(e),
    };

    // Dropping the runner closes the event channel so the audit task can finish
    drop(runner);
    if let Some(task) = audit_task {
        match task.await {
            Ok(written) => info!("Audit trail recorded {} events", written),
            Err(e) => error!("Audit task failed: {}", e),
        }
    }

    let report = report.context("Scenario replay failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!("Bracket pool replay finished");
    Ok(())
}
