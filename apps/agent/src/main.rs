mod config;
mod main_lib;

use config::AgentConfig;
use main_lib::{build_state, init_tracing, report_draft, spawn_snapshot_logger, start_sync};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AgentConfig::from_env()?;
    init_tracing();
    let state = build_state(&config)?;

    report_draft(&state);
    let loggers = vec![
        spawn_snapshot_logger("applications", state.applications.subscribe()),
        spawn_snapshot_logger("opportunities", state.opportunities.subscribe()),
        spawn_snapshot_logger("bookmarks", state.bookmarks.subscribe()),
    ];
    let handles = start_sync(&state);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    for handle in handles {
        handle.stop();
    }
    for logger in loggers {
        logger.abort();
    }
    state.notifications.dispose();
    Ok(())
}
