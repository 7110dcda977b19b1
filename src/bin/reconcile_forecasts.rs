//! Forecast/expense reconciliation repair script.
//!
//! Run with: cargo run --bin reconcile-forecasts
//!
//! Compares every non-pending material forecast against the expense record
//! sharing its id and fixes the ones a legacy description-matching bug left
//! stale or missing. Set DRY_RUN=1 (or true) to only report what would
//! change.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use obraflow_admin::config::AppConfig;
use obraflow_admin::db::{self, DbConfig};
use obraflow_admin::services::reconciliation::{ReconciliationService, RunMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mode = RunMode::from_env_flag(std::env::var("DRY_RUN").ok().as_deref());

    info!("=== ObraFlow forecast/expense reconciliation ===");
    if mode.is_preview() {
        info!("DRY_RUN set: no changes will be written");
    }

    let pool = db::establish_connection(&DbConfig::from(&config)).await?;
    let service = ReconciliationService::new(Arc::new(pool.clone()));

    let result = service.run(mode).await;
    pool.close().await?;

    match result {
        Ok(tally) => {
            info!("=== Summary ===");
            info!("  already correct: {}", tally.already_correct);
            info!("  corrected:       {}", tally.corrected);
            info!("  created:         {}", tally.created);
            info!("  total processed: {}", tally.processed());
            Ok(())
        }
        Err(err) => {
            error!("reconciliation failed: {err}");
            Err(err.into())
        }
    }
}
