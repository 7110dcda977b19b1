//! First-run seed script.
//!
//! Run with: cargo run --bin seed-instance
//!
//! Creates the initial tenant instance, the permission catalog, the
//! administrator and collaborator roles and an administrator user. Safe to
//! re-run: existing rows are reused.
//!
//! SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD override the administrator
//! credentials; without a password one is generated and printed once.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use obraflow_admin::config::AppConfig;
use obraflow_admin::db::{self, DbConfig};
use obraflow_admin::services::seeding::{SeedParams, SeedService};

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

    let mut params = SeedParams::default();
    if let Ok(email) = std::env::var("SEED_ADMIN_EMAIL") {
        params.admin_email = email;
    }
    let generated_password = match std::env::var("SEED_ADMIN_PASSWORD") {
        Ok(password) => {
            params.admin_password = password;
            false
        }
        Err(_) => true,
    };

    info!("=== ObraFlow instance seed ===");
    info!("instance: {} ({})", params.instance_name, params.instance_slug);
    info!("administrator: {}", params.admin_email);

    let pool = db::establish_connection(&DbConfig::from(&config)).await?;
    let service = SeedService::new(Arc::new(pool.clone()));

    let result = service.run(&params).await;
    pool.close().await?;

    match result {
        Ok(report) => {
            if report.users_created > 0 && generated_password {
                // Printed exactly once; it is not stored anywhere in clear.
                warn!(
                    "generated administrator password: {}",
                    params.admin_password
                );
            }
            if report.created_anything() {
                info!("seed complete");
            } else {
                info!("nothing to do: database already seeded");
            }
            Ok(())
        }
        Err(err) => {
            error!("seeding failed: {err}");
            Err(err.into())
        }
    }
}
