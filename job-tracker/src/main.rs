use std::sync::Arc;

use job_tracker::api::auth_service::AuthService;
use job_tracker::api::{ApiServer, AppState};
use job_tracker::config::AppConfig;
use job_tracker::database::{self, repositories::SqlxUserRepository};
use job_tracker::logging;
use mimalloc::MiMalloc;
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    let _log_guard = logging::init_logging(&config.log_dir)?;
    config.log_summary();

    // Initialize database
    let pool = database::init_pool(&config.database.url).await?;
    database::run_migrations(&pool).await?;

    let access_jwt = Arc::new(config.auth.access_jwt_service());
    let refresh_jwt = Arc::new(config.auth.refresh_jwt_service());
    let auth_service = Arc::new(AuthService::new(
        Arc::new(SqlxUserRepository::new(pool.clone())),
        access_jwt.clone(),
        refresh_jwt,
        config.auth.clone(),
    ));

    let server = ApiServer::new(config.server.clone(), AppState::new(access_jwt, auth_service));

    let cancel_token = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            cancel_token.cancel();
        }
    });

    server.run().await?;

    pool.close().await;
    info!("job-tracker stopped");
    Ok(())
}
