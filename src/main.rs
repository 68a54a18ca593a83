use anyhow::Context;
use chirp::{AppState, Config};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .context("connecting to the database")?;
    Migrator::up(&db, None).await.context("running migrations")?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("creating {}", config.upload_dir.display()))?;

    let addr = config.bind_addr();
    let app = chirp::router(AppState::new(db, &config));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
