//! Process lifecycle: connect, migrate, serve, shut down.

use anyhow::Context;
use shelf_kernel::settings::Settings;
use shelf_kernel::{InitCtx, ModuleRegistry};

/// Registry holding every application module
pub fn registry() -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    crate::register_all(&mut registry)?;
    Ok(registry)
}

/// Apply pending migrations and return how many ran.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let registry = registry()?;
    let pool = shelf_db::connect(&settings.database).await?;

    let applied = shelf_db::migrate(&pool, &registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    pool.close().await;

    Ok(applied)
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let registry = registry()?;
    let pool = shelf_db::connect(&settings.database).await?;
    let ctx = InitCtx {
        settings,
        db: &pool,
    };

    registry.init_modules(&ctx).await?;
    let applied = shelf_db::migrate(&pool, &registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, "database schema up to date");

    registry.start_modules(&ctx).await?;
    let served = shelf_http::start_server(&registry, settings).await;
    let stopped = registry.stop_modules().await;
    pool.close().await;

    served?;
    stopped
}
