//! SQLite connection factory and migration runner.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Executor;

use shelf_kernel::settings::DatabaseSettings;
use shelf_kernel::Migration;

/// How long a connection waits on another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const LEDGER_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY (module, id)
    )
"#;

/// Open a connection pool for the configured database.
///
/// In-memory databases live and die with a single connection, so the pool
/// is pinned to one connection that is never recycled.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool_options = if settings.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(settings.max_connections.max(1))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to '{}'", settings.url))?;

    tracing::info!(target: "shelf-db", url = %settings.url, "database connected");
    Ok(pool)
}

/// Apply every migration not yet recorded in the `_migrations` ledger.
///
/// Each migration runs in its own transaction together with its ledger row.
/// Returns the number of migrations applied by this call.
pub async fn migrate(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    pool.execute(LEDGER_DDL)
        .await
        .context("failed to create migration ledger")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let done: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM _migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(pool)
                .await
                .context("failed to read migration ledger")?;

        if done.is_some() {
            tracing::debug!(
                target: "shelf-db",
                %module,
                id = migration.id,
                "migration already applied"
            );
            continue;
        }

        let mut tx = pool.begin().await.context("failed to open migration transaction")?;
        (&mut *tx)
            .execute(migration.up)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .context("failed to record migration")?;
        tx.commit().await.context("failed to commit migration")?;

        tracing::info!(target: "shelf-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
