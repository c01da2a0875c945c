//! The unit of composition: a module contributes state, routes, docs and
//! schema to the application and takes part in its startup and shutdown.
//!
//! Lifecycle, as driven by [`ModuleRegistry`](crate::ModuleRegistry):
//! `init` on every module, then every module's `migrations`, then `start`,
//! then `routes`/`openapi` are read to build the HTTP app. `stop` runs in
//! reverse registration order once the server has drained.

use async_trait::async_trait;
use axum::Router;
use sqlx::SqlitePool;

use crate::settings::Settings;

/// Shared handles a module may capture during `init` and `start`.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
    pub db: &'a SqlitePool,
}

/// A single schema step. `id` is unique within its module and recorded in
/// the migration ledger once `up` has run.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

#[async_trait]
pub trait Module: Sync + Send {
    /// Registry key and mount point: routes live under `/api/{name}`.
    fn name(&self) -> &'static str;

    /// Build the module's state from the pool. The schema may not exist yet.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Read after `init`; a module with no state yet should mount nothing.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI 3.1 fragment with paths relative to the mount point.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Runs once the schema is current.
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
