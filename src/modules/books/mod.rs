//! Book catalog: models, persistence, rules and HTTP routes.

pub mod error;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use once_cell::sync::OnceCell;
use shelf_kernel::{InitCtx, Migration, Module};

pub use error::{BookKey, CatalogError};
pub use models::{Book, BookFields, BookId, BookPayload, Isbn};
pub use service::BookService;
pub use store::{BookStore, MemoryBookStore, SqliteBookStore};

/// Books module: owns the catalog service and its routes
pub struct BooksModule {
    service: OnceCell<Arc<BookService>>,
}

impl BooksModule {
    /// Module whose service is built from the database pool at init.
    pub const fn new() -> Self {
        Self {
            service: OnceCell::new(),
        }
    }

    /// Module wired to an existing service; init leaves it in place.
    pub fn with_service(service: BookService) -> Self {
        Self {
            service: OnceCell::with_value(Arc::new(service)),
        }
    }

    pub fn service(&self) -> Option<&Arc<BookService>> {
        self.service.get()
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.service.get_or_init(|| {
            let store = SqliteBookStore::new(ctx.db.clone());
            Arc::new(BookService::new(Arc::new(store)))
        });

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        match self.service.get() {
            Some(service) => routes::router(service.clone()),
            None => {
                tracing::warn!(module = self.name(), "routes requested before init; none mounted");
                Router::new()
            }
        }
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(routes::openapi())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    id               INTEGER PRIMARY KEY AUTOINCREMENT,
                    isbn             INTEGER NOT NULL,
                    title            TEXT    NOT NULL CHECK (length(trim(title)) > 0),
                    author           TEXT    NOT NULL CHECK (length(trim(author)) > 0),
                    publication_year INTEGER NOT NULL CHECK (publication_year > 0),
                    stock_quantity   INTEGER NOT NULL CHECK (stock_quantity > 0),
                    CONSTRAINT books_isbn_unique UNIQUE (isbn)
                )
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new())
}
