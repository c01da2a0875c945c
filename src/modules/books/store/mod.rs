//! Persistence seam for books.
//!
//! A [`BookStore`] hands out transactions; every read and write goes through
//! a [`BookTx`]. Nothing a transaction writes is visible to others until
//! [`BookTx::commit`], and a transaction dropped without committing is
//! rolled back.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Book, BookFields, BookId, Isbn};

pub use memory::MemoryBookStore;
pub use sqlite::SqliteBookStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage-level unique constraint on isbn rejected a write.
    #[error("isbn {0} violates the unique index")]
    DuplicateIsbn(Isbn),

    /// An update targeted a row that does not exist.
    #[error("no book row with id {0}")]
    Missing(BookId),

    #[error("transaction already committed or rolled back")]
    Finished,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn BookTx>, StoreError>;
}

#[async_trait]
pub trait BookTx: Send {
    /// Insert `fields` as a new book when `id` is `None`, otherwise overwrite
    /// the book with that id. Returns the persisted book.
    async fn save(&mut self, id: Option<BookId>, fields: &BookFields) -> Result<Book, StoreError>;

    async fn find_by_id(&mut self, id: BookId) -> Result<Option<Book>, StoreError>;

    async fn find_by_isbn(&mut self, isbn: Isbn) -> Result<Option<Book>, StoreError>;

    async fn exists_by_id(&mut self, id: BookId) -> Result<bool, StoreError>;

    async fn exists_by_isbn(&mut self, isbn: Isbn) -> Result<bool, StoreError>;

    /// All books in ascending id order.
    async fn find_all(&mut self) -> Result<Vec<Book>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete_by_id(&mut self, id: BookId) -> Result<bool, StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;
}
