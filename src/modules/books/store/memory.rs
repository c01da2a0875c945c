//! In-process book store.
//!
//! A transaction holds the store's lock for its whole lifetime and works on
//! a private copy of the shelf, which replaces the committed shelf on
//! commit. Transactions are therefore fully serialized.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{BookStore, BookTx, StoreError};
use crate::modules::books::models::{Book, BookFields, BookId, Isbn};

#[derive(Debug, Clone, Default)]
struct Shelf {
    last_id: BookId,
    books: BTreeMap<BookId, Book>,
}

impl Shelf {
    fn isbn_taken(&self, isbn: Isbn, except: Option<BookId>) -> bool {
        self.books
            .values()
            .any(|book| book.isbn == isbn && Some(book.id) != except)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBookStore {
    shelf: Arc<Mutex<Shelf>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn begin(&self) -> Result<Box<dyn BookTx>, StoreError> {
        let guard = self.shelf.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard: Some(guard),
            working,
        }))
    }
}

struct MemoryTx {
    guard: Option<OwnedMutexGuard<Shelf>>,
    working: Shelf,
}

impl MemoryTx {
    fn shelf(&mut self) -> Result<&mut Shelf, StoreError> {
        if self.guard.is_none() {
            return Err(StoreError::Finished);
        }
        Ok(&mut self.working)
    }
}

#[async_trait]
impl BookTx for MemoryTx {
    async fn save(&mut self, id: Option<BookId>, fields: &BookFields) -> Result<Book, StoreError> {
        let shelf = self.shelf()?;

        if let Some(id) = id {
            if !shelf.books.contains_key(&id) {
                return Err(StoreError::Missing(id));
            }
        }
        if shelf.isbn_taken(fields.isbn, id) {
            return Err(StoreError::DuplicateIsbn(fields.isbn));
        }

        let id = match id {
            Some(id) => id,
            None => {
                shelf.last_id += 1;
                shelf.last_id
            }
        };
        let book = Book::new(id, fields.clone());
        shelf.books.insert(id, book.clone());
        Ok(book)
    }

    async fn find_by_id(&mut self, id: BookId) -> Result<Option<Book>, StoreError> {
        Ok(self.shelf()?.books.get(&id).cloned())
    }

    async fn find_by_isbn(&mut self, isbn: Isbn) -> Result<Option<Book>, StoreError> {
        Ok(self
            .shelf()?
            .books
            .values()
            .find(|book| book.isbn == isbn)
            .cloned())
    }

    async fn exists_by_id(&mut self, id: BookId) -> Result<bool, StoreError> {
        Ok(self.shelf()?.books.contains_key(&id))
    }

    async fn exists_by_isbn(&mut self, isbn: Isbn) -> Result<bool, StoreError> {
        Ok(self.shelf()?.isbn_taken(isbn, None))
    }

    async fn find_all(&mut self) -> Result<Vec<Book>, StoreError> {
        Ok(self.shelf()?.books.values().cloned().collect())
    }

    async fn delete_by_id(&mut self, id: BookId) -> Result<bool, StoreError> {
        Ok(self.shelf()?.books.remove(&id).is_some())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let mut guard = self.guard.take().ok_or(StoreError::Finished)?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.guard.take().ok_or(StoreError::Finished)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::store::conformance;

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        conformance::insert_assigns_increasing_ids(&MemoryBookStore::new()).await;
    }

    #[tokio::test]
    async fn unique_isbn_is_enforced() {
        conformance::unique_isbn_is_enforced(&MemoryBookStore::new()).await;
    }

    #[tokio::test]
    async fn update_keeps_id_and_replaces_fields() {
        conformance::update_keeps_id_and_replaces_fields(&MemoryBookStore::new()).await;
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        conformance::rollback_discards_writes(&MemoryBookStore::new()).await;
    }

    #[tokio::test]
    async fn dropped_transaction_is_rolled_back() {
        conformance::dropped_transaction_is_rolled_back(&MemoryBookStore::new()).await;
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_went_away() {
        conformance::delete_reports_whether_a_row_went_away(&MemoryBookStore::new()).await;
    }

    #[tokio::test]
    async fn clones_share_the_same_shelf() {
        let store = MemoryBookStore::new();
        let clone = store.clone();

        let mut tx = store.begin().await.unwrap();
        tx.save(None, &conformance::fields(1, "Shared")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = clone.begin().await.unwrap();
        assert!(tx.exists_by_isbn(1).await.unwrap());
    }
}
