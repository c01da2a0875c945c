//! Catalog rules on top of a [`BookStore`].
//!
//! Every public operation runs inside exactly one store transaction, which
//! is committed when the operation succeeds and rolled back otherwise.

use std::sync::Arc;

use futures::future::BoxFuture;

use super::error::{BookKey, CatalogError};
use super::models::{Book, BookFields, BookId, Isbn};
use super::store::{BookStore, BookTx};

#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn BookStore>,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Register a new book. Its isbn must not be in use.
    pub async fn create(&self, fields: BookFields) -> Result<Book, CatalogError> {
        fields.validate()?;

        let book = self
            .transactional(move |tx| {
                Box::pin(async move {
                    if tx.exists_by_isbn(fields.isbn).await? {
                        return Err(CatalogError::DuplicateIsbn(fields.isbn));
                    }
                    Ok(tx.save(None, &fields).await?)
                })
            })
            .await?;

        tracing::info!(book_id = book.id, isbn = book.isbn, "book created");
        Ok(book)
    }

    pub async fn remove(&self, id: BookId) -> Result<(), CatalogError> {
        self.transactional(move |tx| {
            Box::pin(async move {
                if !tx.exists_by_id(id).await? {
                    return Err(CatalogError::NotFound(BookKey::Id(id)));
                }
                // A concurrent delete may have won since the check.
                if !tx.delete_by_id(id).await? {
                    return Err(CatalogError::NotFound(BookKey::Id(id)));
                }
                Ok(())
            })
        })
        .await?;

        tracing::info!(book_id = id, "book removed");
        Ok(())
    }

    pub async fn get_by_id(&self, id: BookId) -> Result<Book, CatalogError> {
        self.transactional(move |tx| {
            Box::pin(async move {
                tx.find_by_id(id)
                    .await?
                    .ok_or(CatalogError::NotFound(BookKey::Id(id)))
            })
        })
        .await
    }

    pub async fn get_by_isbn(&self, isbn: Isbn) -> Result<Book, CatalogError> {
        self.transactional(move |tx| {
            Box::pin(async move {
                tx.find_by_isbn(isbn)
                    .await?
                    .ok_or(CatalogError::NotFound(BookKey::Isbn(isbn)))
            })
        })
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<Book>, CatalogError> {
        self.transactional(|tx| Box::pin(async move { Ok(tx.find_all().await?) }))
            .await
    }

    /// Replace every field of book `id`. Moving to an isbn held by another
    /// book is rejected and leaves the book untouched.
    pub async fn update(&self, id: BookId, fields: BookFields) -> Result<Book, CatalogError> {
        fields.validate()?;

        let book = self
            .transactional(move |tx| {
                Box::pin(async move {
                    let existing = tx
                        .find_by_id(id)
                        .await?
                        .ok_or(CatalogError::NotFound(BookKey::Id(id)))?;

                    if existing.isbn != fields.isbn && tx.exists_by_isbn(fields.isbn).await? {
                        return Err(CatalogError::DuplicateIsbn(fields.isbn));
                    }
                    Ok(tx.save(Some(existing.id), &fields).await?)
                })
            })
            .await?;

        tracing::info!(book_id = book.id, isbn = book.isbn, "book updated");
        Ok(book)
    }

    /// Run `op` inside a fresh transaction: commit when it succeeds, roll
    /// back and hand back its error when it fails.
    async fn transactional<T, F>(&self, op: F) -> Result<T, CatalogError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut dyn BookTx) -> BoxFuture<'t, Result<T, CatalogError>> + Send,
    {
        let mut tx = self.store.begin().await?;

        match op(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                tracing::debug!(error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }
}
