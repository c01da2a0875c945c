//! SQLite-backed book store on top of a `sqlx` pool.

use async_trait::async_trait;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use super::{BookStore, BookTx, StoreError};
use crate::modules::books::models::{Book, BookFields, BookId, Isbn};

/// Writes nothing but takes SQLite's RESERVED lock, which turns the
/// deferred `BEGIN` into the equivalent of `BEGIN IMMEDIATE`. Competing
/// transactions then wait in the busy handler at `begin` instead of failing
/// with `SQLITE_BUSY` when their first write upgrades a shared lock.
const TAKE_WRITE_LOCK: &str = "UPDATE books SET id = id WHERE 0";

const SELECT_BOOK: &str =
    "SELECT id, isbn, title, author, publication_year, stock_quantity FROM books";

#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: i64,
    isbn: i64,
    title: String,
    author: String,
    publication_year: i32,
    stock_quantity: i32,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            isbn: row.isbn,
            title: row.title,
            author: row.author,
            publication_year: row.publication_year,
            stock_quantity: row.stock_quantity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn begin(&self) -> Result<Box<dyn BookTx>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(TAKE_WRITE_LOCK).execute(&mut *tx).await?;
        Ok(Box::new(SqliteTx { tx: Some(tx) }))
    }
}

struct SqliteTx {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteTx {
    fn conn(&mut self) -> Result<&mut SqliteConnection, StoreError> {
        self.tx.as_deref_mut().ok_or(StoreError::Finished)
    }
}

/// Map a write failure, singling out the isbn unique index.
fn write_error(err: sqlx::Error, isbn: Isbn) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateIsbn(isbn);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl BookTx for SqliteTx {
    async fn save(&mut self, id: Option<BookId>, fields: &BookFields) -> Result<Book, StoreError> {
        let conn = self.conn()?;

        let id = match id {
            None => sqlx::query(
                "INSERT INTO books (isbn, title, author, publication_year, stock_quantity) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(fields.isbn)
            .bind(&fields.title)
            .bind(&fields.author)
            .bind(fields.publication_year)
            .bind(fields.stock_quantity)
            .execute(&mut *conn)
            .await
            .map_err(|err| write_error(err, fields.isbn))?
            .last_insert_rowid(),
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE books SET isbn = ?, title = ?, author = ?, \
                     publication_year = ?, stock_quantity = ? WHERE id = ?",
                )
                .bind(fields.isbn)
                .bind(&fields.title)
                .bind(&fields.author)
                .bind(fields.publication_year)
                .bind(fields.stock_quantity)
                .bind(id)
                .execute(&mut *conn)
                .await
                .map_err(|err| write_error(err, fields.isbn))?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::Missing(id));
                }
                id
            }
        };

        Ok(Book::new(id, fields.clone()))
    }

    async fn find_by_id(&mut self, id: BookId) -> Result<Option<Book>, StoreError> {
        let row = sqlx::query_as::<_, BookRow>(&format!("{SELECT_BOOK} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(row.map(Book::from))
    }

    async fn find_by_isbn(&mut self, isbn: Isbn) -> Result<Option<Book>, StoreError> {
        let row = sqlx::query_as::<_, BookRow>(&format!("{SELECT_BOOK} WHERE isbn = ?"))
            .bind(isbn)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(row.map(Book::from))
    }

    async fn exists_by_id(&mut self, id: BookId) -> Result<bool, StoreError> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
            .bind(id)
            .fetch_one(self.conn()?)
            .await?;
        Ok(exists != 0)
    }

    async fn exists_by_isbn(&mut self, isbn: Isbn) -> Result<bool, StoreError> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = ?)")
                .bind(isbn)
                .fetch_one(self.conn()?)
                .await?;
        Ok(exists != 0)
    }

    async fn find_all(&mut self) -> Result<Vec<Book>, StoreError> {
        let rows = sqlx::query_as::<_, BookRow>(&format!("{SELECT_BOOK} ORDER BY id"))
            .fetch_all(self.conn()?)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn delete_by_id(&mut self, id: BookId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::store::conformance;
    use shelf_kernel::settings::DatabaseSettings;
    use shelf_kernel::Module;

    fn migrations() -> Vec<(String, shelf_kernel::Migration)> {
        crate::modules::books::BooksModule::new()
            .migrations()
            .into_iter()
            .map(|migration| ("books".to_string(), migration))
            .collect()
    }

    async fn store() -> SqliteBookStore {
        let pool = shelf_db::connect(&DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
        .unwrap();

        shelf_db::migrate(&pool, &migrations()).await.unwrap();

        SqliteBookStore::new(pool)
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        conformance::insert_assigns_increasing_ids(&store().await).await;
    }

    #[tokio::test]
    async fn unique_isbn_is_enforced() {
        conformance::unique_isbn_is_enforced(&store().await).await;
    }

    #[tokio::test]
    async fn update_keeps_id_and_replaces_fields() {
        conformance::update_keeps_id_and_replaces_fields(&store().await).await;
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        conformance::rollback_discards_writes(&store().await).await;
    }

    #[tokio::test]
    async fn dropped_transaction_is_rolled_back() {
        conformance::dropped_transaction_is_rolled_back(&store().await).await;
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_went_away() {
        conformance::delete_reports_whether_a_row_went_away(&store().await).await;
    }

    async fn file_store(dir: &tempfile::TempDir) -> SqliteBookStore {
        let pool = shelf_db::connect(&DatabaseSettings {
            url: format!("sqlite://{}", dir.path().join("books.db").display()),
            max_connections: 4,
        })
        .await
        .unwrap();
        shelf_db::migrate(&pool, &migrations()).await.unwrap();
        SqliteBookStore::new(pool)
    }

    #[tokio::test]
    async fn second_writer_waits_then_hits_the_unique_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir).await;

        let mut first = store.begin().await.unwrap();
        assert!(!first.exists_by_isbn(7).await.unwrap());

        let contender = store.clone();
        let second = tokio::spawn(async move {
            let mut tx = contender.begin().await?;
            tx.save(None, &conformance::fields(7, "Second")).await
        });

        first.save(None, &conformance::fields(7, "First")).await.unwrap();
        first.commit().await.unwrap();

        let err = second.await.unwrap().unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIsbn(7)), "got {err:?}");

        let mut tx = store.begin().await.unwrap();
        let all = tx.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "First");
    }

    #[tokio::test]
    async fn check_constraints_back_up_validation() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        let mut fields = conformance::fields(60, "Negative stock");
        fields.stock_quantity = -1;

        let err = tx.save(None, &fields).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
