use std::fmt;

use serde_json::json;
use shelf_http::error::AppError;
use thiserror::Error;

use super::models::{BookId, Isbn, ValidationErrors};
use super::store::StoreError;

/// How a missing book was looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookKey {
    Id(BookId),
    Isbn(Isbn),
}

impl fmt::Display for BookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookKey::Id(id) => write!(f, "id {}", id),
            BookKey::Isbn(isbn) => write!(f, "isbn {}", isbn),
        }
    }
}

/// Failures of catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("isbn {0} is already registered")]
    DuplicateIsbn(Isbn),

    #[error("book with {0} not found")]
    NotFound(BookKey),

    #[error("invalid book: {0}")]
    ValidationFailure(ValidationErrors),

    #[error("catalog store failure")]
    Store(#[source] StoreError),
}

impl From<ValidationErrors> for CatalogError {
    fn from(errors: ValidationErrors) -> Self {
        CatalogError::ValidationFailure(errors)
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            // The unique index caught what the pre-check missed.
            StoreError::DuplicateIsbn(isbn) => CatalogError::DuplicateIsbn(isbn),
            StoreError::Missing(id) => CatalogError::NotFound(BookKey::Id(id)),
            other => CatalogError::Store(other),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::DuplicateIsbn(isbn) => AppError::conflict(
                vec![json!({ "field": "isbn", "value": isbn })],
                err.to_string(),
            ),
            CatalogError::NotFound(_) => AppError::not_found(err.to_string()),
            CatalogError::ValidationFailure(ref errors) => {
                let details = errors
                    .violations()
                    .iter()
                    .map(|violation| json!(violation))
                    .collect();
                AppError::validation(details, err.to_string())
            }
            CatalogError::Store(store) => {
                AppError::Internal(anyhow::Error::new(store).context("catalog store failure"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::BookFields;
    use axum::http::StatusCode;

    #[test]
    fn store_conflicts_become_duplicate_isbn() {
        let err = CatalogError::from(StoreError::DuplicateIsbn(42));
        assert!(matches!(err, CatalogError::DuplicateIsbn(42)));
        assert_eq!(err.to_string(), "isbn 42 is already registered");
    }

    #[test]
    fn missing_rows_become_not_found() {
        let err = CatalogError::from(StoreError::Missing(9));
        assert!(matches!(err, CatalogError::NotFound(BookKey::Id(9))));
        assert_eq!(err.to_string(), "book with id 9 not found");
    }

    #[test]
    fn http_status_mapping() {
        let invalid = BookFields {
            isbn: 1,
            title: String::new(),
            author: "A".to_string(),
            publication_year: 2000,
            stock_quantity: 1,
        }
        .validate()
        .unwrap_err();

        let cases = [
            (CatalogError::DuplicateIsbn(1), StatusCode::CONFLICT),
            (
                CatalogError::NotFound(BookKey::Isbn(1)),
                StatusCode::NOT_FOUND,
            ),
            (CatalogError::from(invalid), StatusCode::BAD_REQUEST),
            (
                CatalogError::Store(StoreError::Finished),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }
}
