//! HTTP handlers for the books module.

mod openapi;

pub use openapi::openapi;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shelf_http::error::AppError;

use super::error::CatalogError;
use super::models::{Book, BookId, BookPayload, Isbn};
use super::service::BookService;

type Service = State<Arc<BookService>>;

/// Router serving the catalog; mounted under `/api/books`.
pub fn router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route("/isbn/{isbn}", get(get_book_by_isbn))
        .route("/{id}", get(get_book).put(update_book).delete(remove_book))
        .with_state(service)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(State(service): Service) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(service.list_all().await?))
}

async fn create_book(
    State(service): Service,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(payload) = payload?;
    let fields = payload.into_fields().map_err(CatalogError::from)?;
    let book = service.create(fields).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn get_book(
    State(service): Service,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    Ok(Json(service.get_by_id(id).await?))
}

async fn get_book_by_isbn(
    State(service): Service,
    isbn: Result<Path<Isbn>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(isbn) = isbn?;
    Ok(Json(service.get_by_isbn(isbn).await?))
}

async fn update_book(
    State(service): Service,
    id: Result<Path<BookId>, PathRejection>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let fields = payload.into_fields().map_err(CatalogError::from)?;
    Ok(Json(service.update(id, fields).await?))
}

async fn remove_book(
    State(service): Service,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
