//! Catalog endpoints: books, copies and stock levels

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookSummary, CreateBook},
        copy::{BookCopy, UpdateCopyStatus},
    },
};

use super::AuthenticatedMember;

/// Book with its copies
#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    #[serde(flatten)]
    pub book: BookSummary,
    pub copies: Vec<BookCopy>,
}

/// Set stock level request
#[derive(Deserialize, ToSchema)]
pub struct SetStockLevel {
    /// Desired number of copies in circulation
    pub target: i64,
}

/// List books with availability
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active books with stock counts", body = Vec<BookSummary>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedMember(_claims): AuthenticatedMember,
) -> AppResult<Json<Vec<BookSummary>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Get a book with its copies
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedMember(_claims): AuthenticatedMember,
    Path(book_id): Path<i32>,
) -> AppResult<Json<BookResponse>> {
    let (book, copies) = state.services.catalog.get_book(book_id).await?;
    Ok(Json(BookResponse { book, copies }))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookSummary),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<BookSummary>)> {
    claims.require_staff()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let book = state.services.catalog.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Soft-delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deactivated"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(book_id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.catalog.deactivate_book(book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reconcile a book's copy count
#[utoipa::path(
    put,
    path = "/books/{id}/stock",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = SetStockLevel,
    responses(
        (status = 200, description = "Stock reconciled", body = BookSummary),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Not enough removable copies")
    )
)]
pub async fn set_stock_level(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(book_id): Path<i32>,
    Json(request): Json<SetStockLevel>,
) -> AppResult<Json<BookSummary>> {
    claims.require_staff()?;

    let book = state
        .services
        .catalog
        .set_stock_level(book_id, request.target)
        .await?;
    Ok(Json(book))
}

/// Update a copy's status (lost / maintenance / available)
#[utoipa::path(
    put,
    path = "/copies/{id}/status",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Copy ID")
    ),
    request_body = UpdateCopyStatus,
    responses(
        (status = 200, description = "Copy updated", body = BookCopy),
        (status = 404, description = "Copy not found"),
        (status = 409, description = "Copy is on loan or held")
    )
)]
pub async fn update_copy_status(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(copy_id): Path<i32>,
    Json(request): Json<UpdateCopyStatus>,
) -> AppResult<Json<BookCopy>> {
    claims.require_staff()?;

    let copy = state
        .services
        .catalog
        .update_copy_status(copy_id, request.status)
        .await?;
    Ok(Json(copy))
}
