use crate::{
    AppState,
    db::{BookExt, ReviewExt},
    dtos::{
        BookInputDto, BookListResponseDto, BookResponseDto, BookUpdateDto, BookWithReviewsDto,
        Response, ReviewListResponseDto,
    },
    error::{ErrorMessage, HttpError},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;
use validator::Validate;

/// Router for book endpoints under /api/Book (all public)
///
/// Reviews have no standalone handler: they are created inline on book
/// creation and read through the nested /{id}/Reviews listing.
pub fn book_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(get_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/{id}/Reviews", get(get_reviews_for_book))
}

/// List all books (without their reviews)
#[instrument(skip(app_state))]
pub async fn get_books(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let books = app_state.db_client.get_books().await.map_err(|e| {
        tracing::error!("DB error, getting books: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    tracing::info!("get_books successful");
    Ok(Json(BookListResponseDto {
        status: "success".to_string(),
        data: books,
    }))
}

/// Get a single book with its reviews ordered newest first
///
/// Each review carries its author, filtered of sensitive fields.
#[instrument(skip(app_state))]
pub async fn get_book(
    Path(book_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let (book, reviews) = app_state
        .db_client
        .get_book_with_reviews(book_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting book: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| {
            tracing::error!("Book not found");
            HttpError::not_found("Book not found.")
        })?;

    tracing::info!("get_book successful");
    Ok(Json(BookResponseDto {
        status: "success".to_string(),
        data: BookWithReviewsDto::from_book(&book, reviews),
    }))
}

/// List a book's reviews, newest first
#[instrument(skip(app_state))]
pub async fn get_reviews_for_book(
    Path(book_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    // Existence check first: an unknown book is 404, not an empty list
    let book = app_state.db_client.get_book(book_id).await.map_err(|e| {
        tracing::error!("DB error, getting book: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;
    if book.is_none() {
        tracing::error!("Book not found");
        return Err(HttpError::not_found("Book not found."));
    }

    let reviews = app_state
        .db_client
        .get_reviews_for_book(book_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting reviews: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!("get_reviews_for_book successful");
    Ok(Json(ReviewListResponseDto {
        status: "success".to_string(),
        data: reviews,
    }))
}

/// Create a book, optionally with inline reviews
///
/// Nested review ratings are validated (1..=5) before anything is written.
#[instrument(skip(app_state, body), fields(title = %body.title))]
pub async fn create_book(
    State(app_state): State<AppState>,
    Json(body): Json<BookInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_book input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let book = app_state
        .db_client
        .save_book(&body.title, &body.author, &body.category, &body.summary)
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating book: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    for review in &body.reviews {
        app_state
            .db_client
            .save_review(book.id, review)
            .await
            .map_err(|e| {
                tracing::error!("DB error, creating review: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;
    }

    tracing::info!("create_book successful");
    Ok(Json(Response {
        status: "success",
        message: "Book created successfully!".to_string(),
    }))
}

/// Update a book, replacing all scalar fields
///
/// The path id must match the id in the body. A matched-zero-rows update is
/// treated as a concurrency conflict and reported as 404.
#[instrument(skip(app_state, body))]
pub async fn update_book(
    Path(book_id): Path<i32>,
    State(app_state): State<AppState>,
    Json(body): Json<BookUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    if book_id != body.id {
        tracing::error!("Book id mismatch: path {} body {}", book_id, body.id);
        return Err(HttpError::bad_request("Book ID does not match."));
    }

    body.validate().map_err(|e| {
        tracing::error!("Invalid update_book input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    app_state
        .db_client
        .update_book(
            book_id,
            &body.title,
            &body.author,
            &body.category,
            &body.summary,
        )
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                tracing::error!("Book not found during update");
                HttpError::not_found("Book not found.")
            }
            e => {
                tracing::error!("DB error, updating book: {}", e);
                HttpError::server_error_with_details("Concurrency error.", e.to_string())
            }
        })?;

    tracing::info!("update_book successful");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a book by id
///
/// Its reviews are removed by the store's FK cascade; a later nested review
/// listing for this id answers 404.
#[instrument(skip(app_state))]
pub async fn delete_book(
    Path(book_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let existing = app_state.db_client.get_book(book_id).await.map_err(|e| {
        tracing::error!("DB error, getting book: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;
    if existing.is_none() {
        tracing::error!("Book not found");
        return Err(HttpError::not_found("Book not found."));
    }

    app_state
        .db_client
        .delete_book(book_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                tracing::error!("Book disappeared before delete");
                HttpError::not_found("Book not found.")
            }
            e => {
                tracing::error!("DB error, deleting book: {}", e);
                HttpError::server_error_with_details("Database error.", e.to_string())
            }
        })?;

    tracing::info!("delete_book successful");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{RoleExt, UserExt};
    use crate::dtos::ReviewInputDto;
    use crate::test_utils;

    #[tokio::test]
    async fn update_rejects_id_mismatch_before_touching_the_store() {
        let app_state = test_utils::lazy_app_state();

        let body = BookUpdateDto {
            id: 7,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            category: "Science Fiction".to_string(),
            summary: "A desert planet and its spice.".to_string(),
        };

        let err = update_book(Path(5), State(app_state), Json(body))
            .await
            .err()
            .expect("mismatched ids are rejected");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("does not match"));
    }

    #[tokio::test]
    async fn deleting_a_book_removes_its_reviews() {
        let Some(app_state) = test_utils::test_app_state().await else {
            return;
        };
        let db = &app_state.db_client;
        let tag = test_utils::unique_tag();

        let role = db.get_role_by_name("user").await.unwrap().unwrap();
        let user = db
            .save_user(
                None,
                None,
                &format!("casc{tag}"),
                &format!("casc{tag}@example.com"),
                "digest",
                role.id,
            )
            .await
            .unwrap();
        let book = db
            .save_book("Dune", "Frank Herbert", "Science Fiction", "Spice.")
            .await
            .unwrap();
        db.save_review(
            book.id,
            &ReviewInputDto {
                rating: 4,
                comment: Some("Solid.".to_string()),
                review_date: None,
                user_id: user.id,
            },
        )
        .await
        .unwrap();

        delete_book(Path(book.id), State(app_state.clone()))
            .await
            .ok()
            .expect("delete succeeds");

        // The nested listing answers 404, not an empty list
        let err = get_reviews_for_book(Path(book.id), State(app_state.clone()))
            .await
            .err()
            .expect("listing reviews of a deleted book fails");
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        // The dependent review is gone from the store as well
        assert!(db.get_reviews_for_book(book.id).await.unwrap().is_empty());

        db.delete_user(user.id).await.unwrap();
    }
}
