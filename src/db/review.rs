use super::DBClient;
use crate::dtos::{FilterUserDto, ReviewDto, ReviewInputDto};
use crate::models::Review;
use chrono::{DateTime, Utc};

/// Flat row produced by joining reviews with their authors
///
/// sqlx maps columns by name, so the user's columns are aliased with a
/// `user_` prefix in the query. The join is INNER: user_id is NOT NULL and
/// the FK cascade removes reviews together with their user.
#[derive(Debug, sqlx::FromRow)]
struct ReviewWithUserRow {
    id: i32,
    rating: i32,
    comment: Option<String>,
    review_date: DateTime<Utc>,
    user_id: i32,
    book_id: i32,
    user_first_name: Option<String>,
    user_last_name: Option<String>,
    user_username: Option<String>,
    user_email: String,
    user_role_id: Option<i32>,
}

impl ReviewWithUserRow {
    fn into_dto(self) -> ReviewDto {
        ReviewDto {
            id: self.id,
            rating: self.rating,
            comment: self.comment,
            review_date: self.review_date,
            user_id: self.user_id,
            book_id: self.book_id,
            user: Some(FilterUserDto {
                id: self.user_id,
                first_name: self.user_first_name,
                last_name: self.user_last_name,
                username: self.user_username,
                email: self.user_email,
                role_id: self.user_role_id,
            }),
        }
    }
}

/// Review database operations trait
pub trait ReviewExt {
    /// Get a book's reviews ordered by review date descending, each with its
    /// author eagerly loaded
    async fn get_reviews_for_book(&self, book_id: i32) -> Result<Vec<ReviewDto>, sqlx::Error>;

    /// Insert a review for a book. The review date falls back to now() when
    /// the input leaves it unset.
    async fn save_review(
        &self,
        book_id: i32,
        review: &ReviewInputDto,
    ) -> Result<Review, sqlx::Error>;
}

impl ReviewExt for DBClient {
    async fn get_reviews_for_book(&self, book_id: i32) -> Result<Vec<ReviewDto>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ReviewWithUserRow>(
            "SELECT r.id, r.rating, r.comment, r.review_date, r.user_id, r.book_id,
                    u.first_name AS user_first_name,
                    u.last_name AS user_last_name,
                    u.username AS user_username,
                    u.email AS user_email,
                    u.role_id AS user_role_id
             FROM reviews r
             JOIN users u ON u.id = r.user_id
             WHERE r.book_id = $1
             ORDER BY r.review_date DESC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ReviewWithUserRow::into_dto).collect())
    }

    async fn save_review(
        &self,
        book_id: i32,
        review: &ReviewInputDto,
    ) -> Result<Review, sqlx::Error> {
        let saved = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (rating, comment, review_date, user_id, book_id)
             VALUES ($1, $2, COALESCE($3, now()), $4, $5)
             RETURNING id, rating, comment, review_date, user_id, book_id",
        )
        .bind(review.rating)
        .bind(review.comment.as_deref())
        .bind(review.review_date)
        .bind(review.user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{BookExt, RoleExt, UserExt};
    use crate::test_utils;
    use chrono::Duration;

    #[tokio::test]
    async fn reviews_come_back_newest_first() {
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
                &format!("ord{tag}"),
                &format!("ord{tag}@example.com"),
                "digest",
                role.id,
            )
            .await
            .unwrap();
        let book = db
            .save_book("Dune", "Frank Herbert", "Science Fiction", "Spice.")
            .await
            .unwrap();

        let newer = Utc::now() - Duration::days(1);
        let older = Utc::now() - Duration::days(2);
        // Newer one inserted first so insertion order disagrees with date order
        for date in [newer, older] {
            db.save_review(
                book.id,
                &ReviewInputDto {
                    rating: 5,
                    comment: None,
                    review_date: Some(date),
                    user_id: user.id,
                },
            )
            .await
            .unwrap();
        }

        let reviews = db.get_reviews_for_book(book.id).await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert!(reviews[0].review_date > reviews[1].review_date);
        // Each review carries its author
        assert!(reviews.iter().all(|r| r.user.is_some()));

        db.delete_book(book.id).await.unwrap();
        db.delete_user(user.id).await.unwrap();
    }
}
