use super::DBClient;
use super::review::ReviewExt;
use crate::dtos::ReviewDto;
use crate::models::Book;

/// Book database operations trait
pub trait BookExt {
    async fn get_books(&self) -> Result<Vec<Book>, sqlx::Error>;

    async fn get_book(&self, book_id: i32) -> Result<Option<Book>, sqlx::Error>;

    /// Get a book together with its reviews ordered newest first, each
    /// review's author eagerly loaded
    async fn get_book_with_reviews(
        &self,
        book_id: i32,
    ) -> Result<Option<(Book, Vec<ReviewDto>)>, sqlx::Error>;

    async fn save_book(
        &self,
        title: &str,
        author: &str,
        category: &str,
        summary: &str,
    ) -> Result<Book, sqlx::Error>;

    /// Replace all scalar fields of the book row. Surfaces RowNotFound when
    /// no row matched, which the handler treats as a concurrency conflict.
    async fn update_book(
        &self,
        book_id: i32,
        title: &str,
        author: &str,
        category: &str,
        summary: &str,
    ) -> Result<(), sqlx::Error>;

    /// Delete book by ID. Dependent reviews are removed by the FK cascade.
    async fn delete_book(&self, book_id: i32) -> Result<(), sqlx::Error>;
}

impl BookExt for DBClient {
    async fn get_books(&self) -> Result<Vec<Book>, sqlx::Error> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, category, summary FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn get_book(&self, book_id: i32) -> Result<Option<Book>, sqlx::Error> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, category, summary FROM books WHERE id = $1",
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn get_book_with_reviews(
        &self,
        book_id: i32,
    ) -> Result<Option<(Book, Vec<ReviewDto>)>, sqlx::Error> {
        let Some(book) = self.get_book(book_id).await? else {
            return Ok(None);
        };

        let reviews = self.get_reviews_for_book(book_id).await?;

        Ok(Some((book, reviews)))
    }

    async fn save_book(
        &self,
        title: &str,
        author: &str,
        category: &str,
        summary: &str,
    ) -> Result<Book, sqlx::Error> {
        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (title, author, category, summary)
             VALUES ($1, $2, $3, $4)
             RETURNING id, title, author, category, summary",
        )
        .bind(title)
        .bind(author)
        .bind(category)
        .bind(summary)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    async fn update_book(
        &self,
        book_id: i32,
        title: &str,
        author: &str,
        category: &str,
        summary: &str,
    ) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            "UPDATE books SET title = $1, author = $2, category = $3, summary = $4
             WHERE id = $5",
        )
        .bind(title)
        .bind(author)
        .bind(category)
        .bind(summary)
        .bind(book_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn delete_book(&self, book_id: i32) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
