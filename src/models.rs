use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role model representing the roles table
///
/// Roles are plain named records referenced by users through `users.role_id`.
/// The foreign key is declared ON DELETE RESTRICT, so a role cannot be
/// removed while any user still references it.
///
/// Seed data must contain a role named "user": registration assigns it to
/// every new account and fails when it is missing.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Role {
    pub id: i32,
    pub name_role: String,
}

/// User model representing the users table
///
/// Security notes:
/// - `password`: stores the Argon2id digest (never plain text). Handlers must
///   filter it out of responses with `FilterUserDto`.
/// - `token`: the last bearer token issued to this user. Informational only;
///   authentication is stateless and validates signatures, not this column.
///
/// `first_name`, `last_name` and `username` are optional: the token issuer
/// substitutes literal fallbacks for missing name parts.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub token: Option<String>,
    pub role_id: Option<i32>,
}

/// Book model representing the books table
///
/// `summary` is an unconstrained TEXT column; no maximum length is enforced.
/// Reviews attached to a book live in the reviews table and are loaded
/// explicitly per endpoint (newest first), never by automatic graph traversal.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: String,
    pub summary: String,
}

/// Review model representing the reviews table
///
/// One review belongs to exactly one user and one book:
/// - `user_id`: references users.id (ON DELETE CASCADE)
/// - `book_id`: references books.id (ON DELETE CASCADE)
///
/// `rating` is constrained to 1..=5 both by DTO validation and by a CHECK
/// constraint in the database. `review_date` defaults to the insertion time.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Review {
    pub id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub review_date: DateTime<Utc>,
    pub user_id: i32,
    pub book_id: i32,
}
