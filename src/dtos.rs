use crate::models::{Book, Role, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// DTOs (Data Transfer Objects) define the structure of data exchanged with clients.
// They are separate from database models to control exactly what data is exposed
// and to break the User/Role/Book/Review object graph into explicit, per-endpoint
// shapes (no automatic graph traversal during serialization).

// ============================================================================
// User & authentication DTOs
// ============================================================================

/// Registration request from client
///
/// Password strength is checked separately by the policy checker in the
/// handler; the validator rules here only reject structurally empty input.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request: email plus password
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct AuthenticateUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// User update request
///
/// Carries its own `id`, which must equal the path id (400 on mismatch).
/// Only names, username and email are updatable; password and role never
/// change through this path.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserUpdateDto {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,
}

/// Filtered user data sent to clients (excludes the password digest and the
/// stored token)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilterUserDto {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: String,
    pub role_id: Option<i32>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role_id: user.role_id,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponseDto {
    pub status: String,
    pub users: Vec<FilterUserDto>,
    pub results: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub user: FilterUserDto,
}

/// Login success response with the signed bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponseDto {
    pub token: String,
    pub message: String,
}

/// Generic success response
#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

// ============================================================================
// Role DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RoleInputDto {
    #[validate(length(min = 1, message = "Role name is required"))]
    pub name_role: String,
}

/// Role update request; `id` must equal the path id
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RoleUpdateDto {
    pub id: i32,

    #[validate(length(min = 1, message = "Role name is required"))]
    pub name_role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleListResponseDto {
    pub status: String,
    pub data: Vec<Role>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleResponseDto {
    pub status: String,
    pub data: Role,
}

// ============================================================================
// Book & review DTOs
// ============================================================================

/// Book creation request
///
/// Reviews may be supplied inline as part of the book graph; each nested
/// review is validated (rating 1..=5) before anything is written.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct BookInputDto {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    // No maximum length: the summary column is unconstrained TEXT.
    #[validate(length(min = 1, message = "Summary is required"))]
    pub summary: String,

    #[serde(default)]
    #[validate(nested)]
    pub reviews: Vec<ReviewInputDto>,
}

/// Book update request; `id` must equal the path id. Replaces all scalar
/// fields of the existing row.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct BookUpdateDto {
    pub id: i32,

    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[validate(length(min = 1, message = "Summary is required"))]
    pub summary: String,
}

/// Review supplied inline on book creation
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ReviewInputDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    pub comment: Option<String>,

    /// Defaults to the insertion time when unset
    pub review_date: Option<DateTime<Utc>>,

    pub user_id: i32,
}

/// Review as returned to clients, with its author eagerly loaded
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewDto {
    pub id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub review_date: DateTime<Utc>,
    pub user_id: i32,
    pub book_id: i32,
    pub user: Option<FilterUserDto>,
}

/// Single book with its reviews ordered newest first
#[derive(Debug, Serialize, Deserialize)]
pub struct BookWithReviewsDto {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: String,
    pub summary: String,
    pub reviews: Vec<ReviewDto>,
}

impl BookWithReviewsDto {
    pub fn from_book(book: &Book, reviews: Vec<ReviewDto>) -> Self {
        BookWithReviewsDto {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            category: book.category.clone(),
            summary: book.summary.clone(),
            reviews,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookListResponseDto {
    pub status: String,
    pub data: Vec<Book>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponseDto {
    pub status: String,
    pub data: BookWithReviewsDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewListResponseDto {
    pub status: String,
    pub data: Vec<ReviewDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_with_rating(rating: i32) -> ReviewInputDto {
        ReviewInputDto {
            rating,
            comment: None,
            review_date: None,
            user_id: 1,
        }
    }

    #[test]
    fn review_rating_bounds() {
        assert!(review_with_rating(0).validate().is_err());
        assert!(review_with_rating(6).validate().is_err());
        for rating in 1..=5 {
            assert!(review_with_rating(rating).validate().is_ok());
        }
    }

    #[test]
    fn nested_reviews_are_validated_on_book_creation() {
        let book = BookInputDto {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            category: "Science Fiction".to_string(),
            summary: "A desert planet and its spice.".to_string(),
            reviews: vec![review_with_rating(6)],
        };
        assert!(book.validate().is_err());
    }

    #[test]
    fn register_requires_valid_email() {
        let dto = RegisterUserDto {
            username: "frank".to_string(),
            email: "not-an-email".to_string(),
            password: "Abcdef1!".to_string(),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }
}
