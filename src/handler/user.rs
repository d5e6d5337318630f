use crate::{
    AppState,
    db::{RoleExt, UserExt},
    dtos::{
        AuthResponseDto, AuthenticateUserDto, FilterUserDto, RegisterUserDto, Response,
        UserListResponseDto, UserResponseDto, UserUpdateDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::auth,
    utils::{password, token},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use tracing::instrument;
use validator::Validate;

/// Router for user endpoints under /api/User
///
/// Registration, authentication and update are public; listing, fetching by
/// id and deletion require a valid bearer token.
pub fn user_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        // POST /register - Create account (public)
        .route("/register", post(register))
        // POST /authenticate - Login, issues the bearer token (public)
        .route("/authenticate", post(authenticate))
        // GET / - List all users (requires auth)
        .route(
            "/",
            get(get_users).route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        // GET /{id} + DELETE /{id} (requires auth)
        .route(
            "/{id}",
            get(get_user)
                .delete(delete_user)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
        // PUT /{id} - Update names/username/email (public)
        .route("/{id}", put(update_user))
}

/// Register a new user account
///
/// Checks email and username uniqueness, enforces the password policy,
/// hashes the password and assigns the seeded "user" role.
#[instrument(skip(app_state, body), fields(username = %body.username, email = %body.email))]
pub async fn register(
    State(app_state): State<AppState>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid register input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    // Uniqueness is check-then-act here; the unique index on email backs it
    // up, and a losing race is mapped below when the insert reports it.
    let existing_email = app_state
        .db_client
        .get_user_by_email(&body.email)
        .await
        .map_err(|e| {
            tracing::error!("DB error, checking email: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;
    if existing_email.is_some() {
        tracing::error!("Email already registered");
        return Err(HttpError::bad_request("Email is already registered."));
    }

    let existing_username = app_state
        .db_client
        .get_user_by_username(&body.username)
        .await
        .map_err(|e| {
            tracing::error!("DB error, checking username: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;
    if existing_username.is_some() {
        tracing::error!("Username already taken");
        return Err(HttpError::bad_request("Username already exists!"));
    }

    // Every rule is reported at once, not just the first failure
    let violations = password::check_strength(&body.password);
    if !violations.is_empty() {
        tracing::error!("Weak password rejected");
        return Err(HttpError::bad_request(violations.join(" ")));
    }

    let hash_password = password::hash(&body.password).map_err(|e| {
        tracing::error!("Password hashing error: {}", e);
        HttpError::server_error(e.to_string())
    })?;

    // New accounts always get the seeded "user" role
    let default_role = app_state
        .db_client
        .get_role_by_name("user")
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting default role: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| {
            tracing::error!("Default role 'user' missing from database");
            HttpError::bad_request("Default role 'user' does not exist in the database.")
        })?;

    let result = app_state
        .db_client
        .save_user(
            body.first_name.as_deref(),
            body.last_name.as_deref(),
            &body.username,
            &body.email,
            &hash_password,
            default_role.id,
        )
        .await;

    match result {
        Ok(_user) => {
            tracing::info!(username = %body.username, email = %body.email, "register successful");
            Ok(Json(Response {
                status: "success",
                message: "User registered successfully!".to_string(),
            }))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            // A concurrent registration won the race between our check and
            // this insert; same outcome as the up-front duplicate check
            tracing::error!("DB error, saving user, unique violation: {}", db_err);
            Err(HttpError::bad_request("Email is already registered."))
        }
        Err(e) => {
            tracing::error!("DB error, saving user: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

/// Authenticate with email and password, issuing a signed bearer token
///
/// The token embeds the role id (or a sentinel) and the display name, expires
/// one day after issuance, and is also persisted as the user's last-issued
/// token.
#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn authenticate(
    State(app_state): State<AppState>,
    Json(body): Json<AuthenticateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid authenticate input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let user = app_state
        .db_client
        .get_user_by_email(&body.email)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| {
            tracing::error!("User not found");
            HttpError::not_found("User not found.")
        })?;

    let password_matched = password::compare(&body.password, &user.password).map_err(|e| {
        tracing::error!("Password comparison error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    if !password_matched {
        tracing::error!("Incorrect password");
        return Err(HttpError::bad_request("Incorrect password."));
    }

    // The role relation is not loaded with the user row; resolve it before
    // building claims when a role id is present
    let role = match user.role_id {
        Some(role_id) => app_state.db_client.get_role(role_id).await.map_err(|e| {
            tracing::error!("DB error, getting role: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?,
        None => None,
    };

    let (role_claim, full_name) = token::TokenClaims::for_user(&user, role.as_ref());

    let bearer_token = token::create_token(
        &role_claim,
        &full_name,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("Token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    app_state
        .db_client
        .update_user_token(user.id, &bearer_token)
        .await
        .map_err(|e| {
            tracing::error!("DB error, storing issued token: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(email = %body.email, "authenticate successful");
    Ok(Json(AuthResponseDto {
        token: bearer_token,
        message: "Login successful!".to_string(),
    }))
}

/// List all users (requires auth)
///
/// Password digests and stored tokens are filtered out of the response.
#[instrument(skip(app_state))]
pub async fn get_users(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state.db_client.get_users().await.map_err(|e| {
        tracing::error!("DB error, getting users: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let response = UserListResponseDto {
        status: "success".to_string(),
        results: users.len() as i64,
        users: FilterUserDto::filter_users(&users),
    };
    tracing::info!("get_users successful");
    Ok(Json(response))
}

/// Get a single user by id (requires auth)
#[instrument(skip(app_state))]
pub async fn get_user(
    Path(user_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(user_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| {
            tracing::error!("User not found");
            HttpError::not_found("User not found.")
        })?;

    let response = UserResponseDto {
        status: "success".to_string(),
        user: FilterUserDto::filter_user(&user),
    };
    tracing::info!("get_user successful");
    Ok(Json(response))
}

/// Update a user's names, username and email
///
/// The path id must match the id carried in the body; password and role are
/// not updatable through this path.
#[instrument(skip(app_state, body))]
pub async fn update_user(
    Path(user_id): Path<i32>,
    State(app_state): State<AppState>,
    Json(body): Json<UserUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    // Rejected before any read or write happens
    if user_id != body.id {
        tracing::error!("User id mismatch: path {} body {}", user_id, body.id);
        return Err(HttpError::bad_request(
            "User ID does not match the provided object.",
        ));
    }

    body.validate().map_err(|e| {
        tracing::error!("Invalid update_user input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let existing = app_state.db_client.get_user(user_id).await.map_err(|e| {
        tracing::error!("DB error, getting user: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;
    if existing.is_none() {
        tracing::error!("User not found");
        return Err(HttpError::not_found("User not found."));
    }

    app_state
        .db_client
        .update_user(
            user_id,
            body.first_name.as_deref(),
            body.last_name.as_deref(),
            body.username.as_deref(),
            &body.email,
        )
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                tracing::error!("User disappeared before update");
                HttpError::not_found("User not found.")
            }
            e => {
                tracing::error!("DB error, updating user: {}", e);
                HttpError::server_error_with_details(
                    "Database error.".to_string(),
                    e.to_string(),
                )
            }
        })?;

    tracing::info!("update_user successful");
    Ok(Json(Response {
        status: "success",
        message: "User updated successfully!".to_string(),
    }))
}

/// Delete a user by id (requires auth)
///
/// The user's reviews are removed by the store's FK cascade.
#[instrument(skip(app_state))]
pub async fn delete_user(
    Path(user_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let existing = app_state.db_client.get_user(user_id).await.map_err(|e| {
        tracing::error!("DB error, getting user: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;
    if existing.is_none() {
        tracing::error!("User not found");
        return Err(HttpError::not_found("User not found."));
    }

    app_state
        .db_client
        .delete_user(user_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                tracing::error!("User disappeared before delete");
                HttpError::not_found("User not found.")
            }
            e => {
                tracing::error!("DB error, deleting user: {}", e);
                HttpError::server_error_with_details(
                    "Database error.".to_string(),
                    e.to_string(),
                )
            }
        })?;

    tracing::info!("delete_user successful");
    Ok(Json(Response {
        status: "success",
        message: "User deleted successfully!".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn update_rejects_id_mismatch_before_touching_the_store() {
        // The pool never connects; if the handler issued a query before the
        // mismatch check, this would be a 500 instead of the asserted 400.
        let app_state = test_utils::lazy_app_state();

        let body = UserUpdateDto {
            id: 7,
            email: "someone@example.com".to_string(),
            ..Default::default()
        };

        let err = update_user(Path(5), State(app_state), Json(body))
            .await
            .err()
            .expect("mismatched ids are rejected");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("does not match"));
    }

    #[tokio::test]
    async fn duplicate_email_registration_is_rejected() {
        let Some(app_state) = test_utils::test_app_state().await else {
            return;
        };
        let tag = test_utils::unique_tag();
        let email = format!("dup{tag}@example.com");

        let first = RegisterUserDto {
            first_name: None,
            last_name: None,
            username: format!("dup{tag}"),
            email: email.clone(),
            password: "Abcdef1!".to_string(),
        };
        register(State(app_state.clone()), Json(first.clone()))
            .await
            .ok()
            .expect("first registration succeeds");

        // Same email, different username
        let second = RegisterUserDto {
            username: format!("dup{tag}b"),
            ..first
        };
        let err = register(State(app_state.clone()), Json(second))
            .await
            .err()
            .expect("second registration is rejected");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("already registered"));

        // Only the first account exists under that email
        let stored = app_state
            .db_client
            .get_user_by_email(&email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.username, Some(format!("dup{tag}")));

        app_state.db_client.delete_user(stored.id).await.unwrap();
    }

    #[tokio::test]
    async fn wrong_password_is_a_bad_request() {
        let Some(app_state) = test_utils::test_app_state().await else {
            return;
        };
        let tag = test_utils::unique_tag();
        let email = format!("auth{tag}@example.com");

        let body = RegisterUserDto {
            first_name: None,
            last_name: None,
            username: format!("auth{tag}"),
            email: email.clone(),
            password: "Abcdef1!".to_string(),
        };
        register(State(app_state.clone()), Json(body))
            .await
            .ok()
            .expect("registration succeeds");

        let login = AuthenticateUserDto {
            email: email.clone(),
            password: "Abcdef2!".to_string(),
        };
        let err = authenticate(State(app_state.clone()), Json(login))
            .await
            .err()
            .expect("wrong password is rejected");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("Incorrect password"));

        let stored = app_state
            .db_client
            .get_user_by_email(&email)
            .await
            .unwrap()
            .unwrap();
        app_state.db_client.delete_user(stored.id).await.unwrap();
    }
}
