use crate::{
    AppState,
    db::RoleExt,
    dtos::{Response, RoleInputDto, RoleListResponseDto, RoleResponseDto, RoleUpdateDto},
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

/// Router for role endpoints under /api/Role (all public)
pub fn role_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(get_roles).post(create_role))
        .route(
            "/{id}",
            get(get_role).put(update_role).delete(delete_role),
        )
}

/// List all roles
#[instrument(skip(app_state))]
pub async fn get_roles(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let roles = app_state.db_client.get_roles().await.map_err(|e| {
        tracing::error!("DB error, getting roles: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    tracing::info!("get_roles successful");
    Ok(Json(RoleListResponseDto {
        status: "success".to_string(),
        data: roles,
    }))
}

/// Get a single role by id
#[instrument(skip(app_state))]
pub async fn get_role(
    Path(role_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let role = app_state
        .db_client
        .get_role(role_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting role: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| {
            tracing::error!("Role not found");
            HttpError::not_found("Role not found.")
        })?;

    tracing::info!("get_role successful");
    Ok(Json(RoleResponseDto {
        status: "success".to_string(),
        data: role,
    }))
}

/// Create a new role
#[instrument(skip(app_state, body), fields(name_role = %body.name_role))]
pub async fn create_role(
    State(app_state): State<AppState>,
    Json(body): Json<RoleInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_role input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    app_state
        .db_client
        .save_role(&body.name_role)
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating role: {}", e);
            HttpError::server_error_with_details("Database error occurred.", e.to_string())
        })?;

    tracing::info!("create_role successful");
    Ok(Json(Response {
        status: "success",
        message: "Role created successfully!".to_string(),
    }))
}

/// Update a role's name
///
/// The path id must match the id in the body. A matched-zero-rows update is
/// reported as a concurrency conflict: 404 when the role is gone.
#[instrument(skip(app_state, body))]
pub async fn update_role(
    Path(role_id): Path<i32>,
    State(app_state): State<AppState>,
    Json(body): Json<RoleUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    if role_id != body.id {
        tracing::error!("Role id mismatch: path {} body {}", role_id, body.id);
        return Err(HttpError::bad_request("Role ID does not match."));
    }

    body.validate().map_err(|e| {
        tracing::error!("Invalid update_role input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    app_state
        .db_client
        .update_role(role_id, &body.name_role)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                tracing::error!("Role not found during update");
                HttpError::not_found("Role not found.")
            }
            e => {
                tracing::error!("DB error, updating role: {}", e);
                HttpError::server_error_with_details("Concurrency error.", e.to_string())
            }
        })?;

    tracing::info!("update_role successful");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a role by id
///
/// The store rejects the deletion while users still reference the role
/// (ON DELETE RESTRICT); that failure surfaces as a 500 with details.
#[instrument(skip(app_state))]
pub async fn delete_role(
    Path(role_id): Path<i32>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let existing = app_state.db_client.get_role(role_id).await.map_err(|e| {
        tracing::error!("DB error, getting role: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;
    if existing.is_none() {
        tracing::error!("Role not found");
        return Err(HttpError::not_found("Role not found."));
    }

    app_state
        .db_client
        .delete_role(role_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                tracing::error!("Role disappeared before delete");
                HttpError::not_found("Role not found.")
            }
            e => {
                // Includes the FK restriction while users reference the role
                tracing::error!("DB error, deleting role: {}", e);
                HttpError::server_error_with_details("Database error.", e.to_string())
            }
        })?;

    tracing::info!("delete_role successful");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserExt;
    use crate::test_utils;

    #[tokio::test]
    async fn update_rejects_id_mismatch_before_touching_the_store() {
        let app_state = test_utils::lazy_app_state();

        let body = RoleUpdateDto {
            id: 7,
            name_role: "editor".to_string(),
        };

        let err = update_role(Path(5), State(app_state), Json(body))
            .await
            .err()
            .expect("mismatched ids are rejected");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("does not match"));
    }

    #[tokio::test]
    async fn referenced_role_cannot_be_deleted() {
        let Some(app_state) = test_utils::test_app_state().await else {
            return;
        };
        let db = &app_state.db_client;
        let tag = test_utils::unique_tag();

        let role = db.save_role(&format!("held{tag}")).await.unwrap();
        let user = db
            .save_user(
                None,
                None,
                &format!("held{tag}"),
                &format!("held{tag}@example.com"),
                "digest",
                role.id,
            )
            .await
            .unwrap();

        // The users.role_id FK restricts the delete while the user exists
        let err = delete_role(Path(role.id), State(app_state.clone()))
            .await
            .err()
            .expect("referenced role is not deletable");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(db.get_role(role.id).await.unwrap().is_some());

        // Deletable once the last reference is gone
        db.delete_user(user.id).await.unwrap();
        assert!(
            delete_role(Path(role.id), State(app_state.clone()))
                .await
                .is_ok()
        );
    }
}
