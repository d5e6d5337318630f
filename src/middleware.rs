use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{ErrorMessage, HttpError},
    utils::token,
};

/// Request extension carrying the claims of a validated bearer token
///
/// Authentication is stateless: the token embeds a role identifier and a
/// display name but no user id, so there is nothing to look up in the
/// database. Handlers that need the claims extract this from the request.
///
/// ```ignore
/// async fn my_handler(Extension(auth): Extension<AuthClaims>) {
///     // auth.role, auth.name
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthClaims {
    pub role: String,
    pub name: String,
}

/// Authentication middleware validating bearer tokens
///
/// Extracts the token from the `Authorization: Bearer <token>` header,
/// verifies the HS256 signature and expiry, and attaches the decoded claims
/// to the request for downstream handlers.
///
/// # Errors
/// Returns 401 Unauthorized when no token is provided or the token is
/// invalid or expired.
pub async fn auth(
    State(app_state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| {
            auth_value
                .strip_prefix("Bearer ")
                .map(|token| token.to_owned())
        })
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    // Checks the signature and the exp claim; nothing else is stateful
    let claims = token::decode_token(token, app_state.env.jwt_secret.as_bytes())?;

    req.extensions_mut().insert(AuthClaims {
        role: claims.role,
        name: claims.name,
    });

    Ok(next.run(req).await)
}
