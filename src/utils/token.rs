use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorMessage, HttpError};
use crate::models::{Role, User};

/// Sentinel role claim for users without a resolvable role
pub const DEFAULT_ROLE_CLAIM: &str = "DefaultRole";

/// Fallback literals for missing name parts in the display-name claim
pub const FALLBACK_FIRST_NAME: &str = "Usuario";
pub const FALLBACK_LAST_NAME: &str = "Desconocido";

/// Claims embedded in the bearer token
///
/// `role` is the role's id rendered as a string (or the "DefaultRole"
/// sentinel), `name` is the user's display name. There is deliberately no
/// subject claim: the token carries role and display name only.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub role: String,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
}

impl TokenClaims {
    /// Build claims from a user and its (already loaded) role
    ///
    /// Callers resolve the role relation first when `role_id` is present; a
    /// user without one gets the sentinel role claim. Missing name parts fall
    /// back to fixed literals rather than failing issuance.
    pub fn for_user(user: &User, role: Option<&Role>) -> (String, String) {
        let role_claim = role
            .map(|r| r.id.to_string())
            .unwrap_or_else(|| DEFAULT_ROLE_CLAIM.to_string());

        let full_name = format!(
            "{} {}",
            user.first_name.as_deref().unwrap_or(FALLBACK_FIRST_NAME),
            user.last_name.as_deref().unwrap_or(FALLBACK_LAST_NAME),
        );

        (role_claim, full_name)
    }
}

/// Sign a bearer token (HS256) carrying the role and display-name claims
///
/// Expiry is `expires_in_seconds` from now, UTC; the caller passes one day.
pub fn create_token(
    role: &str,
    name: &str,
    secret: &[u8],
    expires_in_seconds: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::seconds(expires_in_seconds)).timestamp() as usize;
    let claims = TokenClaims {
        role: role.to_string(),
        name: name.to_string(),
        iat,
        exp,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

/// Decode a bearer token, validating signature and expiry
pub fn decode_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<TokenClaims, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    );

    match decoded {
        Ok(token_data) => Ok(token_data.claims),
        Err(_) => Err(HttpError::unauthorized(
            ErrorMessage::InvalidToken.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-signing-secret";

    fn sample_user() -> User {
        User {
            id: 7,
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            username: Some("ada".to_string()),
            email: "ada@example.com".to_string(),
            password: "digest".to_string(),
            token: None,
            role_id: Some(3),
        }
    }

    #[test]
    fn token_round_trips_role_and_name() {
        let token = create_token("3", "Ada Lovelace", SECRET, 86400).unwrap();
        let claims = decode_token(token, SECRET).unwrap();
        assert_eq!(claims.role, "3");
        assert_eq!(claims.name, "Ada Lovelace");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("3", "Ada Lovelace", SECRET, 86400).unwrap();
        assert!(decode_token(token, b"some-other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // jsonwebtoken applies a 60s default leeway, so expire well past it
        let token = create_token("3", "Ada Lovelace", SECRET, -120).unwrap();
        assert!(decode_token(token, SECRET).is_err());
    }

    #[test]
    fn claims_use_role_id_when_loaded() {
        let user = sample_user();
        let role = Role {
            id: 3,
            name_role: "user".to_string(),
        };
        let (role_claim, name) = TokenClaims::for_user(&user, Some(&role));
        assert_eq!(role_claim, "3");
        assert_eq!(name, "Ada Lovelace");
    }

    #[test]
    fn claims_fall_back_without_role_or_names() {
        let user = User {
            first_name: None,
            last_name: None,
            role_id: None,
            ..sample_user()
        };
        let (role_claim, name) = TokenClaims::for_user(&user, None);
        assert_eq!(role_claim, DEFAULT_ROLE_CLAIM);
        assert_eq!(name, "Usuario Desconocido");
    }
}
