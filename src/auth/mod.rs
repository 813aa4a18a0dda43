//! Bearer JWT auth (§6): RS256, public key loaded from `jwt_public_key_path`,
//! payload required to include `user` (a UUID string). Extractor shape
//! grounded on teacher's `routes/auth.rs::AuthUser`
//! (`FromRequestParts<Arc<AppState>>`, case-insensitive `Bearer ` prefix,
//! empty-token rejection); verification itself (RS256, not the teacher's
//! original algorithm) is this crate's own per spec.md §6.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: Uuid,
    pub exp: usize,
}

/// Verifies `token` against the configured RS256 public key and returns its
/// claims. A malformed or unverifiable token is always `AppError::Unauthorized`
/// — the JWT error detail itself is logged, not surfaced (teacher's
/// `AppError::Jwt` pattern, generalized here since this crate never mints
/// tokens, only verifies externally-issued ones).
pub fn verify_token(state: &Arc<AppState>, token: &str) -> Result<Claims, AppError> {
    if state.config.jwt.algorithm != "RS256" {
        return Err(AppError::Config(format!(
            "unsupported jwt algorithm: {}",
            state.config.jwt.algorithm
        )));
    }

    let decoding_key = DecodingKey::from_rsa_pem(&state.jwt_public_key).map_err(|e| {
        tracing::error!("invalid RS256 public key: {:?}", e);
        AppError::Config("invalid jwt public key".to_string())
    })?;

    let validation = Validation::new(Algorithm::RS256);

    let token_data = jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!("jwt verification failed: {:?}", e);
        AppError::Unauthorized
    })?;

    Ok(token_data.claims)
}

/// Extractor for an authenticated `staff_id`. Used on mutating admin routes
/// (templates/scheduled/periodic create & update) per spec.md §6.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        if !auth_header.to_ascii_lowercase().starts_with("bearer ") {
            return Err(AppError::Unauthorized);
        }

        let token = auth_header[7..].trim();
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let claims = verify_token(state, token)?;
        Ok(AuthUser(claims.user))
    }
}
