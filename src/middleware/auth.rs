//! Autenticación JWT
//!
//! `SessionContext` se extrae directamente del header Authorization en cada
//! handler que lo pide. Los handlers públicos simplemente no lo piden.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use tracing::debug;

use crate::{
    models::session::SessionContext,
    state::AppState,
    utils::{
        errors::{forbidden_error, AppError},
        jwt::{extract_token_from_header, verify_token, JwtConfig},
    },
};

#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

        let token = extract_token_from_header(auth_header)?;
        let claims = verify_token(token, &JwtConfig::from(&state.config))?;
        let session = SessionContext::try_from(claims)?;

        debug!("🔑 Sesión {} ({})", session.user_id, session.role.as_str());
        Ok(session)
    }
}

/// Verificar permisos de administrador
pub fn require_admin(session: &SessionContext, operation: &str) -> Result<(), AppError> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(forbidden_error(operation, "administrator role required"))
    }
}
