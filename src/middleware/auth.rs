use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{common::error::AppError, config::AppState, models::auth::IdentityClaim};

// O middleware em si: valida o token e coloca a identidade nos "extensions".
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let headers = request.headers();

    // Cabeçalho ausente é 401 "missing"; presente mas fora do formato Bearer é "invalid".
    let credential = if headers.contains_key(AUTHORIZATION) {
        let bearer = headers
            .typed_get::<Authorization<Bearer>>()
            .ok_or(AppError::InvalidCredential)?;
        Some(bearer.token().to_owned())
    } else {
        None
    };

    let claim = app_state.token_verifier.verify(credential.as_deref())?;

    request.extensions_mut().insert(claim);
    Ok(next.run(request).await)
}

// Extrator para obter a identidade autenticada diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub IdentityClaim);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityClaim>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::MissingCredential)
    }
}
