/// JWT authentication layer
///
/// Validates the access token (Bearer header or `access-token` cookie) and
/// inserts the resulting `AuthContext` into request extensions. Requests
/// without valid credentials are answered with 401 before reaching a handler.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use teamboard_shared::auth::middleware::authenticate;

pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret()).map_err(|err| {
        tracing::debug!(error = %err, path = %req.uri().path(), "Authentication rejected");
        ApiError::from(err)
    })?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
