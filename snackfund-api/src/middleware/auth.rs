/// JWT authentication layer
///
/// Validates the bearer token on every protected route and inserts an
/// [`AuthContext`] into the request extensions. Handlers read it back with
/// `Extension<AuthContext>`.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use snackfund_shared::auth::middleware::authenticate_bearer;

/// Rejects the request with 401 unless it carries a valid bearer token
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate_bearer(req.headers(), state.jwt_secret()).map_err(|err| {
        tracing::debug!(error = %err, path = %req.uri().path(), "rejected request");
        ApiError::from(err)
    })?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
