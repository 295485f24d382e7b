use crate::errors::AppError;
use crate::handlers::AppState;
use axum::{
    extract::{Request, State},
    http::header::ORIGIN,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Rejects any request whose `Origin` header is not exactly the configured
/// allowed origin. Runs before the handler, so no provider call is made.
pub async fn require_allowed_origin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match origin {
        Some(ref origin) if origin == &state.config.allowed_origin => Ok(next.run(request).await),
        Some(origin) => Err(AppError::UnauthorizedOrigin(origin)),
        None => Err(AppError::UnauthorizedOrigin("<missing>".to_string())),
    }
}
