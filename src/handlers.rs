use crate::clear_client::ClearClient;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::*;
use crate::origin;
use crate::search::{SearchOutcome, SearchService};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;

/// Largest inbound JSON body accepted.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration, loaded once at startup.
    pub config: Config,
    /// Client for the CLEAR provider.
    pub clear_client: ClearClient,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, clear_person_search, clear_search),
    components(schemas(
        PersonSearchRequest,
        PhoneSearchRequest,
        PersonRecord,
        PhoneRecord,
        PhoneEntry,
        NoResultsBody,
        ErrorBody
    )),
    tags((name = "clear-relay", description = "Relay for CLEAR person and phone searches"))
)]
pub struct ApiDoc;

impl<T: Serialize> IntoResponse for SearchOutcome<T> {
    fn into_response(self) -> Response {
        match self {
            SearchOutcome::NoResults => {
                (StatusCode::NO_CONTENT, Json(NoResultsBody::default())).into_response()
            }
            SearchOutcome::Results(records) => (StatusCode::OK, Json(records)).into_response(),
        }
    }
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "clear-relay",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "clear-relay",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /clear-person-search
///
/// Person lookup by last name and SSN, with each match's phones attached.
#[utoipa::path(
    post,
    path = "/clear-person-search",
    tag = "clear-relay",
    request_body = PersonSearchRequest,
    responses(
        (status = 200, description = "Matches, most relevant first", body = [PersonRecord]),
        (status = 204, description = "Provider found nothing", body = NoResultsBody),
        (status = 400, description = "Body is not valid JSON for this endpoint", body = ErrorBody),
        (status = 403, description = "Origin not allowed", body = ErrorBody),
        (status = 500, description = "Provider or internal failure", body = ErrorBody)
    )
)]
pub async fn clear_person_search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PersonSearchRequest>, JsonRejection>,
) -> Result<SearchOutcome<PersonRecord>, AppError> {
    tracing::info!("POST /clear-person-search");
    let Json(params) = payload?;

    let service = SearchService::new(&state.clear_client, &state.config);
    service.person_search(&params).await
}

/// POST /clear-search
///
/// Phone lookup by person and/or business name.
#[utoipa::path(
    post,
    path = "/clear-search",
    tag = "clear-relay",
    request_body = PhoneSearchRequest,
    responses(
        (status = 200, description = "Phone numbers, most relevant first", body = [PhoneRecord]),
        (status = 204, description = "Provider found nothing", body = NoResultsBody),
        (status = 400, description = "Body is not valid JSON for this endpoint", body = ErrorBody),
        (status = 403, description = "Origin not allowed", body = ErrorBody),
        (status = 500, description = "Provider or internal failure", body = ErrorBody)
    )
)]
pub async fn clear_search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PhoneSearchRequest>, JsonRejection>,
) -> Result<SearchOutcome<PhoneRecord>, AppError> {
    tracing::info!("POST /clear-search");
    let Json(params) = payload?;

    let service = SearchService::new(&state.clear_client, &state.config);
    service.phone_search(&params).await
}

/// Serves the generated OpenAPI document.
async fn serve_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Serves a Swagger UI page pointed at `serve_openapi_spec`.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>CLEAR Relay - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Builds the full application router.
///
/// Search endpoints sit behind the origin check; health and docs do not.
pub fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let allowed_origin = HeaderValue::from_str(&state.config.allowed_origin)
        .map_err(|e| anyhow::anyhow!("ALLOWED_ORIGIN is not a valid header value: {}", e))?;

    let search_routes = Router::new()
        .route("/clear-person-search", post(clear_person_search))
        .route("/clear-search", post(clear_search))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            origin::require_allowed_origin,
        ));

    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(health))
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.json", get(serve_openapi_spec))
        .merge(search_routes)
        .with_state(state.clone())
        .layer(
            ServiceBuilder::new()
                // One slot per in-flight request across every route
                .layer(GlobalConcurrencyLimitLayer::new(
                    state.config.max_concurrent_requests,
                ))
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Ok(app)
}
