use super::api::ApiDoc;
use crate::{
    app::state::{AppConfig, AppState},
    error::GroundedError,
};
use axum::{
    extract::State,
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::time::Duration;
use tower_http::{classify::ServerErrorsFailureClass, cors::CorsLayer, trace::TraceLayer};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub(super) mod chat;

use chat::{ask, create_session, delete_session, get_session};

pub fn router(state: AppState, origins: Vec<String>) -> Router {
    let origins = origins.into_iter().filter_map(|origin| {
        match HeaderValue::from_str(&origin) {
            Ok(origin) => {
                tracing::debug!("Adding {origin:?} to allowed origins");
                Some(origin)
            }
            Err(e) => {
                tracing::warn!("Skipping invalid origin '{origin}': {e}");
                None
            }
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::list(origins))
        .allow_headers(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE]);

    Router::new()
        .route("/_health", get(health_check))
        .route("/info", get(app_config))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/messages", post(ask))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http().on_failure(
            |error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                tracing::error!("{error}")
            },
        ))
        .layer(cors)
}

#[utoipa::path(
    get,
    path = "/_health",
    responses(
        (status = 200, description = "Check whether the server is running")
    )
)]
pub(super) async fn health_check() -> impl IntoResponse {
    "OK"
}

#[utoipa::path(
    get,
    path = "/info",
    responses(
        (status = 200, description = "Get app configuration and available providers", body = AppConfig),
        (status = 500, description = "Internal server error")
    )
)]
pub(super) async fn app_config(state: State<AppState>) -> Result<impl IntoResponse, GroundedError> {
    Ok(Json(state.get_configuration().await?))
}
