pub mod handlers;

use axum::{
    body::Body,
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::serial::SerialError;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: SerialError,
    },

    #[error("failed to list ports: {0}")]
    Enumeration(#[source] SerialError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Transport { .. } | ApiError::Enumeration(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Build the HTTP API with permissive CORS on every route.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/program", get(handlers::get_program).post(handlers::save_program))
        .route(
            "/api/program/send",
            get(handlers::send_program).post(handlers::send_program),
        )
        .route("/api/config", get(handlers::get_config).post(handlers::update_config))
        .route("/api/system/os", get(handlers::system_os))
        .route("/api/serial/ports", get(handlers::serial_ports))
        .route("/api/position/read", post(handlers::read_position))
        .route("/api/comm/log", get(handlers::comm_log))
        .route("/api/comm/log/clear", post(handlers::clear_comm_log))
        .layer(cors_layer())
        .layer(middleware::from_fn(options_no_content))
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Every OPTIONS request ends as an empty 204, preflight or not.
///
/// No handler accepts OPTIONS, so the request stops at the CORS layer or the
/// method router; only the status and body are rewritten here.
async fn options_no_content(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    let (mut parts, _) = next.run(request).await.into_parts();
    parts.status = StatusCode::NO_CONTENT;
    parts.headers.remove(header::ALLOW);
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::CONTENT_TYPE);
    Response::from_parts(parts, Body::empty())
}
