use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{debug, info};

use crate::settings;
use crate::slip::{parse_slip, ParseMode, ParseOptions, ParsedSlip};

use super::models::{ErrorResponse, ParseRequest};
use super::state::ServerState;

pub fn router(settings: settings::Settings) -> Router {
    let state = Arc::new(ServerState { settings });
    Router::new()
        .route("/health", get(health))
        .route("/parse", post(parse))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

pub async fn run_server(settings: settings::Settings, addr: String) -> Result<()> {
    let app = router(settings);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address {}", addr))?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

fn bad_request(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

fn request_options(
    settings: &settings::Settings,
    request: &ParseRequest,
) -> Result<ParseOptions, (StatusCode, Json<ErrorResponse>)> {
    let mode = match request.mode.as_deref() {
        Some(raw) => raw
            .parse::<ParseMode>()
            .map_err(|err| bad_request(err.to_string()))?,
        None => settings.mode,
    };
    let book_hint = request
        .book_hint
        .clone()
        .or_else(|| settings.book_hint.clone())
        .filter(|value| !value.trim().is_empty());
    Ok(ParseOptions { book_hint, mode })
}

async fn parse(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<ParsedSlip>, (StatusCode, Json<ErrorResponse>)> {
    let options = request_options(&state.settings, &request)?;
    let input = request.payload.into_input();
    let slip = parse_slip(input, &options);
    debug!("parsed slip with {} bet(s)", slip.bets.len());
    Ok(Json(slip))
}
