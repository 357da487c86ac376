use crate::domain::ports::PlaceSource;
use crate::utils::error::{PlaceMapError, Result};
use axum::extract::{Path, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Ten minutes fresh, a day of stale-while-revalidate at the edge.
pub const CACHE_CONTROL: &str = "s-maxage=600, stale-while-revalidate=86400";

pub fn router<S>(source: Arc<S>) -> Router
where
    S: PlaceSource + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/places", get(list_places::<S>))
        .route("/api/places/:id", get(get_place::<S>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(source)
}

pub async fn serve<S>(addr: SocketAddr, source: Arc<S>) -> Result<()>
where
    S: PlaceSource + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("places API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(source)).await?;
    Ok(())
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn list_places<S: PlaceSource>(State(source): State<Arc<S>>) -> Response {
    match source.load_places().await {
        Ok(response) => (
            StatusCode::OK,
            [(header::CACHE_CONTROL, CACHE_CONTROL)],
            Json(response),
        )
            .into_response(),
        Err(err) => {
            error!("failed to load places: {err}");
            load_failure("Failed to load places", &err)
        }
    }
}

async fn get_place<S: PlaceSource>(
    State(source): State<Arc<S>>,
    Path(raw_id): Path<String>,
) -> Response {
    let id = match parse_place_id(&raw_id) {
        Ok(Some(id)) => id,
        // Integral but beyond any stored id.
        Ok(None) => return error_response(StatusCode::NOT_FOUND, &not_found(&raw_id)),
        Err(err) => return error_response(StatusCode::BAD_REQUEST, &err),
    };

    let response = match source.load_places().await {
        Ok(response) => response,
        Err(err) => {
            error!("failed to load place {id}: {err}");
            return load_failure("Failed to load place", &err);
        }
    };

    match response.places.into_iter().find(|place| place.id == id) {
        Some(place) => (
            StatusCode::OK,
            [(header::CACHE_CONTROL, CACHE_CONTROL)],
            Json(place),
        )
            .into_response(),
        None => error_response(StatusCode::NOT_FOUND, &not_found(&raw_id)),
    }
}

fn not_found(raw_id: &str) -> PlaceMapError {
    PlaceMapError::PlaceNotFound {
        id: raw_id.trim().to_string(),
    }
}

fn error_response(status: StatusCode, err: &PlaceMapError) -> Response {
    (status, Json(json!({ "message": err.user_message() }))).into_response()
}

fn load_failure(message: &str, err: &PlaceMapError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": message, "error": err.to_string() })),
    )
        .into_response()
}

/// Accepts anything JavaScript's `Number(..)` turns into an integer in
/// decimal notation: `"7"`, `" 7 "`, `"7.0"`, `"7e0"`. Integers outside the
/// `i64` range parse to `None`; no place can carry such an id.
pub fn parse_place_id(raw: &str) -> Result<Option<i64>> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(Some(id));
    }

    let invalid = || PlaceMapError::InvalidPlaceId {
        raw: raw.to_string(),
    };

    // Rust accepts "inf"/"nan" spellings that JavaScript does not; both fail the finiteness check.
    let value = trimmed.parse::<f64>().map_err(|_| invalid())?;
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(invalid());
    }
    if value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Ok(Some(value as i64))
    } else {
        Ok(None)
    }
}
