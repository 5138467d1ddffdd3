//! HTTP surface for `starfish`.
//!
//! Two endpoints, both thin wrappers over a provider call:
//! - `GET /get_coords?postcode=..`
//! - `GET /get_weather?latitude=..&longitude=..&days=..`

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use starfish_core::{Coordinates, Providers, ReshapedWeather, ServiceError, WeatherQuery};
use tokio::net::TcpListener;

pub mod telemetry;

pub fn build_app(providers: Providers) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/get_coords", get(get_coords))
        .route("/get_weather", get(get_weather))
        .with_state(providers)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, providers: Providers) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, build_app(providers))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "failed to listen for shutdown signal");
    }
}

/// Maps provider failures onto HTTP responses with a JSON `error` body.
#[derive(Debug)]
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if self.0.is_upstream() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self.0, "request failed");
        } else {
            tracing::debug!(%status, error = %self.0, "request rejected");
        }
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct CoordsParams {
    postcode: String,
}

async fn get_coords(
    State(providers): State<Providers>,
    Query(params): Query<CoordsParams>,
) -> Result<Json<Coordinates>, ApiError> {
    let coords = providers.coordinates.resolve(&params.postcode).await?;
    Ok(Json(coords))
}

async fn get_weather(
    State(providers): State<Providers>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<ReshapedWeather>, ApiError> {
    let weather = providers.weather.fetch(&query).await?;
    Ok(Json(weather))
}
