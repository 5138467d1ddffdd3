use std::{fmt::Debug, sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;

use crate::{
    Config,
    error::ServiceError,
    model::{Coordinates, ReshapedWeather, WeatherQuery},
    provider::{openmeteo::OpenMeteoFetcher, postcodes::PostcodesIoResolver},
    transport::{HttpTransport, ResponseCache, RetryPolicy},
};

pub mod openmeteo;
pub mod postcodes;

/// Turns a postal code into coordinates.
#[async_trait]
pub trait CoordinateResolver: Send + Sync + Debug {
    async fn resolve(&self, postcode: &str) -> Result<Coordinates, ServiceError>;
}

/// Fetches an hourly forecast and returns it keyed by timestamp.
#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn fetch(&self, query: &WeatherQuery) -> Result<ReshapedWeather, ServiceError>;
}

/// The pair of providers a server or one-shot command needs.
#[derive(Debug, Clone)]
pub struct Providers {
    pub coordinates: Arc<dyn CoordinateResolver>,
    pub weather: Arc<dyn WeatherFetcher>,
}

/// Build the shared transport described by `config`.
pub fn transport_from_config(config: &Config) -> anyhow::Result<HttpTransport> {
    let cache = ResponseCache::new(Duration::from_secs(config.cache.ttl_secs));
    let retry = RetryPolicy::new(
        config.retry.max_attempts,
        config.retry.initial_backoff_ms,
        config.retry.max_backoff_ms,
    );
    let timeout = Duration::from_secs(config.providers.request_timeout_secs);

    HttpTransport::with_timeout(timeout, cache, retry).context("Failed to build HTTP client")
}

/// Construct both providers from config, sharing one client and cache.
///
/// Postcode lookups are sent once; only forecast requests are retried.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Providers> {
    let transport = transport_from_config(config)?;
    let geocoding = transport.clone().with_retry_policy(RetryPolicy::single_attempt());

    let coordinates = PostcodesIoResolver::new(&config.providers.geocoding_url, geocoding)
        .with_context(|| {
            format!("Invalid geocoding_url '{}' in configuration", config.providers.geocoding_url)
        })?;
    let weather = OpenMeteoFetcher::new(&config.providers.forecast_url, transport).with_context(|| {
        format!("Invalid forecast_url '{}' in configuration", config.providers.forecast_url)
    })?;

    Ok(Providers { coordinates: Arc::new(coordinates), weather: Arc::new(weather) })
}
