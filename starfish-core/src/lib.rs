//! Core library for the `starfish` service.
//!
//! This crate defines:
//! - Configuration loading
//! - Geocoding and forecast providers behind async traits
//! - The caching, retrying HTTP transport they share
//! - Reshaping of columnar hourly forecasts into timestamp-keyed records
//!
//! It is used by `starfish-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod reshape;
pub mod transport;

pub use config::Config;
pub use error::ServiceError;
pub use model::{Coordinates, HourlyRecord, HourlySeries, HourlyVariable, ReshapedWeather, WeatherQuery};
pub use provider::{CoordinateResolver, Providers, WeatherFetcher, providers_from_config};
pub use reshape::{ReshapeError, reshape};
