use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;

use crate::{
    error::ServiceError,
    model::{HourlySeries, HourlyVariable, ReshapedWeather, WeatherQuery},
    reshape::{ReshapeError, reshape},
    transport::HttpTransport,
};

use super::WeatherFetcher;

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com";
const PROVIDER: &str = "open-meteo";

/// Spacing of the hourly axis when the response is too short to infer it.
const HOURLY_INTERVAL_SECS: i64 = 3600;

/// Hourly forecasts from Open-Meteo.
#[derive(Debug, Clone)]
pub struct OpenMeteoFetcher {
    base_url: Url,
    transport: HttpTransport,
}

impl OpenMeteoFetcher {
    pub fn new(base_url: &str, transport: HttpTransport) -> Result<Self, ServiceError> {
        Ok(Self { base_url: Url::parse(base_url)?, transport })
    }

    fn forecast_url(&self, query: &WeatherQuery) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["v1", "forecast"]);
        url.query_pairs_mut()
            .append_pair("latitude", &query.latitude.to_string())
            .append_pair("longitude", &query.longitude.to_string())
            .append_pair("hourly", &HourlyVariable::request_list())
            .append_pair("forecast_days", &query.days.to_string())
            .append_pair("timeformat", "unixtime")
            .append_pair("timezone", "GMT");
        Ok(url)
    }

    /// Raw hourly columns for `query`, before reshaping.
    pub async fn fetch_series(&self, query: &WeatherQuery) -> Result<HourlySeries, ServiceError> {
        query.validate()?;
        let url = self.forecast_url(query)?;

        let parsed: OmForecastResponse = self
            .transport
            .get_json(PROVIDER, &url)
            .await
            .map_err(with_provider_reason)?;

        let hourly = parsed
            .hourly
            .ok_or(ServiceError::MissingField { provider: PROVIDER, field: "hourly" })?;
        series_from_hourly(hourly)
    }
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<i64>,
    #[serde(flatten)]
    columns: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    hourly: Option<OmHourly>,
}

#[derive(Debug, Deserialize)]
struct OmErrorResponse {
    reason: String,
}

/// Replace a raw error body with the `reason` Open-Meteo puts in it.
fn with_provider_reason(err: ServiceError) -> ServiceError {
    match err {
        ServiceError::Upstream { provider, status, body } => {
            let body = serde_json::from_str::<OmErrorResponse>(&body)
                .map(|e| e.reason)
                .unwrap_or(body);
            ServiceError::Upstream { provider, status, body }
        }
        other => other,
    }
}

fn to_utc(ts: i64) -> Result<DateTime<Utc>, ReshapeError> {
    DateTime::from_timestamp(ts, 0).ok_or(ReshapeError::TimestampOutOfRange(ts))
}

/// Convert Open-Meteo's `hourly` block into a series with a declared interval.
///
/// The interval is inferred from the first two timestamps and every later
/// step must match it.
fn series_from_hourly(hourly: OmHourly) -> Result<HourlySeries, ServiceError> {
    let time = hourly.time;

    let interval_secs = match time.as_slice() {
        [first, second, ..] => second
            .checked_sub(*first)
            .ok_or(ReshapeError::TimestampOutOfRange(*second))?,
        _ => HOURLY_INTERVAL_SECS,
    };
    if interval_secs <= 0 {
        return Err(ReshapeError::InvalidInterval(interval_secs).into());
    }
    if let Some(i) =
        (1..time.len()).find(|&i| time[i].checked_sub(time[i - 1]) != Some(interval_secs))
    {
        return Err(ReshapeError::IrregularTimeline(i).into());
    }

    let (start, end) = match (time.first(), time.last()) {
        (Some(&first), Some(&last)) => {
            let end = last
                .checked_add(interval_secs)
                .ok_or(ReshapeError::TimestampOutOfRange(last))?;
            (to_utc(first)?, to_utc(end)?)
        }
        _ => (DateTime::<Utc>::UNIX_EPOCH, DateTime::<Utc>::UNIX_EPOCH),
    };

    let mut series = HourlySeries::new(start, end, interval_secs);
    for (name, value) in hourly.columns {
        let Ok(variable) = HourlyVariable::try_from(name.as_str()) else {
            tracing::debug!(column = %name, "ignoring unrequested hourly column");
            continue;
        };
        let values: Vec<Option<f64>> = serde_json::from_value(value)
            .map_err(|source| ServiceError::Parse { provider: PROVIDER, source })?;
        series.insert_column(variable, values);
    }
    Ok(series)
}

#[async_trait]
impl WeatherFetcher for OpenMeteoFetcher {
    #[tracing::instrument(skip(self), level = "info")]
    async fn fetch(&self, query: &WeatherQuery) -> Result<ReshapedWeather, ServiceError> {
        let series = self.fetch_series(query).await?;
        let reshaped = reshape(&series)?;
        tracing::debug!(entries = reshaped.len(), "reshaped hourly forecast");
        Ok(reshaped)
    }
}
