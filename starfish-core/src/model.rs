use std::{collections::HashMap, convert::TryFrom, fmt};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, ser::SerializeMap};

use crate::error::ServiceError;

/// A point on the globe, as returned by the geocoding lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Input to a forecast fetch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub days: u32,
}

impl WeatherQuery {
    pub fn new(latitude: f64, longitude: f64, days: u32) -> Self {
        Self { latitude, longitude, days }
    }

    /// Only the lower bound is enforced; the provider owns the upper one.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.days == 0 {
            return Err(ServiceError::InvalidQuery("days must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Hourly variables requested from the forecast provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HourlyVariable {
    Temperature2m,
    CloudCover,
    Rain,
}

impl HourlyVariable {
    pub fn as_str(&self) -> &'static str {
        match self {
            HourlyVariable::Temperature2m => "temperature_2m",
            HourlyVariable::CloudCover => "cloud_cover",
            HourlyVariable::Rain => "rain",
        }
    }

    /// Every variable, in the order they are requested.
    pub const fn all() -> &'static [HourlyVariable] {
        &[HourlyVariable::Temperature2m, HourlyVariable::CloudCover, HourlyVariable::Rain]
    }

    /// Comma-separated list suitable for the `hourly` query parameter.
    pub fn request_list() -> String {
        Self::all().iter().map(|v| v.as_str()).collect::<Vec<_>>().join(",")
    }
}

impl fmt::Display for HourlyVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HourlyVariable {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "temperature_2m" => Ok(HourlyVariable::Temperature2m),
            "cloud_cover" => Ok(HourlyVariable::CloudCover),
            "rain" => Ok(HourlyVariable::Rain),
            _ => Err(anyhow::anyhow!(
                "Unknown hourly variable '{value}'. Supported: temperature_2m, cloud_cover, rain."
            )),
        }
    }
}

/// Columnar hourly data: a regular time axis plus one named value column per variable.
///
/// The axis runs from `start` (inclusive) to `end` (exclusive) in steps of
/// `interval_secs`. Missing provider values are kept as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval_secs: i64,
    columns: HashMap<HourlyVariable, Vec<Option<f64>>>,
}

impl HourlySeries {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, interval_secs: i64) -> Self {
        Self { start, end, interval_secs, columns: HashMap::new() }
    }

    pub fn with_column(mut self, variable: HourlyVariable, values: Vec<Option<f64>>) -> Self {
        self.columns.insert(variable, values);
        self
    }

    pub fn insert_column(&mut self, variable: HourlyVariable, values: Vec<Option<f64>>) {
        self.columns.insert(variable, values);
    }

    pub fn column(&self, variable: HourlyVariable) -> Option<&[Option<f64>]> {
        self.columns.get(&variable).map(Vec::as_slice)
    }
}

/// The three variables at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    pub temperature_2m: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub rain: Option<f64>,
}

/// Timestamp-keyed forecast, kept in ascending time order.
///
/// Serializes as a JSON object whose keys are RFC 3339 timestamps with an
/// explicit `+00:00` offset, emitted in the same order as the entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReshapedWeather {
    entries: Vec<(DateTime<Utc>, HourlyRecord)>,
}

impl ReshapedWeather {
    pub(crate) fn from_entries(entries: Vec<(DateTime<Utc>, HourlyRecord)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(DateTime<Utc>, HourlyRecord)> {
        self.entries.iter()
    }

    pub fn get(&self, at: DateTime<Utc>) -> Option<&HourlyRecord> {
        self.entries.iter().find(|(ts, _)| *ts == at).map(|(_, record)| record)
    }
}

pub fn timestamp_key(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

impl Serialize for ReshapedWeather {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (ts, record) in &self.entries {
            map.serialize_entry(&timestamp_key(ts), record)?;
        }
        map.end()
    }
}
