//! Pivot columnar hourly data into a timestamp-keyed forecast.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{HourlyRecord, HourlySeries, HourlyVariable, ReshapedWeather};

#[derive(Debug, Error, PartialEq)]
pub enum ReshapeError {
    #[error("Hourly response has no `{0}` column")]
    MissingVariable(HourlyVariable),

    #[error("Hourly `{variable}` column has {actual} values but the time axis has {expected}")]
    LengthMismatch {
        variable: HourlyVariable,
        expected: usize,
        actual: usize,
    },

    #[error("Hourly interval must be positive, got {0} seconds")]
    InvalidInterval(i64),

    #[error("Hourly time axis is irregular at position {0}")]
    IrregularTimeline(usize),

    #[error("Timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// Number of axis points from `start` (inclusive) to `end` (exclusive) spaced by `interval_secs`.
pub fn axis_len(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval_secs: i64,
) -> Result<usize, ReshapeError> {
    if interval_secs <= 0 {
        return Err(ReshapeError::InvalidInterval(interval_secs));
    }

    let span_ms = end.signed_duration_since(start).num_milliseconds();
    if span_ms <= 0 {
        return Ok(0);
    }
    let count = match interval_secs.checked_mul(1000) {
        Some(interval_ms) => (span_ms - 1) / interval_ms + 1,
        None => 1,
    };
    usize::try_from(count).map_err(|_| ReshapeError::InvalidInterval(interval_secs))
}

/// The `index`-th point of the axis, `start + index * interval_secs`.
pub fn axis_point(
    start: DateTime<Utc>,
    interval_secs: i64,
    index: usize,
) -> Result<DateTime<Utc>, ReshapeError> {
    let out_of_range = || ReshapeError::TimestampOutOfRange(start.timestamp());
    let offset = i64::try_from(index)
        .ok()
        .and_then(|i| i.checked_mul(interval_secs))
        .ok_or_else(out_of_range)?;
    let step = Duration::try_seconds(offset).ok_or_else(out_of_range)?;
    start
        .checked_add_signed(step)
        .ok_or(ReshapeError::TimestampOutOfRange(start.timestamp().saturating_add(offset)))
}

/// Build the whole time axis.
pub fn time_axis(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval_secs: i64,
) -> Result<Vec<DateTime<Utc>>, ReshapeError> {
    let len = axis_len(start, end, interval_secs)?;
    (0..len).map(|i| axis_point(start, interval_secs, i)).collect()
}

/// Zip the series' columns against its time axis.
///
/// Columns are bound by name. Every column must be as long as the declared
/// axis; a provider inconsistency fails the whole reshape instead of
/// silently shifting values onto the wrong hours. Lengths are compared
/// before any timestamp is generated.
pub fn reshape(series: &HourlySeries) -> Result<ReshapedWeather, ReshapeError> {
    let column = |variable: HourlyVariable| {
        series.column(variable).ok_or(ReshapeError::MissingVariable(variable))
    };
    let temperature = column(HourlyVariable::Temperature2m)?;
    let cloud_cover = column(HourlyVariable::CloudCover)?;
    let rain = column(HourlyVariable::Rain)?;

    let expected = axis_len(series.start, series.end, series.interval_secs)?;

    for (variable, values) in [
        (HourlyVariable::Temperature2m, temperature),
        (HourlyVariable::CloudCover, cloud_cover),
        (HourlyVariable::Rain, rain),
    ] {
        if values.len() != expected {
            return Err(ReshapeError::LengthMismatch {
                variable,
                expected,
                actual: values.len(),
            });
        }
    }

    let entries = (0..expected)
        .map(|i| {
            let ts = axis_point(series.start, series.interval_secs, i)?;
            let record = HourlyRecord {
                temperature_2m: temperature[i],
                cloud_cover: cloud_cover[i],
                rain: rain[i],
            };
            Ok((ts, record))
        })
        .collect::<Result<Vec<_>, ReshapeError>>()?;

    Ok(ReshapedWeather::from_entries(entries))
}
