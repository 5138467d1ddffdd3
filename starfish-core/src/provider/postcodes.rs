use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::{error::ServiceError, model::Coordinates, transport::HttpTransport};

use super::CoordinateResolver;

pub const POSTCODES_IO_URL: &str = "https://api.postcodes.io";
const PROVIDER: &str = "postcodes.io";

/// Postcode lookups against postcodes.io.
#[derive(Debug, Clone)]
pub struct PostcodesIoResolver {
    base_url: Url,
    transport: HttpTransport,
}

impl PostcodesIoResolver {
    pub fn new(base_url: &str, transport: HttpTransport) -> Result<Self, ServiceError> {
        Ok(Self { base_url: Url::parse(base_url)?, transport })
    }

    /// `{base}/postcodes/{postcode}`, with the postcode as a single path segment.
    fn lookup_url(&self, postcode: &str) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("postcodes")
            .push(postcode);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct PcResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PcResponse {
    result: Option<PcResult>,
}

#[async_trait]
impl CoordinateResolver for PostcodesIoResolver {
    #[tracing::instrument(skip(self), level = "info")]
    async fn resolve(&self, postcode: &str) -> Result<Coordinates, ServiceError> {
        let url = self.lookup_url(postcode)?;
        let parsed: PcResponse = self.transport.get_json(PROVIDER, &url).await?;

        let result = parsed
            .result
            .ok_or(ServiceError::MissingField { provider: PROVIDER, field: "result" })?;
        let latitude = result
            .latitude
            .ok_or(ServiceError::MissingField { provider: PROVIDER, field: "result.latitude" })?;
        let longitude = result
            .longitude
            .ok_or(ServiceError::MissingField { provider: PROVIDER, field: "result.longitude" })?;

        Ok(Coordinates { latitude, longitude })
    }
}
