use anyhow::{Context, Result};
use async_trait::async_trait;
use keepsake_core::models::GeoPoint;
use keepsake_infra::RateLimiter;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use super::{Address, Geocoder};

/// Reverse geocoder backed by a Nominatim-compatible HTTP service.
///
/// Calls are spaced by the shared rate limiter no matter how many callers hold
/// the geocoder.
pub struct NominatimGeocoder {
    http_client: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

impl Debug for NominatimGeocoder {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("NominatimGeocoder")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl NominatimGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        min_interval: Duration,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for geocoder")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter: RateLimiter::min_interval(min_interval),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[tracing::instrument(skip(self), fields(lat = point.latitude, lon = point.longitude))]
    async fn resolve(&self, point: GeoPoint) -> Result<Option<Address>> {
        self.limiter.acquire().await;

        let url = format!("{}/reverse", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
                ("zoom", "18".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await
            .context("Failed to send reverse geocoding request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Reverse geocoding request failed: {} - {}",
                status,
                error_text
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse reverse geocoding response")?;

        parse_response(body)
    }
}

fn parse_response(body: serde_json::Value) -> Result<Option<Address>> {
    if let Some(error) = body.get("error") {
        tracing::debug!(error = %error, "Geocoder has no answer for point");
        return Ok(None);
    }
    let address: Address =
        serde_json::from_value(body).context("Unexpected reverse geocoding response shape")?;
    if address.display_name.is_empty() {
        return Ok(None);
    }
    Ok(Some(address))
}
