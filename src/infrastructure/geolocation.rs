use crate::application::Geolocator;
use crate::domain::{Coords, DomainError, DomainResult};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

/// A position given up front, e.g. on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coords);

impl Geolocator for FixedPosition {
    fn current_position(&self) -> DomainResult<Coords> {
        Ok(self.0)
    }
}

pub const DEFAULT_GEO_URL: &str = "http://ip-api.com/json/";

/// Looks the position up from the public IP address.
///
/// Each attempt is bounded by `timeout`; a failed attempt is retried up to
/// `retries` more times before giving up.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    timeout: Duration,
    retries: u32,
}

impl IpGeolocator {
    pub fn new(url: impl Into<String>, timeout: Duration, retries: u32) -> Self {
        Self {
            url: url.into(),
            timeout,
            retries,
        }
    }

    fn attempt(&self, client: &Client) -> Result<Coords, String> {
        let response = client
            .get(&self.url)
            .send()
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("lookup returned {}", response.status()));
        }
        let body = response.text().map_err(|e| e.to_string())?;
        parse_position(&body)
    }
}

impl Geolocator for IpGeolocator {
    fn current_position(&self) -> DomainResult<Coords> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| DomainError::GeolocationUnavailable(e.to_string()))?;

        let mut last_error = String::from("no attempt made");
        for attempt in 0..=self.retries {
            match self.attempt(&client) {
                Ok(coords) => {
                    tracing::info!(%coords, attempt, "position found");
                    return Ok(coords);
                }
                Err(e) => {
                    tracing::warn!(url = %self.url, attempt, err = %e, "position lookup failed");
                    last_error = e;
                }
            }
        }
        Err(DomainError::GeolocationUnavailable(last_error))
    }
}

/// Reply of an IP lookup service. ip-api.com answers with `lat`/`lon`
/// and a `status`; other services use `latitude`/`longitude`.
#[derive(Debug, Deserialize)]
struct LookupReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "latitude")]
    lat: Option<f64>,
    #[serde(default, alias = "longitude")]
    lon: Option<f64>,
}

fn parse_position(body: &str) -> Result<Coords, String> {
    let reply: LookupReply = serde_json::from_str(body).map_err(|e| e.to_string())?;

    if reply.status.as_deref() == Some("fail") {
        return Err(reply.message.unwrap_or_else(|| "lookup refused".to_string()));
    }

    match (reply.lat, reply.lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Ok(Coords::new(lat, lon)),
        _ => Err("response has no coordinates".to_string()),
    }
}
