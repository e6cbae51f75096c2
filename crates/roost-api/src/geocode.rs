use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use roost_types::models::Coordinates;

/// Free-text address -> coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the service knows no such place.
    async fn geocode(&self, query: &str) -> anyhow::Result<Option<Coordinates>>;
}

/// Nominatim-compatible `/search` endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("roost/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> anyhow::Result<Option<Coordinates>> {
        let endpoint = format!("{}/search", self.base_url.trim_end_matches('/'));
        let url = Url::parse_with_params(&endpoint, &[("q", query), ("format", "json"), ("limit", "1")])?;

        let places: Vec<Place> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(Coordinates {
            latitude: place.lat.parse().context("latitude")?,
            longitude: place.lon.parse().context("longitude")?,
        }))
    }
}

/// Geocode `address, city, country`. Failures are logged and yield `None`;
/// a listing is still stored without coordinates.
pub async fn locate(geocoder: &dyn Geocoder, address: &str, city: &str, country: &str) -> Option<Coordinates> {
    let query = format!("{}, {}, {}", address, city, country);
    match geocoder.geocode(&query).await {
        Ok(Some(coords)) => {
            debug!(%query, lat = coords.latitude, lon = coords.longitude, "geocoded");
            Some(coords)
        }
        Ok(None) => {
            warn!(%query, "geocoder found no match");
            None
        }
        Err(e) => {
            warn!(%query, "geocoding failed: {:#}", e);
            None
        }
    }
}
