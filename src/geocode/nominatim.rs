//! Nominatim search client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::GeocodeConfig;

/// First match returned by the geocoder, coordinates as sent upstream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Candidate {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder returned status {0}")]
    Status(u16),

    #[error("geocoder unreachable: {0}")]
    Transport(String),

    #[error("malformed geocoder response: {0}")]
    Decode(String),

    #[error("invalid geocoder URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for `query`, if any.
    async fn search(&self, query: &str) -> Result<Option<Candidate>, GeocodeError>;
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    search_url: Url,
    email: Option<String>,
    viewbox: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            client,
            search_url: Url::parse(&format!("{}/search", base))?,
            email: config.email.clone().filter(|e| !e.is_empty()),
            viewbox: config.bounds.viewbox(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str) -> Result<Option<Candidate>, GeocodeError> {
        let mut params = vec![
            ("format", "jsonv2"),
            ("limit", "1"),
            ("addressdetails", "0"),
            ("q", query),
            ("viewbox", self.viewbox.as_str()),
            ("bounded", "1"),
        ];
        if let Some(email) = &self.email {
            params.push(("email", email.as_str()));
        }

        let response = self
            .client
            .get(self.search_url.clone())
            .query(&params)
            .send()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let results: Vec<Candidate> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Decode(e.to_string()))?;
        Ok(results.into_iter().next())
    }
}
