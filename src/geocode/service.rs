//! Cached geocode lookups.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::BoundedCache;
use crate::config::{Bounds, GeocodeConfig};
use crate::gateway::{codes, GatewayEnvelope};
use crate::geocode::nominatim::{Candidate, GeocodeError, Geocoder};
use crate::observability::metrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
}

/// Resolves free-text places to coordinates inside the service area.
pub struct GeocodeService {
    geocoder: Arc<dyn Geocoder>,
    cache: Arc<BoundedCache<GeoPoint>>,
    bounds: Bounds,
    locality: String,
    locality_hint: String,
}

impl GeocodeService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        cache: Arc<BoundedCache<GeoPoint>>,
        config: &GeocodeConfig,
    ) -> Self {
        Self {
            geocoder,
            cache,
            bounds: config.bounds,
            locality: config.locality.clone(),
            locality_hint: config.locality_hint.to_lowercase(),
        }
    }

    pub async fn lookup(&self, query: &str) -> GatewayEnvelope<GeoPoint> {
        let query = query.trim();
        if query.is_empty() {
            return GatewayEnvelope::failure(codes::INVALID_PARAMS, "Missing q");
        }

        if let Some(point) = self.cache.get(query) {
            metrics::record_cache_lookup("geocode", true);
            return GatewayEnvelope::success(point);
        }
        metrics::record_cache_lookup("geocode", false);

        let biased = self.bias(query);
        let candidate = match self.geocoder.search(&biased).await {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                return GatewayEnvelope::failure(
                    codes::NOT_FOUND,
                    format!("No match found in {}", self.locality),
                );
            }
            Err(GeocodeError::Status(status)) => {
                tracing::warn!(status, "Geocoder rejected lookup");
                return GatewayEnvelope::failure(
                    codes::GEOCODE_FAILED,
                    format!("Geocoding failed ({})", status),
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Geocoder lookup failed");
                return GatewayEnvelope::failure(codes::GEOCODE_FAILED, "Geocoding unavailable");
            }
        };

        match self.to_point(candidate) {
            Some(point) => {
                self.cache.put(query, point.clone());
                GatewayEnvelope::success(point)
            }
            None => GatewayEnvelope::failure(
                codes::OUT_OF_BOUNDS,
                format!("Result outside {} bounds", self.locality),
            ),
        }
    }

    fn bias(&self, query: &str) -> String {
        if query.to_lowercase().contains(&self.locality_hint) {
            query.to_string()
        } else {
            format!("{}, {}", query, self.locality)
        }
    }

    fn to_point(&self, candidate: Candidate) -> Option<GeoPoint> {
        let lat: f64 = candidate.lat.trim().parse().ok()?;
        let lng: f64 = candidate.lon.trim().parse().ok()?;
        if !lat.is_finite() || !lng.is_finite() || !self.bounds.contains(lat, lng) {
            return None;
        }
        Some(GeoPoint {
            lat,
            lng,
            display_name: candidate.display_name,
        })
    }
}
