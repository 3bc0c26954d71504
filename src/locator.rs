//! Geo-resource locator backed by the OpenStreetMap Overpass API.
//!
//! Given an origin coordinate and a resource kind, the locator queries
//! Overpass for matching points of interest, computes great-circle
//! distance to each candidate, filters by radius, and returns the ten
//! closest. No caching and no retries: a failed upstream query
//! propagates as [`SafetyError::UpstreamUnavailable`] and the caller
//! decides whether to retry or degrade.
//!
//! # API Reference
//!
//! See: <https://wiki.openstreetmap.org/wiki/Overpass_API>

use std::cmp::Ordering;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::SafetyError;
use crate::model::{Coordinate, PoiElement, RankedResource, ResourceCounts, ResourceKind};

/// Default Overpass interpreter endpoint.
const OVERPASS_API_BASE: &str = "https://overpass-api.de/api/interpreter";

/// Bound on the upstream query, mirrored in the Overpass QL `[timeout:]`
/// setting. A query that exceeds it surfaces as `UpstreamUnavailable`.
const UPSTREAM_TIMEOUT_SECS: u64 = 25;

/// Default search radius in meters.
pub const DEFAULT_RADIUS_M: u32 = 5000;

/// Upper bound on results returned to callers.
const MAX_RESULTS: usize = 10;

/// Raw Overpass response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<PoiElement>,
}

/// Client for querying the Overpass point-of-interest API.
#[derive(Clone)]
pub struct OverpassClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for OverpassClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OverpassClient {
    /// Create a client pointing at the public Overpass endpoint.
    pub fn new() -> Self {
        Self::with_base_url(OVERPASS_API_BASE)
    }

    /// Create a client with a custom base URL (for testing, or for a
    /// self-hosted Overpass mirror).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Fetch raw points of interest matching an Overpass tag filter.
    ///
    /// The query body is URL-encoded Overpass QL; the response is JSON
    /// with an `elements` array. Network and decoding failures both map
    /// to [`SafetyError::UpstreamUnavailable`].
    pub async fn query_points_of_interest(
        &self,
        tag_filter: &str,
    ) -> Result<Vec<PoiElement>, SafetyError> {
        let query = format!("[out:json][timeout:{UPSTREAM_TIMEOUT_SECS}];({tag_filter};);out body;");
        let url = format!("{}?data={}", self.base_url, urlencoding::encode(&query));

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| SafetyError::UpstreamUnavailable(e.to_string()))?;

        let data = response
            .json::<OverpassResponse>()
            .await
            .map_err(|e| SafetyError::UpstreamUnavailable(e.to_string()))?;

        debug!(tag_filter, candidates = data.elements.len(), "Overpass query completed");
        Ok(data.elements)
    }

    /// Find help resources of `kind` within `radius_m` meters of
    /// `origin`, closest first, at most ten.
    ///
    /// An empty list is a valid, non-error outcome.
    pub async fn find_nearby(
        &self,
        origin: Coordinate,
        kind: ResourceKind,
        radius_m: u32,
    ) -> Result<Vec<RankedResource>, SafetyError> {
        origin.validate()?;

        let elements = self.query_points_of_interest(kind.tag_filter()).await?;
        Ok(rank_candidates(origin, kind, elements, radius_m))
    }

    /// Count police stations and hospitals within the default radius of
    /// `origin`. The two lookups run concurrently; either failure
    /// propagates.
    pub async fn count_nearby(&self, origin: Coordinate) -> Result<ResourceCounts, SafetyError> {
        let (police, hospitals) = tokio::try_join!(
            self.find_nearby(origin, ResourceKind::Police, DEFAULT_RADIUS_M),
            self.find_nearby(origin, ResourceKind::Hospital, DEFAULT_RADIUS_M),
        )?;

        Ok(ResourceCounts {
            police_count: police.len(),
            hospital_count: hospitals.len(),
        })
    }
}

/// Rank raw candidates by proximity to `origin`.
///
/// Candidates without coordinates are dropped (they cannot be ranked),
/// distances are rounded to one decimal, anything beyond the radius is
/// filtered out, and the sort is stable so equidistant candidates keep
/// their upstream order.
pub fn rank_candidates(
    origin: Coordinate,
    kind: ResourceKind,
    elements: Vec<PoiElement>,
    radius_m: u32,
) -> Vec<RankedResource> {
    let max_km = f64::from(radius_m) / 1000.0;

    let mut ranked: Vec<RankedResource> = elements
        .into_iter()
        .filter_map(|el| {
            let lat = el.lat?;
            let lng = el.lon?;

            let distance = origin.distance_km(Coordinate { lat, lng });

            Some(RankedResource {
                id: el.id,
                name: el
                    .tags
                    .get("name")
                    .cloned()
                    .unwrap_or_else(|| kind.fallback_name().to_string()),
                lat,
                lng,
                address: el
                    .tags
                    .get("addr:street")
                    .or_else(|| el.tags.get("address"))
                    .cloned()
                    .unwrap_or_default(),
                distance: (distance * 10.0).round() / 10.0,
                phone: el.tags.get("phone").cloned().unwrap_or_default(),
                opening_hours: el.tags.get("opening_hours").cloned().unwrap_or_default(),
            })
        })
        .filter(|place| place.distance <= max_km)
        .collect();

    ranked.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
    ranked.truncate(MAX_RESULTS);
    ranked
}
