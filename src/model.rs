//! Data models for Lantern.
//!
//! Everything here is a plain value type: coordinates, ranked help
//! resources, score factors, and the assembled safety assessment.
//! Nothing in this module is persisted; all of it is recomputed per
//! request from the caller's input and the upstream resource query.
//!
//! Wire names follow the shape the original client already speaks
//! (camelCase, human-readable status strings), so response types carry
//! explicit serde renames.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SafetyError;

/// Mean Earth radius in kilometers, used by the haversine formula.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
///
/// Immutable value type; handlers validate it once at the boundary and
/// then pass it around by copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, `[-90, 90]`.
    pub lat: f64,

    /// Longitude in degrees, `[-180, 180]`.
    pub lng: f64,
}

impl Coordinate {
    /// Check that both components are finite and within range.
    ///
    /// Returns [`SafetyError::InvalidArgument`] otherwise, which the web
    /// layer surfaces as a 400.
    pub fn validate(&self) -> Result<(), SafetyError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(SafetyError::InvalidArgument(format!(
                "latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(SafetyError::InvalidArgument(format!(
                "longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }

    /// Great-circle distance to `other` in kilometers (haversine).
    pub fn distance_km(&self, other: Coordinate) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos()
                * other.lat.to_radians().cos()
                * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

/// The categories of help resource the locator can search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Police,
    Hospital,
    Pharmacy,
    WomenHelp,
    All,
}

impl ResourceKind {
    /// Parse a query-string value. Unknown or absent values fall back to
    /// [`ResourceKind::Police`], the most broadly useful resource.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("hospital") => ResourceKind::Hospital,
            Some("pharmacy") => ResourceKind::Pharmacy,
            Some("women-help") => ResourceKind::WomenHelp,
            Some("all") => ResourceKind::All,
            _ => ResourceKind::Police,
        }
    }

    /// The Overpass tag filter this kind maps to.
    ///
    /// `WomenHelp` currently reuses the police filter: OpenStreetMap has
    /// no reliable dedicated tag for women's help desks, so police
    /// stations stand in until a dedicated data source is wired up.
    pub fn tag_filter(self) -> &'static str {
        match self {
            ResourceKind::Police | ResourceKind::WomenHelp => "amenity=police",
            ResourceKind::Hospital => "amenity=hospital|amenity=clinic",
            ResourceKind::Pharmacy => "amenity=pharmacy",
            ResourceKind::All => {
                "amenity=police|amenity=hospital|amenity=clinic|amenity=pharmacy"
            }
        }
    }

    /// Display name used when a point of interest carries no `name` tag.
    pub fn fallback_name(self) -> &'static str {
        match self {
            ResourceKind::Police => "Police Station",
            ResourceKind::Hospital => "Hospital",
            ResourceKind::Pharmacy => "Pharmacy",
            ResourceKind::WomenHelp => "Women Help Desk",
            ResourceKind::All => "Safety Resource",
        }
    }
}

/// A raw point-of-interest candidate as returned by the Overpass API.
///
/// Ephemeral: produced fresh per request, never cached. Elements without
/// coordinates are dropped before ranking.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoiElement {
    /// OSM element id.
    #[serde(default)]
    pub id: u64,

    /// Latitude, absent for some element types.
    pub lat: Option<f64>,

    /// Longitude (OSM calls it `lon`).
    pub lon: Option<f64>,

    /// Free-form OSM tags (`name`, `phone`, `addr:street`, ...).
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// A help resource ranked by proximity to the query origin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResource {
    /// OSM element id.
    pub id: u64,

    /// Resource name, or a kind-specific fallback when untagged.
    pub name: String,

    pub lat: f64,
    pub lng: f64,

    /// Street address if tagged, otherwise empty.
    pub address: String,

    /// Great-circle distance from the origin in km, one decimal.
    pub distance: f64,

    /// Contact phone number if tagged, otherwise empty.
    pub phone: String,

    /// Opening hours if tagged, otherwise empty.
    pub opening_hours: String,
}

/// How strongly a score factor weighs on the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Low,
    Medium,
    High,
    Critical,
}

/// One additive adjustment applied while scoring a location.
///
/// Factors accumulate in evaluation order (time-of-day first, then
/// resource availability) and that order is preserved for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreFactor {
    /// Short human-readable label, e.g. "Late Night".
    pub factor: &'static str,

    /// Signed score adjustment.
    pub impact: i32,

    pub severity: Severity,
}

/// Status tier a safety score classifies into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SafetyStatus {
    Safe,
    Caution,
    #[serde(rename = "Moderate Risk")]
    ModerateRisk,
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl SafetyStatus {
    /// Classify a clamped `[0, 100]` score. First match wins:
    /// `< 40` high risk, `< 60` moderate risk, `< 80` caution,
    /// otherwise safe.
    pub fn from_score(score: i32) -> Self {
        if score < 40 {
            SafetyStatus::HighRisk
        } else if score < 60 {
            SafetyStatus::ModerateRisk
        } else if score < 80 {
            SafetyStatus::Caution
        } else {
            SafetyStatus::Safe
        }
    }
}

/// Counts of nearby help resources consumed by the scorer.
///
/// `Default` (all zero) doubles as the conservative degraded value when
/// the upstream resource query is unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCounts {
    pub police_count: usize,
    pub hospital_count: usize,
}

/// The scored, classified, and annotated output of the safety scorer.
///
/// Derived per call; never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAssessment {
    /// Safety score in `[0, 100]`, higher is safer.
    pub score: i32,

    pub status: SafetyStatus,

    /// Adjustments applied, in evaluation order.
    pub factors: Vec<ScoreFactor>,

    /// Ranked advice lines for the user.
    pub recommendations: Vec<&'static str>,

    /// The resource counts the score was based on.
    pub nearby_resources: ResourceCounts,
}

/// An SOS location: a coordinate plus the reported GPS accuracy in meters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SosLocation {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: f64,
}

/// A single triggered SOS alert, broadcast once to all connected
/// subscribers and not retained afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SosAlert {
    /// Unique id for this trigger, e.g. `sos_3f2a...`.
    pub alert_id: String,

    pub location: SosLocation,

    /// Caller-supplied message, or the default emergency text.
    pub message: String,

    /// When the alert was triggered (server-side, RFC 3339 on the wire).
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Request types
// ============================================================================

/// Query parameters for `GET /api/safety/nearby`.
///
/// `lat`/`lng` are optional here so their absence maps to a structured
/// 400 rather than a bare extractor rejection.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    /// Resource kind filter; unknown values fall back to `police`.
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Search radius in meters (default: 5000).
    #[serde(default = "default_radius_m")]
    pub radius: u32,
}

fn default_radius_m() -> u32 {
    5000
}

/// Query parameters for `GET /api/safety/score`.
#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Request body for `POST /api/sos/send`.
#[derive(Debug, Deserialize)]
pub struct SosRequest {
    pub location: Option<SosLocationRequest>,

    /// Optional message to broadcast with the alert.
    pub message: Option<String>,
}

/// The location object inside an SOS request. Components are optional so
/// a missing one fails validation instead of deserialization.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SosLocationRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    /// Reported GPS accuracy in meters (default: 0, i.e. unknown).
    #[serde(default)]
    pub accuracy: f64,
}
