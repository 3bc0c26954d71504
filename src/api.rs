//! HTTP API handlers for Lantern.
//!
//! Handlers are thin: validate the coordinate, call into the locator,
//! scorer, or broadcaster, and wrap the result in the `{success, data}`
//! envelope the client expects. Domain errors convert to HTTP responses
//! through [`SafetyError`]'s `IntoResponse` impl.

use axum::extract::{Json, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::SafetyError;
use crate::locator::OverpassClient;
use crate::model::{
    Coordinate, NearbyQuery, RankedResource, ResourceKind, SafetyAssessment, ScoreQuery,
    SosRequest,
};
use crate::scoring;
use crate::sos::SosBroadcaster;
use crate::ws::ws_alerts;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub locator: OverpassClient,
    pub sos: SosBroadcaster,
}

/// Standard response envelope: `{success, data}`, plus `count` where the
/// data is a list.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
        }
    }

    fn with_count(data: T, count: usize) -> Self {
        Self {
            success: true,
            data,
            count: Some(count),
        }
    }
}

/// Acknowledgment body for a triggered SOS.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SosAck {
    pub alert_id: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    message: &'static str,
}

/// Build the application router. `main` layers tracing and CORS on top;
/// tests mount this directly.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/safety/nearby", get(get_nearby))
        .route("/api/safety/score", get(get_score))
        .route("/api/sos/send", post(post_sos))
        .route("/ws/alerts", get(ws_alerts))
        .with_state(state)
}

/// Resolve a `lat`/`lng` query pair into a validated [`Coordinate`].
fn require_origin(lat: Option<f64>, lng: Option<f64>) -> Result<Coordinate, SafetyError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            let origin = Coordinate { lat, lng };
            origin.validate()?;
            Ok(origin)
        }
        _ => Err(SafetyError::InvalidArgument(
            "latitude and longitude are required".to_string(),
        )),
    }
}

/// GET /api/safety/nearby - Find help resources near a coordinate.
///
/// # Query Parameters
///
/// - `lat`, `lng` (required): origin coordinate
/// - `type` (optional): police | hospital | pharmacy | women-help | all
/// - `radius` (optional): search radius in meters (default: 5000)
///
/// # Response
///
/// `{success, data: [RankedResource], count}`, closest first, at most
/// ten entries. An empty list is a valid result.
#[instrument(skip(state))]
pub async fn get_nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<ApiResponse<Vec<RankedResource>>>, SafetyError> {
    let origin = require_origin(query.lat, query.lng)?;
    let kind = ResourceKind::parse(query.kind.as_deref());

    let places = state
        .locator
        .find_nearby(origin, kind, query.radius)
        .await
        .map_err(|e| {
            warn!(error = %e, ?kind, "Nearby resource lookup failed");
            e
        })?;

    info!(?kind, radius = query.radius, count = places.len(), "Nearby resources queried");

    let count = places.len();
    Ok(Json(ApiResponse::with_count(places, count)))
}

/// GET /api/safety/score - Assess safety at a coordinate right now.
///
/// # Query Parameters
///
/// - `lat`, `lng` (required): origin coordinate
///
/// # Response
///
/// `{success, data: SafetyAssessment}`. The assessment degrades to
/// zero resource counts when the upstream source is unreachable, so
/// this endpoint stays available while the locator is down.
#[instrument(skip(state))]
pub async fn get_score(
    State(state): State<AppState>,
    Query(query): Query<ScoreQuery>,
) -> Result<Json<ApiResponse<SafetyAssessment>>, SafetyError> {
    let origin = require_origin(query.lat, query.lng)?;

    let assessment = scoring::assess(&state.locator, origin, Local::now()).await?;

    info!(
        score = assessment.score,
        status = ?assessment.status,
        "Safety score computed"
    );

    Ok(Json(ApiResponse::new(assessment)))
}

/// POST /api/sos/send - Trigger an SOS broadcast.
///
/// # Request Body
///
/// ```json
/// {
///     "location": { "lat": 21.1458, "lng": 79.0882, "accuracy": 10.0 },
///     "message": "EMERGENCY SOS activated! I need help immediately."
/// }
/// ```
///
/// `message` is optional. The alert fans out to every connected
/// `/ws/alerts` subscriber; the response does not wait for delivery.
#[instrument(skip(state, request))]
pub async fn post_sos(
    State(state): State<AppState>,
    Json(request): Json<SosRequest>,
) -> Result<Json<ApiResponse<SosAck>>, SafetyError> {
    let location = request
        .location
        .ok_or_else(|| SafetyError::InvalidArgument("location is required".to_string()))?;

    let alert = state.sos.trigger(location, request.message).map_err(|e| {
        warn!(error = %e, "SOS trigger failed");
        e
    })?;

    Ok(Json(ApiResponse::new(SosAck {
        alert_id: alert.alert_id,
    })))
}

/// GET /api/health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        message: "Lantern server is running",
    })
}
