//! Lantern - a location-safety companion core.
//!
//! # API Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/safety/nearby` - Find nearby help resources
//! - `GET /api/safety/score` - Safety assessment for a coordinate
//! - `POST /api/sos/send` - Trigger an SOS broadcast
//! - `GET /ws/alerts` - WebSocket feed of triggered SOS alerts

use std::env;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lantern::api::{self, AppState};
use lantern::locator::OverpassClient;
use lantern::sos::SosBroadcaster;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 5000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("lantern=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env::var("LANTERN_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let locator = match env::var("LANTERN_OVERPASS_URL") {
        Ok(url) => {
            info!(%url, "Using custom Overpass endpoint");
            OverpassClient::with_base_url(&url)
        }
        Err(_) => OverpassClient::new(),
    };

    let state = AppState {
        locator,
        sos: SosBroadcaster::new(),
    };

    // The map client is served from another origin, so CORS stays open.
    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Lantern is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
