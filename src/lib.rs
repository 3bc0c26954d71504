//! Lantern - a location-safety companion core.
//!
//! # Overview
//!
//! Lantern answers three questions for a user at a coordinate:
//!
//! - **Where is help?** The locator queries OpenStreetMap's Overpass API
//!   for nearby police stations, hospitals, pharmacies, and help desks,
//!   ranked by great-circle distance.
//! - **How safe is it here, right now?** The scorer combines
//!   time-of-day risk with nearby-resource availability into a 0-100
//!   score, a status tier, and concrete recommendations.
//! - **Who hears me if I call for help?** The SOS broadcaster fans a
//!   triggered alert out to every connected subscriber, best-effort and
//!   at-most-once.
//!
//! All three are stateless per call: nothing is persisted, every
//! response is recomputed from the request and the upstream query.
//!
//! # Modules
//!
//! - [`model`]: Coordinates, ranked resources, score factors, alerts
//! - [`error`]: Domain errors and their HTTP mapping
//! - [`locator`]: Overpass client and proximity ranking
//! - [`scoring`]: Safety score computation
//! - [`sos`]: SOS alert broadcast channel
//! - [`ws`]: WebSocket feed for SOS alerts
//! - [`api`]: HTTP API handlers and router

pub mod api;
pub mod error;
pub mod locator;
pub mod model;
pub mod scoring;
pub mod sos;
pub mod ws;
