//! SOS alert fan-out over a broadcast channel.
//!
//! [`SosBroadcaster`] wraps a [`tokio::sync::broadcast`] sender and is
//! injected into handlers through application state rather than living
//! as ambient global state. Each trigger validates the location, builds
//! a [`SosAlert`] with a fresh id, serializes it once, and sends the
//! pre-encoded frame to every currently connected subscriber.
//!
//! Delivery is best-effort and at-most-once per connected subscriber:
//! no persistence, no replay, no acknowledgment tracking. Zero
//! subscribers is a normal condition, not an error.

use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::error::SafetyError;
use crate::model::{Coordinate, SosAlert, SosLocation, SosLocationRequest};

/// Capacity of the SOS broadcast channel.
///
/// A subscriber lagging by more than this many alerts receives a
/// `Lagged` error and skips to the newest alert.
const SOS_CHANNEL_CAPACITY: usize = 64;

/// Message used when the trigger carries none.
pub const DEFAULT_SOS_MESSAGE: &str = "Emergency assistance needed";

/// Publishes triggered SOS alerts to all connected subscribers.
///
/// Cheap to clone; clones share the same channel. Concurrent triggers
/// are safe: each `send` is an independent fan-out over the current
/// subscriber set.
#[derive(Clone)]
pub struct SosBroadcaster {
    tx: broadcast::Sender<String>,
}

impl SosBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SOS_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to the `sos-triggered` feed.
    ///
    /// Each received frame is the JSON-encoded [`SosAlert`].
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Number of currently connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Validate the location, build an alert, and fan it out.
    ///
    /// Returns the alert synchronously once the send has been issued; it
    /// does not wait for any subscriber. Nothing is published when
    /// validation fails. A serialization failure surfaces as
    /// [`SafetyError::BroadcastFailure`] so the caller can fall back to
    /// another notification path.
    pub fn trigger(
        &self,
        location: SosLocationRequest,
        message: Option<String>,
    ) -> Result<SosAlert, SafetyError> {
        let lat = location
            .lat
            .ok_or_else(|| SafetyError::InvalidArgument("location.lat is required".to_string()))?;
        let lng = location
            .lng
            .ok_or_else(|| SafetyError::InvalidArgument("location.lng is required".to_string()))?;
        Coordinate { lat, lng }.validate()?;

        let alert = SosAlert {
            alert_id: format!("sos_{}", Uuid::new_v4().simple()),
            location: SosLocation {
                lat,
                lng,
                accuracy: location.accuracy,
            },
            message: message.unwrap_or_else(|| DEFAULT_SOS_MESSAGE.to_string()),
            timestamp: chrono::Utc::now(),
        };

        let frame = serde_json::to_string(&alert)
            .map_err(|e| SafetyError::BroadcastFailure(e.to_string()))?;

        // send only errs when no subscriber is connected, which is fine
        // for a best-effort fan-out.
        let delivered = self.tx.send(frame).unwrap_or(0);

        info!(
            alert_id = %alert.alert_id,
            delivered,
            lat = alert.location.lat,
            lng = alert.location.lng,
            "sos-triggered"
        );

        Ok(alert)
    }
}

impl Default for SosBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn location(lat: Option<f64>, lng: Option<f64>) -> SosLocationRequest {
        SosLocationRequest {
            lat,
            lng,
            accuracy: 10.0,
        }
    }

    #[test]
    fn test_trigger_builds_alert() {
        let broadcaster = SosBroadcaster::new();

        let alert = broadcaster
            .trigger(location(Some(21.1458), Some(79.0882)), Some("Help!".to_string()))
            .unwrap();

        assert!(alert.alert_id.starts_with("sos_"));
        assert_eq!(alert.message, "Help!");
        assert_eq!(alert.location.accuracy, 10.0);
    }

    #[test]
    fn test_trigger_defaults_message() {
        let broadcaster = SosBroadcaster::new();

        let alert = broadcaster
            .trigger(location(Some(21.1458), Some(79.0882)), None)
            .unwrap();

        assert_eq!(alert.message, DEFAULT_SOS_MESSAGE);
    }

    #[test]
    fn test_trigger_missing_lat_publishes_nothing() {
        let broadcaster = SosBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        let err = broadcaster.trigger(location(None, Some(79.0882)), None).unwrap_err();

        assert!(matches!(err, SafetyError::InvalidArgument(_)));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_trigger_out_of_range_coordinate_rejected() {
        let broadcaster = SosBroadcaster::new();

        let err = broadcaster
            .trigger(location(Some(91.0), Some(0.0)), None)
            .unwrap_err();

        assert!(matches!(err, SafetyError::InvalidArgument(_)));
    }

    #[test]
    fn test_subscriber_receives_encoded_alert() {
        let broadcaster = SosBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        let alert = broadcaster
            .trigger(location(Some(21.1458), Some(79.0882)), None)
            .unwrap();

        let frame = rx.try_recv().unwrap();
        let payload: serde_json::Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(payload["alertId"], alert.alert_id.as_str());
        assert_eq!(payload["message"], DEFAULT_SOS_MESSAGE);
        assert_eq!(payload["location"]["lat"], 21.1458);
        // RFC 3339 timestamp.
        assert!(payload["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_alert_ids_are_distinct() {
        let broadcaster = SosBroadcaster::new();

        let first = broadcaster
            .trigger(location(Some(21.0), Some(79.0)), None)
            .unwrap();
        let second = broadcaster
            .trigger(location(Some(21.0), Some(79.0)), None)
            .unwrap();

        assert_ne!(first.alert_id, second.alert_id);
    }

    #[tokio::test]
    async fn test_concurrent_triggers_produce_distinct_ids() {
        let broadcaster = SosBroadcaster::new();

        let a = {
            let b = broadcaster.clone();
            tokio::spawn(async move { b.trigger(location(Some(21.0), Some(79.0)), None) })
        };
        let b = {
            let b = broadcaster.clone();
            tokio::spawn(async move { b.trigger(location(Some(21.0), Some(79.0)), None) })
        };

        let first = a.await.unwrap().unwrap();
        let second = b.await.unwrap().unwrap();

        assert_ne!(first.alert_id, second.alert_id);
    }

    #[test]
    fn test_fanout_reaches_all_subscribers() {
        let broadcaster = SosBroadcaster::new();
        let mut rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();

        assert_eq!(broadcaster.subscriber_count(), 2);

        broadcaster
            .trigger(location(Some(21.0), Some(79.0)), None)
            .unwrap();

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
