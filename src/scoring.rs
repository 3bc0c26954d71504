//! Safety scoring for a coordinate at a point in time.
//!
//! The score starts at 100 and takes strictly additive penalties: a
//! time-of-day band (late night, early morning) followed by resource
//! availability (police and hospital counts from the locator). The
//! result is clamped to `[0, 100]`, classified into a status tier, and
//! annotated with ordered recommendations.
//!
//! [`compute_score`] is a pure function of the timestamp and the counts,
//! so it is deterministic and directly testable. [`assess`] wraps it
//! with the live resource lookup and degrades to zero counts when the
//! upstream is unavailable: a conservative score is safer than no score.

use chrono::{DateTime, TimeZone, Timelike};
use tracing::warn;

use crate::error::SafetyError;
use crate::locator::OverpassClient;
use crate::model::{
    Coordinate, ResourceCounts, SafetyAssessment, SafetyStatus, ScoreFactor, Severity,
};

/// Compute a safety assessment from a timestamp and resource counts.
///
/// The hour is taken in the timezone of `now`; callers pass local time
/// so the late-night band matches the user's clock.
pub fn compute_score<Tz: TimeZone>(now: DateTime<Tz>, counts: ResourceCounts) -> SafetyAssessment {
    let mut score = 100;
    let mut factors = Vec::new();

    // Time-of-day band. Hours 8-21 incur no penalty.
    let hour = now.hour();
    if hour >= 22 || hour < 5 {
        score -= 30;
        factors.push(ScoreFactor {
            factor: "Late Night",
            impact: -30,
            severity: Severity::High,
        });
    } else if (5..8).contains(&hour) {
        score -= 15;
        factors.push(ScoreFactor {
            factor: "Early Morning",
            impact: -15,
            severity: Severity::Medium,
        });
    }

    // Resource availability, appended after the time factors.
    if counts.police_count == 0 {
        score -= 20;
        factors.push(ScoreFactor {
            factor: "No Police Nearby",
            impact: -20,
            severity: Severity::High,
        });
    } else if counts.police_count < 2 {
        score -= 10;
        factors.push(ScoreFactor {
            factor: "Limited Police Coverage",
            impact: -10,
            severity: Severity::Medium,
        });
    }

    if counts.hospital_count == 0 {
        score -= 15;
        factors.push(ScoreFactor {
            factor: "No Hospital Nearby",
            impact: -15,
            severity: Severity::Medium,
        });
    }

    let score = score.clamp(0, 100);
    let status = SafetyStatus::from_score(score);
    let recommendations = generate_recommendations(score, &factors);

    SafetyAssessment {
        score,
        status,
        factors,
        recommendations,
        nearby_resources: counts,
    }
}

/// Assess safety at `origin`, using the locator for live resource counts.
///
/// An unavailable upstream does not fail the assessment; the scorer
/// falls back to zero counts and lets the caller retry later. Invalid
/// coordinates still fail with [`SafetyError::InvalidArgument`].
pub async fn assess<Tz: TimeZone>(
    locator: &OverpassClient,
    origin: Coordinate,
    now: DateTime<Tz>,
) -> Result<SafetyAssessment, SafetyError> {
    origin.validate()?;

    let counts = match locator.count_nearby(origin).await {
        Ok(counts) => counts,
        Err(SafetyError::UpstreamUnavailable(reason)) => {
            warn!(%reason, "resource lookup unavailable, scoring with zero counts");
            ResourceCounts::default()
        }
        Err(e) => return Err(e),
    };

    Ok(compute_score(now, counts))
}

/// Build the recommendation list in its fixed display order.
fn generate_recommendations(score: i32, factors: &[ScoreFactor]) -> Vec<&'static str> {
    let mut recommendations = Vec::new();

    if score < 60 {
        recommendations.push("Consider using the journey tracker");
        recommendations.push("Share your live location with trusted contacts");
    }

    if factors.iter().any(|f| f.factor.contains("Police")) {
        recommendations.push("Keep emergency numbers handy");
    }

    if factors.iter().any(|f| f.factor.contains("Late Night")) {
        recommendations.push("Avoid isolated areas");
        recommendations.push("Use well-lit, busy routes");
        recommendations.push("Consider using taxi/rideshare instead of walking");
    }

    recommendations.push("Trust your instincts - if something feels wrong, leave");
    recommendations
}
