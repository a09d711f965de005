use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::ObservationSource;

/// Minimum aggregated confidence for a platform to be reported as likely
pub const CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Aggregated, staleness-aware availability estimate for one title
///
/// This is never a statement of fact. It only carries confidence values
/// in [0, 1] derived from crowd-sourced reports.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Availability {
    pub title_id: Uuid,
    /// Every platform with at least one in-window report, keyed by name
    pub platform_confidence: BTreeMap<String, f64>,
    /// Highest platform confidence, absent when no platform has reports
    pub confidence: Option<f64>,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub observation_count: usize,
    pub as_of: DateTime<Utc>,
}

impl Availability {
    /// The cold-start shape: nothing reported within the window
    pub fn empty(title_id: Uuid, as_of: DateTime<Utc>) -> Self {
        Self {
            title_id,
            platform_confidence: BTreeMap::new(),
            confidence: None,
            last_verified_at: None,
            observation_count: 0,
            as_of,
        }
    }

    /// Platforms whose confidence clears the threshold, in name order
    pub fn platforms(&self) -> Vec<&str> {
        self.platform_confidence
            .iter()
            .filter(|(_, confidence)| **confidence >= CONFIDENCE_THRESHOLD)
            .map(|(platform, _)| platform.as_str())
            .collect()
    }

    /// Whether `platform` is in the thresholded view
    pub fn likely_on(&self, platform: &str) -> bool {
        self.platform_confidence
            .get(platform)
            .is_some_and(|confidence| *confidence >= CONFIDENCE_THRESHOLD)
    }

    /// Confidence for a single platform, 0.0 when nobody reported it
    pub fn confidence_for(&self, platform: &str) -> f64 {
        self.platform_confidence.get(platform).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.platform_confidence.is_empty()
    }

    pub fn source(&self) -> ObservationSource {
        ObservationSource::CrowdSourced
    }

    pub fn is_authoritative(&self) -> bool {
        false
    }

    /// Hedged, human-readable summary
    pub fn description(&self) -> String {
        let platforms = self.platforms();
        if platforms.is_empty() {
            "Availability uncertain - no recent observations".to_string()
        } else {
            format!("Likely available on {}", platforms.join(", "))
        }
    }
}
