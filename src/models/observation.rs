use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ensure_unit_interval, AppResult};

use super::Title;

/// Where availability data comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObservationSource {
    CrowdSourced,
}

/// A member's report that a title was seen on a platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityObservation {
    pub title_id: Uuid,
    pub platform: String,
    pub observer_id: Uuid,
    /// How sure the observer was, in [0, 1]
    pub confidence: f64,
    pub observed_at: DateTime<Utc>,
}

impl AvailabilityObservation {
    pub fn validate(&self) -> AppResult<()> {
        ensure_unit_interval("confidence", self.confidence)
    }

    /// Observations are always self-reported
    pub fn source(&self) -> ObservationSource {
        ObservationSource::CrowdSourced
    }

    pub fn is_authoritative(&self) -> bool {
        false
    }

    /// Fractional days between the observation and `as_of`
    pub fn age_days(&self, as_of: DateTime<Utc>) -> f64 {
        (as_of - self.observed_at).num_seconds() as f64 / 86_400.0
    }

    /// Linear decay over the window, floored at 0.1
    pub fn freshness_weight(&self, as_of: DateTime<Utc>, staleness_window_days: i64) -> f64 {
        let window = staleness_window_days as f64;
        (1.0 - self.age_days(as_of) / window).max(0.1)
    }

    /// The observer's confidence scaled by how fresh the report is
    pub fn decayed_confidence(&self, as_of: DateTime<Utc>, staleness_window_days: i64) -> f64 {
        self.confidence * self.freshness_weight(as_of, staleness_window_days)
    }
}

/// The full title list together with every observation, grouped by title
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    titles: Vec<Title>,
    observations: HashMap<Uuid, Vec<AvailabilityObservation>>,
}

impl Catalog {
    pub fn new(titles: Vec<Title>, observations: Vec<AvailabilityObservation>) -> Self {
        let mut grouped: HashMap<Uuid, Vec<AvailabilityObservation>> = HashMap::new();
        for observation in observations {
            grouped
                .entry(observation.title_id)
                .or_default()
                .push(observation);
        }

        Self {
            titles,
            observations: grouped,
        }
    }

    /// Titles in catalog order
    pub fn titles(&self) -> &[Title] {
        &self.titles
    }

    pub fn title(&self, title_id: &Uuid) -> Option<&Title> {
        self.titles.iter().find(|t| t.id == *title_id)
    }

    pub fn observations_for(&self, title_id: &Uuid) -> &[AvailabilityObservation] {
        self.observations
            .get(title_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Checks every observation before any scoring runs
    pub fn validate(&self) -> AppResult<()> {
        for observation in self.observations.values().flatten() {
            observation.validate()?;
        }
        Ok(())
    }
}
