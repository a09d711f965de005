use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Availability, AvailabilityObservation, Catalog},
};

use super::{window_start, AnalysisContext};

/// Aggregates crowd-sourced observations of one title into per-platform confidence
///
/// Only observations made within `staleness_window_days` before `as_of`
/// (and not after it) take part; older ones are dropped outright rather than
/// down-weighted. Each remaining report is weighted by a linear freshness
/// decay floored at 0.1, and each platform's confidence is the weighted mean
/// of its reports. A window of zero days admits nothing.
///
/// Observations belonging to other titles are ignored.
pub fn aggregate_availability(
    title_id: Uuid,
    observations: &[AvailabilityObservation],
    as_of: DateTime<Utc>,
    staleness_window_days: i64,
) -> AppResult<Availability> {
    let earliest = window_start(as_of, staleness_window_days)?;

    for observation in observations {
        observation.validate()?;
    }

    if staleness_window_days == 0 {
        return Ok(Availability::empty(title_id, as_of));
    }

    let in_window: Vec<&AvailabilityObservation> = observations
        .iter()
        .filter(|o| o.title_id == title_id)
        .filter(|o| o.observed_at >= earliest && o.observed_at <= as_of)
        .collect();

    if in_window.is_empty() {
        return Ok(Availability::empty(title_id, as_of));
    }

    // (weighted confidence sum, weight sum) per platform
    let mut sums: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for observation in &in_window {
        let weight = observation.freshness_weight(as_of, staleness_window_days);
        let entry = sums.entry(observation.platform.clone()).or_insert((0.0, 0.0));
        entry.0 += observation.confidence * weight;
        entry.1 += weight;
    }

    let platform_confidence: BTreeMap<String, f64> = sums
        .into_iter()
        .map(|(platform, (weighted, total))| (platform, (weighted / total).clamp(0.0, 1.0)))
        .collect();

    let confidence = platform_confidence.values().copied().reduce(f64::max);
    let last_verified_at = in_window.iter().map(|o| o.observed_at).max();

    tracing::debug!(
        title_id = %title_id,
        observation_count = in_window.len(),
        platform_count = platform_confidence.len(),
        confidence = ?confidence,
        "Aggregated availability"
    );

    Ok(Availability {
        title_id,
        platform_confidence,
        confidence,
        last_verified_at,
        observation_count: in_window.len(),
        as_of,
    })
}

/// Availability of a catalog title under the given context
pub fn availability_in_catalog(
    catalog: &Catalog,
    title_id: Uuid,
    context: &AnalysisContext,
) -> AppResult<Availability> {
    aggregate_availability(
        title_id,
        catalog.observations_for(&title_id),
        context.as_of,
        context.staleness_window_days,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use chrono::Duration;

    fn observe(
        title_id: Uuid,
        platform: &str,
        confidence: f64,
        age: Duration,
        as_of: DateTime<Utc>,
    ) -> AvailabilityObservation {
        AvailabilityObservation {
            title_id,
            platform: platform.to_string(),
            observer_id: Uuid::new_v4(),
            confidence,
            observed_at: as_of - age,
        }
    }

    #[test]
    fn test_empty_observations_is_cold_start() {
        let title_id = Uuid::new_v4();
        let availability = aggregate_availability(title_id, &[], Utc::now(), 30).unwrap();
        assert!(availability.is_empty());
        assert_eq!(availability.confidence, None);
        assert_eq!(availability.observation_count, 0);
        assert_eq!(availability.confidence_for("Netflix"), 0.0);
    }

    #[test]
    fn test_single_observation_mean_is_its_confidence() {
        let now = Utc::now();
        let title_id = Uuid::new_v4();
        let obs = observe(title_id, "Netflix", 0.9, Duration::days(10), now);

        let availability = aggregate_availability(title_id, &[obs.clone()], now, 30).unwrap();
        assert!((availability.confidence_for("Netflix") - 0.9).abs() < 1e-9);
        assert!((obs.decayed_confidence(now, 30) - 0.6).abs() < 1e-9);
        assert_eq!(availability.last_verified_at, Some(obs.observed_at));
    }

    #[test]
    fn test_fresher_reports_weigh_more() {
        let now = Utc::now();
        let title_id = Uuid::new_v4();
        let observations = vec![
            observe(title_id, "Netflix", 1.0, Duration::zero(), now),
            observe(title_id, "Netflix", 0.0, Duration::days(15), now),
        ];

        let availability = aggregate_availability(title_id, &observations, now, 30).unwrap();
        // weights 1.0 and 0.5
        let expected = 1.0 / 1.5;
        assert!((availability.confidence_for("Netflix") - expected).abs() < 1e-9);
    }

    #[test]
    fn test_stale_reports_are_dropped_not_downweighted() {
        let now = Utc::now();
        let title_id = Uuid::new_v4();
        let observations = vec![
            observe(title_id, "Hulu", 0.9, Duration::days(31), now),
            observe(title_id, "Netflix", 0.2, Duration::days(29), now),
        ];

        let availability = aggregate_availability(title_id, &observations, now, 30).unwrap();
        assert_eq!(availability.observation_count, 1);
        assert!(!availability.platform_confidence.contains_key("Hulu"));
        assert!((availability.confidence_for("Netflix") - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_future_reports_are_ignored() {
        let now = Utc::now();
        let title_id = Uuid::new_v4();
        let mut obs = observe(title_id, "Netflix", 0.9, Duration::zero(), now);
        obs.observed_at = now + Duration::days(2);

        let availability = aggregate_availability(title_id, &[obs], now, 30).unwrap();
        assert!(availability.is_empty());
    }

    #[test]
    fn test_zero_window_yields_nothing() {
        let now = Utc::now();
        let title_id = Uuid::new_v4();
        let obs = observe(title_id, "Netflix", 0.9, Duration::zero(), now);

        let availability = aggregate_availability(title_id, &[obs], now, 0).unwrap();
        assert!(availability.platform_confidence.is_empty());
    }

    #[test]
    fn test_overall_confidence_is_platform_max() {
        let now = Utc::now();
        let title_id = Uuid::new_v4();
        let observations = vec![
            observe(title_id, "Netflix", 0.7, Duration::days(1), now),
            observe(title_id, "Hulu", 0.25, Duration::days(1), now),
            observe(Uuid::new_v4(), "Max", 1.0, Duration::days(1), now),
        ];

        let availability = aggregate_availability(title_id, &observations, now, 30).unwrap();
        assert_eq!(availability.confidence, Some(0.7));
        assert_eq!(availability.platforms(), vec!["Netflix"]);
        assert!((availability.confidence_for("Hulu") - 0.25).abs() < 1e-9);
        assert!(!availability.platform_confidence.contains_key("Max"));
    }

    #[test]
    fn test_invalid_confidence_is_rejected() {
        let now = Utc::now();
        let title_id = Uuid::new_v4();
        let obs = observe(title_id, "Netflix", 1.5, Duration::days(1), now);

        let result = aggregate_availability(title_id, &[obs], now, 30);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_negative_window_is_rejected() {
        let result = aggregate_availability(Uuid::new_v4(), &[], Utc::now(), -5);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_window_beyond_date_range_is_rejected() {
        let now = Utc::now();
        let title_id = Uuid::new_v4();
        let obs = observe(title_id, "Netflix", 0.9, Duration::days(1), now);

        let result = aggregate_availability(title_id, &[obs], now, i64::MAX);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = aggregate_availability(title_id, &[], now, 200_000_000);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
