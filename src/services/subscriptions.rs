use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Assessment, Availability, Catalog, Guidance, Household, SubscriptionRecommendation},
};

use super::{availability::availability_in_catalog, AnalysisContext};

/// Assesses every active subscription of a household against its viewing history
///
/// A watch counts toward a platform when the watched title is likely
/// available there. Inactive subscriptions are skipped. A household with no
/// subscriptions gets empty guidance.
pub fn assess_subscriptions(
    household: &Household,
    catalog: &Catalog,
    context: &AnalysisContext,
) -> AppResult<Guidance> {
    household.validate()?;
    catalog.validate()?;

    let records: Vec<_> = household.viewing_records().collect();
    let total_watches = records.len();

    // One aggregation per distinct watched title, reused across subscriptions
    let mut availability_by_title: HashMap<Uuid, Availability> = HashMap::new();
    for record in &records {
        if !availability_by_title.contains_key(&record.title_id) {
            let availability = availability_in_catalog(catalog, record.title_id, context)?;
            availability_by_title.insert(record.title_id, availability);
        }
    }

    let recommendations: Vec<SubscriptionRecommendation> = household
        .active_subscriptions()
        .map(|subscription| {
            let platform_watches = records
                .iter()
                .filter(|record| {
                    availability_by_title
                        .get(&record.title_id)
                        .is_some_and(|a| a.likely_on(&subscription.platform))
                })
                .count();

            let usage_percentage = if total_watches > 0 {
                platform_watches as f64 / total_watches as f64
            } else {
                0.0
            };

            let days_since_use = subscription
                .days_since_last_watched(context.as_of)
                .unwrap_or(0);

            let assessment = Assessment::new(
                subscription.id,
                subscription.platform.clone(),
                subscription.monthly_cost,
                platform_watches,
                usage_percentage,
                days_since_use,
            );

            tracing::debug!(
                subscription_id = %subscription.id,
                platform = %subscription.platform,
                platform_watches,
                usage_percentage,
                days_since_use,
                action = %assessment.action(),
                "Assessed subscription"
            );

            SubscriptionRecommendation::from_assessment(assessment)
        })
        .collect();

    let guidance = Guidance::new(household.id, recommendations);

    tracing::info!(
        household_id = %household.id,
        assessed = guidance.recommendations.len(),
        cancellations = guidance.cancel_recommendations().count(),
        potential_savings = guidance.potential_savings,
        "Generated subscription guidance"
    );

    Ok(guidance)
}
