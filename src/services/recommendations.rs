use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::AppResult,
    models::{Category, Catalog, Confidence, Household, Reason, Recommendation, Title},
};

use super::{availability::availability_in_catalog, AnalysisContext};

/// Recommendations guaranteed when the household has enough history
pub const MINIMUM_RECOMMENDATIONS: usize = 3;
/// Viewing records needed before the minimum applies
pub const MINIMUM_HISTORY_FOR_FULL_RECOMMENDATIONS: usize = 5;

const BASE_SCORE: f64 = 0.5;
const CATEGORY_BONUS: f64 = 0.3;
const SUBSCRIBED_PLATFORM_BONUS: f64 = 0.2;
const SPARSE_HISTORY_PENALTY: f64 = 0.6;

const FALLBACK_REASON: &str = "Popular title you haven't watched yet";

/// Ranks every title nobody in the household has finished
///
/// See [`recommend_top`] for the ranking rules; this variant applies no limit.
pub fn recommend(
    household: &Household,
    catalog: &Catalog,
    context: &AnalysisContext,
) -> AppResult<Vec<Recommendation>> {
    recommend_top(household, catalog, context, None)
}

/// Ranks un-finished titles for a household and explains each one
///
/// A title fully watched by any member is never returned. Candidates start
/// at 0.5, gain 0.3 when they match the household's most-watched category
/// and 0.2 when they are likely on a platform the household actively
/// subscribes to. With fewer than five viewing records the clamped score is
/// scaled by 0.6.
///
/// `limit` caps the result, but with sufficient history it is raised to
/// [`MINIMUM_RECOMMENDATIONS`] so the household always sees at least three
/// titles when three exist.
pub fn recommend_top(
    household: &Household,
    catalog: &Catalog,
    context: &AnalysisContext,
    limit: Option<usize>,
) -> AppResult<Vec<Recommendation>> {
    household.validate()?;
    catalog.validate()?;

    let excluded = household.fully_watched_title_ids();
    let history_count = household.viewing_record_count();
    let has_sufficient_history = history_count >= MINIMUM_HISTORY_FOR_FULL_RECOMMENDATIONS;
    let favorite = favorite_category(household, catalog);
    let subscribed: BTreeSet<&str> = household
        .active_subscriptions()
        .map(|s| s.platform.as_str())
        .collect();

    let mut recommendations = Vec::new();
    for title in catalog.titles().iter().filter(|t| !excluded.contains(&t.id)) {
        let availability = availability_in_catalog(catalog, title.id, context)?;
        let category_match = favorite == Some(title.category);
        let matching_platform = availability
            .platforms()
            .into_iter()
            .find(|platform| subscribed.contains(platform));

        let score = score_candidate(
            category_match,
            matching_platform.is_some(),
            has_sufficient_history,
        );

        recommendations.push(Recommendation {
            title: title.clone(),
            confidence: Confidence::new(score),
            reasons: explain(title, category_match, matching_platform),
        });
    }

    let candidate_count = recommendations.len();

    // sort_by is stable, so equal scores keep catalog order
    recommendations.sort_by(|a, b| b.confidence.value().total_cmp(&a.confidence.value()));
    recommendations.truncate(result_count(candidate_count, has_sufficient_history, limit));

    tracing::info!(
        household_id = %household.id,
        history_count,
        has_sufficient_history,
        excluded = excluded.len(),
        candidates = candidate_count,
        returned = recommendations.len(),
        "Generated recommendations"
    );

    Ok(recommendations)
}

/// Category with the most distinct watched titles, ties going to the
/// lexically smallest category name
fn favorite_category(household: &Household, catalog: &Catalog) -> Option<Category> {
    let mut tally: BTreeMap<Category, usize> = BTreeMap::new();
    for title_id in household.watched_title_ids() {
        if let Some(title) = catalog.title(&title_id) {
            *tally.entry(title.category).or_default() += 1;
        }
    }

    let mut favorite: Option<(Category, usize)> = None;
    for (category, count) in tally {
        if favorite.map_or(true, |(_, best)| count > best) {
            favorite = Some((category, count));
        }
    }
    favorite.map(|(category, _)| category)
}

fn score_candidate(category_match: bool, platform_match: bool, has_sufficient_history: bool) -> f64 {
    let mut score = BASE_SCORE;
    if category_match {
        score += CATEGORY_BONUS;
    }
    if platform_match {
        score += SUBSCRIBED_PLATFORM_BONUS;
    }

    let score = score.clamp(0.0, 1.0);
    if has_sufficient_history {
        score
    } else {
        score * SPARSE_HISTORY_PENALTY
    }
}

fn explain(title: &Title, category_match: bool, matching_platform: Option<&str>) -> Vec<Reason> {
    let mut reasons = Vec::new();

    if category_match {
        reasons.push(Reason::new(format!(
            "You frequently watch {}",
            title.category.plural_label()
        )));
    }

    if let Some(platform) = matching_platform {
        reasons.push(Reason::new(format!(
            "Likely available on {}, which you subscribe to",
            platform
        )));
    }

    if reasons.is_empty() {
        reasons.push(Reason::new(FALLBACK_REASON));
    }

    reasons
}

fn result_count(candidates: usize, has_sufficient_history: bool, limit: Option<usize>) -> usize {
    match limit {
        None => candidates,
        Some(limit) if has_sufficient_history => limit.max(MINIMUM_RECOMMENDATIONS).min(candidates),
        Some(limit) => limit.min(candidates),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityObservation, Member, Subscription};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    struct Fixture {
        household: Household,
        member_id: Uuid,
        titles: Vec<Title>,
        observations: Vec<AvailabilityObservation>,
    }

    impl Fixture {
        fn new() -> Self {
            let member = Member::new("Alice");
            let member_id = member.id;
            Self {
                household: Household::new("Home", member),
                member_id,
                titles: Vec::new(),
                observations: Vec::new(),
            }
        }

        fn title(&mut self, name: &str, category: Category) -> Uuid {
            let title = Title::new(name, category);
            let id = title.id;
            self.titles.push(title);
            id
        }

        fn watch(&mut self, title_id: Uuid, fully_watched: bool) {
            let progress = if fully_watched { 1.0 } else { 0.5 };
            self.household
                .member_mut(&self.member_id)
                .unwrap()
                .record_viewing(title_id, progress, fully_watched);
        }

        fn observe(&mut self, title_id: Uuid, platform: &str, confidence: f64) {
            self.observations.push(AvailabilityObservation {
                title_id,
                platform: platform.to_string(),
                observer_id: self.member_id,
                confidence,
                observed_at: Utc::now() - Duration::days(1),
            });
        }

        fn run(&self, limit: Option<usize>) -> Vec<Recommendation> {
            let catalog = Catalog::new(self.titles.clone(), self.observations.clone());
            recommend_top(&self.household, &catalog, &AnalysisContext::at(Utc::now()), limit)
                .unwrap()
        }
    }

    #[test]
    fn test_fully_watched_titles_are_excluded() {
        let mut fixture = Fixture::new();
        let finished = fixture.title("Finished", Category::Movie);
        let started = fixture.title("Started", Category::Movie);
        fixture.watch(finished, true);
        fixture.watch(started, false);

        let results = fixture.run(None);
        let ids: Vec<Uuid> = results.iter().map(Recommendation::title_id).collect();
        assert_eq!(ids, vec![started]);
    }

    #[test]
    fn test_excluded_even_when_watched_by_another_member() {
        let mut fixture = Fixture::new();
        let title = fixture.title("Shared", Category::Series);
        let mut bob = Member::new("Bob");
        bob.record_viewing(title, 0.4, true);
        fixture.household.members.push(bob);

        assert!(fixture.run(None).is_empty());
    }

    #[test]
    fn test_category_and_platform_bonuses_with_history() {
        let mut fixture = Fixture::new();
        for i in 0..5 {
            let watched = fixture.title(&format!("Watched {}", i), Category::Series);
            fixture.watch(watched, true);
        }
        let both = fixture.title("Both", Category::Series);
        let platform_only = fixture.title("Platform", Category::Movie);
        let neither = fixture.title("Neither", Category::Movie);
        fixture.observe(both, "Netflix", 0.9);
        fixture.observe(platform_only, "Netflix", 0.9);
        fixture
            .household
            .add_subscription(Subscription::new("Netflix", 15.49))
            .unwrap();

        let results = fixture.run(None);
        let scores: Vec<(Uuid, f64)> = results
            .iter()
            .map(|r| (r.title_id(), r.confidence.value()))
            .collect();

        assert_eq!(scores[0].0, both);
        assert!((scores[0].1 - 1.0).abs() < 1e-9);
        assert_eq!(scores[1].0, platform_only);
        assert!((scores[1].1 - 0.7).abs() < 1e-9);
        assert_eq!(scores[2].0, neither);
        assert!((scores[2].1 - 0.5).abs() < 1e-9);

        assert_eq!(results[0].reasons.len(), 2);
        assert_eq!(results[0].reasons[0].explanation, "You frequently watch TV series");
        assert_eq!(
            results[0].reasons[1].explanation,
            "Likely available on Netflix, which you subscribe to"
        );
        assert_eq!(results[2].reasons[0].explanation, FALLBACK_REASON);
    }

    #[test]
    fn test_inactive_or_low_confidence_platforms_give_no_bonus() {
        let mut fixture = Fixture::new();
        let on_hulu = fixture.title("Hulu Show", Category::Series);
        let weak = fixture.title("Weak", Category::Series);
        fixture.observe(on_hulu, "Hulu", 0.9);
        fixture.observe(weak, "Netflix", 0.2);

        let mut hulu = Subscription::new("Hulu", 7.99);
        hulu.active = false;
        fixture.household.add_subscription(hulu).unwrap();
        fixture
            .household
            .add_subscription(Subscription::new("Netflix", 15.49))
            .unwrap();

        for result in fixture.run(None) {
            assert_eq!(result.reasons[0].explanation, FALLBACK_REASON);
        }
    }

    #[test]
    fn test_sparse_history_penalty() {
        let mut fixture = Fixture::new();
        let watched = fixture.title("Watched", Category::Movie);
        fixture.watch(watched, true);
        let candidate = fixture.title("Candidate", Category::Movie);
        let other = fixture.title("Other", Category::Series);

        let results = fixture.run(None);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title_id(), candidate);
        assert!((results[0].confidence.value() - 0.8 * 0.6).abs() < 1e-9);
        assert_eq!(results[1].title_id(), other);
        assert!((results[1].confidence.value() - 0.5 * 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_category_tie_prefers_lexical_order() {
        let mut fixture = Fixture::new();
        let movie = fixture.title("Movie", Category::Movie);
        let series = fixture.title("Series", Category::Series);
        fixture.watch(series, true);
        fixture.watch(movie, true);
        let catalog = Catalog::new(fixture.titles.clone(), vec![]);

        assert_eq!(
            favorite_category(&fixture.household, &catalog),
            Some(Category::Movie)
        );
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let mut fixture = Fixture::new();
        let ids: Vec<Uuid> = (0..4)
            .map(|i| fixture.title(&format!("Title {}", i), Category::Movie))
            .collect();

        let results: Vec<Uuid> = fixture.run(None).iter().map(Recommendation::title_id).collect();
        assert_eq!(results, ids);
    }

    #[test]
    fn test_limit_is_raised_to_minimum_with_history() {
        let mut fixture = Fixture::new();
        for i in 0..5 {
            let watched = fixture.title(&format!("Watched {}", i), Category::Movie);
            fixture.watch(watched, false);
        }
        assert_eq!(fixture.run(Some(1)).len(), 3);
        assert_eq!(fixture.run(Some(7)).len(), 5);
    }

    #[test]
    fn test_limit_respected_without_history() {
        let mut fixture = Fixture::new();
        for i in 0..4 {
            fixture.title(&format!("Title {}", i), Category::Movie);
        }
        assert_eq!(fixture.run(Some(1)).len(), 1);
        assert_eq!(fixture.run(Some(0)).len(), 0);
    }

    #[test]
    fn test_fewer_candidates_than_minimum_are_not_padded() {
        let mut fixture = Fixture::new();
        for i in 0..5 {
            let watched = fixture.title(&format!("Watched {}", i), Category::Movie);
            fixture.watch(watched, true);
        }
        fixture.title("Only", Category::Movie);
        assert_eq!(fixture.run(Some(3)).len(), 1);
    }

    #[test]
    fn test_empty_catalog_is_not_an_error() {
        let fixture = Fixture::new();
        assert!(fixture.run(None).is_empty());
    }

    #[test]
    fn test_result_count() {
        assert_eq!(result_count(10, true, None), 10);
        assert_eq!(result_count(10, true, Some(2)), 3);
        assert_eq!(result_count(2, true, Some(1)), 2);
        assert_eq!(result_count(10, false, Some(2)), 2);
    }
}
