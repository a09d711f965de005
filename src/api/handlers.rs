use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{
    AvailabilityObservation, Category, Guidance, Household, Member, ObservationSource,
    Recommendation, Subscription, SuccessMetric, Title, ViewingRecord,
};
use crate::services::{self, AnalysisContext};

use super::AppState;

/// Confidence assumed when a reporter doesn't give one
const DEFAULT_REPORT_CONFIDENCE: f64 = 0.8;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct CreateTitleRequest {
    pub name: String,
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub limit: Option<usize>,
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PlatformConfidence {
    pub platform: String,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub title_id: Uuid,
    pub title_name: String,
    pub source: ObservationSource,
    pub description: String,
    pub confidence: Option<f64>,
    /// Every platform with recent reports, whatever their confidence
    pub platforms: Vec<PlatformConfidence>,
    /// Platforms confident enough to be called likely
    pub likely_platforms: Vec<String>,
    pub observation_count: usize,
    pub last_verified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ReportObservationRequest {
    pub platform: String,
    pub observer_id: Uuid,
    pub confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ObservationResponse {
    #[serde(flatten)]
    pub observation: AvailabilityObservation,
    pub source: ObservationSource,
}

#[derive(Debug, Deserialize)]
pub struct CreateHouseholdRequest {
    pub name: String,
    pub member_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordViewingRequest {
    pub title_id: Uuid,
    pub fully_watched: bool,
    /// Defaults to the existing record's progress, else 1.0 for a finished
    /// title and 0.0 otherwise
    pub progress: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AddSubscriptionRequest {
    pub platform: String,
    pub monthly_cost: f64,
    pub active: Option<bool>,
    pub last_watched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubscriptionRequest {
    pub active: Option<bool>,
    pub monthly_cost: Option<f64>,
    pub last_watched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub household_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub count: usize,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionIntelligenceResponse {
    #[serde(flatten)]
    pub guidance: Guidance,
    pub success_metrics: [SuccessMetric; 4],
    pub generated_at: DateTime<Utc>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Get all titles in catalog order
pub async fn get_titles(State(state): State<AppState>) -> Json<Vec<Title>> {
    let inner = state.inner.read().await;
    Json(inner.titles.clone())
}

/// Add a title to the catalog
pub async fn create_title(
    State(state): State<AppState>,
    Json(request): Json<CreateTitleRequest>,
) -> (StatusCode, Json<Title>) {
    let title = Title::new(request.name, request.category);

    let mut inner = state.inner.write().await;
    inner.titles.push(title.clone());

    (StatusCode::CREATED, Json(title))
}

/// Aggregated availability for one title
pub async fn get_availability(
    State(state): State<AppState>,
    Path(title_id): Path<Uuid>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<AvailabilityResponse>> {
    let (title, catalog) = {
        let inner = state.inner.read().await;
        (inner.title(&title_id)?.clone(), inner.catalog())
    };

    let context = analysis_context(&state, query.as_of)?;
    let availability =
        services::availability::availability_in_catalog(&catalog, title.id, &context)?;

    Ok(Json(AvailabilityResponse {
        title_id: title.id,
        title_name: title.name,
        source: availability.source(),
        description: availability.description(),
        confidence: availability.confidence,
        platforms: availability
            .platform_confidence
            .iter()
            .map(|(platform, confidence)| PlatformConfidence {
                platform: platform.clone(),
                confidence: *confidence,
            })
            .collect(),
        likely_platforms: availability
            .platforms()
            .into_iter()
            .map(str::to_string)
            .collect(),
        observation_count: availability.observation_count,
        last_verified_at: availability.last_verified_at,
    }))
}

/// Record a member's report that a title is on a platform
pub async fn report_availability(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(title_id): Path<Uuid>,
    Json(request): Json<ReportObservationRequest>,
) -> AppResult<(StatusCode, Json<ObservationResponse>)> {
    if request.platform.trim().is_empty() {
        return Err(AppError::InvalidInput("platform must not be empty".to_string()));
    }

    let observation = AvailabilityObservation {
        title_id,
        platform: request.platform,
        observer_id: request.observer_id,
        confidence: request.confidence.unwrap_or(DEFAULT_REPORT_CONFIDENCE),
        observed_at: Utc::now(),
    };
    observation.validate()?;

    let mut inner = state.inner.write().await;
    inner.title(&title_id)?;
    if !inner.member_exists(&observation.observer_id) {
        return Err(AppError::NotFound(format!(
            "member {}",
            observation.observer_id
        )));
    }
    inner.observations.push(observation.clone());

    tracing::info!(
        request_id = %request_id,
        title_id = %title_id,
        platform = %observation.platform,
        confidence = observation.confidence,
        "Recorded availability observation"
    );

    let source = observation.source();
    Ok((
        StatusCode::CREATED,
        Json(ObservationResponse {
            observation,
            source,
        }),
    ))
}

/// Create a household with its first member
pub async fn create_household(
    State(state): State<AppState>,
    Json(request): Json<CreateHouseholdRequest>,
) -> (StatusCode, Json<Household>) {
    let household = Household::new(request.name, Member::new(request.member_name));

    let mut inner = state.inner.write().await;
    inner.households.insert(household.id, household.clone());

    (StatusCode::CREATED, Json(household))
}

/// Get a household with its members and subscriptions
pub async fn get_household(
    State(state): State<AppState>,
    Path(household_id): Path<Uuid>,
) -> AppResult<Json<Household>> {
    let inner = state.inner.read().await;
    Ok(Json(inner.household(&household_id)?.clone()))
}

/// Add a member to a household
pub async fn add_member(
    State(state): State<AppState>,
    Path(household_id): Path<Uuid>,
    Json(request): Json<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<Member>)> {
    let mut inner = state.inner.write().await;
    let household = inner.household_mut(&household_id)?;

    if household.members.iter().any(|m| m.name == request.name) {
        return Err(AppError::InvalidInput(format!(
            "household already has a member named {}",
            request.name
        )));
    }

    let member = Member::new(request.name);
    household.members.push(member.clone());

    Ok((StatusCode::CREATED, Json(member)))
}

/// Remove a member and their viewing history
pub async fn remove_member(
    State(state): State<AppState>,
    Path((household_id, member_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let mut inner = state.inner.write().await;
    let member = inner
        .household_mut(&household_id)?
        .remove_member(&member_id)?;

    tracing::info!(
        household_id = %household_id,
        member_id = %member.id,
        dropped_records = member.viewing_records.len(),
        "Removed household member"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Record or update a member's progress on a title
pub async fn record_viewing(
    State(state): State<AppState>,
    Path((household_id, member_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<RecordViewingRequest>,
) -> AppResult<Json<Member>> {
    let mut inner = state.inner.write().await;
    inner.title(&request.title_id)?;

    let member = inner
        .household_mut(&household_id)?
        .member_mut(&member_id)
        .ok_or_else(|| AppError::NotFound(format!("member {}", member_id)))?;

    let progress = request.progress.unwrap_or_else(|| {
        match member.viewing_record(&request.title_id) {
            Some(existing) => existing.progress,
            None if request.fully_watched => 1.0,
            None => 0.0,
        }
    });

    let record = ViewingRecord {
        member_id,
        title_id: request.title_id,
        progress,
        fully_watched: request.fully_watched,
    };
    record.validate()?;
    member.record_viewing(record.title_id, record.progress, record.fully_watched);

    Ok(Json(member.clone()))
}

/// Forget a member's record for a title
pub async fn delete_viewing_record(
    State(state): State<AppState>,
    Path((household_id, member_id, title_id)): Path<(Uuid, Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let mut inner = state.inner.write().await;
    inner
        .household_mut(&household_id)?
        .member_mut(&member_id)
        .ok_or_else(|| AppError::NotFound(format!("member {}", member_id)))?
        .remove_viewing(&title_id)
        .ok_or_else(|| AppError::NotFound(format!("viewing record for title {}", title_id)))?;

    Ok(StatusCode::NO_CONTENT)
}

/// List a household's subscriptions
pub async fn get_subscriptions(
    State(state): State<AppState>,
    Path(household_id): Path<Uuid>,
) -> AppResult<Json<Vec<Subscription>>> {
    let inner = state.inner.read().await;
    Ok(Json(inner.household(&household_id)?.subscriptions.clone()))
}

/// Add a subscription to a household
pub async fn add_subscription(
    State(state): State<AppState>,
    Path(household_id): Path<Uuid>,
    Json(request): Json<AddSubscriptionRequest>,
) -> AppResult<(StatusCode, Json<Subscription>)> {
    let mut subscription = Subscription::new(request.platform, request.monthly_cost);
    subscription.active = request.active.unwrap_or(true);
    subscription.last_watched_at = request.last_watched_at;

    let mut inner = state.inner.write().await;
    inner
        .household_mut(&household_id)?
        .add_subscription(subscription.clone())?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

/// Change a subscription's status, cost or last use
pub async fn update_subscription(
    State(state): State<AppState>,
    Path((household_id, subscription_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateSubscriptionRequest>,
) -> AppResult<Json<Subscription>> {
    let mut inner = state.inner.write().await;
    let subscription = inner
        .household_mut(&household_id)?
        .subscription_mut(&subscription_id)?;

    let mut updated = subscription.clone();
    if let Some(active) = request.active {
        updated.active = active;
    }
    if let Some(monthly_cost) = request.monthly_cost {
        updated.monthly_cost = monthly_cost;
    }
    if let Some(last_watched_at) = request.last_watched_at {
        updated.last_watched_at = Some(last_watched_at);
    }
    updated.validate()?;
    *subscription = updated.clone();

    tracing::info!(
        household_id = %household_id,
        platform = %updated.platform,
        active = updated.active,
        "Updated subscription"
    );

    Ok(Json(updated))
}

/// Drop a subscription from a household
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path((household_id, subscription_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let mut inner = state.inner.write().await;
    inner
        .household_mut(&household_id)?
        .remove_subscription(&subscription_id)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Ranked, explained recommendations for a household
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(household_id): Path<Uuid>,
    Query(query): Query<RecommendationsQuery>,
) -> AppResult<Json<RecommendationsResponse>> {
    let (household, catalog) = {
        let inner = state.inner.read().await;
        (inner.household(&household_id)?.clone(), inner.catalog())
    };

    tracing::info!(
        request_id = %request_id,
        household_id = %household_id,
        limit = ?query.limit,
        "Processing recommendation request"
    );

    let context = analysis_context(&state, query.as_of)?;
    let recommendations = services::recommend_top(&household, &catalog, &context, query.limit)?;

    Ok(Json(RecommendationsResponse {
        household_id,
        generated_at: context.as_of,
        count: recommendations.len(),
        recommendations,
    }))
}

/// Keep/review/cancel guidance for a household's subscriptions
pub async fn get_subscription_intelligence(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(household_id): Path<Uuid>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<SubscriptionIntelligenceResponse>> {
    let (household, catalog) = {
        let inner = state.inner.read().await;
        (inner.household(&household_id)?.clone(), inner.catalog())
    };

    tracing::info!(
        request_id = %request_id,
        household_id = %household_id,
        "Processing subscription intelligence request"
    );

    let context = analysis_context(&state, query.as_of)?;
    let guidance = services::assess_subscriptions(&household, &catalog, &context)?;
    let success_metrics = guidance.success_metrics();

    Ok(Json(SubscriptionIntelligenceResponse {
        guidance,
        success_metrics,
        generated_at: context.as_of,
    }))
}

fn analysis_context(state: &AppState, as_of: Option<DateTime<Utc>>) -> AppResult<AnalysisContext> {
    AnalysisContext::new(as_of.unwrap_or_else(Utc::now), state.staleness_window_days)
}
