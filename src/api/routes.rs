use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route(
            "/titles",
            get(handlers::get_titles).post(handlers::create_title),
        )
        .route(
            "/titles/:title_id/availability",
            get(handlers::get_availability).post(handlers::report_availability),
        )
        // Households
        .route("/households", post(handlers::create_household))
        .route("/households/:household_id", get(handlers::get_household))
        .route(
            "/households/:household_id/members",
            post(handlers::add_member),
        )
        .route(
            "/households/:household_id/members/:member_id",
            delete(handlers::remove_member),
        )
        .route(
            "/households/:household_id/members/:member_id/viewing_records",
            post(handlers::record_viewing),
        )
        .route(
            "/households/:household_id/members/:member_id/viewing_records/:title_id",
            delete(handlers::delete_viewing_record),
        )
        .route(
            "/households/:household_id/subscriptions",
            get(handlers::get_subscriptions).post(handlers::add_subscription),
        )
        .route(
            "/households/:household_id/subscriptions/:subscription_id",
            patch(handlers::update_subscription).delete(handlers::delete_subscription),
        )
        // Inference outputs
        .route(
            "/households/:household_id/recommendations",
            get(handlers::get_recommendations),
        )
        .route(
            "/households/:household_id/subscription_intelligence",
            get(handlers::get_subscription_intelligence),
        )
}
