pub mod availability;
pub mod guidance;
pub mod household;
pub mod observation;
pub mod recommendation;
pub mod title;

pub use availability::{Availability, CONFIDENCE_THRESHOLD};
pub use guidance::{
    Assessment, CostPerWatch, Guidance, OptimizationTarget, SubscriptionAction,
    SubscriptionRecommendation, SuccessMetric,
};
pub use household::{Household, Member, Subscription, ViewingRecord};
pub use observation::{AvailabilityObservation, Catalog, ObservationSource};
pub use recommendation::{Confidence, ConfidenceLabel, Reason, Recommendation};
pub use title::{Category, Title};
