use std::fmt::Display;

use serde::Serialize;
use uuid::Uuid;

/// Days without use after which a subscription is flagged for review
pub const UNDERUTILIZATION_DAYS: i64 = 30;
/// Days without use after which an unwatched subscription should be cancelled
pub const CANCELLATION_DAYS: i64 = UNDERUTILIZATION_DAYS * 3;
/// Share of household viewing below which usage counts as low
pub const LOW_USAGE_THRESHOLD: f64 = 0.1;

const RECENT_USE_DAYS: i64 = 7;
const STALE_USE_DAYS: i64 = 14;
const GOOD_MATCH_USAGE: f64 = 0.3;
const AFFORDABLE_MONTHLY_COST: f64 = 10.0;
const HIGH_COST_PER_WATCH: f64 = 5.0;

/// Monthly cost divided across watches
///
/// `Unbounded` stands for "no watches at all" and orders above every
/// finite amount.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum CostPerWatch {
    PerWatch(f64),
    Unbounded,
}

impl CostPerWatch {
    pub fn from_usage(monthly_cost: f64, platform_watches: usize) -> Self {
        if platform_watches == 0 {
            CostPerWatch::Unbounded
        } else {
            CostPerWatch::PerWatch(monthly_cost / platform_watches as f64)
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, CostPerWatch::PerWatch(_))
    }
}

/// Usage metrics and findings for one active subscription
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Assessment {
    pub subscription_id: Uuid,
    pub platform: String,
    pub monthly_cost: f64,
    pub platform_watches: usize,
    /// Share of the household's viewing records on this platform, in [0, 1]
    pub usage_percentage: f64,
    pub cost_per_watch: CostPerWatch,
    pub days_since_use: i64,
    pub flags_low_usage: bool,
    pub underutilized: bool,
    pub should_cancel: bool,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

impl Assessment {
    /// Derives every flag and finding from the raw usage metrics
    pub fn new(
        subscription_id: Uuid,
        platform: String,
        monthly_cost: f64,
        platform_watches: usize,
        usage_percentage: f64,
        days_since_use: i64,
    ) -> Self {
        let cost_per_watch = CostPerWatch::from_usage(monthly_cost, platform_watches);
        let flags_low_usage = usage_percentage < LOW_USAGE_THRESHOLD;
        let underutilized = days_since_use > UNDERUTILIZATION_DAYS || flags_low_usage;
        let should_cancel = days_since_use > CANCELLATION_DAYS && platform_watches == 0;

        let mut pros = vec!["Active subscription".to_string()];
        if days_since_use < RECENT_USE_DAYS {
            pros.push("Recently used".to_string());
        }
        if usage_percentage > GOOD_MATCH_USAGE {
            pros.push("Good content match".to_string());
        }
        if monthly_cost < AFFORDABLE_MONTHLY_COST {
            pros.push("Affordable".to_string());
        }

        let mut cons = Vec::new();
        if days_since_use > STALE_USE_DAYS {
            cons.push(format!("Not used in {} days", days_since_use));
        }
        if flags_low_usage {
            cons.push(format!(
                "Low usage ({}%)",
                (usage_percentage * 100.0).round() as i64
            ));
        }
        if cost_per_watch > CostPerWatch::PerWatch(HIGH_COST_PER_WATCH) && cost_per_watch.is_finite()
        {
            cons.push("High cost per watch".to_string());
        }

        Self {
            subscription_id,
            platform,
            monthly_cost,
            platform_watches,
            usage_percentage,
            cost_per_watch,
            days_since_use,
            flags_low_usage,
            underutilized,
            should_cancel,
            pros,
            cons,
        }
    }

    pub fn has_cons(&self) -> bool {
        !self.cons.is_empty()
    }

    /// The action this assessment supports
    pub fn action(&self) -> SubscriptionAction {
        if self.should_cancel {
            SubscriptionAction::Cancel
        } else if self.underutilized {
            SubscriptionAction::Review
        } else {
            SubscriptionAction::Keep
        }
    }
}

/// What the household should do with a subscription
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionAction {
    Keep,
    Review,
    Cancel,
}

impl Display for SubscriptionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionAction::Keep => write!(f, "keep"),
            SubscriptionAction::Review => write!(f, "review"),
            SubscriptionAction::Cancel => write!(f, "cancel"),
        }
    }
}

/// Recommended action for one subscription, phrased in money terms
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionRecommendation {
    pub subscription_id: Uuid,
    pub platform: String,
    pub action: SubscriptionAction,
    pub user_benefit_reason: String,
    pub benefit: String,
    pub assessment: Assessment,
}

impl SubscriptionRecommendation {
    pub fn from_assessment(assessment: Assessment) -> Self {
        let action = assessment.action();
        let cost = format_currency(assessment.monthly_cost);

        let (user_benefit_reason, benefit) = match action {
            SubscriptionAction::Cancel => (
                format!("Save {}/month - not being used", cost),
                format!("Save {}/month", cost),
            ),
            SubscriptionAction::Review => (
                format!("Low usage - consider if worth {}/month", cost),
                "Potential savings".to_string(),
            ),
            SubscriptionAction::Keep => (
                format!("Good value - actively used for {}/month", cost),
                "Continued access to content you watch".to_string(),
            ),
        };

        Self {
            subscription_id: assessment.subscription_id,
            platform: assessment.platform.clone(),
            action,
            user_benefit_reason,
            benefit,
            assessment,
        }
    }

    pub fn monthly_cost(&self) -> f64 {
        self.assessment.monthly_cost
    }

    /// Guidance is never driven by engagement alone
    pub fn reason_is_engagement_only(&self) -> bool {
        false
    }
}

/// What the guidance is optimized for
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationTarget {
    UserValue,
}

/// Outcomes the guidance is measured by
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuccessMetric {
    PotentialSavings,
    MoneySaved,
    UserSatisfaction,
    ContentMatch,
}

/// Household-level bundle of subscription assessments and actions
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Guidance {
    pub household_id: Uuid,
    pub recommendations: Vec<SubscriptionRecommendation>,
    pub potential_savings: f64,
    pub optimization_target: OptimizationTarget,
}

impl Guidance {
    pub fn new(household_id: Uuid, recommendations: Vec<SubscriptionRecommendation>) -> Self {
        let potential_savings = recommendations
            .iter()
            .filter(|r| r.action == SubscriptionAction::Cancel)
            .map(SubscriptionRecommendation::monthly_cost)
            .sum();

        Self {
            household_id,
            recommendations,
            potential_savings,
            optimization_target: OptimizationTarget::UserValue,
        }
    }

    pub fn assessments(&self) -> impl Iterator<Item = &Assessment> {
        self.recommendations.iter().map(|r| &r.assessment)
    }

    pub fn cancel_recommendations(&self) -> impl Iterator<Item = &SubscriptionRecommendation> {
        self.recommendations
            .iter()
            .filter(|r| r.action == SubscriptionAction::Cancel)
    }

    pub fn success_metrics(&self) -> [SuccessMetric; 4] {
        [
            SuccessMetric::PotentialSavings,
            SuccessMetric::MoneySaved,
            SuccessMetric::UserSatisfaction,
            SuccessMetric::ContentMatch,
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}
