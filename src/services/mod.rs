use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, AppResult};

pub mod availability;
pub mod recommendations;
pub mod subscriptions;

pub use availability::aggregate_availability;
pub use recommendations::{recommend, recommend_top};
pub use subscriptions::assess_subscriptions;

/// Default horizon for availability observations, in days
pub const DEFAULT_STALENESS_WINDOW_DAYS: i64 = 30;

/// Point in time and decay horizon shared by every computation in one call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisContext {
    pub as_of: DateTime<Utc>,
    pub staleness_window_days: i64,
}

impl AnalysisContext {
    pub fn new(as_of: DateTime<Utc>, staleness_window_days: i64) -> AppResult<Self> {
        window_start(as_of, staleness_window_days)?;

        Ok(Self {
            as_of,
            staleness_window_days,
        })
    }

    /// Context at `as_of` with the default window
    pub fn at(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            staleness_window_days: DEFAULT_STALENESS_WINDOW_DAYS,
        }
    }
}

/// Earliest instant a window of `staleness_window_days` ending at `as_of` admits
///
/// Fails for a negative window and for one reaching past the representable
/// date range.
pub fn window_start(
    as_of: DateTime<Utc>,
    staleness_window_days: i64,
) -> AppResult<DateTime<Utc>> {
    if staleness_window_days < 0 {
        return Err(AppError::InvalidInput(format!(
            "staleness window must not be negative, got {} days",
            staleness_window_days
        )));
    }

    Duration::try_days(staleness_window_days)
        .and_then(|window| as_of.checked_sub_signed(window))
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "staleness window of {} days reaches past the supported date range",
                staleness_window_days
            ))
        })
}
