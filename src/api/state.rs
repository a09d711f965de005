use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{AvailabilityObservation, Catalog, Household, Title};
use crate::services::DEFAULT_STALENESS_WINDOW_DAYS;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub staleness_window_days: i64,
}

/// In-memory snapshot source the handlers read from
#[derive(Default)]
pub struct AppStateInner {
    /// Titles in insertion order, which is also the ranking tie-break order
    pub titles: Vec<Title>,
    /// Append-only observation log
    pub observations: Vec<AvailabilityObservation>,
    pub households: HashMap<Uuid, Household>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS_WINDOW_DAYS)
    }
}

impl AppState {
    /// Creates a new empty application state
    pub fn new(staleness_window_days: i64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppStateInner::default())),
            staleness_window_days,
        }
    }
}

impl AppStateInner {
    /// Copies titles and observations so scoring runs outside the lock
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.titles.clone(), self.observations.clone())
    }

    pub fn title(&self, title_id: &Uuid) -> AppResult<&Title> {
        self.titles
            .iter()
            .find(|t| t.id == *title_id)
            .ok_or_else(|| AppError::NotFound(format!("title {}", title_id)))
    }

    pub fn household(&self, household_id: &Uuid) -> AppResult<&Household> {
        self.households
            .get(household_id)
            .ok_or_else(|| AppError::NotFound(format!("household {}", household_id)))
    }

    pub fn household_mut(&mut self, household_id: &Uuid) -> AppResult<&mut Household> {
        self.households
            .get_mut(household_id)
            .ok_or_else(|| AppError::NotFound(format!("household {}", household_id)))
    }

    pub fn member_exists(&self, member_id: &Uuid) -> bool {
        self.households
            .values()
            .any(|h| h.includes_member(member_id))
    }
}
