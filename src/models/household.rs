use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ensure_unit_interval, AppError, AppResult};

/// A member's viewing progress on one title
///
/// `progress` and `fully_watched` are stored independently; nothing here
/// derives one from the other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewingRecord {
    pub member_id: Uuid,
    pub title_id: Uuid,
    /// Fraction watched, in [0, 1]
    pub progress: f64,
    pub fully_watched: bool,
}

impl ViewingRecord {
    pub fn validate(&self) -> AppResult<()> {
        ensure_unit_interval("progress", self.progress)
    }
}

/// An individual within a household
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub viewing_records: Vec<ViewingRecord>,
}

impl Member {
    /// Creates a member with no viewing history
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            viewing_records: Vec::new(),
        }
    }

    /// Records progress on a title, replacing any existing record for it
    pub fn record_viewing(&mut self, title_id: Uuid, progress: f64, fully_watched: bool) {
        let record = ViewingRecord {
            member_id: self.id,
            title_id,
            progress,
            fully_watched,
        };

        if let Some(existing) = self
            .viewing_records
            .iter_mut()
            .find(|r| r.title_id == title_id)
        {
            *existing = record;
        } else {
            self.viewing_records.push(record);
        }
    }

    pub fn viewing_record(&self, title_id: &Uuid) -> Option<&ViewingRecord> {
        self.viewing_records.iter().find(|r| r.title_id == *title_id)
    }

    /// Drops the record for a title, returning it if there was one
    pub fn remove_viewing(&mut self, title_id: &Uuid) -> Option<ViewingRecord> {
        let index = self
            .viewing_records
            .iter()
            .position(|r| r.title_id == *title_id)?;
        Some(self.viewing_records.remove(index))
    }

    pub fn fully_watched(&self, title_id: &Uuid) -> bool {
        self.viewing_records
            .iter()
            .any(|r| r.title_id == *title_id && r.fully_watched)
    }
}

/// A household's subscription to one streaming platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: Uuid,
    /// Platform name (e.g., "Netflix"), unique per household
    pub platform: String,
    /// Monthly cost in dollars
    pub monthly_cost: f64,
    pub active: bool,
    pub last_watched_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Creates an active subscription that has never been watched
    pub fn new(platform: impl Into<String>, monthly_cost: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            platform: platform.into(),
            monthly_cost,
            active: true,
            last_watched_at: None,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if !self.monthly_cost.is_finite() || self.monthly_cost < 0.0 {
            return Err(AppError::InvalidInput(format!(
                "monthly cost for {} must be a non-negative amount, got {}",
                self.platform, self.monthly_cost
            )));
        }
        Ok(())
    }

    /// Whole days since this platform was last watched, `None` if never
    pub fn days_since_last_watched(&self, as_of: DateTime<Utc>) -> Option<i64> {
        self.last_watched_at
            .map(|last| (as_of - last).num_days().max(0))
    }
}

/// A group of people who share viewing history and subscription decisions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub members: Vec<Member>,
    pub subscriptions: Vec<Subscription>,
}

impl Household {
    /// Creates a household with its first member
    pub fn new(name: impl Into<String>, first_member: Member) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            members: vec![first_member],
            subscriptions: Vec::new(),
        }
    }

    /// Checks every record the household carries
    pub fn validate(&self) -> AppResult<()> {
        for record in self.viewing_records() {
            record.validate()?;
        }
        for subscription in &self.subscriptions {
            subscription.validate()?;
        }
        Ok(())
    }

    pub fn member_mut(&mut self, member_id: &Uuid) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.id == *member_id)
    }

    /// Removes a member and their history; the last member cannot leave
    pub fn remove_member(&mut self, member_id: &Uuid) -> AppResult<Member> {
        let index = self
            .members
            .iter()
            .position(|m| m.id == *member_id)
            .ok_or_else(|| AppError::NotFound(format!("member {}", member_id)))?;

        if self.members.len() == 1 {
            return Err(AppError::InvalidInput(format!(
                "cannot remove the last member of household {}",
                self.name
            )));
        }

        Ok(self.members.remove(index))
    }

    pub fn includes_member(&self, member_id: &Uuid) -> bool {
        self.members.iter().any(|m| m.id == *member_id)
    }

    /// Union of all members' viewing records
    pub fn viewing_records(&self) -> impl Iterator<Item = &ViewingRecord> {
        self.members.iter().flat_map(|m| m.viewing_records.iter())
    }

    pub fn viewing_record_count(&self) -> usize {
        self.members.iter().map(|m| m.viewing_records.len()).sum()
    }

    /// Titles at least one member has a record for
    pub fn watched_title_ids(&self) -> HashSet<Uuid> {
        self.viewing_records().map(|r| r.title_id).collect()
    }

    /// Titles any member has fully watched
    pub fn fully_watched_title_ids(&self) -> HashSet<Uuid> {
        self.viewing_records()
            .filter(|r| r.fully_watched)
            .map(|r| r.title_id)
            .collect()
    }

    /// Titles started but not fully watched by anyone
    pub fn in_progress_title_ids(&self) -> HashSet<Uuid> {
        let finished = self.fully_watched_title_ids();
        self.viewing_records()
            .filter(|r| r.progress > 0.0 && !finished.contains(&r.title_id))
            .map(|r| r.title_id)
            .collect()
    }

    pub fn fully_watched_by_any(&self, title_id: &Uuid) -> bool {
        self.members.iter().any(|m| m.fully_watched(title_id))
    }

    pub fn active_subscriptions(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.iter().filter(|s| s.active)
    }

    /// Adds a subscription, rejecting a second one for the same platform
    pub fn add_subscription(&mut self, subscription: Subscription) -> AppResult<()> {
        subscription.validate()?;
        if self
            .subscriptions
            .iter()
            .any(|s| s.platform == subscription.platform)
        {
            return Err(AppError::InvalidInput(format!(
                "household already subscribes to {}",
                subscription.platform
            )));
        }
        self.subscriptions.push(subscription);
        Ok(())
    }

    pub fn subscription_mut(&mut self, subscription_id: &Uuid) -> AppResult<&mut Subscription> {
        self.subscriptions
            .iter_mut()
            .find(|s| s.id == *subscription_id)
            .ok_or_else(|| AppError::NotFound(format!("subscription {}", subscription_id)))
    }

    pub fn remove_subscription(&mut self, subscription_id: &Uuid) -> AppResult<Subscription> {
        let index = self
            .subscriptions
            .iter()
            .position(|s| s.id == *subscription_id)
            .ok_or_else(|| AppError::NotFound(format!("subscription {}", subscription_id)))?;
        Ok(self.subscriptions.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn household_with_two_members() -> (Household, Uuid, Uuid) {
        let alice = Member::new("Alice");
        let bob = Member::new("Bob");
        let (alice_id, bob_id) = (alice.id, bob.id);
        let mut household = Household::new("Home", alice);
        household.members.push(bob);
        (household, alice_id, bob_id)
    }

    #[test]
    fn test_record_viewing_upserts() {
        let mut member = Member::new("Alice");
        let title_id = Uuid::new_v4();
        member.record_viewing(title_id, 0.4, false);
        member.record_viewing(title_id, 1.0, true);
        assert_eq!(member.viewing_records.len(), 1);
        assert!(member.fully_watched(&title_id));
    }

    #[test]
    fn test_progress_and_flag_stay_independent() {
        let mut member = Member::new("Alice");
        let title_id = Uuid::new_v4();
        member.record_viewing(title_id, 0.5, true);
        assert_eq!(member.viewing_records[0].progress, 0.5);
        assert!(member.fully_watched(&title_id));

        let other = Uuid::new_v4();
        member.record_viewing(other, 1.0, false);
        assert!(!member.fully_watched(&other));
    }

    #[test]
    fn test_history_is_union_of_members() {
        let (mut household, alice_id, bob_id) = household_with_two_members();
        let shared = Uuid::new_v4();
        let solo = Uuid::new_v4();

        household.member_mut(&alice_id).unwrap().record_viewing(shared, 1.0, true);
        household.member_mut(&bob_id).unwrap().record_viewing(shared, 0.2, false);
        household.member_mut(&bob_id).unwrap().record_viewing(solo, 0.3, false);

        assert_eq!(household.viewing_record_count(), 3);
        assert_eq!(household.watched_title_ids().len(), 2);
        assert!(household.fully_watched_by_any(&shared));
        assert!(!household.fully_watched_by_any(&solo));
        assert_eq!(household.in_progress_title_ids(), HashSet::from([solo]));
    }

    #[test]
    fn test_duplicate_platform_rejected() {
        let (mut household, _, _) = household_with_two_members();
        household
            .add_subscription(Subscription::new("Netflix", 15.49))
            .unwrap();
        let result = household.add_subscription(Subscription::new("Netflix", 9.99));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_last_member_cannot_be_removed() {
        let (mut household, alice_id, bob_id) = household_with_two_members();

        let removed = household.remove_member(&bob_id).unwrap();
        assert_eq!(removed.name, "Bob");
        assert!(!household.includes_member(&bob_id));

        let result = household.remove_member(&alice_id);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(household.members.len(), 1);

        let result = household.remove_member(&Uuid::new_v4());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_remove_viewing() {
        let mut member = Member::new("Alice");
        let title_id = Uuid::new_v4();
        member.record_viewing(title_id, 0.7, false);

        assert_eq!(member.viewing_record(&title_id).map(|r| r.progress), Some(0.7));
        assert!(member.remove_viewing(&title_id).is_some());
        assert!(member.viewing_record(&title_id).is_none());
        assert!(member.remove_viewing(&title_id).is_none());
    }

    #[test]
    fn test_remove_subscription() {
        let (mut household, _, _) = household_with_two_members();
        let subscription = Subscription::new("Hulu", 7.99);
        let subscription_id = subscription.id;
        household.add_subscription(subscription).unwrap();

        household.subscription_mut(&subscription_id).unwrap().active = false;
        assert_eq!(household.active_subscriptions().count(), 0);

        household.remove_subscription(&subscription_id).unwrap();
        assert!(household.subscriptions.is_empty());
        assert!(matches!(
            household.remove_subscription(&subscription_id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_negative_cost_rejected() {
        let subscription = Subscription::new("Hulu", -1.0);
        assert!(subscription.validate().is_err());
    }

    #[test]
    fn test_invalid_progress_rejected() {
        let (mut household, alice_id, _) = household_with_two_members();
        household
            .member_mut(&alice_id)
            .unwrap()
            .record_viewing(Uuid::new_v4(), 1.5, true);
        assert!(household.validate().is_err());
    }

    #[test]
    fn test_days_since_last_watched() {
        let now = Utc::now();
        let mut subscription = Subscription::new("Hulu", 7.99);
        assert_eq!(subscription.days_since_last_watched(now), None);

        subscription.last_watched_at = Some(now - Duration::days(12) - Duration::hours(5));
        assert_eq!(subscription.days_since_last_watched(now), Some(12));
    }
}
