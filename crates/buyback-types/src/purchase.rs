//! Vesting model: purchases are lists of vesting entries.
//!
//! Each buy grants one [`VestingEntry`]; entries with the same start and
//! duration are merged. Unlocked amounts are summed across entries, so
//! purchases made at different times vest independently.
//!
//! ```text
//!   amount
//!     ▲            ┌────────  entry 1 fully vested
//!     │         ╱  │
//!     │      ╱     │     ┌──  entry 2
//!     │   ╱        │  ╱
//!     └──┬─────────┬──┬──────► time
//!      start₁     end₁ start₂
//! ```

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{BuybackError, Result};
use crate::math::mul_div_floor;
use crate::time::{Timestamp, checked_add, duration_nanos, duration_serde, elapsed_nanos};

/// Where a purchase's vesting clock starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VestingAnchor {
    /// `purchase time + delay`.
    #[default]
    Purchase,
    /// `completion time + delay`; nothing unlocks before the auction ends.
    Completion,
}

/// Per-auction vesting parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingParams {
    /// Time between the anchor and the start of unlocking.
    #[serde(with = "duration_serde")]
    pub delay: TimeDelta,
    #[serde(default)]
    pub anchor: VestingAnchor,
}

impl VestingParams {
    #[must_use]
    pub fn new(delay: TimeDelta, anchor: VestingAnchor) -> Self {
        Self { delay, anchor }
    }

    pub fn validate(&self) -> Result<()> {
        if self.delay < TimeDelta::zero() {
            return Err(BuybackError::InvalidAuction {
                reason: "vesting delay must not be negative".into(),
            });
        }
        Ok(())
    }

    /// Start time of an entry bought at `purchase_time`.
    ///
    /// `None` means the entry starts at the auction's completion baseline.
    pub fn entry_start(&self, purchase_time: Timestamp) -> Result<Option<Timestamp>> {
        match self.anchor {
            VestingAnchor::Purchase => checked_add(purchase_time, self.delay).map(Some),
            VestingAnchor::Completion => Ok(None),
        }
    }
}

impl Default for VestingParams {
    fn default() -> Self {
        Self::new(TimeDelta::zero(), VestingAnchor::Purchase)
    }
}

/// A single linear vesting grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingEntry {
    pub amount: u128,
    /// `None` until the auction's completion baseline applies.
    pub start: Option<Timestamp>,
    #[serde(with = "duration_serde")]
    pub duration: TimeDelta,
}

impl VestingEntry {
    #[must_use]
    pub fn new(amount: u128, start: Option<Timestamp>, duration: TimeDelta) -> Self {
        Self {
            amount,
            start,
            duration,
        }
    }

    /// Amount unlocked at `now`. `baseline` resolves a `None` start.
    pub fn unlocked(&self, now: Timestamp, baseline: Option<Timestamp>) -> Result<u128> {
        let Some(start) = self.start.or(baseline) else {
            return Ok(0);
        };
        if now < start {
            return Ok(0);
        }
        let elapsed = elapsed_nanos(start, now)?;
        let total = duration_nanos(self.duration)?;
        if elapsed >= total {
            return Ok(self.amount);
        }
        mul_div_floor(self.amount, elapsed, total)
    }

    fn same_schedule(&self, other: &VestingEntry) -> bool {
        self.start == other.start && self.duration == other.duration
    }
}

/// Everything one buyer bought in one auction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub entries: Vec<VestingEntry>,
    pub claimed: u128,
}

impl Purchase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total amount purchased across all entries.
    pub fn total(&self) -> Result<u128> {
        self.entries.iter().try_fold(0u128, |acc, e| {
            acc.checked_add(e.amount)
                .ok_or_else(|| BuybackError::Arithmetic("purchase total overflow".into()))
        })
    }

    /// Purchased but not yet claimed.
    pub fn unclaimed(&self) -> Result<u128> {
        Ok(self.total()?.saturating_sub(self.claimed))
    }

    /// Sum of every entry's unlocked amount at `now`.
    pub fn unlocked(&self, now: Timestamp, baseline: Option<Timestamp>) -> Result<u128> {
        self.entries.iter().try_fold(0u128, |acc, e| {
            acc.checked_add(e.unlocked(now, baseline)?)
                .ok_or_else(|| BuybackError::Arithmetic("unlocked total overflow".into()))
        })
    }

    /// `unlocked − claimed`, saturating at zero.
    pub fn claimable(&self, now: Timestamp, baseline: Option<Timestamp>) -> Result<u128> {
        Ok(self.unlocked(now, baseline)?.saturating_sub(self.claimed))
    }

    /// Merge into an entry with the same schedule, or append.
    ///
    /// Appending past `max_entries` fails; merging never does.
    pub fn add_entry(&mut self, entry: VestingEntry, max_entries: u64) -> Result<()> {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.same_schedule(&entry)) {
            existing.amount = existing
                .amount
                .checked_add(entry.amount)
                .ok_or_else(|| BuybackError::Arithmetic("vesting entry overflow".into()))?;
            return Ok(());
        }
        if self.entries.len() as u64 >= max_entries {
            return Err(BuybackError::PurchaseLimitReached { max: max_entries });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Record a successful claim.
    pub fn record_claim(&mut self, amount: u128) -> Result<()> {
        let claimed = self
            .claimed
            .checked_add(amount)
            .ok_or_else(|| BuybackError::Arithmetic("claimed overflow".into()))?;
        if claimed > self.total()? {
            return Err(BuybackError::InvariantViolation {
                reason: format!("claimed {claimed} exceeds purchased {}", self.total()?),
            });
        }
        self.claimed = claimed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn hours(h: i64) -> TimeDelta {
        TimeDelta::hours(h)
    }

    // =================================================================
    // VestingEntry
    // =================================================================

    #[test]
    fn single_entry_schedule() {
        let e = VestingEntry::new(1_000, Some(t0()), hours(10));
        assert_eq!(e.unlocked(t0() - hours(1), None).unwrap(), 0);
        assert_eq!(e.unlocked(t0(), None).unwrap(), 0);
        assert_eq!(e.unlocked(t0() + hours(5), None).unwrap(), 500);
        assert_eq!(e.unlocked(t0() + hours(10), None).unwrap(), 1_000);
        assert_eq!(e.unlocked(t0() + hours(50), None).unwrap(), 1_000);
    }

    #[test]
    fn unlocked_truncates() {
        let e = VestingEntry::new(10, Some(t0()), TimeDelta::seconds(3));
        assert_eq!(e.unlocked(t0() + TimeDelta::seconds(1), None).unwrap(), 3);
    }

    #[test]
    fn zero_duration_unlocks_at_start() {
        let e = VestingEntry::new(42, Some(t0()), TimeDelta::zero());
        assert_eq!(e.unlocked(t0() - TimeDelta::seconds(1), None).unwrap(), 0);
        assert_eq!(e.unlocked(t0(), None).unwrap(), 42);
    }

    #[test]
    fn unanchored_entry_waits_for_baseline() {
        let e = VestingEntry::new(100, None, hours(10));
        let now = t0() + hours(100);
        assert_eq!(e.unlocked(now, None).unwrap(), 0);
        assert_eq!(e.unlocked(t0() + hours(2), Some(t0())).unwrap(), 20);
    }

    // =================================================================
    // Purchase
    // =================================================================

    #[test]
    fn entries_are_additive() {
        let mut p = Purchase::new();
        p.add_entry(VestingEntry::new(1_000, Some(t0()), hours(10)), 20)
            .unwrap();
        p.add_entry(VestingEntry::new(2_000, Some(t0() + hours(2)), hours(10)), 20)
            .unwrap();
        assert_eq!(p.unlocked(t0() + hours(7), None).unwrap(), 1_700);
        assert_eq!(p.total().unwrap(), 3_000);
    }

    #[test]
    fn identical_schedules_merge() {
        let mut p = Purchase::new();
        let e = VestingEntry::new(10, Some(t0()), hours(1));
        p.add_entry(e.clone(), 1).unwrap();
        p.add_entry(e, 1).unwrap();
        assert_eq!(p.entries.len(), 1);
        assert_eq!(p.entries[0].amount, 20);
    }

    #[test]
    fn entry_cap_applies_only_to_new_entries() {
        let mut p = Purchase::new();
        p.add_entry(VestingEntry::new(1, Some(t0()), hours(1)), 1)
            .unwrap();
        let err = p
            .add_entry(VestingEntry::new(1, Some(t0() + hours(1)), hours(1)), 1)
            .unwrap_err();
        assert_eq!(err, BuybackError::PurchaseLimitReached { max: 1 });
        assert_eq!(p.total().unwrap(), 1);
    }

    #[test]
    fn claimable_saturates_and_claims_accumulate() {
        let mut p = Purchase::new();
        p.add_entry(VestingEntry::new(100, Some(t0()), hours(10)), 20)
            .unwrap();
        let now = t0() + hours(4);
        assert_eq!(p.claimable(now, None).unwrap(), 40);
        p.record_claim(40).unwrap();
        assert_eq!(p.claimable(now, None).unwrap(), 0);
        assert_eq!(p.unclaimed().unwrap(), 60);
        assert!(p.record_claim(61).is_err());
        assert_eq!(p.claimed, 40);
    }

    #[test]
    fn vesting_params_entry_start() {
        let by_purchase = VestingParams::new(hours(2), VestingAnchor::Purchase);
        assert_eq!(by_purchase.entry_start(t0()).unwrap(), Some(t0() + hours(2)));
        let by_completion = VestingParams::new(hours(2), VestingAnchor::Completion);
        assert_eq!(by_completion.entry_start(t0()).unwrap(), None);
        assert!(VestingParams::new(hours(-1), VestingAnchor::Purchase)
            .validate()
            .is_err());
    }

    #[test]
    fn anchor_defaults_when_missing_from_json() {
        let params: VestingParams = serde_json::from_str(r#"{"delay":[60,0]}"#).unwrap();
        assert_eq!(params.anchor, VestingAnchor::Purchase);
        assert_eq!(params.delay, TimeDelta::minutes(1));
    }
}
