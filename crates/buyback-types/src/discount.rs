//! Discount policies and the pure discount engine.
//!
//! A policy maps `(start, end, now, requested vesting period)` onto the
//! discount applied to the base price and the vesting period granted to the
//! buyer.
//!
//! ```text
//!  discount
//!     max ┤                  ┌──────────
//!         │               ╱
//!         │            ╱          Linear: initial → max over [start, end]
//! initial ┤─────────╱
//!         └─────────┬────────┬──────────► now
//!                 start     end
//!
//!  Fixed:  [(10%, 30d), (30%, 90d)]  ── requested 90d ──►  (30%, 90d)
//! ```

use std::collections::BTreeSet;

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BuybackError, Result};
use crate::math::{from_atto, mul_div_floor, to_atto};
use crate::time::{Timestamp, duration_nanos, duration_serde, elapsed_nanos};

/// One entry of a tiered (fixed) discount policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountTier {
    pub discount: Decimal,
    #[serde(with = "duration_serde")]
    pub vesting_period: TimeDelta,
}

impl DiscountTier {
    #[must_use]
    pub fn new(discount: Decimal, vesting_period: TimeDelta) -> Self {
        Self {
            discount,
            vesting_period,
        }
    }
}

/// How an auction prices its tokens over time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountPolicy {
    /// Discount grows linearly from `initial_discount` to `max_discount`.
    Linear {
        initial_discount: Decimal,
        max_discount: Decimal,
        #[serde(with = "duration_serde")]
        vesting_period: TimeDelta,
    },
    /// The buyer picks one of a fixed set of (discount, vesting period) tiers.
    Fixed { tiers: Vec<DiscountTier> },
}

impl DiscountPolicy {
    /// Check discount bounds, ordering, and vesting periods.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Linear {
                initial_discount,
                max_discount,
                vesting_period,
            } => {
                check_fraction("initial discount", *initial_discount)?;
                check_fraction("max discount", *max_discount)?;
                if initial_discount > max_discount {
                    return Err(invalid(format!(
                        "initial discount {initial_discount} exceeds max discount {max_discount}"
                    )));
                }
                check_period(*vesting_period)
            }
            Self::Fixed { tiers } => {
                if tiers.is_empty() {
                    return Err(invalid("at least one discount tier is required".into()));
                }
                let mut seen = BTreeSet::new();
                for tier in tiers {
                    check_fraction("tier discount", tier.discount)?;
                    check_period(tier.vesting_period)?;
                    if !seen.insert(tier.vesting_period) {
                        return Err(invalid(format!(
                            "duplicate vesting period {}s",
                            tier.vesting_period.num_seconds()
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Resolve the discount and vesting period at `now`.
    ///
    /// Linear policies ignore `requested` and return their own period.
    /// Fixed policies require `requested` to match a tier exactly.
    pub fn discount(
        &self,
        start: Timestamp,
        end: Timestamp,
        now: Timestamp,
        requested: Option<TimeDelta>,
    ) -> Result<(Decimal, TimeDelta)> {
        match self {
            Self::Linear {
                initial_discount,
                max_discount,
                vesting_period,
            } => {
                let discount = linear_discount(*initial_discount, *max_discount, start, end, now)?;
                Ok((discount, *vesting_period))
            }
            Self::Fixed { tiers } => {
                let period = requested.unwrap_or_else(TimeDelta::zero);
                tiers
                    .iter()
                    .find(|t| t.vesting_period == period)
                    .map(|t| (t.discount, t.vesting_period))
                    .ok_or(BuybackError::VestingPeriodNotFound {
                        period_secs: period.num_seconds(),
                    })
            }
        }
    }

    /// The live discount of a linear policy; `None` for tiered policies.
    pub fn current_discount(
        &self,
        start: Timestamp,
        end: Timestamp,
        now: Timestamp,
    ) -> Result<Option<Decimal>> {
        match self {
            Self::Linear {
                initial_discount,
                max_discount,
                ..
            } => linear_discount(*initial_discount, *max_discount, start, end, now).map(Some),
            Self::Fixed { .. } => Ok(None),
        }
    }
}

fn linear_discount(
    initial: Decimal,
    max: Decimal,
    start: Timestamp,
    end: Timestamp,
    now: Timestamp,
) -> Result<Decimal> {
    if now < start {
        return Ok(initial);
    }
    if now >= end {
        return Ok(max);
    }
    let total = duration_nanos(end - start)?;
    let elapsed = elapsed_nanos(start, now)?;
    let range = to_atto(max)?
        .checked_sub(to_atto(initial)?)
        .ok_or_else(|| invalid("initial discount exceeds max discount".into()))?;
    let step = from_atto(mul_div_floor(range, elapsed, total)?)?;
    Ok(initial + step)
}

fn check_fraction(what: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() || value >= Decimal::ONE {
        return Err(invalid(format!("{what} {value} must be in [0, 1)")));
    }
    Ok(())
}

fn check_period(period: TimeDelta) -> Result<()> {
    if period <= TimeDelta::zero() {
        return Err(invalid("vesting period must be positive".into()));
    }
    Ok(())
}

fn invalid(reason: String) -> BuybackError {
    BuybackError::InvalidDiscount { reason }
}

#[cfg(any(test, feature = "test-helpers"))]
impl DiscountPolicy {
    /// Linear policy with a one-day vesting period.
    #[must_use]
    pub fn dummy_linear(initial: Decimal, max: Decimal) -> Self {
        Self::Linear {
            initial_discount: initial,
            max_discount: max,
            vesting_period: TimeDelta::days(1),
        }
    }

    /// Two-tier policy: 10% for 30 days, 30% for 90 days.
    #[must_use]
    pub fn dummy_fixed() -> Self {
        Self::Fixed {
            tiers: vec![
                DiscountTier::new(Decimal::new(1, 1), TimeDelta::days(30)),
                DiscountTier::new(Decimal::new(3, 1), TimeDelta::days(90)),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn linear() -> DiscountPolicy {
        DiscountPolicy::dummy_linear(dec("0.05"), dec("0.5"))
    }

    // =================================================================
    // Linear
    // =================================================================

    #[test]
    fn linear_endpoints() {
        let start = t0();
        let end = start + TimeDelta::hours(24);
        let p = linear();
        let before = start - TimeDelta::seconds(1);
        assert_eq!(p.discount(start, end, before, None).unwrap().0, dec("0.05"));
        assert_eq!(p.discount(start, end, start, None).unwrap().0, dec("0.05"));
        assert_eq!(p.discount(start, end, end, None).unwrap().0, dec("0.5"));
        let after = end + TimeDelta::days(3);
        assert_eq!(p.discount(start, end, after, None).unwrap().0, dec("0.5"));
    }

    #[test]
    fn linear_midpoint_and_period() {
        let start = t0();
        let end = start + TimeDelta::hours(24);
        let (d, period) = linear()
            .discount(start, end, start + TimeDelta::hours(12), Some(TimeDelta::days(99)))
            .unwrap();
        assert_eq!(d, dec("0.275"));
        assert_eq!(period, TimeDelta::days(1));
    }

    #[test]
    fn linear_truncates_to_eighteen_digits() {
        let start = t0();
        let end = start + TimeDelta::seconds(3);
        let p = DiscountPolicy::dummy_linear(Decimal::ZERO, dec("0.1"));
        let d = p.discount(start, end, start + TimeDelta::seconds(1), None).unwrap().0;
        assert_eq!(d, dec("0.033333333333333333"));
    }

    #[test]
    fn zero_duration_auction_resolves_to_max() {
        let start = t0();
        let p = linear();
        assert_eq!(p.discount(start, start, start, None).unwrap().0, dec("0.5"));
        let before = start - TimeDelta::seconds(1);
        assert_eq!(p.discount(start, start, before, None).unwrap().0, dec("0.05"));
    }

    #[test]
    fn linear_is_monotone() {
        let start = t0();
        let end = start + TimeDelta::minutes(17);
        let p = linear();
        let mut last = Decimal::ZERO;
        for s in 0..=(17 * 60) {
            let now = start + TimeDelta::seconds(s);
            let d = p.discount(start, end, now, None).unwrap().0;
            assert!(d >= last, "discount decreased at {s}s: {d} < {last}");
            last = d;
        }
        assert_eq!(last, dec("0.5"));
    }

    // =================================================================
    // Fixed
    // =================================================================

    #[test]
    fn fixed_matches_tier_exactly() {
        let start = t0();
        let end = start + TimeDelta::days(1);
        let p = DiscountPolicy::dummy_fixed();
        let (d, period) = p
            .discount(start, end, start, Some(TimeDelta::days(90)))
            .unwrap();
        assert_eq!(d, dec("0.3"));
        assert_eq!(period, TimeDelta::days(90));
        assert_eq!(p.current_discount(start, end, start).unwrap(), None);
    }

    #[test]
    fn fixed_unknown_period_fails() {
        let start = t0();
        let p = DiscountPolicy::dummy_fixed();
        let err = p
            .discount(start, start, start, Some(TimeDelta::days(45)))
            .unwrap_err();
        assert_eq!(
            err,
            BuybackError::VestingPeriodNotFound {
                period_secs: 45 * 86_400
            }
        );
        assert!(p.discount(start, start, start, None).is_err());
    }

    // =================================================================
    // Validation
    // =================================================================

    #[test]
    fn validate_rejects_bad_policies() {
        assert!(linear().validate().is_ok());
        assert!(DiscountPolicy::dummy_fixed().validate().is_ok());

        let inverted = DiscountPolicy::dummy_linear(dec("0.6"), dec("0.5"));
        assert!(inverted.validate().is_err());

        let full = DiscountPolicy::dummy_linear(Decimal::ZERO, Decimal::ONE);
        assert!(full.validate().is_err());

        let negative = DiscountPolicy::dummy_linear(dec("-0.1"), dec("0.5"));
        assert!(negative.validate().is_err());

        let no_vesting = DiscountPolicy::Linear {
            initial_discount: Decimal::ZERO,
            max_discount: dec("0.5"),
            vesting_period: TimeDelta::zero(),
        };
        assert!(no_vesting.validate().is_err());

        let empty = DiscountPolicy::Fixed { tiers: vec![] };
        assert!(empty.validate().is_err());

        let dup = DiscountPolicy::Fixed {
            tiers: vec![
                DiscountTier::new(dec("0.1"), TimeDelta::days(30)),
                DiscountTier::new(dec("0.2"), TimeDelta::days(30)),
            ],
        };
        assert!(dup.validate().is_err());
    }

    #[test]
    fn policy_serde_is_tagged() {
        let json = serde_json::to_value(DiscountPolicy::dummy_fixed()).unwrap();
        assert_eq!(json["type"], "fixed");
        let back: DiscountPolicy = serde_json::from_value(json).unwrap();
        assert_eq!(back, DiscountPolicy::dummy_fixed());
    }
}
