//! Module-wide constants for the buyback engine.

/// Fractional digits carried by every price and discount.
pub const PRECISION: u32 = 18;

/// `10^PRECISION`: the fixed-point representation of `1.0`.
pub const ONE: u128 = 1_000_000_000_000_000_000;

/// Default EMA smoothing factor, as (mantissa, scale): `0.1`.
pub const DEFAULT_EMA_SMOOTHING: (i64, u32) = (1, 1);

/// Default cap on distinct vesting entries per buyer per auction.
pub const DEFAULT_MAX_PURCHASE_NUMBER: u64 = 20;

/// Default minimum purchase amount (base-token units).
pub const DEFAULT_MIN_PURCHASE_AMOUNT: u128 = 0;

/// Default minimum sold delta between two interval pumps.
pub const DEFAULT_MIN_SOLD_DIFFERENCE_TO_PUMP: u128 = 0;

/// Completion reason used when sold reaches allocation, or the remainder
/// drops below the minimum purchase amount.
pub const REASON_SOLD_OUT: &str = "auction_sold_out";

/// Completion reason used when the scheduler observes `end_time < now`.
pub const REASON_COMPLETED: &str = "auction_completed";

/// Completion reason used when the authority terminates an auction.
pub const REASON_TERMINATED: &str = "auction_terminated";
