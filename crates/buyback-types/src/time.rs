//! Block-time helpers.
//!
//! Durations are [`TimeDelta`] values; chrono does not serialize them, so
//! [`duration_serde`] stores them as `[seconds, subsecond_nanos]`.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{BuybackError, Result};

/// Block timestamp type used by every operation.
pub type Timestamp = DateTime<Utc>;

/// Non-negative nanoseconds elapsed from `from` to `to`; zero if `to < from`.
pub fn elapsed_nanos(from: Timestamp, to: Timestamp) -> Result<u128> {
    if to <= from {
        return Ok(0);
    }
    duration_nanos(to - from)
}

/// Length of a non-negative duration in nanoseconds.
pub fn duration_nanos(delta: TimeDelta) -> Result<u128> {
    let nanos = delta
        .num_nanoseconds()
        .ok_or_else(|| BuybackError::Arithmetic(format!("duration {delta} out of range")))?;
    u128::try_from(nanos)
        .map_err(|_| BuybackError::Arithmetic(format!("negative duration {delta}")))
}

/// Add a duration to a timestamp, reporting overflow as an error.
pub fn checked_add(at: Timestamp, delta: TimeDelta) -> Result<Timestamp> {
    at.checked_add_signed(delta)
        .ok_or_else(|| BuybackError::Arithmetic(format!("timestamp overflow: {at} + {delta}")))
}

/// Serde adapter for [`TimeDelta`] fields.
pub mod duration_serde {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(delta: &TimeDelta, s: S) -> Result<S::Ok, S::Error> {
        (delta.num_seconds(), delta.subsec_nanos()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TimeDelta, D::Error> {
        let (secs, nanos) = <(i64, i32)>::deserialize(d)?;
        let nanos = u32::try_from(nanos).map_err(D::Error::custom)?;
        TimeDelta::new(secs, nanos).ok_or_else(|| D::Error::custom("duration out of range"))
    }
}
