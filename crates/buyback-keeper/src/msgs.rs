//! Messages accepted by the module.
//!
//! Every message names its signer. Privileged messages are accepted only
//! when the signer equals the configured authority.

use buyback_types::{
    AcceptedTokenConfig, Address, AuctionId, BuybackError, Coin, DiscountPolicy, Params,
    PumpParams, Result, Timestamp, VestingParams, time::duration_serde,
};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Open a new auction funded from the treasury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateAuction {
    pub authority: Address,
    pub allocation: u128,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub discount: DiscountPolicy,
    pub vesting: VestingParams,
    pub pump: PumpParams,
}

/// Close an auction early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTerminateAuction {
    pub authority: Address,
    pub auction_id: AuctionId,
}

/// Buy an exact amount of base tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBuy {
    pub buyer: Address,
    pub auction_id: AuctionId,
    pub amount: u128,
    pub denom: String,
    /// Required for tiered auctions; ignored by linear ones.
    #[serde(default, with = "optional_duration")]
    pub vesting_period: Option<TimeDelta>,
}

/// Spend an exact payment, buying as many tokens as it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBuyExactSpend {
    pub buyer: Address,
    pub auction_id: AuctionId,
    pub payment: Coin,
    #[serde(default, with = "optional_duration")]
    pub vesting_period: Option<TimeDelta>,
}

/// Withdraw everything vested so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgClaimTokens {
    pub claimer: Address,
    pub auction_id: AuctionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateParams {
    pub authority: Address,
    pub params: Params,
}

/// Replace the whole accepted-token set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetAcceptedTokens {
    pub authority: Address,
    pub tokens: Vec<AcceptedTokenConfig>,
}

pub(crate) fn require_signer(signer: &Address, role: &str) -> Result<()> {
    if signer.is_empty() {
        return Err(BuybackError::InvalidAddress {
            reason: format!("{role} address must not be empty"),
        });
    }
    Ok(())
}

mod optional_duration {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::duration_serde;

    pub fn serialize<S: Serializer>(v: &Option<TimeDelta>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(delta) => duration_serde::serialize(delta, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TimeDelta>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "duration_serde")] TimeDelta);
        Ok(Option::<Wrapped>::deserialize(d)?.map(|Wrapped(delta)| delta))
    }
}
