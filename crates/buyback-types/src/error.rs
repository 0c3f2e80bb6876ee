//! Error types for the buyback auction engine.
//!
//! All errors use the `BB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Auction errors
//! - 2xx: Purchase / vesting errors
//! - 3xx: Pricing errors
//! - 4xx: Params / configuration errors
//! - 5xx: Authority errors
//! - 6xx: Ledger errors
//! - 7xx: Invariant errors
//! - 9xx: General / internal errors
//!
//! Every variant maps onto exactly one [`ErrorKind`], which is what the
//! message layer surfaces to callers.

use std::fmt;

use thiserror::Error;

use crate::{Address, AuctionId, PoolId};

/// Coarse error classification surfaced to message senders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    FailedPrecondition,
    PermissionDenied,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::FailedPrecondition => write!(f, "FAILED_PRECONDITION"),
            Self::PermissionDenied => write!(f, "PERMISSION_DENIED"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Central error enum for all buyback operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuybackError {
    // =================================================================
    // Auction Errors (1xx)
    // =================================================================
    /// No auction is stored under this ID.
    #[error("BB_ERR_100: Auction not found: {0}")]
    AuctionNotFound(AuctionId),

    /// The auction parameters failed validation.
    #[error("BB_ERR_101: Invalid auction: {reason}")]
    InvalidAuction { reason: String },

    /// The auction is upcoming or completed.
    #[error("BB_ERR_102: Auction {0} is not active")]
    AuctionNotActive(AuctionId),

    /// The auction has already been completed.
    #[error("BB_ERR_103: Auction {0} already completed")]
    AuctionCompleted(AuctionId),

    /// Requested amount exceeds what is left of the allocation.
    #[error("BB_ERR_104: Insufficient remaining allocation: requested {requested}, remaining {remaining}")]
    InsufficientAllocation { requested: u128, remaining: u128 },

    /// The discount policy is malformed.
    #[error("BB_ERR_105: Invalid discount policy: {reason}")]
    InvalidDiscount { reason: String },

    // =================================================================
    // Purchase / Vesting Errors (2xx)
    // =================================================================
    /// The purchase amount is zero, below the minimum or otherwise unusable.
    #[error("BB_ERR_200: Invalid purchase amount: {reason}")]
    InvalidPurchaseAmount { reason: String },

    /// No purchase exists for this (auction, buyer) pair.
    #[error("BB_ERR_201: No purchase found for {buyer} in auction {auction_id}")]
    PurchaseNotFound { auction_id: AuctionId, buyer: Address },

    /// Nothing is unlocked beyond what was already claimed.
    #[error("BB_ERR_202: No tokens available to claim")]
    NoClaimableTokens,

    /// The requested vesting period matches none of the auction's tiers.
    #[error("BB_ERR_203: Vesting period not found in auction discount options: {period_secs}s")]
    VestingPeriodNotFound { period_secs: i64 },

    /// The buyer reached the per-auction purchase cap.
    #[error("BB_ERR_204: Maximum purchases per user per auction is {max}")]
    PurchaseLimitReached { max: u64 },

    // =================================================================
    // Pricing Errors (3xx)
    // =================================================================
    /// The payment denomination is not in the accepted set.
    #[error("BB_ERR_300: Token {0} not accepted")]
    TokenNotAccepted(String),

    /// The price source could not produce a usable price.
    #[error("BB_ERR_301: Price unavailable for {denom}: {reason}")]
    PriceUnavailable { denom: String, reason: String },

    /// The pool does not pair the token with the base denomination.
    #[error("BB_ERR_302: Invalid pool {pool_id}: {reason}")]
    InvalidPool { pool_id: PoolId, reason: String },

    // =================================================================
    // Params / Configuration Errors (4xx)
    // =================================================================
    /// Module params failed validation.
    #[error("BB_ERR_400: Invalid params: {reason}")]
    InvalidParams { reason: String },

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("BB_ERR_401: Configuration error: {0}")]
    Configuration(String),

    /// Amount or denomination malformed.
    #[error("BB_ERR_402: Invalid coin: {reason}")]
    InvalidCoin { reason: String },

    /// Signer or account address malformed.
    #[error("BB_ERR_403: Invalid address: {reason}")]
    InvalidAddress { reason: String },

    // =================================================================
    // Authority Errors (5xx)
    // =================================================================
    /// The signer is not the configured authority.
    #[error("BB_ERR_500: Invalid authority; expected {expected}, got {actual}")]
    Unauthorized { expected: Address, actual: Address },

    // =================================================================
    // Ledger Errors (6xx)
    // =================================================================
    /// The debited account does not hold enough of a denomination.
    #[error("BB_ERR_600: Insufficient funds in {account}: need {needed}{denom}, have {available}{denom}")]
    InsufficientFunds {
        account: Address,
        denom: String,
        needed: u128,
        available: u128,
    },

    /// The external ledger rejected an operation.
    #[error("BB_ERR_601: Ledger rejected operation: {reason}")]
    LedgerRejected { reason: String },

    // =================================================================
    // Invariant Errors (7xx)
    // =================================================================
    /// Escrow solvency or bookkeeping invariant violated.
    #[error("BB_ERR_700: Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Checked arithmetic overflowed or divided by zero.
    #[error("BB_ERR_900: Arithmetic error: {0}")]
    Arithmetic(String),

    /// Unrecoverable internal error.
    #[error("BB_ERR_901: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("BB_ERR_902: Serialization error: {0}")]
    Serialization(String),
}

impl BuybackError {
    /// The coarse classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAuction { .. }
            | Self::InvalidDiscount { .. }
            | Self::InvalidPurchaseAmount { .. }
            | Self::VestingPeriodNotFound { .. }
            | Self::PurchaseLimitReached { .. }
            | Self::InvalidPool { .. }
            | Self::InvalidParams { .. }
            | Self::InvalidCoin { .. }
            | Self::InvalidAddress { .. } => ErrorKind::InvalidArgument,

            Self::AuctionNotFound(_) | Self::PurchaseNotFound { .. } | Self::TokenNotAccepted(_) => {
                ErrorKind::NotFound
            }

            Self::AuctionNotActive(_)
            | Self::AuctionCompleted(_)
            | Self::InsufficientAllocation { .. }
            | Self::NoClaimableTokens
            | Self::InsufficientFunds { .. }
            | Self::LedgerRejected { .. }
            | Self::PriceUnavailable { .. }
            | Self::InvariantViolation { .. } => ErrorKind::FailedPrecondition,

            Self::Unauthorized { .. } => ErrorKind::PermissionDenied,

            Self::Configuration(_)
            | Self::Arithmetic(_)
            | Self::Internal(_)
            | Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BuybackError>;

impl From<serde_json::Error> for BuybackError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = BuybackError::AuctionNotFound(AuctionId(7));
        let msg = format!("{err}");
        assert!(msg.starts_with("BB_ERR_100"), "Got: {msg}");
        assert!(msg.contains("auction:7"));
    }

    #[test]
    fn no_claimable_message_is_stable() {
        let msg = BuybackError::NoClaimableTokens.to_string();
        assert_eq!(msg, "BB_ERR_202: No tokens available to claim");
    }

    #[test]
    fn insufficient_funds_display() {
        let err = BuybackError::InsufficientFunds {
            account: Address::new("buyer"),
            denom: "usdc".into(),
            needed: 100,
            available: 50,
        };
        let msg = format!("{err}");
        assert!(msg.contains("BB_ERR_600"));
        assert!(msg.contains("100usdc"));
        assert!(msg.contains("50usdc"));
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            BuybackError::AuctionNotFound(AuctionId(1)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            BuybackError::TokenNotAccepted("uatom".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            BuybackError::VestingPeriodNotFound { period_secs: 60 }.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            BuybackError::AuctionCompleted(AuctionId(1)).kind(),
            ErrorKind::FailedPrecondition
        );
        assert_eq!(
            BuybackError::NoClaimableTokens.kind(),
            ErrorKind::FailedPrecondition
        );
        assert_eq!(
            BuybackError::Unauthorized {
                expected: Address::new("gov"),
                actual: Address::new("eve"),
            }
            .kind(),
            ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn all_errors_have_bb_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(BuybackError::NoClaimableTokens),
            Box::new(BuybackError::AuctionNotActive(AuctionId(2))),
            Box::new(BuybackError::Internal("test".into())),
            Box::new(BuybackError::Arithmetic("overflow".into())),
            Box::new(BuybackError::InvariantViolation {
                reason: "a".into(),
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("BB_ERR_"),
                "Error missing BB_ERR_ prefix: {msg}"
            );
        }
    }
}
