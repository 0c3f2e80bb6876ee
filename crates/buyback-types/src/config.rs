//! Static module configuration.
//!
//! Loaded once at construction, usually from a JSON file:
//!
//! ```json
//! {
//!   "base_denom": "adym",
//!   "authority": "gov",
//!   "escrow_account": "buyback",
//!   "treasury_account": "treasury",
//!   "pump_account": "pump"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BuybackError, Result};
use crate::ids::Address;

/// Accounts and denomination the engine operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Denomination of the token being sold.
    pub base_denom: String,
    /// The only signer allowed to run privileged messages.
    pub authority: Address,
    /// Module account holding allocations and proceeds.
    pub escrow_account: Address,
    /// Funds auctions and receives unsold remainders.
    pub treasury_account: Address,
    /// Receives proceeds handed to the pump scheduler.
    pub pump_account: Address,
}

impl ModuleConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| BuybackError::Configuration(format!("invalid config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BuybackError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_denom.trim().is_empty() {
            return Err(BuybackError::Configuration("base_denom is empty".into()));
        }
        let accounts = [
            ("authority", &self.authority),
            ("escrow_account", &self.escrow_account),
            ("treasury_account", &self.treasury_account),
            ("pump_account", &self.pump_account),
        ];
        for (name, addr) in accounts {
            if addr.is_empty() {
                return Err(BuybackError::Configuration(format!("{name} is empty")));
            }
        }
        if self.escrow_account == self.treasury_account || self.escrow_account == self.pump_account
        {
            return Err(BuybackError::Configuration(
                "escrow_account must differ from treasury_account and pump_account".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl ModuleConfig {
    /// Config selling `adym` with accounts named after their role.
    #[must_use]
    pub fn dummy() -> Self {
        Self {
            base_denom: "adym".into(),
            authority: Address::new("gov"),
            escrow_account: Address::new("buyback"),
            treasury_account: Address::new("treasury"),
            pump_account: Address::new("pump"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documented_example() {
        let json = r#"{
            "base_denom": "adym",
            "authority": "gov",
            "escrow_account": "buyback",
            "treasury_account": "treasury",
            "pump_account": "pump"
        }"#;
        let cfg = ModuleConfig::from_json(json).unwrap();
        assert_eq!(cfg, ModuleConfig::dummy());
    }

    #[test]
    fn missing_field_is_configuration_error() {
        let err = ModuleConfig::from_json(r#"{"base_denom":"adym"}"#).unwrap_err();
        assert!(matches!(err, BuybackError::Configuration(_)));
        assert!(err.to_string().starts_with("BB_ERR_401"));
    }

    #[test]
    fn shared_escrow_is_rejected() {
        let mut cfg = ModuleConfig::dummy();
        cfg.treasury_account = cfg.escrow_account.clone();
        assert!(cfg.validate().is_err());
        let mut cfg = ModuleConfig::dummy();
        cfg.base_denom = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unreadable_path_is_configuration_error() {
        let err = ModuleConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, BuybackError::Configuration(_)));
    }
}
