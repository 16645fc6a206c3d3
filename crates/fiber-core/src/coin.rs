//! Per-network constants for the fiber coin family.
//!
//! Every network speaks the same protocol, so differences are data:
//! a name used as the wallet coin type, a ticker symbol, and amount precision.

use serde::{Deserialize, Serialize};

use crate::amount;
use crate::error::AmountError;

/// Droplet exponent shared by the family: 1 coin = 10^6 droplets.
pub const DROPLET_DECIMALS: u32 = 6;

/// Decimal places a spend may use on the family's networks.
pub const MAX_SPEND_DECIMALS: u32 = 3;

/// Constants describing one network in the family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinConfig {
    /// Coin type, e.g. `"skycoin"`. Prefixes wallet ids.
    pub name: String,
    /// Ticker symbol, e.g. `"SKY"`.
    pub symbol: String,
    /// Droplet exponent.
    pub decimals: u32,
    /// Maximum decimal places permitted in a spend amount.
    pub max_decimals: u32,
}

impl CoinConfig {
    pub fn new(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals: DROPLET_DECIMALS,
            max_decimals: MAX_SPEND_DECIMALS,
        }
    }

    /// The networks supported out of the box.
    pub fn builtin() -> Vec<CoinConfig> {
        [
            ("skycoin", "SKY"),
            ("samos", "SAMOS"),
            ("spo", "SPO"),
            ("suncoin", "SUN"),
            ("shellcoin", "SH"),
            ("mzcoin", "MZC"),
            ("aynrandcoin", "ARC"),
            ("mdl", "MDL"),
        ]
        .into_iter()
        .map(|(name, symbol)| Self::new(name, symbol))
        .collect()
    }

    /// Find a builtin network by coin type.
    pub fn builtin_by_name(name: &str) -> Option<CoinConfig> {
        Self::builtin().into_iter().find(|c| c.name == name)
    }

    /// Parse a decimal amount string into droplets.
    pub fn parse_amount(&self, s: &str) -> Result<u64, AmountError> {
        amount::parse_droplets(s, self.decimals)
    }

    /// Format droplets for display.
    pub fn format_amount(&self, droplets: u64) -> String {
        amount::format_droplets(droplets, self.decimals)
    }

    /// Reject spend amounts finer than `max_decimals`.
    pub fn check_precision(&self, droplets: u64) -> Result<(), AmountError> {
        amount::check_precision(droplets, self.decimals, self.max_decimals)
    }
}
