//! Domain primitives: FundId, BlockTime, TokenAmount, EntityKind.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::domain::Decimal;

/// Numeric fund identifier assigned by the fund contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FundId(pub u64);

impl FundId {
    pub const fn new(id: u64) -> Self {
        FundId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FundId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(FundId)
    }
}

/// Block timestamp in seconds since Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockTime(pub i64);

impl BlockTime {
    pub const fn new(secs: i64) -> Self {
        BlockTime(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }
}

/// A raw token amount together with the scale needed to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub token: Address,
    pub raw: U256,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn new(token: Address, raw: U256, decimals: u8) -> Self {
        Self {
            token,
            raw,
            decimals,
        }
    }

    /// Amount in whole-token units, `None` if it exceeds 28 significant digits.
    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_raw_amount(self.raw, self.decimals)
    }
}

/// Kinds of persisted entity; the store keys records by `(kind, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Factory,
    Fund,
    Investor,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Factory => "factory",
            EntityKind::Fund => "fund",
            EntityKind::Investor => "investor",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite investor id: fund id, a dash, then the `0X`-prefixed upper-hex address.
///
/// The format doubles as the store lookup index, so it must never change.
pub fn investor_key(fund_id: FundId, investor: &Address) -> String {
    format!("{}-0X{}", fund_id, hex::encode_upper(investor.as_slice()))
}
