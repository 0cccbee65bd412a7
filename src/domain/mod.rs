//! Domain types for fund valuation and investor accounting.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Domain primitives: FundId, BlockTime, TokenAmount, EntityKind
//! - Fund, factory and investor records with their token lists
//! - Position snapshots and decoded fund events

pub mod decimal;
pub mod event;
pub mod fund;
pub mod investor;
pub mod position;
pub mod primitives;
pub mod token_list;

pub use alloy_primitives::{Address, U256};
pub(crate) use decimal::pow10;
pub use decimal::Decimal;
pub use event::{ChainEvent, FundEvent};
pub use fund::{FactoryState, FundState, FACTORY_ID};
pub use investor::InvestorState;
pub use position::{PositionInfo, PositionSnapshot, Slot0};
pub use primitives::{investor_key, BlockTime, EntityKind, FundId, TokenAmount};
pub use token_list::{TokenEntry, TokenList};
