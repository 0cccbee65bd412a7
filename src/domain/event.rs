//! Decoded fund events, delivered by the host in chain order.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::domain::{BlockTime, FundId};

/// An event together with the timestamp of the block that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEvent {
    pub block_time: BlockTime,
    pub event: FundEvent,
}

impl ChainEvent {
    pub fn new(block_time: BlockTime, event: FundEvent) -> Self {
        Self { block_time, event }
    }
}

/// Fund-management events. Amounts are raw token integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FundEvent {
    FundCreated {
        fund_id: FundId,
        manager: Address,
    },
    Subscribe {
        fund_id: FundId,
        investor: Address,
    },
    Deposit {
        fund_id: FundId,
        investor: Address,
        token: Address,
        amount: U256,
    },
    /// `amount` leaves the fund to the investor; `fee_amount` stays behind as manager fee.
    Withdraw {
        fund_id: FundId,
        investor: Address,
        token: Address,
        amount: U256,
        fee_amount: U256,
    },
    Swap {
        fund_id: FundId,
        investor: Address,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        amount_out: U256,
    },
    MintPosition {
        fund_id: FundId,
        investor: Address,
        token_id: U256,
    },
    IncreaseLiquidity {
        fund_id: FundId,
        investor: Address,
        token_id: U256,
    },
    DecreaseLiquidity {
        fund_id: FundId,
        investor: Address,
        token_id: U256,
    },
    Collect {
        fund_id: FundId,
        investor: Address,
        token_id: U256,
    },
    ManagerFeeOut {
        fund_id: FundId,
        manager: Address,
        token: Address,
        amount: U256,
    },
}

impl FundEvent {
    pub fn fund_id(&self) -> FundId {
        match self {
            FundEvent::FundCreated { fund_id, .. }
            | FundEvent::Subscribe { fund_id, .. }
            | FundEvent::Deposit { fund_id, .. }
            | FundEvent::Withdraw { fund_id, .. }
            | FundEvent::Swap { fund_id, .. }
            | FundEvent::MintPosition { fund_id, .. }
            | FundEvent::IncreaseLiquidity { fund_id, .. }
            | FundEvent::DecreaseLiquidity { fund_id, .. }
            | FundEvent::Collect { fund_id, .. }
            | FundEvent::ManagerFeeOut { fund_id, .. } => *fund_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FundEvent::FundCreated { .. } => "fund_created",
            FundEvent::Subscribe { .. } => "subscribe",
            FundEvent::Deposit { .. } => "deposit",
            FundEvent::Withdraw { .. } => "withdraw",
            FundEvent::Swap { .. } => "swap",
            FundEvent::MintPosition { .. } => "mint_position",
            FundEvent::IncreaseLiquidity { .. } => "increase_liquidity",
            FundEvent::DecreaseLiquidity { .. } => "decrease_liquidity",
            FundEvent::Collect { .. } => "collect",
            FundEvent::ManagerFeeOut { .. } => "manager_fee_out",
        }
    }
}
