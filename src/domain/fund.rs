//! Fund and factory aggregate records.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::domain::{BlockTime, Decimal, FundId, TokenList};

/// Id of the single factory record.
pub const FACTORY_ID: &str = "factory";

/// Derived state of one fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundState {
    pub id: FundId,
    pub manager: Address,
    pub created_at: BlockTime,
    pub updated_at: BlockTime,
    pub investor_count: u64,
    pub tx_count: u64,
    /// Current value of all held tokens in the reference currency.
    pub current_reference: Decimal,
    /// Current value of all held tokens in the display currency.
    pub current_display: Decimal,
    pub tokens: TokenList,
    /// Manager fees accrued inside the fund and not yet paid out.
    pub fee_tokens: TokenList,
}

impl FundState {
    /// A freshly created fund with no holdings.
    pub fn new(id: FundId, manager: Address, created_at: BlockTime) -> Self {
        Self {
            id,
            manager,
            created_at,
            updated_at: created_at,
            investor_count: 0,
            tx_count: 0,
            current_reference: Decimal::zero(),
            current_display: Decimal::zero(),
            tokens: TokenList::new(),
            fee_tokens: TokenList::new(),
        }
    }

    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

/// Protocol-wide rollup across all funds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryState {
    pub fund_count: u64,
    pub investor_count: u64,
    pub total_current_reference: Decimal,
    pub total_current_display: Decimal,
}

impl FactoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap one fund's old contribution to the totals for its new one.
    ///
    /// Returns `None`, leaving the totals as they were, when a total overflows.
    pub fn replace_fund_value(
        &mut self,
        old_reference: Decimal,
        old_display: Decimal,
        new_reference: Decimal,
        new_display: Decimal,
    ) -> Option<()> {
        let reference = self
            .total_current_reference
            .checked_sub(old_reference)?
            .checked_add(new_reference)?;
        let display = self
            .total_current_display
            .checked_sub(old_display)?
            .checked_add(new_display)?;
        self.total_current_reference = reference;
        self.total_current_display = display;
        Some(())
    }
}
