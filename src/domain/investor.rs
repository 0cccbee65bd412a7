//! Investor-in-fund record.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::domain::{investor_key, BlockTime, Decimal, FundId, TokenList};

/// Accounting state of one investor inside one fund.
///
/// `profit_* = current_* + pooled_* - principal_*` holds after every update;
/// the engine recomputes profit rather than adjusting it incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorState {
    pub fund_id: FundId,
    pub investor: Address,
    pub is_manager: bool,
    pub created_at: BlockTime,
    pub updated_at: BlockTime,
    pub principal_reference: Decimal,
    pub principal_display: Decimal,
    /// Value of the investor's share of fund token balances.
    pub current_reference: Decimal,
    pub current_display: Decimal,
    /// Value parked in concentrated-liquidity positions.
    pub pooled_reference: Decimal,
    pub pooled_display: Decimal,
    pub profit_reference: Decimal,
    pub profit_display: Decimal,
    /// Profit as a percentage of principal.
    pub profit_ratio_reference: Decimal,
    pub profit_ratio_display: Decimal,
    pub tokens: TokenList,
}

impl InvestorState {
    pub fn new(fund_id: FundId, investor: Address, is_manager: bool, created_at: BlockTime) -> Self {
        Self {
            fund_id,
            investor,
            is_manager,
            created_at,
            updated_at: created_at,
            principal_reference: Decimal::zero(),
            principal_display: Decimal::zero(),
            current_reference: Decimal::zero(),
            current_display: Decimal::zero(),
            pooled_reference: Decimal::zero(),
            pooled_display: Decimal::zero(),
            profit_reference: Decimal::zero(),
            profit_display: Decimal::zero(),
            profit_ratio_reference: Decimal::zero(),
            profit_ratio_display: Decimal::zero(),
            tokens: TokenList::new(),
        }
    }

    pub fn key(&self) -> String {
        investor_key(self.fund_id, &self.investor)
    }
}
