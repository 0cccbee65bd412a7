//! Holdings refresh: fund and investor token balances, and pooled positions.

use crate::datasource::{symbol_or_unknown, ChainSource};
use crate::domain::{
    Address, Decimal, FactoryState, FundId, FundState, InvestorState, PositionSnapshot, TokenList,
    U256,
};
use crate::engine::{value_position, Valuation, ValueOverflow};
use crate::orchestration::ledger::LedgerError;
use crate::orchestration::price_oracle::{token_decimals, PriceOracle};
use std::collections::HashMap;

/// Prices looked up during one event, so each token is priced once.
#[derive(Debug)]
pub struct PriceBook<'a> {
    oracle: &'a PriceOracle,
    reference_prices: HashMap<Address, Decimal>,
    reference_in_display: Option<Decimal>,
}

impl<'a> PriceBook<'a> {
    pub fn new(oracle: &'a PriceOracle) -> Self {
        Self {
            oracle,
            reference_prices: HashMap::new(),
            reference_in_display: None,
        }
    }

    /// Nonzero price of one whole `token` in the reference currency.
    pub async fn reference_price(&mut self, token: Address) -> Result<Decimal, LedgerError> {
        if let Some(price) = self.reference_prices.get(&token) {
            return Ok(*price);
        }
        let price = self.oracle.require_price_in_reference(token).await?;
        self.reference_prices.insert(token, price);
        Ok(price)
    }

    /// Nonzero price of one reference token in the display currency.
    pub async fn display_rate(&mut self) -> Result<Decimal, LedgerError> {
        if let Some(rate) = self.reference_in_display {
            return Ok(rate);
        }
        let rate = self.oracle.require_reference_in_display().await?;
        self.reference_in_display = Some(rate);
        Ok(rate)
    }

    /// Value of a whole-token amount in both currencies.
    ///
    /// `AmountOverflow` when either value leaves the decimal range.
    pub async fn value(
        &mut self,
        token: Address,
        amount: Decimal,
    ) -> Result<Valuation, LedgerError> {
        let price = self.reference_price(token).await?;
        let rate = self.display_rate().await?;
        let reference = amount
            .checked_mul(price)
            .ok_or(LedgerError::AmountOverflow(token))?;
        let display = reference
            .checked_mul(rate)
            .ok_or(LedgerError::AmountOverflow(token))?;
        Ok(Valuation::new(reference, display))
    }

    /// Value `amount` of `token` and add it to `total`.
    async fn accumulate(
        &mut self,
        total: Valuation,
        token: Address,
        amount: Decimal,
    ) -> Result<Valuation, LedgerError> {
        let value = self.value(token, amount).await?;
        total
            .checked_add(value)
            .ok_or(LedgerError::AmountOverflow(token))
    }
}

/// Raw token integer as a whole-token decimal.
pub(crate) fn whole_amount(
    token: Address,
    raw: U256,
    decimals: u8,
) -> Result<Decimal, LedgerError> {
    Decimal::from_raw_amount(raw, decimals).ok_or(LedgerError::AmountOverflow(token))
}

/// Make sure `token` is listed, reading its metadata when first observed.
///
/// Returns the token's decimals.
pub async fn ensure_listed(
    chain: &dyn ChainSource,
    tokens: &mut TokenList,
    token: Address,
) -> Result<u8, LedgerError> {
    if let Some(decimals) = tokens.decimals_of(&token) {
        return Ok(decimals);
    }
    let decimals = token_decimals(chain, token).await?;
    let symbol = symbol_or_unknown(chain, token).await;
    tracing::debug!(%token, %symbol, decimals, "token listed");
    tokens.insert(token, symbol, decimals);
    Ok(decimals)
}

/// Re-read every held token's balance and re-value the fund.
///
/// Tokens whose balance is exactly zero are dropped. The factory totals swap
/// the fund's old value for the new one.
pub async fn refresh_fund_current_value(
    chain: &dyn ChainSource,
    book: &mut PriceBook<'_>,
    fund: &mut FundState,
    factory: &mut FactoryState,
) -> Result<(), LedgerError> {
    let mut tokens = fund.tokens.clone();
    let mut total = Valuation::zero();

    for entry in fund.tokens.entries() {
        let raw = chain.fund_token_balance(fund.id, entry.address).await?;
        if raw.is_zero() {
            tokens.remove(&entry.address);
            continue;
        }
        let amount = whole_amount(entry.address, raw, entry.decimals)?;
        total = book.accumulate(total, entry.address, amount).await?;
        tokens.set_amount(&entry.address, amount);
    }

    factory
        .replace_fund_value(
            fund.current_reference,
            fund.current_display,
            total.reference,
            total.display,
        )
        .ok_or(LedgerError::ValueOverflow(ValueOverflow))?;
    fund.tokens = tokens;
    fund.current_reference = total.reference;
    fund.current_display = total.display;
    Ok(())
}

/// Re-value an investor's share of the fund's tokens.
///
/// The investor's token snapshot is rebuilt from `fund_tokens`, keeping only
/// tokens with a nonzero share.
pub async fn refresh_investor_holdings(
    chain: &dyn ChainSource,
    book: &mut PriceBook<'_>,
    investor: &mut InvestorState,
    fund_tokens: &TokenList,
) -> Result<(), LedgerError> {
    let mut tokens = TokenList::new();
    let mut total = Valuation::zero();

    for entry in fund_tokens.entries() {
        let raw = chain
            .investor_token_balance(investor.fund_id, investor.investor, entry.address)
            .await?;
        if raw.is_zero() {
            continue;
        }
        let amount = whole_amount(entry.address, raw, entry.decimals)?;
        total = book.accumulate(total, entry.address, amount).await?;
        tokens.insert(entry.address, entry.symbol, entry.decimals);
        tokens.set_amount(&entry.address, amount);
    }

    investor.tokens = tokens;
    investor.current_reference = total.reference;
    investor.current_display = total.display;
    Ok(())
}

/// Value of every liquidity position an investor holds through the fund.
pub async fn pooled_value(
    chain: &dyn ChainSource,
    book: &mut PriceBook<'_>,
    fund_id: FundId,
    investor: Address,
) -> Result<Valuation, LedgerError> {
    let mut total = Valuation::zero();

    for token_id in chain.investor_position_ids(fund_id, investor).await? {
        let position = chain.position(token_id).await?;
        let pool = chain
            .pool_address(position.token0, position.token1, position.fee)
            .await?
            .ok_or(LedgerError::MissingPool(token_id))?;
        let slot0 = chain.slot0(pool).await?;

        let snapshot = PositionSnapshot::new(position, slot0);
        let (amount0, amount1) = value_position(&snapshot);

        for (token, raw) in [(snapshot.token0, amount0), (snapshot.token1, amount1)] {
            if raw.is_zero() {
                continue;
            }
            let decimals = token_decimals(chain, token).await?;
            let amount = whole_amount(token, raw, decimals)?;
            total = book.accumulate(total, token, amount).await?;
        }
    }

    Ok(total)
}
