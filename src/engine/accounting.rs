use thiserror::Error;

use crate::domain::{Decimal, InvestorState};

/// How an event affects an investor's principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountingKind {
    /// Principal grows by the deposited value.
    Deposit,
    /// Principal shrinks by the fraction of total value withdrawn.
    Withdraw,
    /// Swaps and liquidity changes: principal is untouched.
    Neutral,
}

/// A principal, profit or total left the representable decimal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("accounting value out of range")]
pub struct ValueOverflow;

/// A value expressed in both the reference and the display currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Valuation {
    pub reference: Decimal,
    pub display: Decimal,
}

impl Valuation {
    pub fn new(reference: Decimal, display: Decimal) -> Self {
        Self { reference, display }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Component-wise sum, `None` if either currency overflows.
    pub fn checked_add(self, rhs: Valuation) -> Option<Valuation> {
        Some(Valuation {
            reference: self.reference.checked_add(rhs.reference)?,
            display: self.display.checked_add(rhs.display)?,
        })
    }
}

/// Apply one event to an investor whose current holdings are already refreshed.
///
/// `amount` is the value deposited or withdrawn (ignored for neutral events),
/// `pooled` the value of the investor's liquidity positions after the event.
/// On overflow the investor is left as it was.
pub fn apply_accounting_event(
    investor: &mut InvestorState,
    kind: AccountingKind,
    amount: Valuation,
    pooled: Valuation,
) -> Result<(), ValueOverflow> {
    let mut next = investor.clone();
    next.pooled_reference = pooled.reference;
    next.pooled_display = pooled.display;

    match kind {
        AccountingKind::Deposit => {
            next.principal_reference = next
                .principal_reference
                .checked_add(amount.reference)
                .ok_or(ValueOverflow)?;
            next.principal_display = next
                .principal_display
                .checked_add(amount.display)
                .ok_or(ValueOverflow)?;
        }
        AccountingKind::Withdraw => {
            next.principal_reference = reduce_principal(
                next.principal_reference,
                next.current_reference,
                pooled.reference,
                amount.reference,
            )
            .ok_or(ValueOverflow)?;
            next.principal_display = reduce_principal(
                next.principal_display,
                next.current_display,
                pooled.display,
                amount.display,
            )
            .ok_or(ValueOverflow)?;
        }
        AccountingKind::Neutral => {}
    }

    recompute_profit(&mut next)?;
    *investor = next;
    Ok(())
}

/// Shrink principal by the share of pre-withdrawal value that was withdrawn.
///
/// The pre-withdrawal total is rebuilt as remaining holdings plus the amount
/// taken out; a full withdrawal gives a ratio of exactly one.
fn reduce_principal(
    principal: Decimal,
    current: Decimal,
    pooled: Decimal,
    withdrawn: Decimal,
) -> Option<Decimal> {
    let prior_total = current.checked_add(pooled)?.checked_add(withdrawn)?;
    let withdraw_ratio = withdrawn.safe_div(prior_total);
    principal.checked_mul(Decimal::one().checked_sub(withdraw_ratio)?)
}

/// `100 * part / whole`, zero when `whole` is zero.
fn percent(part: Decimal, whole: Decimal) -> Option<Decimal> {
    match Decimal::hundred().checked_mul(part) {
        Some(scaled) => Some(scaled.safe_div(whole)),
        None => part.safe_div(whole).checked_mul(Decimal::hundred()),
    }
}

/// Recompute profit and profit ratio from scratch in both currencies.
pub fn recompute_profit(investor: &mut InvestorState) -> Result<(), ValueOverflow> {
    let profit_reference = investor
        .current_reference
        .checked_add(investor.pooled_reference)
        .and_then(|held| held.checked_sub(investor.principal_reference))
        .ok_or(ValueOverflow)?;
    let profit_display = investor
        .current_display
        .checked_add(investor.pooled_display)
        .and_then(|held| held.checked_sub(investor.principal_display))
        .ok_or(ValueOverflow)?;
    let ratio_reference =
        percent(profit_reference, investor.principal_reference).ok_or(ValueOverflow)?;
    let ratio_display = percent(profit_display, investor.principal_display).ok_or(ValueOverflow)?;

    investor.profit_reference = profit_reference;
    investor.profit_display = profit_display;
    investor.profit_ratio_reference = ratio_reference;
    investor.profit_ratio_display = ratio_display;
    Ok(())
}
