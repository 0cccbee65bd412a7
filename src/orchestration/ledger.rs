//! Event handling: load the affected records, re-value them and save the
//! result as one batch.

use crate::datasource::{ChainSource, ChainSourceError};
use crate::db::{EntityStore, Record, StoreError};
use crate::domain::{
    investor_key, Address, BlockTime, ChainEvent, EntityKind, FactoryState, FundEvent, FundId,
    FundState, InvestorState, FACTORY_ID, U256,
};
use crate::engine::{apply_accounting_event, AccountingKind, Valuation, ValueOverflow};
use crate::orchestration::price_oracle::PriceOracle;
use crate::orchestration::valuation::{
    ensure_listed, pooled_value, refresh_fund_current_value, refresh_investor_holdings,
    whole_amount, PriceBook,
};
use std::sync::Arc;
use thiserror::Error;

/// Why an event could not be applied. Nothing is saved when one occurs.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{kind} {id} not found")]
    MissingEntity { kind: EntityKind, id: String },
    #[error("decimals unavailable for token {0}")]
    UnresolvableDecimals(Address),
    #[error("no priced pool for token {0}")]
    UnpriceableToken(Address),
    #[error("amount of token {0} is too large to value")]
    AmountOverflow(Address),
    #[error("no pool for position {0}")]
    MissingPool(U256),
    #[error(transparent)]
    ValueOverflow(#[from] ValueOverflow),
    #[error("chain read failed: {0}")]
    Chain(#[from] ChainSourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a successfully handled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Records were updated and saved.
    Applied,
    /// The event repeated an existing creation and changed nothing.
    Ignored,
}

/// Records touched by an investor event.
struct Accounts {
    factory: FactoryState,
    fund: FundState,
    investor: InvestorState,
}

/// Applies fund events to the derived fund, investor and factory records.
#[derive(Clone)]
pub struct AccountingEngine {
    store: Arc<dyn EntityStore>,
    chain: Arc<dyn ChainSource>,
    oracle: PriceOracle,
}

impl AccountingEngine {
    pub fn new(
        store: Arc<dyn EntityStore>,
        chain: Arc<dyn ChainSource>,
        oracle: PriceOracle,
    ) -> Self {
        Self {
            store,
            chain,
            oracle,
        }
    }

    /// Apply an event, logging instead of returning a failure.
    ///
    /// Returns whether any record changed.
    pub async fn process(&self, event: &ChainEvent) -> bool {
        match self.handle(event).await {
            Ok(Outcome::Applied) => true,
            Ok(Outcome::Ignored) => false,
            Err(err) => {
                tracing::warn!(
                    event = event.event.name(),
                    fund_id = %event.event.fund_id(),
                    error = %err,
                    "event aborted, state left unchanged"
                );
                false
            }
        }
    }

    /// Apply one event. On error no record is saved.
    pub async fn handle(&self, event: &ChainEvent) -> Result<Outcome, LedgerError> {
        let time = event.block_time;
        tracing::debug!(
            event = event.event.name(),
            fund_id = %event.event.fund_id(),
            time = time.as_secs(),
            "handling event"
        );

        match event.event {
            FundEvent::FundCreated { fund_id, manager } => {
                self.on_fund_created(time, fund_id, manager).await
            }
            FundEvent::Subscribe { fund_id, investor } => {
                self.on_subscribe(time, fund_id, investor).await
            }
            FundEvent::Deposit {
                fund_id,
                investor,
                token,
                amount,
            } => self.on_deposit(time, fund_id, investor, token, amount).await,
            FundEvent::Withdraw {
                fund_id,
                investor,
                token,
                amount,
                fee_amount,
            } => {
                self.on_withdraw(time, fund_id, investor, token, amount, fee_amount)
                    .await
            }
            FundEvent::Swap {
                fund_id,
                investor,
                token_in,
                token_out,
                ..
            } => self.on_swap(time, fund_id, investor, token_in, token_out).await,
            FundEvent::MintPosition {
                fund_id,
                investor,
                token_id,
            }
            | FundEvent::IncreaseLiquidity {
                fund_id,
                investor,
                token_id,
            }
            | FundEvent::DecreaseLiquidity {
                fund_id,
                investor,
                token_id,
            }
            | FundEvent::Collect {
                fund_id,
                investor,
                token_id,
            } => self.on_position(time, fund_id, investor, token_id).await,
            FundEvent::ManagerFeeOut {
                fund_id,
                manager,
                token,
                amount,
            } => self.on_manager_fee_out(time, fund_id, manager, token, amount).await,
        }
    }

    async fn on_fund_created(
        &self,
        time: BlockTime,
        fund_id: FundId,
        manager: Address,
    ) -> Result<Outcome, LedgerError> {
        if self.store.load_fund(&fund_id.to_string()).await?.is_some() {
            tracing::info!(%fund_id, "fund already exists, ignoring creation");
            return Ok(Outcome::Ignored);
        }

        let mut factory = self.store.load_factory().await?.unwrap_or_default();
        let mut fund = FundState::new(fund_id, manager, time);
        let manager_record = InvestorState::new(fund_id, manager, true, time);

        fund.investor_count = 1;
        factory.fund_count += 1;
        factory.investor_count += 1;

        self.store
            .save_all(vec![
                Record::Factory(factory),
                Record::Fund(fund),
                Record::Investor(manager_record),
            ])
            .await?;
        tracing::info!(%fund_id, %manager, "fund created");
        Ok(Outcome::Applied)
    }

    async fn on_subscribe(
        &self,
        time: BlockTime,
        fund_id: FundId,
        investor: Address,
    ) -> Result<Outcome, LedgerError> {
        let mut fund = self.fund(fund_id).await?;
        let mut factory = self.factory().await?;

        let key = investor_key(fund_id, &investor);
        if self.store.load_investor(&key).await?.is_some() {
            tracing::info!(%fund_id, %investor, "investor already subscribed, ignoring");
            return Ok(Outcome::Ignored);
        }

        let record = InvestorState::new(fund_id, investor, investor == fund.manager, time);
        fund.investor_count += 1;
        fund.updated_at = time;
        factory.investor_count += 1;

        self.store
            .save_all(vec![
                Record::Factory(factory),
                Record::Fund(fund),
                Record::Investor(record),
            ])
            .await?;
        Ok(Outcome::Applied)
    }

    async fn on_deposit(
        &self,
        time: BlockTime,
        fund_id: FundId,
        investor: Address,
        token: Address,
        amount: U256,
    ) -> Result<Outcome, LedgerError> {
        let mut accounts = self.accounts(fund_id, investor).await?;
        let mut book = PriceBook::new(&self.oracle);

        let decimals = ensure_listed(self.chain.as_ref(), &mut accounts.fund.tokens, token).await?;
        let deposited = book
            .value(token, whole_amount(token, amount, decimals)?)
            .await?;

        self.settle(accounts, &mut book, time, AccountingKind::Deposit, deposited)
            .await
    }

    async fn on_withdraw(
        &self,
        time: BlockTime,
        fund_id: FundId,
        investor: Address,
        token: Address,
        amount: U256,
        fee_amount: U256,
    ) -> Result<Outcome, LedgerError> {
        let mut accounts = self.accounts(fund_id, investor).await?;
        let mut book = PriceBook::new(&self.oracle);

        let decimals = ensure_listed(self.chain.as_ref(), &mut accounts.fund.tokens, token).await?;
        let withdrawn = book
            .value(
                token,
                whole_amount(token, amount.saturating_add(fee_amount), decimals)?,
            )
            .await?;

        if !fee_amount.is_zero() {
            let fee = whole_amount(token, fee_amount, decimals)?;
            let fee_tokens = &mut accounts.fund.fee_tokens;
            ensure_listed(self.chain.as_ref(), fee_tokens, token).await?;
            let accrued = fee_tokens
                .amount(&token)
                .unwrap_or_default()
                .checked_add(fee)
                .ok_or(LedgerError::AmountOverflow(token))?;
            fee_tokens.set_amount(&token, accrued);
        }

        self.settle(accounts, &mut book, time, AccountingKind::Withdraw, withdrawn)
            .await
    }

    async fn on_swap(
        &self,
        time: BlockTime,
        fund_id: FundId,
        investor: Address,
        token_in: Address,
        token_out: Address,
    ) -> Result<Outcome, LedgerError> {
        let mut accounts = self.accounts(fund_id, investor).await?;
        let mut book = PriceBook::new(&self.oracle);

        for token in [token_in, token_out] {
            ensure_listed(self.chain.as_ref(), &mut accounts.fund.tokens, token).await?;
        }

        self.settle(accounts, &mut book, time, AccountingKind::Neutral, Valuation::zero())
            .await
    }

    /// Mint, increase, decrease and collect: tokens move between the fund's
    /// balance and the position, principal is untouched.
    async fn on_position(
        &self,
        time: BlockTime,
        fund_id: FundId,
        investor: Address,
        token_id: U256,
    ) -> Result<Outcome, LedgerError> {
        let mut accounts = self.accounts(fund_id, investor).await?;
        let mut book = PriceBook::new(&self.oracle);

        let position = self.chain.position(token_id).await?;
        for token in [position.token0, position.token1] {
            ensure_listed(self.chain.as_ref(), &mut accounts.fund.tokens, token).await?;
        }

        self.settle(accounts, &mut book, time, AccountingKind::Neutral, Valuation::zero())
            .await
    }

    async fn on_manager_fee_out(
        &self,
        time: BlockTime,
        fund_id: FundId,
        manager: Address,
        token: Address,
        amount: U256,
    ) -> Result<Outcome, LedgerError> {
        let mut fund = self.fund(fund_id).await?;
        let mut factory = self.factory().await?;
        let mut book = PriceBook::new(&self.oracle);

        if let Some(decimals) = fund.fee_tokens.decimals_of(&token) {
            let paid = whole_amount(token, amount, decimals)?;
            let left = fund
                .fee_tokens
                .amount(&token)
                .unwrap_or_default()
                .checked_sub(paid)
                .ok_or(LedgerError::AmountOverflow(token))?;
            if left.is_positive() {
                fund.fee_tokens.set_amount(&token, left);
            } else {
                fund.fee_tokens.remove(&token);
            }
        } else {
            tracing::debug!(%fund_id, %token, "fee paid out for a token with no accrued fee");
        }

        refresh_fund_current_value(self.chain.as_ref(), &mut book, &mut fund, &mut factory).await?;
        fund.updated_at = time;

        self.store
            .save_all(vec![Record::Factory(factory), Record::Fund(fund)])
            .await?;
        tracing::debug!(%fund_id, %manager, "manager fee paid out");
        Ok(Outcome::Applied)
    }

    /// Re-value everything an investor event touched and save it in one batch.
    async fn settle(
        &self,
        accounts: Accounts,
        book: &mut PriceBook<'_>,
        time: BlockTime,
        kind: AccountingKind,
        amount: Valuation,
    ) -> Result<Outcome, LedgerError> {
        let Accounts {
            mut factory,
            mut fund,
            mut investor,
        } = accounts;
        let chain = self.chain.as_ref();

        refresh_fund_current_value(chain, book, &mut fund, &mut factory).await?;
        refresh_investor_holdings(chain, book, &mut investor, &fund.tokens).await?;
        let pooled = pooled_value(chain, book, investor.fund_id, investor.investor).await?;

        apply_accounting_event(&mut investor, kind, amount, pooled)?;

        fund.tx_count += 1;
        fund.updated_at = time;
        investor.updated_at = time;

        self.store
            .save_all(vec![
                Record::Factory(factory),
                Record::Fund(fund),
                Record::Investor(investor),
            ])
            .await?;
        Ok(Outcome::Applied)
    }

    async fn accounts(&self, fund_id: FundId, investor: Address) -> Result<Accounts, LedgerError> {
        let fund = self.fund(fund_id).await?;
        let factory = self.factory().await?;

        let key = investor_key(fund_id, &investor);
        let Some(investor) = self.store.load_investor(&key).await? else {
            return Err(LedgerError::MissingEntity {
                kind: EntityKind::Investor,
                id: key,
            });
        };

        Ok(Accounts {
            factory,
            fund,
            investor,
        })
    }

    async fn fund(&self, fund_id: FundId) -> Result<FundState, LedgerError> {
        let id = fund_id.to_string();
        match self.store.load_fund(&id).await? {
            Some(fund) => Ok(fund),
            None => Err(LedgerError::MissingEntity {
                kind: EntityKind::Fund,
                id,
            }),
        }
    }

    async fn factory(&self) -> Result<FactoryState, LedgerError> {
        self.store
            .load_factory()
            .await?
            .ok_or_else(|| LedgerError::MissingEntity {
                kind: EntityKind::Factory,
                id: FACTORY_ID.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockChainSource;
    use crate::db::MemoryStore;
    use crate::orchestration::price_oracle::OracleConfig;
    use alloy_primitives::address;

    const WETH: Address = address!("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    const USDC: Address = address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    const MANAGER: Address = address!("0x000000000000000000000000000000000000beef");
    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");

    fn engine() -> (Arc<MemoryStore>, AccountingEngine) {
        let store = Arc::new(MemoryStore::new());
        let chain: Arc<dyn ChainSource> = Arc::new(MockChainSource::new());
        let oracle = PriceOracle::new(chain.clone(), OracleConfig::new(WETH, USDC));
        let engine = AccountingEngine::new(store.clone(), chain, oracle);
        (store, engine)
    }

    fn at(secs: i64, event: FundEvent) -> ChainEvent {
        ChainEvent::new(BlockTime::new(secs), event)
    }

    #[tokio::test]
    async fn test_fund_creation_registers_manager_as_first_investor() {
        let (store, engine) = engine();
        let created = at(
            100,
            FundEvent::FundCreated {
                fund_id: FundId::new(1),
                manager: MANAGER,
            },
        );

        assert_eq!(engine.handle(&created).await.unwrap(), Outcome::Applied);

        let fund = store.load_fund("1").await.unwrap().unwrap();
        assert_eq!(fund.manager, MANAGER);
        assert_eq!(fund.investor_count, 1);
        assert_eq!(fund.created_at, BlockTime::new(100));

        let manager = store
            .load_investor(&investor_key(FundId::new(1), &MANAGER))
            .await
            .unwrap()
            .unwrap();
        assert!(manager.is_manager);

        let factory = store.load_factory().await.unwrap().unwrap();
        assert_eq!(factory.fund_count, 1);
        assert_eq!(factory.investor_count, 1);

        // Replaying the creation changes nothing.
        assert_eq!(engine.handle(&created).await.unwrap(), Outcome::Ignored);
        assert_eq!(store.load_factory().await.unwrap().unwrap().fund_count, 1);
    }

    #[tokio::test]
    async fn test_subscribe_counts_investors_once() {
        let (store, engine) = engine();
        let fund_id = FundId::new(1);
        engine
            .handle(&at(1, FundEvent::FundCreated { fund_id, manager: MANAGER }))
            .await
            .unwrap();

        let subscribe = at(2, FundEvent::Subscribe { fund_id, investor: ALICE });
        assert!(engine.process(&subscribe).await);
        assert!(!engine.process(&subscribe).await);

        let fund = store.load_fund("1").await.unwrap().unwrap();
        assert_eq!(fund.investor_count, 2);
        assert_eq!(fund.updated_at, BlockTime::new(2));
        assert_eq!(store.load_factory().await.unwrap().unwrap().investor_count, 2);

        let alice = store
            .load_investor(&investor_key(fund_id, &ALICE))
            .await
            .unwrap()
            .unwrap();
        assert!(!alice.is_manager);
    }

    #[tokio::test]
    async fn test_events_for_unknown_records_abort() {
        let (store, engine) = engine();

        let err = engine
            .handle(&at(
                1,
                FundEvent::Subscribe {
                    fund_id: FundId::new(9),
                    investor: ALICE,
                },
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MissingEntity { kind: EntityKind::Fund, ref id } if id == "9"
        ));

        engine
            .handle(&at(
                2,
                FundEvent::FundCreated {
                    fund_id: FundId::new(9),
                    manager: MANAGER,
                },
            ))
            .await
            .unwrap();
        let deposit = at(
            3,
            FundEvent::Deposit {
                fund_id: FundId::new(9),
                investor: ALICE,
                token: WETH,
                amount: U256::from(1u64),
            },
        );
        let err = engine.handle(&deposit).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MissingEntity {
                kind: EntityKind::Investor,
                ..
            }
        ));
        assert!(!engine.process(&deposit).await);
        assert_eq!(store.load_fund("9").await.unwrap().unwrap().tx_count, 0);
    }

    #[test]
    fn test_error_messages() {
        let err = LedgerError::MissingEntity {
            kind: EntityKind::Fund,
            id: "4".to_string(),
        };
        assert_eq!(err.to_string(), "fund 4 not found");

        let err = LedgerError::Chain(ChainSourceError::Reverted("slot0".to_string()));
        assert_eq!(err.to_string(), "chain read failed: Call reverted: slot0");
    }
}
