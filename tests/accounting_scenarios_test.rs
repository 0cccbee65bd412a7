//! End-to-end event sequences against the in-memory store and a mock chain.

use alloy_primitives::address;
use fundbook::datasource::{ChainSource, MockChainSource};
use fundbook::db::{EntityStore, MemoryStore};
use fundbook::domain::{
    investor_key, Address, BlockTime, ChainEvent, Decimal, FundEvent, FundId, InvestorState,
    PositionInfo, Slot0, U256,
};
use fundbook::engine::{encode_sqrt_ratio_x96, Q96};
use fundbook::orchestration::{AccountingEngine, LedgerError, OracleConfig, Outcome, PriceOracle};
use std::sync::Arc;

const WETH: Address = address!("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
const USDC: Address = address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
const UNI: Address = address!("0x1f9840a85d5af5bf1d1762f925bdaddc4201f984");
const DAI: Address = address!("0x6b175474e89094c44da98b954eedeac495271d0f");
const USDC_WETH: Address = address!("0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640");
const UNI_WETH: Address = address!("0x1d42064fc4beb5f8aaf85f4617ae8b3b5b8bd801");
const TKN: Address = address!("0x0000000000000000000000000000000000000c01");
const TKN_WETH: Address = address!("0x0000000000000000000000000000000000000c02");
const MANAGER: Address = address!("0x000000000000000000000000000000000000beef");
const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");

const ETHER: u128 = 1_000_000_000_000_000_000;
const FUND: FundId = FundId::new(1);

struct Harness {
    chain: Arc<MockChainSource>,
    store: Arc<MemoryStore>,
    engine: AccountingEngine,
}

impl Harness {
    /// WETH at 2000 USDC; UNI at exactly 1 WETH. Fund 1 exists with ALICE subscribed.
    async fn new() -> Self {
        let usdc_weth = Slot0 {
            sqrt_price_x96: encode_sqrt_ratio_x96(U256::from(ETHER), U256::from(2_000_000_000u64))
                .unwrap(),
            tick: 0,
        };
        let uni_weth = Slot0 {
            sqrt_price_x96: Q96,
            tick: 0,
        };
        let chain = Arc::new(
            MockChainSource::new()
                .with_token(WETH, "WETH", 18)
                .with_token(USDC, "USDC", 6)
                .with_token(UNI, "UNI", 18)
                .with_token(DAI, "DAI", 18)
                .with_pool(USDC, WETH, 500, USDC_WETH, 10 * ETHER, usdc_weth)
                .with_pool(UNI, WETH, 3_000, UNI_WETH, ETHER, uni_weth),
        );
        let store = Arc::new(MemoryStore::new());
        let chain_dyn: Arc<dyn ChainSource> = chain.clone();
        let oracle = PriceOracle::new(chain_dyn.clone(), OracleConfig::new(WETH, USDC));
        let engine = AccountingEngine::new(store.clone(), chain_dyn, oracle);

        let harness = Self {
            chain,
            store,
            engine,
        };
        harness
            .apply(
                1,
                FundEvent::FundCreated {
                    fund_id: FUND,
                    manager: MANAGER,
                },
            )
            .await;
        harness
            .apply(
                2,
                FundEvent::Subscribe {
                    fund_id: FUND,
                    investor: ALICE,
                },
            )
            .await;
        harness
    }

    async fn apply(&self, secs: i64, event: FundEvent) {
        let outcome = self
            .engine
            .handle(&ChainEvent::new(BlockTime::new(secs), event))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
    }

    /// Set both the fund balance and ALICE's share of it.
    fn set_uni(&self, fund_raw: u128, alice_raw: u128) {
        self.chain.set_fund_balance(FUND, UNI, U256::from(fund_raw));
        self.chain
            .set_investor_balance(FUND, ALICE, UNI, U256::from(alice_raw));
    }

    fn set_uni_price(&self, sqrt_price_x96: U256) {
        self.chain.set_slot0(
            UNI_WETH,
            Slot0 {
                sqrt_price_x96,
                tick: 0,
            },
        );
    }

    async fn alice(&self) -> InvestorState {
        self.store
            .load_investor(&investor_key(FUND, &ALICE))
            .await
            .unwrap()
            .unwrap()
    }
}

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn approx(value: Decimal, expected: &str) {
    assert_eq!(
        value.inner().round_dp(9),
        d(expected).inner(),
        "{} is not ~{}",
        value,
        expected
    );
}

fn deposit_uni(amount: u128) -> FundEvent {
    FundEvent::Deposit {
        fund_id: FUND,
        investor: ALICE,
        token: UNI,
        amount: U256::from(amount),
    }
}

fn withdraw_uni(amount: u128, fee_amount: u128) -> FundEvent {
    FundEvent::Withdraw {
        fund_id: FUND,
        investor: ALICE,
        token: UNI,
        amount: U256::from(amount),
        fee_amount: U256::from(fee_amount),
    }
}

fn neutral_swap() -> FundEvent {
    FundEvent::Swap {
        fund_id: FUND,
        investor: ALICE,
        token_in: UNI,
        token_out: WETH,
        amount_in: U256::ZERO,
        amount_out: U256::ZERO,
    }
}

#[tokio::test]
async fn test_deposit_price_move_and_withdrawals() {
    let h = Harness::new().await;

    // A: a fresh investor holds nothing.
    let alice = h.alice().await;
    assert!(alice.principal_reference.is_zero());
    assert!(alice.current_reference.is_zero());
    assert!(alice.profit_reference.is_zero());

    // Deposit 10 UNI worth 10 WETH.
    h.set_uni(10 * ETHER, 10 * ETHER);
    h.apply(10, deposit_uni(10 * ETHER)).await;

    let alice = h.alice().await;
    assert_eq!(alice.principal_reference, d("10"));
    assert_eq!(alice.current_reference, d("10"));
    assert!(alice.profit_reference.is_zero());
    approx(alice.principal_display, "20000");
    assert_eq!(alice.tokens.amount(&UNI), Some(d("10")));

    // B: UNI doubles against WETH.
    h.set_uni_price(encode_sqrt_ratio_x96(U256::from(2u64), U256::from(1u64)).unwrap());
    h.apply(20, neutral_swap()).await;

    let alice = h.alice().await;
    assert_eq!(alice.principal_reference, d("10"));
    approx(alice.current_reference, "20");
    approx(alice.profit_reference, "10");
    approx(alice.profit_ratio_reference, "100");

    let fund = h.store.load_fund("1").await.unwrap().unwrap();
    approx(fund.current_reference, "20");
    assert_eq!(fund.tx_count, 2);
    // The zero-balance swap output is not kept.
    assert_eq!(fund.tokens.addresses(), &[UNI]);

    // C: withdraw half of the total value.
    h.set_uni(5 * ETHER, 5 * ETHER);
    h.apply(30, withdraw_uni(5 * ETHER, 0)).await;

    let alice = h.alice().await;
    approx(alice.principal_reference, "5");
    approx(alice.principal_display, "10000");
    approx(alice.profit_reference, "5");
    approx(alice.profit_ratio_reference, "100");

    // Withdraw everything that is left.
    h.set_uni(0, 0);
    h.apply(40, withdraw_uni(5 * ETHER, 0)).await;

    let alice = h.alice().await;
    assert!(alice.principal_reference.is_zero());
    assert!(alice.principal_display.is_zero());
    assert!(alice.profit_reference.is_zero());
    assert!(alice.profit_ratio_reference.is_zero());
    assert!(alice.tokens.is_empty());
    assert_eq!(alice.updated_at, BlockTime::new(40));

    let fund = h.store.load_fund("1").await.unwrap().unwrap();
    assert!(fund.tokens.is_empty());
    assert!(fund.current_reference.is_zero());
    let factory = h.store.load_factory().await.unwrap().unwrap();
    assert!(factory.total_current_reference.is_zero());
}

#[tokio::test]
async fn test_withdraw_fee_accrues_to_fund_until_paid_out() {
    let h = Harness::new().await;
    h.set_uni(10 * ETHER, 10 * ETHER);
    h.apply(10, deposit_uni(10 * ETHER)).await;

    // 4 UNI leave, 1 UNI stays behind as the manager's fee.
    h.set_uni(6 * ETHER, 5 * ETHER);
    h.apply(20, withdraw_uni(4 * ETHER, ETHER)).await;

    let alice = h.alice().await;
    assert_eq!(alice.principal_reference, d("5"));
    assert_eq!(alice.current_reference, d("5"));
    assert!(alice.profit_reference.is_zero());

    let fund = h.store.load_fund("1").await.unwrap().unwrap();
    assert_eq!(fund.fee_tokens.amount(&UNI), Some(d("1")));
    // The unpaid fee is still in the fund's balance and counts toward its value.
    assert_eq!(fund.current_reference, d("6"));

    h.chain.set_fund_balance(FUND, UNI, U256::from(5 * ETHER));
    h.apply(
        30,
        FundEvent::ManagerFeeOut {
            fund_id: FUND,
            manager: MANAGER,
            token: UNI,
            amount: U256::from(ETHER),
        },
    )
    .await;

    let fund = h.store.load_fund("1").await.unwrap().unwrap();
    assert!(fund.fee_tokens.is_empty());
    assert_eq!(fund.current_reference, d("5"));
    assert_eq!(fund.tx_count, 2);

    let factory = h.store.load_factory().await.unwrap().unwrap();
    assert_eq!(factory.total_current_reference, d("5"));
}

#[tokio::test]
async fn test_liquidity_position_counts_as_pooled_value() {
    let h = Harness::new().await;
    h.set_uni(10 * ETHER, 10 * ETHER);
    h.apply(10, deposit_uni(10 * ETHER)).await;

    // Move part of the UNI into a UNI/WETH position straddling the price.
    let token_id = U256::from(42u64);
    h.chain.set_position(
        token_id,
        PositionInfo {
            token0: UNI,
            token1: WETH,
            fee: 3_000,
            tick_lower: -600,
            tick_upper: 600,
            liquidity: ETHER,
        },
    );
    h.chain.set_investor_positions(FUND, ALICE, vec![token_id]);
    h.set_uni(9 * ETHER, 9 * ETHER);
    h.apply(
        20,
        FundEvent::MintPosition {
            fund_id: FUND,
            investor: ALICE,
            token_id,
        },
    )
    .await;

    let alice = h.alice().await;
    assert_eq!(alice.principal_reference, d("10"));
    assert_eq!(alice.current_reference, d("9"));
    assert!(alice.pooled_reference > d("0.058"));
    assert!(alice.pooled_reference < d("0.06"));
    assert_eq!(
        alice.profit_reference,
        alice.current_reference + alice.pooled_reference - alice.principal_reference
    );

    // The position's other token is listed for the fund, but dropped at zero balance.
    let fund = h.store.load_fund("1").await.unwrap().unwrap();
    assert_eq!(fund.tokens.addresses(), &[UNI]);
    assert_eq!(fund.tx_count, 2);
}

#[tokio::test]
async fn test_unpriceable_deposit_leaves_state_untouched() {
    let h = Harness::new().await;
    h.chain.set_fund_balance(FUND, DAI, U256::from(ETHER));
    h.chain
        .set_investor_balance(FUND, ALICE, DAI, U256::from(ETHER));

    let before_fund = h.store.load_fund("1").await.unwrap();
    let before_alice = h.alice().await;

    let event = ChainEvent::new(
        BlockTime::new(10),
        FundEvent::Deposit {
            fund_id: FUND,
            investor: ALICE,
            token: DAI,
            amount: U256::from(ETHER),
        },
    );
    let err = h.engine.handle(&event).await.unwrap_err();
    assert!(matches!(err, LedgerError::UnpriceableToken(token) if token == DAI));
    assert!(!h.engine.process(&event).await);

    assert_eq!(h.store.load_fund("1").await.unwrap(), before_fund);
    assert_eq!(h.alice().await, before_alice);
}

#[tokio::test]
async fn test_deposit_too_large_to_value_aborts_the_event() {
    let h = Harness::new().await;
    // TKN has no decimals and one unit trades for 100 WETH.
    h.chain.set_token(TKN, "TKN", 0);
    h.chain.set_pool(
        TKN,
        WETH,
        3_000,
        TKN_WETH,
        ETHER,
        Slot0 {
            sqrt_price_x96: encode_sqrt_ratio_x96(U256::from(100 * ETHER), U256::from(1u64))
                .unwrap(),
            tick: 0,
        },
    );
    let huge = U256::from(10u128.pow(27));
    h.chain.set_fund_balance(FUND, TKN, huge);
    h.chain.set_investor_balance(FUND, ALICE, TKN, huge);

    let before_fund = h.store.load_fund("1").await.unwrap();
    let before_alice = h.alice().await;
    let before_factory = h.store.load_factory().await.unwrap();

    let event = ChainEvent::new(
        BlockTime::new(10),
        FundEvent::Deposit {
            fund_id: FUND,
            investor: ALICE,
            token: TKN,
            amount: huge,
        },
    );
    let err = h.engine.handle(&event).await.unwrap_err();
    assert!(matches!(err, LedgerError::AmountOverflow(token) if token == TKN));
    assert!(!h.engine.process(&event).await);

    assert_eq!(h.store.load_fund("1").await.unwrap(), before_fund);
    assert_eq!(h.store.load_factory().await.unwrap(), before_factory);
    assert_eq!(h.alice().await, before_alice);
}

#[tokio::test]
async fn test_failed_balance_read_aborts_the_event() {
    let h = Harness::new().await;
    h.set_uni(ETHER, ETHER);
    h.apply(10, deposit_uni(ETHER)).await;

    // Position id points at nothing: the pooled-value read fails.
    h.chain
        .set_investor_positions(FUND, ALICE, vec![U256::from(99u64)]);
    let err = h
        .engine
        .handle(&ChainEvent::new(BlockTime::new(20), neutral_swap()))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Chain(_)));

    let fund = h.store.load_fund("1").await.unwrap().unwrap();
    assert_eq!(fund.tx_count, 1);
    assert_eq!(fund.updated_at, BlockTime::new(10));
}
