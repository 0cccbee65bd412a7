use alloy_primitives::address;
use axum::http::StatusCode;
use fundbook::api::{self, AppState};
use fundbook::datasource::{ChainSource, MockChainSource};
use fundbook::db::{init_db, EntityStore, SqliteStore};
use fundbook::domain::{Address, BlockTime, ChainEvent, FundEvent, FundId, Slot0, U256};
use fundbook::engine::Q96;
use fundbook::orchestration::{AccountingEngine, OracleConfig, PriceOracle};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const WETH: Address = address!("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
const USDC: Address = address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
const UNI: Address = address!("0x1f9840a85d5af5bf1d1762f925bdaddc4201f984");
const MANAGER: Address = address!("0x000000000000000000000000000000000000beef");
const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
const USDC_WETH: Address = address!("0x0000000000000000000000000000000000000a01");
const UNI_WETH: Address = address!("0x0000000000000000000000000000000000000a02");
const THREE_TOKENS: u128 = 3_000_000_000_000_000_000;

struct TestApp {
    app: axum::Router,
    engine: AccountingEngine,
    chain: Arc<MockChainSource>,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let store: Arc<dyn EntityStore> = Arc::new(SqliteStore::new(pool));

    // Both pools at tick 0 with matching decimals: every price is exactly 1.
    let parity = Slot0 {
        sqrt_price_x96: Q96,
        tick: 0,
    };
    let chain = Arc::new(
        MockChainSource::new()
            .with_token(WETH, "WETH", 18)
            .with_token(USDC, "USDC", 18)
            .with_token(UNI, "UNI", 18)
            .with_pool(USDC, WETH, 500, USDC_WETH, 1, parity)
            .with_pool(UNI, WETH, 500, UNI_WETH, 1, parity),
    );
    let chain_dyn: Arc<dyn ChainSource> = chain.clone();

    let oracle = PriceOracle::new(chain_dyn.clone(), OracleConfig::new(WETH, USDC));
    let engine = AccountingEngine::new(store.clone(), chain_dyn, oracle);
    let app = api::create_router(AppState::new(store));

    TestApp {
        app,
        engine,
        chain,
        _temp: temp_dir,
    }
}

async fn request(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn seed(test_app: &TestApp) {
    let fund_id = FundId::new(1);
    let events = [
        FundEvent::FundCreated {
            fund_id,
            manager: MANAGER,
        },
        FundEvent::Subscribe {
            fund_id,
            investor: ALICE,
        },
        FundEvent::Deposit {
            fund_id,
            investor: ALICE,
            token: UNI,
            amount: U256::from(THREE_TOKENS),
        },
    ];

    test_app
        .chain
        .set_fund_balance(fund_id, UNI, U256::from(THREE_TOKENS));
    test_app
        .chain
        .set_investor_balance(fund_id, ALICE, UNI, U256::from(THREE_TOKENS));

    for (i, event) in events.into_iter().enumerate() {
        let applied = test_app
            .engine
            .process(&ChainEvent::new(BlockTime::new(100 + i as i64), event))
            .await;
        assert!(applied);
    }
}

#[tokio::test]
async fn test_health_and_ready() {
    let test_app = setup_test_app().await;

    let (status, body) = request(test_app.app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = request(test_app.app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_fund_endpoint() {
    let test_app = setup_test_app().await;
    seed(&test_app).await;

    let (status, body) = request(test_app.app.clone(), "/v1/funds/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fundId"], "1");
    assert_eq!(body["investorCount"], 2);
    assert_eq!(body["txCount"], 1);
    assert_eq!(body["currentReference"], "3");
    assert_eq!(body["currentDisplay"], "3");
    assert_eq!(body["tokens"][0]["symbol"], "UNI");
    assert_eq!(body["tokens"][0]["amount"], "3");
    assert_eq!(body["feeTokens"].as_array().unwrap().len(), 0);

    let (status, _) = request(test_app.app.clone(), "/v1/funds/2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = request(test_app.app, "/v1/funds/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid fund id");
}

#[tokio::test]
async fn test_investor_endpoint() {
    let test_app = setup_test_app().await;
    seed(&test_app).await;

    let (status, body) = request(
        test_app.app.clone(),
        "/v1/funds/1/investors/0x00000000000000000000000000000000000a11ce",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "1-0X00000000000000000000000000000000000A11CE");
    assert_eq!(body["isManager"], false);
    assert_eq!(body["principalReference"], "3");
    assert_eq!(body["profitReference"], "0");
    assert_eq!(body["updatedAt"], 102);

    let (status, body) = request(
        test_app.app.clone(),
        "/v1/funds/1/investors/0x000000000000000000000000000000000000beef",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isManager"], true);

    let (status, _) = request(
        test_app.app.clone(),
        "/v1/funds/1/investors/0x0000000000000000000000000000000000000001",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(test_app.app, "/v1/funds/1/investors/alice").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_factory_endpoint() {
    let test_app = setup_test_app().await;

    let (status, body) = request(test_app.app.clone(), "/v1/factory").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fundCount"], 0);

    seed(&test_app).await;
    let (status, body) = request(test_app.app, "/v1/factory").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fundCount"], 1);
    assert_eq!(body["investorCount"], 2);
    assert_eq!(body["totalCurrentReference"], "3");
}
