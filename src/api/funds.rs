use crate::api::AppState;
use crate::domain::{
    investor_key, Address, FactoryState, FundId, FundState, InvestorState, TokenList,
};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDto {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    pub amount: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundResponse {
    pub fund_id: String,
    pub manager: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub investor_count: u64,
    pub tx_count: u64,
    pub current_reference: String,
    pub current_display: String,
    pub tokens: Vec<TokenDto>,
    pub fee_tokens: Vec<TokenDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorResponse {
    pub id: String,
    pub fund_id: String,
    pub investor: String,
    pub is_manager: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub principal_reference: String,
    pub principal_display: String,
    pub current_reference: String,
    pub current_display: String,
    pub pooled_reference: String,
    pub pooled_display: String,
    pub profit_reference: String,
    pub profit_display: String,
    pub profit_ratio_reference: String,
    pub profit_ratio_display: String,
    pub tokens: Vec<TokenDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryResponse {
    pub fund_count: u64,
    pub investor_count: u64,
    pub total_current_reference: String,
    pub total_current_display: String,
}

fn tokens_dto(tokens: &TokenList) -> Vec<TokenDto> {
    tokens
        .entries()
        .into_iter()
        .map(|entry| TokenDto {
            address: entry.address.to_string(),
            symbol: entry.symbol,
            decimals: entry.decimals,
            amount: entry.amount.to_canonical_string(),
        })
        .collect()
}

impl From<FundState> for FundResponse {
    fn from(fund: FundState) -> Self {
        Self {
            fund_id: fund.id.to_string(),
            manager: fund.manager.to_string(),
            created_at: fund.created_at.as_secs(),
            updated_at: fund.updated_at.as_secs(),
            investor_count: fund.investor_count,
            tx_count: fund.tx_count,
            current_reference: fund.current_reference.to_canonical_string(),
            current_display: fund.current_display.to_canonical_string(),
            tokens: tokens_dto(&fund.tokens),
            fee_tokens: tokens_dto(&fund.fee_tokens),
        }
    }
}

impl From<InvestorState> for InvestorResponse {
    fn from(investor: InvestorState) -> Self {
        Self {
            id: investor.key(),
            fund_id: investor.fund_id.to_string(),
            investor: investor.investor.to_string(),
            is_manager: investor.is_manager,
            created_at: investor.created_at.as_secs(),
            updated_at: investor.updated_at.as_secs(),
            principal_reference: investor.principal_reference.to_canonical_string(),
            principal_display: investor.principal_display.to_canonical_string(),
            current_reference: investor.current_reference.to_canonical_string(),
            current_display: investor.current_display.to_canonical_string(),
            pooled_reference: investor.pooled_reference.to_canonical_string(),
            pooled_display: investor.pooled_display.to_canonical_string(),
            profit_reference: investor.profit_reference.to_canonical_string(),
            profit_display: investor.profit_display.to_canonical_string(),
            profit_ratio_reference: investor.profit_ratio_reference.to_canonical_string(),
            profit_ratio_display: investor.profit_ratio_display.to_canonical_string(),
            tokens: tokens_dto(&investor.tokens),
        }
    }
}

impl From<FactoryState> for FactoryResponse {
    fn from(factory: FactoryState) -> Self {
        Self {
            fund_count: factory.fund_count,
            investor_count: factory.investor_count,
            total_current_reference: factory.total_current_reference.to_canonical_string(),
            total_current_display: factory.total_current_display.to_canonical_string(),
        }
    }
}

fn parse_fund_id(raw: &str) -> Result<FundId, AppError> {
    FundId::from_str(raw).map_err(|_| AppError::BadRequest("Invalid fund id".into()))
}

pub async fn get_fund(
    Path(fund_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<FundResponse>, AppError> {
    let fund_id = parse_fund_id(&fund_id)?;
    let fund = state
        .store
        .load_fund(&fund_id.to_string())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("fund {}", fund_id)))?;
    Ok(Json(fund.into()))
}

pub async fn get_investor(
    Path((fund_id, address)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<InvestorResponse>, AppError> {
    let fund_id = parse_fund_id(&fund_id)?;
    let investor = Address::from_str(&address)
        .map_err(|_| AppError::BadRequest("Invalid investor address".into()))?;

    let key = investor_key(fund_id, &investor);
    let record = state
        .store
        .load_investor(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("investor {}", key)))?;
    Ok(Json(record.into()))
}

pub async fn get_factory(State(state): State<AppState>) -> Result<Json<FactoryResponse>, AppError> {
    let factory = state.store.load_factory().await?.unwrap_or_default();
    Ok(Json(factory.into()))
}
