pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{ChainSource, ChainSourceError, MockChainSource};
pub use db::{init_db, EntityStore, MemoryStore, Record, SqliteStore, StoreError};
pub use domain::{
    Address, ChainEvent, Decimal, FactoryState, FundEvent, FundId, FundState, InvestorState, U256,
};
pub use error::AppError;
pub use orchestration::{AccountingEngine, LedgerError, OracleConfig, Outcome, PriceOracle};
