//! Entity store: load and save derived records by `(kind, id)`.
//!
//! - `memory.rs` - in-process store for tests and embedding
//! - `sqlite.rs` - sqlx-backed store holding JSON bodies

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::domain::{EntityKind, FactoryState, FundState, InvestorState, FACTORY_ID};
use async_trait::async_trait;
use thiserror::Error;

/// One persisted entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Factory(FactoryState),
    Fund(FundState),
    Investor(InvestorState),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Factory(_) => EntityKind::Factory,
            Record::Fund(_) => EntityKind::Fund,
            Record::Investor(_) => EntityKind::Investor,
        }
    }

    pub fn id(&self) -> String {
        match self {
            Record::Factory(_) => FACTORY_ID.to_string(),
            Record::Fund(fund) => fund.key(),
            Record::Investor(investor) => investor.key(),
        }
    }

    pub fn into_factory(self) -> Option<FactoryState> {
        match self {
            Record::Factory(factory) => Some(factory),
            _ => None,
        }
    }

    pub fn into_fund(self) -> Option<FundState> {
        match self {
            Record::Fund(fund) => Some(fund),
            _ => None,
        }
    }

    pub fn into_investor(self) -> Option<InvestorState> {
        match self {
            Record::Investor(investor) => Some(investor),
            _ => None,
        }
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Record::Factory(factory) => serde_json::to_string(factory),
            Record::Fund(fund) => serde_json::to_string(fund),
            Record::Investor(investor) => serde_json::to_string(investor),
        }
    }

    fn from_json(kind: EntityKind, body: &str) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EntityKind::Factory => Record::Factory(serde_json::from_str(body)?),
            EntityKind::Fund => Record::Fund(serde_json::from_str(body)?),
            EntityKind::Investor => Record::Investor(serde_json::from_str(body)?),
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt {kind} record {id}: {source}")]
    Corrupt {
        kind: EntityKind,
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence collaborator for derived entities.
///
/// `save_all` is atomic: either every record is written or none is.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn load(&self, kind: EntityKind, id: &str) -> Result<Option<Record>, StoreError>;

    async fn save(&self, record: Record) -> Result<(), StoreError> {
        self.save_all(vec![record]).await
    }

    async fn save_all(&self, records: Vec<Record>) -> Result<(), StoreError>;

    async fn load_factory(&self) -> Result<Option<FactoryState>, StoreError> {
        Ok(self
            .load(EntityKind::Factory, FACTORY_ID)
            .await?
            .and_then(Record::into_factory))
    }

    async fn load_fund(&self, id: &str) -> Result<Option<FundState>, StoreError> {
        Ok(self
            .load(EntityKind::Fund, id)
            .await?
            .and_then(Record::into_fund))
    }

    async fn load_investor(&self, id: &str) -> Result<Option<InvestorState>, StoreError> {
        Ok(self
            .load(EntityKind::Investor, id)
            .await?
            .and_then(Record::into_investor))
    }
}
