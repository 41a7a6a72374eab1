//! Data store contracts
//!
//! The backing document store is an external collaborator; these traits are
//! the CRUD surface the orchestrator needs. Stores hold no business rules.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use shared::{CompleteHarvestInput, Field, Harvest, HarvestInput, Product, Warehouse};
use thiserror::Error;

pub use memory::{MemoryStore, Snapshot};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{collection} record not found: {id}")]
    NotFound { collection: &'static str, id: String },

    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Harvest records
#[async_trait]
pub trait HarvestStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Harvest>>;

    /// Insert a new record and return its generated id
    async fn create(&self, input: HarvestInput) -> StoreResult<String>;

    /// Overwrite the planning data of a record; returns its id
    async fn update(&self, id: &str, input: HarvestInput) -> StoreResult<String>;

    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Record completion data and set the status to completed
    async fn mark_completed(&self, id: &str, completion: CompleteHarvestInput) -> StoreResult<()>;
}

/// Product inventory
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Product>>;

    async fn update(&self, id: &str, product: Product) -> StoreResult<()>;
}

/// Fields with their lots nested
#[async_trait]
pub trait FieldStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Field>>;
}

#[async_trait]
pub trait WarehouseStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Warehouse>>;
}

/// The four stores the orchestrator talks to
#[derive(Clone)]
pub struct Stores {
    pub harvests: Arc<dyn HarvestStore>,
    pub products: Arc<dyn ProductStore>,
    pub fields: Arc<dyn FieldStore>,
    pub warehouses: Arc<dyn WarehouseStore>,
}

impl Stores {
    /// Use one backend for every collection
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: HarvestStore + ProductStore + FieldStore + WarehouseStore + 'static,
    {
        Self {
            harvests: backend.clone(),
            products: backend.clone(),
            fields: backend.clone(),
            warehouses: backend,
        }
    }
}
