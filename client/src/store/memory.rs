//! In-memory store used by the demo binary and tests

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{CompleteHarvestInput, Field, Harvest, HarvestInput, Product, Warehouse};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{FieldStore, HarvestStore, ProductStore, StoreError, StoreResult, WarehouseStore};

/// Every collection at one point in time; also the seed file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub fields: Vec<Field>,
    pub warehouses: Vec<Warehouse>,
    pub products: Vec<Product>,
    pub harvests: Vec<Harvest>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub fn from_json(json: &str) -> StoreResult<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Seed from a JSON snapshot file
    pub async fn from_seed_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Backend(format!("cannot read {}: {}", path.display(), e)))?;
        let store = Self::from_json(&json)?;
        tracing::info!("Seeded in-memory store from {}", path.display());
        Ok(store)
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.clone()
    }

    pub async fn product(&self, id: &str) -> Option<Product> {
        let state = self.state.read().await;
        state.products.iter().find(|p| p.id == id).cloned()
    }

    pub async fn harvest(&self, id: &str) -> Option<Harvest> {
        let state = self.state.read().await;
        state.harvests.iter().find(|h| h.id == id).cloned()
    }
}

fn not_found(collection: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        collection,
        id: id.to_string(),
    }
}

#[async_trait]
impl HarvestStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Harvest>> {
        Ok(self.state.read().await.harvests.clone())
    }

    async fn create(&self, input: HarvestInput) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let harvest = Harvest::from_input(id.clone(), input, Utc::now());
        self.state.write().await.harvests.push(harvest);
        tracing::debug!(harvest_id = %id, "Harvest created");
        Ok(id)
    }

    async fn update(&self, id: &str, input: HarvestInput) -> StoreResult<String> {
        let mut state = self.state.write().await;
        let harvest = state
            .harvests
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| not_found("harvests", id))?;
        harvest.apply_input(input, Utc::now());
        Ok(harvest.id.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let before = state.harvests.len();
        state.harvests.retain(|h| h.id != id);
        if state.harvests.len() == before {
            return Err(not_found("harvests", id));
        }
        Ok(())
    }

    async fn mark_completed(&self, id: &str, completion: CompleteHarvestInput) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let harvest = state
            .harvests
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| not_found("harvests", id))?;
        harvest.apply_completion(completion, Utc::now());
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        Ok(self.state.read().await.products.clone())
    }

    async fn update(&self, id: &str, mut product: Product) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let slot = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found("products", id))?;
        product.id = id.to_string();
        *slot = product;
        Ok(())
    }
}

#[async_trait]
impl FieldStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Field>> {
        Ok(self.state.read().await.fields.clone())
    }
}

#[async_trait]
impl WarehouseStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Warehouse>> {
        Ok(self.state.read().await.warehouses.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::{HarvestDraft, HarvestStatus};

    fn seeded() -> MemoryStore {
        MemoryStore::from_json(
            r#"{
                "fields": [{"id": "F1", "name": "North", "lots": [{"id": "L1", "name": "A", "area": 2}]}],
                "warehouses": [{"id": "W1", "name": "Barn", "fieldId": "F1"}],
                "products": [{"id": "P1", "name": "Seed A", "stock": 200, "category": "semilla"}]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_seed_parses_every_collection() {
        let store = seeded();
        assert_eq!(FieldStore::list(&store).await.unwrap()[0].lots.len(), 1);
        assert_eq!(WarehouseStore::list(&store).await.unwrap().len(), 1);
        assert_eq!(ProductStore::list(&store).await.unwrap().len(), 1);
        assert!(HarvestStore::list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_harvest_lifecycle() {
        let store = seeded();
        let input = HarvestDraft::default().normalize();
        let id = store.create(input.clone()).await.unwrap();
        let created = store.harvest(&id).await.unwrap();
        assert_eq!(created.status, HarvestStatus::Pending);
        assert!(created.created_at.is_some());

        let mut changed = input;
        changed.crop = "trigo".to_string();
        assert_eq!(HarvestStore::update(&store, &id, changed).await.unwrap(), id);
        assert_eq!(store.harvest(&id).await.unwrap().crop, "trigo");

        let completion: CompleteHarvestInput = serde_json::from_value(serde_json::json!({
            "harvestDate": "2024-04-02",
            "actualYield": 3100,
            "totalHarvestedUnit": "kg",
            "destination": "W1",
            "qualityResults": [],
            "harvestNotes": "",
            "productsHarvested": []
        }))
        .unwrap();
        store.mark_completed(&id, completion).await.unwrap();
        let completed = store.harvest(&id).await.unwrap();
        assert_eq!(completed.status, HarvestStatus::Completed);
        assert_eq!(completed.actual_yield, Some(Decimal::from(3100)));
        assert!(completed.completed_at.is_some());

        store.delete(&id).await.unwrap();
        assert!(matches!(
            store.delete(&id).await,
            Err(StoreError::NotFound { collection: "harvests", .. })
        ));
    }

    #[tokio::test]
    async fn test_product_update_replaces_record() {
        let store = seeded();
        let mut product = store.product("P1").await.unwrap();
        product.stock = Decimal::from(150);
        ProductStore::update(&store, "P1", product.clone()).await.unwrap();
        assert_eq!(store.product("P1").await.unwrap().stock, Decimal::from(150));
        assert!(ProductStore::update(&store, "nope", product).await.is_err());
    }

    #[test]
    fn test_missing_seed_file_is_backend_error() {
        let err = tokio_test::block_on(MemoryStore::from_seed_file("does/not/exist.json"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
