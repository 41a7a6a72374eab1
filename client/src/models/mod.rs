//! Client-side view models
//!
//! Re-exports models from the shared crate and adds the read-only views the
//! dialogs render.

use rust_decimal::Decimal;
use serde::Serialize;
pub use shared::models::*;

pub const NOT_ASSIGNED: &str = "Not assigned";
pub const UNKNOWN_WAREHOUSE: &str = "Unknown warehouse";
pub const UNKNOWN_PRODUCT: &str = "Unknown product";

/// A consumption entry with the product's current catalog data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumedProduct {
    pub entry: ConsumptionEntry,
    pub name: String,
    pub code: Option<String>,
    pub category: Option<ProductCategory>,
    /// `None` when the product no longer exists
    pub current_stock: Option<Decimal>,
    pub stock_status: Option<StockStatus>,
}

/// Everything the detail dialog shows for one harvest
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestDetail {
    pub harvest: Harvest,
    pub field_name: String,
    pub lot_names: Vec<String>,
    pub warehouse_name: String,
    pub products: Vec<ConsumedProduct>,
    pub actions: HarvestActions,
}

impl HarvestDetail {
    pub fn build(harvest: &Harvest, catalog: &Catalog) -> Self {
        let field_name = shared::resolve_field(harvest, &catalog.fields).name;

        let warehouse_name = if harvest.target_warehouse.is_empty() {
            NOT_ASSIGNED.to_string()
        } else {
            catalog
                .warehouse(&harvest.target_warehouse)
                .map(|w| w.name.clone())
                .unwrap_or_else(|| UNKNOWN_WAREHOUSE.to_string())
        };

        let products = harvest
            .products_to_harvest
            .iter()
            .map(|entry| match catalog.product(&entry.product_id) {
                Some(product) => ConsumedProduct {
                    entry: entry.clone(),
                    name: product.name.clone(),
                    code: product.code.clone(),
                    category: Some(product.category.clone()),
                    current_stock: Some(product.stock),
                    stock_status: Some(product.stock_status()),
                },
                None => ConsumedProduct {
                    entry: entry.clone(),
                    name: if entry.product_name.is_empty() {
                        UNKNOWN_PRODUCT.to_string()
                    } else {
                        entry.product_name.clone()
                    },
                    code: entry.code.clone(),
                    category: entry.category.clone(),
                    current_stock: None,
                    stock_status: None,
                },
            })
            .collect();

        Self {
            harvest: harvest.clone(),
            field_name,
            lot_names: harvest.lot_names().into_iter().map(str::to_string).collect(),
            warehouse_name,
            products,
            actions: harvest.actions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        serde_json::from_value(serde_json::json!({
            "fields": [{"id": "F1", "name": "North"}],
            "warehouses": [{"id": "W1", "name": "Barn", "fieldId": "F1"}],
            "products": [{"id": "P1", "name": "Seed A", "code": "SA-1", "stock": 150, "category": "seed"}]
        }))
        .unwrap()
    }

    fn harvest(value: serde_json::Value) -> Harvest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_detail_resolves_names() {
        let h = harvest(serde_json::json!({
            "id": "H1", "fieldId": "F1", "status": "completed", "targetWarehouse": "W1",
            "lots": [{"id": "L1", "name": "A"}, {"id": "L2", "name": "B"}],
            "productsToHarvest": [{"productId": "P1", "quantity": 50, "availableStock": 200}]
        }));
        let detail = HarvestDetail::build(&h, &catalog());
        assert_eq!(detail.field_name, "North");
        assert_eq!(detail.lot_names, vec!["A", "B"]);
        assert_eq!(detail.warehouse_name, "Barn");
        assert_eq!(detail.products[0].name, "Seed A");
        assert_eq!(detail.products[0].current_stock, Some(Decimal::from(150)));
        assert_eq!(detail.products[0].stock_status, Some(StockStatus::Available));
        assert!(!detail.actions.can_edit);
    }

    #[test]
    fn test_detail_fallbacks() {
        let h = harvest(serde_json::json!({
            "id": "H1", "fieldId": "F9", "targetWarehouse": "W9",
            "productsToHarvest": [{"productId": "GONE", "quantity": 1, "availableStock": 1}]
        }));
        let detail = HarvestDetail::build(&h, &catalog());
        assert_eq!(detail.field_name, shared::UNKNOWN_FIELD);
        assert_eq!(detail.warehouse_name, UNKNOWN_WAREHOUSE);
        assert_eq!(detail.products[0].name, UNKNOWN_PRODUCT);
        assert_eq!(detail.products[0].current_stock, None);
        assert_eq!(detail.products[0].stock_status, None);

        let unassigned = harvest(serde_json::json!({"id": "H2"}));
        assert_eq!(HarvestDetail::build(&unassigned, &catalog()).warehouse_name, NOT_ASSIGNED);
    }
}
