//! Product inventory models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::lenient;

/// Product category as stored.
///
/// Spanish labels written by earlier clients are accepted on read. Anything
/// else is kept verbatim as `Unknown` and is never harvestable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductCategory {
    Seed,
    Fertilizer,
    Pesticide,
    Input,
    Other,
    Unknown(String),
}

impl ProductCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ProductCategory::Seed => "seed",
            ProductCategory::Fertilizer => "fertilizer",
            ProductCategory::Pesticide => "pesticide",
            ProductCategory::Input => "input",
            ProductCategory::Other => "other",
            ProductCategory::Unknown(raw) => raw,
        }
    }
}

impl Default for ProductCategory {
    fn default() -> Self {
        ProductCategory::Unknown(String::new())
    }
}

impl From<String> for ProductCategory {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "seed" | "semilla" => ProductCategory::Seed,
            "fertilizer" | "fertilizante" => ProductCategory::Fertilizer,
            "pesticide" | "pesticida" => ProductCategory::Pesticide,
            "input" | "insumo" => ProductCategory::Input,
            "other" | "otro" => ProductCategory::Other,
            _ => ProductCategory::Unknown(raw),
        }
    }
}

impl From<&str> for ProductCategory {
    fn from(raw: &str) -> Self {
        ProductCategory::from(raw.to_string())
    }
}

impl From<ProductCategory> for String {
    fn from(category: ProductCategory) -> Self {
        match category {
            ProductCategory::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single allow-list of categories that may be consumed by a harvest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HarvestableCategories(Vec<ProductCategory>);

impl HarvestableCategories {
    pub fn new(categories: Vec<ProductCategory>) -> Self {
        Self(categories)
    }

    pub fn contains(&self, category: &ProductCategory) -> bool {
        self.0.contains(category)
    }

    pub fn as_slice(&self) -> &[ProductCategory] {
        &self.0
    }

    /// A product can be picked when it is in stock and in an allowed category
    pub fn admits(&self, product: &Product) -> bool {
        product.stock > Decimal::ZERO && self.contains(&product.category)
    }
}

impl Default for HarvestableCategories {
    fn default() -> Self {
        Self(vec![
            ProductCategory::Seed,
            ProductCategory::Fertilizer,
            ProductCategory::Pesticide,
            ProductCategory::Input,
            ProductCategory::Other,
        ])
    }
}

/// Stock level bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Empty,
    Low,
    Available,
}

/// A product held in inventory, scoped to a field, lot and/or warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, with = "lenient::decimal")]
    pub stock: Decimal,
    #[serde(default, with = "lenient::opt_decimal")]
    pub min_stock: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    #[serde(default)]
    pub category: ProductCategory,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,
}

impl Product {
    pub fn stock_status(&self) -> StockStatus {
        let min = self.min_stock.unwrap_or(Decimal::ZERO);
        if self.stock <= Decimal::ZERO {
            StockStatus::Empty
        } else if self.stock <= min {
            StockStatus::Low
        } else {
            StockStatus::Available
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(category: &str, stock: i64) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": "P1",
            "name": "Seed A",
            "category": category,
            "stock": stock,
        }))
        .unwrap()
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!(ProductCategory::from("semilla"), ProductCategory::Seed);
        assert_eq!(ProductCategory::from("Fertilizante"), ProductCategory::Fertilizer);
        assert_eq!(ProductCategory::from("insumo"), ProductCategory::Input);
        assert_eq!(
            ProductCategory::from("herramienta"),
            ProductCategory::Unknown("herramienta".to_string())
        );
    }

    #[test]
    fn test_category_serializes_canonical_name() {
        let json = serde_json::to_value(ProductCategory::from("pesticida")).unwrap();
        assert_eq!(json, "pesticide");
    }

    #[test]
    fn test_harvestable_admits_only_stocked_allowed_products() {
        let allow = HarvestableCategories::default();
        assert!(allow.admits(&product("semilla", 10)));
        assert!(!allow.admits(&product("semilla", 0)));
        assert!(!allow.admits(&product("herramienta", 10)));

        let narrow = HarvestableCategories::new(vec![ProductCategory::Seed]);
        assert!(!narrow.admits(&product("fertilizer", 10)));
    }

    #[test]
    fn test_stock_status() {
        let mut p = product("seed", 0);
        assert_eq!(p.stock_status(), StockStatus::Empty);
        p.stock = Decimal::from(5);
        p.min_stock = Some(Decimal::from(5));
        assert_eq!(p.stock_status(), StockStatus::Low);
        p.stock = Decimal::from(6);
        assert_eq!(p.stock_status(), StockStatus::Available);
    }
}
