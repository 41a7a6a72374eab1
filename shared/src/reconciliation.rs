//! Stock decrement planning for completed harvests

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{ConsumptionEntry, Product};

/// New stock level for one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub product_id: String,
    pub previous_stock: Decimal,
    pub stock: Decimal,
}

/// Updates to persist plus the entries whose product could not be found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationPlan {
    pub updates: Vec<StockUpdate>,
    pub missing: Vec<String>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.missing.is_empty()
    }

    /// Final stock for a product, if the plan touches it
    pub fn stock_of(&self, product_id: &str) -> Option<Decimal> {
        self.updates
            .iter()
            .find(|u| u.product_id == product_id)
            .map(|u| u.stock)
    }
}

/// Plan stock decrements for a consumption list.
///
/// Entries with a non-positive quantity are skipped. Stock is floored at
/// zero. Several entries for one product decrement cumulatively and yield a
/// single update carrying the original stock as `previous_stock`. Running the
/// plan twice against updated stock decrements twice.
pub fn reconcile(entries: &[ConsumptionEntry], products: &[Product]) -> ReconciliationPlan {
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();
    let mut plan = ReconciliationPlan::default();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        if entry.quantity <= Decimal::ZERO {
            continue;
        }
        let Some(&product) = by_id.get(entry.product_id.as_str()) else {
            if !plan.missing.contains(&entry.product_id) {
                plan.missing.push(entry.product_id.clone());
            }
            continue;
        };

        match index.get(product.id.as_str()) {
            Some(&i) => {
                let update = &mut plan.updates[i];
                update.stock = (update.stock - entry.quantity).max(Decimal::ZERO);
            }
            None => {
                index.insert(product.id.as_str(), plan.updates.len());
                plan.updates.push(StockUpdate {
                    product_id: product.id.clone(),
                    previous_stock: product.stock,
                    stock: (product.stock - entry.quantity).max(Decimal::ZERO),
                });
            }
        }
    }

    plan
}

/// Products with a plan's new stock levels applied
pub fn apply_plan(products: &[Product], plan: &ReconciliationPlan) -> Vec<Product> {
    products
        .iter()
        .map(|p| {
            let mut product = p.clone();
            if let Some(stock) = plan.stock_of(&p.id) {
                product.stock = stock;
            }
            product
        })
        .collect()
}
