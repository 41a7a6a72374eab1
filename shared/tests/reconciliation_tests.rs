//! Stock reconciliation tests
//!
//! Property-based tests for:
//! - Stock never goes negative
//! - Entries for unknown products are skipped and reported
//! - Reconciling twice decrements twice

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{apply_plan, reconcile, ConsumptionEntry, Product, ProductCategory};

fn product(id: &str, stock: Decimal) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        code: None,
        stock,
        min_stock: None,
        field_id: Some("F1".to_string()),
        lot_id: None,
        warehouse_id: None,
        category: ProductCategory::Seed,
        unit: "kg".to_string(),
        storage_type: None,
        lot_number: None,
    }
}

fn entry(product_id: &str, quantity: Decimal) -> ConsumptionEntry {
    ConsumptionEntry {
        product_id: product_id.to_string(),
        product_name: String::new(),
        code: None,
        unit: "kg".to_string(),
        category: None,
        storage_type: None,
        quantity,
        available_stock: quantity,
        field_id: None,
        field_name: None,
        warehouse_id: None,
        warehouse_name: None,
        lot_id: None,
        lot_name: None,
    }
}

/// Quantities with up to two decimals
fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..50_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Product ids drawn from a small pool so duplicates and misses both occur
fn product_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("P1".to_string()),
        Just("P2".to_string()),
        Just("P3".to_string()),
        Just("GONE".to_string()),
    ]
}

mod unit_tests {
    use super::*;

    #[test]
    fn test_completion_example() {
        let products = vec![product("P1", Decimal::from(200))];
        let plan = reconcile(&[entry("P1", Decimal::from(50))], &products);
        assert_eq!(plan.stock_of("P1"), Some(Decimal::from(150)));
        assert_eq!(apply_plan(&products, &plan)[0].stock, Decimal::from(150));
    }

    #[test]
    fn test_double_invocation_double_decrements() {
        let products = vec![product("P1", Decimal::from(200))];
        let entries = [entry("P1", Decimal::from(50))];
        let once = apply_plan(&products, &reconcile(&entries, &products));
        let twice = apply_plan(&once, &reconcile(&entries, &once));
        assert_eq!(twice[0].stock, Decimal::from(100));
    }
}

mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// New stock is never negative and never above the previous stock
        #[test]
        fn prop_stock_never_negative(
            stocks in prop::collection::vec(quantity_strategy(), 3),
            entries in prop::collection::vec((product_id_strategy(), quantity_strategy()), 0..10)
        ) {
            let products: Vec<Product> = ["P1", "P2", "P3"]
                .iter()
                .zip(&stocks)
                .map(|(id, stock)| product(id, *stock))
                .collect();
            let entries: Vec<ConsumptionEntry> =
                entries.iter().map(|(id, q)| entry(id, *q)).collect();

            let plan = reconcile(&entries, &products);
            for update in &plan.updates {
                prop_assert!(update.stock >= Decimal::ZERO);
                prop_assert!(update.stock <= update.previous_stock);
            }
        }

        /// Unknown products never produce an update and are reported once
        #[test]
        fn prop_missing_products_skipped(
            quantities in prop::collection::vec(quantity_strategy(), 1..6)
        ) {
            let products = vec![product("P1", Decimal::from(10))];
            let entries: Vec<ConsumptionEntry> =
                quantities.iter().map(|q| entry("GONE", *q)).collect();

            let plan = reconcile(&entries, &products);
            prop_assert!(plan.updates.is_empty());
            let any_positive = quantities.iter().any(|q| *q > Decimal::ZERO);
            prop_assert_eq!(plan.missing.len(), usize::from(any_positive));
        }

        /// Final stock equals max(0, stock - total consumed) per product
        #[test]
        fn prop_cumulative_decrement(
            stock in quantity_strategy(),
            quantities in prop::collection::vec(quantity_strategy(), 1..6)
        ) {
            let products = vec![product("P1", stock)];
            let entries: Vec<ConsumptionEntry> =
                quantities.iter().map(|q| entry("P1", *q)).collect();
            let consumed: Decimal = quantities.iter().sum();

            let plan = reconcile(&entries, &products);
            let expected = (stock - consumed).max(Decimal::ZERO);
            if consumed > Decimal::ZERO {
                prop_assert_eq!(plan.stock_of("P1"), Some(expected));
            } else {
                prop_assert!(plan.updates.is_empty());
            }
        }
    }
}
