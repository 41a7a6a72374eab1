//! Reference collections loaded together for a harvest form

use serde::{Deserialize, Serialize};

use super::{Field, Lot, Product, Warehouse};

/// Fields (with nested lots), warehouses and products.
///
/// Lookups that fail to resolve yield `None` or an empty list; nothing here
/// reports an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub warehouses: Vec<Warehouse>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn new(fields: Vec<Field>, warehouses: Vec<Warehouse>, products: Vec<Product>) -> Self {
        Self {
            fields,
            warehouses,
            products,
        }
    }

    pub fn field(&self, field_id: &str) -> Option<&Field> {
        if field_id.is_empty() {
            return None;
        }
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// Lots of a field; empty when the field is unknown
    pub fn lots_of(&self, field_id: &str) -> &[Lot] {
        self.field(field_id).map(|f| f.lots.as_slice()).unwrap_or(&[])
    }

    /// Find a lot anywhere, with the field that owns it
    pub fn lot(&self, lot_id: &str) -> Option<(&Field, &Lot)> {
        self.fields
            .iter()
            .find_map(|f| f.lot(lot_id).map(|l| (f, l)))
    }

    pub fn warehouses_of(&self, field_id: &str) -> Vec<Warehouse> {
        if field_id.is_empty() {
            return Vec::new();
        }
        self.warehouses
            .iter()
            .filter(|w| w.field_id == field_id)
            .cloned()
            .collect()
    }

    pub fn warehouse(&self, warehouse_id: &str) -> Option<&Warehouse> {
        self.warehouses.iter().find(|w| w.id == warehouse_id)
    }

    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        serde_json::from_value(serde_json::json!({
            "fields": [
                {"id": "F1", "name": "North", "lots": [{"id": "L1", "name": "A", "area": 2}]},
                {"id": "F2", "name": "South"}
            ],
            "warehouses": [
                {"id": "W1", "name": "Barn", "fieldId": "F1"},
                {"id": "W2", "name": "Silo", "fieldId": "F2"}
            ],
            "products": []
        }))
        .unwrap()
    }

    #[test]
    fn test_lookups() {
        let catalog = catalog();
        assert_eq!(catalog.lots_of("F1").len(), 1);
        assert!(catalog.lots_of("missing").is_empty());
        assert!(catalog.lots_of("").is_empty());

        let (field, lot) = catalog.lot("L1").unwrap();
        assert_eq!(field.id, "F1");
        assert_eq!(lot.name, "A");

        let warehouses = catalog.warehouses_of("F1");
        assert_eq!(warehouses.len(), 1);
        assert_eq!(warehouses[0].id, "W1");
        assert!(catalog.warehouses_of("").is_empty());
        assert_eq!(catalog.field("F2").unwrap().area_unit, "ha");
    }
}
