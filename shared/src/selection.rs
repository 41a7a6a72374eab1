//! Field → lots → products → warehouse selection
//!
//! [`SelectionCascade`] owns the draft of the harvest dialog and keeps the
//! derived option lists consistent with it. [`ProductPicker`] is the
//! standalone product browser with its own filters.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::draft::HarvestDraft;
use crate::filter::UNKNOWN_FIELD;
use crate::models::{
    Catalog, ConsumptionEntry, HarvestableCategories, Lot, Product, ProductCategory, Warehouse,
};
use crate::types::parse_number;

/// Clamp raw quantity input into `[0, max]`; non-numeric input reads as zero
pub fn clamp_quantity(raw: &str, max: Decimal) -> Decimal {
    let quantity = parse_number(raw).unwrap_or(Decimal::ZERO);
    quantity.max(Decimal::ZERO).min(max.max(Decimal::ZERO))
}

/// What the product list is scoped by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductFilterLevel {
    #[default]
    Field,
    Lot,
    Warehouse,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub level: ProductFilterLevel,
    pub selected_id: String,
}

impl ProductFilter {
    fn matches(&self, product: &Product) -> bool {
        let scope = match self.level {
            ProductFilterLevel::Field => &product.field_id,
            ProductFilterLevel::Lot => &product.lot_id,
            ProductFilterLevel::Warehouse => &product.warehouse_id,
        };
        scope.as_deref() == Some(self.selected_id.as_str())
    }
}

fn snapshot_entry(product: &Product, quantity: Decimal) -> ConsumptionEntry {
    ConsumptionEntry {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        code: product.code.clone(),
        unit: product.unit.clone(),
        category: Some(product.category.clone()),
        storage_type: product.storage_type.clone(),
        quantity,
        available_stock: product.stock,
        field_id: product.field_id.clone(),
        field_name: None,
        warehouse_id: product.warehouse_id.clone(),
        warehouse_name: None,
        lot_id: product.lot_id.clone(),
        lot_name: None,
    }
}

/// Harvest dialog state: the draft plus the option lists derived from it
#[derive(Debug, Clone)]
pub struct SelectionCascade {
    catalog: Arc<Catalog>,
    harvestable: HarvestableCategories,
    draft: HarvestDraft,
    product_filter: ProductFilter,
    available_lots: Vec<Lot>,
    available_warehouses: Vec<Warehouse>,
    available_products: Vec<Product>,
}

impl SelectionCascade {
    pub fn new(catalog: Arc<Catalog>, harvestable: HarvestableCategories, draft: HarvestDraft) -> Self {
        let mut cascade = Self {
            catalog,
            harvestable,
            draft: HarvestDraft::default(),
            product_filter: ProductFilter::default(),
            available_lots: Vec::new(),
            available_warehouses: Vec::new(),
            available_products: Vec::new(),
        };
        cascade.restore(draft);
        cascade
    }

    pub fn draft(&self) -> &HarvestDraft {
        &self.draft
    }

    /// Plain form fields (crop, dates, notes, ...). Selections should go
    /// through the cascade operations so derived lists stay in step.
    pub fn draft_mut(&mut self) -> &mut HarvestDraft {
        &mut self.draft
    }

    pub fn into_draft(self) -> HarvestDraft {
        self.draft
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn product_filter(&self) -> &ProductFilter {
        &self.product_filter
    }

    pub fn available_lots(&self) -> &[Lot] {
        &self.available_lots
    }

    pub fn available_warehouses(&self) -> &[Warehouse] {
        &self.available_warehouses
    }

    pub fn available_products(&self) -> &[Product] {
        &self.available_products
    }

    /// Pick a field. Lots, area, product filter and selected products are
    /// reset; an unknown or empty id clears the field and every list.
    pub fn select_field(&mut self, field_id: &str) {
        self.draft.lots.clear();
        self.draft.total_area = "0".to_string();
        self.draft.products_to_harvest.clear();

        match self.catalog.field(field_id) {
            Some(field) => {
                self.draft.field = Some(field.reference());
                self.draft.area_unit = field.area_unit.clone();
                if let Some(crop) = field.default_crop() {
                    self.draft.crop = crop.to_string();
                }
                self.available_lots = field.lots.clone();
                self.available_warehouses = self.catalog.warehouses_of(&field.id);
                self.product_filter = ProductFilter {
                    level: ProductFilterLevel::Field,
                    selected_id: field.id.clone(),
                };
            }
            None => {
                self.draft.field = None;
                self.available_lots.clear();
                self.available_warehouses.clear();
                self.product_filter = ProductFilter::default();
            }
        }
        self.refresh_products();
    }

    /// Add the lot, or remove it when already selected
    pub fn toggle_lot(&mut self, lot: &Lot) {
        if let Some(pos) = self.draft.lots.iter().position(|l| l.id == lot.id) {
            self.draft.lots.remove(pos);
        } else {
            self.draft.lots.push(lot.snapshot());
        }
        self.recompute_area();
    }

    /// Unknown ids are ignored
    pub fn toggle_lot_by_id(&mut self, lot_id: &str) {
        if let Some(pos) = self.draft.lots.iter().position(|l| l.id == lot_id) {
            self.draft.lots.remove(pos);
            self.recompute_area();
            return;
        }
        if let Some(lot) = self.available_lots.iter().find(|l| l.id == lot_id).cloned() {
            self.toggle_lot(&lot);
        }
    }

    fn recompute_area(&mut self) {
        let total: Decimal = self.draft.lots.iter().map(|l| l.area).sum();
        self.draft.total_area = total.normalize().to_string();
    }

    pub fn set_total_area(&mut self, raw: &str) {
        self.draft.total_area = raw.to_string();
    }

    pub fn set_product_filter_level(&mut self, level: ProductFilterLevel) {
        self.product_filter = ProductFilter {
            level,
            selected_id: String::new(),
        };
        self.available_products.clear();
        self.draft.products_to_harvest.clear();
    }

    pub fn set_product_filter_target(&mut self, selected_id: &str) {
        self.product_filter.selected_id = selected_id.to_string();
        self.draft.products_to_harvest.clear();
        self.refresh_products();
    }

    fn refresh_products(&mut self) {
        if self.product_filter.selected_id.is_empty() {
            self.available_products.clear();
            return;
        }
        self.available_products = self
            .catalog
            .products
            .iter()
            .filter(|p| self.product_filter.matches(p) && self.harvestable.admits(p))
            .cloned()
            .collect();
    }

    /// Select the product with quantity 0, or drop it when already selected.
    /// Returns whether the product is now selected.
    pub fn toggle_product(&mut self, product: &Product) -> bool {
        let entries = &mut self.draft.products_to_harvest;
        if let Some(pos) = entries.iter().position(|e| e.product_id == product.id) {
            entries.remove(pos);
            false
        } else {
            entries.push(snapshot_entry(product, Decimal::ZERO));
            true
        }
    }

    /// Toggle one of the available products; unknown ids are ignored
    pub fn toggle_product_by_id(&mut self, product_id: &str) -> bool {
        match self.available_products.iter().find(|p| p.id == product_id).cloned() {
            Some(product) => self.toggle_product(&product),
            None => false,
        }
    }

    /// Set a selected product's quantity, clamped to its captured stock
    pub fn set_quantity(&mut self, product_id: &str, raw: &str) {
        if let Some(entry) = self
            .draft
            .products_to_harvest
            .iter_mut()
            .find(|e| e.product_id == product_id)
        {
            entry.quantity = clamp_quantity(raw, entry.available_stock);
        }
    }

    /// Seed a fresh draft with a field and lots
    pub fn preselect(&mut self, field_id: &str, lot_ids: &[String]) {
        self.select_field(field_id);
        for lot_id in lot_ids {
            if !self.draft.lots.iter().any(|l| &l.id == lot_id) {
                self.toggle_lot_by_id(lot_id);
            }
        }
    }

    /// Adopt an existing draft and rebuild the derived lists without touching
    /// its selections
    pub fn restore(&mut self, draft: HarvestDraft) {
        self.draft = draft;
        let field_id = self.draft.field_id().to_string();
        if let Some(field) = self.catalog.field(&field_id) {
            if let Some(snapshot) = self.draft.field.as_mut().filter(|f| f.name.is_empty()) {
                snapshot.name = field.name.clone();
            }
        }
        self.available_lots = self.catalog.lots_of(&field_id).to_vec();
        self.available_warehouses = self.catalog.warehouses_of(&field_id);
        self.product_filter = ProductFilter {
            level: ProductFilterLevel::Field,
            selected_id: field_id,
        };
        self.refresh_products();
    }
}

/// Product browser filters; empty strings mean no constraint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PickerFilters {
    pub field_id: String,
    pub warehouse_id: String,
    pub lot_id: String,
    pub category: Option<ProductCategory>,
    pub search_term: String,
}

fn scoped(filter: &str, value: &Option<String>) -> bool {
    filter.is_empty() || value.as_deref() == Some(filter)
}

impl PickerFilters {
    fn matches(&self, product: &Product) -> bool {
        if !scoped(&self.field_id, &product.field_id)
            || !scoped(&self.warehouse_id, &product.warehouse_id)
            || !scoped(&self.lot_id, &product.lot_id)
        {
            return false;
        }
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        let term = self.search_term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let hit = |value: Option<&str>| value.is_some_and(|v| v.to_lowercase().contains(&term));
        hit(Some(product.name.as_str())) || hit(product.code.as_deref()) || hit(product.lot_number.as_deref())
    }
}

/// Standalone product selection with location filters and search
#[derive(Debug, Clone)]
pub struct ProductPicker {
    catalog: Arc<Catalog>,
    harvestable: HarvestableCategories,
    filters: PickerFilters,
    selected: Vec<ConsumptionEntry>,
}

impl ProductPicker {
    pub fn new(
        catalog: Arc<Catalog>,
        harvestable: HarvestableCategories,
        selected: Vec<ConsumptionEntry>,
    ) -> Self {
        Self {
            catalog,
            harvestable,
            filters: PickerFilters::default(),
            selected,
        }
    }

    pub fn filters(&self) -> &PickerFilters {
        &self.filters
    }

    /// Changing the field clears the warehouse and lot filters
    pub fn set_field(&mut self, field_id: &str) {
        self.filters.field_id = field_id.to_string();
        self.filters.warehouse_id.clear();
        self.filters.lot_id.clear();
    }

    pub fn set_warehouse(&mut self, warehouse_id: &str) {
        self.filters.warehouse_id = warehouse_id.to_string();
    }

    pub fn set_lot(&mut self, lot_id: &str) {
        self.filters.lot_id = lot_id.to_string();
    }

    pub fn set_category(&mut self, category: Option<ProductCategory>) {
        self.filters.category = category;
    }

    pub fn set_search(&mut self, term: &str) {
        self.filters.search_term = term.to_string();
    }

    /// Warehouses of the filtered field
    pub fn warehouses(&self) -> Vec<Warehouse> {
        self.catalog.warehouses_of(&self.filters.field_id)
    }

    /// Lots of the filtered field
    pub fn lots(&self) -> &[Lot] {
        self.catalog.lots_of(&self.filters.field_id)
    }

    /// Harvestable, in-stock products passing the filters
    pub fn products(&self) -> Vec<&Product> {
        self.catalog
            .products
            .iter()
            .filter(|p| self.harvestable.admits(p) && self.filters.matches(p))
            .collect()
    }

    pub fn is_selected(&self, product_id: &str) -> bool {
        self.selected.iter().any(|e| e.product_id == product_id)
    }

    /// Select with quantity `min(stock, 1)` and resolved location names, or
    /// drop when already selected
    pub fn toggle(&mut self, product: &Product) -> bool {
        if let Some(pos) = self.selected.iter().position(|e| e.product_id == product.id) {
            self.selected.remove(pos);
            return false;
        }
        let mut entry = snapshot_entry(product, product.stock.min(Decimal::ONE));
        entry.field_name = Some(
            product
                .field_id
                .as_deref()
                .and_then(|id| self.catalog.field(id))
                .map(|f| f.name.clone())
                .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
        );
        entry.warehouse_name = product
            .warehouse_id
            .as_deref()
            .and_then(|id| self.catalog.warehouse(id))
            .map(|w| w.name.clone());
        entry.lot_name = product
            .lot_id
            .as_deref()
            .and_then(|id| self.catalog.lot(id))
            .map(|(_, lot)| lot.name.clone());
        self.selected.push(entry);
        true
    }

    pub fn set_quantity(&mut self, product_id: &str, raw: &str) {
        if let Some(entry) = self.selected.iter_mut().find(|e| e.product_id == product_id) {
            entry.quantity = clamp_quantity(raw, entry.available_stock);
        }
    }

    pub fn remove(&mut self, product_id: &str) {
        self.selected.retain(|e| e.product_id != product_id);
    }

    pub fn selected(&self) -> &[ConsumptionEntry] {
        &self.selected
    }

    pub fn into_selected(self) -> Vec<ConsumptionEntry> {
        self.selected
    }
}
