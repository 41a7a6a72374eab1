//! WebAssembly module for the harvest planner
//!
//! Exposes the browser-side pieces of the harvests screen:
//! - Harvest list filtering
//! - Draft validation and normalization
//! - Stock reconciliation planning
//! - The cascading harvest form
//!
//! Structured values cross the boundary as JSON strings.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::*;

fn parse<T: serde::de::DeserializeOwned>(what: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn draft_mode(mode: &str) -> Result<DraftMode, String> {
    match mode {
        "create" => Ok(DraftMode::Create),
        "edit" => Ok(DraftMode::Edit),
        other => Err(format!("Unknown draft mode: {}", other)),
    }
}

fn decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

fn today() -> NaiveDate {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
    .unwrap_or_default()
}

// ============================================================================
// Pure helpers
// ============================================================================

fn filter_harvests_json(
    harvests_json: &str,
    fields_json: &str,
    criteria_json: &str,
) -> Result<String, String> {
    let harvests: Vec<Harvest> = parse("harvests", harvests_json)?;
    let fields: Vec<Field> = parse("fields", fields_json)?;
    let criteria: HarvestFilters = parse("filter", criteria_json)?;
    to_json(&shared::filter_harvests(&harvests, &fields, &criteria))
}

fn validate_draft_json(draft_json: &str, mode: &str) -> Result<String, String> {
    let draft: HarvestDraft = parse("draft", draft_json)?;
    to_json(&draft.validate(draft_mode(mode)?))
}

fn normalize_draft_json(draft_json: &str) -> Result<String, String> {
    let draft: HarvestDraft = parse("draft", draft_json)?;
    to_json(&draft.normalize())
}

fn validate_completion_json(draft_json: &str) -> Result<String, String> {
    let draft: CompletionDraft = parse("completion", draft_json)?;
    to_json(&draft.validate())
}

fn reconciliation_plan(entries_json: &str, products_json: &str) -> Result<ReconciliationPlan, String> {
    let entries: Vec<ConsumptionEntry> = parse("consumption", entries_json)?;
    let products: Vec<Product> = parse("products", products_json)?;
    Ok(shared::reconcile(&entries, &products))
}

fn stock_status_json(product_json: &str) -> Result<String, String> {
    let product: Product = parse("product", product_json)?;
    to_json(&product.stock_status())
}

fn estimate_total(total_area: f64, actual_yield: &str, estimated_yield: Option<f64>) -> Option<f64> {
    let draft = CompletionDraft {
        actual_yield: actual_yield.to_string(),
        ..CompletionDraft::default()
    };
    draft
        .estimated_total(decimal(total_area), estimated_yield.map(decimal))
        .and_then(|total| total.to_f64())
}

// ============================================================================
// Exports
// ============================================================================

/// Filter a harvest list; each result carries its resolved field
#[wasm_bindgen]
pub fn filter_harvests(
    harvests_json: &str,
    fields_json: &str,
    criteria_json: &str,
) -> Result<String, JsValue> {
    filter_harvests_json(harvests_json, fields_json, criteria_json).map_err(|e| JsValue::from_str(&e))
}

/// Validate a harvest draft; returns a field → message map
#[wasm_bindgen]
pub fn validate_harvest_draft(draft_json: &str, mode: &str) -> Result<String, JsValue> {
    validate_draft_json(draft_json, mode).map_err(|e| JsValue::from_str(&e))
}

/// Convert a harvest draft to the persisted input shape
#[wasm_bindgen]
pub fn normalize_harvest_draft(draft_json: &str) -> Result<String, JsValue> {
    normalize_draft_json(draft_json).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen]
pub fn validate_completion_draft(draft_json: &str) -> Result<String, JsValue> {
    validate_completion_json(draft_json).map_err(|e| JsValue::from_str(&e))
}

/// Completion form prefilled from a harvest, dated today
#[wasm_bindgen]
pub fn prepare_completion(harvest_json: &str) -> Result<String, JsValue> {
    let harvest: Harvest = parse("harvest", harvest_json).map_err(|e| JsValue::from_str(&e))?;
    let draft = CompletionDraft::from_harvest(&harvest, today(), &DraftDefaults::default());
    to_json(&draft).map_err(|e| JsValue::from_str(&e))
}

/// Plan the stock decrements for consumed products.
///
/// Products missing from the list are reported on the console and left out
/// of the plan.
#[wasm_bindgen]
pub fn plan_stock_reconciliation(entries_json: &str, products_json: &str) -> Result<String, JsValue> {
    let plan = reconciliation_plan(entries_json, products_json).map_err(|e| JsValue::from_str(&e))?;
    for product_id in &plan.missing {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "Product {} not found, stock not updated",
            product_id
        )));
    }
    to_json(&plan).map_err(|e| JsValue::from_str(&e))
}

/// `"empty"`, `"low"` or `"available"` for a product's stock level
#[wasm_bindgen]
pub fn product_stock_status(product_json: &str) -> Result<String, JsValue> {
    stock_status_json(product_json).map_err(|e| JsValue::from_str(&e))
}

/// Expected harvested total (area × yield); undefined when not positive
#[wasm_bindgen]
pub fn estimate_total_harvested(
    total_area: f64,
    actual_yield: &str,
    estimated_yield: Option<f64>,
) -> Option<f64> {
    estimate_total(total_area, actual_yield, estimated_yield)
}

/// Clamp a typed quantity to `[0, stock]`
#[wasm_bindgen]
pub fn clamp_product_quantity(raw: &str, stock: f64) -> f64 {
    shared::clamp_quantity(raw, decimal(stock))
        .to_f64()
        .unwrap_or(0.0)
}

// ============================================================================
// Harvest form
// ============================================================================

/// Add/edit form state: field → lots → products cascade over a catalog
#[wasm_bindgen]
pub struct HarvestForm {
    cascade: SelectionCascade,
}

impl HarvestForm {
    fn from_json(catalog_json: &str, draft_json: &str) -> Result<Self, String> {
        let catalog: Catalog = parse("catalog", catalog_json)?;
        let draft: HarvestDraft = if draft_json.trim().is_empty() {
            HarvestDraft::new(&DraftDefaults::default())
        } else {
            parse("draft", draft_json)?
        };
        Ok(Self {
            cascade: SelectionCascade::new(
                Arc::new(catalog),
                HarvestableCategories::default(),
                draft,
            ),
        })
    }

    fn set_filter_level(&mut self, level: &str) -> Result<(), String> {
        let level: ProductFilterLevel =
            serde_json::from_value(serde_json::Value::String(level.to_string()))
                .map_err(|e| format!("Invalid filter level: {}", e))?;
        self.cascade.set_product_filter_level(level);
        Ok(())
    }
}

#[wasm_bindgen]
impl HarvestForm {
    /// An empty `draft_json` starts a new draft
    #[wasm_bindgen(constructor)]
    pub fn new(catalog_json: &str, draft_json: &str) -> Result<HarvestForm, JsValue> {
        Self::from_json(catalog_json, draft_json).map_err(|e| JsValue::from_str(&e))
    }

    pub fn select_field(&mut self, field_id: &str) {
        self.cascade.select_field(field_id);
    }

    pub fn toggle_lot(&mut self, lot_id: &str) {
        self.cascade.toggle_lot_by_id(lot_id);
    }

    pub fn set_total_area(&mut self, raw: &str) {
        self.cascade.set_total_area(raw);
    }

    /// `field`, `lot` or `warehouse`; clears the selected products
    pub fn set_product_filter_level(&mut self, level: &str) -> Result<(), JsValue> {
        self.set_filter_level(level).map_err(|e| JsValue::from_str(&e))
    }

    pub fn set_product_filter_target(&mut self, selected_id: &str) {
        self.cascade.set_product_filter_target(selected_id);
    }

    /// Returns whether the product is selected afterwards
    pub fn toggle_product(&mut self, product_id: &str) -> bool {
        self.cascade.toggle_product_by_id(product_id)
    }

    pub fn set_quantity(&mut self, product_id: &str, raw: &str) {
        self.cascade.set_quantity(product_id, raw);
    }

    pub fn draft(&self) -> Result<String, JsValue> {
        to_json(self.cascade.draft()).map_err(|e| JsValue::from_str(&e))
    }

    pub fn available_lots(&self) -> Result<String, JsValue> {
        to_json(&self.cascade.available_lots()).map_err(|e| JsValue::from_str(&e))
    }

    pub fn available_warehouses(&self) -> Result<String, JsValue> {
        to_json(&self.cascade.available_warehouses()).map_err(|e| JsValue::from_str(&e))
    }

    pub fn available_products(&self) -> Result<String, JsValue> {
        to_json(&self.cascade.available_products()).map_err(|e| JsValue::from_str(&e))
    }

    pub fn validate(&self, mode: &str) -> Result<String, JsValue> {
        draft_mode(mode)
            .and_then(|mode| to_json(&self.cascade.draft().validate(mode)))
            .map_err(|e| JsValue::from_str(&e))
    }

    pub fn normalize(&self) -> Result<String, JsValue> {
        to_json(&self.cascade.draft().normalize()).map_err(|e| JsValue::from_str(&e))
    }
}
