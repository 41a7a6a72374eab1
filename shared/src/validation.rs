//! Validation for harvest and completion drafts
//!
//! Each rule is a small function returning `Result<(), &'static str>`; the
//! draft validators collect rule failures into a field → message map.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::draft::{CompletionDraft, HarvestDraft};
use crate::models::{ConsumptionEntry, HarvestStatus};
use crate::types::{is_numeric_or_blank, parse_date, parse_number};

/// Which dialog a draft belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    Create,
    Edit,
}

/// Field → message map; empty iff the draft can be submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Record `field` when the rule failed
    fn check(&mut self, field: &str, rule: Result<(), &'static str>) {
        if let Err(message) = rule {
            self.insert(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

// ============================================================================
// Field Rules
// ============================================================================

pub fn validate_field_selected(field_id: &str) -> Result<(), &'static str> {
    if field_id.trim().is_empty() {
        return Err("Select a field");
    }
    Ok(())
}

pub fn validate_crop(crop: &str) -> Result<(), &'static str> {
    if crop.trim().is_empty() {
        return Err("Crop is required");
    }
    Ok(())
}

pub fn validate_lots_selected(lot_count: usize) -> Result<(), &'static str> {
    if lot_count == 0 {
        return Err("Select at least one lot");
    }
    Ok(())
}

/// Required date input
pub fn validate_required_date(input: &str) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        return Err("Date is required");
    }
    if parse_date(input).is_none() {
        return Err("Date is not valid");
    }
    Ok(())
}

/// Optional numeric input; blank passes
pub fn validate_numeric(input: &str) -> Result<(), &'static str> {
    if !is_numeric_or_blank(input) {
        return Err("Must be a number");
    }
    Ok(())
}

pub fn validate_required_numeric(input: &str) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        return Err("Value is required");
    }
    validate_numeric(input)
}

/// Non-numeric or negative areas are rejected
pub fn validate_area(input: &str) -> Result<(), &'static str> {
    validate_numeric(input)?;
    match parse_number(input) {
        Some(area) if area < Decimal::ZERO => Err("Area cannot be negative"),
        _ => Ok(()),
    }
}

/// Every entry's quantity lies within its captured stock
pub fn validate_consumption(entries: &[ConsumptionEntry]) -> Result<(), &'static str> {
    for entry in entries {
        if entry.quantity < Decimal::ZERO {
            return Err("Quantities cannot be negative");
        }
        if entry.quantity > entry.available_stock {
            return Err("Quantity exceeds available stock");
        }
    }
    Ok(())
}

/// New harvests always start pending
pub fn validate_initial_status(status: HarvestStatus) -> Result<(), &'static str> {
    if status != HarvestStatus::Pending {
        return Err("New harvests must start as pending");
    }
    Ok(())
}

// ============================================================================
// Draft Validation
// ============================================================================

/// Validate a create/edit draft
pub fn validate_draft(draft: &HarvestDraft, mode: DraftMode) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    errors.check("fieldId", validate_field_selected(draft.field_id()));
    errors.check("crop", validate_crop(&draft.crop));
    errors.check("lots", validate_lots_selected(draft.lots.len()));
    errors.check("plannedDate", validate_required_date(&draft.planned_date));
    errors.check("estimatedYield", validate_numeric(&draft.estimated_yield));
    errors.check("totalArea", validate_area(&draft.total_area));
    errors.check(
        "productsToHarvest",
        validate_consumption(&draft.products_to_harvest),
    );
    if mode == DraftMode::Create {
        errors.check("status", validate_initial_status(draft.status));
    }

    errors
}

/// Validate the complete dialog
pub fn validate_completion(draft: &CompletionDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    errors.check("fieldId", validate_field_selected(&draft.field_id));
    errors.check("crop", validate_crop(&draft.crop));
    errors.check("harvestDate", validate_required_date(&draft.harvest_date));
    errors.check("actualYield", validate_required_numeric(&draft.actual_yield));
    errors.check("totalHarvested", validate_numeric(&draft.total_harvested));
    errors.check(
        "productsHarvested",
        validate_consumption(&draft.products_harvested),
    );

    errors
}
