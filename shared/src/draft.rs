//! In-progress harvest form state.
//!
//! A draft keeps raw form input (numbers and dates as typed) in one struct so
//! it can be validated as a unit and normalized into a store input only when
//! it is submitted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    CompleteHarvestInput, ConsumptionEntry, FieldRef, Harvest, HarvestInput, HarvestMethod,
    HarvestStatus, LotSnapshot, QualityParameter, DEFAULT_AREA_UNIT,
};
use crate::types::{format_date_input, parse_date, parse_number};
use crate::validation::{validate_completion, validate_draft, DraftMode, ValidationErrors};

/// Units a fresh draft starts with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftDefaults {
    pub area_unit: String,
    pub yield_unit: String,
    pub harvested_unit: String,
}

impl Default for DraftDefaults {
    fn default() -> Self {
        Self {
            area_unit: DEFAULT_AREA_UNIT.to_string(),
            yield_unit: "kg/ha".to_string(),
            harvested_unit: "kg".to_string(),
        }
    }
}

/// Create/edit form state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarvestDraft {
    pub field: Option<FieldRef>,
    pub crop: String,
    pub lots: Vec<LotSnapshot>,
    pub total_area: String,
    pub area_unit: String,
    pub planned_date: String,
    pub status: HarvestStatus,
    pub estimated_yield: String,
    pub yield_unit: String,
    pub harvest_method: Option<HarvestMethod>,
    pub machinery: Vec<String>,
    pub workers: String,
    pub target_warehouse: String,
    pub quality_parameters: Vec<QualityParameter>,
    pub notes: String,
    pub products_to_harvest: Vec<ConsumptionEntry>,
}

impl Default for HarvestDraft {
    fn default() -> Self {
        Self::new(&DraftDefaults::default())
    }
}

impl HarvestDraft {
    /// Empty pending draft
    pub fn new(defaults: &DraftDefaults) -> Self {
        Self {
            field: None,
            crop: String::new(),
            lots: Vec::new(),
            total_area: "0".to_string(),
            area_unit: defaults.area_unit.clone(),
            planned_date: String::new(),
            status: HarvestStatus::Pending,
            estimated_yield: String::new(),
            yield_unit: defaults.yield_unit.clone(),
            harvest_method: None,
            machinery: Vec::new(),
            workers: String::new(),
            target_warehouse: String::new(),
            quality_parameters: Vec::new(),
            notes: String::new(),
            products_to_harvest: Vec::new(),
        }
    }

    /// Draft for editing a stored harvest
    pub fn from_harvest(harvest: &Harvest, defaults: &DraftDefaults) -> Self {
        let field = match &harvest.field {
            Some(f) if f.is_well_formed() => Some(f.clone()),
            _ => Some(harvest.effective_field_id())
                .filter(|id| !id.is_empty())
                .map(|id| FieldRef::new(id, "")),
        };
        let or_default = |value: &str, default: &str| {
            if value.is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };

        Self {
            field,
            crop: harvest.crop.clone(),
            lots: harvest.lots.clone(),
            total_area: harvest.total_area.to_string(),
            area_unit: or_default(&harvest.area_unit, &defaults.area_unit),
            planned_date: format_date_input(harvest.planned_date),
            status: harvest.status,
            estimated_yield: harvest
                .estimated_yield
                .map(|y| y.to_string())
                .unwrap_or_default(),
            yield_unit: or_default(&harvest.yield_unit, &defaults.yield_unit),
            harvest_method: harvest.harvest_method,
            machinery: harvest.machinery.clone(),
            workers: harvest.workers.clone(),
            target_warehouse: harvest.target_warehouse.clone(),
            quality_parameters: harvest.quality_parameters.clone(),
            notes: harvest.notes.clone(),
            products_to_harvest: harvest.products_to_harvest.clone(),
        }
    }

    pub fn field_id(&self) -> &str {
        self.field.as_ref().map(|f| f.id.as_str()).unwrap_or("")
    }

    /// Append a machinery tag; blank input is ignored
    pub fn add_machinery(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        self.machinery.push(tag.to_string());
        true
    }

    pub fn remove_machinery(&mut self, index: usize) {
        if index < self.machinery.len() {
            self.machinery.remove(index);
        }
    }

    /// Append a quality parameter; name and value are required
    pub fn add_quality_parameter(&mut self, name: &str, value: &str, unit: &str) -> bool {
        if name.trim().is_empty() || value.trim().is_empty() {
            return false;
        }
        self.quality_parameters
            .push(QualityParameter::new(name.trim(), value.trim(), unit.trim()));
        true
    }

    pub fn remove_quality_parameter(&mut self, index: usize) {
        if index < self.quality_parameters.len() {
            self.quality_parameters.remove(index);
        }
    }

    pub fn validate(&self, mode: DraftMode) -> ValidationErrors {
        validate_draft(self, mode)
    }

    /// Coerce form input into store input.
    ///
    /// Blank area reads as zero, blank yield as `None`, blank date as `None`.
    pub fn normalize(&self) -> HarvestInput {
        let field = self.field.clone().filter(FieldRef::is_well_formed);
        HarvestInput {
            field_id: self.field_id().to_string(),
            field,
            crop: self.crop.clone(),
            lots: self.lots.clone(),
            total_area: parse_number(&self.total_area).unwrap_or(Decimal::ZERO),
            area_unit: self.area_unit.clone(),
            planned_date: parse_date(&self.planned_date),
            status: self.status,
            estimated_yield: parse_number(&self.estimated_yield),
            yield_unit: self.yield_unit.clone(),
            harvest_method: self.harvest_method,
            machinery: self.machinery.clone(),
            workers: self.workers.clone(),
            target_warehouse: self.target_warehouse.clone(),
            quality_parameters: self.quality_parameters.clone(),
            notes: self.notes.clone(),
            products_to_harvest: self.products_to_harvest.clone(),
        }
    }
}

/// Complete-dialog form state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionDraft {
    /// Carried over from the harvest being completed
    pub field_id: String,
    pub crop: String,
    pub harvest_date: String,
    pub actual_yield: String,
    pub total_harvested: String,
    pub total_harvested_unit: String,
    pub destination: String,
    /// Positionally aligned with the harvest's quality parameters
    pub quality_results: Vec<String>,
    pub harvest_notes: String,
    pub products_harvested: Vec<ConsumptionEntry>,
}

impl CompletionDraft {
    /// Prefill from the harvest: today's date, the estimated yield, the target
    /// warehouse as destination and one empty result per quality parameter
    pub fn from_harvest(harvest: &Harvest, today: NaiveDate, defaults: &DraftDefaults) -> Self {
        Self {
            field_id: harvest.effective_field_id().to_string(),
            crop: harvest.crop.clone(),
            harvest_date: format_date_input(Some(today)),
            actual_yield: harvest
                .estimated_yield
                .map(|y| y.to_string())
                .unwrap_or_default(),
            total_harvested: String::new(),
            total_harvested_unit: defaults.harvested_unit.clone(),
            destination: harvest.target_warehouse.clone(),
            quality_results: vec![String::new(); harvest.quality_parameters.len()],
            harvest_notes: String::new(),
            products_harvested: harvest.products_to_harvest.clone(),
        }
    }

    pub fn set_quality_result(&mut self, index: usize, value: &str) {
        if let Some(slot) = self.quality_results.get_mut(index) {
            *slot = value.to_string();
        }
    }

    /// Expected total from area × yield, rounded to 2 places.
    ///
    /// Uses the entered actual yield, falling back to the estimate. `None`
    /// when the product is not positive.
    pub fn estimated_total(
        &self,
        total_area: Decimal,
        estimated_yield: Option<Decimal>,
    ) -> Option<Decimal> {
        let yield_per_area = parse_number(&self.actual_yield)
            .or(estimated_yield)
            .unwrap_or(Decimal::ZERO);
        let total = total_area * yield_per_area;
        (total > Decimal::ZERO).then(|| total.round_dp(2))
    }

    pub fn validate(&self) -> ValidationErrors {
        validate_completion(self)
    }

    /// Coerce form input into completion input.
    ///
    /// Blank actual yield reads as zero, blank total as `None`.
    pub fn normalize(&self) -> CompleteHarvestInput {
        CompleteHarvestInput {
            harvest_date: parse_date(&self.harvest_date),
            actual_yield: parse_number(&self.actual_yield).unwrap_or(Decimal::ZERO),
            total_harvested: parse_number(&self.total_harvested),
            total_harvested_unit: self.total_harvested_unit.clone(),
            destination: self.destination.clone(),
            quality_results: self.quality_results.clone(),
            harvest_notes: self.harvest_notes.clone(),
            products_harvested: self.products_harvested.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn stored_harvest() -> Harvest {
        serde_json::from_value(serde_json::json!({
            "id": "H1",
            "fieldId": "F1",
            "field": {"id": "F1", "name": "North"},
            "crop": "soja",
            "lots": [{"id": "L1", "name": "A", "area": 2.5}],
            "totalArea": 2.5,
            "plannedDate": "2024-03-15",
            "estimatedYield": 3200,
            "targetWarehouse": "W1",
            "qualityParameters": ["Humidity", "Protein"],
            "productsToHarvest": [{"productId": "P1", "quantity": 50, "availableStock": 200}]
        }))
        .unwrap()
    }

    #[test]
    fn test_new_draft_defaults() {
        let draft = HarvestDraft::default();
        assert_eq!(draft.status, HarvestStatus::Pending);
        assert_eq!(draft.area_unit, "ha");
        assert_eq!(draft.yield_unit, "kg/ha");
        assert_eq!(draft.field_id(), "");
    }

    #[test]
    fn test_from_harvest_formats_inputs() {
        let draft = HarvestDraft::from_harvest(&stored_harvest(), &DraftDefaults::default());
        assert_eq!(draft.field_id(), "F1");
        assert_eq!(draft.planned_date, "2024-03-15");
        assert_eq!(draft.estimated_yield, "3200");
        assert_eq!(draft.total_area, "2.5");
        assert_eq!(draft.quality_parameters.len(), 2);
    }

    #[test]
    fn test_nameless_field_is_not_persisted_as_snapshot() {
        let harvest: Harvest = serde_json::from_value(serde_json::json!({
            "id": "H2", "field": {"id": "F1", "name": ""}
        }))
        .unwrap();
        let draft = HarvestDraft::from_harvest(&harvest, &DraftDefaults::default());
        assert_eq!(draft.field_id(), "F1");

        let input = draft.normalize();
        assert_eq!(input.field_id, "F1");
        assert_eq!(input.field, None);
    }

    #[test]
    fn test_normalize_coercions() {
        let mut draft = HarvestDraft::default();
        draft.field = Some(FieldRef::new("F1", "North"));
        draft.total_area = "".to_string();
        draft.estimated_yield = "".to_string();
        draft.planned_date = "".to_string();

        let input = draft.normalize();
        assert_eq!(input.total_area, Decimal::ZERO);
        assert_eq!(input.estimated_yield, None);
        assert_eq!(input.planned_date, None);
        assert_eq!(input.field_id, "F1");

        draft.total_area = "12.75".to_string();
        draft.estimated_yield = " 4000 ".to_string();
        draft.planned_date = "2024-05-02".to_string();
        let input = draft.normalize();
        assert_eq!(input.total_area, dec("12.75"));
        assert_eq!(input.estimated_yield, Some(dec("4000")));
        assert_eq!(input.planned_date, NaiveDate::from_ymd_opt(2024, 5, 2));
    }

    #[test]
    fn test_machinery_and_quality_helpers() {
        let mut draft = HarvestDraft::default();
        assert!(draft.add_machinery("  Combine 9600 "));
        assert!(!draft.add_machinery("   "));
        assert_eq!(draft.machinery, vec!["Combine 9600".to_string()]);
        draft.remove_machinery(5);
        draft.remove_machinery(0);
        assert!(draft.machinery.is_empty());

        assert!(draft.add_quality_parameter("Humidity", "14", "%"));
        assert!(!draft.add_quality_parameter("Protein", "", "%"));
        assert_eq!(draft.quality_parameters.len(), 1);
        draft.remove_quality_parameter(0);
        assert!(draft.quality_parameters.is_empty());
    }

    #[test]
    fn test_completion_prefill() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let draft = CompletionDraft::from_harvest(&stored_harvest(), today, &DraftDefaults::default());
        assert_eq!(draft.harvest_date, "2024-04-02");
        assert_eq!(draft.actual_yield, "3200");
        assert_eq!(draft.destination, "W1");
        assert_eq!(draft.quality_results, vec![String::new(), String::new()]);
        assert_eq!(draft.products_harvested.len(), 1);
        assert_eq!(draft.total_harvested_unit, "kg");
    }

    #[test]
    fn test_completion_normalize_and_estimate() {
        let mut draft = CompletionDraft::default();
        draft.actual_yield = "".to_string();
        draft.total_harvested = "".to_string();
        let input = draft.normalize();
        assert_eq!(input.actual_yield, Decimal::ZERO);
        assert_eq!(input.total_harvested, None);
        assert_eq!(input.harvest_date, None);

        assert_eq!(draft.estimated_total(dec("2.5"), Some(dec("3000"))), Some(dec("7500")));
        draft.actual_yield = "1000.333".to_string();
        assert_eq!(draft.estimated_total(dec("2"), Some(dec("3000"))), Some(dec("2000.67")));
        assert_eq!(draft.estimated_total(Decimal::ZERO, Some(dec("3000"))), None);
    }

    #[test]
    fn test_set_quality_result_ignores_out_of_range() {
        let mut draft = CompletionDraft {
            quality_results: vec![String::new()],
            ..Default::default()
        };
        draft.set_quality_result(0, "13.5");
        draft.set_quality_result(3, "x");
        assert_eq!(draft.quality_results, vec!["13.5".to_string()]);
    }
}
