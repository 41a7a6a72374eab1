//! Harvest models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::ProductCategory;
use crate::types::lenient;

/// Lifecycle status of a harvest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestStatus {
    #[default]
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl HarvestStatus {
    pub const ALL: [HarvestStatus; 5] = [
        HarvestStatus::Pending,
        HarvestStatus::Scheduled,
        HarvestStatus::InProgress,
        HarvestStatus::Completed,
        HarvestStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HarvestStatus::Pending => "pending",
            HarvestStatus::Scheduled => "scheduled",
            HarvestStatus::InProgress => "in_progress",
            HarvestStatus::Completed => "completed",
            HarvestStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Completed and cancelled harvests accept no further changes
    pub fn is_terminal(&self) -> bool {
        matches!(self, HarvestStatus::Completed | HarvestStatus::Cancelled)
    }

    /// Whether a stored harvest in this status may be saved with `next`.
    ///
    /// Pending and scheduled are interchangeable planning states; both move to
    /// in progress. Every non-terminal state may be completed or cancelled.
    pub fn can_transition_to(&self, next: HarvestStatus) -> bool {
        use HarvestStatus::*;

        if self.is_terminal() {
            return false;
        }
        match (*self, next) {
            (Pending | Scheduled, Pending | Scheduled | InProgress) => true,
            (InProgress, InProgress) => true,
            (_, Completed | Cancelled) => true,
            _ => false,
        }
    }

    /// Only harvests that never left the planning stage can be deleted
    pub fn is_deletable(&self) -> bool {
        matches!(self, HarvestStatus::Pending)
    }
}

impl std::fmt::Display for HarvestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the crop is collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarvestMethod {
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "mechanical")]
    Mechanical,
    #[serde(rename = "semi-mechanical", alias = "combined", alias = "semi_mechanical")]
    SemiMechanical,
}

impl HarvestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HarvestMethod::Manual => "manual",
            HarvestMethod::Mechanical => "mechanical",
            HarvestMethod::SemiMechanical => "semi-mechanical",
        }
    }

    /// Canonical name first, then the names stored records may still carry
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            HarvestMethod::Manual => &["manual"],
            HarvestMethod::Mechanical => &["mechanical"],
            HarvestMethod::SemiMechanical => &["semi-mechanical", "semi_mechanical", "combined"],
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "manual" => Some(HarvestMethod::Manual),
            "mechanical" => Some(HarvestMethod::Mechanical),
            "semi-mechanical" | "semi_mechanical" | "combined" => {
                Some(HarvestMethod::SemiMechanical)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for HarvestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads an empty or unknown method as `None`
fn deserialize_method<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<HarvestMethod>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(HarvestMethod::parse))
}

/// Denormalized `{id, name}` copy of the harvested field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl FieldRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// A reference is usable for display only when it carries both an id
    /// and a name
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty() && !self.name.is_empty()
    }
}

/// Lot as it was when selected for the harvest. Not live-linked to the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotSnapshot {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "lenient::decimal")]
    pub area: Decimal,
    #[serde(default)]
    pub area_unit: String,
}

/// A quality parameter to measure at completion.
///
/// Older records store plain labels; those read as a parameter with the label
/// as its name and empty value and unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QualityParameterShape")]
pub struct QualityParameter {
    pub name: String,
    pub value: String,
    pub unit: String,
}

impl QualityParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: unit.into(),
        }
    }

    /// Adapter for the plain-label shape
    pub fn from_label(label: impl Into<String>) -> Self {
        Self::new(label, "", "")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QualityParameterShape {
    Label(String),
    Detailed {
        name: String,
        #[serde(default)]
        value: serde_json::Value,
        #[serde(default)]
        unit: String,
    },
}

impl From<QualityParameterShape> for QualityParameter {
    fn from(shape: QualityParameterShape) -> Self {
        match shape {
            QualityParameterShape::Label(label) => QualityParameter::from_label(label),
            QualityParameterShape::Detailed { name, value, unit } => {
                let value = match value {
                    serde_json::Value::Null => String::new(),
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                QualityParameter { name, value, unit }
            }
        }
    }
}

/// Point-in-time copy of a product selected for a harvest.
///
/// `available_stock` is the stock captured at selection time; `product_id` is
/// kept for lookup only. Reads every shape the planning and product panels
/// have written (`quantityToHarvest`, `harvestQuantity`, `maxQuantity`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionEntry {
    #[serde(alias = "id")]
    pub product_id: String,
    #[serde(default, alias = "name")]
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(
        default,
        alias = "quantityToHarvest",
        alias = "harvestQuantity",
        alias = "quantityUsed",
        with = "lenient::decimal"
    )]
    pub quantity: Decimal,
    #[serde(default, alias = "maxQuantity", with = "lenient::decimal")]
    pub available_stock: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_name: Option<String>,
}

impl ConsumptionEntry {
    /// Quantity lies within `[0, available_stock]`
    pub fn is_within_stock(&self) -> bool {
        self.quantity >= Decimal::ZERO && self.quantity <= self.available_stock
    }
}

/// A harvest record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Harvest {
    pub id: String,
    #[serde(default)]
    pub field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldRef>,
    #[serde(default)]
    pub crop: String,
    #[serde(default)]
    pub lots: Vec<LotSnapshot>,
    #[serde(default, with = "lenient::decimal")]
    pub total_area: Decimal,
    #[serde(default)]
    pub area_unit: String,
    #[serde(default, with = "lenient::opt_date")]
    pub planned_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: HarvestStatus,
    #[serde(default, with = "lenient::opt_decimal")]
    pub estimated_yield: Option<Decimal>,
    #[serde(default)]
    pub yield_unit: String,
    #[serde(default, deserialize_with = "deserialize_method")]
    pub harvest_method: Option<HarvestMethod>,
    #[serde(default)]
    pub machinery: Vec<String>,
    #[serde(default)]
    pub workers: String,
    #[serde(default)]
    pub target_warehouse: String,
    #[serde(default)]
    pub quality_parameters: Vec<QualityParameter>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, alias = "selectedProducts")]
    pub products_to_harvest: Vec<ConsumptionEntry>,

    // Set by the completion flow
    #[serde(default, with = "lenient::opt_date")]
    pub harvest_date: Option<NaiveDate>,
    #[serde(default, with = "lenient::opt_decimal")]
    pub actual_yield: Option<Decimal>,
    #[serde(default, with = "lenient::opt_decimal")]
    pub total_harvested: Option<Decimal>,
    #[serde(default)]
    pub total_harvested_unit: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub quality_results: Vec<String>,
    #[serde(default)]
    pub harvest_notes: String,
    #[serde(default)]
    pub products_harvested: Vec<ConsumptionEntry>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Planning data sent to the store on create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestInput {
    pub field_id: String,
    pub field: Option<FieldRef>,
    pub crop: String,
    pub lots: Vec<LotSnapshot>,
    #[serde(with = "lenient::decimal")]
    pub total_area: Decimal,
    pub area_unit: String,
    #[serde(default, with = "lenient::opt_date")]
    pub planned_date: Option<NaiveDate>,
    pub status: HarvestStatus,
    #[serde(default, with = "lenient::opt_decimal")]
    pub estimated_yield: Option<Decimal>,
    pub yield_unit: String,
    #[serde(default, deserialize_with = "deserialize_method")]
    pub harvest_method: Option<HarvestMethod>,
    pub machinery: Vec<String>,
    pub workers: String,
    pub target_warehouse: String,
    pub quality_parameters: Vec<QualityParameter>,
    pub notes: String,
    pub products_to_harvest: Vec<ConsumptionEntry>,
}

/// Completion data sent to the store when a harvest is marked completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteHarvestInput {
    #[serde(default, with = "lenient::opt_date")]
    pub harvest_date: Option<NaiveDate>,
    #[serde(with = "lenient::decimal")]
    pub actual_yield: Decimal,
    #[serde(default, with = "lenient::opt_decimal")]
    pub total_harvested: Option<Decimal>,
    pub total_harvested_unit: String,
    pub destination: String,
    pub quality_results: Vec<String>,
    pub harvest_notes: String,
    pub products_harvested: Vec<ConsumptionEntry>,
}

/// Actions a harvest currently offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestActions {
    pub can_edit: bool,
    pub can_complete: bool,
    pub can_delete: bool,
}

impl Harvest {
    /// Build a stored record from planning input
    pub fn from_input(id: impl Into<String>, input: HarvestInput, now: DateTime<Utc>) -> Self {
        let mut harvest = Harvest {
            id: id.into(),
            field_id: String::new(),
            field: None,
            crop: String::new(),
            lots: Vec::new(),
            total_area: Decimal::ZERO,
            area_unit: String::new(),
            planned_date: None,
            status: HarvestStatus::Pending,
            estimated_yield: None,
            yield_unit: String::new(),
            harvest_method: None,
            machinery: Vec::new(),
            workers: String::new(),
            target_warehouse: String::new(),
            quality_parameters: Vec::new(),
            notes: String::new(),
            products_to_harvest: Vec::new(),
            harvest_date: None,
            actual_yield: None,
            total_harvested: None,
            total_harvested_unit: String::new(),
            destination: String::new(),
            quality_results: Vec::new(),
            harvest_notes: String::new(),
            products_harvested: Vec::new(),
            created_at: Some(now),
            updated_at: None,
            completed_at: None,
        };
        harvest.apply_input(input, now);
        harvest
    }

    /// Overwrite the planning data
    pub fn apply_input(&mut self, input: HarvestInput, now: DateTime<Utc>) {
        self.field_id = input.field_id;
        self.field = input.field;
        self.crop = input.crop;
        self.lots = input.lots;
        self.total_area = input.total_area;
        self.area_unit = input.area_unit;
        self.planned_date = input.planned_date;
        self.status = input.status;
        self.estimated_yield = input.estimated_yield;
        self.yield_unit = input.yield_unit;
        self.harvest_method = input.harvest_method;
        self.machinery = input.machinery;
        self.workers = input.workers;
        self.target_warehouse = input.target_warehouse;
        self.quality_parameters = input.quality_parameters;
        self.notes = input.notes;
        self.products_to_harvest = input.products_to_harvest;
        self.updated_at = Some(now);
    }

    /// Record completion data and move to `completed`
    pub fn apply_completion(&mut self, input: CompleteHarvestInput, now: DateTime<Utc>) {
        self.status = HarvestStatus::Completed;
        self.harvest_date = input.harvest_date;
        self.actual_yield = Some(input.actual_yield);
        self.total_harvested = input.total_harvested;
        self.total_harvested_unit = input.total_harvested_unit;
        self.destination = input.destination;
        self.quality_results = input.quality_results;
        self.harvest_notes = input.harvest_notes;
        self.products_harvested = input.products_harvested;
        self.updated_at = Some(now);
        self.completed_at = Some(now);
    }

    /// Field id, falling back to the embedded reference for records that only
    /// carry the snapshot
    pub fn effective_field_id(&self) -> &str {
        if !self.field_id.is_empty() {
            return &self.field_id;
        }
        self.field.as_ref().map(|f| f.id.as_str()).unwrap_or("")
    }

    pub fn lot_names(&self) -> Vec<&str> {
        self.lots.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn actions(&self) -> HarvestActions {
        HarvestActions {
            can_edit: !self.status.is_terminal(),
            can_complete: !self.status.is_terminal(),
            can_delete: self.status.is_deletable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use HarvestStatus::*;

        assert!(Pending.can_transition_to(Scheduled));
        assert!(Scheduled.can_transition_to(Pending));
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));

        assert!(!InProgress.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(InProgress));
    }

    #[test]
    fn test_terminal_and_deletable() {
        assert!(HarvestStatus::Completed.is_terminal());
        assert!(HarvestStatus::Cancelled.is_terminal());
        assert!(!HarvestStatus::InProgress.is_terminal());
        assert!(HarvestStatus::Pending.is_deletable());
        assert!(!HarvestStatus::Scheduled.is_deletable());
    }

    #[test]
    fn test_status_roundtrip_names() {
        for status in HarvestStatus::ALL {
            assert_eq!(HarvestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            serde_json::to_value(HarvestStatus::InProgress).unwrap(),
            "in_progress"
        );
    }

    #[test]
    fn test_method_aliases() {
        assert_eq!(HarvestMethod::parse("combined"), Some(HarvestMethod::SemiMechanical));
        assert_eq!(HarvestMethod::parse(""), None);
        let m: HarvestMethod = serde_json::from_str("\"semi-mechanical\"").unwrap();
        assert_eq!(m, HarvestMethod::SemiMechanical);
    }

    #[test]
    fn test_quality_parameter_shapes() {
        let params: Vec<QualityParameter> = serde_json::from_str(
            r#"["Humidity", {"name": "Protein", "value": 12.5, "unit": "%"}]"#,
        )
        .unwrap();
        assert_eq!(params[0], QualityParameter::from_label("Humidity"));
        assert_eq!(params[1], QualityParameter::new("Protein", "12.5", "%"));
    }

    #[test]
    fn test_consumption_entry_legacy_shapes() {
        let planned: ConsumptionEntry = serde_json::from_str(
            r#"{"id": "P1", "name": "Seed A", "stock": 200, "quantityToHarvest": 50, "maxQuantity": 200, "unit": "kg"}"#,
        )
        .unwrap();
        assert_eq!(planned.product_id, "P1");
        assert_eq!(planned.product_name, "Seed A");
        assert_eq!(planned.quantity, Decimal::from(50));
        assert_eq!(planned.available_stock, Decimal::from(200));

        let picked: ConsumptionEntry = serde_json::from_str(
            r#"{"productId": "P2", "name": "Urea", "harvestQuantity": "3", "availableStock": 10}"#,
        )
        .unwrap();
        assert_eq!(picked.product_id, "P2");
        assert_eq!(picked.quantity, Decimal::from(3));
        assert!(picked.is_within_stock());
    }

    #[test]
    fn test_harvest_reads_selected_products_alias_and_timestamp_dates() {
        let harvest: Harvest = serde_json::from_str(
            r#"{
                "id": "H1",
                "field": {"id": "F1", "name": "North"},
                "crop": "maiz",
                "status": "pending",
                "plannedDate": {"seconds": 1710460800},
                "harvestMethod": "",
                "selectedProducts": [{"productId": "P1", "quantity": 5, "availableStock": 9}]
            }"#,
        )
        .unwrap();
        assert_eq!(harvest.effective_field_id(), "F1");
        assert_eq!(harvest.planned_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(harvest.harvest_method, None);
        assert_eq!(harvest.products_to_harvest.len(), 1);
    }

    #[test]
    fn test_actions_follow_status() {
        let mut harvest: Harvest = serde_json::from_str(r#"{"id": "H1"}"#).unwrap();
        assert_eq!(
            harvest.actions(),
            HarvestActions { can_edit: true, can_complete: true, can_delete: true }
        );
        harvest.status = HarvestStatus::Completed;
        assert_eq!(
            harvest.actions(),
            HarvestActions { can_edit: false, can_complete: false, can_delete: false }
        );
    }
}
