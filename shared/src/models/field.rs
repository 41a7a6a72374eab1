//! Field, lot and warehouse reference data

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{FieldRef, LotSnapshot};
use crate::types::lenient;

pub const DEFAULT_AREA_UNIT: &str = "ha";

fn default_area_unit() -> String {
    DEFAULT_AREA_UNIT.to_string()
}

/// A farm field with its lots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_area_unit")]
    pub area_unit: String,
    /// Crops grown on the field; the first one is the default crop
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default)]
    pub lots: Vec<Lot>,
}

impl Field {
    pub fn lot(&self, lot_id: &str) -> Option<&Lot> {
        self.lots.iter().find(|l| l.id == lot_id)
    }

    pub fn default_crop(&self) -> Option<&str> {
        self.crops.first().map(String::as_str)
    }

    pub fn reference(&self) -> FieldRef {
        FieldRef::new(self.id.clone(), self.name.clone())
    }
}

/// A sub-division of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Missing or invalid areas read as zero
    #[serde(default, with = "lenient::decimal")]
    pub area: Decimal,
    #[serde(default)]
    pub area_unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Lot {
    pub fn snapshot(&self) -> LotSnapshot {
        LotSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            area: self.area,
            area_unit: self.area_unit.clone(),
        }
    }
}

/// A storage location belonging to one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
}
