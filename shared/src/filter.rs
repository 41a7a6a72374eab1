//! Harvest list filtering

use std::collections::BTreeSet;
use std::fmt::Display;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{Field, FieldRef, Harvest, HarvestStatus};
use crate::types::DateRange;

/// Display name for harvests whose field no longer resolves
pub const UNKNOWN_FIELD: &str = "Unknown field";

const ALL: &str = "all";

/// Filter criteria. `None` (written as `"all"`) means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarvestFilters {
    #[serde(serialize_with = "write_all_or", deserialize_with = "read_status")]
    pub status: Option<HarvestStatus>,
    #[serde(serialize_with = "write_all_or", deserialize_with = "read_text")]
    pub crop: Option<String>,
    #[serde(serialize_with = "write_all_or", deserialize_with = "read_text")]
    pub field: Option<String>,
    pub date_range: DateRange,
    pub search_term: String,
}

/// One filter control changing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Status(Option<HarvestStatus>),
    Crop(Option<String>),
    Field(Option<String>),
    DateRange(DateRange),
    Search(String),
}

impl HarvestFilters {
    pub fn apply(&mut self, change: FilterChange) {
        match change {
            FilterChange::Status(status) => self.status = status,
            FilterChange::Crop(crop) => self.crop = crop.filter(|c| !c.is_empty()),
            FilterChange::Field(field) => self.field = field.filter(|f| !f.is_empty()),
            FilterChange::DateRange(range) => self.date_range = range,
            FilterChange::Search(term) => self.search_term = term,
        }
    }

    /// Whether a harvest with an already-resolved field passes every criterion
    pub fn matches(&self, harvest: &Harvest, field: &FieldRef) -> bool {
        if let Some(status) = self.status {
            if harvest.status != status {
                return false;
            }
        }
        if let Some(crop) = &self.crop {
            if &harvest.crop != crop {
                return false;
            }
        }
        if let Some(field_id) = &self.field {
            if harvest.effective_field_id() != field_id {
                return false;
            }
        }
        if !self.date_range.is_unbounded() {
            match harvest.planned_date {
                Some(date) if self.date_range.contains(date) => {}
                _ => return false,
            }
        }
        matches_search(harvest, field, &self.search_term)
    }
}

fn matches_search(harvest: &Harvest, field: &FieldRef, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    harvest.crop.to_lowercase().contains(&term)
        || field.name.to_lowercase().contains(&term)
        || harvest
            .harvest_method
            .map(|m| m.names().iter().any(|name| name.contains(&term)))
            .unwrap_or(false)
}

/// Display field for a harvest.
///
/// The embedded snapshot wins when it carries an id and a name; otherwise
/// the field is looked up by id, and a placeholder named [`UNKNOWN_FIELD`]
/// is used when that fails too.
pub fn resolve_field(harvest: &Harvest, fields: &[Field]) -> FieldRef {
    if let Some(field) = harvest.field.as_ref().filter(|f| f.is_well_formed()) {
        return field.clone();
    }
    let field_id = harvest.effective_field_id();
    fields
        .iter()
        .find(|f| f.id == field_id)
        .map(Field::reference)
        .unwrap_or_else(|| FieldRef::new(field_id, UNKNOWN_FIELD))
}

/// Harvests passing `criteria`, in source order, each carrying its resolved
/// field
pub fn filter_harvests(
    harvests: &[Harvest],
    fields: &[Field],
    criteria: &HarvestFilters,
) -> Vec<Harvest> {
    harvests
        .iter()
        .filter_map(|harvest| {
            let field = resolve_field(harvest, fields);
            criteria.matches(harvest, &field).then(|| {
                let mut resolved = harvest.clone();
                resolved.field = Some(field);
                resolved
            })
        })
        .collect()
}

/// Non-empty crops present in `harvests`, sorted and deduplicated
pub fn distinct_crops(harvests: &[Harvest]) -> Vec<String> {
    harvests
        .iter()
        .map(|h| h.crop.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Choices offered by the filter controls
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub statuses: Vec<HarvestStatus>,
    pub crops: Vec<String>,
    pub fields: Vec<FieldRef>,
}

pub fn filter_options(harvests: &[Harvest], fields: &[Field]) -> FilterOptions {
    FilterOptions {
        statuses: HarvestStatus::ALL.to_vec(),
        crops: distinct_crops(harvests),
        fields: fields.iter().map(Field::reference).collect(),
    }
}

fn write_all_or<S: Serializer, T: Display>(
    value: &Option<T>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.collect_str(v),
        None => serializer.serialize_str(ALL),
    }
}

fn read_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|v| !v.is_empty() && v != ALL))
}

fn read_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<HarvestStatus>, D::Error> {
    match read_text(deserializer)? {
        None => Ok(None),
        Some(raw) => HarvestStatus::parse(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("unknown harvest status `{raw}`"))),
    }
}
