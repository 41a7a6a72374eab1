//! Configuration management for the harvest planner
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with HARVESTS__ prefix

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use shared::{DraftDefaults, HarvestableCategories, ProductCategory};
use validator::Validate;

use crate::error::AppResult;

const ENV_PREFIX: &str = "HARVESTS";

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    #[validate]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[validate]
    pub harvest: HarvestConfig,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    #[validate(length(min = 1, message = "logging filter cannot be empty"))]
    pub filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct StoreConfig {
    /// JSON snapshot loaded into the in-memory store at startup
    pub seed_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct HarvestConfig {
    /// Product categories that may be consumed by a harvest
    #[validate(length(min = 1, message = "at least one harvestable category is required"))]
    pub harvestable_categories: Vec<String>,

    #[validate(length(min = 1))]
    pub default_area_unit: String,

    #[validate(length(min = 1))]
    pub default_yield_unit: String,

    #[validate(length(min = 1))]
    pub default_harvested_unit: String,
}

impl HarvestConfig {
    pub fn harvestable(&self) -> HarvestableCategories {
        HarvestableCategories::new(
            self.harvestable_categories
                .iter()
                .map(|c| ProductCategory::from(c.as_str()))
                .collect(),
        )
    }

    pub fn draft_defaults(&self) -> DraftDefaults {
        DraftDefaults {
            area_unit: self.default_area_unit.clone(),
            yield_unit: self.default_yield_unit.clone(),
            harvested_unit: self.default_harvested_unit.clone(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> AppResult<Self> {
        let environment = std::env::var(format!("{}__ENVIRONMENT", ENV_PREFIX))
            .unwrap_or_else(|_| "development".into());

        let raw = Self::defaults(&environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (HARVESTS__ prefix)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("harvest.harvestable_categories")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_raw(raw)
    }

    /// Builder preloaded with the code defaults
    pub fn defaults(environment: &str) -> AppResult<ConfigBuilder<DefaultState>> {
        let defaults = HarvestableCategories::default();
        let categories: Vec<String> = defaults
            .as_slice()
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        let units = DraftDefaults::default();

        Ok(config::Config::builder()
            .set_default("environment", environment)?
            .set_default("logging.filter", "harvest_planner=info,harvest_planner_client=info")?
            .set_default("logging.json", false)?
            .set_default("harvest.harvestable_categories", categories)?
            .set_default("harvest.default_area_unit", units.area_unit)?
            .set_default("harvest.default_yield_unit", units.yield_unit)?
            .set_default("harvest.default_harvested_unit", units.harvested_unit)?)
    }

    /// Deserialize and validate a built configuration
    pub fn from_raw(raw: config::Config) -> AppResult<Self> {
        let config: Config = raw.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_defaults_are_valid() {
        let raw = Config::defaults("test").unwrap().build().unwrap();
        let config = Config::from_raw(raw).unwrap();
        assert_eq!(config.environment, "test");
        assert!(config.store.seed_path.is_none());
        assert_eq!(config.harvest.harvestable(), HarvestableCategories::default());
        assert_eq!(config.harvest.draft_defaults(), DraftDefaults::default());
    }

    #[test]
    fn test_overrides_accept_source_labels() {
        let raw = Config::defaults("test")
            .unwrap()
            .set_override("harvest.harvestable_categories", vec!["semilla", "insumo"])
            .unwrap()
            .set_override("store.seed_path", "data/seed.json")
            .unwrap()
            .build()
            .unwrap();
        let config = Config::from_raw(raw).unwrap();
        let harvestable = config.harvest.harvestable();
        assert!(harvestable.contains(&ProductCategory::Seed));
        assert!(harvestable.contains(&ProductCategory::Input));
        assert!(!harvestable.contains(&ProductCategory::Fertilizer));
        assert_eq!(config.store.seed_path.as_deref(), Some("data/seed.json"));
    }

    #[test]
    fn test_empty_category_list_rejected() {
        let raw = Config::defaults("test")
            .unwrap()
            .set_override("harvest.harvestable_categories", Vec::<String>::new())
            .unwrap()
            .build()
            .unwrap();
        let err = Config::from_raw(raw).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_empty_unit_rejected() {
        let raw = Config::defaults("test")
            .unwrap()
            .set_override("harvest.default_area_unit", "")
            .unwrap()
            .build()
            .unwrap();
        assert!(Config::from_raw(raw).is_err());
    }
}
