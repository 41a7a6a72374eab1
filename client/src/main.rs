//! Harvest planner - demo client
//!
//! Runs the harvests screen against the in-memory store: plans a harvest on a
//! preselected field, completes it and reports the resulting stock.

use std::sync::Arc;

use harvest_planner_client::config::Config;
use harvest_planner_client::services::{Dialog, HarvestSettings, HarvestsOrchestrator};
use harvest_planner_client::store::{MemoryStore, Stores};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_SNAPSHOT: &str = include_str!("../data/demo.json");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    // Initialize tracing
    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Starting harvest planner");
    tracing::info!("Environment: {}", config.environment);

    let store = match &config.store.seed_path {
        Some(path) => MemoryStore::from_seed_file(path).await?,
        None => MemoryStore::from_json(DEMO_SNAPSHOT)?,
    };
    let store = Arc::new(store);

    let settings = HarvestSettings {
        harvestable: config.harvest.harvestable(),
        draft_defaults: config.harvest.draft_defaults(),
    };
    let mut orchestrator = HarvestsOrchestrator::new(Stores::from_backend(store.clone()), settings);
    orchestrator.load().await?;

    for harvest in orchestrator.harvests() {
        let field = harvest.field.as_ref().map(|f| f.name.as_str()).unwrap_or_default();
        tracing::info!("{} | {} | {} | {}", harvest.id, field, harvest.crop, harvest.status);
    }

    // Plan a harvest on the first field with its first lot
    let Some(field) = orchestrator.catalog().fields.first().cloned() else {
        tracing::warn!("No fields in the store, nothing to plan");
        return Ok(());
    };
    let lot_ids: Vec<String> = field.lots.iter().take(1).map(|l| l.id.clone()).collect();
    orchestrator.open_add_from_field(&field.id, &lot_ids);

    let form = orchestrator.form_mut()?;
    form.draft_mut().planned_date = chrono::Local::now().date_naive().to_string();
    form.draft_mut().estimated_yield = "3200".to_string();
    let product = form.available_products().first().cloned();
    if let Some(product) = &product {
        form.toggle_product(product);
        form.set_quantity(&product.id, "50");
    }

    let harvest_id = orchestrator.save().await?;
    tracing::info!(harvest_id = %harvest_id, "Planned harvest");

    // Complete it; the consumed products are taken out of stock
    orchestrator.open_complete(&harvest_id)?;
    let expected_total = match orchestrator.dialog() {
        Some(Dialog::CompleteHarvest { harvest, form }) => {
            form.estimated_total(harvest.total_area, harvest.estimated_yield)
        }
        _ => None,
    };
    if let Some(total) = expected_total {
        orchestrator.completion_form_mut()?.total_harvested = total.to_string();
    }
    orchestrator.submit_completion().await?;

    if let Some(product) = product {
        if let Some(current) = store.product(&product.id).await {
            tracing::info!(
                "{} stock: {} -> {} {}",
                current.name,
                product.stock,
                current.stock,
                current.unit
            );
        }
    }

    Ok(())
}
