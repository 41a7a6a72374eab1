//! Orchestration services for the harvest planner client

pub mod harvests;

pub use harvests::{Dialog, HarvestSettings, HarvestsOrchestrator};
