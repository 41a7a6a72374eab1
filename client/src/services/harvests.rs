//! Harvests screen orchestration
//!
//! Loads reference data and harvests, drives the add/edit/view/complete
//! dialogs and runs stock reconciliation when a harvest is completed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use shared::{
    filter_harvests, filter_options, reconcile, Catalog, CompletionDraft, ConsumptionEntry,
    DraftDefaults, DraftMode, FilterChange, FilterOptions, Harvest, HarvestDraft, HarvestFilters,
    HarvestStatus, HarvestableCategories, ReconciliationPlan, SelectionCascade, ValidationErrors,
};

use crate::error::{AppError, AppResult, ErrorBanner};
use crate::models::HarvestDetail;
use crate::store::Stores;

/// The dialog currently open over the harvest list
#[derive(Debug, Clone)]
pub enum Dialog {
    AddHarvest(SelectionCascade),
    EditHarvest {
        harvest_id: String,
        form: SelectionCascade,
    },
    ViewHarvest(HarvestDetail),
    CompleteHarvest {
        harvest: Harvest,
        form: CompletionDraft,
    },
}

impl Dialog {
    /// Id of the harvest the dialog is about, if any
    pub fn harvest_id(&self) -> Option<&str> {
        match self {
            Dialog::AddHarvest(_) => None,
            Dialog::EditHarvest { harvest_id, .. } => Some(harvest_id),
            Dialog::ViewHarvest(detail) => Some(&detail.harvest.id),
            Dialog::CompleteHarvest { harvest, .. } => Some(&harvest.id),
        }
    }
}

/// Settings the orchestrator applies to every new form
#[derive(Debug, Clone, Default)]
pub struct HarvestSettings {
    pub harvestable: HarvestableCategories,
    pub draft_defaults: DraftDefaults,
}

/// State and operations behind the harvests screen
pub struct HarvestsOrchestrator {
    stores: Stores,
    settings: HarvestSettings,
    harvests: Vec<Harvest>,
    catalog: Arc<Catalog>,
    filters: HarvestFilters,
    dialog: Option<Dialog>,
    form_errors: ValidationErrors,
    loading: bool,
    error: Option<ErrorBanner>,
    /// Products whose stock was already decremented, per harvest id
    reconciled: HashMap<String, HashSet<String>>,
}

impl HarvestsOrchestrator {
    pub fn new(stores: Stores, settings: HarvestSettings) -> Self {
        Self {
            stores,
            settings,
            harvests: Vec::new(),
            catalog: Arc::new(Catalog::default()),
            filters: HarvestFilters::default(),
            dialog: None,
            form_errors: ValidationErrors::new(),
            loading: false,
            error: None,
            reconciled: HashMap::new(),
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load fields, products, warehouses and harvests concurrently
    pub async fn load(&mut self) -> AppResult<()> {
        self.loading = true;
        let result = tokio::try_join!(
            self.stores.fields.list(),
            self.stores.products.list(),
            self.stores.warehouses.list(),
            self.stores.harvests.list(),
        );
        self.loading = false;

        let (fields, products, warehouses, harvests) = match result {
            Ok(loaded) => loaded,
            Err(err) => return self.surface(Err(err.into())),
        };
        tracing::info!(
            fields = fields.len(),
            products = products.len(),
            warehouses = warehouses.len(),
            harvests = harvests.len(),
            "Harvest data loaded"
        );
        self.catalog = Arc::new(Catalog::new(fields, warehouses, products));
        self.harvests = harvests;
        Ok(())
    }

    pub async fn refresh(&mut self) -> AppResult<()> {
        self.load().await
    }

    async fn reload_harvests(&mut self) -> AppResult<()> {
        self.harvests = self.stores.harvests.list().await?;
        Ok(())
    }

    async fn reload_products(&mut self) -> AppResult<()> {
        let products = self.stores.products.list().await?;
        let mut catalog = Catalog::clone(&self.catalog);
        catalog.products = products;
        self.catalog = Arc::new(catalog);
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Loaded harvests passing the current filters
    pub fn harvests(&self) -> Vec<Harvest> {
        filter_harvests(&self.harvests, &self.catalog.fields, &self.filters)
    }

    pub fn all_harvests(&self) -> &[Harvest] {
        &self.harvests
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn filters(&self) -> &HarvestFilters {
        &self.filters
    }

    pub fn set_filter(&mut self, change: FilterChange) {
        self.filters.apply(change);
    }

    pub fn search(&mut self, term: &str) {
        self.filters.apply(FilterChange::Search(term.to_string()));
    }

    pub fn filter_options(&self) -> FilterOptions {
        filter_options(&self.harvests, &self.catalog.fields)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ErrorBanner> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// Inline errors of the last rejected submit
    pub fn form_errors(&self) -> &ValidationErrors {
        &self.form_errors
    }

    // ========================================================================
    // Dialogs
    // ========================================================================

    fn new_form(&self, draft: HarvestDraft) -> SelectionCascade {
        SelectionCascade::new(self.catalog.clone(), self.settings.harvestable.clone(), draft)
    }

    fn open(&mut self, dialog: Dialog) {
        self.form_errors = ValidationErrors::new();
        self.dialog = Some(dialog);
    }

    fn find(&self, harvest_id: &str) -> AppResult<&Harvest> {
        self.harvests
            .iter()
            .find(|h| h.id == harvest_id)
            .ok_or_else(|| AppError::NotFound(format!("Harvest {}", harvest_id)))
    }

    pub fn open_add(&mut self) {
        let form = self.new_form(HarvestDraft::new(&self.settings.draft_defaults));
        self.open(Dialog::AddHarvest(form));
    }

    /// Open the add dialog with a field and lots already chosen
    pub fn open_add_from_field(&mut self, field_id: &str, lot_ids: &[String]) {
        let mut form = self.new_form(HarvestDraft::new(&self.settings.draft_defaults));
        form.preselect(field_id, lot_ids);
        self.open(Dialog::AddHarvest(form));
    }

    pub fn open_edit(&mut self, harvest_id: &str) -> AppResult<()> {
        let result = self.try_open_edit(harvest_id);
        self.surface(result)
    }

    fn try_open_edit(&mut self, harvest_id: &str) -> AppResult<()> {
        let harvest = self.find(harvest_id)?;
        if harvest.status.is_terminal() {
            return Err(AppError::InvalidStateTransition(format!(
                "a {} harvest cannot be edited",
                harvest.status
            )));
        }
        let draft = HarvestDraft::from_harvest(harvest, &self.settings.draft_defaults);
        let form = self.new_form(draft);
        self.open(Dialog::EditHarvest {
            harvest_id: harvest_id.to_string(),
            form,
        });
        Ok(())
    }

    pub fn open_view(&mut self, harvest_id: &str) -> AppResult<()> {
        let result = self
            .find(harvest_id)
            .map(|harvest| HarvestDetail::build(harvest, &self.catalog));
        match self.surface(result) {
            Ok(detail) => {
                self.open(Dialog::ViewHarvest(detail));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub fn open_complete(&mut self, harvest_id: &str) -> AppResult<()> {
        let today = Local::now().date_naive();
        self.open_complete_on(harvest_id, today)
    }

    /// Open the complete dialog with an explicit "today"
    pub fn open_complete_on(&mut self, harvest_id: &str, today: NaiveDate) -> AppResult<()> {
        let result = self.try_open_complete(harvest_id, today);
        self.surface(result)
    }

    fn try_open_complete(&mut self, harvest_id: &str, today: NaiveDate) -> AppResult<()> {
        let harvest = self.find(harvest_id)?.clone();
        if harvest.status.is_terminal() {
            return Err(AppError::InvalidStateTransition(format!(
                "a {} harvest cannot be completed",
                harvest.status
            )));
        }
        let form = CompletionDraft::from_harvest(&harvest, today, &self.settings.draft_defaults);
        self.open(Dialog::CompleteHarvest { harvest, form });
        Ok(())
    }

    /// Close the dialog and discard its draft
    pub fn close_dialog(&mut self) {
        self.dialog = None;
        self.form_errors = ValidationErrors::new();
    }

    /// The add/edit form
    pub fn form_mut(&mut self) -> AppResult<&mut SelectionCascade> {
        match self.dialog.as_mut() {
            Some(Dialog::AddHarvest(form)) | Some(Dialog::EditHarvest { form, .. }) => Ok(form),
            _ => Err(AppError::NoActiveDialog("harvest form")),
        }
    }

    pub fn completion_form_mut(&mut self) -> AppResult<&mut CompletionDraft> {
        match self.dialog.as_mut() {
            Some(Dialog::CompleteHarvest { form, .. }) => Ok(form),
            _ => Err(AppError::NoActiveDialog("complete harvest")),
        }
    }

    // ========================================================================
    // Submits
    // ========================================================================

    /// Submit the add/edit dialog; returns the saved harvest id
    pub async fn save(&mut self) -> AppResult<String> {
        let result = self.try_save().await;
        self.surface(result)
    }

    async fn try_save(&mut self) -> AppResult<String> {
        let (draft, harvest_id) = match &self.dialog {
            Some(Dialog::AddHarvest(form)) => (form.draft().clone(), None),
            Some(Dialog::EditHarvest { harvest_id, form }) => {
                (form.draft().clone(), Some(harvest_id.clone()))
            }
            _ => return Err(AppError::NoActiveDialog("harvest form")),
        };
        let mode = if harvest_id.is_some() {
            DraftMode::Edit
        } else {
            DraftMode::Create
        };

        let errors = draft.validate(mode);
        if !errors.is_empty() {
            tracing::debug!(fields = ?errors.fields().collect::<Vec<_>>(), "Harvest form rejected");
            self.form_errors = errors.clone();
            return Err(AppError::Validation(errors));
        }
        self.form_errors = ValidationErrors::new();

        if let Some(id) = &harvest_id {
            let stored = self.find(id)?.status;
            if !stored.can_transition_to(draft.status) {
                return Err(AppError::InvalidStateTransition(format!(
                    "cannot move a harvest from {} to {}",
                    stored, draft.status
                )));
            }
        }

        let input = draft.normalize();
        let completed = input.status == HarvestStatus::Completed;
        let entries = input.products_to_harvest.clone();
        let id = match harvest_id {
            Some(id) => self.stores.harvests.update(&id, input).await?,
            None => self.stores.harvests.create(input).await?,
        };
        tracing::info!(harvest_id = %id, mode = ?mode, "Harvest saved");

        if completed {
            self.reconcile_stock(&id, &entries).await?;
            self.reload_products().await?;
        }

        self.close_dialog();
        self.reload_harvests().await?;
        Ok(id)
    }

    /// Submit the complete dialog
    pub async fn submit_completion(&mut self) -> AppResult<()> {
        let result = self.try_submit_completion().await;
        self.surface(result)
    }

    async fn try_submit_completion(&mut self) -> AppResult<()> {
        let (harvest, form) = match &self.dialog {
            Some(Dialog::CompleteHarvest { harvest, form }) => (harvest.clone(), form.clone()),
            _ => return Err(AppError::NoActiveDialog("complete harvest")),
        };

        let errors = form.validate();
        if !errors.is_empty() {
            self.form_errors = errors.clone();
            return Err(AppError::Validation(errors));
        }
        self.form_errors = ValidationErrors::new();

        self.stores
            .harvests
            .mark_completed(&harvest.id, form.normalize())
            .await?;
        tracing::info!(harvest_id = %harvest.id, "Harvest completed");

        self.reconcile_stock(&harvest.id, &harvest.products_to_harvest)
            .await?;
        self.reload_products().await?;

        self.close_dialog();
        self.reload_harvests().await?;
        Ok(())
    }

    /// Decrement stock for a completed harvest, at most once per product.
    ///
    /// Updates are written one by one; the first failure stops the run and
    /// the writes before it stay applied. A later call only writes the
    /// products that were not decremented yet.
    async fn reconcile_stock(
        &mut self,
        harvest_id: &str,
        entries: &[ConsumptionEntry],
    ) -> AppResult<ReconciliationPlan> {
        let done = self.reconciled.entry(harvest_id.to_string()).or_default();
        let pending: Vec<ConsumptionEntry> = entries
            .iter()
            .filter(|e| !done.contains(&e.product_id))
            .cloned()
            .collect();
        if pending.len() < entries.len() {
            tracing::info!(
                harvest_id,
                skipped = entries.len() - pending.len(),
                "Skipping products already reconciled for harvest"
            );
        }

        let products = self.stores.products.list().await?;
        let plan = reconcile(&pending, &products);
        for product_id in &plan.missing {
            tracing::warn!(
                harvest_id,
                product_id = %product_id,
                "Product not found during stock reconciliation"
            );
        }

        for update in &plan.updates {
            let Some(product) = products.iter().find(|p| p.id == update.product_id) else {
                continue;
            };
            let mut product = product.clone();
            product.stock = update.stock;
            self.stores
                .products
                .update(&update.product_id, product)
                .await?;
            self.reconciled
                .entry(harvest_id.to_string())
                .or_default()
                .insert(update.product_id.clone());
            tracing::info!(
                harvest_id,
                product_id = %update.product_id,
                previous_stock = %update.previous_stock,
                stock = %update.stock,
                "Product stock decremented"
            );
        }
        Ok(plan)
    }

    /// Delete a pending harvest
    pub async fn delete(&mut self, harvest_id: &str) -> AppResult<()> {
        let result = self.try_delete(harvest_id).await;
        self.surface(result)
    }

    async fn try_delete(&mut self, harvest_id: &str) -> AppResult<()> {
        let status = self.find(harvest_id)?.status;
        if !status.is_deletable() {
            return Err(AppError::InvalidStateTransition(format!(
                "a {} harvest cannot be deleted",
                status
            )));
        }
        self.stores.harvests.delete(harvest_id).await?;
        tracing::info!(harvest_id, "Harvest deleted");

        if self.dialog.as_ref().and_then(Dialog::harvest_id) == Some(harvest_id) {
            self.close_dialog();
        }
        self.reload_harvests().await
    }

    /// Turn a failure into the banner; validation errors stay inline
    fn surface<T>(&mut self, result: AppResult<T>) -> AppResult<T> {
        if let Err(err) = &result {
            if let Some(banner) = err.banner() {
                match err {
                    AppError::Store(_) | AppError::Internal(_) => {
                        tracing::error!("Harvest operation failed: {:?}", err)
                    }
                    _ => tracing::warn!("Harvest operation rejected: {}", err),
                }
                self.error = Some(banner);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn loaded() -> (Arc<MemoryStore>, HarvestsOrchestrator) {
        let store = Arc::new(
            MemoryStore::from_json(
                r#"{
                    "fields": [{"id": "F1", "name": "North", "crops": ["soja"], "lots": [{"id": "L1", "name": "A", "area": 2}]}],
                    "products": [{"id": "P1", "name": "Seed A", "stock": 200, "category": "seed", "fieldId": "F1"}],
                    "harvests": [
                        {"id": "H1", "fieldId": "F1", "crop": "soja", "status": "pending"},
                        {"id": "H2", "fieldId": "F1", "crop": "soja", "status": "completed"}
                    ]
                }"#,
            )
            .unwrap(),
        );
        let mut orchestrator =
            HarvestsOrchestrator::new(Stores::from_backend(store.clone()), HarvestSettings::default());
        orchestrator.load().await.unwrap();
        (store, orchestrator)
    }

    #[tokio::test]
    async fn test_load_populates_catalog() {
        let (_, orchestrator) = loaded().await;
        assert_eq!(orchestrator.all_harvests().len(), 2);
        assert_eq!(orchestrator.catalog().fields.len(), 1);
        assert!(!orchestrator.is_loading());
    }

    #[tokio::test]
    async fn test_form_access_requires_dialog() {
        let (_, mut orchestrator) = loaded().await;
        assert!(matches!(
            orchestrator.form_mut(),
            Err(AppError::NoActiveDialog(_))
        ));
        orchestrator.open_add();
        assert!(orchestrator.form_mut().is_ok());
        assert!(orchestrator.completion_form_mut().is_err());
        orchestrator.close_dialog();
        assert!(orchestrator.dialog().is_none());
    }

    #[tokio::test]
    async fn test_terminal_harvest_cannot_be_edited_or_deleted() {
        let (_, mut orchestrator) = loaded().await;
        let err = orchestrator.open_edit("H2").unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
        assert_eq!(orchestrator.error().unwrap().code, "INVALID_STATE_TRANSITION");
        orchestrator.dismiss_error();

        assert!(orchestrator.delete("H2").await.is_err());
        assert!(orchestrator.open_complete("H2").is_err());
        assert!(orchestrator.open_edit("H1").is_ok());
    }

    #[tokio::test]
    async fn test_delete_closes_matching_dialog() {
        let (store, mut orchestrator) = loaded().await;
        orchestrator.open_view("H1").unwrap();
        orchestrator.delete("H1").await.unwrap();
        assert!(orchestrator.dialog().is_none());
        assert!(store.harvest("H1").await.is_none());
        assert_eq!(orchestrator.all_harvests().len(), 1);
    }

    #[tokio::test]
    async fn test_open_add_from_field_preselects() {
        let (_, mut orchestrator) = loaded().await;
        orchestrator.open_add_from_field("F1", &["L1".to_string()]);
        let form = orchestrator.form_mut().unwrap();
        assert_eq!(form.draft().field_id(), "F1");
        assert_eq!(form.draft().total_area, "2");
        assert_eq!(form.available_products().len(), 1);
    }
}
