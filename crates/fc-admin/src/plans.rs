//! Plan Catalog

use fc_common::Plan;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{ListCache, ListView};
use crate::error::{AdminError, Result};
use crate::stores::{NewPlan, PlanPatch, PlanRecord, PlanStore};

pub struct PlanCatalog {
    store: Arc<dyn PlanStore>,
    cache: ListCache<Plan>,
}

impl PlanCatalog {
    pub fn new(store: Arc<dyn PlanStore>) -> Self {
        Self {
            store,
            cache: ListCache::new(),
        }
    }

    pub fn view(&self) -> ListView<Plan> {
        self.cache.view()
    }

    pub fn plans(&self) -> Vec<Plan> {
        self.cache.items()
    }

    pub async fn fetch(&self) -> Result<Vec<Plan>> {
        self.cache.begin_load();
        match self.store.list_plans().await {
            Ok(plans) => {
                debug!(count = plans.len(), "Plans loaded");
                self.cache.loaded(plans.clone());
                Ok(plans)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load plans");
                let error = AdminError::from(e);
                self.cache.failed(error.user_message());
                Err(error)
            }
        }
    }

    /// Plans offered on the company form, cheapest first.
    pub async fn active_plans(&self) -> Result<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .store
            .list_active_plans()
            .await?
            .into_iter()
            .filter(|p| p.active)
            .collect();
        plans.sort_by(|a, b| a.price.total_cmp(&b.price));
        Ok(plans)
    }

    pub async fn create(&self, plan: NewPlan) -> Result<Plan> {
        let mut errors = Vec::new();
        check_name(&plan.name, &mut errors);
        check_price(plan.price, &mut errors);
        if !errors.is_empty() {
            return Err(AdminError::Validation(errors));
        }

        let record = PlanRecord {
            name: plan.name.trim().to_string(),
            price: plan.price,
            active: plan.active.unwrap_or(true),
        };
        let created = self.store.insert_plan(&record).await?;
        info!(plan_id = %created.id, name = %created.name, "Plan created");
        self.refetch().await;
        Ok(created)
    }

    pub async fn update(&self, id: &str, mut patch: PlanPatch) -> Result<()> {
        let mut errors = Vec::new();
        if let Some(name) = &patch.name {
            check_name(name, &mut errors);
        }
        if let Some(price) = patch.price {
            check_price(price, &mut errors);
        }
        if !errors.is_empty() {
            return Err(AdminError::Validation(errors));
        }
        patch.name = patch.name.map(|n| n.trim().to_string());

        self.store.update_plan(id, &patch).await?;
        info!(plan_id = id, "Plan updated");
        self.refetch().await;
        Ok(())
    }

    /// Refused while any company still references the plan.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.store.plan_in_use(id).await? {
            warn!(plan_id = id, "Refusing to delete plan in use");
            return Err(AdminError::PlanInUse { id: id.to_string() });
        }

        self.store.delete_plan(id).await?;
        info!(plan_id = id, "Plan deleted");
        self.refetch().await;
        Ok(())
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<()> {
        let previous = self.cache.modify(id, |plan| plan.active = active);

        if let Err(e) = self.store.update_plan(id, &PlanPatch::active(active)).await {
            warn!(plan_id = id, active, error = %e, "Status change failed, reverting");
            if let Some(previous) = previous {
                self.cache.restore(previous);
            }
            return Err(e.into());
        }

        info!(plan_id = id, active, "Plan status changed");
        self.refetch().await;
        Ok(())
    }

    async fn refetch(&self) {
        if let Err(e) = self.fetch().await {
            warn!(error = %e, "Refresh after write failed");
        }
    }
}

fn check_name(name: &str, errors: &mut Vec<String>) {
    if name.trim().is_empty() {
        errors.push("Nome do plano é obrigatório".to_string());
    }
}

fn check_price(price: f64, errors: &mut Vec<String>) {
    if !price.is_finite() || price < 0.0 {
        errors.push("Preço deve ser maior ou igual a zero".to_string());
    }
}
