use anyhow::{Context, Result};
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::ids::{AppTarget, ServicePlanId, SlotId, WebAppId};
use crate::model::{ServicePlan, Site};

/// Read access to sites, slots and plans. Implementations do no writes.
pub trait PlanSource: Send + Sync {
    fn site(&self, id: &WebAppId) -> Result<Option<Site>>;
    fn slot(&self, id: &SlotId) -> Result<Option<Site>>;
    fn service_plan(&self, id: &ServicePlanId) -> Result<Option<ServicePlan>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInfo {
    pub target: String,
    pub service_plan_id: ServicePlanId,
    pub sku_name: Option<String>,
}

/// Resolves the plan an app or slot runs on, and that plan's SKU.
pub fn service_plan_info_for_app(source: &dyn PlanSource, target: &AppTarget) -> Result<PlanInfo> {
    let site = source.site(&target.site_id())
        .with_context(|| format!("reading {}", target.site_id()))?
        .with_context(|| format!("{} was not found", target.site_id()))?;

    let farm_id = match target {
        AppTarget::App(_) => site.server_farm_id().map(str::to_string),
        AppTarget::Slot(slot_id) => {
            let slot = source.slot(slot_id)
                .with_context(|| format!("reading {slot_id}"))?
                .with_context(|| format!("{slot_id} was not found"))?;
            // a slot without its own plan runs on the parent's
            slot.server_farm_id().or(site.server_farm_id()).map(str::to_string)
        }
    };
    let farm_id = farm_id.with_context(|| format!("could not determine the Service Plan ID for {target}"))?;
    let plan_id: ServicePlanId = farm_id.parse()
        .with_context(|| format!("parsing Service Plan ID for {target}"))?;

    let plan = source.service_plan(&plan_id)
        .with_context(|| format!("reading {plan_id}"))?
        .with_context(|| format!("{plan_id} was not found"))?;
    let sku_name = plan.sku_name().map(str::to_string);
    debug!(app = %target, plan = %plan_id, sku = ?sku_name, "resolved service plan");

    Ok(PlanInfo { target: target.to_string(), service_plan_id: plan_id, sku_name })
}

/// An in-memory [`PlanSource`] loaded from captured API payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawInventory")]
pub struct Inventory {
    sites: Vec<Site>,
    service_plans: Vec<ServicePlan>,
    #[serde(skip)] sites_by_id: BTreeMap<String, usize>,
    #[serde(skip)] plans_by_id: BTreeMap<String, usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInventory {
    #[serde(default)] sites: Vec<Site>,
    #[serde(default)] service_plans: Vec<ServicePlan>,
}

impl From<RawInventory> for Inventory {
    fn from(raw: RawInventory) -> Self { Self::new(raw.sites, raw.service_plans) }
}

impl Inventory {
    pub fn new(sites: Vec<Site>, service_plans: Vec<ServicePlan>) -> Self {
        let mut inv = Self { sites, service_plans, ..Default::default() };
        inv.reindex();
        inv
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parsing inventory JSON")
    }

    pub fn sites(&self) -> &[Site] { &self.sites }
    pub fn service_plans(&self) -> &[ServicePlan] { &self.service_plans }

    pub fn push_site(&mut self, site: Site) {
        self.sites.push(site);
        self.reindex();
    }

    pub fn push_service_plan(&mut self, plan: ServicePlan) {
        self.service_plans.push(plan);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.sites_by_id = index(self.sites.iter().map(|s| s.id.as_deref()));
        self.plans_by_id = index(self.service_plans.iter().map(|p| p.id.as_deref()));
    }

    fn site_by_id(&self, id: &str) -> Option<Site> {
        self.sites_by_id.get(&id.to_lowercase()).map(|&i| self.sites[i].clone())
    }
}

// ARM IDs compare case-insensitively; entries without an ID are unreachable.
fn index<'a>(ids: impl Iterator<Item = Option<&'a str>>) -> BTreeMap<String, usize> {
    ids.enumerate()
        .filter_map(|(i, id)| id.map(|id| (id.to_lowercase(), i)))
        .collect()
}

impl PlanSource for Inventory {
    fn site(&self, id: &WebAppId) -> Result<Option<Site>> { Ok(self.site_by_id(&id.to_string())) }
    fn slot(&self, id: &SlotId) -> Result<Option<Site>> { Ok(self.site_by_id(&id.to_string())) }
    fn service_plan(&self, id: &ServicePlanId) -> Result<Option<ServicePlan>> {
        Ok(self.plans_by_id.get(&id.to_string().to_lowercase()).map(|&i| self.service_plans[i].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SITE: &str = "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/sites/app1";
    const PLAN: &str = "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/serverFarms/plan1";
    const SLOT_PLAN: &str = "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/serverFarms/plan2";

    fn inventory() -> Inventory {
        Inventory::from_json(&json!({
            "sites": [
                { "id": SITE, "name": "app1", "properties": { "serverFarmId": PLAN } },
                { "id": format!("{SITE}/slots/staging"), "properties": {} },
                { "id": format!("{SITE}/slots/canary"), "properties": { "serverFarmId": SLOT_PLAN } },
                { "id": "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/sites/orphan" },
                { "id": "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/sites/lost",
                  "properties": { "serverFarmId": "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/serverFarms/gone" } }
            ],
            "servicePlans": [
                { "id": PLAN.to_lowercase(), "sku": { "name": "Y1" } },
                { "id": SLOT_PLAN, "sku": { "name": "EP2" } }
            ]
        }).to_string()).unwrap()
    }

    #[test]
    fn resolves_app_plan() {
        let info = service_plan_info_for_app(&inventory(), &SITE.parse::<AppTarget>().unwrap()).unwrap();
        assert_eq!(info.service_plan_id.name, "plan1");
        assert_eq!(info.sku_name.as_deref(), Some("Y1"));
        assert_eq!(info.target, SITE);
    }

    #[test]
    fn slot_inherits_parent_plan() {
        let target: AppTarget = format!("{SITE}/slots/staging").parse().unwrap();
        let info = service_plan_info_for_app(&inventory(), &target).unwrap();
        assert_eq!(info.service_plan_id.name, "plan1");
    }

    #[test]
    fn slot_with_own_plan() {
        let target: AppTarget = format!("{SITE}/slots/canary").parse().unwrap();
        let info = service_plan_info_for_app(&inventory(), &target).unwrap();
        assert_eq!(info.service_plan_id.name, "plan2");
        assert_eq!(info.sku_name.as_deref(), Some("EP2"));
    }

    #[test]
    fn reports_missing_pieces() {
        let inv = inventory();
        let missing: AppTarget = "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/sites/nope".parse().unwrap();
        let err = service_plan_info_for_app(&inv, &missing).unwrap_err();
        assert!(err.to_string().contains("was not found"), "{err:#}");

        let orphan: AppTarget = "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/sites/orphan".parse().unwrap();
        let err = service_plan_info_for_app(&inv, &orphan).unwrap_err();
        assert!(err.to_string().contains("could not determine the Service Plan ID"), "{err:#}");

        let lost: AppTarget = "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/sites/lost".parse().unwrap();
        let err = service_plan_info_for_app(&inv, &lost).unwrap_err();
        assert!(err.to_string().contains("serverFarms/gone was not found"), "{err:#}");

        let no_slot: AppTarget = format!("{SITE}/slots/missing").parse().unwrap();
        assert!(service_plan_info_for_app(&inv, &no_slot).is_err());
    }

    #[test]
    fn serde_built_inventory_resolves() {
        let inv: Inventory = serde_json::from_value(json!({
            "sites": [{ "id": SITE, "properties": { "serverFarmId": PLAN } }],
            "servicePlans": [{ "id": PLAN, "sku": { "name": "Y1" } }]
        })).unwrap();
        let target: AppTarget = SITE.parse().unwrap();
        let info = service_plan_info_for_app(&inv, &target).unwrap();
        assert_eq!(info.sku_name.as_deref(), Some("Y1"));
        assert_eq!(inv.sites().len(), 1);
    }

    #[test]
    fn pushed_entries_are_indexed() {
        let mut inv = Inventory::new(vec![], vec![]);
        inv.push_site(serde_json::from_value(json!({ "id": SITE, "properties": { "serverFarmId": PLAN } })).unwrap());
        inv.push_service_plan(serde_json::from_value(json!({ "id": PLAN, "sku": { "name": "EP1" } })).unwrap());
        let target: AppTarget = SITE.parse().unwrap();
        let info = service_plan_info_for_app(&inv, &target).unwrap();
        assert_eq!(info.sku_name.as_deref(), Some("EP1"));
        assert_eq!(inv.service_plans().len(), 1);
    }

    #[test]
    fn rejects_bad_inventory() {
        assert!(Inventory::from_json("{\"sites\": 3}").is_err());
    }
}
