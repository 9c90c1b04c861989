use appsku_core::{plan_type_from_sku, PlanType};
use serde::{Serialize, Deserialize};

/// The SKU-bearing subset of `Microsoft.Web/serverFarms`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePlan {
    #[serde(default)] pub id: Option<String>,
    #[serde(default)] pub name: Option<String>,
    #[serde(default)] pub location: Option<String>,
    #[serde(default)] pub sku: Option<SkuDescription>,
    #[serde(default)] pub properties: Option<ServicePlanProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuDescription {
    #[serde(default)] pub name: Option<String>,
    #[serde(default)] pub tier: Option<String>,
    #[serde(default)] pub capacity: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePlanProperties {
    #[serde(default)] pub hosting_environment_profile: Option<HostingEnvironmentProfile>,
    #[serde(default)] pub reserved: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostingEnvironmentProfile {
    #[serde(default)] pub id: Option<String>,
}

impl ServicePlan {
    pub fn sku_name(&self) -> Option<&str> {
        self.sku.as_ref().and_then(|s| s.name.as_deref())
    }

    pub fn plan_type(&self) -> PlanType { plan_type_from_sku(self.sku_name()) }

    /// True when the plan is hosted in an App Service Environment.
    pub fn in_app_service_environment(&self) -> bool {
        self.properties.as_ref()
            .and_then(|p| p.hosting_environment_profile.as_ref())
            .and_then(|h| h.id.as_deref())
            .is_some_and(|id| !id.is_empty())
    }
}

/// A site or slot; only the plan reference is modelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(default)] pub id: Option<String>,
    #[serde(default)] pub name: Option<String>,
    #[serde(default)] pub properties: Option<SiteProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProperties {
    #[serde(default)] pub server_farm_id: Option<String>,
}

impl Site {
    pub fn server_farm_id(&self) -> Option<&str> {
        self.properties.as_ref()
            .and_then(|p| p.server_farm_id.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_sku_from_api_payload() {
        let plan: ServicePlan = serde_json::from_value(json!({
            "id": "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/serverFarms/plan1",
            "name": "plan1",
            "location": "westeurope",
            "sku": { "name": "EP1", "tier": "ElasticPremium", "capacity": 1 },
            "properties": { "reserved": true }
        })).unwrap();
        assert_eq!(plan.sku_name(), Some("EP1"));
        assert_eq!(plan.plan_type(), PlanType::Elastic);
        assert!(!plan.in_app_service_environment());
    }

    #[test]
    fn missing_sku_is_unknown() {
        let plan: ServicePlan = serde_json::from_value(json!({ "name": "bare" })).unwrap();
        assert_eq!(plan.sku_name(), None);
        assert_eq!(plan.plan_type(), PlanType::Unknown);
    }

    #[test]
    fn detects_app_service_environment() {
        let mut plan: ServicePlan = serde_json::from_value(json!({
            "sku": { "name": "I1v2" },
            "properties": { "hostingEnvironmentProfile": { "id": "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/hostingEnvironments/ase1" } }
        })).unwrap();
        assert!(plan.in_app_service_environment());
        plan.properties = Some(ServicePlanProperties {
            hosting_environment_profile: Some(HostingEnvironmentProfile { id: Some(String::new()) }),
            reserved: None,
        });
        assert!(!plan.in_app_service_environment());
    }

    #[test]
    fn site_plan_reference() {
        let site: Site = serde_json::from_value(json!({
            "name": "app1",
            "properties": { "serverFarmId": "" }
        })).unwrap();
        assert_eq!(site.server_farm_id(), None);
    }
}
