use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as Json;
use thiserror::Error;
use tracing::debug;

use appsku_azure::ServicePlan;
use appsku_core::{all_known_skus, is_free_or_shared_with, plan_is_consumption, plan_is_elastic, plan_is_flex_consumption, CaseMatch};

static PLAN_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$\{azurerm_service_plan\.([A-Za-z0-9_-]+)\.id\}$").expect("static regex")
});

const WEB_APPS: &[&str] = &["azurerm_linux_web_app", "azurerm_windows_web_app"];
const FUNCTION_APPS: &[&str] = &["azurerm_linux_function_app", "azurerm_windows_function_app"];
const FLEX_FUNCTION_APP: &str = "azurerm_function_app_flex_consumption";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("always_on cannot be set to true when using Free, F1, D1 Sku")]
    AlwaysOnOnFreePlan,
    #[error("always_on feature has to be turned off before switching to a free/shared Sku")]
    AlwaysOnBeforeFreePlan,
    #[error("`vnet_image_pull_enabled` cannot be disabled for app running in an app service environment")]
    VnetImagePullRequiredInAse,
    #[error("`vnet_image_pull_enabled` cannot be enabled on consumption plans")]
    VnetImagePullOnConsumption,
    #[error("the sku name is {0} which is not valid for a flex consumption function app")]
    NotFlexConsumption(String),
    #[error("expected {field} to be one of [{allowed}], got {got}")]
    SkuNotAllowed { field: String, allowed: String, got: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase { Create, Update }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionAppKind { Linux, Windows, LinuxSlot, WindowsSlot }

pub fn check_always_on(sku: Option<&str>, always_on: bool, phase: Phase, how: CaseMatch) -> Result<(), PolicyError> {
    if !always_on || !is_free_or_shared_with(sku, how) { return Ok(()); }
    match phase {
        Phase::Create => Err(PolicyError::AlwaysOnOnFreePlan),
        Phase::Update => Err(PolicyError::AlwaysOnBeforeFreePlan),
    }
}

/// Whether the content share app settings go out with a function app.
/// Linux slots only get them on Elastic Premium.
pub fn sends_content_settings(sku: Option<&str>, force_disable_content_share: bool, kind: FunctionAppKind) -> bool {
    if force_disable_content_share { return false; }
    match kind {
        FunctionAppKind::LinuxSlot => plan_is_elastic(sku),
        _ => plan_is_elastic(sku) || plan_is_consumption(sku),
    }
}

pub fn check_vnet_image_pull(plan: &ServicePlan, enabled: bool) -> Result<(), PolicyError> {
    if plan.in_app_service_environment() && !enabled {
        return Err(PolicyError::VnetImagePullRequiredInAse);
    }
    if plan_is_consumption(plan.sku_name()) && enabled {
        return Err(PolicyError::VnetImagePullOnConsumption);
    }
    Ok(())
}

/// Flex consumption function apps only run on a flex consumption plan.
pub fn check_flex_consumption_sku(sku: Option<&str>) -> Result<(), PolicyError> {
    if plan_is_flex_consumption(sku) { return Ok(()); }
    Err(PolicyError::NotFlexConsumption(sku.unwrap_or_default().to_string()))
}

/// Allowed values for a `sku_name` field.
#[derive(Debug, Clone)]
pub struct SkuAllowList { skus: Vec<&'static str>, how: CaseMatch }

impl Default for SkuAllowList {
    fn default() -> Self { Self { skus: all_known_skus(), how: CaseMatch::Exact } }
}

impl SkuAllowList {
    pub fn ignore_case(mut self) -> Self { self.how = CaseMatch::IgnoreCase; self }

    pub fn contains(&self, value: &str) -> bool {
        self.skus.iter().any(|s| match self.how {
            CaseMatch::Exact => *s == value,
            CaseMatch::IgnoreCase => s.eq_ignore_ascii_case(value),
        })
    }

    pub fn validate(&self, field: &str, value: &str) -> Result<(), PolicyError> {
        if self.contains(value) { return Ok(()); }
        Err(PolicyError::SkuNotAllowed { field: field.to_string(), allowed: self.skus.join(", "), got: value.to_string() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation { pub resource: String, pub error: PolicyError }

/// Plan-time checks over a Terraform JSON document.
pub struct Policy { pub free_or_shared_match: CaseMatch, pub allow_list: SkuAllowList }

impl Policy {
    pub fn new(free_or_shared_match: CaseMatch) -> Self {
        Self { free_or_shared_match, allow_list: SkuAllowList::default() }
    }

    pub fn check_tf_json(&self, tf: &Json) -> Result<()> {
        let found = self.violations(tf);
        if found.is_empty() { return Ok(()); }
        let lines: Vec<String> = found.iter().map(|v| format!("{}: {}", v.resource, v.error)).collect();
        anyhow::bail!("Policy: {} violation(s):\n{}", found.len(), lines.join("\n"))
    }

    pub fn violations(&self, tf: &Json) -> Vec<Violation> {
        let mut out = Vec::new();
        let Some(resources) = tf.get("resource") else { return out };

        for (name, plan) in blocks(resources, "azurerm_service_plan") {
            // flex consumption plans sit outside the known-SKU list
            if let Some(sku) = plan.get("sku_name").and_then(Json::as_str).filter(|s| !plan_is_flex_consumption(*s)) {
                if let Err(error) = self.allow_list.validate("sku_name", sku) {
                    out.push(Violation { resource: format!("azurerm_service_plan.{name}"), error });
                }
            }
        }

        for kind in WEB_APPS {
            for (name, app) in blocks(resources, kind) {
                let Some(sku) = plan_sku(resources, app) else {
                    debug!(resource = %format!("{kind}.{name}"), "service plan not resolvable, skipping");
                    continue;
                };
                let always_on = site_config(app)
                    .and_then(|sc| sc.get("always_on"))
                    .and_then(Json::as_bool)
                    .unwrap_or(false);
                if let Err(error) = check_always_on(Some(sku), always_on, Phase::Create, self.free_or_shared_match) {
                    out.push(Violation { resource: format!("{kind}.{name}"), error });
                }
            }
        }

        for kind in FUNCTION_APPS {
            for (name, app) in blocks(resources, kind) {
                let enabled = app.get("vnet_image_pull_enabled").and_then(Json::as_bool).unwrap_or(false);
                if enabled && plan_is_consumption(plan_sku(resources, app)) {
                    out.push(Violation { resource: format!("{kind}.{name}"), error: PolicyError::VnetImagePullOnConsumption });
                }
            }
        }

        for (name, app) in blocks(resources, FLEX_FUNCTION_APP) {
            let Some(sku) = plan_sku(resources, app) else {
                debug!(resource = %format!("{FLEX_FUNCTION_APP}.{name}"), "service plan not resolvable, skipping");
                continue;
            };
            if let Err(error) = check_flex_consumption_sku(Some(sku)) {
                out.push(Violation { resource: format!("{FLEX_FUNCTION_APP}.{name}"), error });
            }
        }
        out
    }
}

fn blocks<'a>(resources: &'a Json, kind: &str) -> Vec<(&'a str, &'a Json)> {
    resources.get(kind)
        .and_then(Json::as_object)
        .map(|m| m.iter().map(|(k, v)| (k.as_str(), v)).collect())
        .unwrap_or_default()
}

// Blocks may be written as an object or a one-element array.
fn site_config(app: &Json) -> Option<&Json> {
    match app.get("site_config")? {
        Json::Array(items) => items.first(),
        other => Some(other),
    }
}

fn plan_sku<'a>(resources: &'a Json, app: &Json) -> Option<&'a str> {
    let reference = app.get("service_plan_id")?.as_str()?;
    let plan_name = PLAN_REF.captures(reference)?.get(1)?.as_str();
    resources.get("azurerm_service_plan")?.get(plan_name)?.get("sku_name")?.as_str()
}
