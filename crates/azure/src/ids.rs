use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static PLAN_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^/subscriptions/([^/]+)/resourceGroups/([^/]+)/providers/Microsoft\.Web/serverFarms/([^/]+)/?$")
        .expect("static regex")
});
static SITE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^/subscriptions/([^/]+)/resourceGroups/([^/]+)/providers/Microsoft\.Web/sites/([^/]+)/?$")
        .expect("static regex")
});
static SLOT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^/subscriptions/([^/]+)/resourceGroups/([^/]+)/providers/Microsoft\.Web/sites/([^/]+)/slots/([^/]+)/?$")
        .expect("static regex")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("parsing {kind} ID {input:?}: expected {expected}")]
pub struct IdError { pub kind: &'static str, pub input: String, pub expected: &'static str }

fn captures<'a>(re: &Regex, input: &'a str, kind: &'static str, expected: &'static str) -> Result<Vec<&'a str>, IdError> {
    let caps = re.captures(input)
        .ok_or_else(|| IdError { kind, input: input.to_string(), expected })?;
    Ok(caps.iter().skip(1).flatten().map(|m| m.as_str()).collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServicePlanId { pub subscription_id: String, pub resource_group: String, pub name: String }

impl ServicePlanId {
    pub fn new(subscription_id: impl Into<String>, resource_group: impl Into<String>, name: impl Into<String>) -> Self {
        Self { subscription_id: subscription_id.into(), resource_group: resource_group.into(), name: name.into() }
    }
}

impl fmt::Display for ServicePlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/serverFarms/{}",
            self.subscription_id, self.resource_group, self.name)
    }
}

impl FromStr for ServicePlanId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p = captures(&PLAN_ID, s, "App Service Plan",
            "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Web/serverFarms/{serverFarmName}")?;
        Ok(Self::new(p[0], p[1], p[2]))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WebAppId { pub subscription_id: String, pub resource_group: String, pub site_name: String }

impl WebAppId {
    pub fn new(subscription_id: impl Into<String>, resource_group: impl Into<String>, site_name: impl Into<String>) -> Self {
        Self { subscription_id: subscription_id.into(), resource_group: resource_group.into(), site_name: site_name.into() }
    }
}

impl fmt::Display for WebAppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/sites/{}",
            self.subscription_id, self.resource_group, self.site_name)
    }
}

impl FromStr for WebAppId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p = captures(&SITE_ID, s, "App Service",
            "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Web/sites/{siteName}")?;
        Ok(Self::new(p[0], p[1], p[2]))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId { pub subscription_id: String, pub resource_group: String, pub site_name: String, pub slot_name: String }

impl SlotId {
    pub fn site(&self) -> WebAppId {
        WebAppId::new(self.subscription_id.clone(), self.resource_group.clone(), self.site_name.clone())
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/slots/{}", self.site(), self.slot_name)
    }
}

impl FromStr for SlotId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p = captures(&SLOT_ID, s, "App Service Slot",
            "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Web/sites/{siteName}/slots/{slotName}")?;
        Ok(Self {
            subscription_id: p[0].to_string(),
            resource_group: p[1].to_string(),
            site_name: p[2].to_string(),
            slot_name: p[3].to_string(),
        })
    }
}

/// An app or one of its deployment slots; both resolve to a service plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppTarget {
    App(WebAppId),
    Slot(SlotId),
}

impl AppTarget {
    pub fn site_id(&self) -> WebAppId {
        match self {
            AppTarget::App(id) => id.clone(),
            AppTarget::Slot(id) => id.site(),
        }
    }
}

impl From<WebAppId> for AppTarget { fn from(id: WebAppId) -> Self { AppTarget::App(id) } }
impl From<SlotId> for AppTarget { fn from(id: SlotId) -> Self { AppTarget::Slot(id) } }

impl fmt::Display for AppTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppTarget::App(id) => fmt::Display::fmt(id, f),
            AppTarget::Slot(id) => fmt::Display::fmt(id, f),
        }
    }
}

impl FromStr for AppTarget {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(slot) = s.parse::<SlotId>() { return Ok(AppTarget::Slot(slot)); }
        s.parse::<WebAppId>().map(AppTarget::App).map_err(|_| IdError {
            kind: "App Service or Slot",
            input: s.to_string(),
            expected: ".../providers/Microsoft.Web/sites/{siteName}[/slots/{slotName}]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/serverFarms/plan1";
    const SITE: &str = "/subscriptions/0000/resourceGroups/rg1/providers/Microsoft.Web/sites/app1";

    #[test]
    fn plan_id_round_trips() {
        let id: ServicePlanId = PLAN.parse().unwrap();
        assert_eq!(id, ServicePlanId::new("0000", "rg1", "plan1"));
        assert_eq!(id.to_string(), PLAN);
    }

    #[test]
    fn segment_names_ignore_case() {
        let id: ServicePlanId = "/subscriptions/0000/resourcegroups/rg1/providers/microsoft.web/serverfarms/plan1"
            .parse().unwrap();
        assert_eq!(id.name, "plan1");
        assert_eq!(id.to_string(), PLAN);
    }

    #[test]
    fn plan_id_rejects_site_id() {
        let err = SITE.parse::<ServicePlanId>().unwrap_err();
        assert_eq!(err.kind, "App Service Plan");
        assert!(err.to_string().contains("serverFarms/{serverFarmName}"));
    }

    #[test]
    fn target_prefers_slot() {
        let slot = format!("{SITE}/slots/staging");
        match slot.parse::<AppTarget>().unwrap() {
            AppTarget::Slot(s) => {
                assert_eq!(s.slot_name, "staging");
                assert_eq!(s.site().to_string(), SITE);
            }
            other => panic!("expected slot, got {other:?}"),
        }
        assert_eq!(SITE.parse::<AppTarget>().unwrap(), AppTarget::App(SITE.parse().unwrap()));
    }

    #[test]
    fn target_rejects_plan_id() {
        let err = PLAN.parse::<AppTarget>().unwrap_err();
        assert_eq!(err.kind, "App Service or Slot");
    }
}
