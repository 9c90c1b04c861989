use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const APP_PLAN_SKUS: &[&str] = &[
    "B1", "B2", "B3",
    "S1", "S2", "S3",
    "P1v2", "P2v2", "P3v2",
    "P0v3", "P1v3", "P2v3", "P3v3",
    "P1mv3", "P2mv3", "P3mv3", "P4mv3", "P5mv3",
];
pub const FREE_SKUS: &[&str] = &["F1"];
pub const SHARED_SKUS: &[&str] = &["D1", "SHARED"];
pub const CONSUMPTION_SKUS: &[&str] = &["Y1"];
pub const ELASTIC_SKUS: &[&str] = &["EP1", "EP2", "EP3"];
pub const ISOLATED_SKUS: &[&str] = &[
    "I1", "I2", "I3",
    "I1v2", "I2v2", "I3v2", "I4v2", "I5v2", "I6v2",
];
pub const WORKFLOW_SKUS: &[&str] = &["WS1", "WS2", "WS3"];
/// Flex consumption is not a [`SkuCategory`]: it never appears in
/// [`all_known_skus`] and never maps to a plan type.
pub const FLEX_CONSUMPTION_SKUS: &[&str] = &["FC1"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkuError {
    #[error("unknown SKU category '{0}'")]
    UnknownCategory(String),
    #[error("unknown plan type '{0}'")]
    UnknownPlanType(String),
}

/// How SKU names are compared against a reference set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseMatch {
    #[default]
    Exact,
    IgnoreCase,
}

impl CaseMatch {
    fn matches(self, a: &str, b: &str) -> bool {
        match self {
            CaseMatch::Exact => a == b,
            CaseMatch::IgnoreCase => a.eq_ignore_ascii_case(b),
        }
    }
}

fn in_set<'a>(set: &[&str], sku: impl Into<Option<&'a str>>, how: CaseMatch) -> bool {
    match sku.into() {
        Some(name) => set.iter().any(|s| how.matches(s, name)),
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkuCategory { AppPlan, Consumption, Elastic, Free, Isolated, Shared, Workflow }

impl SkuCategory {
    /// Allow-list order used by [`all_known_skus`].
    pub const ALL: [SkuCategory; 7] = [
        SkuCategory::AppPlan,
        SkuCategory::Consumption,
        SkuCategory::Elastic,
        SkuCategory::Free,
        SkuCategory::Isolated,
        SkuCategory::Shared,
        SkuCategory::Workflow,
    ];

    pub fn members(self) -> &'static [&'static str] {
        match self {
            SkuCategory::AppPlan => APP_PLAN_SKUS,
            SkuCategory::Consumption => CONSUMPTION_SKUS,
            SkuCategory::Elastic => ELASTIC_SKUS,
            SkuCategory::Free => FREE_SKUS,
            SkuCategory::Isolated => ISOLATED_SKUS,
            SkuCategory::Shared => SHARED_SKUS,
            SkuCategory::Workflow => WORKFLOW_SKUS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkuCategory::AppPlan => "app_plan",
            SkuCategory::Consumption => "consumption",
            SkuCategory::Elastic => "elastic",
            SkuCategory::Free => "free",
            SkuCategory::Isolated => "isolated",
            SkuCategory::Shared => "shared",
            SkuCategory::Workflow => "workflow",
        }
    }

    pub fn contains<'a>(self, sku: impl Into<Option<&'a str>>) -> bool {
        in_set(self.members(), sku, CaseMatch::IgnoreCase)
    }
}

impl fmt::Display for SkuCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for SkuCategory {
    type Err = SkuError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkuCategory::ALL.into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SkuError::UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType { Consumption, Elastic, Isolated, App, Unknown }

impl PlanType {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanType::Consumption => "consumption",
            PlanType::Elastic => "elastic",
            PlanType::Isolated => "isolated",
            PlanType::App => "app",
            PlanType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for PlanType {
    type Err = SkuError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "consumption" => Ok(PlanType::Consumption),
            "elastic" => Ok(PlanType::Elastic),
            "isolated" => Ok(PlanType::Isolated),
            "app" => Ok(PlanType::App),
            "unknown" => Ok(PlanType::Unknown),
            _ => Err(SkuError::UnknownPlanType(s.to_string())),
        }
    }
}

pub fn plan_is_consumption<'a>(sku: impl Into<Option<&'a str>>) -> bool {
    SkuCategory::Consumption.contains(sku)
}

pub fn plan_is_elastic<'a>(sku: impl Into<Option<&'a str>>) -> bool {
    SkuCategory::Elastic.contains(sku)
}

pub fn plan_is_isolated<'a>(sku: impl Into<Option<&'a str>>) -> bool {
    SkuCategory::Isolated.contains(sku)
}

pub fn plan_is_app_plan<'a>(sku: impl Into<Option<&'a str>>) -> bool {
    SkuCategory::AppPlan.contains(sku)
}

pub fn plan_is_flex_consumption<'a>(sku: impl Into<Option<&'a str>>) -> bool {
    in_set(FLEX_CONSUMPTION_SKUS, sku, CaseMatch::IgnoreCase)
}

/// Free or shared tier, compared exactly: `"f1"` is not free.
pub fn is_free_or_shared<'a>(sku: impl Into<Option<&'a str>>) -> bool {
    is_free_or_shared_with(sku, CaseMatch::Exact)
}

pub fn is_free_or_shared_with<'a>(sku: impl Into<Option<&'a str>>, how: CaseMatch) -> bool {
    let sku = sku.into();
    in_set(FREE_SKUS, sku, how) || in_set(SHARED_SKUS, sku, how)
}

/// Consumption, then Elastic, then Isolated, then AppPlan; anything else is unknown.
pub fn plan_type_from_sku<'a>(sku: impl Into<Option<&'a str>>) -> PlanType {
    let sku = sku.into();
    if plan_is_consumption(sku) { PlanType::Consumption }
    else if plan_is_elastic(sku) { PlanType::Elastic }
    else if plan_is_isolated(sku) { PlanType::Isolated }
    else if plan_is_app_plan(sku) { PlanType::App }
    else { PlanType::Unknown }
}

pub fn all_known_skus() -> Vec<&'static str> {
    SkuCategory::ALL.iter().flat_map(|c| c.members().iter().copied()).collect()
}

/// Case-insensitive lookup across all seven sets.
pub fn category_of<'a>(sku: impl Into<Option<&'a str>>) -> Option<SkuCategory> {
    let sku = sku.into();
    SkuCategory::ALL.into_iter().find(|c| c.contains(sku))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub sku: String,
    pub category: Option<SkuCategory>,
    pub plan_type: PlanType,
    pub free_or_shared: bool,
}

/// `category` ignores case while `free_or_shared` follows `free_or_shared_match`,
/// so `classify("f1", CaseMatch::Exact)` is free but not free-or-shared.
pub fn classify(sku: &str, free_or_shared_match: CaseMatch) -> Classification {
    Classification {
        sku: sku.to_string(),
        category: category_of(sku),
        plan_type: plan_type_from_sku(sku),
        free_or_shared: is_free_or_shared_with(sku, free_or_shared_match),
    }
}
