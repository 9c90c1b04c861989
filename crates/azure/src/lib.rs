pub mod ids;
pub mod lookup;
pub mod model;

pub use ids::{AppTarget, IdError, ServicePlanId, SlotId, WebAppId};
pub use lookup::{service_plan_info_for_app, Inventory, PlanInfo, PlanSource};
pub use model::{HostingEnvironmentProfile, ServicePlan, ServicePlanProperties, Site, SiteProperties, SkuDescription};
