use anyhow::{Result, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value as Json;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use appsku_azure::{service_plan_info_for_app, AppTarget, Inventory};
use appsku_core::{all_known_skus, classify, SkuCategory};
use appsku_policy::Policy;

mod config;
use config::Settings;

#[derive(Parser, Debug)]
#[command(author, version, about="appsku — Azure App Service plan SKU classifier")]
struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum Category { AppPlan, Consumption, Elastic, Free, Isolated, Shared, Workflow }

impl From<Category> for SkuCategory {
    fn from(c: Category) -> Self {
        match c {
            Category::AppPlan => SkuCategory::AppPlan,
            Category::Consumption => SkuCategory::Consumption,
            Category::Elastic => SkuCategory::Elastic,
            Category::Free => SkuCategory::Free,
            Category::Isolated => SkuCategory::Isolated,
            Category::Shared => SkuCategory::Shared,
            Category::Workflow => SkuCategory::Workflow,
        }
    }
}

#[derive(Subcommand, Debug)] enum Cmd {
    /// Print category and plan type for each SKU, one JSON object per line
    Classify { #[arg(required = true)] skus: Vec<String> },
    /// List known SKUs
    Skus { #[arg(long, value_enum)] category: Option<Category> },
    /// Run plan policy over a Terraform JSON (or YAML) document
    Check { #[arg(short='f', long="file")] file: PathBuf },
    /// Resolve the service plan for an app or slot ID from a captured inventory
    PlanInfo {
        #[arg(long)] inventory: PathBuf,
        app_id: String,
    },
}

fn load_document(path: &Path) -> Result<Json> {
    let raw = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let doc: Json = match path.extension().and_then(|s| s.to_str()) {
        Some("yml") | Some("yaml") => serde_yaml::from_slice(&raw)?,
        _ => serde_json::from_slice(&raw)?,
    };
    Ok(doc)
}

fn skus_for(category: Option<Category>) -> Vec<&'static str> {
    match category {
        Some(c) => SkuCategory::from(c).members().to_vec(),
        None => all_known_skus(),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    tracing::debug!(?settings, "loaded settings");

    match cli.cmd {
        Cmd::Classify { skus } => {
            for sku in &skus {
                println!("{}", serde_json::to_string(&classify(sku, settings.free_or_shared_match))?);
            }
        }
        Cmd::Skus { category } => {
            println!("{}", serde_json::to_string_pretty(&skus_for(category))?);
        }
        Cmd::Check { file } => {
            let tf = load_document(&file)?;
            Policy::new(settings.free_or_shared_match).check_tf_json(&tf)?;
            println!("ok");
        }
        Cmd::PlanInfo { inventory, app_id } => {
            let raw = std::fs::read_to_string(&inventory)
                .with_context(|| format!("read inventory {}", inventory.display()))?;
            let inv = Inventory::from_json(&raw)?;
            let target: AppTarget = app_id.parse()?;
            let info = service_plan_info_for_app(&inv, &target)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }
    Ok(())
}
