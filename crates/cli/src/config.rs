use anyhow::{Context, Result};
use appsku_core::CaseMatch;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Free/shared detection compares exactly unless set to `ignore_case`.
    #[serde(default)]
    pub free_or_shared_match: CaseMatch,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else { return Ok(Self::default()) };
        let raw = std::fs::read(path).with_context(|| format!("read settings {}", path.display()))?;
        if raw.iter().all(u8::is_ascii_whitespace) { return Ok(Self::default()); }
        serde_yaml::from_slice(&raw).with_context(|| format!("parse settings {}", path.display()))
    }
}
