use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitError};

/// Maks tillatt tid mellom to påfølgende punkter før segmentet brytes (5 min).
pub const DEFAULT_MAX_GAP_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub max_gap_secs: i64,
    pub creator: String,
    pub track_name: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_gap_secs: DEFAULT_MAX_GAP_SECS,
            creator: "SegmentApp".to_string(),
            track_name: "Segmented Track".to_string(),
        }
    }
}

impl SplitConfig {
    pub fn max_gap_millis(&self) -> i64 {
        self.max_gap_secs.saturating_mul(1000)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_gap_secs < 0 {
            return Err(SplitError::Config(format!(
                "max_gap_secs må være >= 0 (fikk {})",
                self.max_gap_secs
            )));
        }
        Ok(())
    }

    pub fn from_json(json_str: &str) -> Result<Self> {
        let mut de = serde_json::Deserializer::from_str(json_str);
        let cfg: SplitConfig = serde_path_to_error::deserialize(&mut de)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Leser konfig fra disk (JSON).
/// Hvis filen ikke finnes, returneres default-konfig.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SplitConfig> {
    let path = path.as_ref();
    if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        let cfg = SplitConfig::from_json(&contents)?;
        info!("📂 Konfig lastet fra {} (max_gap_secs={})", path.display(), cfg.max_gap_secs);
        Ok(cfg)
    } else {
        warn!("⚠️ Fant ikke konfig på {}, bruker default", path.display());
        Ok(SplitConfig::default())
    }
}

/// Lagrer konfig til disk som JSON (pretty-print).
pub fn save_config<P: AsRef<Path>>(config: &SplitConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    config.validate()?;
    let json = serde_json::to_string_pretty(config).map_err(|e| SplitError::Json {
        path: ".".to_string(),
        message: e.to_string(),
    })?;
    std::fs::write(path, json)?;
    info!("✅ Konfig lagret til {}", path.display());
    Ok(())
}
