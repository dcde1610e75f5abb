//! Load and validate runtime configuration.

use std::{fs, path::Path, path::PathBuf};

use anyhow::Context;
use directories::ProjectDirs;
use serde::Deserialize;

use crate::recommend::{MarketRoles, RecommendRules, RuleSet};
use crate::types::MarketBucket;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UniverseCfg {
    /// JSON file: `{ "<market>": [SecurityRecord, ...] }`.
    pub path: PathBuf,
    pub primary_market: String,
    pub secondary_market: String,
}

impl Default for UniverseCfg {
    fn default() -> Self {
        let roles = MarketRoles::default();
        Self {
            path: PathBuf::from("data/market_data.json"),
            primary_market: roles.primary,
            secondary_market: roles.secondary,
        }
    }
}

impl UniverseCfg {
    pub fn roles(&self) -> MarketRoles {
        MarketRoles {
            primary: self.primary_market.clone(),
            secondary: self.secondary_market.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RecommendCfg {
    pub rule_set: RuleSet,
    /// Overrides the rule set's own cap when present.
    pub limit: Option<usize>,
}

impl RecommendCfg {
    pub fn rules(&self) -> RecommendRules {
        let mut rules = self.rule_set.rules();
        if self.limit.is_some() {
            rules.limit = self.limit;
        }
        rules
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct FeeRates {
    pub buy: f64,
    pub sell: f64,
}

/// Commission/tax rates selected by ticker suffix.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FeeSchedule {
    pub domestic_suffixes: Vec<String>,
    pub domestic: FeeRates,
    pub foreign: FeeRates,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            domestic_suffixes: vec![".KS".to_string(), ".KQ".to_string()],
            domestic: FeeRates {
                buy: 0.00015,
                sell: 0.00195,
            },
            foreign: FeeRates {
                buy: 0.001,
                sell: 0.001,
            },
        }
    }
}

impl FeeSchedule {
    pub fn bucket(&self, ticker: &str) -> MarketBucket {
        let t = ticker.to_ascii_uppercase();
        if self
            .domestic_suffixes
            .iter()
            .any(|s| t.ends_with(&s.to_ascii_uppercase()))
        {
            MarketBucket::Domestic
        } else {
            MarketBucket::Foreign
        }
    }

    pub fn rates(&self, ticker: &str) -> FeeRates {
        match self.bucket(ticker) {
            MarketBucket::Domestic => self.domestic,
            MarketBucket::Foreign => self.foreign,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StateCfg {
    /// Directory of the ledger store. Defaults to the per-user data dir.
    pub dir: Option<PathBuf>,
}

impl StateCfg {
    pub fn resolve_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        let dirs = ProjectDirs::from("", "", "screener-ledger")
            .context("no home directory to place the ledger store in")?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ExportCfg {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub universe: UniverseCfg,
    pub recommend: RecommendCfg,
    pub fees: FeeSchedule,
    pub state: StateCfg,
    pub export: ExportCfg,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_yaml(&s)
    }

    pub fn from_yaml(s: &str) -> anyhow::Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Self = serde_yaml::from_str(s).context("parse config yaml")?;
        Ok(cfg)
    }
}
