//! Command handler modules for the `kto` binary.
//!
//! Shared context (effective config, ledger location) lives here.
//! Command-specific logic lives in the submodules.

pub mod ledger;
pub mod quotes;
pub mod report;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use kto_config::{report_unused_keys, AppConfig, LoadedConfig, UnusedKeyPolicy};
use kto_ledger::Store;
use std::path::PathBuf;

/// Effective configuration for one invocation.
pub struct AppContext {
    pub config: AppConfig,
    /// `None` when no config files were given.
    pub loaded: Option<LoadedConfig>,
    pub ledger_path: PathBuf,
}

impl AppContext {
    pub fn load(config_paths: &[String], ledger_override: Option<PathBuf>) -> Result<AppContext> {
        let (config, loaded) = if config_paths.is_empty() {
            (AppConfig::default(), None)
        } else {
            let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
            let loaded = kto_config::load_layered_yaml(&path_refs)?;
            warn_unused_keys(&loaded)?;
            (loaded.app_config()?, Some(loaded))
        };
        let ledger_path = ledger_override.unwrap_or_else(|| config.ledger.path.clone());
        Ok(AppContext {
            config,
            loaded,
            ledger_path,
        })
    }

    pub fn open_store(&self) -> Result<Store> {
        if !self.ledger_path.exists() {
            anyhow::bail!(
                "ledger {} does not exist. Create it with: `kto init`",
                self.ledger_path.display()
            );
        }
        Store::load(&self.ledger_path)
            .with_context(|| format!("open ledger {}", self.ledger_path.display()))
    }

    pub fn save_store(&self, store: &Store) -> Result<()> {
        store
            .save(&self.ledger_path)
            .with_context(|| format!("save ledger {}", self.ledger_path.display()))
    }
}

fn warn_unused_keys(loaded: &LoadedConfig) -> Result<()> {
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        eprintln!(
            "WARN: CONFIG_UNUSED_KEYS unused_leaf_keys={}",
            report.unused_leaf_pointers.len()
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            eprintln!("  unused={}", p);
        }
        let extra = report.unused_leaf_pointers.len().saturating_sub(50);
        if extra > 0 {
            eprintln!("  ... and {} more", extra);
        }
    }
    Ok(())
}

/// The given date, or today in local time.
pub fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}
