//! SalesDesk configuration.

use crate::error::{ActionError, ActionResult};
use salesdesk_storage::Page;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a [`SalesDesk`](crate::SalesDesk) instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesDeskConfig {
    /// Directory holding the record and grant databases. `None` keeps
    /// everything in memory.
    pub data_dir: Option<PathBuf>,

    /// DuckDB file name inside `data_dir`.
    pub records_file: String,

    /// SQLite file name inside `data_dir`.
    pub grants_file: String,

    /// DuckDB `memory_limit` PRAGMA value (e.g. "256MB").
    pub duckdb_memory_limit: String,

    pub duckdb_threads: u32,

    /// Page size used when a listing does not ask for one.
    pub default_page_size: usize,

    /// Upper bound for caller-requested page sizes.
    pub max_page_size: usize,
}

impl Default for SalesDeskConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            records_file: "records.duckdb".to_string(),
            grants_file: "grants.sqlite".to_string(),
            duckdb_memory_limit: "256MB".to_string(),
            duckdb_threads: 2,
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

impl SalesDeskConfig {
    /// Config persisting under `dir`.
    pub fn persistent(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> ActionResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: SalesDeskConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ActionResult<()> {
        if self.default_page_size == 0 {
            return Err(ActionError::Config("default_page_size must be positive".into()));
        }
        if self.max_page_size < self.default_page_size {
            return Err(ActionError::Config(format!(
                "max_page_size ({}) is below default_page_size ({})",
                self.max_page_size, self.default_page_size
            )));
        }
        if self.duckdb_threads == 0 {
            return Err(ActionError::Config("duckdb_threads must be positive".into()));
        }
        Ok(())
    }

    pub fn records_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join(&self.records_file))
    }

    pub fn grants_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join(&self.grants_file))
    }

    pub fn paging(&self) -> PagingLimits {
        PagingLimits {
            default_limit: self.default_page_size,
            max_limit: self.max_page_size,
        }
    }
}

/// Page-size bounds applied to every listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagingLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PagingLimits {
    fn default() -> Self {
        SalesDeskConfig::default().paging()
    }
}

impl PagingLimits {
    /// The caller's page with its limit clamped, or the default first page.
    pub fn resolve(&self, requested: Option<Page>) -> Page {
        match requested {
            Some(page) => Page::new(page.limit.min(self.max_limit.max(1)).max(1), page.offset),
            None => Page::first(self.default_limit),
        }
    }
}
