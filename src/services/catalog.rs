//! 笔款目录服务
//!
//! Owns the alias store and the monitoring list behind their own locks and
//! the single fuzzy resolver every free-text pen reference goes through.
//! Operations touching both stores lock the alias store first.

use std::collections::BTreeSet;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::{CatalogConfig, ResolverConfig, StorageConfig};
use crate::error::{AppError, Result};
use crate::models::PenEntry;
use crate::services::alias_store::{AliasStore, AliasesAdded, AliasesRemoved, ReloadReport};
use crate::services::monitor_list::{MonitorAdd, MonitorList, MonitorReload, MonitorRemove};
use crate::services::resolver::{FuzzyResolver, ScoredMatch};

/// 单页最大数量
pub const MAX_PAGE_SIZE: usize = 100;

/// Pens written to a fresh alias file
pub const DEFAULT_PENS: &[(&str, &[&str])] = &[
    ("Lamy Safari", &["lamy safari", "safari"]),
    ("Lamy 2000", &["lamy 2000", "lamy 2k", "l2k"]),
    ("Pilot Vanishing Point", &["vanishing point", "pilot vp", "capless"]),
    ("Pilot Custom 823", &["custom 823", "pilot custom"]),
    ("TWSBI Eco", &["twsbi eco"]),
    ("Pilot Metropolitan", &["metropolitan"]),
    ("Pelikan M200", &["pelikan m200", "m200"]),
    ("Opus 88", &["opus 88"]),
    ("Pilot Decimo", &["decimo"]),
    ("Sailor Pro Gear", &["pro gear"]),
];

/// 分页参数
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    /// 页码（从 1 开始）
    pub page: usize,
    /// 每页数量
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl Pagination {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// 计算偏移量
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1) * self.page_size
    }

    /// 检查分页参数是否有效
    pub fn is_valid(&self) -> bool {
        self.page > 0 && self.page_size > 0 && self.page_size <= MAX_PAGE_SIZE
    }
}

/// 一页笔款
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenPage {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub pens: Vec<PenEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenAdded {
    pub entry: PenEntry,
    /// Pens in the store after the addition
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovedPen {
    pub formal_name: String,
    pub aliases: Vec<String>,
    /// Whether the pen was also dropped from the monitoring list
    pub was_monitored: bool,
}

/// What `PenCatalog::open` found on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpenReport {
    pub pens: ReloadReport,
    pub monitoring: MonitorReload,
    /// Default pens written because no alias file existed
    pub seeded: usize,
}

#[derive(Debug)]
pub struct PenCatalog {
    aliases: RwLock<AliasStore>,
    monitoring: RwLock<MonitorList>,
    resolver: FuzzyResolver,
}

impl PenCatalog {
    /// Open both stores, seeding default pens into a missing alias file
    pub fn open(
        storage: &StorageConfig,
        resolver: &ResolverConfig,
        catalog: &CatalogConfig,
    ) -> Result<(Self, OpenReport)> {
        let fresh = !storage.alias_file.exists();
        let (mut aliases, pens) = AliasStore::load(&storage.alias_file)?;

        let seeded = if fresh && catalog.seed_defaults {
            let seeded = aliases.seed(default_pens()?)?;
            info!("Seeded {} default pens into {}", seeded, aliases.path().display());
            seeded
        } else {
            0
        };

        let (monitoring, monitoring_report) = MonitorList::load(&storage.monitoring_file, &aliases)?;

        let report = OpenReport {
            pens,
            monitoring: monitoring_report,
            seeded,
        };
        Ok((Self::new(aliases, monitoring, FuzzyResolver::new(resolver.threshold)), report))
    }

    pub fn new(aliases: AliasStore, monitoring: MonitorList, resolver: FuzzyResolver) -> Self {
        Self {
            aliases: RwLock::new(aliases),
            monitoring: RwLock::new(monitoring),
            resolver,
        }
    }

    pub fn resolver(&self) -> &FuzzyResolver {
        &self.resolver
    }

    pub fn pen_count(&self) -> usize {
        self.aliases.read().len()
    }

    /// Exact, case-insensitive lookup
    pub fn get(&self, formal_name: &str) -> Option<PenEntry> {
        self.aliases.read().get(formal_name).cloned()
    }

    /// Resolve a free-text reference to a formal name
    pub fn resolve(&self, query: &str) -> Result<String> {
        resolve_in(&self.resolver, &self.aliases.read(), query)
    }

    /// Pens close to `query`, best first
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredMatch> {
        let aliases = self.aliases.read();
        self.resolver.rank(query, aliases.candidates(), limit)
    }

    pub fn list_pens(&self, pagination: Pagination) -> Result<PenPage> {
        if !pagination.is_valid() {
            return Err(AppError::Validation(format!(
                "page must be >= 1 and page_size between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let aliases = self.aliases.read();
        let pens = aliases
            .list_all()
            .skip(pagination.offset())
            .take(pagination.page_size)
            .map(|(formal_name, aliases)| PenEntry {
                formal_name: formal_name.to_string(),
                aliases: aliases.to_vec(),
            })
            .collect();

        Ok(PenPage {
            page: pagination.page,
            page_size: pagination.page_size,
            total: aliases.len(),
            pens,
        })
    }

    pub fn add_pen(&self, formal_name: &str, aliases: &[String]) -> Result<PenAdded> {
        let mut store = self.aliases.write();
        let total = store.add_pen(formal_name, aliases)?;
        let entry = store
            .get(formal_name)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("pen '{formal_name}' missing after insert")))?;
        Ok(PenAdded { entry, total })
    }

    /// Remove a pen and stop monitoring it.
    ///
    /// If the monitoring file cannot be rewritten the pen is put back, so
    /// the two files never disagree.
    pub fn remove_pen(&self, query: &str) -> Result<RemovedPen> {
        let mut aliases = self.aliases.write();
        let formal_name = resolve_in(&self.resolver, &aliases, query)?;
        let removed = aliases.remove_pen(&formal_name)?;

        let mut monitoring = self.monitoring.write();
        let was_monitored = match monitoring.remove_exact(&formal_name) {
            Ok(was_monitored) => was_monitored,
            Err(e) => {
                let formal_name = removed.entry.formal_name.clone();
                if let Err(restore_err) = aliases.restore(removed) {
                    error!(
                        "Could not restore pen '{}' after failed monitoring write: {}",
                        formal_name, restore_err
                    );
                }
                return Err(e);
            }
        };

        Ok(RemovedPen {
            formal_name: removed.entry.formal_name,
            aliases: removed.entry.aliases,
            was_monitored,
        })
    }

    pub fn add_aliases(&self, query: &str, new_aliases: &[String]) -> Result<AliasesAdded> {
        let mut aliases = self.aliases.write();
        let formal_name = resolve_in(&self.resolver, &aliases, query)?;
        aliases.add_aliases(&formal_name, new_aliases)
    }

    pub fn remove_aliases(&self, query: &str, to_remove: &[String]) -> Result<AliasesRemoved> {
        let mut aliases = self.aliases.write();
        let formal_name = resolve_in(&self.resolver, &aliases, query)?;
        aliases.remove_aliases(&formal_name, to_remove)
    }

    /// Re-read the alias file
    pub fn reload_aliases(&self) -> Result<ReloadReport> {
        self.aliases.write().reload()
    }

    pub fn add_monitoring(&self, queries: &[String]) -> Result<MonitorAdd> {
        let aliases = self.aliases.read();
        let mut monitoring = self.monitoring.write();
        monitoring.add(queries, &aliases, &self.resolver)
    }

    pub fn remove_monitoring(&self, queries: &[String]) -> Result<MonitorRemove> {
        let aliases = self.aliases.read();
        let mut monitoring = self.monitoring.write();
        monitoring.remove(queries, &aliases, &self.resolver)
    }

    /// Monitored formal names in insertion order
    pub fn monitored(&self) -> Vec<String> {
        self.monitoring.read().names().to_vec()
    }

    /// Search terms of the monitored pens, from live alias state
    pub fn search_terms(&self) -> BTreeSet<String> {
        let aliases = self.aliases.read();
        let monitoring = self.monitoring.read();
        monitoring.current_search_terms(&aliases)
    }

    /// Re-read the monitoring file
    pub fn reload_monitoring(&self) -> Result<MonitorReload> {
        let aliases = self.aliases.read();
        let mut monitoring = self.monitoring.write();
        monitoring.reload(&aliases)
    }
}

fn resolve_in(resolver: &FuzzyResolver, aliases: &AliasStore, query: &str) -> Result<String> {
    resolver
        .resolve(query, aliases.candidates())
        .ok_or_else(|| AppError::NotFound(query.trim().to_string()))
}

fn default_pens() -> Result<Vec<PenEntry>> {
    DEFAULT_PENS
        .iter()
        .map(|(name, aliases)| {
            let aliases: Vec<String> = aliases.iter().map(|a| a.to_string()).collect();
            PenEntry::new(name, &aliases)
        })
        .collect()
}
