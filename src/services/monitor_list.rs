//! Monitor List
//!
//! The formal names currently under watch, in insertion order, persisted
//! one per line in their own flat file. Search terms are never stored:
//! they are derived from the live alias store on every call, so alias
//! edits made after a pen was added are picked up by the next cycle.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::pen::name_key;
use crate::services::alias_store::AliasStore;
use crate::services::resolver::FuzzyResolver;
use crate::storage::flat_file;

/// Query that clears the whole list when passed to `remove`
pub const ALL: &str = "ALL";

const HEADER: &[&str] = &["penwatch monitoring list", "one formal pen name per line"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorAdd {
    pub added: Vec<String>,
    pub already_present: Vec<String>,
    pub not_found: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorRemove {
    pub removed: Vec<String>,
    pub not_found: Vec<String>,
}

/// Outcome of (re)loading the monitoring file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorReload {
    pub loaded: usize,
    /// Names with no matching pen in the alias store
    pub dropped: Vec<String>,
}

#[derive(Debug)]
pub struct MonitorList {
    path: PathBuf,
    names: Vec<String>,
}

impl MonitorList {
    /// Load the list from `path`, keeping only names known to `aliases`
    pub fn load(path: impl Into<PathBuf>, aliases: &AliasStore) -> Result<(Self, MonitorReload)> {
        let mut list = Self {
            path: path.into(),
            names: Vec::new(),
        };
        let report = list.reload(aliases)?;
        Ok((list, report))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Monitored formal names in insertion order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Case-insensitive membership check by formal name
    pub fn contains(&self, formal_name: &str) -> bool {
        self.position(formal_name).is_some()
    }

    /// Resolve each query and start monitoring the pens found.
    ///
    /// Persists only when at least one pen was added.
    pub fn add(
        &mut self,
        queries: &[String],
        aliases: &AliasStore,
        resolver: &FuzzyResolver,
    ) -> Result<MonitorAdd> {
        let mut next = self.names.clone();
        let mut outcome = MonitorAdd::default();

        for query in queries.iter().map(|q| q.trim()).filter(|q| !q.is_empty()) {
            match resolver.resolve(query, aliases.candidates()) {
                Some(formal_name) => {
                    let key = name_key(&formal_name);
                    if next.iter().any(|n| name_key(n) == key) {
                        outcome.already_present.push(formal_name);
                    } else {
                        next.push(formal_name.clone());
                        outcome.added.push(formal_name);
                    }
                }
                None => outcome.not_found.push(query.to_string()),
            }
        }

        if !outcome.added.is_empty() {
            self.commit(next)?;
            info!("Now monitoring [{}]", outcome.added.join(", "));
        }
        Ok(outcome)
    }

    /// Resolve each query and stop monitoring the pens found.
    ///
    /// Any query equal to `ALL` (case-insensitive) clears the list. A query
    /// resolving to a pen that is not monitored counts as not found.
    pub fn remove(
        &mut self,
        queries: &[String],
        aliases: &AliasStore,
        resolver: &FuzzyResolver,
    ) -> Result<MonitorRemove> {
        if queries.iter().any(|q| q.trim().eq_ignore_ascii_case(ALL)) {
            let removed = self.names.clone();
            if !removed.is_empty() {
                self.commit(Vec::new())?;
                info!("Cleared monitoring list ({} pens)", removed.len());
            }
            return Ok(MonitorRemove {
                removed,
                not_found: Vec::new(),
            });
        }

        let mut next = self.names.clone();
        let mut outcome = MonitorRemove::default();

        for query in queries.iter().map(|q| q.trim()).filter(|q| !q.is_empty()) {
            let position = resolver.resolve(query, aliases.candidates()).and_then(|formal| {
                let key = name_key(&formal);
                next.iter().position(|n| name_key(n) == key)
            });
            match position {
                Some(i) => outcome.removed.push(next.remove(i)),
                None => outcome.not_found.push(query.to_string()),
            }
        }

        if !outcome.removed.is_empty() {
            self.commit(next)?;
            info!("Stopped monitoring [{}]", outcome.removed.join(", "));
        }
        Ok(outcome)
    }

    /// Drop an exact formal name; returns whether it was monitored
    pub fn remove_exact(&mut self, formal_name: &str) -> Result<bool> {
        let Some(position) = self.position(formal_name) else {
            return Ok(false);
        };
        let mut next = self.names.clone();
        let name = next.remove(position);
        self.commit(next)?;
        info!("Stopped monitoring '{}'", name);
        Ok(true)
    }

    /// Lowercased formal names and aliases of every monitored pen
    pub fn current_search_terms(&self, aliases: &AliasStore) -> BTreeSet<String> {
        self.names
            .iter()
            .filter_map(|name| aliases.get(name))
            .flat_map(|entry| entry.search_terms())
            .collect()
    }

    /// Write the current list to disk
    pub fn save(&self) -> Result<()> {
        flat_file::write_atomic(&self.path, HEADER, self.names.iter().cloned())
    }

    /// Discard in-memory state and re-read the monitoring file.
    ///
    /// Names without a pen in `aliases` are dropped and reported; the rest
    /// are stored under the pen's canonical formal name.
    pub fn reload(&mut self, aliases: &AliasStore) -> Result<MonitorReload> {
        let records = flat_file::read_records(&self.path)?.unwrap_or_default();
        let mut names: Vec<String> = Vec::with_capacity(records.len());
        let mut dropped = Vec::new();

        for record in records {
            match aliases.get(&record.content) {
                Some(entry) => {
                    let key = entry.key();
                    if !names.iter().any(|n| name_key(n) == key) {
                        names.push(entry.formal_name.clone());
                    }
                }
                None => {
                    warn!(
                        "Dropping monitored name '{}' (line {}): no such pen",
                        record.content, record.line_number
                    );
                    dropped.push(record.content);
                }
            }
        }

        self.names = names;
        info!(
            "Loaded {} monitored pens from {}",
            self.names.len(),
            self.path.display()
        );
        Ok(MonitorReload {
            loaded: self.names.len(),
            dropped,
        })
    }

    fn position(&self, formal_name: &str) -> Option<usize> {
        let key = name_key(formal_name);
        self.names.iter().position(|n| name_key(n) == key)
    }

    fn commit(&mut self, next: Vec<String>) -> Result<()> {
        flat_file::write_atomic(&self.path, HEADER, next.iter().cloned())?;
        self.names = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn fixture() -> (TempDir, AliasStore, MonitorList) {
        let dir = tempfile::tempdir().unwrap();
        let (mut aliases, _) = AliasStore::load(dir.path().join("pen_aliases.txt")).unwrap();
        aliases
            .add_pen(
                "Pilot Vanishing Point",
                &strings(&["vp", "pilot vp", "vanishing point"]),
            )
            .unwrap();
        aliases.add_pen("Lamy 2000", &strings(&["l2k", "lamy 2k"])).unwrap();
        aliases.add_pen("TWSBI Eco", &strings(&["eco"])).unwrap();
        aliases.add_pen("Opus 88", &[]).unwrap();

        let (list, report) = MonitorList::load(dir.path().join("monitoring.txt"), &aliases).unwrap();
        assert_eq!(report, MonitorReload::default());
        (dir, aliases, list)
    }

    #[test]
    fn test_add_resolves_fuzzy_names() {
        let (_dir, aliases, mut list) = fixture();
        let resolver = FuzzyResolver::default();

        let outcome = list
            .add(&strings(&["vanshing pont", "L2K", "vp"]), &aliases, &resolver)
            .unwrap();

        assert_eq!(outcome.added, vec!["Pilot Vanishing Point", "Lamy 2000"]);
        assert_eq!(outcome.already_present, vec!["Pilot Vanishing Point"]);
        assert!(outcome.not_found.is_empty());
        assert_eq!(list.names(), &["Pilot Vanishing Point", "Lamy 2000"]);
        assert!(list.contains("lamy 2000"));
    }

    #[test]
    fn test_add_unknown_pen_changes_nothing() {
        let (_dir, aliases, mut list) = fixture();
        let resolver = FuzzyResolver::default();

        let outcome = list
            .add(&strings(&["nonexistent pen xyz"]), &aliases, &resolver)
            .unwrap();

        assert!(outcome.added.is_empty());
        assert_eq!(outcome.not_found, vec!["nonexistent pen xyz"]);
        assert!(list.is_empty());
        // nothing added, so nothing written
        assert!(!list.path().exists());
    }

    #[test]
    fn test_remove_all_clears_list() {
        let (_dir, aliases, mut list) = fixture();
        let resolver = FuzzyResolver::default();
        list.add(&strings(&["vp", "lamy 2000", "eco"]), &aliases, &resolver)
            .unwrap();

        let outcome = list.remove(&strings(&["all"]), &aliases, &resolver).unwrap();

        assert_eq!(outcome.removed.len(), 3);
        assert!(outcome.not_found.is_empty());
        assert!(list.is_empty());
        assert!(list.current_search_terms(&aliases).is_empty());
    }

    #[test]
    fn test_remove_reports_unmonitored_as_not_found() {
        let (_dir, aliases, mut list) = fixture();
        let resolver = FuzzyResolver::default();
        list.add(&strings(&["vp", "eco"]), &aliases, &resolver).unwrap();

        let outcome = list
            .remove(&strings(&["twsbi eco", "lamy 2000", "nonexistent pen xyz"]), &aliases, &resolver)
            .unwrap();

        assert_eq!(outcome.removed, vec!["TWSBI Eco"]);
        assert_eq!(outcome.not_found, vec!["lamy 2000", "nonexistent pen xyz"]);
        assert_eq!(list.names(), &["Pilot Vanishing Point"]);
    }

    #[test]
    fn test_search_terms_follow_alias_changes() {
        let (_dir, mut aliases, mut list) = fixture();
        let resolver = FuzzyResolver::default();
        list.add(&strings(&["lamy 2000"]), &aliases, &resolver).unwrap();

        let terms = list.current_search_terms(&aliases);
        assert_eq!(
            terms.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["l2k", "lamy 2000", "lamy 2k"]
        );
        assert!(!terms.contains("vp"));

        aliases
            .add_aliases("Lamy 2000", &strings(&["Lamy Two Thousand"]))
            .unwrap();
        assert!(list.current_search_terms(&aliases).contains("lamy two thousand"));
    }

    #[test]
    fn test_reload_drops_unknown_names() {
        let (dir, aliases, mut list) = fixture();
        std::fs::write(
            dir.path().join("monitoring.txt"),
            "# watched\nlamy 2000\nDiscontinued Pen\n\nTWSBI Eco\nLAMY 2000\n",
        )
        .unwrap();

        let report = list.reload(&aliases).unwrap();

        assert_eq!(report.loaded, 2);
        assert_eq!(report.dropped, vec!["Discontinued Pen"]);
        assert_eq!(list.names(), &["Lamy 2000", "TWSBI Eco"]);
    }

    #[test]
    fn test_persisted_list_survives_restart() {
        let (dir, aliases, mut list) = fixture();
        let resolver = FuzzyResolver::default();
        list.add(&strings(&["eco", "opus 88"]), &aliases, &resolver).unwrap();
        list.remove_exact("twsbi eco").unwrap();

        let (reloaded, _) = MonitorList::load(dir.path().join("monitoring.txt"), &aliases).unwrap();
        assert_eq!(reloaded.names(), &["Opus 88"]);
    }

    #[test]
    fn test_failed_write_keeps_list() {
        let dir = tempfile::tempdir().unwrap();
        let (mut aliases, _) = AliasStore::load(dir.path().join("pen_aliases.txt")).unwrap();
        aliases.add_pen("TWSBI Eco", &[]).unwrap();

        let data_dir = dir.path().join("data");
        let (mut list, _) = MonitorList::load(data_dir.join("monitoring.txt"), &aliases).unwrap();
        // a plain file where the data directory should be
        std::fs::write(&data_dir, "not a directory").unwrap();

        let err = list
            .add(&strings(&["twsbi eco"]), &aliases, &FuzzyResolver::default())
            .unwrap_err();
        assert!(matches!(err, AppError::PersistenceWriteFailed { .. }));
        assert!(list.is_empty());
    }
}
