//! Alias Store
//!
//! Owns the pen dictionary: formal names and their alias sets, persisted
//! to a flat, human-editable file. Lookups go through two indices over one
//! entry list:
//! - formal name (case-insensitive) -> position in the entry list
//! - alias -> formal names owning it (aliases may be shared between pens)
//!
//! Mutations are staged on a copy of the index, the copy is written to
//! disk, and only then swapped in. A failed write leaves the in-memory
//! state untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::pen::{PenEntry, alias_key, name_key, normalize_alias};
use crate::services::resolver::Candidate;
use crate::storage::flat_file::{self, Record};

const HEADER: &[&str] = &[
    "penwatch pen aliases",
    "Formal Name | alias one, alias two, ...",
];

/// A persisted line that could not be loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedLine {
    pub line: usize,
    pub reason: String,
}

/// Outcome of (re)loading a flat file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReloadReport {
    /// Entries now in memory
    pub loaded: usize,
    /// Lines skipped as corrupt
    pub skipped: Vec<SkippedLine>,
}

/// Result of adding aliases to a pen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasesAdded {
    pub formal_name: String,
    pub added: Vec<String>,
    pub already_present: Vec<String>,
    /// Full alias set after the change
    pub aliases: Vec<String>,
}

/// Result of removing aliases from a pen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasesRemoved {
    pub formal_name: String,
    pub removed: Vec<String>,
    pub not_found: Vec<String>,
    /// Full alias set after the change
    pub aliases: Vec<String>,
}

/// An entry taken out of the store, remembering where it was
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedEntry {
    pub entry: PenEntry,
    position: usize,
}

#[derive(Debug, Clone, Default)]
struct AliasIndex {
    entries: Vec<PenEntry>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, Vec<String>>,
}

impl AliasIndex {
    fn parse(records: Vec<Record>) -> (Self, Vec<SkippedLine>) {
        let mut index = Self::default();
        let mut skipped = Vec::new();

        for record in records {
            let line = record.line_number;
            match PenEntry::parse_line(line, &record.content) {
                Ok(entry) => {
                    if let Err(e) = index.push(entry) {
                        skipped.push(SkippedLine {
                            line,
                            reason: e.to_string(),
                        });
                    }
                }
                Err(AppError::CorruptStore { line, reason }) => {
                    skipped.push(SkippedLine { line, reason });
                }
                Err(e) => skipped.push(SkippedLine {
                    line,
                    reason: e.to_string(),
                }),
            }
        }

        (index, skipped)
    }

    fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(PenEntry::to_line)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name_key(name)).copied()
    }

    fn push(&mut self, entry: PenEntry) -> Result<()> {
        self.insert(self.entries.len(), entry)
    }

    fn insert(&mut self, position: usize, entry: PenEntry) -> Result<()> {
        if self.by_name.contains_key(&entry.key()) {
            return Err(AppError::DuplicateName(entry.formal_name));
        }
        for alias in &entry.aliases {
            self.link_alias(alias, &entry.formal_name);
        }
        self.entries.insert(position, entry);
        self.reindex_from(position);
        Ok(())
    }

    fn remove(&mut self, position: usize) -> PenEntry {
        let entry = self.entries.remove(position);
        self.by_name.remove(&entry.key());
        for alias in &entry.aliases {
            self.unlink_alias(alias, &entry.formal_name);
        }
        self.reindex_from(position);
        entry
    }

    fn add_alias(&mut self, position: usize, alias: String) {
        let formal_name = self.entries[position].formal_name.clone();
        self.link_alias(&alias, &formal_name);
        self.entries[position].aliases.push(alias);
    }

    fn remove_alias(&mut self, position: usize, alias: &str) -> bool {
        let entry = &mut self.entries[position];
        let Some(i) = entry.aliases.iter().position(|a| a == alias) else {
            return false;
        };
        entry.aliases.remove(i);
        let formal_name = entry.formal_name.clone();
        self.unlink_alias(alias, &formal_name);
        true
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, entry) in self.entries.iter().enumerate().skip(start) {
            self.by_name.insert(entry.key(), i);
        }
    }

    fn link_alias(&mut self, alias: &str, formal_name: &str) {
        self.by_alias
            .entry(alias.to_string())
            .or_default()
            .push(formal_name.to_string());
    }

    fn unlink_alias(&mut self, alias: &str, formal_name: &str) {
        if let Some(owners) = self.by_alias.get_mut(alias) {
            owners.retain(|owner| owner != formal_name);
            if owners.is_empty() {
                self.by_alias.remove(alias);
            }
        }
    }
}

/// The pen dictionary and its backing file
#[derive(Debug)]
pub struct AliasStore {
    path: PathBuf,
    index: AliasIndex,
}

impl AliasStore {
    /// Load the store from `path`; a missing file yields an empty store
    pub fn load(path: impl Into<PathBuf>) -> Result<(Self, ReloadReport)> {
        let mut store = Self {
            path: path.into(),
            index: AliasIndex::default(),
        };
        let report = store.reload()?;
        Ok((store, report))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.index.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.entries.is_empty()
    }

    /// Exact, case-insensitive lookup by formal name
    pub fn get(&self, formal_name: &str) -> Option<&PenEntry> {
        self.index
            .position(formal_name)
            .map(|i| &self.index.entries[i])
    }

    /// Formal names of every pen carrying `alias`
    pub fn owners_of(&self, alias: &str) -> &[String] {
        self.index
            .by_alias
            .get(&alias_key(alias))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Formal names and aliases, flattened in store order, for the resolver
    pub fn candidates(&self) -> impl Iterator<Item = Candidate<'_>> + '_ {
        self.index.entries.iter().flat_map(|entry| {
            let owner = entry.formal_name.as_str();
            std::iter::once(Candidate {
                text: owner,
                owner,
                is_formal: true,
            })
            .chain(entry.aliases.iter().map(move |alias| Candidate {
                text: alias.as_str(),
                owner,
                is_formal: false,
            }))
        })
    }

    /// `(formal_name, aliases)` pairs in insertion order.
    ///
    /// The iterator is lazy and `Clone`, so a paginating caller can restart it.
    pub fn list_all(&self) -> impl Iterator<Item = (&str, &[String])> + Clone + '_ {
        self.index
            .entries
            .iter()
            .map(|entry| (entry.formal_name.as_str(), entry.aliases.as_slice()))
    }

    /// Add a pen; returns the new entry count
    pub fn add_pen(&mut self, formal_name: &str, aliases: &[String]) -> Result<usize> {
        let entry = PenEntry::new(formal_name, aliases)?;
        let mut next = self.index.clone();
        next.push(entry.clone())?;
        self.commit(next)?;

        info!(
            "Added pen '{}' with aliases [{}]",
            entry.formal_name,
            entry.aliases.join(", ")
        );
        Ok(self.len())
    }

    /// Add every entry whose formal name is not taken yet; returns how many were added
    pub fn seed(&mut self, entries: Vec<PenEntry>) -> Result<usize> {
        let mut next = self.index.clone();
        let mut added = 0;
        for entry in entries {
            match next.push(entry) {
                Ok(()) => added += 1,
                Err(e) => warn!("Skipping seed entry: {}", e),
            }
        }
        self.commit(next)?;
        Ok(added)
    }

    /// Remove the pen with exactly this formal name (case-insensitive)
    pub fn remove_pen(&mut self, formal_name: &str) -> Result<RemovedEntry> {
        let position = self.position_of(formal_name)?;
        let mut next = self.index.clone();
        let entry = next.remove(position);
        self.commit(next)?;

        info!("Removed pen '{}'", entry.formal_name);
        Ok(RemovedEntry { entry, position })
    }

    /// Put a removed entry back where it was
    pub fn restore(&mut self, removed: RemovedEntry) -> Result<()> {
        let mut next = self.index.clone();
        let position = removed.position.min(next.entries.len());
        next.insert(position, removed.entry)?;
        self.commit(next)
    }

    /// Add aliases to a pen, skipping ones it already has
    pub fn add_aliases(&mut self, formal_name: &str, new_aliases: &[String]) -> Result<AliasesAdded> {
        let position = self.position_of(formal_name)?;
        let mut next = self.index.clone();
        let mut added = Vec::new();
        let mut already_present = Vec::new();

        for raw in new_aliases {
            let alias = normalize_alias(raw)?;
            if alias.is_empty() || added.contains(&alias) {
                continue;
            }
            if next.entries[position].has_alias(&alias) {
                if !already_present.contains(&alias) {
                    already_present.push(alias);
                }
            } else {
                next.add_alias(position, alias.clone());
                added.push(alias);
            }
        }

        if !added.is_empty() {
            self.commit(next)?;
            info!(
                "Added aliases [{}] to '{}'",
                added.join(", "),
                self.index.entries[position].formal_name
            );
        }

        let entry = &self.index.entries[position];
        Ok(AliasesAdded {
            formal_name: entry.formal_name.clone(),
            added,
            already_present,
            aliases: entry.aliases.clone(),
        })
    }

    /// Remove aliases from a pen.
    ///
    /// Fails with `EmptyAliasSet`, changing nothing, if no alias would remain.
    pub fn remove_aliases(&mut self, formal_name: &str, to_remove: &[String]) -> Result<AliasesRemoved> {
        let position = self.position_of(formal_name)?;
        let mut next = self.index.clone();
        let mut removed = Vec::new();
        let mut not_found = Vec::new();

        for raw in to_remove {
            let alias = alias_key(raw);
            if alias.is_empty() {
                continue;
            }
            if next.remove_alias(position, &alias) {
                removed.push(alias);
            } else {
                not_found.push(raw.trim().to_string());
            }
        }

        if next.entries[position].aliases.is_empty() {
            return Err(AppError::EmptyAliasSet(
                next.entries[position].formal_name.clone(),
            ));
        }

        if !removed.is_empty() {
            self.commit(next)?;
            info!(
                "Removed aliases [{}] from '{}'",
                removed.join(", "),
                self.index.entries[position].formal_name
            );
        }

        let entry = &self.index.entries[position];
        Ok(AliasesRemoved {
            formal_name: entry.formal_name.clone(),
            removed,
            not_found,
            aliases: entry.aliases.clone(),
        })
    }

    /// Write the current state to disk
    pub fn save(&self) -> Result<()> {
        flat_file::write_atomic(&self.path, HEADER, self.index.lines())
    }

    /// Discard in-memory state and re-parse the backing file.
    ///
    /// Corrupt lines are skipped and reported rather than failing the reload.
    pub fn reload(&mut self) -> Result<ReloadReport> {
        let (index, skipped) = match flat_file::read_records(&self.path)? {
            Some(records) => AliasIndex::parse(records),
            None => (AliasIndex::default(), Vec::new()),
        };

        for line in &skipped {
            warn!(
                "Skipping alias file {} line {}: {}",
                self.path.display(),
                line.line,
                line.reason
            );
        }

        self.index = index;
        info!("Loaded {} pens from {}", self.len(), self.path.display());
        Ok(ReloadReport {
            loaded: self.len(),
            skipped,
        })
    }

    fn position_of(&self, formal_name: &str) -> Result<usize> {
        self.index
            .position(formal_name)
            .ok_or_else(|| AppError::NotFound(formal_name.to_string()))
    }

    fn commit(&mut self, next: AliasIndex) -> Result<()> {
        flat_file::write_atomic(&self.path, HEADER, next.lines())?;
        self.index = next;
        Ok(())
    }
}
