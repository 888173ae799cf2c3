//! 服务模块

pub mod alias_store;
pub mod catalog;
pub mod match_engine;
pub mod monitor_list;
pub mod poller;
pub mod resolver;

pub use alias_store::{AliasStore, AliasesAdded, AliasesRemoved, ReloadReport, SkippedLine};
pub use catalog::{OpenReport, Pagination, PenAdded, PenCatalog, PenPage, RemovedPen};
pub use match_engine::MatchEngine;
pub use monitor_list::{MonitorAdd, MonitorList, MonitorReload, MonitorRemove};
pub use poller::{CycleReport, ForcedMatch, Poller};
pub use resolver::{Candidate, FuzzyResolver, ScoredMatch};
