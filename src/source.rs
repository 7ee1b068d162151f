//! Snapshot source.
//!
//! A snapshot is a JSON export of work items and the metadata the engine
//! consults. It stands in for the tracking-system fetch: a missing or broken
//! snapshot is reported here and never reaches the roadmap engine.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use crate::models::{
    BacklogLevel, Iterations, Metadata, WorkItem, WorkItemTypes, sort_backlog_levels,
};
use crate::roadmap::top_level_area_path;
use crate::{Error, Result};

/// Work items and metadata exported from the tracking system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Exported work items
    #[serde(default)]
    pub items: Vec<WorkItem>,

    /// Type name to state categories and color
    #[serde(default)]
    pub work_item_types: WorkItemTypes,

    /// Iteration path to dates
    #[serde(default)]
    pub iterations: Iterations,

    /// Backlog levels in any order
    #[serde(default)]
    pub backlog_levels: Vec<BacklogLevel>,

    /// Raw classification area paths (e.g. `\Proj\Area\Team`)
    #[serde(default)]
    pub area_paths: Vec<String>,
}

/// A selectable area path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaPathOption {
    /// Last segment of the path
    pub name: String,
    /// Path as matched against work items (e.g. `Proj\Team`)
    pub path: String,
}

impl AreaPathOption {
    fn from_path(path: String) -> Self {
        let name = path.rsplit('\\').next().unwrap_or(&path).to_string();
        Self { name, path }
    }
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::FetchFailed(format!("Failed to read snapshot {}: {}", path.display(), e))
        })?;
        let snapshot = Self::from_json(&content).map_err(|e| {
            Error::FetchFailed(format!("Failed to parse snapshot {}: {}", path.display(), e))
        })?;
        debug!(
            path = %path.display(),
            items = snapshot.items.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Metadata lookups for the engine.
    pub fn metadata(&self) -> Metadata {
        Metadata::new(self.work_item_types.clone(), self.iterations.clone())
    }

    /// Drop items that last changed before `date`.
    ///
    /// Items without a changed date are kept.
    pub fn filter_changed_since(&mut self, date: NaiveDate) {
        let cutoff = date.and_time(NaiveTime::MIN).and_utc();
        let before = self.items.len();
        self.items
            .retain(|item| item.changed_date.is_none_or(|changed| changed >= cutoff));
        debug!(
            since = %date,
            dropped = before - self.items.len(),
            "applied changed-since filter"
        );
    }

    /// Backlog levels, highest rank first.
    pub fn backlog_levels(&self) -> Vec<BacklogLevel> {
        let mut levels = self.backlog_levels.clone();
        sort_backlog_levels(&mut levels);
        levels
    }

    /// Work item types belonging to the named backlog levels.
    ///
    /// Level names match case-insensitively. Unknown names are an error.
    pub fn types_for_levels(&self, names: &[String]) -> Result<Vec<String>> {
        let mut types = Vec::new();
        for name in names {
            let level = self
                .backlog_levels
                .iter()
                .find(|l| l.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::NotFound(format!("Backlog level not found: {}", name)))?;
            for ty in &level.work_item_types {
                if !types.contains(ty) {
                    types.push(ty.clone());
                }
            }
        }
        Ok(types)
    }

    /// Area path options for the area filter.
    ///
    /// Listed classification paths are cleaned; without any, the items'
    /// top-level area paths are offered instead.
    pub fn area_path_options(&self) -> Vec<AreaPathOption> {
        let paths: BTreeSet<String> = if self.area_paths.is_empty() {
            self.items
                .iter()
                .filter(|item| !item.area_path.is_empty())
                .map(|item| top_level_area_path(&item.area_path))
                .collect()
        } else {
            self.area_paths
                .iter()
                .map(|p| clean_area_path(p))
                .filter(|p| !p.is_empty())
                .collect()
        };
        paths.into_iter().map(AreaPathOption::from_path).collect()
    }
}

/// Turn a classification path (`\Proj\Area\Team`) into the form work items
/// carry (`Proj\Team`).
pub fn clean_area_path(path: &str) -> String {
    let cleaned = path.replacen("\\Area\\", "\\", 1);
    cleaned.strip_prefix('\\').unwrap_or(&cleaned).to_string()
}
