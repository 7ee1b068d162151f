//! Data models for roadmap entities.
//!
//! This module defines the core data structures:
//! - `WorkItem` - A node of the roadmap (epic, feature, item, task) with schedule fields
//! - `WorkItemType` - Per-type state categories and display color
//! - `Iteration` - Sprint/time-box dates used as a schedule fallback
//! - `BacklogLevel` - Ranked grouping of work item types
//! - `DisplayInterval` - Time scale a Gantt chart is drawn at
//!
//! The arena tree that holds work items lives in [`tree`].

pub mod tree;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Identifier of a work item in the tracking system.
pub type WorkItemId = u64;

/// A work item as exported from the tracking system, plus the fields derived
/// by the roadmap engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique identifier
    pub id: WorkItemId,

    /// Parent work item (`None` or `0` means top of the hierarchy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<WorkItemId>,

    /// Work item title
    pub title: String,

    /// Work item category (Epic, Feature, Product Backlog Item, Task, ...)
    #[serde(rename = "type")]
    pub work_item_type: String,

    /// Workflow state (New, Active, Done, ...)
    #[serde(default)]
    pub state: String,

    /// Area path, backslash-delimited (e.g. `Project\Area\Sub`)
    #[serde(default)]
    pub area_path: String,

    /// Iteration path, used to look up fallback dates
    #[serde(default)]
    pub iteration_path: String,

    /// Tags for categorization
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Start date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,

    /// Target (end) date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,

    /// Completion percentage (0-100)
    #[serde(default)]
    pub progress: f64,

    /// Work items that must finish before this one starts
    #[serde(default)]
    pub predecessors: Vec<WorkItemId>,

    /// Last time the item changed in the tracking system
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_date: Option<DateTime<Utc>>,

    /// Hidden by the current filter
    #[serde(default)]
    pub hide: bool,

    /// Has no parent in the tree
    #[serde(default)]
    pub top: bool,

    /// `start` was derived from children or the iteration
    #[serde(default)]
    pub calculated_start: bool,

    /// `end` was derived from children or the iteration
    #[serde(default)]
    pub calculated_end: bool,

    /// Top-most resolvable ancestor id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl WorkItem {
    /// Create a new work item with the given ID, type and title.
    pub fn new(id: WorkItemId, work_item_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            parent: None,
            title: title.into(),
            work_item_type: work_item_type.into(),
            state: String::new(),
            area_path: String::new(),
            iteration_path: String::new(),
            tags: BTreeSet::new(),
            description: None,
            start: None,
            end: None,
            progress: 0.0,
            predecessors: Vec::new(),
            changed_date: None,
            hide: false,
            top: false,
            calculated_start: false,
            calculated_end: false,
            project: None,
        }
    }

    /// Parent id, treating `0` as "no parent".
    pub fn parent_id(&self) -> Option<WorkItemId> {
        self.parent.filter(|&p| p != 0)
    }

    /// Start date as supplied by the tracking system, ignoring derived values.
    pub fn authoritative_start(&self) -> Option<NaiveDate> {
        if self.calculated_start { None } else { self.start }
    }

    /// End date as supplied by the tracking system, ignoring derived values.
    pub fn authoritative_end(&self) -> Option<NaiveDate> {
        if self.calculated_end { None } else { self.end }
    }

    /// Builder-style parent setter.
    pub fn with_parent(mut self, parent: WorkItemId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builder-style state setter.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Builder-style area path setter.
    pub fn with_area_path(mut self, area_path: impl Into<String>) -> Self {
        self.area_path = area_path.into();
        self
    }

    /// Builder-style iteration path setter.
    pub fn with_iteration_path(mut self, iteration_path: impl Into<String>) -> Self {
        self.iteration_path = iteration_path.into();
        self
    }

    /// Builder-style tag setter.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style date setter.
    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Builder-style predecessor setter.
    pub fn with_predecessors(mut self, predecessors: Vec<WorkItemId>) -> Self {
        self.predecessors = predecessors;
        self
    }
}

/// State categories and display color of a work item type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemType {
    /// States in the "completed" category
    #[serde(default)]
    pub completed_states: BTreeSet<String>,

    /// States in the "removed" category
    #[serde(default)]
    pub removed_states: BTreeSet<String>,

    /// States in the "in progress" category
    #[serde(default)]
    pub in_progress_states: BTreeSet<String>,

    /// Hex color (e.g. "#773B93") used for the progress bar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl WorkItemType {
    /// True when `state` counts as finished work (completed or removed).
    pub fn is_closed(&self, state: &str) -> bool {
        self.completed_states.contains(state) || self.removed_states.contains(state)
    }

    /// True when `state` is neither completed nor in progress, i.e. the
    /// schedule shown for the item is only an estimate.
    pub fn is_estimated(&self, state: &str) -> bool {
        !self.completed_states.contains(state) && !self.in_progress_states.contains(state)
    }
}

/// Work item type metadata keyed by type name.
pub type WorkItemTypes = HashMap<String, WorkItemType>;

/// Dates of an iteration (sprint).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iteration {
    /// First day of the iteration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    /// Last day of the iteration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<NaiveDate>,
}

/// Iteration metadata keyed by iteration path.
pub type Iterations = HashMap<String, Iteration>;

/// Metadata lookups the aggregator and the Gantt adapter consult.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// Type name to state categories
    pub work_item_types: WorkItemTypes,
    /// Iteration path to dates
    pub iterations: Iterations,
}

impl Metadata {
    /// Create metadata from type and iteration lookups.
    pub fn new(work_item_types: WorkItemTypes, iterations: Iterations) -> Self {
        Self {
            work_item_types,
            iterations,
        }
    }
}

/// A backlog level; higher ranks sit above lower ranks in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogLevel {
    /// Display name of the level (e.g. "Epics")
    pub name: String,

    /// Rank within the hierarchy
    #[serde(default)]
    pub rank: i32,

    /// Work item types that belong to this level
    #[serde(default)]
    pub work_item_types: Vec<String>,
}

/// Sort backlog levels so the highest rank comes first.
pub fn sort_backlog_levels(levels: &mut [BacklogLevel]) {
    levels.sort_by(|a, b| b.rank.cmp(&a.rank));
}

/// Time scale the Gantt chart is drawn at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayInterval {
    /// Day intervals
    Day,
    /// Week intervals starting on Monday
    Week,
    /// Two week intervals starting on Monday
    #[serde(rename = "Bi-Weekly")]
    BiWeekly,
    /// Sprint durations
    Sprint,
    /// Months
    #[default]
    Month,
    /// Fiscal quarters
    Quarter,
    /// Years
    Year,
}

impl DisplayInterval {
    /// All intervals in display order.
    pub const ALL: [DisplayInterval; 7] = [
        DisplayInterval::Day,
        DisplayInterval::Week,
        DisplayInterval::BiWeekly,
        DisplayInterval::Sprint,
        DisplayInterval::Month,
        DisplayInterval::Quarter,
        DisplayInterval::Year,
    ];

    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "day" => Some(DisplayInterval::Day),
            "week" => Some(DisplayInterval::Week),
            "bi-weekly" | "biweekly" => Some(DisplayInterval::BiWeekly),
            "sprint" => Some(DisplayInterval::Sprint),
            "month" => Some(DisplayInterval::Month),
            "quarter" => Some(DisplayInterval::Quarter),
            "year" => Some(DisplayInterval::Year),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayInterval::Day => "Day",
            DisplayInterval::Week => "Week",
            DisplayInterval::BiWeekly => "Bi-Weekly",
            DisplayInterval::Sprint => "Sprint",
            DisplayInterval::Month => "Month",
            DisplayInterval::Quarter => "Quarter",
            DisplayInterval::Year => "Year",
        }
    }
}

impl fmt::Display for DisplayInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
