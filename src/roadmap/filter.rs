//! Filtered projection of the flattened roadmap.
//!
//! Given the preorder list produced by the orderer and a set of
//! [`FilterCriteria`], the projector decides which work items are visible,
//! re-attaches every visible item to its nearest visible ancestor, and keeps
//! only the dependency links whose two ends are both visible. The result is
//! always a connected hierarchy: a task's parent, if set, is another task of
//! the same projection.
//!
//! # Visibility
//!
//! All active dimensions combine with AND; an empty set (or `None`) leaves a
//! dimension unrestricted.
//!
//! - **Area path**: the item's top-level area path must be selected.
//! - **Type**: the item's type must be selected.
//! - **Keyword**: the title must contain the keyword, ignoring case.
//! - **Tags**: `any`/`all` test every item's own tags. `any-top`/`all-top`
//!   test only top-level items; descendants follow their parent. Because the
//!   list is in preorder, a single left-to-right pass propagates the decision
//!   to any depth.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gantt::GanttLink;
use crate::models::{WorkItem, WorkItemId};

/// How a tag filter matches work items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagMode {
    /// Item has at least one selected tag
    #[default]
    Any,
    /// Item has every selected tag
    All,
    /// Top-level item has at least one selected tag; descendants inherit
    AnyTop,
    /// Top-level item has every selected tag; descendants inherit
    AllTop,
}

impl TagMode {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "any" => Some(TagMode::Any),
            "all" => Some(TagMode::All),
            "any-top" => Some(TagMode::AnyTop),
            "all-top" => Some(TagMode::AllTop),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagMode::Any => "any",
            TagMode::All => "all",
            TagMode::AnyTop => "any-top",
            TagMode::AllTop => "all-top",
        }
    }

    fn top_only(&self) -> bool {
        matches!(self, TagMode::AnyTop | TagMode::AllTop)
    }
}

impl fmt::Display for TagMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Selected tags and how they match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    /// Selected tags
    pub values: BTreeSet<String>,
    /// Matching rule
    pub mode: TagMode,
}

impl TagFilter {
    /// Create a tag filter.
    pub fn new<I, S>(values: I, mode: TagMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    fn matches(&self, tags: &BTreeSet<String>) -> bool {
        match self.mode {
            TagMode::Any | TagMode::AnyTop => self.values.iter().any(|t| tags.contains(t)),
            TagMode::All | TagMode::AllTop => self.values.is_subset(tags),
        }
    }
}

/// Filter selections applied to the roadmap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Selected top-level area paths
    #[serde(default)]
    pub area_paths: BTreeSet<String>,

    /// Selected work item types
    #[serde(default)]
    pub work_item_types: BTreeSet<String>,

    /// Title keyword
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    /// Tag selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagFilter>,
}

impl FilterCriteria {
    /// Criteria that show everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style area path selection.
    pub fn with_area_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.area_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style type selection.
    pub fn with_work_item_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.work_item_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style keyword.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Builder-style tag selection.
    pub fn with_tags(mut self, tags: TagFilter) -> Self {
        self.tags = Some(tags);
        self
    }

    /// True when no dimension restricts anything.
    pub fn is_unrestricted(&self) -> bool {
        self.area_paths.is_empty()
            && self.work_item_types.is_empty()
            && self.keyword_lower().is_none()
            && self.active_tags().is_none()
    }

    fn keyword_lower(&self) -> Option<String> {
        self.keyword
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(str::to_lowercase)
    }

    fn active_tags(&self) -> Option<&TagFilter> {
        self.tags.as_ref().filter(|t| !t.values.is_empty())
    }
}

/// Top-level area path: the first two backslash-delimited segments.
///
/// `Proj\AreaA\Sub` becomes `Proj\AreaA`; a path with one or two segments is
/// returned unchanged.
pub fn top_level_area_path(area_path: &str) -> String {
    match area_path.match_indices('\\').nth(1) {
        Some((index, _)) => area_path[..index].to_string(),
        None => area_path.to_string(),
    }
}

/// Ids of the work items the criteria hide.
///
/// `items` must be in preorder (parents before children) for the
/// `any-top`/`all-top` tag modes to propagate.
pub fn hidden_ids(items: &[WorkItem], criteria: &FilterCriteria) -> HashSet<WorkItemId> {
    let mut hidden = HashSet::new();
    if criteria.is_unrestricted() {
        return hidden;
    }

    let keyword = criteria.keyword_lower();
    let tags = criteria.active_tags();
    let mut visible_by_tag: HashSet<WorkItemId> = HashSet::new();

    for item in items {
        let mut hide = false;

        if !criteria.area_paths.is_empty()
            && !criteria
                .area_paths
                .contains(&top_level_area_path(&item.area_path))
        {
            hide = true;
        }

        if !criteria.work_item_types.is_empty()
            && !criteria.work_item_types.contains(&item.work_item_type)
        {
            hide = true;
        }

        if let Some(ref keyword) = keyword {
            if !item.title.to_lowercase().contains(keyword.as_str()) {
                hide = true;
            }
        }

        if let Some(tags) = tags {
            let tag_visible = if tags.mode.top_only() && !item.top {
                item.parent_id()
                    .is_some_and(|parent| visible_by_tag.contains(&parent))
            } else {
                tags.matches(&item.tags)
            };

            if tag_visible {
                visible_by_tag.insert(item.id);
            } else {
                hide = true;
            }
        }

        if hide {
            hidden.insert(item.id);
        }
    }

    debug!(total = items.len(), hidden = hidden.len(), "evaluated roadmap filter");
    hidden
}

/// Set the `hide` flag on every item according to the criteria.
pub fn apply_visibility(items: &mut [WorkItem], criteria: &FilterCriteria) {
    let hidden = hidden_ids(items, criteria);
    for item in items.iter_mut() {
        item.hide = hidden.contains(&item.id);
    }
}

/// A filtered, still-connected view of the roadmap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Visible work items in display order; `parent` is the nearest visible ancestor
    pub tasks: Vec<WorkItem>,
    /// Dependency links between visible work items
    pub links: Vec<GanttLink>,
}

impl Projection {
    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Project the preorder list through the criteria.
pub fn project(items: &[WorkItem], criteria: &FilterCriteria) -> Projection {
    let hidden = hidden_ids(items, criteria);

    // A top-level item has no parent in the tree, whatever its payload says.
    let parents: HashMap<WorkItemId, Option<WorkItemId>> = items
        .iter()
        .map(|i| (i.id, if i.top { None } else { i.parent_id() }))
        .collect();
    let visible: HashSet<WorkItemId> = items
        .iter()
        .map(|i| i.id)
        .filter(|id| !hidden.contains(id))
        .collect();

    let tasks: Vec<WorkItem> = items
        .iter()
        .filter(|i| visible.contains(&i.id))
        .map(|i| {
            let mut task = i.clone();
            task.hide = false;
            task.parent = nearest_visible(parents.get(&i.id).copied().flatten(), &parents, &visible);
            task
        })
        .collect();

    let links = links_between(&tasks, &visible);
    Projection { tasks, links }
}

/// Walk up from `start` until a visible id is found.
fn nearest_visible(
    start: Option<WorkItemId>,
    parents: &HashMap<WorkItemId, Option<WorkItemId>>,
    visible: &HashSet<WorkItemId>,
) -> Option<WorkItemId> {
    let mut seen = HashSet::new();
    let mut current = start;
    while let Some(id) = current {
        if visible.contains(&id) {
            return Some(id);
        }
        if !seen.insert(id) {
            break;
        }
        current = parents.get(&id).copied().flatten();
    }
    None
}

/// Finish-to-start links from predecessors, restricted to visible ids.
fn links_between(tasks: &[WorkItem], visible: &HashSet<WorkItemId>) -> Vec<GanttLink> {
    let mut seen: HashSet<(WorkItemId, WorkItemId)> = HashSet::new();
    let mut links = Vec::new();

    for task in tasks {
        for &source in &task.predecessors {
            if source == task.id || !visible.contains(&source) {
                continue;
            }
            if seen.insert((source, task.id)) {
                links.push(GanttLink::finish_to_start(source, task.id));
            }
        }
    }

    links
}
