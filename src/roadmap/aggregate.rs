//! Bottom-up rollup of schedule dates and completion.
//!
//! The walk is a genuine postorder over the tree, so every child's final
//! values are known before its parent is computed:
//!
//! - **Leaf**: progress is 100 when the state is a completed or removed state
//!   of the item's type, otherwise 0.
//! - **Internal node**: progress is the mean of the direct children's progress
//!   (a child without data counts as 0); start is the earliest child start and
//!   end the latest child end, adopted only when the node has no date of its own.
//! - **Fallback**: a node still missing a date takes it from its iteration.
//!
//! [`rollup`] is pure and returns the derived values keyed by id;
//! [`RoadmapTree::apply_rollups`] writes them back.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::order::postorder_ids;
use crate::models::tree::RoadmapTree;
use crate::models::{Metadata, WorkItem, WorkItemId};

/// Derived schedule and completion of a single work item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rollup {
    /// Start date after rollup and fallback
    pub start: Option<NaiveDate>,
    /// End date after rollup and fallback
    pub end: Option<NaiveDate>,
    /// Completion percentage (0-100)
    pub progress: f64,
    /// `start` was derived rather than supplied
    pub calculated_start: bool,
    /// `end` was derived rather than supplied
    pub calculated_end: bool,
}

impl Rollup {
    /// Copy the derived values onto `item`.
    pub fn apply_to(&self, item: &mut WorkItem) {
        item.start = self.start;
        item.end = self.end;
        item.progress = self.progress;
        item.calculated_start = self.calculated_start;
        item.calculated_end = self.calculated_end;
    }
}

/// Compute the rollup of every node in the tree.
///
/// Nodes without data are skipped; they still count towards their parent's
/// number of children.
pub fn rollup(tree: &RoadmapTree, metadata: &Metadata) -> HashMap<WorkItemId, Rollup> {
    let mut result: HashMap<WorkItemId, Rollup> = HashMap::with_capacity(tree.len());

    for id in postorder_ids(tree) {
        let Some(node) = tree.get(id) else {
            debug!(id, "node missing from tree index, skipping");
            continue;
        };
        let Some(item) = node.data.as_ref() else {
            debug!(id, "node has no work item data, skipping");
            continue;
        };

        let mut start = item.authoritative_start();
        let mut end = item.authoritative_end();
        let mut calculated_start = false;
        let mut calculated_end = false;

        let progress = if node.is_leaf() {
            leaf_progress(item, metadata)
        } else {
            let mut sum = 0.0;
            let mut child_start: Option<NaiveDate> = None;
            let mut child_end: Option<NaiveDate> = None;

            for child in &node.children {
                let Some(child) = result.get(child) else {
                    continue;
                };
                sum += child.progress;
                if let Some(s) = child.start {
                    child_start = Some(child_start.map_or(s, |cur| cur.min(s)));
                }
                if let Some(e) = child.end {
                    child_end = Some(child_end.map_or(e, |cur| cur.max(e)));
                }
            }

            if start.is_none() && child_start.is_some() {
                start = child_start;
                calculated_start = true;
            }
            if end.is_none() && child_end.is_some() {
                end = child_end;
                calculated_end = true;
            }

            sum / node.total_children() as f64
        };

        if start.is_none() || end.is_none() {
            if let Some(iteration) = metadata.iterations.get(&item.iteration_path) {
                if start.is_none() && iteration.start_date.is_some() {
                    start = iteration.start_date;
                    calculated_start = true;
                }
                if end.is_none() && iteration.finish_date.is_some() {
                    end = iteration.finish_date;
                    calculated_end = true;
                }
            }
        }

        result.insert(
            id,
            Rollup {
                start,
                end,
                progress: progress.clamp(0.0, 100.0),
                calculated_start,
                calculated_end,
            },
        );
    }

    result
}

/// Aggregate the tree and return the updated work items in postorder.
///
/// The tree itself is left untouched; see [`RoadmapTree::apply_rollups`].
pub fn aggregate(tree: &RoadmapTree, metadata: &Metadata) -> Vec<WorkItem> {
    let rollups = rollup(tree, metadata);
    postorder_ids(tree)
        .into_iter()
        .filter_map(|id| {
            let mut item = tree.item(id)?.clone();
            if let Some(r) = rollups.get(&id) {
                r.apply_to(&mut item);
            }
            Some(item)
        })
        .collect()
}

fn leaf_progress(item: &WorkItem, metadata: &Metadata) -> f64 {
    match metadata.work_item_types.get(&item.work_item_type) {
        Some(ty) if ty.is_closed(&item.state) => 100.0,
        _ => 0.0,
    }
}

impl RoadmapTree {
    /// Write rollup results onto the matching nodes.
    pub fn apply_rollups(&mut self, rollups: &HashMap<WorkItemId, Rollup>) {
        for (&id, r) in rollups {
            if let Some(item) = self.item_mut(id) {
                r.apply_to(item);
            }
        }
    }

    /// Compute and apply rollups in one step.
    pub fn aggregate_in_place(&mut self, metadata: &Metadata) {
        let rollups = rollup(self, metadata);
        self.apply_rollups(&rollups);
    }
}
