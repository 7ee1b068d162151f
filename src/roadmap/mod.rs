//! The roadmap engine.
//!
//! A roadmap is built once per snapshot and projected once per filter change:
//!
//! 1. [`RoadmapTree::from_items`] arranges the fetched work items into a forest
//! 2. [`ancestors::resolve_ancestors`] annotates each item with its top-most ancestor
//! 3. [`aggregate::rollup`] derives dates and progress bottom-up
//! 4. [`order::preorder`] flattens the forest into display order
//! 5. [`filter::project`] reduces the list to the visible, re-connected view
//! 6. [`gantt::GanttConfig`] converts the view into renderer records
//!
//! Nothing here performs I/O or fails; empty input produces empty output.

pub mod aggregate;
pub mod ancestors;
pub mod filter;
pub mod gantt;
pub mod order;

pub use aggregate::{Rollup, aggregate, rollup};
pub use ancestors::{AncestorIndex, ancestors, resolve_ancestors};
pub use filter::{
    FilterCriteria, Projection, TagFilter, TagMode, apply_visibility, hidden_ids, project,
    top_level_area_path,
};
pub use gantt::{GanttConfig, GanttData, GanttLink, GanttTask, LinkType};
pub use order::{postorder_ids, preorder, preorder_ids};

use tracing::debug;

use crate::models::tree::RoadmapTree;
use crate::models::{DisplayInterval, Metadata, WorkItem, WorkItemId};

/// An aggregated roadmap ready to be projected.
#[derive(Debug, Clone, Default)]
pub struct Roadmap {
    tree: RoadmapTree,
    ordered: Vec<WorkItem>,
    metadata: Metadata,
}

impl Roadmap {
    /// Build and aggregate a roadmap from fetched work items.
    pub fn build(items: Vec<WorkItem>, metadata: Metadata) -> Self {
        let mut tree = RoadmapTree::from_items(items);
        resolve_ancestors(&mut tree);
        order::mark_top(&mut tree);
        tree.aggregate_in_place(&metadata);
        let ordered = preorder(&tree);

        debug!(items = ordered.len(), roots = tree.roots().len(), "built roadmap");
        Self {
            tree,
            ordered,
            metadata,
        }
    }

    /// Work items in display order (parents before children).
    pub fn items(&self) -> &[WorkItem] {
        &self.ordered
    }

    /// The underlying tree.
    pub fn tree(&self) -> &RoadmapTree {
        &self.tree
    }

    /// Metadata the roadmap was aggregated with.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Look up an aggregated work item.
    pub fn get(&self, id: WorkItemId) -> Option<&WorkItem> {
        self.tree.item(id)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: WorkItemId) -> Vec<WorkItemId> {
        ancestors(&self.tree, id)
    }

    /// Whether the roadmap has no work items.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Filtered view of the roadmap.
    pub fn project(&self, criteria: &FilterCriteria) -> Projection {
        project(&self.ordered, criteria)
    }

    /// Filtered view converted to Gantt records.
    pub fn gantt(&self, criteria: &FilterCriteria, unit: DisplayInterval) -> GanttConfig {
        GanttConfig::from_projection(
            &self.project(criteria),
            &self.metadata.work_item_types,
            unit,
        )
    }
}
