//! Arena tree of work items keyed by id.
//!
//! The roadmap hierarchy is navigated by id lookup rather than by pointers:
//! each [`TreeNode`] stores its children as an ordered list of ids, and the
//! tree owns a single `id -> node` map giving O(1) access from any id.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::{WorkItem, WorkItemId};

/// A node of the roadmap tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeNode {
    /// Work item payload (absent for placeholder nodes)
    pub data: Option<WorkItem>,

    /// Child ids in stored order
    pub children: Vec<WorkItemId>,
}

impl TreeNode {
    /// Create a node holding `item` with no children.
    pub fn new(item: WorkItem) -> Self {
        Self {
            data: Some(item),
            children: Vec::new(),
        }
    }

    /// A node with no children is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of direct children.
    pub fn total_children(&self) -> usize {
        self.children.len()
    }
}

/// A forest of work items.
#[derive(Debug, Clone, Default)]
pub struct RoadmapTree {
    /// Maps each id to its node
    nodes: HashMap<WorkItemId, TreeNode>,

    /// Top-level ids in stored order
    roots: Vec<WorkItemId>,

    /// Membership index over `roots`
    root_set: HashSet<WorkItemId>,
}

impl RoadmapTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a flat list of work items.
    ///
    /// Roots and siblings keep the input order. An item whose parent is not in
    /// the list becomes a root. Items caught in a parent cycle are detached from
    /// their parent and promoted to roots so the result is always a forest.
    pub fn from_items(items: impl IntoIterator<Item = WorkItem>) -> Self {
        let mut tree = Self::new();
        let mut order: Vec<WorkItemId> = Vec::new();

        for item in items {
            if tree.nodes.contains_key(&item.id) {
                warn!(id = item.id, "duplicate work item id, keeping first occurrence");
                continue;
            }
            order.push(item.id);
            tree.nodes.insert(item.id, TreeNode::new(item));
        }

        for &id in &order {
            let parent = tree.parent_of(id).filter(|p| tree.nodes.contains_key(p));
            match parent {
                Some(parent) if parent != id => {
                    if let Some(node) = tree.nodes.get_mut(&parent) {
                        node.children.push(id);
                    }
                }
                _ => tree.add_root(id),
            }
        }

        // Anything not reachable from a root sits on a parent cycle.
        let mut reached = tree.reachable();
        for &id in &order {
            if reached.contains(&id) {
                continue;
            }
            warn!(id, "work item is part of a parent cycle, promoting to root");
            if let Some(parent) = tree.parent_of(id) {
                if let Some(node) = tree.nodes.get_mut(&parent) {
                    node.children.retain(|&c| c != id);
                }
            }
            tree.add_root(id);
            reached = tree.reachable();
        }

        tree
    }

    /// Append `item` as a new root.
    ///
    /// Returns `false` (and leaves the tree unchanged) if the id already exists.
    pub fn push_root(&mut self, item: WorkItem) -> bool {
        if self.nodes.contains_key(&item.id) {
            return false;
        }
        self.add_root(item.id);
        self.nodes.insert(item.id, TreeNode::new(item));
        true
    }

    /// Append `item` as the last child of `parent`.
    ///
    /// Returns `false` if the parent is unknown or the id already exists.
    pub fn push_child(&mut self, parent: WorkItemId, item: WorkItem) -> bool {
        if self.nodes.contains_key(&item.id) || !self.nodes.contains_key(&parent) {
            return false;
        }
        let id = item.id;
        self.nodes.insert(id, TreeNode::new(item));
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        true
    }

    /// Insert a child id without a payload (an inconsistent tree, as a remote
    /// query may return a link to an item it did not fetch).
    pub fn push_placeholder(&mut self, parent: WorkItemId, id: WorkItemId) -> bool {
        if self.nodes.contains_key(&id) || !self.nodes.contains_key(&parent) {
            return false;
        }
        self.nodes.insert(id, TreeNode::default());
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        true
    }

    /// Look up a node by id.
    pub fn get(&self, id: WorkItemId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Look up a node mutably by id.
    pub fn get_mut(&mut self, id: WorkItemId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(&id)
    }

    /// Look up the work item stored under `id`.
    pub fn item(&self, id: WorkItemId) -> Option<&WorkItem> {
        self.nodes.get(&id).and_then(|n| n.data.as_ref())
    }

    /// Look up the work item stored under `id` mutably.
    pub fn item_mut(&mut self, id: WorkItemId) -> Option<&mut WorkItem> {
        self.nodes.get_mut(&id).and_then(|n| n.data.as_mut())
    }

    /// Parent id recorded on the item's payload (`0` treated as none).
    pub fn parent_of(&self, id: WorkItemId) -> Option<WorkItemId> {
        self.item(id).and_then(WorkItem::parent_id)
    }

    /// Top-level ids in stored order.
    pub fn roots(&self) -> &[WorkItemId] {
        &self.roots
    }

    /// Whether `id` is a top-level node.
    pub fn is_root(&self, id: WorkItemId) -> bool {
        self.root_set.contains(&id)
    }

    /// True when the tree has no top-level nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of nodes in the tree (placeholders included).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `id` is a leaf. Unknown ids are not leaves.
    pub fn is_leaf(&self, id: WorkItemId) -> bool {
        self.nodes.get(&id).is_some_and(TreeNode::is_leaf)
    }

    /// Number of direct children of `id` (0 for unknown ids).
    pub fn total_children(&self, id: WorkItemId) -> usize {
        self.nodes.get(&id).map_or(0, TreeNode::total_children)
    }

    fn add_root(&mut self, id: WorkItemId) {
        if self.root_set.insert(id) {
            self.roots.push(id);
        }
    }

    /// Ids reachable from the roots.
    fn reachable(&self) -> HashSet<WorkItemId> {
        let mut seen = HashSet::new();
        let mut stack: Vec<WorkItemId> = self.roots.clone();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().copied());
            }
        }
        seen
    }
}
