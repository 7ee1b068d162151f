//! Ancestor chains resolved through the id map.
//!
//! Walks follow the parent id recorded on each work item. A walk stops at a
//! root of the tree, at a parent id of `0`, at an id with no node in the tree,
//! or at an id it has already visited, so corrupt parent data can never loop
//! forever. Roots have no ancestors, including items promoted to roots when
//! the tree was built to break a parent cycle.

use std::collections::{HashMap, HashSet};

use crate::models::WorkItemId;
use crate::models::tree::RoadmapTree;

/// Ancestors of `id`, nearest first.
///
/// The chain includes only ids that resolve to a node carrying data.
pub fn ancestors(tree: &RoadmapTree, id: WorkItemId) -> Vec<WorkItemId> {
    let mut chain = Vec::new();
    if tree.is_root(id) {
        return chain;
    }

    let mut visited: HashSet<WorkItemId> = HashSet::from([id]);
    let mut current = tree.parent_of(id);

    while let Some(parent) = current {
        if tree.item(parent).is_none() || !visited.insert(parent) {
            break;
        }
        chain.push(parent);
        if tree.is_root(parent) {
            break;
        }
        current = tree.parent_of(parent);
    }

    chain
}

/// Annotate `project` on every work item with its top-most resolvable
/// ancestor, or clear it when the item has none.
pub fn resolve_ancestors(tree: &mut RoadmapTree) {
    let projects: Vec<(WorkItemId, Option<String>)> = super::order::preorder_ids(tree)
        .into_iter()
        .filter(|&id| tree.item(id).is_some())
        .map(|id| (id, ancestors(tree, id).last().map(|a| a.to_string())))
        .collect();

    for (id, project) in projects {
        if let Some(item) = tree.item_mut(id) {
            item.project = project;
        }
    }
}

/// Precomputed ancestor chains for every work item in a tree.
#[derive(Debug, Clone, Default)]
pub struct AncestorIndex {
    chains: HashMap<WorkItemId, Vec<WorkItemId>>,
}

impl AncestorIndex {
    /// Build chains for every node carrying data.
    pub fn build(tree: &RoadmapTree) -> Self {
        let chains = super::order::preorder_ids(tree)
            .into_iter()
            .filter(|&id| tree.item(id).is_some())
            .map(|id| (id, ancestors(tree, id)))
            .collect();
        Self { chains }
    }

    /// Ancestors of `id`, nearest first (empty for roots and unknown ids).
    pub fn chain(&self, id: WorkItemId) -> &[WorkItemId] {
        self.chains.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Whether `ancestor` appears in the chain of `id`.
    pub fn is_ancestor(&self, ancestor: WorkItemId, id: WorkItemId) -> bool {
        self.chain(id).contains(&ancestor)
    }

    /// Number of indexed work items.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkItem;

    fn item(id: WorkItemId, parent: Option<WorkItemId>) -> WorkItem {
        let mut item = WorkItem::new(id, "Task", format!("Item {}", id));
        item.parent = parent;
        item
    }

    fn chain_tree() -> RoadmapTree {
        RoadmapTree::from_items(vec![
            item(1, None),
            item(2, Some(1)),
            item(3, Some(2)),
            item(4, Some(3)),
        ])
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let tree = chain_tree();
        assert_eq!(ancestors(&tree, 4), vec![3, 2, 1]);
        assert_eq!(ancestors(&tree, 1), Vec::<WorkItemId>::new());
    }

    #[test]
    fn test_ancestors_unknown_id() {
        let tree = chain_tree();
        assert!(ancestors(&tree, 42).is_empty());
    }

    #[test]
    fn test_dangling_parent_stops_walk() {
        let tree = RoadmapTree::from_items(vec![item(1, Some(77)), item(2, Some(1))]);
        assert_eq!(ancestors(&tree, 2), vec![1]);
        assert!(ancestors(&tree, 1).is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let tree = RoadmapTree::from_items(vec![
            item(1, Some(3)),
            item(2, Some(1)),
            item(3, Some(2)),
        ]);
        // 1 is promoted to root, leaving 1 -> 2 -> 3.
        assert!(ancestors(&tree, 1).is_empty());
        assert_eq!(ancestors(&tree, 2), vec![1]);
        assert_eq!(ancestors(&tree, 3), vec![2, 1]);
    }

    #[test]
    fn test_cycle_promoted_root_has_no_project() {
        let mut tree = RoadmapTree::from_items(vec![item(1, Some(2)), item(2, Some(1))]);
        assert_eq!(tree.roots(), &[1]);

        resolve_ancestors(&mut tree);
        assert_eq!(tree.item(1).unwrap().project, None);
        assert_eq!(tree.item(2).unwrap().project.as_deref(), Some("1"));

        let index = AncestorIndex::build(&tree);
        assert!(index.chain(1).is_empty());
        assert_eq!(index.chain(2), &[1]);
        assert!(!index.is_ancestor(2, 1));
    }

    #[test]
    fn test_self_reference_terminates() {
        let tree = RoadmapTree::from_items(vec![item(1, Some(1))]);
        assert!(ancestors(&tree, 1).is_empty());
    }

    #[test]
    fn test_resolve_ancestors_sets_project() {
        let mut tree = chain_tree();
        tree.item_mut(1).unwrap().project = Some("stale".to_string());
        resolve_ancestors(&mut tree);

        assert_eq!(tree.item(1).unwrap().project, None);
        assert_eq!(tree.item(2).unwrap().project.as_deref(), Some("1"));
        assert_eq!(tree.item(4).unwrap().project.as_deref(), Some("1"));
    }

    #[test]
    fn test_ancestor_index() {
        let tree = chain_tree();
        let index = AncestorIndex::build(&tree);

        assert_eq!(index.len(), 4);
        assert_eq!(index.chain(3), &[2, 1]);
        assert!(index.is_ancestor(1, 4));
        assert!(!index.is_ancestor(4, 1));
        assert!(index.chain(99).is_empty());
    }

    #[test]
    fn test_empty_tree() {
        let mut tree = RoadmapTree::new();
        resolve_ancestors(&mut tree);
        assert!(AncestorIndex::build(&tree).is_empty());
    }
}
