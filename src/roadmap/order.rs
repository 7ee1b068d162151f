//! Preorder and postorder flattening of the roadmap tree.
//!
//! Both walks use an explicit stack, so depth is bounded by memory rather than
//! by the call stack, and both visit children in stored order.

use crate::models::tree::RoadmapTree;
use crate::models::{WorkItem, WorkItemId};

/// Ids in preorder: each root followed immediately by its subtree.
pub fn preorder_ids(tree: &RoadmapTree) -> Vec<WorkItemId> {
    let mut result = Vec::with_capacity(tree.len());
    let mut stack: Vec<WorkItemId> = tree.roots().iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        result.push(id);
        if let Some(node) = tree.get(id) {
            stack.extend(node.children.iter().rev().copied());
        }
    }

    result
}

/// Ids in postorder: every node after all of its descendants.
pub fn postorder_ids(tree: &RoadmapTree) -> Vec<WorkItemId> {
    let mut result = Vec::with_capacity(tree.len());
    // (id, children already expanded)
    let mut stack: Vec<(WorkItemId, bool)> =
        tree.roots().iter().rev().map(|&id| (id, false)).collect();

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            result.push(id);
            continue;
        }
        stack.push((id, true));
        if let Some(node) = tree.get(id) {
            stack.extend(node.children.iter().rev().map(|&c| (c, false)));
        }
    }

    result
}

/// Flatten the tree into display order.
///
/// Returns clones of every node that carries data, parents before children,
/// with `top` set on top-level nodes and cleared everywhere else.
pub fn preorder(tree: &RoadmapTree) -> Vec<WorkItem> {
    preorder_ids(tree)
        .into_iter()
        .filter_map(|id| {
            let mut item = tree.item(id)?.clone();
            item.top = tree.is_root(id);
            Some(item)
        })
        .collect()
}

/// Set the `top` flag in place on every node of the tree.
pub fn mark_top(tree: &mut RoadmapTree) {
    for id in preorder_ids(tree) {
        let top = tree.is_root(id);
        if let Some(item) = tree.item_mut(id) {
            item.top = top;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: WorkItemId, parent: Option<WorkItemId>) -> WorkItem {
        let mut item = WorkItem::new(id, "Task", format!("Item {}", id));
        item.parent = parent;
        item
    }

    /// 1
    /// ├── 2
    /// │   ├── 4
    /// │   └── 5
    /// └── 3
    /// 6
    fn sample_tree() -> RoadmapTree {
        RoadmapTree::from_items(vec![
            item(1, None),
            item(2, Some(1)),
            item(3, Some(1)),
            item(4, Some(2)),
            item(5, Some(2)),
            item(6, None),
        ])
    }

    #[test]
    fn test_preorder_ids() {
        assert_eq!(preorder_ids(&sample_tree()), vec![1, 2, 4, 5, 3, 6]);
    }

    #[test]
    fn test_postorder_ids() {
        assert_eq!(postorder_ids(&sample_tree()), vec![4, 5, 2, 3, 1, 6]);
    }

    #[test]
    fn test_empty_tree_orders() {
        let tree = RoadmapTree::new();
        assert!(preorder_ids(&tree).is_empty());
        assert!(postorder_ids(&tree).is_empty());
        assert!(preorder(&tree).is_empty());
    }

    #[test]
    fn test_preorder_marks_top() {
        let ordered = preorder(&sample_tree());
        let top: Vec<WorkItemId> = ordered.iter().filter(|i| i.top).map(|i| i.id).collect();
        assert_eq!(top, vec![1, 6]);
    }

    #[test]
    fn test_preorder_clears_stale_top() {
        let mut tree = sample_tree();
        tree.item_mut(4).unwrap().top = true;

        let ordered = preorder(&tree);
        assert!(!ordered.iter().find(|i| i.id == 4).unwrap().top);
    }

    #[test]
    fn test_mark_top_in_place() {
        let mut tree = sample_tree();
        mark_top(&mut tree);

        assert!(tree.item(1).unwrap().top);
        assert!(tree.item(6).unwrap().top);
        assert!(!tree.item(2).unwrap().top);
    }

    #[test]
    fn test_mark_top_flat_forest() {
        let mut tree = RoadmapTree::from_items((1..=5000).map(|id| item(id, None)));
        mark_top(&mut tree);

        assert!(preorder(&tree).iter().all(|i| i.top));
        assert!((1..=5000).all(|id| tree.item(id).unwrap().top));
    }

    #[test]
    fn test_preorder_skips_placeholders() {
        let mut tree = sample_tree();
        tree.push_placeholder(3, 99);

        assert_eq!(preorder_ids(&tree), vec![1, 2, 4, 5, 3, 99, 6]);
        let ids: Vec<WorkItemId> = preorder(&tree).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 4, 5, 3, 6]);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let mut items = vec![item(1, None)];
        for id in 2..=20_000 {
            items.push(item(id, Some(id - 1)));
        }
        let tree = RoadmapTree::from_items(items);

        let pre = preorder_ids(&tree);
        let post = postorder_ids(&tree);
        assert_eq!(pre.len(), 20_000);
        assert_eq!(pre.first(), Some(&1));
        assert_eq!(post.first(), Some(&20_000));
        assert_eq!(post.last(), Some(&1));
    }

    #[test]
    fn test_every_node_once_and_after_descendants() {
        let tree = sample_tree();
        let post = postorder_ids(&tree);
        let position = |id: WorkItemId| post.iter().position(|&x| x == id).unwrap();

        assert_eq!(post.len(), tree.len());
        for &id in &post {
            for &child in &tree.get(id).unwrap().children {
                assert!(position(child) < position(id));
            }
        }
    }
}
