//! Playlist tree assembly
//!
//! The format stores the tree as flat nodes with parent ids and does not
//! rule out cycles. Building is depth-capped and visits each node once.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::database::Database;
use crate::model::PlaylistTreeNode;

/// Nesting below this depth is cut off
pub const MAX_TREE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistTreeItem {
    pub node: PlaylistTreeNode,
    pub children: Vec<PlaylistTreeItem>,
}

struct ForestBuilder<'a> {
    nodes: &'a HashMap<u32, PlaylistTreeNode>,
    children: HashMap<u32, Vec<&'a PlaylistTreeNode>>,
    visited: HashSet<u32>,
}

fn sort_siblings(siblings: &mut [&PlaylistTreeNode]) {
    siblings.sort_by_key(|n| (n.sort_order, !n.is_folder, n.id));
}

impl<'a> ForestBuilder<'a> {
    fn item(&mut self, node: &'a PlaylistTreeNode, depth: usize) -> PlaylistTreeItem {
        self.visited.insert(node.id);
        let mut item = PlaylistTreeItem {
            node: node.clone(),
            children: Vec::new(),
        };

        if depth >= MAX_TREE_DEPTH {
            warn!("Playlist tree deeper than {} at node {}", MAX_TREE_DEPTH, node.id);
            return item;
        }

        let kids = self.children.get(&node.id).cloned().unwrap_or_default();
        for child in kids {
            if self.visited.contains(&child.id) {
                continue;
            }
            let child_item = self.item(child, depth + 1);
            item.children.push(child_item);
        }
        item
    }

    fn is_root(&self, node: &PlaylistTreeNode) -> bool {
        node.parent_id == 0 || node.parent_id == node.id || !self.nodes.contains_key(&node.parent_id)
    }
}

/// Arrange nodes into a forest. Siblings are ordered by sort order, folders
/// first on ties. Nodes whose parent is missing become roots; nodes caught
/// in a parent cycle or cut off by the depth cap are attached at the root
/// as well.
pub fn build_forest(nodes: &HashMap<u32, PlaylistTreeNode>) -> Vec<PlaylistTreeItem> {
    let mut builder = ForestBuilder {
        nodes,
        children: HashMap::new(),
        visited: HashSet::new(),
    };

    let mut roots = Vec::new();
    for node in nodes.values() {
        if builder.is_root(node) {
            roots.push(node);
        } else {
            builder.children.entry(node.parent_id).or_default().push(node);
        }
    }
    for siblings in builder.children.values_mut() {
        sort_siblings(siblings);
    }
    sort_siblings(&mut roots);

    let mut forest: Vec<PlaylistTreeItem> = roots
        .into_iter()
        .map(|root| builder.item(root, 0))
        .collect();

    let mut unreached: Vec<&PlaylistTreeNode> = nodes
        .values()
        .filter(|n| !builder.visited.contains(&n.id))
        .collect();
    if !unreached.is_empty() {
        warn!("{} playlist tree nodes are not reachable from a root", unreached.len());
        unreached.sort_by_key(|n| n.id);
        for node in unreached {
            if !builder.visited.contains(&node.id) {
                let item = builder.item(node, 0);
                forest.push(item);
            }
        }
    }

    forest
}

impl Database {
    pub fn playlist_forest(&self) -> Vec<PlaylistTreeItem> {
        build_forest(&self.playlists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::parse;
    use crate::fixture::sample_image;

    fn node(id: u32, parent_id: u32, sort_order: u32, is_folder: bool) -> PlaylistTreeNode {
        PlaylistTreeNode {
            id,
            parent_id,
            name: format!("node {}", id),
            is_folder,
            sort_order,
        }
    }

    fn map(nodes: Vec<PlaylistTreeNode>) -> HashMap<u32, PlaylistTreeNode> {
        nodes.into_iter().map(|n| (n.id, n)).collect()
    }

    fn ids(items: &[PlaylistTreeItem]) -> Vec<u32> {
        items.iter().map(|i| i.node.id).collect()
    }

    #[test]
    fn test_sample_forest() {
        let forest = parse(&sample_image()).playlist_forest();
        assert_eq!(ids(&forest), vec![1, 4]);
        assert_eq!(forest[0].node.name, "Sets");
        assert_eq!(ids(&forest[0].children), vec![2, 3]);
    }

    #[test]
    fn test_folders_first_on_equal_sort_order() {
        let forest = build_forest(&map(vec![node(1, 0, 0, false), node(2, 0, 0, true)]));
        assert_eq!(ids(&forest), vec![2, 1]);
    }

    #[test]
    fn test_orphan_becomes_root() {
        let forest = build_forest(&map(vec![node(1, 0, 0, true), node(2, 77, 0, false)]));
        assert_eq!(ids(&forest), vec![1, 2]);
    }

    #[test]
    fn test_cycle_is_broken() {
        let forest = build_forest(&map(vec![node(1, 2, 0, true), node(2, 1, 0, true)]));
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].node.id, 1);
        assert_eq!(ids(&forest[0].children), vec![2]);
        assert!(forest[0].children[0].children.is_empty());
    }

    #[test]
    fn test_depth_is_capped() {
        let chain: Vec<PlaylistTreeNode> = (1..=50).map(|id| node(id, id - 1, 0, true)).collect();
        let forest = build_forest(&map(chain));

        let mut depth = 0;
        let mut item = &forest[0];
        while let Some(child) = item.children.first() {
            item = child;
            depth += 1;
        }
        assert_eq!(depth, MAX_TREE_DEPTH);
    }
}
