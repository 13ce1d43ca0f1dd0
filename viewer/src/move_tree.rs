//! Parent-linked game tree over every known move, mainline and variations.
//!
//! The move list is what navigation walks; the tree answers "how did we get
//! here" for any record, including PV moves, by following parent links.

use std::collections::{HashMap, HashSet};

use analysis_client::WireMove;

use crate::converters::{record_from_wire, ConvertError};
use crate::move_list::MoveList;
use crate::record::{LineContext, MoveId, MoveRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: MoveId,
    pub parent: Option<MoveId>,
    pub uci: String,
    pub san: Option<String>,
    pub fen: String,
    pub context: LineContext,
}

impl TreeNode {
    pub fn from_record(record: &MoveRecord, parent: Option<MoveId>) -> Self {
        Self {
            id: record.id,
            parent,
            uci: record.uci.clone(),
            san: record.san.clone(),
            fen: record.fen.clone(),
            context: record.context,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveTree {
    nodes: HashMap<MoveId, TreeNode>,
    /// Children in insertion order; the first child continues the mainline.
    children: HashMap<MoveId, Vec<MoveId>>,
    roots: Vec<MoveId>,
}

impl MoveTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node. Re-inserting an id moves it under its new
    /// parent. A node naming itself as parent is stored as a root.
    pub fn insert(&mut self, mut node: TreeNode) {
        if node.parent == Some(node.id) {
            node.parent = None;
        }
        self.unlink(node.id);
        match node.parent {
            Some(parent) => self.children.entry(parent).or_default().push(node.id),
            None => self.roots.push(node.id),
        }
        self.nodes.insert(node.id, node);
    }

    pub fn get(&self, id: MoveId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: MoveId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn children(&self, id: MoveId) -> &[MoveId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn roots(&self) -> &[MoveId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_id(&self) -> Option<MoveId> {
        self.nodes.keys().copied().max()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.children.clear();
        self.roots.clear();
    }

    /// Ids from the root down to `id`, inclusive. Empty when `id` is
    /// unknown. Stops early on a parent cycle or a dangling parent.
    pub fn path_to(&self, id: MoveId) -> Vec<MoveId> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(&current) else {
                break;
            };
            if !seen.insert(current) {
                break;
            }
            path.push(current);
            cursor = node.parent;
        }
        path.reverse();
        path
    }

    /// First-child chain from the first root.
    pub fn mainline(&self) -> Vec<MoveId> {
        let mut line = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = self.roots.first().copied();
        while let Some(id) = cursor {
            if !seen.insert(id) {
                break;
            }
            line.push(id);
            cursor = self.children(id).first().copied();
        }
        line
    }

    /// Tree view of a move list: mainline moves chain off each other, and
    /// the PVs at slot `i` branch from mainline move `i - 1` (or the root
    /// position for slot 0), each PV move parented on the one before it.
    pub fn from_move_list(list: &MoveList) -> Self {
        let mut tree = Self::new();
        let mut previous: Option<MoveId> = None;
        for slot in list.slots() {
            tree.insert(TreeNode::from_record(&slot.mainline, previous));
            for line in [&slot.pv1, &slot.pv2] {
                let mut parent = previous;
                for record in line {
                    if record.id == slot.mainline.id || tree.contains(record.id) {
                        parent = Some(record.id);
                        continue;
                    }
                    tree.insert(TreeNode::from_record(record, parent));
                    parent = Some(record.id);
                }
            }
            previous = Some(slot.mainline.id);
        }
        tree
    }

    /// Build from the backend's flat tree dump. A parent of `-1` or none
    /// marks a root move.
    pub fn from_wire(moves: &[WireMove]) -> Result<Self, ConvertError> {
        let mut tree = Self::new();
        for (i, wire) in moves.iter().enumerate() {
            let record = record_from_wire(wire, LineContext::Mainline, i as u32)?;
            let parent = match wire.parent {
                None | Some(-1) => None,
                Some(p) => Some(MoveId::try_from(p).map_err(|_| ConvertError::InvalidField {
                    field: "parent",
                    value: p.to_string(),
                })?),
            };
            tree.insert(TreeNode::from_record(&record, parent));
        }
        Ok(tree)
    }

    fn unlink(&mut self, id: MoveId) {
        let Some(old) = self.nodes.get(&id) else {
            return;
        };
        let siblings = match old.parent {
            Some(parent) => self.children.get_mut(&parent),
            None => Some(&mut self.roots),
        };
        if let Some(siblings) = siblings {
            siblings.retain(|child| *child != id);
        }
    }
}
