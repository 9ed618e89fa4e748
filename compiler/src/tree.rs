// tree.rs — Arena-owned generic tree
//
// Ownership flows strictly parent → child: the arena owns every slot, a
// slot's parent link is a non-owning NodeId handle used for navigation only.
// Removal cascades to all descendants and vacates their slots; a NodeId into
// a vacated slot is stale and any access through it panics, the same
// contract as indexing with a freed graph handle.
//
// Preconditions: handles passed in belong to this tree and are live.
// Postconditions: child order is storage order; preorder() visits parents
//   before children, children in storage order.
// Failure modes: panics on stale or foreign handles (programmer error).
// Side effects: none beyond the arena itself.

use crate::id::NodeId;
use crate::node::{NodeData, NodeKind};

struct Slot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

pub struct Tree {
    slots: Vec<Option<Slot>>,
    root: NodeId,
}

impl Tree {
    pub fn new(root: NodeData) -> Self {
        Tree {
            slots: vec![Some(Slot {
                parent: None,
                children: Vec::new(),
                data: root,
            })],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn slot(&self, id: NodeId) -> &Slot {
        self.slots[id.index()]
            .as_ref()
            .unwrap_or_else(|| panic!("stale node handle {id}"))
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        self.slots[id.index()]
            .as_mut()
            .unwrap_or_else(|| panic!("stale node handle {id}"))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.slot(id).data
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.slot_mut(id).data
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.slot(id).data.kind()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slot(id).children
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        false // a tree always has its root
    }

    fn alloc(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(Slot {
            parent,
            children: Vec::new(),
            data,
        }));
        id
    }

    /// Append a new node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.alloc(Some(parent), data);
        self.slot_mut(parent).children.push(id);
        id
    }

    /// Insert a new node at `index` within `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, data: NodeData) -> NodeId {
        let id = self.alloc(Some(parent), data);
        self.slot_mut(parent).children.insert(index, id);
        id
    }

    /// Unlink `id` from its parent without destroying the subtree. The
    /// caller either re-attaches it or destroys it with [`Tree::remove`].
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.slot(id).parent {
            self.slot_mut(parent).children.retain(|&c| c != id);
            self.slot_mut(id).parent = None;
        }
    }

    /// Detach every child of `id`, preserving order, and return the handles.
    pub fn detach_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.slot_mut(id).children);
        for &child in &children {
            self.slot_mut(child).parent = None;
        }
        children
    }

    /// Attach a detached node as the last child of `parent`.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            self.slot(child).parent.is_none(),
            "attach_child: {child} is still attached"
        );
        self.slot_mut(child).parent = Some(parent);
        self.slot_mut(parent).children.push(child);
    }

    /// Remove a node and all of its descendants. The vacated handles become
    /// stale. Removing the root is a programmer error.
    pub fn remove(&mut self, id: NodeId) {
        assert!(id != self.root, "cannot remove the tree root");
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = self.slots[current.index()]
                .take()
                .unwrap_or_else(|| panic!("stale node handle {current}"));
            stack.extend(slot.children);
        }
    }

    /// Deterministic pre-order traversal from `id`: parent before children,
    /// children in storage order. Generators depend on this order.
    pub fn preorder(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }

    /// Index of `child` within `parent`'s children.
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.slot(parent).children.iter().position(|&c| c == child)
    }
}

pub struct Preorder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
