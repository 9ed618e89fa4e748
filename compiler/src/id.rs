// id.rs — Node handles for the parameter tree arena
//
// A NodeId is a compact copy handle into the owning Tree. Handles are
// allocated in insertion order and never reused within one tree, so
// iteration over them is deterministic. They are distinct from the persisted
// UUID identity: a NodeId is process-local and cheap, a UUID is the stable
// cross-reference key that survives save/load.

use std::fmt;

/// Handle to a node slot inside a [`Tree`](crate::tree::Tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}
