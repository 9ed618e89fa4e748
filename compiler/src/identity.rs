// identity.rs — UUID repair pass and whole-tree identifier resolution
//
// Every non-root node carries a tree-unique UUID. The repair pass assigns
// fresh v4 identifiers to nodes that have none and fails fast on a
// collision; the index built afterwards is the read-only lookup the
// generators use to chase cross-references. Dangling references are not
// cleaned up anywhere — they surface here, at resolution time.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::id::NodeId;
use crate::tree::Tree;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("duplicate identifier: {0}")]
    Duplicate(Uuid),
    #[error("no node with identifier {0}")]
    NotFound(Uuid),
}

/// Assign fresh identifiers to nodes that lack one, in a single
/// deterministic pre-order pass. The root itself is exempt from the
/// uniqueness contract. Fails on the first collision against an
/// already-visited identifier.
///
/// Calling this twice in a row is idempotent: the second pass changes
/// nothing.
pub fn repair_identifiers(tree: &mut Tree) -> Result<(), IdentityError> {
    let mut seen: HashMap<Uuid, NodeId> = HashMap::new();
    let order: Vec<NodeId> = tree.preorder(tree.root()).collect();
    let mut assigned = 0usize;

    for id in order {
        if id == tree.root() {
            continue;
        }

        match tree.data(id).uuid() {
            Some(uuid) => {
                if seen.insert(uuid, id).is_some() {
                    return Err(IdentityError::Duplicate(uuid));
                }
            }
            None => {
                let mut fresh = Uuid::new_v4();
                while seen.contains_key(&fresh) {
                    fresh = Uuid::new_v4();
                }
                tree.data_mut(id).set_uuid(Some(fresh));
                seen.insert(fresh, id);
                assigned += 1;
            }
        }
    }

    if assigned > 0 {
        tracing::debug!(assigned, "assigned missing identifiers");
    }

    Ok(())
}

/// UUID → node lookup over one whole tree. Building it validates uniqueness;
/// resolution never mutates anything.
pub struct IdentityIndex {
    by_uuid: HashMap<Uuid, NodeId>,
}

impl IdentityIndex {
    pub fn build(tree: &Tree) -> Result<Self, IdentityError> {
        let mut by_uuid = HashMap::new();
        for id in tree.preorder(tree.root()) {
            if let Some(uuid) = tree.data(id).uuid() {
                if by_uuid.insert(uuid, id).is_some() {
                    return Err(IdentityError::Duplicate(uuid));
                }
            }
        }
        Ok(IdentityIndex { by_uuid })
    }

    pub fn resolve(&self, uuid: Uuid) -> Result<NodeId, IdentityError> {
        self.by_uuid
            .get(&uuid)
            .copied()
            .ok_or(IdentityError::NotFound(uuid))
    }

    pub fn len(&self) -> usize {
        self.by_uuid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uuid.is_empty()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
