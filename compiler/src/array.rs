// array.rs — Template + mirrored elements engine
//
// An Array's first child is the template; every other child is a mirrored
// element whose `original` back-reference must equal the template's
// identifier. Only length changes move elements: growing appends fresh
// mirrors of the template's element kind, shrinking removes from the tail.
// The template itself is never addressable through the engine.

use thiserror::Error;
use uuid::Uuid;

use crate::id::NodeId;
use crate::node::{ArrayGroupElement, ArrayParameterElement, NodeData, NodeKind};
use crate::tree::Tree;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArrayError {
    #[error("array length must be at least 1, got {0}")]
    InvalidLength(usize),
    #[error("array has no template element to mirror")]
    MissingTemplate,
    #[error("mirroring violated: element original {element:?} does not match template {template:?}")]
    Consistency {
        template: Option<Uuid>,
        element: Option<Uuid>,
    },
    #[error("array template must be a parameter or a group, got {0:?}")]
    UnsupportedTemplate(NodeKind),
}

fn mirror_of(template: &NodeData) -> Result<NodeData, ArrayError> {
    match template {
        NodeData::Parameter(_) => Ok(NodeData::ArrayParameterElement(ArrayParameterElement {
            original: template.uuid(),
            ..ArrayParameterElement::default()
        })),
        NodeData::Group(_) => Ok(NodeData::ArrayGroupElement(ArrayGroupElement {
            original: template.uuid(),
            ..ArrayGroupElement::default()
        })),
        other => Err(ArrayError::UnsupportedTemplate(other.kind())),
    }
}

/// Resize `array` to exactly `n` elements, template included. Shrinking
/// removes trailing elements; growing appends fresh mirrors carrying the
/// template's identifier as `original`. An array without a template has
/// nothing to mirror and cannot be resized. After success,
/// `children.len() == n`.
pub fn set_length(tree: &mut Tree, array: NodeId, n: usize) -> Result<(), ArrayError> {
    if n < 1 {
        return Err(ArrayError::InvalidLength(n));
    }

    let current = tree.children(array).len();
    if current == 0 {
        return Err(ArrayError::MissingTemplate);
    }
    if n < current {
        let doomed: Vec<NodeId> = tree.children(array)[n..].to_vec();
        for id in doomed {
            tree.remove(id);
        }
    } else if current < n {
        let template = tree.children(array)[0];
        let mirror = mirror_of(tree.data(template))?;
        for _ in current..n {
            tree.append_child(array, mirror.clone());
        }
    }

    if let NodeData::Array(a) = tree.data_mut(array) {
        a.length = n;
    }

    Ok(())
}

/// Load-time fail-fast check: every non-template child must reference the
/// template through `original`. Violations are never repaired.
pub fn check_mirroring(tree: &Tree, array: NodeId) -> Result<(), ArrayError> {
    let children = tree.children(array);
    let Some((&template, rest)) = children.split_first() else {
        return Ok(());
    };
    let template_uuid = tree.data(template).uuid();

    for &child in rest {
        let original = match tree.data(child) {
            NodeData::ArrayParameterElement(e) => e.original,
            NodeData::ArrayGroupElement(e) => e.original,
            other => {
                return Err(ArrayError::UnsupportedTemplate(other.kind()));
            }
        };
        if original != template_uuid || template_uuid.is_none() {
            return Err(ArrayError::Consistency {
                template: template_uuid,
                element: original,
            });
        }
    }

    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────
