// cgen.rs — Parameter tree → C struct and enum declarations
//
// Groups become structs, arrays become an element type plus an array
// typedef, parameters become scalar members (int16_t unless the parameter
// names its own type). Definitions are emitted depth-first so every type
// is declared before its first use. Arrays with named enumerators also get
// an index enum with a trailing _Count member; enumerator names must be
// unique, a duplicate is an error rather than invalid C output.

use std::collections::HashSet;
use std::fmt::Write as _;

use thiserror::Error;

use crate::id::NodeId;
use crate::names::{camel, spaced_to_upper_camel};
use crate::node::{NodeData, NodeKind};
use crate::tree::Tree;

const DEFAULT_SCALAR: &str = "int16_t";

#[derive(Debug, Error)]
pub enum CGenError {
    #[error("{0:?} has no C declaration form")]
    UnsupportedNode(NodeKind),
    #[error("array {0:?} has no template element")]
    EmptyArray(String),
    #[error("array {array:?} would declare enumerator {name:?} twice")]
    DuplicateEnumerator { array: String, name: String },
}

// ── Declaration forms ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMember {
    pub type_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CDecl {
    Struct {
        tag: String,
        typedef: String,
        members: Vec<CMember>,
    },
    Enum {
        tag: String,
        typedef: String,
        enumerators: Vec<(String, usize)>,
    },
    ArrayTypedef {
        element_type: String,
        name: String,
        length: usize,
    },
}

impl CDecl {
    fn render_into(&self, out: &mut String) {
        match self {
            CDecl::Struct {
                tag,
                typedef,
                members,
            } => {
                let _ = writeln!(out, "struct {tag}");
                out.push_str("{\n");
                for member in members {
                    let _ = writeln!(out, "  {} {};", member.type_name, member.name);
                }
                out.push_str("};\n");
                let _ = writeln!(out, "typedef struct {tag} {typedef};");
            }
            CDecl::Enum {
                tag,
                typedef,
                enumerators,
            } => {
                let body: Vec<String> = enumerators
                    .iter()
                    .map(|(name, value)| format!("{name} = {value}"))
                    .collect();
                let _ = writeln!(out, "enum {tag} {{{}}};", body.join(", "));
                let _ = writeln!(out, "typedef enum {tag} {typedef};");
            }
            CDecl::ArrayTypedef {
                element_type,
                name,
                length,
            } => {
                let _ = writeln!(out, "typedef {element_type} {name}[{length}];");
            }
        }
    }
}

pub fn render(decls: &[CDecl]) -> String {
    let mut out = String::new();
    for decl in decls {
        decl.render_into(&mut out);
    }
    out
}

/// Render the declarations for a group or array subtree.
pub fn generate(tree: &Tree, id: NodeId) -> Result<String, CGenError> {
    Ok(render(&build_decls(tree, id)?))
}

/// Build the declaration list for a group or array subtree, dependencies
/// before dependents.
pub fn build_decls(tree: &Tree, id: NodeId) -> Result<Vec<CDecl>, CGenError> {
    match tree.kind(id) {
        NodeKind::Group | NodeKind::Array => {
            let mut decls = Vec::new();
            member(tree, id, &mut decls)?;
            Ok(decls)
        }
        other => Err(CGenError::UnsupportedNode(other)),
    }
}

/// Emit the definitions `id` needs into `decls` and return the member
/// declaration a containing struct would use for it.
fn member(tree: &Tree, id: NodeId, decls: &mut Vec<CDecl>) -> Result<CMember, CGenError> {
    match tree.data(id) {
        NodeData::Parameter(p) => Ok(CMember {
            type_name: p.type_name.clone().unwrap_or_else(|| DEFAULT_SCALAR.to_owned()),
            name: camel(&p.name),
        }),
        NodeData::Group(g) => {
            let base = spaced_to_upper_camel(g.type_name.as_deref().unwrap_or(&g.name));
            define_struct(tree, id, &base, decls)?;
            Ok(CMember {
                type_name: format!("{base}_t"),
                name: camel(&g.name),
            })
        }
        NodeData::Array(a) => {
            let base = spaced_to_upper_camel(&a.name);
            let children = tree.children(id);
            let &template = children
                .first()
                .ok_or_else(|| CGenError::EmptyArray(a.name.clone()))?;

            if a.named_enumerators {
                let element_type = element_type(tree, template, decls)?;

                let mut seen = HashSet::new();
                let mut enumerators = Vec::with_capacity(children.len() + 1);
                for (index, &child) in children.iter().enumerate() {
                    let name = format!("{base}_{}", spaced_to_upper_camel(tree.data(child).name()));
                    if !seen.insert(name.clone()) {
                        return Err(CGenError::DuplicateEnumerator {
                            array: a.name.clone(),
                            name,
                        });
                    }
                    enumerators.push((name, index));
                }
                enumerators.push((format!("{base}_Count"), children.len()));

                decls.push(CDecl::Enum {
                    tag: format!("{base}_e"),
                    typedef: format!("{base}_et"),
                    enumerators,
                });
                decls.push(CDecl::ArrayTypedef {
                    element_type,
                    name: format!("{base}_t"),
                    length: children.len(),
                });
                Ok(CMember {
                    type_name: format!("{base}_t"),
                    name: camel(&a.name),
                })
            } else {
                // Anonymous-index array: the template is flattened into one
                // struct repeated length times, no index enum.
                let members = match tree.data(template) {
                    NodeData::Parameter(_) => vec![member(tree, template, decls)?],
                    NodeData::Group(_) => {
                        let mut members = Vec::new();
                        for &child in tree.children(template) {
                            members.push(member(tree, child, decls)?);
                        }
                        members
                    }
                    other => return Err(CGenError::UnsupportedNode(other.kind())),
                };
                decls.push(CDecl::Struct {
                    tag: format!("{base}_s"),
                    typedef: format!("{base}_t"),
                    members,
                });
                decls.push(CDecl::ArrayTypedef {
                    element_type: format!("{base}_t"),
                    name: format!("{base}_at"),
                    length: children.len(),
                });
                Ok(CMember {
                    type_name: format!("{base}_at"),
                    name: camel(&a.name),
                })
            }
        }
        other => Err(CGenError::UnsupportedNode(other.kind())),
    }
}

/// Element type of a named-enumerator array, emitting the template's own
/// definitions first when the template is a group.
fn element_type(tree: &Tree, template: NodeId, decls: &mut Vec<CDecl>) -> Result<String, CGenError> {
    match tree.data(template) {
        NodeData::Parameter(p) => Ok(p
            .type_name
            .clone()
            .unwrap_or_else(|| DEFAULT_SCALAR.to_owned())),
        NodeData::Group(g) => {
            let base = spaced_to_upper_camel(g.type_name.as_deref().unwrap_or(&g.name));
            define_struct(tree, template, &base, decls)?;
            Ok(format!("{base}_t"))
        }
        other => Err(CGenError::UnsupportedNode(other.kind())),
    }
}

fn define_struct(
    tree: &Tree,
    id: NodeId,
    base: &str,
    decls: &mut Vec<CDecl>,
) -> Result<(), CGenError> {
    let mut members = Vec::new();
    for &child in tree.children(id) {
        members.push(member(tree, child, decls)?);
    }
    decls.push(CDecl::Struct {
        tag: format!("{base}_s"),
        typedef: format!("{base}_t"),
        members,
    });
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────
