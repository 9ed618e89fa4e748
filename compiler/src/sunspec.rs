// sunspec.rs — SunSpec register layout: fixed types, block checks, table sync
//
// The SunSpec tree references the parameter tree everywhere: data points
// name their parameter by UUID, their register type is an enumerator of
// the well-known SunSpecTypes enumeration, and a SunSpecTable is rebuilt
// from a parameter-side table. Rebuilding is a diff, not a wipe: existing
// blocks are matched by combination path and existing points by parameter
// reference, so their identifiers survive resynchronization.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use uuid::{uuid, Uuid};

use crate::id::NodeId;
use crate::identity::{IdentityError, IdentityIndex};
use crate::node::{
    DataPoint, Enumeration, Enumerator, NodeData, NodeKind, Parameter, TableRepeatingBlock,
};
use crate::tree::Tree;

#[derive(Debug, Error)]
pub enum SunSpecError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("{uuid} is not a {expected:?}, got {actual:?}")]
    WrongKind {
        uuid: Uuid,
        expected: NodeKind,
        actual: NodeKind,
    },
    #[error("expected size {expected} for {type_name}, is {actual}")]
    MismatchedSizeAndType {
        type_name: String,
        expected: i64,
        actual: u16,
    },
    #[error("no generated group for combination {0:?}")]
    MissingCombinationGroup(Vec<Uuid>),
    #[error("table consistency violated: {0}")]
    Consistency(String),
}

// ── Well-known register types ───────────────────────────────────────────────

pub const SUNSPEC_TYPES_UUID: Uuid = uuid!("00b90651-3e3b-4e28-a8c0-7339ae092200");

pub const INT16_UUID: Uuid = uuid!("2cf75e5a-ffc8-422a-bbc6-573d4206a7e1");
pub const UINT16_UUID: Uuid = uuid!("4f856a7e-20f4-43e2-86b1-cc7ee772f919");
pub const INT32_UUID: Uuid = uuid!("4fec39a5-b702-4dbf-8ad1-95f5e01201b6");
pub const UINT32_UUID: Uuid = uuid!("eb8cdc87-05e2-4593-994e-ab3363236168");
pub const SUNSSF_UUID: Uuid = uuid!("02e70616-4986-4f3e-8ac4-98ac153e66f9");
pub const ENUM16_UUID: Uuid = uuid!("209aebc8-652f-47bf-9952-4c112ced2781");
pub const BITFIELD32_UUID: Uuid = uuid!("fc0ad957-2785-4762-b2fc-4db2cf785ca2");
pub const STRING_UUID: Uuid = uuid!("5460c860-4aad-476a-908c-83a364b781c9");
pub const ACC16_UUID: Uuid = uuid!("05830309-c61c-41d4-8c66-88ed25187575");
pub const ACC32_UUID: Uuid = uuid!("f9d30fa6-33b2-48a2-8b64-72a4f47c0bd4");
pub const PAD_UUID: Uuid = uuid!("f8090bab-cf12-476c-b96a-1c8bb9848bb5");

/// (name, register size, well-known identifier). `string` carries size 0
/// because its size is free per point.
pub const SUNSPEC_TYPES: &[(&str, i64, Uuid)] = &[
    ("int16", 1, INT16_UUID),
    ("uint16", 1, UINT16_UUID),
    ("int32", 2, INT32_UUID),
    ("uint32", 2, UINT32_UUID),
    ("sunssf", 1, SUNSSF_UUID),
    ("enum16", 1, ENUM16_UUID),
    ("bitfield32", 2, BITFIELD32_UUID),
    ("string", 0, STRING_UUID),
    ("acc16", 1, ACC16_UUID),
    ("acc32", 2, ACC32_UUID),
    ("pad", 1, PAD_UUID),
];

/// Install the SunSpecTypes enumeration under `parent`, identifiers fixed
/// so models written by different tools agree on register types.
pub fn add_sunspec_types(tree: &mut Tree, parent: NodeId) -> NodeId {
    let enumeration = tree.append_child(
        parent,
        NodeData::Enumeration(Enumeration {
            uuid: Some(SUNSPEC_TYPES_UUID),
            ..Enumeration::named("SunSpecTypes")
        }),
    );
    for &(name, value, uuid) in SUNSPEC_TYPES {
        tree.append_child(
            enumeration,
            NodeData::Enumerator(Enumerator {
                uuid: Some(uuid),
                ..Enumerator::new(name, value)
            }),
        );
    }
    enumeration
}

// ── Block and model length checks ───────────────────────────────────────────

/// Sum the data point sizes of one block, failing on the first point whose
/// size disagrees with its register type. String points are exempt, their
/// size is free.
pub fn check_block(
    sunspec: &Tree,
    block: NodeId,
    types: &IdentityIndex,
    parameters: &Tree,
) -> Result<u16, SunSpecError> {
    let mut length = 0u16;
    for &child in sunspec.children(block) {
        let NodeData::DataPoint(point) = sunspec.data(child) else {
            continue;
        };
        if let Some(type_uuid) = point.type_uuid {
            let type_node = parameters.data(types.resolve(type_uuid)?);
            let NodeData::Enumerator(enumerator) = type_node else {
                return Err(SunSpecError::WrongKind {
                    uuid: type_uuid,
                    expected: NodeKind::Enumerator,
                    actual: type_node.kind(),
                });
            };
            if enumerator.name != "string" && i64::from(point.size) != enumerator.value {
                return Err(SunSpecError::MismatchedSizeAndType {
                    type_name: enumerator.name.clone(),
                    expected: enumerator.value,
                    actual: point.size,
                });
            }
        }
        length += point.size;
    }
    Ok(length)
}

/// Total register length of a model: the sum over all of its blocks. A
/// repeating-block reference delegates to its referent, so a model that
/// shares a table's block counts the block's registers as its own.
pub fn check_offsets_and_length(
    sunspec: &Tree,
    model: NodeId,
    parameters: &Tree,
) -> Result<u16, SunSpecError> {
    let types = IdentityIndex::build(parameters)?;
    let local = IdentityIndex::build(sunspec)?;
    let mut length = 0u16;
    for &block in sunspec.children(model) {
        let block = match sunspec.data(block) {
            NodeData::TableRepeatingBlockReference(reference) => {
                let Some(original) = reference.original else {
                    return Err(SunSpecError::Consistency(format!(
                        "repeating block reference {:?} has no referent",
                        reference.name,
                    )));
                };
                let referent = local.resolve(original)?;
                if sunspec.kind(referent) != NodeKind::TableRepeatingBlock {
                    return Err(SunSpecError::WrongKind {
                        uuid: original,
                        expected: NodeKind::TableRepeatingBlock,
                        actual: sunspec.kind(referent),
                    });
                }
                referent
            }
            _ => block,
        };
        length += check_block(sunspec, block, &types, parameters)?;
    }
    Ok(length)
}

// ── Header block ────────────────────────────────────────────────────────────

/// Append the standard ID and Length points to a header block, creating
/// their backing parameters under `parameter_parent`. Returns the ID and
/// Length parameter identifiers.
pub fn add_header_points(
    sunspec: &mut Tree,
    header: NodeId,
    parameters: &mut Tree,
    parameter_parent: NodeId,
    model_id: u16,
) -> (Uuid, Uuid) {
    let id_uuid = Uuid::new_v4();
    parameters.append_child(
        parameter_parent,
        NodeData::Parameter(Parameter {
            abbreviation: Some("ID".to_owned()),
            read_only: true,
            uuid: Some(id_uuid),
            ..Parameter::named(model_id.to_string())
        }),
    );

    let length_uuid = Uuid::new_v4();
    parameters.append_child(
        parameter_parent,
        NodeData::Parameter(Parameter {
            abbreviation: Some("L".to_owned()),
            comment: Some("Model Length".to_owned()),
            read_only: true,
            uuid: Some(length_uuid),
            ..Parameter::named("")
        }),
    );

    for (block_offset, parameter_uuid) in [(0, id_uuid), (1, length_uuid)] {
        sunspec.append_child(
            header,
            NodeData::DataPoint(DataPoint {
                block_offset,
                size: 1,
                type_uuid: Some(UINT16_UUID),
                parameter_uuid: Some(parameter_uuid),
                mandatory: true,
                ..DataPoint::default()
            }),
        );
    }

    (id_uuid, length_uuid)
}

// ── Table resynchronization ─────────────────────────────────────────────────

/// Rebuild a SunSpec table from its referenced parameter table. A caller
/// that already resolved the source passes it as `source`; an explicit
/// source whose identity disagrees with the table's own reference is a
/// `Consistency` fault, reported before anything is touched.
///
/// Master data points come first, one per source array, keyed by the
/// array's template element. Then one repeating block per axis combination
/// (combinations on a non-first "Curves" layer collapse into the first),
/// each block holding one point per generated element, register type
/// copied from the master. Old blocks are matched by combination path and
/// old points by parameter reference; anything unmatched is discarded.
pub fn update_table(
    sunspec: &mut Tree,
    table: NodeId,
    parameters: &Tree,
    source: Option<Uuid>,
) -> Result<(), SunSpecError> {
    let NodeData::SunSpecTable(data) = sunspec.data(table) else {
        return Err(SunSpecError::Consistency(
            "update_table requires a sunspec table node".to_owned(),
        ));
    };
    let reference = data.parameter_table_uuid;
    if let Some(explicit) = source {
        if reference != Some(explicit) {
            return Err(SunSpecError::Consistency(format!(
                "source table {explicit} disagrees with the table's own reference",
            )));
        }
    }

    // Flatten the old contents into free-floating nodes, keyed for reuse.
    let mut free = Vec::new();
    let mut stack = sunspec.detach_children(table);
    while let Some(id) = stack.pop() {
        stack.extend(sunspec.detach_children(id));
        free.push(id);
    }

    let mut blocks_by_path: HashMap<Vec<Uuid>, NodeId> = HashMap::new();
    let mut points_by_reference: HashMap<Uuid, NodeId> = HashMap::new();
    for &id in &free {
        match sunspec.data(id) {
            NodeData::TableRepeatingBlock(block) => {
                blocks_by_path.insert(block.path.clone(), id);
            }
            NodeData::DataPoint(point) => {
                if let Some(key) = point.parameter_uuid.or(point.uuid) {
                    points_by_reference.insert(key, id);
                }
            }
            _ => {}
        }
    }
    let mut used: HashSet<NodeId> = HashSet::new();

    let result = rebuild(
        sunspec,
        table,
        parameters,
        reference,
        &blocks_by_path,
        &points_by_reference,
        &mut used,
    );

    for id in free {
        if !used.contains(&id) {
            sunspec.remove(id);
        }
    }

    result
}

fn rebuild(
    sunspec: &mut Tree,
    table: NodeId,
    parameters: &Tree,
    reference: Option<Uuid>,
    blocks_by_path: &HashMap<Vec<Uuid>, NodeId>,
    points_by_reference: &HashMap<Uuid, NodeId>,
    used: &mut HashSet<NodeId>,
) -> Result<(), SunSpecError> {
    let Some(parameter_table_uuid) = reference else {
        return Ok(());
    };

    let index = IdentityIndex::build(parameters)?;
    let source = index.resolve(parameter_table_uuid)?;
    if parameters.kind(source) != NodeKind::ParameterTable {
        return Err(SunSpecError::WrongKind {
            uuid: parameter_table_uuid,
            expected: NodeKind::ParameterTable,
            actual: parameters.kind(source),
        });
    }

    // One master point per source array, keyed by its template element.
    let mut masters_by_template: HashMap<Uuid, NodeId> = HashMap::new();
    for &child in parameters.children(source) {
        if parameters.kind(child) != NodeKind::Array {
            continue;
        }
        let Some(&template) = parameters.children(child).first() else {
            continue;
        };
        let Some(template_uuid) = parameters.data(template).uuid() else {
            continue;
        };

        let point = match points_by_reference.get(&template_uuid) {
            Some(&existing) => {
                used.insert(existing);
                sunspec.attach_child(table, existing);
                existing
            }
            None => sunspec.append_child(
                table,
                NodeData::DataPoint(DataPoint {
                    parameter_uuid: Some(template_uuid),
                    ..DataPoint::default()
                }),
            ),
        };
        masters_by_template.insert(template_uuid, point);
    }

    for combination in combinations(parameters, source) {
        // A non-first member of a "Curves" axis repeats the first curve's
        // layout; only the first gets a block.
        let skip = combination.iter().any(|&(axis, layer)| {
            parameters.data(axis).name() == "Curves"
                && parameters.children(axis).first() != Some(&layer)
        });
        if skip {
            continue;
        }

        let path: Vec<Uuid> = combination
            .iter()
            .filter_map(|&(_, layer)| parameters.data(layer).uuid())
            .collect();

        let block = match blocks_by_path.get(&path) {
            Some(&existing) => {
                used.insert(existing);
                sunspec.attach_child(table, existing);
                existing
            }
            None => {
                let name = combination
                    .iter()
                    .filter(|&&(axis, _)| parameters.data(axis).name() != "Curves")
                    .map(|&(_, layer)| parameters.data(layer).name().to_owned())
                    .collect::<Vec<_>>()
                    .join(" - ");
                sunspec.append_child(
                    table,
                    NodeData::TableRepeatingBlock(TableRepeatingBlock {
                        name,
                        path: path.clone(),
                        ..TableRepeatingBlock::default()
                    }),
                )
            }
        };

        let in_tree = find_group_by_path(parameters, source, &path)
            .ok_or_else(|| SunSpecError::MissingCombinationGroup(path.clone()))?;

        // Position-major over the generated arrays: element i of every
        // array before element i+1 of any.
        let arrays: Vec<NodeId> = parameters
            .children(in_tree)
            .iter()
            .copied()
            .filter(|&child| is_generated_array(parameters, child, &index))
            .collect();
        let rows = arrays
            .iter()
            .map(|&a| parameters.children(a).len())
            .min()
            .unwrap_or(0);

        for row in 0..rows {
            for &array in &arrays {
                let element = parameters.children(array)[row];
                let NodeData::ArrayParameterElement(data) = parameters.data(element) else {
                    continue;
                };
                let Some(element_uuid) = data.uuid else {
                    continue;
                };

                let Some(&template) = parameters.children(array).first() else {
                    continue;
                };
                let template_original = match parameters.data(template) {
                    NodeData::ArrayParameterElement(t) => t.original,
                    _ => None,
                };
                let Some(template_original) = template_original else {
                    return Err(SunSpecError::Consistency(format!(
                        "generated array under {} has no template reference",
                        parameters.data(in_tree).name(),
                    )));
                };
                let &master = masters_by_template.get(&template_original).ok_or_else(|| {
                    SunSpecError::Consistency(format!(
                        "no master data point for template {template_original}",
                    ))
                })?;
                let type_uuid = match sunspec.data(master) {
                    NodeData::DataPoint(p) => p.type_uuid,
                    _ => None,
                };

                match points_by_reference.get(&element_uuid) {
                    Some(&existing) => {
                        used.insert(existing);
                        if let NodeData::DataPoint(p) = sunspec.data_mut(existing) {
                            p.parameter_uuid = Some(element_uuid);
                            p.type_uuid = type_uuid;
                        }
                        sunspec.attach_child(block, existing);
                    }
                    None => {
                        sunspec.append_child(
                            block,
                            NodeData::DataPoint(DataPoint {
                                parameter_uuid: Some(element_uuid),
                                type_uuid,
                                ..DataPoint::default()
                            }),
                        );
                    }
                }
            }
        }
    }

    tracing::debug!(
        blocks = sunspec.children(table).len(),
        "resynchronized sunspec table"
    );
    Ok(())
}

/// Cross-product of the table's enumeration axes, later axes varying
/// fastest. Each member is (axis, enumerator).
fn combinations(parameters: &Tree, table: NodeId) -> Vec<Vec<(NodeId, NodeId)>> {
    let axes: Vec<NodeId> = parameters
        .children(table)
        .iter()
        .copied()
        .filter(|&child| parameters.kind(child) == NodeKind::Enumeration)
        .collect();
    if axes.is_empty() {
        return Vec::new();
    }

    let mut result: Vec<Vec<(NodeId, NodeId)>> = vec![Vec::new()];
    for &axis in &axes {
        let layers = parameters.children(axis);
        let mut next = Vec::with_capacity(result.len() * layers.len());
        for partial in &result {
            for &layer in layers {
                let mut extended = partial.clone();
                extended.push((axis, layer));
                next.push(extended);
            }
        }
        result = next;
    }
    result
}

fn find_group_by_path(parameters: &Tree, table: NodeId, path: &[Uuid]) -> Option<NodeId> {
    parameters.preorder(table).find(|&id| match parameters.data(id) {
        NodeData::Group(g) => g.path == path,
        _ => false,
    })
}

fn is_generated_array(parameters: &Tree, id: NodeId, index: &IdentityIndex) -> bool {
    let NodeData::ArrayGroupElement(element) = parameters.data(id) else {
        return false;
    };
    let Some(original) = element.original else {
        return false;
    };
    index
        .resolve(original)
        .map(|source| parameters.kind(source) == NodeKind::Array)
        .unwrap_or(false)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::repair_identifiers;
    use crate::node::{
        Array, ArrayGroupElement, ArrayParameterElement, FixedBlock, Group, HeaderBlock,
        ParameterTable, Root, SunSpecModel, SunSpecTable, TableRepeatingBlockReference,
    };

    #[test]
    fn types_enumeration_is_stable() {
        let mut tree = Tree::new(NodeData::Root(Root::new("Parameters")));
        let root = tree.root();
        let enumeration = add_sunspec_types(&mut tree, root);

        assert_eq!(tree.data(enumeration).uuid(), Some(SUNSPEC_TYPES_UUID));
        assert_eq!(tree.children(enumeration).len(), 11);

        let string = tree
            .children(enumeration)
            .iter()
            .find(|&&id| tree.data(id).name() == "string")
            .copied()
            .unwrap();
        let NodeData::Enumerator(e) = tree.data(string) else {
            panic!("expected an enumerator");
        };
        assert_eq!(e.value, 0);
        assert_eq!(e.uuid, Some(STRING_UUID));
    }

    fn parameter_tree_with_types() -> Tree {
        let mut tree = Tree::new(NodeData::Root(Root::new("Parameters")));
        let root = tree.root();
        add_sunspec_types(&mut tree, root);
        tree
    }

    #[test]
    fn header_points_and_length_check() {
        let parameters = &mut parameter_tree_with_types();
        let parameter_parent = parameters.root();

        let mut sunspec = Tree::new(NodeData::Root(Root::new("SunSpec")));
        let model = sunspec.append_child(
            sunspec.root(),
            NodeData::SunSpecModel(SunSpecModel {
                id: 103,
                ..SunSpecModel::default()
            }),
        );
        let header = sunspec.append_child(model, NodeData::HeaderBlock(HeaderBlock::default()));
        sunspec.append_child(model, NodeData::FixedBlock(FixedBlock::default()));

        let (id_uuid, length_uuid) =
            add_header_points(&mut sunspec, header, parameters, parameter_parent, 103);
        assert_ne!(id_uuid, length_uuid);
        assert_eq!(sunspec.children(header).len(), 2);

        let length = check_offsets_and_length(&sunspec, model, parameters).unwrap();
        assert_eq!(length, 2);
    }

    #[test]
    fn size_type_mismatch_is_reported() {
        let parameters = &parameter_tree_with_types();

        let mut sunspec = Tree::new(NodeData::Root(Root::new("SunSpec")));
        let model =
            sunspec.append_child(sunspec.root(), NodeData::SunSpecModel(SunSpecModel::default()));
        let fixed = sunspec.append_child(model, NodeData::FixedBlock(FixedBlock::default()));
        sunspec.append_child(
            fixed,
            NodeData::DataPoint(DataPoint {
                size: 1,
                type_uuid: Some(UINT32_UUID),
                ..DataPoint::default()
            }),
        );

        assert!(matches!(
            check_offsets_and_length(&sunspec, model, parameters),
            Err(SunSpecError::MismatchedSizeAndType {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn string_points_have_free_size() {
        let parameters = &parameter_tree_with_types();

        let mut sunspec = Tree::new(NodeData::Root(Root::new("SunSpec")));
        let model =
            sunspec.append_child(sunspec.root(), NodeData::SunSpecModel(SunSpecModel::default()));
        let fixed = sunspec.append_child(model, NodeData::FixedBlock(FixedBlock::default()));
        sunspec.append_child(
            fixed,
            NodeData::DataPoint(DataPoint {
                size: 8,
                type_uuid: Some(STRING_UUID),
                ..DataPoint::default()
            }),
        );

        assert_eq!(
            check_offsets_and_length(&sunspec, model, parameters).unwrap(),
            8
        );
    }

    #[test]
    fn model_length_follows_a_repeating_block_reference() {
        let parameters = &parameter_tree_with_types();

        let mut sunspec = Tree::new(NodeData::Root(Root::new("SunSpec")));
        let table = sunspec.append_child(
            sunspec.root(),
            NodeData::SunSpecTable(SunSpecTable::default()),
        );
        let block_uuid = Uuid::new_v4();
        let block = sunspec.append_child(
            table,
            NodeData::TableRepeatingBlock(TableRepeatingBlock {
                uuid: Some(block_uuid),
                ..TableRepeatingBlock::default()
            }),
        );
        sunspec.append_child(
            block,
            NodeData::DataPoint(DataPoint {
                size: 2,
                type_uuid: Some(UINT32_UUID),
                ..DataPoint::default()
            }),
        );

        let model =
            sunspec.append_child(sunspec.root(), NodeData::SunSpecModel(SunSpecModel::default()));
        let header = sunspec.append_child(model, NodeData::HeaderBlock(HeaderBlock::default()));
        sunspec.append_child(
            header,
            NodeData::DataPoint(DataPoint {
                size: 1,
                type_uuid: Some(UINT16_UUID),
                ..DataPoint::default()
            }),
        );
        sunspec.append_child(model, NodeData::FixedBlock(FixedBlock::default()));
        sunspec.append_child(
            model,
            NodeData::TableRepeatingBlockReference(TableRepeatingBlockReference {
                original: Some(block_uuid),
                ..TableRepeatingBlockReference::default()
            }),
        );

        // header word plus the referenced block's two registers
        assert_eq!(
            check_offsets_and_length(&sunspec, model, parameters).unwrap(),
            3
        );
    }

    #[test]
    fn block_reference_without_a_referent_fails_the_length_check() {
        let parameters = &parameter_tree_with_types();

        let mut sunspec = Tree::new(NodeData::Root(Root::new("SunSpec")));
        let model =
            sunspec.append_child(sunspec.root(), NodeData::SunSpecModel(SunSpecModel::default()));
        sunspec.append_child(
            model,
            NodeData::TableRepeatingBlockReference(TableRepeatingBlockReference::default()),
        );

        assert!(matches!(
            check_offsets_and_length(&sunspec, model, parameters),
            Err(SunSpecError::Consistency(_))
        ));
    }

    struct TableFixture {
        parameters: Tree,
        table_uuid: Uuid,
        template_uuid: Uuid,
        element_uuids: Vec<Uuid>,
    }

    /// One source array (template + one mirror), axes Curves {C1, C2} and
    /// Points {First, Second}, and generated groups for the two first-curve
    /// combinations, each holding one generated array with two elements.
    fn table_fixture() -> TableFixture {
        let mut tree = Tree::new(NodeData::Root(Root::new("Parameters")));
        let root = tree.root();
        let table = tree.append_child(
            root,
            NodeData::ParameterTable(ParameterTable::named("Frequency Table")),
        );

        let curves = tree.append_child(table, NodeData::Enumeration(Enumeration::named("Curves")));
        let curve_1 = tree.append_child(curves, NodeData::Enumerator(Enumerator::new("1", 0)));
        let curve_2 = tree.append_child(curves, NodeData::Enumerator(Enumerator::new("2", 1)));

        let points = tree.append_child(table, NodeData::Enumeration(Enumeration::named("Points")));
        let first = tree.append_child(points, NodeData::Enumerator(Enumerator::new("First", 0)));
        let second = tree.append_child(points, NodeData::Enumerator(Enumerator::new("Second", 1)));

        let array = tree.append_child(table, NodeData::Array(Array::named("Frequency")));
        let template = tree.append_child(
            array,
            NodeData::Parameter(Parameter::named("Frequency Template")),
        );

        repair_identifiers(&mut tree).unwrap();
        let array_uuid = tree.data(array).uuid().unwrap();
        let template_uuid = tree.data(template).uuid().unwrap();
        let layer_uuids: Vec<Uuid> = [curve_1, curve_2, first, second]
            .iter()
            .map(|&id| tree.data(id).uuid().unwrap())
            .collect();

        let mut element_uuids = Vec::new();
        for &point_layer in &[2usize, 3] {
            let path = vec![layer_uuids[0], layer_uuids[point_layer]];
            let group = tree.append_child(
                table,
                NodeData::Group(Group {
                    path: path.clone(),
                    ..Group::named("Generated")
                }),
            );
            let generated = tree.append_child(
                group,
                NodeData::ArrayGroupElement(ArrayGroupElement {
                    original: Some(array_uuid),
                    ..ArrayGroupElement::default()
                }),
            );
            for index in 0..2 {
                let uuid = Uuid::new_v4();
                let mut element_path = path.clone();
                element_path.push(uuid);
                tree.append_child(
                    generated,
                    NodeData::ArrayParameterElement(ArrayParameterElement {
                        original: Some(template_uuid),
                        path: element_path,
                        uuid: Some(uuid),
                        name: format!("Element {index}"),
                        ..ArrayParameterElement::default()
                    }),
                );
                element_uuids.push(uuid);
            }
        }

        let table_uuid = tree.data(table).uuid().unwrap();
        TableFixture {
            parameters: tree,
            table_uuid,
            template_uuid,
            element_uuids,
        }
    }

    fn sunspec_with_table(table_uuid: Uuid) -> (Tree, NodeId) {
        let mut sunspec = Tree::new(NodeData::Root(Root::new("SunSpec")));
        let table = sunspec.append_child(
            sunspec.root(),
            NodeData::SunSpecTable(SunSpecTable {
                parameter_table_uuid: Some(table_uuid),
                ..SunSpecTable::default()
            }),
        );
        (sunspec, table)
    }

    #[test]
    fn update_builds_masters_and_first_curve_blocks() {
        let fixture = table_fixture();
        let (mut sunspec, table) = sunspec_with_table(fixture.table_uuid);

        update_table(&mut sunspec, table, &fixture.parameters, None).unwrap();

        let children: Vec<NodeId> = sunspec.children(table).to_vec();
        // one master, then one block per Points layer on the first curve
        assert_eq!(children.len(), 3);

        let NodeData::DataPoint(master) = sunspec.data(children[0]) else {
            panic!("expected the master data point first");
        };
        assert_eq!(master.parameter_uuid, Some(fixture.template_uuid));

        for (block, expected_name) in children[1..].iter().zip(["First", "Second"]) {
            let NodeData::TableRepeatingBlock(data) = sunspec.data(*block) else {
                panic!("expected a repeating block");
            };
            assert_eq!(data.name, expected_name);
            assert_eq!(sunspec.children(*block).len(), 2);
        }

        let point_uuids: Vec<Uuid> = children[1..]
            .iter()
            .flat_map(|&block| sunspec.children(block).iter().copied())
            .map(|point| match sunspec.data(point) {
                NodeData::DataPoint(p) => p.parameter_uuid.unwrap(),
                _ => panic!("expected data points"),
            })
            .collect();
        assert_eq!(point_uuids, fixture.element_uuids);
    }

    #[test]
    fn update_reuses_blocks_and_points() {
        let fixture = table_fixture();
        let (mut sunspec, table) = sunspec_with_table(fixture.table_uuid);

        update_table(&mut sunspec, table, &fixture.parameters, None).unwrap();
        let before: Vec<NodeId> = sunspec.children(table).to_vec();

        update_table(&mut sunspec, table, &fixture.parameters, None).unwrap();
        let after: Vec<NodeId> = sunspec.children(table).to_vec();

        assert_eq!(before, after);
    }

    #[test]
    fn explicit_source_must_match_the_table_reference() {
        let fixture = table_fixture();
        let (mut sunspec, table) = sunspec_with_table(fixture.table_uuid);

        update_table(
            &mut sunspec,
            table,
            &fixture.parameters,
            Some(fixture.table_uuid),
        )
        .unwrap();
        let before: Vec<NodeId> = sunspec.children(table).to_vec();
        assert_eq!(before.len(), 3);

        assert!(matches!(
            update_table(&mut sunspec, table, &fixture.parameters, Some(Uuid::new_v4())),
            Err(SunSpecError::Consistency(_))
        ));
        // a rejected source leaves the table untouched
        assert_eq!(sunspec.children(table), before.as_slice());
    }

    #[test]
    fn update_propagates_master_register_type() {
        let fixture = table_fixture();
        let (mut sunspec, table) = sunspec_with_table(fixture.table_uuid);

        update_table(&mut sunspec, table, &fixture.parameters, None).unwrap();
        let master = sunspec.children(table)[0];
        if let NodeData::DataPoint(p) = sunspec.data_mut(master) {
            p.type_uuid = Some(INT16_UUID);
        }

        update_table(&mut sunspec, table, &fixture.parameters, None).unwrap();
        for &block in &sunspec.children(table).to_vec()[1..] {
            for &point in sunspec.children(block) {
                let NodeData::DataPoint(p) = sunspec.data(point) else {
                    panic!("expected data points");
                };
                assert_eq!(p.type_uuid, Some(INT16_UUID));
            }
        }
    }

    #[test]
    fn update_without_reference_empties_the_table() {
        let fixture = table_fixture();
        let (mut sunspec, table) = sunspec_with_table(fixture.table_uuid);
        update_table(&mut sunspec, table, &fixture.parameters, None).unwrap();

        if let NodeData::SunSpecTable(t) = sunspec.data_mut(table) {
            t.parameter_table_uuid = None;
        }
        update_table(&mut sunspec, table, &fixture.parameters, None).unwrap();
        assert!(sunspec.children(table).is_empty());
    }

    #[test]
    fn dangling_table_reference_is_an_identity_error() {
        let fixture = table_fixture();
        let (mut sunspec, table) = sunspec_with_table(Uuid::new_v4());

        assert!(matches!(
            update_table(&mut sunspec, table, &fixture.parameters, None),
            Err(SunSpecError::Identity(IdentityError::NotFound(_)))
        ));
    }
}
