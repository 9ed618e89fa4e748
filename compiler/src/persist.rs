// persist.rs — Tagged JSON form of a model tree
//
// The interchange form is a nested record per node with a `_type`
// discriminator, children inline, UUIDs as canonical strings, and decimals
// as string literals so values survive round-trips exactly. Loading routes
// every numeric range field through the validated entity setters, so the
// min/max cross-clamp fires on load just as it does on edit, and fails
// fast on duplicate identifiers or broken array mirroring. Array lengths
// are derived from the child count, never trusted from the file.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::array::{self, ArrayError};
use crate::id::NodeId;
use crate::identity::{repair_identifiers, IdentityError};
use crate::node::{
    AccessLevel, AccessLevels, Array, ArrayGroupElement, ArrayParameterElement, DataPoint,
    Enumeration, Enumerator, FixedBlock, Group, HeaderBlock, Message, MultiplexedMessage,
    Multiplexer, NodeData, NodeKind, Parameter, ParameterTable, Root, Signal, SunSpecModel,
    SunSpecTable, TableRepeatingBlock, TableRepeatingBlockReference,
};
use crate::tree::Tree;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed model file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Array(#[from] ArrayError),
    #[error("expected a root record at the top level, got {0:?}")]
    NotARoot(NodeKind),
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_true(v: &bool) -> bool {
    *v
}

fn decimal_is_one(v: &Decimal) -> bool {
    *v == Decimal::ONE
}

fn decimal_one() -> Decimal {
    Decimal::ONE
}

fn default_true() -> bool {
    true
}

/// One persisted node. Field names and the `_type` tags are the stable
/// interchange contract; everything structural is carried by `children`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum NodeRecord {
    #[serde(rename = "root")]
    Root {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "group")]
    Group {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_name: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        path: Vec<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "parameter")]
    Parameter {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        abbreviation: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_name: Option<String>,
        #[serde(
            default,
            with = "rust_decimal::serde::str_option",
            skip_serializing_if = "Option::is_none"
        )]
        default: Option<Decimal>,
        #[serde(
            default,
            with = "rust_decimal::serde::str_option",
            skip_serializing_if = "Option::is_none"
        )]
        minimum: Option<Decimal>,
        #[serde(
            default,
            with = "rust_decimal::serde::str_option",
            skip_serializing_if = "Option::is_none"
        )]
        maximum: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        units: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enumeration_uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_level_uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "is_false")]
        nv: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nv_format: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        nv_cast: bool,
        #[serde(
            default,
            with = "rust_decimal::serde::str_option",
            skip_serializing_if = "Option::is_none"
        )]
        nv_factor: Option<Decimal>,
        #[serde(default, skip_serializing_if = "is_false")]
        read_only: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        factory: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        display_hexadecimal: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        decimal_places: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "array")]
    Array {
        name: String,
        length: usize,
        #[serde(default = "default_true", skip_serializing_if = "is_true")]
        named_enumerators: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "array_parameter_element")]
    ArrayParameterElement {
        name: String,
        #[serde(
            default,
            with = "rust_decimal::serde::str_option",
            skip_serializing_if = "Option::is_none"
        )]
        default: Option<Decimal>,
        #[serde(
            default,
            with = "rust_decimal::serde::str_option",
            skip_serializing_if = "Option::is_none"
        )]
        minimum: Option<Decimal>,
        #[serde(
            default,
            with = "rust_decimal::serde::str_option",
            skip_serializing_if = "Option::is_none"
        )]
        maximum: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        path: Vec<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "array_group_element")]
    ArrayGroupElement {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        path: Vec<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "enumeration")]
    Enumeration {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "enumerator")]
    Enumerator {
        name: String,
        value: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
    },
    #[serde(rename = "access_levels")]
    AccessLevels {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "access_level")]
    AccessLevel {
        name: String,
        value: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
    },
    #[serde(rename = "parameter_table")]
    ParameterTable {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "message")]
    Message {
        name: String,
        identifier: u32,
        #[serde(default = "default_true", skip_serializing_if = "is_true")]
        extended: bool,
        length: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cycle_time: Option<u32>,
        #[serde(default = "default_true", skip_serializing_if = "is_true")]
        receivable: bool,
        #[serde(default = "default_true", skip_serializing_if = "is_true")]
        sendable: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "multiplexed_message")]
    MultiplexedMessage {
        name: String,
        identifier: u32,
        #[serde(default = "default_true", skip_serializing_if = "is_true")]
        extended: bool,
        #[serde(default = "default_true", skip_serializing_if = "is_true")]
        receivable: bool,
        #[serde(default = "default_true", skip_serializing_if = "is_true")]
        sendable: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "multiplexer")]
    Multiplexer {
        name: String,
        identifier: u16,
        length: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cycle_time: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "signal")]
    Signal {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameter_uuid: Option<Uuid>,
        bits: u8,
        start_bit: u16,
        #[serde(default, skip_serializing_if = "is_false")]
        signed: bool,
        #[serde(
            default = "decimal_one",
            with = "rust_decimal::serde::str",
            skip_serializing_if = "decimal_is_one"
        )]
        factor: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
    },
    #[serde(rename = "sunspec_model")]
    SunSpecModel {
        id: u16,
        length: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "sunspec_header_block")]
    HeaderBlock {
        name: String,
        offset: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "sunspec_fixed_block")]
    FixedBlock {
        name: String,
        offset: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "sunspec_table_repeating_block")]
    TableRepeatingBlock {
        name: String,
        offset: u16,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        path: Vec<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
    #[serde(rename = "sunspec_table_repeating_block_reference")]
    TableRepeatingBlockReference {
        name: String,
        offset: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
    },
    #[serde(rename = "data_point")]
    DataPoint {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameter_uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        factor_uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enumeration_uuid: Option<Uuid>,
        block_offset: u16,
        size: u16,
        #[serde(default = "default_true", skip_serializing_if = "is_true")]
        mandatory: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        get: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        set: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
    },
    #[serde(rename = "sunspec_table")]
    SunSpecTable {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameter_table_uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeRecord>,
    },
}

// ── Load ────────────────────────────────────────────────────────────────────

/// Parse a model file. After structural construction the identifier repair
/// pass runs, every array's mirroring is checked, and array lengths are
/// reset to the observed child counts.
pub fn from_str(text: &str) -> Result<Tree, LoadError> {
    let record: NodeRecord = serde_json::from_str(text)?;
    from_record(record)
}

pub fn from_record(record: NodeRecord) -> Result<Tree, LoadError> {
    let NodeRecord::Root { name, uuid, children } = record else {
        let (data, _) = split(record);
        return Err(LoadError::NotARoot(data.kind()));
    };

    let mut tree = Tree::new(NodeData::Root(Root { name, uuid }));
    let root = tree.root();
    for child in children {
        insert(&mut tree, root, child);
    }

    repair_identifiers(&mut tree)?;

    let arrays: Vec<NodeId> = tree
        .preorder(tree.root())
        .filter(|&id| tree.kind(id) == NodeKind::Array)
        .collect();
    for id in arrays {
        array::check_mirroring(&tree, id)?;
        let observed = tree.children(id).len();
        if let NodeData::Array(a) = tree.data_mut(id) {
            a.length = observed;
        }
    }

    tracing::debug!(nodes = tree.len(), "loaded model tree");
    Ok(tree)
}

fn insert(tree: &mut Tree, parent: NodeId, record: NodeRecord) {
    let (data, children) = split(record);
    let id = tree.append_child(parent, data);
    for child in children {
        insert(tree, id, child);
    }
}

/// Turn a record into node data plus its child records, applying the
/// validated setters for range fields.
fn split(record: NodeRecord) -> (NodeData, Vec<NodeRecord>) {
    match record {
        NodeRecord::Root { name, uuid, children } => {
            (NodeData::Root(Root { name, uuid }), children)
        }
        NodeRecord::Group {
            name,
            type_name,
            path,
            uuid,
            children,
        } => (
            NodeData::Group(Group {
                name,
                type_name,
                path,
                uuid,
            }),
            children,
        ),
        NodeRecord::Parameter {
            name,
            abbreviation,
            type_name,
            default,
            minimum,
            maximum,
            units,
            enumeration_uuid,
            access_level_uuid,
            nv,
            nv_format,
            nv_cast,
            nv_factor,
            read_only,
            factory,
            display_hexadecimal,
            decimal_places,
            comment,
            uuid,
            children,
        } => {
            let mut parameter = Parameter {
                name,
                abbreviation,
                type_name,
                default,
                units,
                enumeration_uuid,
                access_level_uuid,
                nv,
                nv_format,
                nv_cast,
                nv_factor,
                read_only,
                factory,
                display_hexadecimal,
                decimal_places,
                comment,
                uuid,
                ..Parameter::default()
            };
            parameter.set_minimum(minimum);
            parameter.set_maximum(maximum);
            (NodeData::Parameter(parameter), children)
        }
        NodeRecord::Array {
            name,
            length,
            named_enumerators,
            uuid,
            children,
        } => (
            NodeData::Array(Array {
                name,
                length,
                named_enumerators,
                uuid,
            }),
            children,
        ),
        NodeRecord::ArrayParameterElement {
            name,
            default,
            minimum,
            maximum,
            original,
            path,
            uuid,
            children,
        } => {
            let mut element = ArrayParameterElement {
                name,
                default,
                original,
                path,
                uuid,
                ..ArrayParameterElement::default()
            };
            element.set_minimum(minimum);
            element.set_maximum(maximum);
            (NodeData::ArrayParameterElement(element), children)
        }
        NodeRecord::ArrayGroupElement {
            name,
            original,
            path,
            uuid,
            children,
        } => (
            NodeData::ArrayGroupElement(ArrayGroupElement {
                name,
                original,
                path,
                uuid,
            }),
            children,
        ),
        NodeRecord::Enumeration { name, uuid, children } => {
            (NodeData::Enumeration(Enumeration { name, uuid }), children)
        }
        NodeRecord::Enumerator { name, value, uuid } => (
            NodeData::Enumerator(Enumerator { name, value, uuid }),
            Vec::new(),
        ),
        NodeRecord::AccessLevels {
            name,
            default_uuid,
            uuid,
            children,
        } => (
            NodeData::AccessLevels(AccessLevels {
                name,
                default_uuid,
                uuid,
            }),
            children,
        ),
        NodeRecord::AccessLevel { name, value, uuid } => (
            NodeData::AccessLevel(AccessLevel { name, value, uuid }),
            Vec::new(),
        ),
        NodeRecord::ParameterTable { name, uuid, children } => (
            NodeData::ParameterTable(ParameterTable { name, uuid }),
            children,
        ),
        NodeRecord::Message {
            name,
            identifier,
            extended,
            length,
            cycle_time,
            receivable,
            sendable,
            comment,
            uuid,
            children,
        } => (
            NodeData::Message(Message {
                name,
                identifier,
                extended,
                length,
                cycle_time,
                receivable,
                sendable,
                comment,
                uuid,
            }),
            children,
        ),
        NodeRecord::MultiplexedMessage {
            name,
            identifier,
            extended,
            receivable,
            sendable,
            comment,
            uuid,
            children,
        } => (
            NodeData::MultiplexedMessage(MultiplexedMessage {
                name,
                identifier,
                extended,
                receivable,
                sendable,
                comment,
                uuid,
            }),
            children,
        ),
        NodeRecord::Multiplexer {
            name,
            identifier,
            length,
            cycle_time,
            comment,
            uuid,
            children,
        } => (
            NodeData::Multiplexer(Multiplexer {
                name,
                identifier,
                length,
                cycle_time,
                comment,
                uuid,
            }),
            children,
        ),
        NodeRecord::Signal {
            name,
            parameter_uuid,
            bits,
            start_bit,
            signed,
            factor,
            uuid,
        } => (
            NodeData::Signal(Signal {
                name,
                parameter_uuid,
                bits,
                start_bit,
                signed,
                factor,
                uuid,
            }),
            Vec::new(),
        ),
        NodeRecord::SunSpecModel {
            id,
            length,
            uuid,
            children,
        } => (
            NodeData::SunSpecModel(SunSpecModel { id, length, uuid }),
            children,
        ),
        NodeRecord::HeaderBlock {
            name,
            offset,
            uuid,
            children,
        } => (
            NodeData::HeaderBlock(HeaderBlock { name, offset, uuid }),
            children,
        ),
        NodeRecord::FixedBlock {
            name,
            offset,
            uuid,
            children,
        } => (
            NodeData::FixedBlock(FixedBlock { name, offset, uuid }),
            children,
        ),
        NodeRecord::TableRepeatingBlock {
            name,
            offset,
            path,
            uuid,
            children,
        } => (
            NodeData::TableRepeatingBlock(TableRepeatingBlock {
                name,
                offset,
                path,
                uuid,
            }),
            children,
        ),
        NodeRecord::TableRepeatingBlockReference {
            name,
            offset,
            original,
            uuid,
        } => (
            NodeData::TableRepeatingBlockReference(TableRepeatingBlockReference {
                name,
                offset,
                original,
                uuid,
            }),
            Vec::new(),
        ),
        NodeRecord::DataPoint {
            parameter_uuid,
            type_uuid,
            factor_uuid,
            enumeration_uuid,
            block_offset,
            size,
            mandatory,
            get,
            set,
            uuid,
        } => (
            NodeData::DataPoint(DataPoint {
                parameter_uuid,
                type_uuid,
                factor_uuid,
                enumeration_uuid,
                block_offset,
                size,
                mandatory,
                get,
                set,
                uuid,
            }),
            Vec::new(),
        ),
        NodeRecord::SunSpecTable {
            name,
            parameter_table_uuid,
            uuid,
            children,
        } => (
            NodeData::SunSpecTable(SunSpecTable {
                name,
                parameter_table_uuid,
                uuid,
            }),
            children,
        ),
    }
}

// ── Dump ────────────────────────────────────────────────────────────────────

/// Serialize a whole tree to pretty JSON. Child order is tree order, so two
/// dumps of the same tree are byte-identical.
pub fn to_string_pretty(tree: &Tree) -> Result<String, LoadError> {
    let record = record_of(tree, tree.root());
    Ok(serde_json::to_string_pretty(&record)?)
}

pub fn record_of(tree: &Tree, id: NodeId) -> NodeRecord {
    let children: Vec<NodeRecord> = tree
        .children(id)
        .iter()
        .map(|&child| record_of(tree, child))
        .collect();

    match tree.data(id).clone() {
        NodeData::Root(n) => NodeRecord::Root {
            name: n.name,
            uuid: n.uuid,
            children,
        },
        NodeData::Group(n) => NodeRecord::Group {
            name: n.name,
            type_name: n.type_name,
            path: n.path,
            uuid: n.uuid,
            children,
        },
        NodeData::Parameter(n) => NodeRecord::Parameter {
            name: n.name,
            abbreviation: n.abbreviation,
            type_name: n.type_name,
            default: n.default,
            minimum: n.minimum,
            maximum: n.maximum,
            units: n.units,
            enumeration_uuid: n.enumeration_uuid,
            access_level_uuid: n.access_level_uuid,
            nv: n.nv,
            nv_format: n.nv_format,
            nv_cast: n.nv_cast,
            nv_factor: n.nv_factor,
            read_only: n.read_only,
            factory: n.factory,
            display_hexadecimal: n.display_hexadecimal,
            decimal_places: n.decimal_places,
            comment: n.comment,
            uuid: n.uuid,
            children,
        },
        NodeData::Array(n) => NodeRecord::Array {
            name: n.name,
            length: n.length,
            named_enumerators: n.named_enumerators,
            uuid: n.uuid,
            children,
        },
        NodeData::ArrayParameterElement(n) => NodeRecord::ArrayParameterElement {
            name: n.name,
            default: n.default,
            minimum: n.minimum,
            maximum: n.maximum,
            original: n.original,
            path: n.path,
            uuid: n.uuid,
            children,
        },
        NodeData::ArrayGroupElement(n) => NodeRecord::ArrayGroupElement {
            name: n.name,
            original: n.original,
            path: n.path,
            uuid: n.uuid,
            children,
        },
        NodeData::Enumeration(n) => NodeRecord::Enumeration {
            name: n.name,
            uuid: n.uuid,
            children,
        },
        NodeData::Enumerator(n) => NodeRecord::Enumerator {
            name: n.name,
            value: n.value,
            uuid: n.uuid,
        },
        NodeData::AccessLevels(n) => NodeRecord::AccessLevels {
            name: n.name,
            default_uuid: n.default_uuid,
            uuid: n.uuid,
            children,
        },
        NodeData::AccessLevel(n) => NodeRecord::AccessLevel {
            name: n.name,
            value: n.value,
            uuid: n.uuid,
        },
        NodeData::ParameterTable(n) => NodeRecord::ParameterTable {
            name: n.name,
            uuid: n.uuid,
            children,
        },
        NodeData::Message(n) => NodeRecord::Message {
            name: n.name,
            identifier: n.identifier,
            extended: n.extended,
            length: n.length,
            cycle_time: n.cycle_time,
            receivable: n.receivable,
            sendable: n.sendable,
            comment: n.comment,
            uuid: n.uuid,
            children,
        },
        NodeData::MultiplexedMessage(n) => NodeRecord::MultiplexedMessage {
            name: n.name,
            identifier: n.identifier,
            extended: n.extended,
            receivable: n.receivable,
            sendable: n.sendable,
            comment: n.comment,
            uuid: n.uuid,
            children,
        },
        NodeData::Multiplexer(n) => NodeRecord::Multiplexer {
            name: n.name,
            identifier: n.identifier,
            length: n.length,
            cycle_time: n.cycle_time,
            comment: n.comment,
            uuid: n.uuid,
            children,
        },
        NodeData::Signal(n) => NodeRecord::Signal {
            name: n.name,
            parameter_uuid: n.parameter_uuid,
            bits: n.bits,
            start_bit: n.start_bit,
            signed: n.signed,
            factor: n.factor,
            uuid: n.uuid,
        },
        NodeData::SunSpecModel(n) => NodeRecord::SunSpecModel {
            id: n.id,
            length: n.length,
            uuid: n.uuid,
            children,
        },
        NodeData::HeaderBlock(n) => NodeRecord::HeaderBlock {
            name: n.name,
            offset: n.offset,
            uuid: n.uuid,
            children,
        },
        NodeData::FixedBlock(n) => NodeRecord::FixedBlock {
            name: n.name,
            offset: n.offset,
            uuid: n.uuid,
            children,
        },
        NodeData::TableRepeatingBlock(n) => NodeRecord::TableRepeatingBlock {
            name: n.name,
            offset: n.offset,
            path: n.path,
            uuid: n.uuid,
            children,
        },
        NodeData::TableRepeatingBlockReference(n) => NodeRecord::TableRepeatingBlockReference {
            name: n.name,
            offset: n.offset,
            original: n.original,
            uuid: n.uuid,
        },
        NodeData::DataPoint(n) => NodeRecord::DataPoint {
            parameter_uuid: n.parameter_uuid,
            type_uuid: n.type_uuid,
            factor_uuid: n.factor_uuid,
            enumeration_uuid: n.enumeration_uuid,
            block_offset: n.block_offset,
            size: n.size,
            mandatory: n.mandatory,
            get: n.get,
            set: n.set,
            uuid: n.uuid,
        },
        NodeData::SunSpecTable(n) => NodeRecord::SunSpecTable {
            name: n.name,
            parameter_table_uuid: n.parameter_table_uuid,
            uuid: n.uuid,
            children,
        },
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
