// schema.rs — Declarative field schema and raw-value conversion
//
// Each node kind declares an ordered list of fields; each field names its
// serialization tag, a converter from raw text, and whether it is nullable.
// This is the seam an editing layer drives: `set_field` converts and
// assigns one field, rejecting the edit (existing value retained) on a bad
// literal. The min/max cross-clamp fires inside the entity setters, so it
// holds for every mutation path, including bulk load.
//
// Decimal-valued fields use exact decimal arithmetic throughout — generated
// comments and C defaults must reproduce the authored literal exactly, so
// binary floats never appear in the model.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::array::{self, ArrayError};
use crate::id::NodeId;
use crate::node::{NodeData, NodeKind};
use crate::tree::Tree;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),
    #[error("invalid boolean: {0:?}")]
    InvalidBoolean(String),
    #[error("invalid integer: {0:?}")]
    InvalidInteger(String),
    #[error("invalid identifier: {0:?}")]
    InvalidUuid(String),
    #[error("{kind:?} has no field {name:?}")]
    NoSuchField { kind: NodeKind, name: String },
    #[error(transparent)]
    Array(#[from] ArrayError),
}

// ── Converters ──────────────────────────────────────────────────────────────

/// Converter a field applies to raw text before assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    Str,
    OptStr,
    OptDecimal,
    Checkbox,
    Integer,
    OptUuid,
}

/// Exact-decimal conversion; blank means unset.
pub fn to_decimal_or_none(raw: &str) -> Result<Option<Decimal>, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(trimmed).map(Some).map_err(|_| FieldError::InvalidNumber(raw.to_owned()))
}

/// Blank collapses to `None`; anything else is kept verbatim.
pub fn to_str_or_none(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_owned())
    }
}

/// Two-state checkbox conversion used by every boolean flag.
pub fn two_state_checkbox(raw: &str) -> Result<bool, FieldError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "unchecked" => Ok(false),
        "1" | "true" | "checked" => Ok(true),
        _ => Err(FieldError::InvalidBoolean(raw.to_owned())),
    }
}

fn to_integer<T: FromStr>(raw: &str) -> Result<T, FieldError> {
    raw.trim().parse().map_err(|_| FieldError::InvalidInteger(raw.to_owned()))
}

fn to_uuid_or_none(raw: &str) -> Result<Option<Uuid>, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(trimmed).map(Some).map_err(|_| FieldError::InvalidUuid(raw.to_owned()))
}

// ── Field descriptors ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub tag: &'static str,
    pub converter: Converter,
    pub nullable: bool,
}

const fn field(name: &'static str, converter: Converter, nullable: bool) -> Field {
    Field {
        name,
        tag: name,
        converter,
        nullable,
    }
}

/// Ordered field list for a node kind, independent of any presentation
/// concern. Kinds without editable fields report an empty list.
pub fn fields(kind: NodeKind) -> &'static [Field] {
    use Converter::*;

    // Tables live in const items so the returned slices are 'static.
    const PARAMETER: &[Field] = &[
        field("name", Str, false),
        field("abbreviation", OptStr, true),
        field("type_name", OptStr, true),
        field("default", OptDecimal, true),
        field("minimum", OptDecimal, true),
        field("maximum", OptDecimal, true),
        field("units", OptStr, true),
        field("enumeration_uuid", OptUuid, true),
        field("access_level_uuid", OptUuid, true),
        field("nv", Checkbox, false),
        field("nv_format", OptStr, true),
        field("nv_cast", Checkbox, false),
        field("nv_factor", OptDecimal, true),
        field("read_only", Checkbox, false),
        field("factory", Checkbox, false),
        field("display_hexadecimal", Checkbox, false),
        field("decimal_places", Integer, true),
        field("comment", OptStr, true),
    ];
    const GROUP: &[Field] = &[
        field("name", Str, false),
        field("type_name", OptStr, true),
    ];
    const ARRAY: &[Field] = &[
        field("name", Str, false),
        field("length", Integer, false),
        field("named_enumerators", Checkbox, false),
    ];
    const ARRAY_PARAMETER_ELEMENT: &[Field] = &[
        field("name", Str, false),
        field("default", OptDecimal, true),
        field("minimum", OptDecimal, true),
        field("maximum", OptDecimal, true),
    ];
    const NAME_ONLY: &[Field] = &[field("name", Str, false)];
    const NAME_AND_VALUE: &[Field] = &[
        field("name", Str, false),
        field("value", Integer, false),
    ];
    const ACCESS_LEVELS: &[Field] = &[
        field("name", Str, false),
        field("default_uuid", OptUuid, true),
    ];
    const MESSAGE: &[Field] = &[
        field("name", Str, false),
        field("identifier", Integer, false),
        field("extended", Checkbox, false),
        field("length", Integer, false),
        field("cycle_time", Integer, true),
        field("receivable", Checkbox, false),
        field("sendable", Checkbox, false),
        field("comment", OptStr, true),
    ];
    const MULTIPLEXED_MESSAGE: &[Field] = &[
        field("name", Str, false),
        field("identifier", Integer, false),
        field("extended", Checkbox, false),
        field("receivable", Checkbox, false),
        field("sendable", Checkbox, false),
        field("comment", OptStr, true),
    ];
    const MULTIPLEXER: &[Field] = &[
        field("name", Str, false),
        field("identifier", Integer, false),
        field("length", Integer, false),
        field("cycle_time", Integer, true),
        field("comment", OptStr, true),
    ];
    const SIGNAL: &[Field] = &[
        field("name", Str, false),
        field("parameter_uuid", OptUuid, true),
        field("bits", Integer, false),
        field("start_bit", Integer, false),
        field("signed", Checkbox, false),
        field("factor", OptDecimal, false),
    ];
    const SUNSPEC_MODEL: &[Field] = &[
        field("id", Integer, false),
        field("length", Integer, false),
    ];
    const DATA_POINT: &[Field] = &[
        field("parameter_uuid", OptUuid, true),
        field("type_uuid", OptUuid, true),
        field("factor_uuid", OptUuid, true),
        field("enumeration_uuid", OptUuid, true),
        field("block_offset", Integer, false),
        field("size", Integer, false),
        field("mandatory", Checkbox, false),
        field("get", OptStr, true),
        field("set", OptStr, true),
    ];
    const SUNSPEC_TABLE: &[Field] = &[
        field("name", Str, false),
        field("parameter_table_uuid", OptUuid, true),
    ];

    match kind {
        NodeKind::Parameter => PARAMETER,
        NodeKind::Group => GROUP,
        NodeKind::Array => ARRAY,
        NodeKind::ArrayParameterElement => ARRAY_PARAMETER_ELEMENT,
        NodeKind::ArrayGroupElement => NAME_ONLY,
        NodeKind::Enumeration => NAME_ONLY,
        NodeKind::Enumerator => NAME_AND_VALUE,
        NodeKind::AccessLevels => ACCESS_LEVELS,
        NodeKind::AccessLevel => NAME_AND_VALUE,
        NodeKind::Message => MESSAGE,
        NodeKind::MultiplexedMessage => MULTIPLEXED_MESSAGE,
        NodeKind::Multiplexer => MULTIPLEXER,
        NodeKind::Signal => SIGNAL,
        NodeKind::SunSpecModel => SUNSPEC_MODEL,
        NodeKind::DataPoint => DATA_POINT,
        NodeKind::SunSpecTable => SUNSPEC_TABLE,
        NodeKind::ParameterTable => NAME_ONLY,
        NodeKind::Root
        | NodeKind::HeaderBlock
        | NodeKind::FixedBlock
        | NodeKind::TableRepeatingBlock
        | NodeKind::TableRepeatingBlockReference => &[],
    }
}

// ── Single-field mutation ───────────────────────────────────────────────────

/// Convert `raw` and assign it to one named field. A failed conversion
/// rejects the edit and leaves the current value untouched. Array `length`
/// edits route through the mirror engine so the structural invariant holds.
pub fn set_field(tree: &mut Tree, id: NodeId, name: &str, raw: &str) -> Result<(), FieldError> {
    let kind = tree.kind(id);
    let no_such_field = || FieldError::NoSuchField {
        kind,
        name: name.to_owned(),
    };

    // Array length changes mirror elements, which needs the whole tree.
    if kind == NodeKind::Array && name == "length" {
        let n: usize = to_integer(raw)?;
        array::set_length(tree, id, n)?;
        return Ok(());
    }

    match tree.data_mut(id) {
        NodeData::Parameter(p) => match name {
            "name" => p.name = raw.to_owned(),
            "abbreviation" => p.abbreviation = to_str_or_none(raw),
            "type_name" => p.type_name = to_str_or_none(raw),
            "default" => p.default = to_decimal_or_none(raw)?,
            "minimum" => p.set_minimum(to_decimal_or_none(raw)?),
            "maximum" => p.set_maximum(to_decimal_or_none(raw)?),
            "units" => p.units = to_str_or_none(raw),
            "enumeration_uuid" => p.enumeration_uuid = to_uuid_or_none(raw)?,
            "access_level_uuid" => p.access_level_uuid = to_uuid_or_none(raw)?,
            "nv" => p.nv = two_state_checkbox(raw)?,
            "nv_format" => p.nv_format = to_str_or_none(raw),
            "nv_cast" => p.nv_cast = two_state_checkbox(raw)?,
            "nv_factor" => p.nv_factor = to_decimal_or_none(raw)?,
            "read_only" => p.read_only = two_state_checkbox(raw)?,
            "factory" => p.factory = two_state_checkbox(raw)?,
            "display_hexadecimal" => p.display_hexadecimal = two_state_checkbox(raw)?,
            "decimal_places" => {
                p.decimal_places = if raw.trim().is_empty() {
                    None
                } else {
                    Some(to_integer(raw)?)
                }
            }
            "comment" => p.comment = to_str_or_none(raw),
            _ => return Err(no_such_field()),
        },
        NodeData::Group(g) => match name {
            "name" => g.name = raw.to_owned(),
            "type_name" => g.type_name = to_str_or_none(raw),
            _ => return Err(no_such_field()),
        },
        NodeData::Array(a) => match name {
            "name" => a.name = raw.to_owned(),
            "named_enumerators" => a.named_enumerators = two_state_checkbox(raw)?,
            _ => return Err(no_such_field()),
        },
        NodeData::ArrayParameterElement(e) => match name {
            "name" => e.name = raw.to_owned(),
            "default" => e.default = to_decimal_or_none(raw)?,
            "minimum" => e.set_minimum(to_decimal_or_none(raw)?),
            "maximum" => e.set_maximum(to_decimal_or_none(raw)?),
            _ => return Err(no_such_field()),
        },
        NodeData::ArrayGroupElement(e) => match name {
            "name" => e.name = raw.to_owned(),
            _ => return Err(no_such_field()),
        },
        NodeData::Enumeration(e) => match name {
            "name" => e.name = raw.to_owned(),
            _ => return Err(no_such_field()),
        },
        NodeData::Enumerator(e) => match name {
            "name" => e.name = raw.to_owned(),
            "value" => e.value = to_integer(raw)?,
            _ => return Err(no_such_field()),
        },
        NodeData::AccessLevels(a) => match name {
            "name" => a.name = raw.to_owned(),
            "default_uuid" => a.default_uuid = to_uuid_or_none(raw)?,
            _ => return Err(no_such_field()),
        },
        NodeData::AccessLevel(a) => match name {
            "name" => a.name = raw.to_owned(),
            "value" => a.value = to_integer(raw)?,
            _ => return Err(no_such_field()),
        },
        NodeData::ParameterTable(t) => match name {
            "name" => t.name = raw.to_owned(),
            _ => return Err(no_such_field()),
        },
        NodeData::Message(m) => match name {
            "name" => m.name = raw.to_owned(),
            "identifier" => m.identifier = to_integer(raw)?,
            "extended" => m.extended = two_state_checkbox(raw)?,
            "length" => m.length = to_integer(raw)?,
            "cycle_time" => {
                m.cycle_time = if raw.trim().is_empty() {
                    None
                } else {
                    Some(to_integer(raw)?)
                }
            }
            "receivable" => m.receivable = two_state_checkbox(raw)?,
            "sendable" => m.sendable = two_state_checkbox(raw)?,
            "comment" => m.comment = to_str_or_none(raw),
            _ => return Err(no_such_field()),
        },
        NodeData::MultiplexedMessage(m) => match name {
            "name" => m.name = raw.to_owned(),
            "identifier" => m.identifier = to_integer(raw)?,
            "extended" => m.extended = two_state_checkbox(raw)?,
            "receivable" => m.receivable = two_state_checkbox(raw)?,
            "sendable" => m.sendable = two_state_checkbox(raw)?,
            "comment" => m.comment = to_str_or_none(raw),
            _ => return Err(no_such_field()),
        },
        NodeData::Multiplexer(m) => match name {
            "name" => m.name = raw.to_owned(),
            "identifier" => m.identifier = to_integer(raw)?,
            "length" => m.length = to_integer(raw)?,
            "cycle_time" => {
                m.cycle_time = if raw.trim().is_empty() {
                    None
                } else {
                    Some(to_integer(raw)?)
                }
            }
            "comment" => m.comment = to_str_or_none(raw),
            _ => return Err(no_such_field()),
        },
        NodeData::Signal(s) => match name {
            "name" => s.name = raw.to_owned(),
            "parameter_uuid" => s.parameter_uuid = to_uuid_or_none(raw)?,
            "bits" => s.bits = to_integer(raw)?,
            "start_bit" => s.start_bit = to_integer(raw)?,
            "signed" => s.signed = two_state_checkbox(raw)?,
            "factor" => {
                s.factor = to_decimal_or_none(raw)?.unwrap_or(Decimal::ONE);
            }
            _ => return Err(no_such_field()),
        },
        NodeData::SunSpecModel(m) => match name {
            "id" => m.id = to_integer(raw)?,
            "length" => m.length = to_integer(raw)?,
            _ => return Err(no_such_field()),
        },
        NodeData::DataPoint(p) => match name {
            "parameter_uuid" => p.parameter_uuid = to_uuid_or_none(raw)?,
            "type_uuid" => p.type_uuid = to_uuid_or_none(raw)?,
            "factor_uuid" => p.factor_uuid = to_uuid_or_none(raw)?,
            "enumeration_uuid" => p.enumeration_uuid = to_uuid_or_none(raw)?,
            "block_offset" => p.block_offset = to_integer(raw)?,
            "size" => p.size = to_integer(raw)?,
            "mandatory" => p.mandatory = two_state_checkbox(raw)?,
            "get" => p.get = to_str_or_none(raw),
            "set" => p.set = to_str_or_none(raw),
            _ => return Err(no_such_field()),
        },
        NodeData::SunSpecTable(t) => match name {
            "name" => t.name = raw.to_owned(),
            "parameter_table_uuid" => t.parameter_table_uuid = to_uuid_or_none(raw)?,
            _ => return Err(no_such_field()),
        },
        NodeData::Root(_)
        | NodeData::HeaderBlock(_)
        | NodeData::FixedBlock(_)
        | NodeData::TableRepeatingBlock(_)
        | NodeData::TableRepeatingBlockReference(_) => return Err(no_such_field()),
    }

    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────
