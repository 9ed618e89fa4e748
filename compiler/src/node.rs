// node.rs — The closed set of node kinds in the canonical model
//
// Every entity in the parameter, CAN, and SunSpec trees is one variant of
// NodeData. The payload structs are plain data: children and parent links
// live in the owning Tree arena, cross-references are bare UUIDs resolved
// through the identity index at generation time. Field validation rules
// (decimal conversion, the min/max cross-clamp) live in `schema`.

use rust_decimal::Decimal;
use uuid::Uuid;

// ── Kind discriminator ──────────────────────────────────────────────────────

/// Concrete node kind, used for dispatch tables and the persistence tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Group,
    Parameter,
    Array,
    ArrayParameterElement,
    ArrayGroupElement,
    Enumeration,
    Enumerator,
    AccessLevels,
    AccessLevel,
    ParameterTable,
    Message,
    MultiplexedMessage,
    Multiplexer,
    Signal,
    SunSpecModel,
    HeaderBlock,
    FixedBlock,
    TableRepeatingBlock,
    TableRepeatingBlockReference,
    DataPoint,
    SunSpecTable,
}

impl NodeKind {
    /// The `_type` discriminator used by the persisted form.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Group => "group",
            NodeKind::Parameter => "parameter",
            NodeKind::Array => "array",
            NodeKind::ArrayParameterElement => "array_parameter_element",
            NodeKind::ArrayGroupElement => "array_group_element",
            NodeKind::Enumeration => "enumeration",
            NodeKind::Enumerator => "enumerator",
            NodeKind::AccessLevels => "access_levels",
            NodeKind::AccessLevel => "access_level",
            NodeKind::ParameterTable => "parameter_table",
            NodeKind::Message => "message",
            NodeKind::MultiplexedMessage => "multiplexed_message",
            NodeKind::Multiplexer => "multiplexer",
            NodeKind::Signal => "signal",
            NodeKind::SunSpecModel => "sunspec_model",
            NodeKind::HeaderBlock => "sunspec_header_block",
            NodeKind::FixedBlock => "sunspec_fixed_block",
            NodeKind::TableRepeatingBlock => "sunspec_table_repeating_block",
            NodeKind::TableRepeatingBlockReference => "sunspec_table_repeating_block_reference",
            NodeKind::DataPoint => "data_point",
            NodeKind::SunSpecTable => "sunspec_table",
        }
    }
}

// ── Parameter side ──────────────────────────────────────────────────────────

/// Tree root. The only node exempt from the UUID uniqueness contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub name: String,
    pub uuid: Option<Uuid>,
}

impl Root {
    pub fn new(name: impl Into<String>) -> Self {
        Root {
            name: name.into(),
            uuid: None,
        }
    }
}

/// Leaf parameter: named scalar with range, storage flags, and annotation
/// fields consumed by the generators.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub abbreviation: Option<String>,
    pub type_name: Option<String>,
    pub default: Option<Decimal>,
    pub minimum: Option<Decimal>,
    pub maximum: Option<Decimal>,
    pub units: Option<String>,
    pub enumeration_uuid: Option<Uuid>,
    pub access_level_uuid: Option<Uuid>,
    pub nv: bool,
    pub nv_format: Option<String>,
    pub nv_cast: bool,
    pub nv_factor: Option<Decimal>,
    pub read_only: bool,
    pub factory: bool,
    pub display_hexadecimal: bool,
    pub decimal_places: Option<u32>,
    pub comment: Option<String>,
    pub uuid: Option<Uuid>,
}

impl Default for Parameter {
    fn default() -> Self {
        Parameter {
            name: "New Parameter".to_owned(),
            abbreviation: None,
            type_name: None,
            default: None,
            minimum: None,
            maximum: None,
            units: None,
            enumeration_uuid: None,
            access_level_uuid: None,
            nv: false,
            nv_format: None,
            nv_cast: false,
            nv_factor: None,
            read_only: false,
            factory: false,
            display_hexadecimal: false,
            decimal_places: None,
            comment: None,
            uuid: None,
        }
    }
}

impl Parameter {
    pub fn named(name: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            ..Parameter::default()
        }
    }

    /// Validated setter: raising the minimum above the current maximum drags
    /// the maximum up with it. Fires on every mutation, including load.
    pub fn set_minimum(&mut self, value: Option<Decimal>) {
        self.minimum = value;
        if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
            if min > max {
                self.maximum = Some(min);
            }
        }
    }

    /// Validated setter, symmetric to [`Parameter::set_minimum`].
    pub fn set_maximum(&mut self, value: Option<Decimal>) {
        self.maximum = value;
        if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
            if max < min {
                self.minimum = Some(max);
            }
        }
    }
}

/// Ordered, named container of parameters, groups, and arrays. Purely
/// structural. `path` is only populated on generated table subtrees, where
/// it names the axis combination the group was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub type_name: Option<String>,
    pub path: Vec<Uuid>,
    pub uuid: Option<Uuid>,
}

impl Default for Group {
    fn default() -> Self {
        Group {
            name: "New Group".to_owned(),
            type_name: None,
            path: Vec::new(),
            uuid: None,
        }
    }
}

impl Group {
    pub fn named(name: impl Into<String>) -> Self {
        Group {
            name: name.into(),
            ..Group::default()
        }
    }
}

/// Template-plus-mirrors array. `length` is derived from the child count on
/// load and only changes through the mirror engine in `array`.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    pub name: String,
    pub length: usize,
    pub named_enumerators: bool,
    pub uuid: Option<Uuid>,
}

impl Default for Array {
    fn default() -> Self {
        Array {
            name: "New Array".to_owned(),
            length: 1,
            named_enumerators: true,
            uuid: None,
        }
    }
}

impl Array {
    pub fn named(name: impl Into<String>) -> Self {
        Array {
            name: name.into(),
            ..Array::default()
        }
    }
}

/// Mirrored element of an Array whose template is a Parameter. `original`
/// tracks the template's UUID; `path` identifies table-generated elements.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayParameterElement {
    pub name: String,
    pub default: Option<Decimal>,
    pub minimum: Option<Decimal>,
    pub maximum: Option<Decimal>,
    pub original: Option<Uuid>,
    pub path: Vec<Uuid>,
    pub uuid: Option<Uuid>,
}

impl Default for ArrayParameterElement {
    fn default() -> Self {
        ArrayParameterElement {
            name: "New Array Parameter Element".to_owned(),
            default: None,
            minimum: None,
            maximum: None,
            original: None,
            path: Vec::new(),
            uuid: None,
        }
    }
}

impl ArrayParameterElement {
    /// Same cross-field rule as [`Parameter::set_minimum`].
    pub fn set_minimum(&mut self, value: Option<Decimal>) {
        self.minimum = value;
        if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
            if min > max {
                self.maximum = Some(min);
            }
        }
    }

    pub fn set_maximum(&mut self, value: Option<Decimal>) {
        self.maximum = value;
        if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
            if max < min {
                self.minimum = Some(max);
            }
        }
    }
}

/// Mirrored element of an Array whose template is a Group, or (inside
/// generated table subtrees) a stand-in whose `original` references a whole
/// source Array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayGroupElement {
    pub name: String,
    pub original: Option<Uuid>,
    pub path: Vec<Uuid>,
    pub uuid: Option<Uuid>,
}

impl Default for ArrayGroupElement {
    fn default() -> Self {
        ArrayGroupElement {
            name: "New Array Group Element".to_owned(),
            original: None,
            path: Vec::new(),
            uuid: None,
        }
    }
}

/// Named ordered set of (value, name) pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Enumeration {
    pub name: String,
    pub uuid: Option<Uuid>,
}

impl Enumeration {
    pub fn named(name: impl Into<String>) -> Self {
        Enumeration {
            name: name.into(),
            uuid: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enumerator {
    pub name: String,
    pub value: i64,
    pub uuid: Option<Uuid>,
}

impl Enumerator {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Enumerator {
            name: name.into(),
            value,
            uuid: None,
        }
    }
}

/// Enumeration-like gating set with one designated default member.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessLevels {
    pub name: String,
    pub default_uuid: Option<Uuid>,
    pub uuid: Option<Uuid>,
}

impl AccessLevels {
    pub fn named(name: impl Into<String>) -> Self {
        AccessLevels {
            name: name.into(),
            default_uuid: None,
            uuid: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessLevel {
    pub name: String,
    pub value: i64,
    pub uuid: Option<Uuid>,
}

impl AccessLevel {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        AccessLevel {
            name: name.into(),
            value,
            uuid: None,
        }
    }
}

/// Parameter-side table. Its Enumeration children are the combination axes;
/// Group children hold the generated per-combination subtrees (keyed by
/// `path`) and the Arrays the SunSpec table builder consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTable {
    pub name: String,
    pub uuid: Option<Uuid>,
}

impl ParameterTable {
    pub fn named(name: impl Into<String>) -> Self {
        ParameterTable {
            name: name.into(),
            uuid: None,
        }
    }
}

// ── CAN side ────────────────────────────────────────────────────────────────

/// Plain CAN message: one frame, children are its signals.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    pub identifier: u32,
    pub extended: bool,
    pub length: u8,
    pub cycle_time: Option<u32>,
    pub receivable: bool,
    pub sendable: bool,
    pub comment: Option<String>,
    pub uuid: Option<Uuid>,
}

impl Default for Message {
    fn default() -> Self {
        Message {
            name: "New Message".to_owned(),
            identifier: 0,
            extended: true,
            length: 8,
            cycle_time: None,
            receivable: true,
            sendable: true,
            comment: None,
            uuid: None,
        }
    }
}

/// Multiplexed CAN message. Child 0 is the multiplexor signal; the remaining
/// children are Multiplexers plus any common signals replicated into every
/// multiplex value.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiplexedMessage {
    pub name: String,
    pub identifier: u32,
    pub extended: bool,
    pub receivable: bool,
    pub sendable: bool,
    pub comment: Option<String>,
    pub uuid: Option<Uuid>,
}

impl Default for MultiplexedMessage {
    fn default() -> Self {
        MultiplexedMessage {
            name: "New Multiplexed Message".to_owned(),
            identifier: 0,
            extended: true,
            receivable: true,
            sendable: true,
            comment: None,
            uuid: None,
        }
    }
}

/// One multiplex value inside a MultiplexedMessage; children are signals.
#[derive(Debug, Clone, PartialEq)]
pub struct Multiplexer {
    pub name: String,
    pub identifier: u16,
    pub length: u8,
    pub cycle_time: Option<u32>,
    pub comment: Option<String>,
    pub uuid: Option<Uuid>,
}

impl Default for Multiplexer {
    fn default() -> Self {
        Multiplexer {
            name: "New Multiplexer".to_owned(),
            identifier: 0,
            length: 8,
            cycle_time: None,
            comment: None,
            uuid: None,
        }
    }
}

/// CAN signal, optionally bound to a Parameter by UUID.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: String,
    pub parameter_uuid: Option<Uuid>,
    pub bits: u8,
    pub start_bit: u16,
    pub signed: bool,
    pub factor: Decimal,
    pub uuid: Option<Uuid>,
}

impl Default for Signal {
    fn default() -> Self {
        Signal {
            name: "New Signal".to_owned(),
            parameter_uuid: None,
            bits: 0,
            start_bit: 0,
            signed: false,
            factor: Decimal::ONE,
            uuid: None,
        }
    }
}

// ── SunSpec side ────────────────────────────────────────────────────────────

/// SunSpec device model: one HeaderBlock, one FixedBlock, optionally one
/// TableRepeatingBlockReference.
#[derive(Debug, Clone, PartialEq)]
pub struct SunSpecModel {
    pub id: u16,
    pub length: u16,
    pub uuid: Option<Uuid>,
}

impl Default for SunSpecModel {
    fn default() -> Self {
        SunSpecModel {
            id: 0,
            length: 0,
            uuid: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBlock {
    pub name: String,
    pub offset: u16,
    pub uuid: Option<Uuid>,
}

impl Default for HeaderBlock {
    fn default() -> Self {
        HeaderBlock {
            name: "Header".to_owned(),
            offset: 0,
            uuid: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixedBlock {
    pub name: String,
    pub offset: u16,
    pub uuid: Option<Uuid>,
}

impl Default for FixedBlock {
    fn default() -> Self {
        FixedBlock {
            name: "Fixed Block".to_owned(),
            offset: 2,
            uuid: None,
        }
    }
}

/// Repeating block synthesized from one axis combination; `path` is the
/// stable key (the combination's layer UUIDs) that lets resynchronization
/// reuse it.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRepeatingBlock {
    pub name: String,
    pub offset: u16,
    pub path: Vec<Uuid>,
    pub uuid: Option<Uuid>,
}

impl Default for TableRepeatingBlock {
    fn default() -> Self {
        TableRepeatingBlock {
            name: "Table Repeating Block".to_owned(),
            offset: 2,
            path: Vec::new(),
            uuid: None,
        }
    }
}

/// Reference from a model to a table's repeating block.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRepeatingBlockReference {
    pub name: String,
    pub offset: u16,
    pub original: Option<Uuid>,
    pub uuid: Option<Uuid>,
}

impl Default for TableRepeatingBlockReference {
    fn default() -> Self {
        TableRepeatingBlockReference {
            name: "Table Repeating Block".to_owned(),
            offset: 2,
            original: None,
            uuid: None,
        }
    }
}

/// One register-level field within a block.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub parameter_uuid: Option<Uuid>,
    pub type_uuid: Option<Uuid>,
    pub factor_uuid: Option<Uuid>,
    pub enumeration_uuid: Option<Uuid>,
    pub block_offset: u16,
    pub size: u16,
    pub mandatory: bool,
    pub get: Option<String>,
    pub set: Option<String>,
    pub uuid: Option<Uuid>,
}

impl Default for DataPoint {
    fn default() -> Self {
        DataPoint {
            parameter_uuid: None,
            type_uuid: None,
            factor_uuid: None,
            enumeration_uuid: None,
            block_offset: 0,
            size: 0,
            mandatory: true,
            get: None,
            set: None,
            uuid: None,
        }
    }
}

/// SunSpec-side table, rebuilt from a referenced parameter table.
#[derive(Debug, Clone, PartialEq)]
pub struct SunSpecTable {
    pub name: String,
    pub parameter_table_uuid: Option<Uuid>,
    pub uuid: Option<Uuid>,
}

impl Default for SunSpecTable {
    fn default() -> Self {
        SunSpecTable {
            name: "New Table".to_owned(),
            parameter_table_uuid: None,
            uuid: None,
        }
    }
}

// ── Sum type ────────────────────────────────────────────────────────────────

/// Tagged sum over the closed set of node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Root(Root),
    Group(Group),
    Parameter(Parameter),
    Array(Array),
    ArrayParameterElement(ArrayParameterElement),
    ArrayGroupElement(ArrayGroupElement),
    Enumeration(Enumeration),
    Enumerator(Enumerator),
    AccessLevels(AccessLevels),
    AccessLevel(AccessLevel),
    ParameterTable(ParameterTable),
    Message(Message),
    MultiplexedMessage(MultiplexedMessage),
    Multiplexer(Multiplexer),
    Signal(Signal),
    SunSpecModel(SunSpecModel),
    HeaderBlock(HeaderBlock),
    FixedBlock(FixedBlock),
    TableRepeatingBlock(TableRepeatingBlock),
    TableRepeatingBlockReference(TableRepeatingBlockReference),
    DataPoint(DataPoint),
    SunSpecTable(SunSpecTable),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Root(_) => NodeKind::Root,
            NodeData::Group(_) => NodeKind::Group,
            NodeData::Parameter(_) => NodeKind::Parameter,
            NodeData::Array(_) => NodeKind::Array,
            NodeData::ArrayParameterElement(_) => NodeKind::ArrayParameterElement,
            NodeData::ArrayGroupElement(_) => NodeKind::ArrayGroupElement,
            NodeData::Enumeration(_) => NodeKind::Enumeration,
            NodeData::Enumerator(_) => NodeKind::Enumerator,
            NodeData::AccessLevels(_) => NodeKind::AccessLevels,
            NodeData::AccessLevel(_) => NodeKind::AccessLevel,
            NodeData::ParameterTable(_) => NodeKind::ParameterTable,
            NodeData::Message(_) => NodeKind::Message,
            NodeData::MultiplexedMessage(_) => NodeKind::MultiplexedMessage,
            NodeData::Multiplexer(_) => NodeKind::Multiplexer,
            NodeData::Signal(_) => NodeKind::Signal,
            NodeData::SunSpecModel(_) => NodeKind::SunSpecModel,
            NodeData::HeaderBlock(_) => NodeKind::HeaderBlock,
            NodeData::FixedBlock(_) => NodeKind::FixedBlock,
            NodeData::TableRepeatingBlock(_) => NodeKind::TableRepeatingBlock,
            NodeData::TableRepeatingBlockReference(_) => {
                NodeKind::TableRepeatingBlockReference
            }
            NodeData::DataPoint(_) => NodeKind::DataPoint,
            NodeData::SunSpecTable(_) => NodeKind::SunSpecTable,
        }
    }

    pub fn uuid(&self) -> Option<Uuid> {
        match self {
            NodeData::Root(n) => n.uuid,
            NodeData::Group(n) => n.uuid,
            NodeData::Parameter(n) => n.uuid,
            NodeData::Array(n) => n.uuid,
            NodeData::ArrayParameterElement(n) => n.uuid,
            NodeData::ArrayGroupElement(n) => n.uuid,
            NodeData::Enumeration(n) => n.uuid,
            NodeData::Enumerator(n) => n.uuid,
            NodeData::AccessLevels(n) => n.uuid,
            NodeData::AccessLevel(n) => n.uuid,
            NodeData::ParameterTable(n) => n.uuid,
            NodeData::Message(n) => n.uuid,
            NodeData::MultiplexedMessage(n) => n.uuid,
            NodeData::Multiplexer(n) => n.uuid,
            NodeData::Signal(n) => n.uuid,
            NodeData::SunSpecModel(n) => n.uuid,
            NodeData::HeaderBlock(n) => n.uuid,
            NodeData::FixedBlock(n) => n.uuid,
            NodeData::TableRepeatingBlock(n) => n.uuid,
            NodeData::TableRepeatingBlockReference(n) => n.uuid,
            NodeData::DataPoint(n) => n.uuid,
            NodeData::SunSpecTable(n) => n.uuid,
        }
    }

    pub fn set_uuid(&mut self, uuid: Option<Uuid>) {
        match self {
            NodeData::Root(n) => n.uuid = uuid,
            NodeData::Group(n) => n.uuid = uuid,
            NodeData::Parameter(n) => n.uuid = uuid,
            NodeData::Array(n) => n.uuid = uuid,
            NodeData::ArrayParameterElement(n) => n.uuid = uuid,
            NodeData::ArrayGroupElement(n) => n.uuid = uuid,
            NodeData::Enumeration(n) => n.uuid = uuid,
            NodeData::Enumerator(n) => n.uuid = uuid,
            NodeData::AccessLevels(n) => n.uuid = uuid,
            NodeData::AccessLevel(n) => n.uuid = uuid,
            NodeData::ParameterTable(n) => n.uuid = uuid,
            NodeData::Message(n) => n.uuid = uuid,
            NodeData::MultiplexedMessage(n) => n.uuid = uuid,
            NodeData::Multiplexer(n) => n.uuid = uuid,
            NodeData::Signal(n) => n.uuid = uuid,
            NodeData::SunSpecModel(n) => n.uuid = uuid,
            NodeData::HeaderBlock(n) => n.uuid = uuid,
            NodeData::FixedBlock(n) => n.uuid = uuid,
            NodeData::TableRepeatingBlock(n) => n.uuid = uuid,
            NodeData::TableRepeatingBlockReference(n) => n.uuid = uuid,
            NodeData::DataPoint(n) => n.uuid = uuid,
            NodeData::SunSpecTable(n) => n.uuid = uuid,
        }
    }

    /// Display name. DataPoints are named by their parameter reference, so
    /// here they fall back to the kind tag.
    pub fn name(&self) -> &str {
        match self {
            NodeData::Root(n) => &n.name,
            NodeData::Group(n) => &n.name,
            NodeData::Parameter(n) => &n.name,
            NodeData::Array(n) => &n.name,
            NodeData::ArrayParameterElement(n) => &n.name,
            NodeData::ArrayGroupElement(n) => &n.name,
            NodeData::Enumeration(n) => &n.name,
            NodeData::Enumerator(n) => &n.name,
            NodeData::AccessLevels(n) => &n.name,
            NodeData::AccessLevel(n) => &n.name,
            NodeData::ParameterTable(n) => &n.name,
            NodeData::Message(n) => &n.name,
            NodeData::MultiplexedMessage(n) => &n.name,
            NodeData::Multiplexer(n) => &n.name,
            NodeData::Signal(n) => &n.name,
            NodeData::SunSpecModel(_) => "Model",
            NodeData::HeaderBlock(n) => &n.name,
            NodeData::FixedBlock(n) => &n.name,
            NodeData::TableRepeatingBlock(n) => &n.name,
            NodeData::TableRepeatingBlockReference(n) => &n.name,
            NodeData::DataPoint(_) => "Data Point",
            NodeData::SunSpecTable(n) => &n.name,
        }
    }
}
