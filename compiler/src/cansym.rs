// cansym.rs — CAN tree + parameter tree → symbol-file matrix
//
// Messages and signals live in the CAN tree; everything a signal is
// annotated with (range, units, comment, access level, NV storage hints,
// enumeration) is pulled from the parameter tree through the identity
// index. A multiplexed message renders as one frame section per
// multiplexer value, the common signals replicated into each.
//
// Failure modes: dangling cross-references surface as identity errors;
// structural problems in the CAN tree are reported, never patched over.

use std::collections::BTreeSet;

use thiserror::Error;
use uuid::Uuid;

use crate::id::NodeId;
use crate::identity::{IdentityError, IdentityIndex};
use crate::names::dehumanize;
use crate::node::{NodeData, NodeKind, Parameter, Signal};
use crate::symfmt::{Frame, Matrix, Mux, Sig, ValueTable};
use crate::tree::Tree;

#[derive(Debug, Error)]
pub enum CanGenError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("{0} is not a parameter")]
    NotAParameter(Uuid),
    #[error("multiplexed message {0:?} has no multiplexer children")]
    MissingMultiplexer(String),
    #[error("multiplexed message {0:?} must start with its multiplexor signal")]
    MissingMultiplexorSignal(String),
    #[error("{0:?} cannot appear here in a CAN tree")]
    UnsupportedNode(NodeKind),
    #[error("signal {0:?} has factor zero")]
    ZeroFactor(String),
}

/// Render the symbol text for a CAN tree against its parameter tree.
pub fn generate(can: &Tree, parameters: &Tree) -> Result<String, CanGenError> {
    Ok(build_matrix(can, parameters)?.dump())
}

/// Build the intermediate matrix. Split from [`generate`] so tests can
/// assert on structure instead of text.
pub fn build_matrix(can: &Tree, parameters: &Tree) -> Result<Matrix, CanGenError> {
    let finder = Finder::new(parameters)?;
    let mut matrix = Matrix::default();

    for id in parameters.preorder(parameters.root()) {
        match parameters.data(id) {
            NodeData::Enumeration(e) => {
                matrix.enums.push(value_table(parameters, id, &e.name));
            }
            NodeData::AccessLevels(a) => {
                matrix.enums.push(value_table(parameters, id, &a.name));
            }
            _ => {}
        }
    }

    for &child in can.children(can.root()) {
        match can.data(child) {
            NodeData::Message(_) => matrix.frames.push(plain_frame(can, child, &finder)?),
            NodeData::MultiplexedMessage(_) => {
                matrix.frames.extend(multiplexed_frames(can, child, &finder)?);
            }
            other => return Err(CanGenError::UnsupportedNode(other.kind())),
        }
    }

    tracing::debug!(
        frames = matrix.frames.len(),
        value_tables = matrix.enums.len(),
        "built symbol matrix"
    );
    Ok(matrix)
}

fn value_table(parameters: &Tree, id: NodeId, name: &str) -> ValueTable {
    let entries = parameters
        .children(id)
        .iter()
        .filter_map(|&child| match parameters.data(child) {
            NodeData::Enumerator(e) => Some((e.value, dehumanize(&e.name))),
            NodeData::AccessLevel(l) => Some((l.value, dehumanize(&l.name))),
            _ => None,
        })
        .collect();
    ValueTable {
        name: dehumanize(name),
        entries,
    }
}

// ── Parameter-side lookups ──────────────────────────────────────────────────

struct Finder<'a> {
    parameters: &'a Tree,
    index: IdentityIndex,
    /// Default member of the first AccessLevels group, if any.
    default_access_level: Option<Uuid>,
}

impl<'a> Finder<'a> {
    fn new(parameters: &'a Tree) -> Result<Self, CanGenError> {
        let index = IdentityIndex::build(parameters)?;
        let default_access_level = parameters
            .preorder(parameters.root())
            .find_map(|id| match parameters.data(id) {
                NodeData::AccessLevels(levels) => Some(levels.default_uuid.or_else(|| {
                    parameters
                        .children(id)
                        .first()
                        .and_then(|&first| parameters.data(first).uuid())
                })),
                _ => None,
            })
            .flatten();
        Ok(Finder {
            parameters,
            index,
            default_access_level,
        })
    }

    fn node(&self, uuid: Uuid) -> Result<&'a NodeData, CanGenError> {
        Ok(self.parameters.data(self.index.resolve(uuid)?))
    }

    fn parameter(&self, uuid: Uuid) -> Result<&'a Parameter, CanGenError> {
        match self.node(uuid)? {
            NodeData::Parameter(p) => Ok(p),
            _ => Err(CanGenError::NotAParameter(uuid)),
        }
    }

    /// Whether `level` is the default member of its own AccessLevels group.
    fn is_default_access_level(&self, level: Uuid) -> Result<bool, CanGenError> {
        let id = self.index.resolve(level)?;
        let Some(parent) = self.parameters.parent(id) else {
            return Ok(false);
        };
        let NodeData::AccessLevels(levels) = self.parameters.data(parent) else {
            return Ok(false);
        };
        let default = levels.default_uuid.or_else(|| {
            self.parameters
                .children(parent)
                .first()
                .and_then(|&first| self.parameters.data(first).uuid())
        });
        Ok(default == Some(level))
    }
}

// ── Frames ──────────────────────────────────────────────────────────────────

fn plain_frame(can: &Tree, id: NodeId, finder: &Finder) -> Result<Frame, CanGenError> {
    let NodeData::Message(message) = can.data(id) else {
        return Err(CanGenError::UnsupportedNode(can.kind(id)));
    };

    let mut signals = Vec::new();
    for &child in can.children(id) {
        match can.data(child) {
            NodeData::Signal(signal) => signals.push(build_sig(signal, finder, false)?),
            other => return Err(CanGenError::UnsupportedNode(other.kind())),
        }
    }

    Ok(Frame {
        name: dehumanize(&message.name),
        id: message.identifier,
        extended: message.extended,
        dlc: message.length,
        receivable: message.receivable,
        sendable: message.sendable,
        cycle_time: message.cycle_time,
        comment: message.comment.clone(),
        mux: None,
        signals,
    })
}

fn multiplexed_frames(can: &Tree, id: NodeId, finder: &Finder) -> Result<Vec<Frame>, CanGenError> {
    let NodeData::MultiplexedMessage(message) = can.data(id) else {
        return Err(CanGenError::UnsupportedNode(can.kind(id)));
    };

    let children = can.children(id);
    let Some((&first, rest)) = children.split_first() else {
        return Err(CanGenError::MissingMultiplexorSignal(message.name.clone()));
    };
    let NodeData::Signal(mux_signal) = can.data(first) else {
        return Err(CanGenError::MissingMultiplexorSignal(message.name.clone()));
    };

    let mut common = Vec::new();
    let mut multiplexers = Vec::new();
    for &child in rest {
        match can.data(child) {
            NodeData::Signal(signal) => common.push(signal),
            NodeData::Multiplexer(_) => multiplexers.push(child),
            other => return Err(CanGenError::UnsupportedNode(other.kind())),
        }
    }
    if multiplexers.is_empty() {
        return Err(CanGenError::MissingMultiplexer(message.name.clone()));
    }

    let mut frames = Vec::new();
    for mux_id in multiplexers {
        let NodeData::Multiplexer(multiplexer) = can.data(mux_id) else {
            unreachable!("filtered above");
        };

        // When every non-special signal under this multiplexer shares one
        // access level, the level is announced once on the Mux line and
        // the per-signal suffixes are skipped.
        let mut levels: BTreeSet<Option<Uuid>> = BTreeSet::new();
        for &child in can.children(mux_id) {
            let NodeData::Signal(signal) = can.data(child) else {
                continue;
            };
            if special_signal(&signal.name) {
                continue;
            }
            let Some(parameter_uuid) = signal.parameter_uuid else {
                continue;
            };
            let parameter = finder.parameter(parameter_uuid)?;
            levels.insert(
                parameter
                    .access_level_uuid
                    .or(finder.default_access_level),
            );
        }
        let all_levels_match = levels.len() == 1;

        let mut comment = multiplexer.comment.clone().unwrap_or_default();
        if all_levels_match {
            let level = levels.into_iter().next().flatten();
            if let Some(level) = level {
                if !finder.is_default_access_level(level)? {
                    let name = finder.node(level)?.name().to_lowercase();
                    comment = format!("{comment} <{name}>").trim().to_owned();
                }
            }
        }

        let mut signals = Vec::new();
        for signal in &common {
            signals.push(build_sig(signal, finder, false)?);
        }
        for &child in can.children(mux_id) {
            match can.data(child) {
                NodeData::Signal(signal) => {
                    signals.push(build_sig(signal, finder, all_levels_match)?);
                }
                other => return Err(CanGenError::UnsupportedNode(other.kind())),
            }
        }

        frames.push(Frame {
            name: dehumanize(&message.name),
            id: message.identifier,
            extended: message.extended,
            dlc: multiplexer.length,
            receivable: message.receivable,
            sendable: message.sendable,
            cycle_time: multiplexer.cycle_time,
            comment: message.comment.clone(),
            mux: Some(Mux {
                name: dehumanize(&mux_signal.name),
                start_bit: mux_signal.start_bit,
                bits: mux_signal.bits,
                value: multiplexer.identifier,
                comment: (!comment.is_empty()).then_some(comment),
            }),
            signals,
        });
    }

    Ok(frames)
}

/// Bookkeeping signals excluded from access-level aggregation.
fn special_signal(name: &str) -> bool {
    let folded = name.to_lowercase();
    folded.starts_with("read param - ") || folded == "meta"
}

// ── Signals ─────────────────────────────────────────────────────────────────

fn build_sig(signal: &Signal, finder: &Finder, skip_access_level: bool) -> Result<Sig, CanGenError> {
    let mut sig = Sig::new(dehumanize(&signal.name));
    sig.signed = signal.signed;
    sig.bits = signal.bits;
    sig.start_bit = signal.start_bit;
    sig.factor = signal.factor;

    let Some(parameter_uuid) = signal.parameter_uuid else {
        return Ok(sig);
    };
    let parameter = finder.parameter(parameter_uuid)?;

    sig.minimum = parameter.minimum;
    sig.maximum = parameter.maximum;
    sig.units = parameter.units.clone();

    let mut comment = parameter
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or_default()
        .to_owned();

    if !skip_access_level {
        if let Some(level) = parameter.access_level_uuid {
            if !finder.is_default_access_level(level)? {
                let name = finder.node(level)?.name().to_lowercase();
                comment = format!("{comment} <{name}>").trim().to_owned();
            }
        }
    }

    if let Some(format) = &parameter.nv_format {
        let mut segments = vec!["nv".to_owned()];
        segments.push(if parameter.nv_cast { "c" } else { "" }.to_owned());
        if let Some(factor) = parameter.nv_factor {
            segments.push(format!("f{factor}"));
        }
        segments.push(format.clone());
        comment = format!("{comment}  <{}>", segments.join(":"))
            .trim()
            .to_owned();
    }

    if !comment.is_empty() {
        sig.comment = Some(comment);
    }

    if let Some(enumeration) = parameter.enumeration_uuid {
        sig.enumeration = Some(dehumanize(finder.node(enumeration)?.name()));
    }

    sig.long_name = Some(parameter.name.clone());
    sig.hexadecimal = parameter.display_hexadecimal;
    sig.decimal_places = parameter.decimal_places;

    if let Some(default) = parameter.default {
        let scaled = default
            .checked_div(signal.factor)
            .ok_or_else(|| CanGenError::ZeroFactor(signal.name.clone()))?;
        sig.default = Some(scaled.normalize());
    }

    Ok(sig)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::identity::repair_identifiers;
    use crate::node::{
        AccessLevel, AccessLevels, Enumeration, Enumerator, Message, MultiplexedMessage,
        Multiplexer, Parameter, Root,
    };

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    struct Fixture {
        parameters: Tree,
        user_level: Uuid,
        factory_level: Uuid,
        enumeration: Uuid,
    }

    fn parameter_fixture() -> Fixture {
        let mut tree = Tree::new(NodeData::Root(Root::new("Parameters")));
        let levels = tree.append_child(
            tree.root(),
            NodeData::AccessLevels(AccessLevels::named("Access Level")),
        );
        let user = tree.append_child(levels, NodeData::AccessLevel(AccessLevel::new("User", 0)));
        let factory =
            tree.append_child(levels, NodeData::AccessLevel(AccessLevel::new("Factory", 1)));

        let enumeration = tree.append_child(
            tree.root(),
            NodeData::Enumeration(Enumeration::named("Control Mode")),
        );
        tree.append_child(enumeration, NodeData::Enumerator(Enumerator::new("Idle", 0)));
        tree.append_child(enumeration, NodeData::Enumerator(Enumerator::new("Run", 1)));

        repair_identifiers(&mut tree).unwrap();

        let user_level = tree.data(user).uuid().unwrap();
        let factory_level = tree.data(factory).uuid().unwrap();
        if let NodeData::AccessLevels(l) = tree.data_mut(levels) {
            l.default_uuid = Some(user_level);
        }
        let enumeration = tree.data(enumeration).uuid().unwrap();

        Fixture {
            parameters: tree,
            user_level,
            factory_level,
            enumeration,
        }
    }

    fn add_parameter(fixture: &mut Fixture, parameter: Parameter) -> Uuid {
        let root = fixture.parameters.root();
        let id = fixture
            .parameters
            .append_child(root, NodeData::Parameter(parameter));
        repair_identifiers(&mut fixture.parameters).unwrap();
        fixture.parameters.data(id).uuid().unwrap()
    }

    fn signal(name: &str, parameter: Option<Uuid>) -> Signal {
        Signal {
            name: name.to_owned(),
            parameter_uuid: parameter,
            bits: 16,
            start_bit: 0,
            ..Signal::default()
        }
    }

    #[test]
    fn value_tables_cover_enumerations_and_access_levels() {
        let fixture = parameter_fixture();
        let can = Tree::new(NodeData::Root(Root::new("CAN")));

        let matrix = build_matrix(&can, &fixture.parameters).unwrap();
        let names: Vec<&str> = matrix.enums.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["AccessLevel", "ControlMode"]);
        assert_eq!(
            matrix.enums[1].entries,
            vec![(0, "Idle".to_owned()), (1, "Run".to_owned())]
        );
    }

    #[test]
    fn plain_message_renders_annotated_signal() {
        let mut fixture = parameter_fixture();
        let enumeration = fixture.enumeration;
        let parameter = add_parameter(
            &mut fixture,
            Parameter {
                name: "Output Current".to_owned(),
                default: Some(dec("12.5")),
                minimum: Some(dec("0")),
                maximum: Some(dec("400")),
                units: Some("A".to_owned()),
                enumeration_uuid: Some(enumeration),
                ..Parameter::default()
            },
        );

        let mut can = Tree::new(NodeData::Root(Root::new("CAN")));
        let message = can.append_child(
            can.root(),
            NodeData::Message(Message {
                name: "status-message".to_owned(),
                identifier: 0x1FFFFFF7,
                cycle_time: Some(200),
                ..Message::default()
            }),
        );
        can.append_child(
            message,
            NodeData::Signal(Signal {
                factor: dec("0.1"),
                ..signal("Output Current", Some(parameter))
            }),
        );

        let matrix = build_matrix(&can, &fixture.parameters).unwrap();
        assert_eq!(matrix.frames.len(), 1);
        let frame = &matrix.frames[0];
        assert_eq!(frame.name, "Status_message");
        assert_eq!(frame.cycle_time, Some(200));

        let sig = &frame.signals[0];
        assert_eq!(sig.name, "OutputCurrent");
        assert_eq!(sig.minimum, Some(dec("0")));
        assert_eq!(sig.maximum, Some(dec("400")));
        assert_eq!(sig.units.as_deref(), Some("A"));
        assert_eq!(sig.enumeration.as_deref(), Some("ControlMode"));
        assert_eq!(sig.long_name.as_deref(), Some("Output Current"));
        // raw default divided by the signal factor
        assert_eq!(sig.default, Some(dec("125")));
    }

    #[test]
    fn non_default_access_level_suffixes_the_comment() {
        let mut fixture = parameter_fixture();
        let factory_level = fixture.factory_level;
        let parameter = add_parameter(
            &mut fixture,
            Parameter {
                name: "Serial Number".to_owned(),
                comment: Some("  unit serial  ".to_owned()),
                access_level_uuid: Some(factory_level),
                ..Parameter::default()
            },
        );

        let mut can = Tree::new(NodeData::Root(Root::new("CAN")));
        let message = can.append_child(can.root(), NodeData::Message(Message::default()));
        can.append_child(message, NodeData::Signal(signal("Serial Number", Some(parameter))));

        let matrix = build_matrix(&can, &fixture.parameters).unwrap();
        let sig = &matrix.frames[0].signals[0];
        assert_eq!(sig.comment.as_deref(), Some("unit serial <factory>"));
    }

    #[test]
    fn default_access_level_adds_no_suffix() {
        let mut fixture = parameter_fixture();
        let user_level = fixture.user_level;
        let parameter = add_parameter(
            &mut fixture,
            Parameter {
                name: "Voltage".to_owned(),
                access_level_uuid: Some(user_level),
                ..Parameter::default()
            },
        );

        let mut can = Tree::new(NodeData::Root(Root::new("CAN")));
        let message = can.append_child(can.root(), NodeData::Message(Message::default()));
        can.append_child(message, NodeData::Signal(signal("Voltage", Some(parameter))));

        let matrix = build_matrix(&can, &fixture.parameters).unwrap();
        assert_eq!(matrix.frames[0].signals[0].comment, None);
    }

    #[test]
    fn nv_annotation_builds_the_storage_hint() {
        let mut fixture = parameter_fixture();
        let parameter = add_parameter(
            &mut fixture,
            Parameter {
                name: "Ramp Time".to_owned(),
                comment: Some("soft start".to_owned()),
                nv: true,
                nv_format: Some("%.2f".to_owned()),
                nv_cast: true,
                nv_factor: Some(dec("0.1")),
                ..Parameter::default()
            },
        );

        let mut can = Tree::new(NodeData::Root(Root::new("CAN")));
        let message = can.append_child(can.root(), NodeData::Message(Message::default()));
        can.append_child(message, NodeData::Signal(signal("Ramp Time", Some(parameter))));

        let matrix = build_matrix(&can, &fixture.parameters).unwrap();
        let sig = &matrix.frames[0].signals[0];
        assert_eq!(sig.comment.as_deref(), Some("soft start  <nv:c:f0.1:%.2f>"));
    }

    #[test]
    fn multiplexed_message_renders_one_section_per_multiplexer() {
        let mut fixture = parameter_fixture();
        let factory_level = fixture.factory_level;
        let a = add_parameter(
            &mut fixture,
            Parameter {
                name: "Parameter A".to_owned(),
                access_level_uuid: Some(factory_level),
                ..Parameter::default()
            },
        );
        let b = add_parameter(
            &mut fixture,
            Parameter {
                name: "Parameter B".to_owned(),
                access_level_uuid: Some(factory_level),
                ..Parameter::default()
            },
        );

        let mut can = Tree::new(NodeData::Root(Root::new("CAN")));
        let message = can.append_child(
            can.root(),
            NodeData::MultiplexedMessage(MultiplexedMessage {
                name: "Parameter Query".to_owned(),
                identifier: 0x1DEFF741,
                ..MultiplexedMessage::default()
            }),
        );
        can.append_child(
            message,
            NodeData::Signal(Signal {
                bits: 8,
                ..signal("Parameter Query MUX", None)
            }),
        );
        can.append_child(message, NodeData::Signal(signal("Checksum", None)));
        let mux1 = can.append_child(
            message,
            NodeData::Multiplexer(Multiplexer {
                name: "Limits One".to_owned(),
                identifier: 1,
                length: 8,
                cycle_time: Some(500),
                ..Multiplexer::default()
            }),
        );
        can.append_child(mux1, NodeData::Signal(signal("Parameter A", Some(a))));
        can.append_child(mux1, NodeData::Signal(signal("Parameter B", Some(b))));
        let mux2 = can.append_child(
            message,
            NodeData::Multiplexer(Multiplexer {
                name: "Limits Two".to_owned(),
                identifier: 2,
                length: 6,
                ..Multiplexer::default()
            }),
        );
        can.append_child(mux2, NodeData::Signal(signal("Parameter A", Some(a))));

        let matrix = build_matrix(&can, &fixture.parameters).unwrap();
        assert_eq!(matrix.frames.len(), 2);

        let first = &matrix.frames[0];
        assert_eq!(first.dlc, 8);
        assert_eq!(first.cycle_time, Some(500));
        let mux = first.mux.as_ref().unwrap();
        assert_eq!(mux.name, "ParameterQueryMUX");
        assert_eq!(mux.value, 1);
        // both signals share the factory level, so it moves to the Mux line
        assert_eq!(mux.comment.as_deref(), Some("<factory>"));
        assert!(first.signals.iter().all(|s| s.comment.is_none()));
        // common signal first, then the multiplexer's own
        let names: Vec<&str> = first.signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Checksum", "ParameterA", "ParameterB"]);

        let second = &matrix.frames[1];
        assert_eq!(second.dlc, 6);
        assert_eq!(second.mux.as_ref().unwrap().value, 2);
    }

    #[test]
    fn multiplexed_message_requires_a_multiplexer() {
        let fixture = parameter_fixture();
        let mut can = Tree::new(NodeData::Root(Root::new("CAN")));
        let message = can.append_child(
            can.root(),
            NodeData::MultiplexedMessage(MultiplexedMessage::default()),
        );
        can.append_child(message, NodeData::Signal(signal("MUX", None)));

        assert!(matches!(
            build_matrix(&can, &fixture.parameters),
            Err(CanGenError::MissingMultiplexer(_))
        ));
    }

    #[test]
    fn dangling_parameter_reference_is_an_identity_error() {
        let fixture = parameter_fixture();
        let mut can = Tree::new(NodeData::Root(Root::new("CAN")));
        let message = can.append_child(can.root(), NodeData::Message(Message::default()));
        can.append_child(
            message,
            NodeData::Signal(signal("Orphan", Some(Uuid::new_v4()))),
        );

        assert!(matches!(
            build_matrix(&can, &fixture.parameters),
            Err(CanGenError::Identity(IdentityError::NotFound(_)))
        ));
    }
}
