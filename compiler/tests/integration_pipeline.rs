// End-to-end pipeline tests: persisted model in, generated artifacts out.
//
// One parameter tree and one CAN tree are loaded from their interchange
// form, then flattened into the symbol file and the C declarations. The
// reproducibility tests assert that generation is a pure function of the
// loaded trees.

use pmc::id::NodeId;
use pmc::node::NodeKind;
use pmc::tree::Tree;
use pmc::{cansym, cgen, persist};

const PARAMETERS: &str = r#"{
    "_type": "root",
    "name": "Parameters",
    "children": [
        {
            "_type": "access_levels",
            "name": "Access Level",
            "default_uuid": "11111111-1111-4111-8111-111111111111",
            "uuid": "10000000-0000-4000-8000-000000000000",
            "children": [
                {
                    "_type": "access_level",
                    "name": "User",
                    "value": 0,
                    "uuid": "11111111-1111-4111-8111-111111111111"
                },
                {
                    "_type": "access_level",
                    "name": "Factory",
                    "value": 1,
                    "uuid": "22222222-2222-4222-8222-222222222222"
                }
            ]
        },
        {
            "_type": "enumeration",
            "name": "Control Mode",
            "uuid": "30000000-0000-4000-8000-000000000000",
            "children": [
                {
                    "_type": "enumerator",
                    "name": "Idle",
                    "value": 0,
                    "uuid": "31111111-1111-4111-8111-111111111111"
                },
                {
                    "_type": "enumerator",
                    "name": "Run",
                    "value": 1,
                    "uuid": "32222222-2222-4222-8222-222222222222"
                }
            ]
        },
        {
            "_type": "group",
            "name": "Line Monitoring",
            "uuid": "40000000-0000-4000-8000-000000000000",
            "children": [
                {
                    "_type": "parameter",
                    "name": "Output Current",
                    "abbreviation": "OutCur",
                    "default": "12.5",
                    "minimum": "0",
                    "maximum": "400",
                    "units": "A",
                    "access_level_uuid": "22222222-2222-4222-8222-222222222222",
                    "comment": "phase current",
                    "uuid": "41111111-1111-4111-8111-111111111111"
                },
                {
                    "_type": "parameter",
                    "name": "Control Mode",
                    "enumeration_uuid": "30000000-0000-4000-8000-000000000000",
                    "uuid": "42222222-2222-4222-8222-222222222222"
                }
            ]
        }
    ]
}"#;

const CAN: &str = r#"{
    "_type": "root",
    "name": "CAN",
    "children": [
        {
            "_type": "message",
            "name": "Status Message",
            "identifier": 486539383,
            "length": 8,
            "cycle_time": 200,
            "uuid": "50000000-0000-4000-8000-000000000000",
            "children": [
                {
                    "_type": "signal",
                    "name": "Output Current",
                    "parameter_uuid": "41111111-1111-4111-8111-111111111111",
                    "bits": 16,
                    "start_bit": 0,
                    "signed": true,
                    "factor": "0.1",
                    "uuid": "51111111-1111-4111-8111-111111111111"
                },
                {
                    "_type": "signal",
                    "name": "Control Mode",
                    "parameter_uuid": "42222222-2222-4222-8222-222222222222",
                    "bits": 16,
                    "start_bit": 16,
                    "uuid": "52222222-2222-4222-8222-222222222222"
                }
            ]
        }
    ]
}"#;

fn load() -> (Tree, Tree) {
    let parameters = persist::from_str(PARAMETERS).unwrap();
    let can = persist::from_str(CAN).unwrap();
    (parameters, can)
}

fn monitoring_group(parameters: &Tree) -> NodeId {
    parameters
        .preorder(parameters.root())
        .find(|&id| {
            parameters.kind(id) == NodeKind::Group
                && parameters.data(id).name() == "Line Monitoring"
        })
        .unwrap()
}

#[test]
fn symbol_file_carries_annotations_from_the_parameter_tree() {
    let (parameters, can) = load();
    let sym = cansym::generate(&can, &parameters).unwrap();

    assert!(sym.starts_with("FormatVersion=5.0"), "{sym}");
    assert!(sym.contains("enum AccessLevel(0=\"User\", 1=\"Factory\")"), "{sym}");
    assert!(sym.contains("enum ControlMode(0=\"Idle\", 1=\"Run\")"), "{sym}");
    assert!(sym.contains("[StatusMessage]"), "{sym}");
    assert!(sym.contains("ID=1D000077h"), "{sym}");
    assert!(sym.contains("CycleTime=200"), "{sym}");
    // annotated signal: units, range, scaled default, access level suffix
    assert!(
        sym.contains(
            "Var=OutputCurrent signed 0,16 /u:A /f:0.1 /min:0 /max:400 /d:125 \
             /ln:\"Output Current\"\t// phase current <factory>"
        ),
        "{sym}"
    );
    assert!(sym.contains("/e:ControlMode"), "{sym}");
}

#[test]
fn c_declarations_cover_the_group() {
    let (parameters, _) = load();
    let group = monitoring_group(&parameters);

    let declarations = cgen::generate(&parameters, group).unwrap();
    assert_eq!(
        declarations,
        "\
struct LineMonitoring_s
{
  int16_t outputCurrent;
  int16_t controlMode;
};
typedef struct LineMonitoring_s LineMonitoring_t;
"
    );
}

#[test]
fn generation_is_deterministic() {
    let (parameters, can) = load();

    let first_sym = cansym::generate(&can, &parameters).unwrap();
    let second_sym = cansym::generate(&can, &parameters).unwrap();
    assert_eq!(first_sym, second_sym);

    let group = monitoring_group(&parameters);
    assert_eq!(
        cgen::generate(&parameters, group).unwrap(),
        cgen::generate(&parameters, group).unwrap()
    );
}

#[test]
fn reloaded_trees_generate_identical_artifacts() {
    let (parameters, can) = load();
    let sym = cansym::generate(&can, &parameters).unwrap();

    let parameters_reloaded =
        persist::from_str(&persist::to_string_pretty(&parameters).unwrap()).unwrap();
    let can_reloaded = persist::from_str(&persist::to_string_pretty(&can).unwrap()).unwrap();

    assert_eq!(sym, cansym::generate(&can_reloaded, &parameters_reloaded).unwrap());
}

#[test]
fn loading_rejects_a_non_root_document() {
    let result = persist::from_str(r#"{"_type": "group", "name": "G"}"#);
    assert!(matches!(
        result,
        Err(pmc::persist::LoadError::NotARoot(NodeKind::Group))
    ));
}
