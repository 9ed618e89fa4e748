// pmc — parameter model compiler
//
// Canonical UUID-bearing parameter tree plus the generators that flatten
// it into device artifacts: CAN symbol files, C declarations, and SunSpec
// register maps.

pub mod array;
pub mod cansym;
pub mod cgen;
pub mod id;
pub mod identity;
pub mod names;
pub mod node;
pub mod persist;
pub mod schema;
pub mod sunspec;
pub mod symfmt;
pub mod tree;
