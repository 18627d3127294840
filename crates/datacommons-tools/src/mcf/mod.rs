//! Metadata declaration files (MCF).
//!
//! Variables, groups and other nodes declared outside the config document.
//! Each node is a block of `key: value` lines headed by `Node: <id>`.

pub mod csv_import;
pub mod groups;
pub mod node;
pub mod quoting;
pub mod statvar;

pub use csv_import::{csv_metadata_to_nodes, CsvNodeOptions};
pub use groups::build_groups_from_paths;
pub use node::{McfNode, McfNodes};
pub use statvar::{StatType, StatVarGroupNode, StatVarNode, ROOT_GROUP};
