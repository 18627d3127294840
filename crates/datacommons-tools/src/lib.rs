pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod mcf;
pub mod merge;
pub mod sanitize;
pub mod settings;
pub mod store;
pub mod table;
pub mod validation;

pub use config::{load_config, load_config_from_str, Config, InputFile, Source, Variable};
pub use error::{
    ConfigError, DataCommonsError, EntityKind, ExportError, MergeConflict, MergeError, Result,
    StoreError,
};
pub use export::ExportSummary;
pub use mcf::{CsvNodeOptions, McfNode, McfNodes, StatType, StatVarGroupNode, StatVarNode};
pub use merge::{ConfigFragment, ConfigMerger, DirectoryLoader};
pub use sanitize::{is_valid_dcid, normalize_identifier};
pub use settings::ExportSettings;
pub use store::{
    CustomDataManager, DataFileOptions, ProvenanceReferences, VariableTarget,
    DEFAULT_METADATA_SCOPE,
};
pub use table::DataTable;
pub use validation::{ConfigValidator, IssueKind, Severity, ValidationIssue};
