//! The in-memory document: config, attached data and metadata files.
//!
//! Every mutation checks all of its preconditions before touching state, so
//! a failed call leaves the manager exactly as it was.

mod files;
mod shape;
mod sources;
mod variables;

use indexmap::IndexMap;
use std::fmt;
use std::path::Path;

use crate::config::{load_config, Config, InputFile};
use crate::error::{ConfigError, DataCommonsError, EntityKind, StoreError};
use crate::mcf::McfNodes;
use crate::sanitize::data_path_problem;
use crate::table::DataTable;

pub use files::DataFileOptions;
pub use sources::ProvenanceReferences;
pub use variables::VariableTarget;

pub(crate) use shape::check_shape;

/// Metadata file that receives nodes when no other scope is named.
pub const DEFAULT_METADATA_SCOPE: &str = "custom_nodes.mcf";

/// Store-side state of a registered data file that is not part of the config
/// document itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFile {
    /// Variables the caller declared for the file. Empty means they are read
    /// from the columns of the attached table.
    pub(crate) declared_variables: Vec<String>,
    pub(crate) table: Option<DataTable>,
}

impl DataFile {
    pub fn declared_variables(&self) -> &[String] {
        &self.declared_variables
    }

    pub fn table(&self) -> Option<&DataTable> {
        self.table.as_ref()
    }

    pub fn has_data(&self) -> bool {
        self.table.is_some()
    }
}

/// Holds a Data Commons config document and everything exported with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomDataManager {
    pub(crate) config: Config,
    pub(crate) data: IndexMap<String, DataFile>,
    pub(crate) metadata: IndexMap<String, McfNodes>,
}

impl CustomDataManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing config. Every input file starts as a placeholder.
    pub fn from_config(config: Config) -> Self {
        let data = config
            .input_files
            .keys()
            .map(|name| (name.clone(), DataFile::default()))
            .collect();

        Self {
            config,
            data,
            metadata: IndexMap::new(),
        }
    }

    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(Self::from_config(load_config(path)?))
    }

    /// Loads an MCF file into a metadata scope named after the file.
    pub fn with_metadata_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, DataCommonsError> {
        let path = path.as_ref();
        let scope = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_METADATA_SCOPE)
            .to_string();
        let nodes = McfNodes::from_file(path)?;
        self.load_metadata(&scope, nodes, false)?;
        Ok(self)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn input_file(&self, file_name: &str) -> Option<&InputFile> {
        self.config.input_files.get(file_name)
    }

    pub fn data_file(&self, file_name: &str) -> Option<&DataFile> {
        self.data.get(file_name)
    }

    /// Registered files that have a table attached, in registration order.
    pub fn files_with_data(&self) -> impl Iterator<Item = (&str, &DataTable)> {
        self.data
            .iter()
            .filter_map(|(name, file)| file.table.as_ref().map(|t| (name.as_str(), t)))
    }

    /// The variables a data file provides: declared ones, or those read from
    /// its attached table.
    pub fn data_variables(&self, file_name: &str) -> Option<Vec<String>> {
        let input = self.config.input_files.get(file_name)?;
        let file = self.data.get(file_name)?;
        match &file.table {
            Some(table) => check_shape(file_name, input, &file.declared_variables, table).ok(),
            None => Some(file.declared_variables.clone()),
        }
    }

    pub fn metadata(&self, scope: &str) -> Option<&McfNodes> {
        self.metadata.get(scope)
    }

    pub fn metadata_scopes(&self) -> impl Iterator<Item = (&str, &McfNodes)> {
        self.metadata.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn set_include_input_subdirs(&mut self, value: bool) {
        tracing::debug!(value, "Setting includeInputSubdirs");
        self.config.include_input_subdirs = Some(value);
    }

    pub fn set_group_stat_vars_by_property(&mut self, value: bool) {
        tracing::debug!(value, "Setting groupStatVarsByProperty");
        self.config.group_stat_vars_by_property = Some(value);
    }

    /// Adds every node of a parsed metadata file to a scope. Fails without
    /// changes if any node id is already present and `overwrite` is unset.
    pub fn load_metadata(
        &mut self,
        scope: &str,
        nodes: McfNodes,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        check_scope(scope)?;
        if !overwrite {
            if let Some(existing) = self.metadata.get(scope) {
                if let Some(id) = nodes.ids().find(|id| existing.contains(id)) {
                    return Err(StoreError::DuplicateNode {
                        id: id.to_string(),
                        scope: scope.to_string(),
                    });
                }
            }
        }

        tracing::debug!(scope, nodes = nodes.len(), "Loading metadata nodes");
        let target = self.metadata.entry(scope.to_string()).or_default();
        for node in nodes.iter() {
            target.insert(node.clone(), true);
        }
        Ok(())
    }

    pub(crate) fn scope_mut(&mut self, scope: &str) -> Result<&mut McfNodes, StoreError> {
        self.metadata.get_mut(scope).ok_or_else(|| StoreError::NotFound {
            kind: EntityKind::MetadataScope,
            name: scope.to_string(),
        })
    }

    fn metadata_node_count(&self) -> usize {
        self.metadata.values().map(McfNodes::len).sum()
    }
}

/// Scopes become file names under the export directory, so they follow the
/// same rules as data file paths.
pub(crate) fn check_scope(scope: &str) -> Result<(), StoreError> {
    match data_path_problem(scope) {
        Some(reason) => Err(StoreError::InvalidPath {
            path: scope.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

impl fmt::Display for CustomDataManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |value: Option<bool>| match value {
            Some(v) => v.to_string(),
            None => "unset".to_string(),
        };

        writeln!(f, "CustomDataManager")?;
        writeln!(
            f,
            "  {} input files, {} with data",
            self.config.input_files.len(),
            self.files_with_data().count()
        )?;
        writeln!(f, "  {} sources", self.config.sources.len())?;
        writeln!(
            f,
            "  {} variables ({} in config, {} in metadata files)",
            self.config.variables.len() + self.metadata_node_count(),
            self.config.variables.len(),
            self.metadata_node_count()
        )?;
        write!(
            f,
            "  flags: includeInputSubdirs={}, groupStatVarsByProperty={}",
            flag(self.config.include_input_subdirs),
            flag(self.config.group_stat_vars_by_property)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Source;
    use crate::mcf::McfNode;

    #[test]
    fn test_from_config_creates_placeholders() {
        let mut config = Config::new();
        config
            .input_files
            .insert("gdp.csv".to_string(), InputFile::implicit("WEO", None));

        let manager = CustomDataManager::from_config(config);
        assert!(manager.data_file("gdp.csv").is_some());
        assert!(!manager.data_file("gdp.csv").unwrap().has_data());
    }

    #[test]
    fn test_flags_are_idempotent() {
        let mut manager = CustomDataManager::new();
        manager.set_include_input_subdirs(true);
        let once = manager.clone();
        manager.set_include_input_subdirs(true);
        assert_eq!(manager, once);
        assert!(manager.config().subdirs_enabled());
    }

    #[test]
    fn test_load_metadata_rejects_duplicates_atomically() {
        let mut manager = CustomDataManager::new();
        let mut first = McfNodes::new();
        first.insert(McfNode::new("a"), false);
        manager.load_metadata("x.mcf", first, false).unwrap();

        let mut second = McfNodes::new();
        second.insert(McfNode::new("b"), false);
        second.insert(McfNode::new("a"), false);
        let result = manager.load_metadata("x.mcf", second, false);

        assert!(matches!(result, Err(StoreError::DuplicateNode { .. })));
        assert_eq!(manager.metadata("x.mcf").unwrap().len(), 1);
    }

    #[test]
    fn test_display_summary() {
        let mut config = Config::new();
        config
            .sources
            .insert("IMF".to_string(), Source::new("https://imf.org"));
        let manager = CustomDataManager::from_config(config);

        let summary = manager.to_string();
        assert!(summary.contains("0 input files, 0 with data"));
        assert!(summary.contains("1 sources"));
        assert!(summary.contains("includeInputSubdirs=unset"));
    }
}
