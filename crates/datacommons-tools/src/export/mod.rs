//! Writes the config, data and metadata files for the importer.
//!
//! Every export validates the document first and refuses to write anything
//! when a fatal issue is found.

pub mod tabular;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span};

use crate::error::{ExportError, StoreError};
use crate::sanitize::{data_path_problem, redact_path};
use crate::settings::ExportSettings;
use crate::store::{CustomDataManager, DEFAULT_METADATA_SCOPE};
use crate::validation::ValidationIssue;

pub use tabular::{export_header, layout, write_csv};

/// Files written by [`CustomDataManager::export_all_with`].
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub config: PathBuf,
    pub data_files: Vec<PathBuf>,
    pub metadata_files: Vec<PathBuf>,
    /// Non-fatal issues found while validating.
    pub warnings: Vec<ValidationIssue>,
}

impl CustomDataManager {
    /// The validated config as a JSON value.
    pub fn config_to_value(&self) -> Result<serde_json::Value, ExportError> {
        self.validate_for_export()?;
        Ok(serde_json::to_value(&self.config)?)
    }

    /// Writes `config.json` into `dir`.
    pub fn export_config<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf, ExportError> {
        let settings = ExportSettings::default();
        let dir = dir.as_ref();
        let _span = info_span!("export_config", dir = %redact_path(dir)).entered();

        self.validate_for_export()?;
        create_dir(dir)?;
        self.write_config(dir, &settings)
    }

    /// Writes every attached table into `dir`, at its registered path.
    pub fn export_data<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>, ExportError> {
        let dir = dir.as_ref();
        let _span = info_span!("export_data", dir = %redact_path(dir)).entered();

        self.validate_for_export()?;
        if self.files_with_data().next().is_none() {
            return Err(ExportError::NoData);
        }
        create_dir(dir)?;
        self.write_data(dir)
    }

    /// Writes every metadata scope into `dir`. The default scope is written
    /// as `file_name`; other scopes keep their own names.
    pub fn export_metadata<P: AsRef<Path>>(
        &self,
        dir: P,
        file_name: &str,
        overwrite: bool,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let dir = dir.as_ref();
        let _span = info_span!("export_metadata", dir = %redact_path(dir)).entered();

        self.validate_for_export()?;
        create_dir(dir)?;
        let settings = ExportSettings {
            metadata_file_name: file_name.to_string(),
            overwrite_metadata: overwrite,
            ..ExportSettings::default()
        };
        self.write_metadata(dir, &settings)
    }

    /// Writes config, data and metadata with the default settings.
    pub fn export_all<P: AsRef<Path>>(&self, dir: P) -> Result<ExportSummary, ExportError> {
        self.export_all_with(dir, &ExportSettings::default())
    }

    /// Validates once, then writes the config, any attached data and any
    /// metadata nodes.
    pub fn export_all_with<P: AsRef<Path>>(
        &self,
        dir: P,
        settings: &ExportSettings,
    ) -> Result<ExportSummary, ExportError> {
        let dir = dir.as_ref();
        let _span = info_span!("export_all", dir = %redact_path(dir)).entered();

        let warnings = self.validate_for_export()?;
        create_dir(dir)?;

        let config = self.write_config(dir, settings)?;
        let data_files = self.write_data(dir)?;
        let metadata_files = self.write_metadata(dir, settings)?;

        info!(
            data_files = data_files.len(),
            metadata_files = metadata_files.len(),
            warnings = warnings.len(),
            "Export complete"
        );
        Ok(ExportSummary {
            config,
            data_files,
            metadata_files,
            warnings,
        })
    }

    fn write_config(&self, dir: &Path, settings: &ExportSettings) -> Result<PathBuf, ExportError> {
        let path = dir.join(&settings.config_file_name);
        let content = if settings.pretty_json {
            serde_json::to_string_pretty(&self.config)?
        } else {
            serde_json::to_string(&self.config)?
        };

        fs::write(&path, content).map_err(|e| ExportError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        debug!(file = %redact_path(&path), "Wrote config");
        Ok(path)
    }

    fn write_data(&self, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::new();

        for (name, file) in &self.data {
            let Some(table) = file.table() else {
                continue;
            };
            let Some(input) = self.config.input_files.get(name) else {
                continue;
            };

            let out = layout(name, input, file.declared_variables(), table).map_err(|source| {
                ExportError::Layout {
                    file: name.clone(),
                    source,
                }
            })?;

            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                create_dir(parent)?;
            }
            write_csv(&path, &out)?;
            debug!(file = %name, rows = out.len(), "Wrote data file");
            written.push(path);
        }

        Ok(written)
    }

    fn write_metadata(
        &self,
        dir: &Path,
        settings: &ExportSettings,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::new();

        for (scope, nodes) in self.metadata_scopes() {
            if nodes.is_empty() {
                continue;
            }
            let file_name = if scope == DEFAULT_METADATA_SCOPE {
                settings.metadata_file_name.as_str()
            } else {
                scope
            };
            if let Some(reason) = data_path_problem(file_name) {
                return Err(ExportError::Layout {
                    file: file_name.to_string(),
                    source: StoreError::InvalidPath {
                        path: file_name.to_string(),
                        reason: reason.to_string(),
                    },
                });
            }
            let path = dir.join(file_name);
            if let Some(parent) = path.parent() {
                create_dir(parent)?;
            }

            let to_error = |e: std::io::Error| ExportError::WriteFile {
                path: path.clone(),
                source: e,
            };
            let mut file = fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(settings.overwrite_metadata)
                .append(!settings.overwrite_metadata)
                .open(&path)
                .map_err(to_error)?;
            file.write_all(nodes.to_mcf().as_bytes()).map_err(to_error)?;

            debug!(file = %redact_path(&path), nodes = nodes.len(), "Wrote metadata file");
            written.push(path);
        }

        Ok(written)
    }
}

fn create_dir(dir: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(dir).map_err(|e| ExportError::CreateDirectory {
        path: dir.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variable;
    use crate::mcf::StatVarNode;
    use crate::store::DataFileOptions;
    use crate::table::DataTable;
    use tempfile::TempDir;

    fn manager() -> CustomDataManager {
        let mut manager = CustomDataManager::new();
        manager
            .add_source_and_provenance(
                "IMF",
                Some("https://www.imf.org"),
                "WEO",
                "https://www.imf.org/weo",
                false,
            )
            .unwrap();
        manager.add_variable("gdp", Variable::new("GDP"), false).unwrap();
        manager
    }

    #[test]
    fn test_export_data_without_data() {
        let dir = TempDir::new().unwrap();
        let result = manager().export_data(dir.path());
        assert!(matches!(result, Err(ExportError::NoData)));
    }

    #[test]
    fn test_invalid_document_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager();
        manager
            .register_data_file("gdp.csv", "IFS", None, DataFileOptions::new())
            .unwrap();

        let result = manager.export_all(dir.path());
        assert!(matches!(result, Err(ExportError::ConfigValidation { .. })));
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_export_all_layout() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager();
        manager.set_include_input_subdirs(true);
        let table = DataTable::from_rows(
            &["Country", "Year", "gdp"],
            &[&["USA", "2020", "21.0"]],
        )
        .unwrap();
        manager
            .register_data_file(
                "econ/gdp.csv",
                "WEO",
                Some("Country"),
                DataFileOptions::new().with_data(table),
            )
            .unwrap();
        manager
            .add_variable_to_metadata(StatVarNode::new("debt", "Debt"), DEFAULT_METADATA_SCOPE, false)
            .unwrap();

        let summary = manager.export_all(dir.path()).unwrap();

        assert_eq!(summary.config, dir.path().join("config.json"));
        assert_eq!(summary.data_files, vec![dir.path().join("econ/gdp.csv")]);
        assert_eq!(summary.metadata_files, vec![dir.path().join("custom_nodes.mcf")]);
        assert_eq!(
            fs::read_to_string(dir.path().join("econ/gdp.csv")).unwrap(),
            "Country,Year,gdp\nUSA,2020,21.0\n"
        );
        let mcf = fs::read_to_string(dir.path().join("custom_nodes.mcf")).unwrap();
        assert!(mcf.starts_with("Node: debt\nname: \"Debt\"\n"));
    }

    #[test]
    fn test_metadata_append() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager();
        manager
            .add_variable_to_metadata(StatVarNode::new("debt", "Debt"), DEFAULT_METADATA_SCOPE, false)
            .unwrap();

        manager.export_metadata(dir.path(), "nodes.mcf", true).unwrap();
        manager.export_metadata(dir.path(), "nodes.mcf", false).unwrap();

        let mcf = fs::read_to_string(dir.path().join("nodes.mcf")).unwrap();
        assert_eq!(mcf.matches("Node: debt").count(), 2);

        manager.export_metadata(dir.path(), "nodes.mcf", true).unwrap();
        let mcf = fs::read_to_string(dir.path().join("nodes.mcf")).unwrap();
        assert_eq!(mcf.matches("Node: debt").count(), 1);
    }

    #[test]
    fn test_config_to_value() {
        let value = manager().config_to_value().unwrap();
        assert_eq!(value["variables"]["gdp"]["name"], "GDP");
        assert_eq!(value["inputFiles"], serde_json::json!({}));
    }

    #[test]
    fn test_compact_json() {
        let dir = TempDir::new().unwrap();
        let settings = ExportSettings {
            pretty_json: false,
            config_file_name: "dc.json".to_string(),
            ..ExportSettings::default()
        };
        manager().export_all_with(dir.path(), &settings).unwrap();

        let content = fs::read_to_string(dir.path().join("dc.json")).unwrap();
        assert!(!content.contains('\n'));
    }
}
