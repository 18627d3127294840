//! Loads a whole export directory back into a document.

use std::path::{Path, PathBuf};
use tracing::info_span;
use walkdir::WalkDir;

use crate::config::load_fragment;
use crate::error::{ConfigError, MergeError};
use crate::mcf::McfNodes;
use crate::sanitize::redact_path;
use crate::store::CustomDataManager;
use crate::table::DataTable;

use super::{ConfigFragment, ConfigMerger};

/// Reads config fragments, metadata files and data files from a directory.
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Merges every `*.json` fragment, loads every `*.mcf` file into a scope
    /// named by its relative path, then attaches each CSV whose relative path
    /// is a registered input file. Hidden files and directories are skipped.
    pub fn load(&self) -> Result<CustomDataManager, MergeError> {
        let _span = info_span!("load_directory", dir = %redact_path(&self.dir)).entered();

        if !self.dir.is_dir() {
            return Err(ConfigError::DirectoryNotFound(self.dir.clone()).into());
        }

        let mut merger = ConfigMerger::new();
        let mut metadata: Vec<(String, PathBuf)> = Vec::new();
        let mut tables: Vec<(String, PathBuf)> = Vec::new();

        for entry in WalkDir::new(&self.dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ConfigError::ReadDirectory {
                path: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(relative) = self.relative_name(path) else {
                continue;
            };

            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();
            match ext.as_str() {
                "json" => match load_fragment(path) {
                    Ok(config) => {
                        merger.add(ConfigFragment::new(relative, config));
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", path.display(), e);
                        return Err(e.into());
                    }
                },
                "mcf" => metadata.push((relative, path.to_path_buf())),
                "csv" => tables.push((relative, path.to_path_buf())),
                _ => log::debug!("Skipping {}", path.display()),
            }
        }

        let mut manager = merger.merge()?;

        for (scope, path) in metadata {
            let nodes = McfNodes::from_file(&path).inspect_err(|e| {
                log::warn!("Failed to load {}: {}", path.display(), e);
            })?;
            manager.load_metadata(&scope, nodes, false)?;
        }

        for (name, path) in tables {
            if manager.input_file(&name).is_none() {
                log::debug!("{} is not a registered input file", name);
                continue;
            }
            let table = DataTable::from_csv_path(&path)?;
            manager.attach_data(&name, table, false)?;
        }

        log::info!(
            "Loaded {} input files and {} metadata files from {}",
            manager.config().input_files.len(),
            manager.metadata_scopes().count(),
            self.dir.display()
        );
        Ok(manager)
    }

    /// Path relative to the root with `/` separators, or `None` when any
    /// component is hidden.
    fn relative_name(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.dir).ok()?;
        let mut parts = Vec::new();
        for component in relative.components() {
            let part = component.as_os_str().to_str()?;
            if part.starts_with('.') {
                return None;
            }
            parts.push(part);
        }
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::fs;
    use tempfile::TempDir;

    const SOURCES: &str = r#"{
        "sources": {
            "IMF": {
                "url": "https://www.imf.org",
                "provenances": { "WEO": "https://www.imf.org/weo" }
            }
        }
    }"#;

    const FILES: &str = r#"{
        "inputFiles": {
            "gdp.csv": { "entityType": "Country", "provenance": "WEO" }
        }
    }"#;

    #[test]
    fn test_missing_directory() {
        let result = DirectoryLoader::new("/nonexistent/datacommons").load();
        assert!(matches!(
            result,
            Err(MergeError::Config(ConfigError::DirectoryNotFound(_)))
        ));
    }

    #[test]
    fn test_loads_fragments_metadata_and_data() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_sources.json"), SOURCES).unwrap();
        fs::write(dir.path().join("b_files.json"), FILES).unwrap();
        fs::write(dir.path().join("gdp.csv"), "Country,Year,gdp\nUSA,2020,1\n").unwrap();
        fs::write(dir.path().join("unrelated.csv"), "a,b\n1,2\n").unwrap();
        fs::create_dir(dir.path().join("nodes")).unwrap();
        fs::write(dir.path().join("nodes/vars.mcf"), "Node: gdp\nname: \"GDP\"\n").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/broken.json"), "{ not json").unwrap();

        let manager = DirectoryLoader::new(dir.path()).load().unwrap();

        assert!(manager.config().has_provenance("WEO"));
        assert!(manager.data_file("gdp.csv").unwrap().has_data());
        assert!(manager.metadata("nodes/vars.mcf").unwrap().contains("gdp"));
        assert!(manager.input_file("unrelated.csv").is_none());
        assert_eq!(manager.validate(), vec![]);
    }

    #[test]
    fn test_invalid_fragment_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), r#"{ "unknown": 1 }"#).unwrap();

        assert!(matches!(
            DirectoryLoader::new(dir.path()).load(),
            Err(MergeError::Config(ConfigError::ParseJson(_)))
        ));
    }

    #[test]
    fn test_mismatched_data_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sources.json"), SOURCES).unwrap();
        fs::write(dir.path().join("files.json"), FILES).unwrap();
        fs::write(dir.path().join("gdp.csv"), "Country\nUSA\n").unwrap();

        assert!(matches!(
            DirectoryLoader::new(dir.path()).load(),
            Err(MergeError::Store(StoreError::SchemaMismatch { .. }))
        ));
    }
}
