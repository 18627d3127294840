//! Data file registrations and their attached tables.

use tracing::debug;

use crate::config::{ColumnMappings, InputFile, ObservationProperties};
use crate::error::{EntityKind, StoreError};
use crate::sanitize::{data_path_problem, has_subdirectory};
use crate::table::DataTable;

use super::shape::check_shape;
use super::sources::{not_found, rename_key};
use super::{CustomDataManager, DataFile};

/// Optional parts of a data file registration.
#[derive(Debug, Clone, Default)]
pub struct DataFileOptions {
    pub data: Option<DataTable>,
    /// Variables the file provides. Left empty, they are read from the
    /// columns of the attached table.
    pub variables: Vec<String>,
    pub ignore_columns: Vec<String>,
    pub observation_properties: Option<ObservationProperties>,
    pub overwrite: bool,
}

impl DataFileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, data: DataTable) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = variables.into_iter().map(Into::into).collect();
        self
    }

    pub fn ignore_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn observation_properties(mut self, properties: ObservationProperties) -> Self {
        self.observation_properties = Some(properties);
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl CustomDataManager {
    /// Registers a variable-per-column data file.
    ///
    /// The path is checked immediately, and so is the shape of `data` when
    /// given. Without data the entry is a placeholder for [`attach_data`].
    ///
    /// [`attach_data`]: CustomDataManager::attach_data
    pub fn register_data_file(
        &mut self,
        file_name: &str,
        provenance: &str,
        entity_type: Option<&str>,
        options: DataFileOptions,
    ) -> Result<(), StoreError> {
        let mut input = InputFile::implicit(provenance, entity_type.map(str::to_string));
        input.ignore_columns = options.ignore_columns;
        input.observation_properties = options.observation_properties.filter(|p| !p.is_empty());

        self.insert_data_file(
            file_name,
            input,
            options.variables,
            options.data,
            options.overwrite,
        )
    }

    /// Registers a variable-per-row data file described by column mappings.
    pub fn register_explicit_data_file(
        &mut self,
        file_name: &str,
        provenance: &str,
        column_mappings: ColumnMappings,
        options: DataFileOptions,
    ) -> Result<(), StoreError> {
        let mut input = InputFile::explicit(provenance, column_mappings);
        input.ignore_columns = options.ignore_columns;

        self.insert_data_file(
            file_name,
            input,
            options.variables,
            options.data,
            options.overwrite,
        )
    }

    /// Adds a typed `inputFiles` entry as a placeholder.
    pub fn add_input_file(
        &mut self,
        file_name: &str,
        input: InputFile,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        self.insert_data_file(file_name, input, Vec::new(), None, overwrite)
    }

    /// Attaches a table to a registered file, checking its shape against the
    /// registration. A file that already has data needs `overwrite`.
    pub fn attach_data(
        &mut self,
        file_name: &str,
        data: DataTable,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        let input = self
            .config
            .input_files
            .get(file_name)
            .ok_or_else(|| not_found(EntityKind::DataFile, file_name))?;
        let file = self.data.get(file_name).cloned().unwrap_or_default();

        if file.table.is_some() && !overwrite {
            return Err(StoreError::DuplicateFile {
                file: file_name.to_string(),
            });
        }
        check_shape(file_name, input, &file.declared_variables, &data)?;

        debug!(file = file_name, rows = data.len(), "Attaching data");
        self.data.insert(
            file_name.to_string(),
            DataFile {
                declared_variables: file.declared_variables,
                table: Some(data),
            },
        );
        Ok(())
    }

    pub fn remove_data_file(&mut self, file_name: &str) -> Result<(), StoreError> {
        self.config
            .input_files
            .shift_remove(file_name)
            .ok_or_else(|| not_found(EntityKind::DataFile, file_name))?;
        self.data.shift_remove(file_name);

        debug!(file = file_name, "Removed data file");
        Ok(())
    }

    pub fn rename_data_file(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        let index = self
            .config
            .input_files
            .get_index_of(old)
            .ok_or_else(|| not_found(EntityKind::DataFile, old))?;
        if old == new {
            return Ok(());
        }
        if self.config.input_files.contains_key(new) {
            return Err(StoreError::NameCollision {
                kind: EntityKind::DataFile,
                name: new.to_string(),
            });
        }
        self.check_path(new)?;

        debug!(from = old, to = new, "Renaming data file");
        rename_key(&mut self.config.input_files, index, new);
        if let Some(data_index) = self.data.get_index_of(old) {
            rename_key(&mut self.data, data_index, new);
        }
        Ok(())
    }

    fn insert_data_file(
        &mut self,
        file_name: &str,
        input: InputFile,
        declared_variables: Vec<String>,
        data: Option<DataTable>,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        self.check_path(file_name)?;

        if self.config.input_files.contains_key(file_name) && !overwrite {
            return Err(StoreError::DuplicateFile {
                file: file_name.to_string(),
            });
        }

        if let Some(table) = &data {
            check_shape(file_name, &input, &declared_variables, table)?;
        }

        debug!(
            file = file_name,
            provenance = %input.provenance,
            has_data = data.is_some(),
            "Registering data file"
        );
        self.config.input_files.insert(file_name.to_string(), input);
        self.data.insert(
            file_name.to_string(),
            DataFile {
                declared_variables,
                table: data,
            },
        );
        Ok(())
    }

    pub(crate) fn check_path(&self, file_name: &str) -> Result<(), StoreError> {
        let invalid = |reason: &str| StoreError::InvalidPath {
            path: file_name.to_string(),
            reason: reason.to_string(),
        };

        if let Some(reason) = data_path_problem(file_name) {
            return Err(invalid(reason));
        }
        if !file_name.to_ascii_lowercase().ends_with(".csv") {
            return Err(invalid("data files must be CSV files"));
        }
        if has_subdirectory(file_name) && !self.config.subdirs_enabled() {
            return Err(invalid(
                "subdirectories require includeInputSubdirs to be enabled",
            ));
        }
        Ok(())
    }
}
