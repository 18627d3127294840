//! Lays out attached tables the way the Data Commons importer reads them.

use std::path::Path;

use crate::config::InputFile;
use crate::error::{ExportError, StoreError};
use crate::sanitize::{is_valid_dcid, normalize_identifier};
use crate::store::check_shape;
use crate::table::DataTable;

/// The column heading written for a variable. Headings that already are
/// valid DCIDs are kept; free text is normalised.
pub fn export_header(variable: &str) -> String {
    if is_valid_dcid(variable) {
        variable.to_string()
    } else {
        normalize_identifier(variable)
    }
}

/// Reorders a table for export and drops ignored columns.
///
/// Variable-per-column files become `[entity, period, variables...]` in the
/// declared variable order, with variable headings passed through
/// [`export_header`]. Variable-per-row files keep the mapped entity, date,
/// variable and value columns first, then any mapped optional columns.
pub fn layout(
    file_name: &str,
    input: &InputFile,
    declared: &[String],
    table: &DataTable,
) -> Result<DataTable, StoreError> {
    let variables = check_shape(file_name, input, declared, table)?;
    let remaining: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| !input.is_ignored(c))
        .cloned()
        .collect();

    let select = |order: &[String]| {
        table.select(order).map_err(|_| StoreError::SchemaMismatch {
            file: file_name.to_string(),
            missing: order
                .iter()
                .filter(|c| table.column_index(c).is_none())
                .cloned()
                .collect(),
            unexpected: Vec::new(),
        })
    };

    match &input.column_mappings {
        None => {
            let mut order = vec![remaining[0].clone(), remaining[1].clone()];
            order.extend(variables.iter().cloned());

            let mut headers = order[..2].to_vec();
            headers.extend(variables.iter().map(|v| export_header(v)));

            Ok(select(&order)?.with_headers(headers))
        }
        Some(mappings) => {
            let [variable, entity, date, value] = mappings.required_columns();
            let mut order = vec![entity, date, variable, value];
            for column in mappings.optional_columns() {
                if remaining.contains(&column) {
                    order.push(column);
                }
            }
            select(&order)
        }
    }
}

/// Writes a table as CSV with a header row and no index column.
pub fn write_csv(path: &Path, table: &DataTable) -> Result<(), ExportError> {
    let to_error = |source: csv::Error| ExportError::WriteCsv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(to_error)?;
    writer.write_record(table.columns()).map_err(to_error)?;
    for row in table.rows() {
        writer.write_record(row).map_err(to_error)?;
    }
    writer.flush().map_err(|e| ExportError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
