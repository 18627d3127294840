use crate::config::{ColumnMappings, InputFile};
use crate::error::StoreError;
use crate::table::DataTable;

/// Checks a table against its file registration and returns the variables the
/// table provides.
///
/// Variable-per-column files: after dropping ignored columns the first column
/// is the entity, the second the period, and the rest must be exactly the
/// declared variables (or become the variables when none are declared).
///
/// Variable-per-row files: the mapped variable, entity, date and value columns
/// must be present and nothing else but mapped optional columns. Variables are
/// the distinct values of the variable column.
pub(crate) fn check_shape(
    file: &str,
    input: &InputFile,
    declared: &[String],
    table: &DataTable,
) -> Result<Vec<String>, StoreError> {
    let remaining: Vec<&String> = table
        .columns()
        .iter()
        .filter(|c| !input.is_ignored(c))
        .collect();

    match &input.column_mappings {
        Some(mappings) => check_explicit(file, mappings, declared, table, &remaining),
        None => check_implicit(file, declared, &remaining),
    }
}

fn check_implicit(
    file: &str,
    declared: &[String],
    remaining: &[&String],
) -> Result<Vec<String>, StoreError> {
    if remaining.len() < 2 {
        let missing = ["entity column", "period column"][remaining.len()..]
            .iter()
            .map(|s| s.to_string())
            .collect();
        return Err(StoreError::SchemaMismatch {
            file: file.to_string(),
            missing,
            unexpected: Vec::new(),
        });
    }

    let value_columns: Vec<String> = remaining[2..].iter().map(|c| c.to_string()).collect();
    if declared.is_empty() {
        return Ok(value_columns);
    }

    let missing: Vec<String> = declared
        .iter()
        .filter(|v| !value_columns.contains(v))
        .cloned()
        .collect();
    let unexpected: Vec<String> = value_columns
        .iter()
        .filter(|c| !declared.contains(c))
        .cloned()
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(StoreError::SchemaMismatch {
            file: file.to_string(),
            missing,
            unexpected,
        });
    }

    Ok(declared.to_vec())
}

fn check_explicit(
    file: &str,
    mappings: &ColumnMappings,
    declared: &[String],
    table: &DataTable,
    remaining: &[&String],
) -> Result<Vec<String>, StoreError> {
    let required = mappings.required_columns();
    let optional = mappings.optional_columns();

    let missing: Vec<String> = required
        .iter()
        .filter(|c| !remaining.contains(c))
        .cloned()
        .collect();
    let unexpected: Vec<String> = remaining
        .iter()
        .filter(|c| !required.contains(**c) && !optional.contains(**c))
        .map(|c| c.to_string())
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(StoreError::SchemaMismatch {
            file: file.to_string(),
            missing,
            unexpected,
        });
    }

    let mut found: Vec<String> = Vec::new();
    if let Some(index) = table.column_index(&required[0]) {
        for row in table.rows() {
            let value = row[index].trim();
            if !value.is_empty() && !found.iter().any(|f| f == value) {
                found.push(value.to_string());
            }
        }
    }

    if declared.is_empty() {
        return Ok(found);
    }

    let missing: Vec<String> = declared
        .iter()
        .filter(|v| !found.contains(v))
        .cloned()
        .collect();
    let unexpected: Vec<String> = found
        .into_iter()
        .filter(|v| !declared.contains(v))
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(StoreError::SchemaMismatch {
            file: file.to_string(),
            missing,
            unexpected,
        });
    }

    Ok(declared.to_vec())
}
