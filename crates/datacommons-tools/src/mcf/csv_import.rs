//! Reads StatVar declarations from a spreadsheet-style CSV.

use indexmap::IndexMap;
use std::path::Path;

use crate::error::{ConfigError, Result, StoreError};
use crate::table::DataTable;

use super::node::McfNode;
use super::quoting::{is_list_property, parse_str_or_list, quoted_list};
use super::statvar::STAT_VAR_TYPE;

/// How CSV columns map onto node properties.
#[derive(Debug, Clone, Default)]
pub struct CsvNodeOptions {
    /// Column heading -> property name.
    pub column_to_property: IndexMap<String, String>,
    pub ignore_columns: Vec<String>,
}

impl CsvNodeOptions {
    pub fn map_column(mut self, column: impl Into<String>, property: impl Into<String>) -> Self {
        self.column_to_property.insert(column.into(), property.into());
        self
    }

    pub fn ignore(mut self, column: impl Into<String>) -> Self {
        self.ignore_columns.push(column.into());
        self
    }
}

/// Reads one StatVar node per row. Empty cells are skipped; `Node` and
/// `name` are required once columns are mapped.
pub fn csv_metadata_to_nodes<P: AsRef<Path>>(
    path: P,
    options: &CsvNodeOptions,
) -> Result<Vec<McfNode>> {
    let table = DataTable::from_csv_path(path)?;
    table_to_nodes(&table, options)
}

pub fn table_to_nodes(table: &DataTable, options: &CsvNodeOptions) -> Result<Vec<McfNode>> {
    let mut properties = Vec::with_capacity(table.columns().len());
    for column in table.columns() {
        if options.ignore_columns.contains(column) {
            properties.push(None);
            continue;
        }
        let property = options
            .column_to_property
            .get(column)
            .cloned()
            .unwrap_or_else(|| column.clone());
        if properties.iter().flatten().any(|p: &String| *p == property) {
            return Err(ConfigError::MalformedTable(format!(
                "more than one column maps to property '{}'",
                property
            ))
            .into());
        }
        properties.push(Some(property));
    }

    for required in ["Node", "name"] {
        if !properties.iter().flatten().any(|p| p == required) {
            return Err(ConfigError::MalformedTable(format!(
                "metadata CSV has no '{}' column",
                required
            ))
            .into());
        }
    }

    let mut nodes = Vec::with_capacity(table.len());
    for (row_index, row) in table.rows().iter().enumerate() {
        let mut node = McfNode::new("");
        for (property, cell) in properties.iter().zip(row) {
            let Some(property) = property else {
                continue;
            };
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            node.set(property.clone(), cell_value(property, cell));
        }

        if node.id().is_empty() {
            return Err(StoreError::InvalidNode {
                id: format!("row {}", row_index + 1),
                reason: "missing 'Node' value".to_string(),
            }
            .into());
        }
        if node.get("name").is_none() {
            return Err(StoreError::InvalidNode {
                id: node.id().to_string(),
                reason: "missing 'name' value".to_string(),
            }
            .into());
        }
        if node.type_of().is_none() {
            node.set("typeOf", STAT_VAR_TYPE);
        }
        if node.get("statType").is_none() {
            node.set("statType", "dcid:measuredValue");
        }

        nodes.push(node);
    }

    Ok(nodes)
}

fn cell_value(property: &str, cell: &str) -> String {
    if !is_list_property(property) {
        return cell.to_string();
    }
    let items = parse_str_or_list(cell);
    if property == "searchDescription" {
        quoted_list(&items)
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataCommonsError;

    #[test]
    fn test_rows_become_stat_vars() {
        let table = DataTable::from_csv_reader(
            "Node,name,memberOf,searchDescription,notes\n\
             gdp,GDP,\"dcid:a/g/X, dcid:a/g/Y\",\"[\"\"output\"\", \"\"growth\"\"]\",skip me\n\
             debt,Debt,,,\n"
                .as_bytes(),
        )
        .unwrap();
        let options = CsvNodeOptions::default().ignore("notes");

        let nodes = table_to_nodes(&table, &options).unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].get("memberOf"), Some("dcid:a/g/X, dcid:a/g/Y"));
        assert_eq!(
            nodes[0].get("searchDescription"),
            Some("\"output\", \"growth\"")
        );
        assert_eq!(nodes[0].get("notes"), None);
        assert_eq!(nodes[1].get("memberOf"), None);
        assert_eq!(nodes[1].type_of(), Some(STAT_VAR_TYPE));
    }

    #[test]
    fn test_column_mapping() {
        let table =
            DataTable::from_csv_reader("indicator,label\ngdp,GDP\n".as_bytes()).unwrap();
        let options = CsvNodeOptions::default()
            .map_column("indicator", "Node")
            .map_column("label", "name");

        let nodes = table_to_nodes(&table, &options).unwrap();
        assert_eq!(nodes[0].id(), "gdp");
        assert_eq!(nodes[0].get("name"), Some("GDP"));
    }

    #[test]
    fn test_missing_name_value() {
        let table = DataTable::from_csv_reader("Node,name\ngdp,\n".as_bytes()).unwrap();
        let result = table_to_nodes(&table, &CsvNodeOptions::default());
        assert!(matches!(
            result,
            Err(DataCommonsError::Store(StoreError::InvalidNode { .. }))
        ));
    }

    #[test]
    fn test_missing_node_column() {
        let table = DataTable::from_csv_reader("name\nGDP\n".as_bytes()).unwrap();
        assert!(table_to_nodes(&table, &CsvNodeOptions::default()).is_err());
    }
}
