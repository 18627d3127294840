//! In-memory tabular datasets attached to data file registrations.

use std::io::Read;
use std::path::Path;

use crate::error::ConfigError;

/// A rectangular table of string cells with a header row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Builds a table, rejecting duplicate headings and ragged rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, ConfigError> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(ConfigError::MalformedTable(format!(
                    "duplicate column '{}'",
                    column
                )));
            }
        }

        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ConfigError::MalformedTable(format!(
                "row {} has {} cells, expected {}",
                i + 1,
                row.len(),
                columns.len()
            )));
        }

        Ok(Self { columns, rows })
    }

    /// Convenience constructor from string slices.
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Result<Self, ConfigError> {
        Self::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Reads a CSV file whose first record is the header.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_csv_reader(file).map_err(|e| match e {
            ConfigError::ReadCsv { source, .. } => ConfigError::ReadCsv {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let to_error = |source: csv::Error| ConfigError::ReadCsv {
            path: Default::default(),
            source,
        };

        let mut reader = csv::Reader::from_reader(reader);
        let columns: Vec<String> = reader
            .headers()
            .map_err(to_error)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(to_error)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns a new table with the given columns, in that order.
    pub fn select(&self, columns: &[String]) -> Result<Self, ConfigError> {
        let indices = columns
            .iter()
            .map(|c| {
                self.column_index(c)
                    .ok_or_else(|| ConfigError::MalformedTable(format!("no column '{}'", c)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Self::new(columns.to_vec(), rows)
    }

    /// Renames a heading in place. Returns false if the column is absent.
    pub(crate) fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(i) => {
                self.columns[i] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Replaces the header row, keeping the cells.
    pub(crate) fn with_headers(mut self, headers: Vec<String>) -> Self {
        debug_assert_eq!(headers.len(), self.columns.len());
        self.columns = headers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_csv_reader() {
        let csv = "Country,Year,gdp\nUSA,2020,21.0\nFRA,2020,2.6\n";
        let table = DataTable::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.columns(), &["Country", "Year", "gdp"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][0], "FRA");
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = DataTable::from_rows(&["a", "b"], &[&["1"]]);
        assert!(matches!(result, Err(ConfigError::MalformedTable(_))));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = DataTable::from_rows(&["a", "a"], &[]);
        assert!(matches!(result, Err(ConfigError::MalformedTable(_))));
    }

    #[test]
    fn test_select_reorders() {
        let table =
            DataTable::from_rows(&["b", "a", "c"], &[&["2", "1", "3"]]).unwrap();
        let selected = table
            .select(&["a".to_string(), "b".to_string()])
            .unwrap();

        assert_eq!(selected.columns(), &["a", "b"]);
        assert_eq!(selected.rows()[0], vec!["1", "2"]);
    }

    #[test]
    fn test_rename_column() {
        let mut table = DataTable::from_rows(&["a"], &[]).unwrap();
        assert!(table.rename_column("a", "z"));
        assert!(!table.rename_column("missing", "y"));
        assert_eq!(table.columns(), &["z"]);
    }
}
