//! Shared builders for datacommons-tools integration tests.

#![allow(dead_code)]

use datacommons_tools::config::{Config, InputFile, Source, Variable};
use datacommons_tools::{CustomDataManager, DataTable};

pub const IMF_URL: &str = "https://www.imf.org";
pub const WEO_URL: &str = "https://www.imf.org/weo";

/// Builder for `Config` documents used as merge fragments.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, name: &str, url: &str, provenances: &[(&str, &str)]) -> Self {
        let mut source = Source::new(url);
        for (provenance, url) in provenances {
            source = source.with_provenance(*provenance, *url);
        }
        self.config.sources.insert(name.to_string(), source);
        self
    }

    pub fn variable(mut self, id: &str, name: &str) -> Self {
        self.config
            .variables
            .insert(id.to_string(), Variable::new(name));
        self
    }

    pub fn input_file(mut self, name: &str, provenance: &str, entity_type: &str) -> Self {
        self.config.input_files.insert(
            name.to_string(),
            InputFile::implicit(provenance, Some(entity_type.to_string())),
        );
        self
    }

    pub fn include_subdirs(mut self, value: bool) -> Self {
        self.config.include_input_subdirs = Some(value);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// A document holding source "IMF" with provenance "WEO".
pub fn imf_manager() -> CustomDataManager {
    let mut manager = CustomDataManager::new();
    manager
        .add_source("IMF", IMF_URL)
        .expect("Failed to add source");
    manager
        .add_source_and_provenance("IMF", None, "WEO", WEO_URL, false)
        .expect("Failed to add provenance");
    manager
}

/// A one-row table with the given columns.
pub fn table(columns: &[&str]) -> DataTable {
    let row: Vec<String> = (0..columns.len()).map(|i| format!("v{}", i)).collect();
    let row: Vec<&str> = row.iter().map(String::as_str).collect();
    DataTable::from_rows(columns, &[row.as_slice()]).expect("Failed to build table")
}

/// `[Country, Year, gdp]` with two observations.
pub fn gdp_table() -> DataTable {
    DataTable::from_rows(
        &["Country", "Year", "gdp"],
        &[&["USA", "2020", "21.06"], &["FRA", "2020", "2.63"]],
    )
    .expect("Failed to build table")
}
