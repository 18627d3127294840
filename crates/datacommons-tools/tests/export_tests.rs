//! Export and reload tests.
//!
//! An exported directory must load back through `DirectoryLoader` into a
//! document that validates and exports to the same files.

mod common;

use std::fs;

use assert_fs::prelude::*;
use assert_fs::TempDir;

use common::{gdp_table, imf_manager};
use datacommons_tools::config::{ColumnMappings, Variable};
use datacommons_tools::{
    CustomDataManager, DataFileOptions, DataTable, DirectoryLoader, ExportError, ExportSettings,
    IssueKind, McfNodes, StatVarGroupNode, StatVarNode, DEFAULT_METADATA_SCOPE,
};

fn populated_manager() -> CustomDataManager {
    let mut manager = imf_manager();
    manager.set_include_input_subdirs(true);
    manager
        .add_variable(
            "gdp",
            Variable::new("Gross Domestic Product")
                .with_description("Gross domestic product at current prices")
                .with_group("Economy"),
            false,
        )
        .unwrap();
    manager
        .register_data_file(
            "econ/gdp.csv",
            "WEO",
            Some("Country"),
            DataFileOptions::new()
                .with_variables(["gdp"])
                .with_data(gdp_table()),
        )
        .unwrap();
    manager
        .add_variable_group_to_metadata(
            StatVarGroupNode::new("dcid:imf/g/Economy", "Economy", "dcid:dc/g/Root"),
            DEFAULT_METADATA_SCOPE,
            false,
        )
        .unwrap();
    manager
        .add_variable_to_metadata(
            StatVarNode::new("imf/debt", "Government debt")
                .member_of("dcid:imf/g/Economy")
                .provenance("WEO"),
            DEFAULT_METADATA_SCOPE,
            false,
        )
        .unwrap();
    manager
}

fn read(dir: &TempDir, name: &str) -> String {
    fs::read_to_string(dir.child(name).path()).unwrap()
}

#[test]
fn test_export_reload_round_trip() {
    let first = TempDir::new().unwrap();
    let manager = populated_manager();

    let summary = manager.export_all(first.path()).unwrap();
    assert!(summary.warnings.is_empty());
    assert_eq!(summary.data_files.len(), 1);
    assert_eq!(summary.metadata_files.len(), 1);

    let reloaded = DirectoryLoader::new(first.path()).load().unwrap();
    assert_eq!(reloaded.validate(), vec![]);
    assert_eq!(reloaded.config(), manager.config());
    assert_eq!(
        reloaded.data_file("econ/gdp.csv").unwrap().table(),
        Some(&gdp_table())
    );
    let nodes = reloaded.metadata(DEFAULT_METADATA_SCOPE).unwrap();
    assert!(nodes.contains("imf/debt"));
    assert!(nodes.contains("dcid:imf/g/Economy"));

    let second = TempDir::new().unwrap();
    reloaded.export_all(second.path()).unwrap();
    for name in ["config.json", "econ/gdp.csv", "custom_nodes.mcf"] {
        assert_eq!(read(&first, name), read(&second, name), "{} differs", name);
    }
}

#[test]
fn test_explicit_file_export() {
    let dir = TempDir::new().unwrap();
    let mut manager = imf_manager();
    let data = DataTable::from_rows(
        &["value", "variable", "date", "entity", "unit"],
        &[
            &["21.06", "gdp", "2020", "country/USA", "USDollar"],
            &["331", "population", "2020", "country/USA", ""],
        ],
    )
    .unwrap();
    manager
        .register_explicit_data_file(
            "observations.csv",
            "WEO",
            ColumnMappings::default(),
            DataFileOptions::new().with_data(data),
        )
        .unwrap();

    manager.export_data(dir.path()).unwrap();

    assert_eq!(
        read(&dir, "observations.csv"),
        "entity,date,variable,value,unit\n\
         country/USA,2020,gdp,21.06,USDollar\n\
         country/USA,2020,population,331,\n"
    );
    assert_eq!(
        manager.data_variables("observations.csv"),
        Some(vec!["gdp".to_string(), "population".to_string()])
    );
}

#[test]
fn test_headers_normalized_on_export() {
    let dir = TempDir::new().unwrap();
    let mut manager = imf_manager();
    let data = DataTable::from_rows(&["Country", "Year", "GDP (current US$)"], &[&["USA", "2020", "1"]])
        .unwrap();
    manager
        .register_data_file("gdp.csv", "WEO", Some("Country"), DataFileOptions::new().with_data(data))
        .unwrap();

    manager.export_data(dir.path()).unwrap();

    let header = read(&dir, "gdp.csv").lines().next().unwrap().to_string();
    assert_eq!(header, "Country,Year,gdpCurrentUs");
}

#[test]
fn test_invalid_document_is_not_exported() {
    let dir = TempDir::new().unwrap();
    let mut manager = populated_manager();
    manager.remove_source("IMF").unwrap();

    match manager.export_all(dir.path()) {
        Err(ExportError::ConfigValidation { issues }) => {
            assert!(issues
                .iter()
                .any(|issue| issue.kind == IssueKind::ReferentialIntegrity));
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert!(!dir.child("config.json").path().exists());
}

#[test]
fn test_custom_file_names() {
    let dir = TempDir::new().unwrap();
    let settings = ExportSettings::from_str(
        r#"{ "configFileName": "dc_config.json", "metadataFileName": "imf.mcf" }"#,
    )
    .unwrap();

    let summary = populated_manager()
        .export_all_with(dir.path(), &settings)
        .unwrap();

    assert_eq!(summary.config, dir.path().join("dc_config.json"));
    assert_eq!(summary.metadata_files, vec![dir.path().join("imf.mcf")]);
    let nodes = McfNodes::from_file(dir.child("imf.mcf").path()).unwrap();
    assert_eq!(nodes.len(), 2);
}

#[test]
fn test_metadata_file_name_cannot_leave_export_directory() {
    let dir = TempDir::new().unwrap();
    let inner = dir.child("out");
    let settings = ExportSettings::from_str(r#"{ "metadataFileName": "../escaped.mcf" }"#).unwrap();

    let result = populated_manager().export_all_with(inner.path(), &settings);

    assert!(matches!(result, Err(ExportError::Layout { .. })));
    assert!(!dir.child("escaped.mcf").path().exists());
}

#[test]
fn test_metadata_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.child("vars.mcf");
    file.write_str(
        "// Government finance\n\
         Node: dcid:imf/debt\n\
         typeOf: dcid:StatisticalVariable\n\
         name: \"Government debt\"\n\
         memberOf: dcid:imf/g/Economy\n\
         \n\
         Node: dcid:imf/g/Economy\n\
         typeOf: dcid:StatVarGroup\n\
         name: \"Economy\"\n\
         specializationOf: dcid:dc/g/Root\n",
    )
    .unwrap();

    let manager = CustomDataManager::new()
        .with_metadata_file(file.path())
        .unwrap();
    let nodes = manager.metadata("vars.mcf").unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(
        nodes.get("dcid:imf/debt").unwrap().get("memberOf"),
        Some("dcid:imf/g/Economy")
    );

    let reparsed = McfNodes::parse(&nodes.to_mcf()).unwrap();
    assert_eq!(&reparsed, nodes);
}
