use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config.json");

/// Loads a complete config document, checking it against the embedded schema.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = read_file(path.as_ref())?;
    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    let errors = schema_errors(&json_value)?;
    if !errors.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: errors.join("; "),
        });
    }

    let config: Config = serde_json::from_value(json_value)?;
    Ok(config)
}

/// Loads a partial config document. Fragments may omit required sections and
/// may reference provenances defined in other fragments, so only the typed
/// shape is enforced here.
pub fn load_fragment<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = read_file(path.as_ref())?;
    load_fragment_from_str(&content)
}

pub fn load_fragment_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    Ok(config)
}

/// Runs the embedded JSON Schema against a config value and returns every
/// violation found.
pub fn schema_errors(json_value: &serde_json::Value) -> Result<Vec<String>, ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let compiled = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    Ok(compiled
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect())
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_config() {
        let config_json = r#"
        {
            "includeInputSubdirs": true,
            "inputFiles": {
                "gdp.csv": {
                    "entityType": "Country",
                    "provenance": "WEO",
                    "observationProperties": { "unit": "USDollar" }
                }
            },
            "variables": {
                "gdp": { "name": "Gross domestic product", "group": "Economy" }
            },
            "sources": {
                "IMF": {
                    "url": "https://www.imf.org",
                    "provenances": { "WEO": "https://www.imf.org/weo" }
                }
            }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.include_input_subdirs, Some(true));
        assert_eq!(config.input_files["gdp.csv"].provenance, "WEO");
        assert_eq!(
            config.variables["gdp"].group.as_deref(),
            Some("Economy")
        );
        assert!(config.has_provenance("WEO"));
    }

    #[test]
    fn test_missing_sources_section() {
        let result = load_config_from_str(r#"{ "inputFiles": {} }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_non_csv_input_file_rejected() {
        let config_json = r#"
        {
            "inputFiles": { "data.txt": { "provenance": "p1" } },
            "sources": {
                "s1": { "url": "http://example.com", "provenances": { "p1": "http://ex.com" } }
            }
        }
        "#;

        let result = load_config_from_str(config_json);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_invalid_source_url_rejected() {
        let config_json = r#"
        {
            "inputFiles": {},
            "sources": { "s1": { "url": "example.com", "provenances": {} } }
        }
        "#;

        assert!(load_config_from_str(config_json).is_err());
    }

    #[test]
    fn test_unknown_top_level_field_rejected() {
        let config_json = r#"{ "inputFiles": {}, "sources": {}, "extra": 1 }"#;
        assert!(load_config_from_str(config_json).is_err());
    }

    #[test]
    fn test_fragment_may_omit_sections() {
        let fragment = load_fragment_from_str(r#"{ "variables": { "v1": { "name": "V1" } } }"#)
            .unwrap();
        assert!(fragment.sources.is_empty());
        assert_eq!(fragment.variables.len(), 1);
    }

    #[test]
    fn test_fragment_rejects_unknown_fields() {
        assert!(load_fragment_from_str(r#"{ "variablez": {} }"#).is_err());
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }
}
