use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The root configuration document consumed by the Data Commons loader.
///
/// Maps keep insertion order so an exported document lists entries the way
/// they were added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_input_subdirs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_stat_vars_by_property: Option<bool>,
    #[serde(default)]
    pub input_files: IndexMap<String, InputFile>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, Variable>,
    #[serde(default)]
    pub sources: IndexMap<String, Source>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether data files may live in subdirectories of the input directory.
    pub fn subdirs_enabled(&self) -> bool {
        self.include_input_subdirs.unwrap_or(false)
    }

    /// Finds the source owning the given provenance.
    pub fn source_of_provenance(&self, provenance: &str) -> Option<&str> {
        self.sources
            .iter()
            .find(|(_, source)| source.provenances.contains_key(provenance))
            .map(|(name, _)| name.as_str())
    }

    pub fn has_provenance(&self, provenance: &str) -> bool {
        self.source_of_provenance(provenance).is_some()
    }

    /// All provenance names across every source, in document order.
    pub fn provenance_names(&self) -> impl Iterator<Item = &str> {
        self.sources
            .values()
            .flat_map(|s| s.provenances.keys().map(String::as_str))
    }
}

/// A publishing organisation. Owns its provenances (name -> URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub provenances: IndexMap<String, String>,
}

impl Source {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            provenances: IndexMap::new(),
        }
    }

    pub fn with_provenance(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.provenances.insert(name.into(), url.into());
        self
    }
}

/// A statistical variable declared in the config (implicit schema).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Variable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_descriptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, PropertyValue>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_search_description(mut self, text: impl Into<String>) -> Self {
        self.search_descriptions.push(text.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Constrained value of a free-form property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value.into())
    }
}

/// Layout of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataFormat {
    VariablePerColumn,
    VariablePerRow,
}

/// A data file registration (`inputFiles` entry).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InputFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_columns: Vec<String>,
    pub provenance: String,
    #[serde(default, rename = "format", skip_serializing_if = "Option::is_none")]
    pub data_format: Option<DataFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_mappings: Option<ColumnMappings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_properties: Option<ObservationProperties>,
}

impl InputFile {
    /// Variable-per-column registration.
    pub fn implicit(provenance: impl Into<String>, entity_type: Option<String>) -> Self {
        Self {
            entity_type,
            provenance: provenance.into(),
            ..Self::default()
        }
    }

    /// Variable-per-row registration.
    pub fn explicit(provenance: impl Into<String>, column_mappings: ColumnMappings) -> Self {
        Self {
            provenance: provenance.into(),
            data_format: Some(DataFormat::VariablePerRow),
            column_mappings: Some(column_mappings),
            ..Self::default()
        }
    }

    pub fn uses_implicit_schema(&self) -> bool {
        self.entity_type.is_some() || self.observation_properties.is_some()
    }

    pub fn uses_explicit_schema(&self) -> bool {
        self.column_mappings.is_some() || self.data_format == Some(DataFormat::VariablePerRow)
    }

    pub fn is_ignored(&self, column: &str) -> bool {
        self.ignore_columns.iter().any(|c| c == column)
    }
}

/// Observation-level overrides for variable-per-column files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObservationProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling_factor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_method: Option<String>,
}

impl ObservationProperties {
    pub fn is_empty(&self) -> bool {
        self.unit.is_none()
            && self.observation_period.is_none()
            && self.scaling_factor.is_none()
            && self.measurement_method.is_none()
    }
}

/// Column heading overrides for variable-per-row files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ColumnMappings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling_factor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_period: Option<String>,
}

impl ColumnMappings {
    /// Headings that must be present, defaulting to the service's names.
    pub fn required_columns(&self) -> [String; 4] {
        [
            self.variable.clone().unwrap_or_else(|| "variable".to_string()),
            self.entity.clone().unwrap_or_else(|| "entity".to_string()),
            self.date.clone().unwrap_or_else(|| "date".to_string()),
            self.value.clone().unwrap_or_else(|| "value".to_string()),
        ]
    }

    /// Headings that may be present.
    pub fn optional_columns(&self) -> [String; 4] {
        [
            self.unit.clone().unwrap_or_else(|| "unit".to_string()),
            self.scaling_factor
                .clone()
                .unwrap_or_else(|| "scalingFactor".to_string()),
            self.measurement_method
                .clone()
                .unwrap_or_else(|| "measurementMethod".to_string()),
            self.observation_period
                .clone()
                .unwrap_or_else(|| "observationPeriod".to_string()),
        ]
    }
}
