//! Typed builders for StatVar and StatVarGroup nodes.

use indexmap::IndexMap;

use crate::error::StoreError;

use super::node::McfNode;
use super::quoting::{ensure_quoted, quoted_list};

pub const STAT_VAR_TYPE: &str = "dcid:StatisticalVariable";
pub const STAT_VAR_GROUP_TYPE: &str = "dcid:StatVarGroup";
pub const ROOT_GROUP: &str = "dcid:dc/g/Root";

/// Statistical type of a variable's observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatType {
    #[default]
    MeasuredValue,
    MinValue,
    MaxValue,
    MeanValue,
    MedianValue,
    SumValue,
    VarianceValue,
    MarginOfError,
    StandardError,
}

impl StatType {
    pub fn as_dcid(&self) -> &'static str {
        match self {
            StatType::MeasuredValue => "dcid:measuredValue",
            StatType::MinValue => "dcid:minValue",
            StatType::MaxValue => "dcid:maxValue",
            StatType::MeanValue => "dcid:meanValue",
            StatType::MedianValue => "dcid:medianValue",
            StatType::SumValue => "dcid:sumValue",
            StatType::VarianceValue => "dcid:varianceValue",
            StatType::MarginOfError => "dcid:marginOfError",
            StatType::StandardError => "dcid:stdErr",
        }
    }
}

impl std::fmt::Display for StatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_dcid())
    }
}

/// A statistical variable declared in a metadata file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatVarNode {
    pub node: String,
    pub name: String,
    pub member_of: Vec<String>,
    pub stat_type: StatType,
    pub short_display_name: Option<String>,
    pub description: Option<String>,
    pub search_descriptions: Vec<String>,
    pub provenance: Option<String>,
    pub population_type: Option<String>,
    pub measured_property: Option<String>,
    pub measurement_qualifier: Option<String>,
    pub measurement_denominator: Option<String>,
    pub additional_properties: IndexMap<String, String>,
}

impl StatVarNode {
    pub fn new(node: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn member_of(mut self, group: impl Into<String>) -> Self {
        self.member_of.push(group.into());
        self
    }

    pub fn stat_type(mut self, stat_type: StatType) -> Self {
        self.stat_type = stat_type;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn search_description(mut self, text: impl Into<String>) -> Self {
        self.search_descriptions.push(text.into());
        self
    }

    pub fn provenance(mut self, provenance: impl Into<String>) -> Self {
        self.provenance = Some(provenance.into());
        self
    }

    pub fn population_type(mut self, population_type: impl Into<String>) -> Self {
        self.population_type = Some(population_type.into());
        self
    }

    pub fn measured_property(mut self, property: impl Into<String>) -> Self {
        self.measured_property = Some(property.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_properties.insert(key.into(), value.into());
        self
    }

    pub fn to_node(&self) -> Result<McfNode, StoreError> {
        if self.node.trim().is_empty() {
            return Err(StoreError::InvalidNode {
                id: self.node.clone(),
                reason: "node id is empty".to_string(),
            });
        }

        let mut node = McfNode::new(self.node.trim())
            .with("name", ensure_quoted(&self.name))
            .with("typeOf", STAT_VAR_TYPE)
            .with("statType", self.stat_type.as_dcid());

        if !self.member_of.is_empty() {
            node.set("memberOf", self.member_of.join(", "));
        }
        if !self.search_descriptions.is_empty() {
            node.set("searchDescription", quoted_list(&self.search_descriptions));
        }

        let optional = [
            ("shortDisplayName", &self.short_display_name),
            ("description", &self.description),
            ("provenance", &self.provenance),
            ("populationType", &self.population_type),
            ("measuredProperty", &self.measured_property),
            ("measurementQualifier", &self.measurement_qualifier),
            ("measurementDenominator", &self.measurement_denominator),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                node.set(key, value.clone());
            }
        }

        for (key, value) in &self.additional_properties {
            node.set(key.clone(), value.clone());
        }

        Ok(node)
    }
}

/// A group in the statistical variable hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatVarGroupNode {
    pub node: String,
    pub name: String,
    pub specialization_of: String,
    pub description: Option<String>,
    pub provenance: Option<String>,
    pub short_display_name: Option<String>,
    pub additional_properties: IndexMap<String, String>,
}

impl StatVarGroupNode {
    pub fn new(
        node: impl Into<String>,
        name: impl Into<String>,
        specialization_of: impl Into<String>,
    ) -> Self {
        Self {
            node: node.into(),
            name: name.into(),
            specialization_of: specialization_of.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn provenance(mut self, provenance: impl Into<String>) -> Self {
        self.provenance = Some(provenance.into());
        self
    }

    /// Group ids and their parent reference must contain `g/`, and the
    /// parent must be a `dcid:` reference.
    pub fn validate(&self) -> Result<(), StoreError> {
        let invalid = |reason: &str| StoreError::InvalidNode {
            id: self.node.clone(),
            reason: reason.to_string(),
        };

        if !self.node.contains("g/") {
            return Err(invalid("group node id must contain 'g/'"));
        }
        if !self.specialization_of.contains("g/") {
            return Err(invalid("specializationOf must contain 'g/'"));
        }
        if !self.specialization_of.starts_with("dcid:") {
            return Err(invalid("specializationOf must start with 'dcid:'"));
        }
        Ok(())
    }

    pub fn to_node(&self) -> Result<McfNode, StoreError> {
        self.validate()?;

        let mut node = McfNode::new(self.node.trim())
            .with("name", ensure_quoted(&self.name))
            .with("typeOf", STAT_VAR_GROUP_TYPE)
            .with("specializationOf", self.specialization_of.clone());

        let optional = [
            ("description", &self.description),
            ("provenance", &self.provenance),
            ("shortDisplayName", &self.short_display_name),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                node.set(key, value.clone());
            }
        }
        for (key, value) in &self.additional_properties {
            node.set(key.clone(), value.clone());
        }

        Ok(node)
    }
}
