//! Checks that decide whether a document can be exported.

use std::fmt;

use crate::config::loader::schema_errors;
use crate::error::ExportError;
use crate::export::export_header;
use crate::sanitize::{data_path_problem, has_subdirectory, is_valid_dcid};
use crate::store::{check_shape, CustomDataManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Blocks export.
    Fatal,
    Warning,
}

/// The check that produced an issue, in the order checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueKind {
    Schema,
    ReferentialIntegrity,
    Path,
    DatasetShape,
    IdentifierSyntax,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueKind::Schema => "schema",
            IssueKind::ReferentialIntegrity => "referential integrity",
            IssueKind::Path => "path",
            IssueKind::DatasetShape => "dataset shape",
            IssueKind::IdentifierSyntax => "identifier syntax",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    /// The key the issue is about (file, provenance, variable, node).
    pub subject: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Fatal => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{} ({}): {}", severity, self.kind, self.message)
    }
}

/// Runs every check against a document and collects the issues.
#[derive(Debug, Default)]
pub struct ConfigValidator {
    issues: Vec<ValidationIssue>,
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs all checks in order. Nothing stops early; an empty list means the
    /// document is valid.
    pub fn validate(&mut self, manager: &CustomDataManager) -> Vec<ValidationIssue> {
        self.issues.clear();

        self.check_schema(manager);
        self.check_references(manager);
        self.check_paths(manager);
        self.check_datasets(manager);
        self.check_identifiers(manager);

        std::mem::take(&mut self.issues)
    }

    fn push(&mut self, severity: Severity, kind: IssueKind, subject: &str, message: String) {
        self.issues.push(ValidationIssue {
            severity,
            kind,
            subject: subject.to_string(),
            message,
        });
    }

    fn fatal(&mut self, kind: IssueKind, subject: &str, message: String) {
        self.push(Severity::Fatal, kind, subject, message);
    }

    fn check_schema(&mut self, manager: &CustomDataManager) {
        let config = manager.config();

        match serde_json::to_value(config)
            .map_err(|e| e.to_string())
            .and_then(|value| schema_errors(&value).map_err(|e| e.to_string()))
        {
            Ok(errors) => {
                for error in errors {
                    self.fatal(IssueKind::Schema, "config", error);
                }
            }
            Err(e) => self.fatal(IssueKind::Schema, "config", e),
        }

        for (name, source) in &config.sources {
            if name.trim().is_empty() {
                self.fatal(IssueKind::Schema, name, "source name is empty".to_string());
            }
            if source.provenances.is_empty() {
                self.push(
                    Severity::Warning,
                    IssueKind::Schema,
                    name,
                    format!("source '{}' has no provenances", name),
                );
            }
            for provenance in source.provenances.keys() {
                if provenance.trim().is_empty() {
                    self.fatal(
                        IssueKind::Schema,
                        name,
                        format!("source '{}' has a provenance with an empty name", name),
                    );
                }
            }
        }

        for (name, input) in &config.input_files {
            if input.uses_implicit_schema() && input.uses_explicit_schema() {
                self.fatal(
                    IssueKind::Schema,
                    name,
                    format!(
                        "input file '{}' mixes implicit and explicit schema fields",
                        name
                    ),
                );
            }
        }

        for (id, variable) in &config.variables {
            let described = variable
                .description
                .as_deref()
                .is_some_and(|d| !d.trim().is_empty());
            if !described {
                self.push(
                    Severity::Warning,
                    IssueKind::Schema,
                    id,
                    format!("variable '{}' has no description", id),
                );
            }
        }
    }

    fn check_references(&mut self, manager: &CustomDataManager) {
        let config = manager.config();

        for (name, input) in &config.input_files {
            if !config.has_provenance(&input.provenance) {
                self.fatal(
                    IssueKind::ReferentialIntegrity,
                    &input.provenance,
                    format!(
                        "input file '{}' cites unknown provenance '{}'",
                        name, input.provenance
                    ),
                );
            }
        }

        for (scope, nodes) in manager.metadata_scopes() {
            for node in nodes.iter() {
                if let Some(provenance) = node.provenance() {
                    if !config.has_provenance(provenance) {
                        self.fatal(
                            IssueKind::ReferentialIntegrity,
                            provenance,
                            format!(
                                "node '{}' in '{}' cites unknown provenance '{}'",
                                node.id(),
                                scope,
                                provenance
                            ),
                        );
                    }
                }
            }
        }
    }

    fn check_paths(&mut self, manager: &CustomDataManager) {
        let config = manager.config();

        for name in config.input_files.keys() {
            if let Some(reason) = data_path_problem(name) {
                self.fatal(IssueKind::Path, name, format!("'{}': {}", name, reason));
            } else if has_subdirectory(name) && !config.subdirs_enabled() {
                self.fatal(
                    IssueKind::Path,
                    name,
                    format!(
                        "'{}' is in a subdirectory but includeInputSubdirs is not enabled",
                        name
                    ),
                );
            }
        }

        for (scope, _) in manager.metadata_scopes() {
            if let Some(reason) = data_path_problem(scope) {
                self.fatal(
                    IssueKind::Path,
                    scope,
                    format!("metadata file '{}': {}", scope, reason),
                );
            }
        }
    }

    fn check_datasets(&mut self, manager: &CustomDataManager) {
        for (name, input) in &manager.config().input_files {
            let Some(file) = manager.data_file(name) else {
                self.push(
                    Severity::Warning,
                    IssueKind::DatasetShape,
                    name,
                    format!("'{}' has no data attached", name),
                );
                continue;
            };
            match file.table() {
                Some(table) => {
                    if let Err(e) = check_shape(name, input, file.declared_variables(), table) {
                        self.fatal(IssueKind::DatasetShape, name, e.to_string());
                    }
                }
                None => self.push(
                    Severity::Warning,
                    IssueKind::DatasetShape,
                    name,
                    format!("'{}' has no data attached", name),
                ),
            }
        }
    }

    fn check_identifiers(&mut self, manager: &CustomDataManager) {
        for id in manager.config().variables.keys() {
            if !is_valid_dcid(id) {
                self.fatal(
                    IssueKind::IdentifierSyntax,
                    id,
                    format!("variable id '{}' is not a valid DCID", id),
                );
            }
        }

        for (scope, nodes) in manager.metadata_scopes() {
            for id in nodes.ids() {
                if !is_valid_dcid(id) {
                    self.fatal(
                        IssueKind::IdentifierSyntax,
                        id,
                        format!("node id '{}' in '{}' is not a valid DCID", id, scope),
                    );
                }
            }
        }

        for (name, input) in &manager.config().input_files {
            if input.column_mappings.is_some() {
                continue;
            }
            let Some(variables) = manager.data_variables(name) else {
                continue;
            };

            let mut headers: Vec<String> = Vec::with_capacity(variables.len());
            for variable in &variables {
                let header = export_header(variable);
                if !is_valid_dcid(&header) {
                    self.fatal(
                        IssueKind::IdentifierSyntax,
                        variable,
                        format!(
                            "column '{}' of '{}' cannot be turned into a valid DCID",
                            variable, name
                        ),
                    );
                } else if headers.contains(&header) {
                    self.fatal(
                        IssueKind::IdentifierSyntax,
                        variable,
                        format!(
                            "columns of '{}' normalise to the same identifier '{}'",
                            name, header
                        ),
                    );
                }
                headers.push(header);
            }
        }
    }
}

impl CustomDataManager {
    /// Validates the document. An empty list means it is valid.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        ConfigValidator::new().validate(self)
    }

    /// Validates before an export: fails with every issue found if any is
    /// fatal, otherwise returns the warnings.
    pub fn validate_for_export(&self) -> Result<Vec<ValidationIssue>, ExportError> {
        let issues = self.validate();
        if issues.iter().any(ValidationIssue::is_fatal) {
            return Err(ExportError::ConfigValidation { issues });
        }
        for issue in &issues {
            tracing::warn!(kind = %issue.kind, subject = %issue.subject, "{}", issue.message);
        }
        Ok(issues)
    }
}
