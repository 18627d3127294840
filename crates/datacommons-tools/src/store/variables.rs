//! Variables declared in the config and in metadata files.

use std::path::Path;
use tracing::debug;

use crate::config::Variable;
use crate::error::{EntityKind, Result, StoreError};
use crate::mcf::{self, CsvNodeOptions, McfNode, McfNodes, StatVarGroupNode, StatVarNode};

use super::sources::{not_found, rename_key};
use super::{check_scope, CustomDataManager};

/// Where a variable lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableTarget {
    /// The `variables` section of the config.
    Config,
    /// A node in the named metadata file.
    Metadata(String),
}

impl CustomDataManager {
    /// Declares a variable in the config. With `overwrite` an existing
    /// declaration is replaced entirely, never merged.
    pub fn add_variable(
        &mut self,
        id: &str,
        variable: Variable,
        overwrite: bool,
    ) -> std::result::Result<(), StoreError> {
        if self.config.variables.contains_key(id) && !overwrite {
            return Err(StoreError::DuplicateVariable { id: id.to_string() });
        }

        debug!(variable = id, overwrite, "Adding variable");
        self.config.variables.insert(id.to_string(), variable);
        Ok(())
    }

    /// Renames a variable within one target. In the config this also renames
    /// the matching declared variable and table column of every data file; in
    /// a metadata file it rewrites group references to the node.
    pub fn rename_variable(
        &mut self,
        old: &str,
        new: &str,
        target: &VariableTarget,
    ) -> std::result::Result<(), StoreError> {
        match target {
            VariableTarget::Config => {
                let index = self
                    .config
                    .variables
                    .get_index_of(old)
                    .ok_or_else(|| not_found(EntityKind::Variable, old))?;
                if old == new {
                    return Ok(());
                }
                if self.config.variables.contains_key(new) {
                    return Err(StoreError::NameCollision {
                        kind: EntityKind::Variable,
                        name: new.to_string(),
                    });
                }

                // Only files that provide the variable are touched. Other
                // files may use the same name for an entity or date column.
                let affected: Vec<String> = self
                    .data
                    .keys()
                    .filter(|name| {
                        self.data_variables(name)
                            .is_some_and(|vars| vars.iter().any(|v| v == old))
                    })
                    .cloned()
                    .collect();

                let collides_in_table = affected.iter().any(|name| {
                    self.data[name.as_str()]
                        .table
                        .as_ref()
                        .is_some_and(|t| t.column_index(new).is_some())
                });
                if collides_in_table {
                    return Err(StoreError::NameCollision {
                        kind: EntityKind::Variable,
                        name: new.to_string(),
                    });
                }

                debug!(from = old, to = new, files = affected.len(), "Renaming config variable");
                rename_key(&mut self.config.variables, index, new);
                for name in &affected {
                    let Some(file) = self.data.get_mut(name.as_str()) else {
                        continue;
                    };
                    for declared in file.declared_variables.iter_mut() {
                        if declared == old {
                            *declared = new.to_string();
                        }
                    }
                    if let Some(table) = file.table.as_mut() {
                        table.rename_column(old, new);
                    }
                }
                Ok(())
            }
            VariableTarget::Metadata(scope) => {
                let nodes = self.scope_mut(scope)?;
                if !nodes.contains(old) {
                    return Err(not_found(EntityKind::Node, old));
                }
                if old == new {
                    return Ok(());
                }
                if nodes.contains(new) {
                    return Err(StoreError::NameCollision {
                        kind: EntityKind::Node,
                        name: new.to_string(),
                    });
                }

                debug!(from = old, to = new, scope = %scope, "Renaming metadata node");
                nodes.rename(old, new);
                Ok(())
            }
        }
    }

    pub fn remove_variable(
        &mut self,
        id: &str,
        target: &VariableTarget,
    ) -> std::result::Result<(), StoreError> {
        match target {
            VariableTarget::Config => {
                self.config
                    .variables
                    .shift_remove(id)
                    .ok_or_else(|| not_found(EntityKind::Variable, id))?;
            }
            VariableTarget::Metadata(scope) => {
                self.scope_mut(scope)?
                    .remove(id)
                    .ok_or_else(|| not_found(EntityKind::Node, id))?;
            }
        }
        debug!(variable = id, "Removed variable");
        Ok(())
    }

    /// Adds a StatVar node to a metadata file, creating the file's scope if
    /// needed.
    pub fn add_variable_to_metadata(
        &mut self,
        variable: StatVarNode,
        scope: &str,
        overwrite: bool,
    ) -> std::result::Result<(), StoreError> {
        let node = variable.to_node()?;
        self.insert_metadata_node(scope, node, overwrite)
    }

    pub fn add_variable_group_to_metadata(
        &mut self,
        group: StatVarGroupNode,
        scope: &str,
        overwrite: bool,
    ) -> std::result::Result<(), StoreError> {
        let node = group.to_node()?;
        self.insert_metadata_node(scope, node, overwrite)
    }

    /// Reads StatVar nodes from a metadata CSV into a scope. Returns how many
    /// nodes were added. A repeated id, in the file or against the scope,
    /// fails the whole import unless `overwrite` is set.
    pub fn add_variables_to_metadata_from_csv<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: &CsvNodeOptions,
        scope: &str,
        overwrite: bool,
    ) -> Result<usize> {
        let nodes = mcf::csv_metadata_to_nodes(path, options)?;

        let mut incoming = McfNodes::new();
        for node in nodes {
            let id = node.id().to_string();
            if !incoming.insert(node, overwrite) {
                return Err(StoreError::DuplicateNode {
                    id,
                    scope: scope.to_string(),
                }
                .into());
            }
        }

        let count = incoming.len();
        self.load_metadata(scope, incoming, overwrite)?;
        Ok(count)
    }

    /// Creates StatVarGroup nodes for free-text `memberOf` paths in a scope.
    pub fn build_groups_from_paths(
        &mut self,
        scope: &str,
        namespace: &str,
    ) -> std::result::Result<Vec<String>, StoreError> {
        let nodes = self.scope_mut(scope)?;
        let created = mcf::build_groups_from_paths(nodes, namespace)?;
        debug!(scope, created = created.len(), "Built variable groups");
        Ok(created)
    }

    fn insert_metadata_node(
        &mut self,
        scope: &str,
        node: McfNode,
        overwrite: bool,
    ) -> std::result::Result<(), StoreError> {
        check_scope(scope)?;
        if let Some(nodes) = self.metadata.get(scope) {
            if nodes.contains(node.id()) && !overwrite {
                return Err(StoreError::DuplicateNode {
                    id: node.id().to_string(),
                    scope: scope.to_string(),
                });
            }
        }

        debug!(node = node.id(), scope, overwrite, "Adding metadata node");
        self.metadata
            .entry(scope.to_string())
            .or_default()
            .insert(node, true);
        Ok(())
    }
}
