//! Sources, provenances and the entries that cite them.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::Source;
use crate::error::{EntityKind, StoreError};
use crate::mcf::quoting::ensure_quoted;

use super::CustomDataManager;

/// Entries citing a provenance by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceReferences {
    pub data_files: Vec<String>,
    /// `(metadata scope, node id)` pairs.
    pub nodes: Vec<(String, String)>,
}

impl ProvenanceReferences {
    pub fn is_empty(&self) -> bool {
        self.data_files.is_empty() && self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data_files.len() + self.nodes.len()
    }

    fn extend(&mut self, other: ProvenanceReferences) {
        self.data_files.extend(other.data_files);
        self.nodes.extend(other.nodes);
    }
}

impl CustomDataManager {
    /// Adds an empty source.
    pub fn add_source(&mut self, name: &str, url: &str) -> Result<(), StoreError> {
        if self.config.sources.contains_key(name) {
            return Err(StoreError::DuplicateSource {
                name: name.to_string(),
            });
        }

        debug!(source = name, "Adding source");
        self.config
            .sources
            .insert(name.to_string(), Source::new(url));
        Ok(())
    }

    /// Adds a provenance under a source, creating the source when it does not
    /// exist yet (which requires `source_url`).
    ///
    /// With `overwrite` an existing provenance of the same source has its URL
    /// replaced in place. A provenance owned by another source is always a
    /// duplicate.
    pub fn add_source_and_provenance(
        &mut self,
        source_name: &str,
        source_url: Option<&str>,
        provenance_name: &str,
        provenance_url: &str,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        if let Some(owner) = self.config.source_of_provenance(provenance_name) {
            if owner != source_name || !overwrite {
                return Err(StoreError::DuplicateProvenance {
                    name: provenance_name.to_string(),
                    source_name: owner.to_string(),
                });
            }
        }

        if !self.config.sources.contains_key(source_name) {
            let Some(url) = source_url else {
                return Err(StoreError::MissingSourceUrl {
                    source_name: source_name.to_string(),
                });
            };
            debug!(source = source_name, "Adding source");
            self.config
                .sources
                .insert(source_name.to_string(), Source::new(url));
        }

        debug!(
            source = source_name,
            provenance = provenance_name,
            "Adding provenance"
        );
        if let Some(source) = self.config.sources.get_mut(source_name) {
            source
                .provenances
                .insert(provenance_name.to_string(), provenance_url.to_string());
        }
        Ok(())
    }

    /// Removes a source and its provenances. Entries citing those provenances
    /// are kept and returned; they fail validation until cleared.
    pub fn remove_source(&mut self, name: &str) -> Result<ProvenanceReferences, StoreError> {
        let source = self
            .config
            .sources
            .shift_remove(name)
            .ok_or_else(|| not_found(EntityKind::Source, name))?;

        let mut orphaned = ProvenanceReferences::default();
        for provenance in source.provenances.keys() {
            orphaned.extend(self.provenance_references(provenance));
        }

        debug!(source = name, "Removed source");
        if !orphaned.is_empty() {
            warn!(
                source = name,
                orphaned = orphaned.len(),
                "Removed source is still cited by other entries"
            );
        }
        Ok(orphaned)
    }

    pub fn remove_provenance(&mut self, name: &str) -> Result<ProvenanceReferences, StoreError> {
        let owner = self
            .config
            .source_of_provenance(name)
            .map(str::to_string)
            .ok_or_else(|| not_found(EntityKind::Provenance, name))?;

        if let Some(source) = self.config.sources.get_mut(&owner) {
            source.provenances.shift_remove(name);
        }

        let orphaned = self.provenance_references(name);
        debug!(provenance = name, source = %owner, "Removed provenance");
        if !orphaned.is_empty() {
            warn!(
                provenance = name,
                orphaned = orphaned.len(),
                "Removed provenance is still cited by other entries"
            );
        }
        Ok(orphaned)
    }

    /// Renames a source, keeping its position and provenances.
    pub fn rename_source(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        let index = self
            .config
            .sources
            .get_index_of(old)
            .ok_or_else(|| not_found(EntityKind::Source, old))?;
        if old == new {
            return Ok(());
        }
        if self.config.sources.contains_key(new) {
            return Err(StoreError::NameCollision {
                kind: EntityKind::Source,
                name: new.to_string(),
            });
        }

        debug!(from = old, to = new, "Renaming source");
        rename_key(&mut self.config.sources, index, new);
        Ok(())
    }

    /// Renames a provenance and every data file and metadata node citing it.
    pub fn rename_provenance(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        let owner = self
            .config
            .source_of_provenance(old)
            .map(str::to_string)
            .ok_or_else(|| not_found(EntityKind::Provenance, old))?;
        if old == new {
            return Ok(());
        }
        if self.config.has_provenance(new) {
            return Err(StoreError::NameCollision {
                kind: EntityKind::Provenance,
                name: new.to_string(),
            });
        }

        debug!(from = old, to = new, "Renaming provenance");
        if let Some(source) = self.config.sources.get_mut(&owner) {
            if let Some(index) = source.provenances.get_index_of(old) {
                rename_key(&mut source.provenances, index, new);
            }
        }

        for input in self.config.input_files.values_mut() {
            if input.provenance == old {
                input.provenance = new.to_string();
            }
        }
        for nodes in self.metadata.values_mut() {
            for node in nodes.nodes_mut() {
                if node.provenance() == Some(old) {
                    node.set("provenance", ensure_quoted(new));
                }
            }
        }
        Ok(())
    }

    /// Data files and metadata nodes that cite a provenance.
    pub fn provenance_references(&self, provenance: &str) -> ProvenanceReferences {
        let data_files = self
            .config
            .input_files
            .iter()
            .filter(|(_, input)| input.provenance == provenance)
            .map(|(name, _)| name.clone())
            .collect();

        let nodes = self
            .metadata
            .iter()
            .flat_map(|(scope, nodes)| {
                nodes
                    .iter()
                    .filter(|node| node.provenance() == Some(provenance))
                    .map(|node| (scope.clone(), node.id().to_string()))
            })
            .collect();

        ProvenanceReferences { data_files, nodes }
    }

    /// Removes every data file and metadata node citing the provenance.
    /// Works whether or not the provenance is still defined, so it also
    /// clears references left behind by `remove_source`.
    pub fn remove_by_provenance(&mut self, provenance: &str) -> ProvenanceReferences {
        let removed = self.provenance_references(provenance);
        self.remove_references(&removed);
        debug!(provenance, removed = removed.len(), "Removed entries by provenance");
        removed
    }

    /// Removes every data file and metadata node citing any provenance of the
    /// source. The source itself stays.
    pub fn remove_by_source(&mut self, source_name: &str) -> Result<ProvenanceReferences, StoreError> {
        let source = self
            .config
            .sources
            .get(source_name)
            .ok_or_else(|| not_found(EntityKind::Source, source_name))?;

        let mut removed = ProvenanceReferences::default();
        for provenance in source.provenances.keys() {
            removed.extend(self.provenance_references(provenance));
        }
        self.remove_references(&removed);

        debug!(source = source_name, removed = removed.len(), "Removed entries by source");
        Ok(removed)
    }

    fn remove_references(&mut self, references: &ProvenanceReferences) {
        for file in &references.data_files {
            self.config.input_files.shift_remove(file);
            self.data.shift_remove(file);
        }
        for (scope, id) in &references.nodes {
            if let Some(nodes) = self.metadata.get_mut(scope) {
                nodes.remove(id);
            }
        }
    }
}

/// Replaces the key at `index`, keeping the value and the position.
pub(super) fn rename_key<V>(map: &mut IndexMap<String, V>, index: usize, new: &str) {
    if let Some((_, value)) = map.shift_remove_index(index) {
        map.shift_insert(index, new.to_string(), value);
    }
}

pub(super) fn not_found(kind: EntityKind, name: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        name: name.to_string(),
    }
}
