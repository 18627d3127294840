//! Combines config fragments into one document.

mod directory;

use std::path::Path;

use tracing::{debug, info_span};

use crate::config::{load_fragment, Config};
use crate::error::{EntityKind, MergeConflict, MergeError};
use crate::store::CustomDataManager;

pub use directory::DirectoryLoader;

/// A partial config and where it came from. Fragments merge in
/// lexicographic order of their origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFragment {
    pub origin: String,
    pub config: Config,
}

impl ConfigFragment {
    pub fn new(origin: impl Into<String>, config: Config) -> Self {
        Self {
            origin: origin.into(),
            config,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MergeError> {
        let path = path.as_ref();
        let config = load_fragment(path)?;
        Ok(Self::new(path.to_string_lossy(), config))
    }
}

/// Merges fragments through the store's own mutation operations.
///
/// Entries that already exist with identical content are skipped. Differing
/// content under the same key is a conflict; every conflict is collected and
/// the smallest by `(kind, key)` is reported, so the outcome does not depend
/// on which fragment came first.
#[derive(Debug, Clone, Default)]
pub struct ConfigMerger {
    fragments: Vec<ConfigFragment>,
}

impl ConfigMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, fragment: ConfigFragment) -> &mut Self {
        self.fragments.push(fragment);
        self
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Merges every fragment into a new document.
    pub fn merge(&self) -> Result<CustomDataManager, MergeError> {
        let mut manager = CustomDataManager::new();
        self.merge_into(&mut manager)?;
        Ok(manager)
    }

    /// Merges every fragment into an existing document. On error the
    /// document is left unchanged.
    pub fn merge_into(&self, manager: &mut CustomDataManager) -> Result<(), MergeError> {
        let _span = info_span!("merge", fragments = self.fragments.len()).entered();

        let mut fragments: Vec<&ConfigFragment> = self.fragments.iter().collect();
        fragments.sort_by(|a, b| a.origin.cmp(&b.origin));

        let mut working = manager.clone();
        let mut conflicts = Vec::new();

        // Flags first, so path checks see the final subdirectory setting.
        for fragment in &fragments {
            merge_flags(&mut working, &fragment.config, &mut conflicts);
        }

        // Path errors are reported before conflicts, in file name order.
        let mut file_names: Vec<&str> = fragments
            .iter()
            .flat_map(|f| f.config.input_files.keys().map(String::as_str))
            .collect();
        file_names.sort_unstable();
        file_names.dedup();
        for name in file_names {
            working.check_path(name)?;
        }

        for fragment in &fragments {
            debug!(origin = %fragment.origin, "Merging fragment");
            merge_entries(&mut working, &fragment.config, &mut conflicts)?;
        }

        if let Some(conflict) = conflicts
            .into_iter()
            .min_by(|a: &MergeConflict, b: &MergeConflict| (a.kind, &a.key).cmp(&(b.kind, &b.key)))
        {
            return Err(MergeError::Conflict(conflict));
        }

        *manager = working;
        Ok(())
    }
}

impl CustomDataManager {
    /// Merges another config into this document with the same rules as
    /// [`ConfigMerger`].
    pub fn merge_config(&mut self, config: Config) -> Result<(), MergeError> {
        let mut merger = ConfigMerger::new();
        merger.add(ConfigFragment::new("", config));
        merger.merge_into(self)
    }
}

fn merge_flags(working: &mut CustomDataManager, config: &Config, conflicts: &mut Vec<MergeConflict>) {
    let flags = [
        (
            "includeInputSubdirs",
            working.config().include_input_subdirs,
            config.include_input_subdirs,
        ),
        (
            "groupStatVarsByProperty",
            working.config().group_stat_vars_by_property,
            config.group_stat_vars_by_property,
        ),
    ];

    for (key, existing, incoming) in flags {
        match (existing, incoming) {
            (_, None) => {}
            (None, Some(value)) => {
                if key == "includeInputSubdirs" {
                    working.set_include_input_subdirs(value);
                } else {
                    working.set_group_stat_vars_by_property(value);
                }
            }
            (Some(a), Some(b)) if a == b => {}
            (Some(a), Some(b)) => {
                conflicts.push(conflict(EntityKind::Flag, key, a, b));
                // The merge fails either way; path checks must not depend on
                // which fragment set the flag first.
                if key == "includeInputSubdirs" {
                    working.set_include_input_subdirs(true);
                }
            }
        }
    }
}

fn merge_entries(
    working: &mut CustomDataManager,
    config: &Config,
    conflicts: &mut Vec<MergeConflict>,
) -> Result<(), MergeError> {
    for (name, source) in &config.sources {
        match working.config().sources.get(name) {
            Some(existing) if existing.url == source.url => {}
            Some(existing) => conflicts.push(conflict(
                EntityKind::Source,
                name,
                &existing.url,
                &source.url,
            )),
            None => working.add_source(name, &source.url)?,
        }
    }

    for (source_name, source) in &config.sources {
        for (provenance, url) in &source.provenances {
            let existing = working
                .config()
                .source_of_provenance(provenance)
                .map(|owner| (owner.to_string(), working.config().sources[owner].provenances[provenance].clone()));

            match existing {
                Some((owner, existing_url)) if owner == *source_name && existing_url == *url => {}
                Some((owner, existing_url)) => conflicts.push(conflict(
                    EntityKind::Provenance,
                    provenance,
                    format!("{} ({})", existing_url, owner),
                    format!("{} ({})", url, source_name),
                )),
                None => working.add_source_and_provenance(
                    source_name,
                    Some(&source.url),
                    provenance,
                    url,
                    false,
                )?,
            }
        }
    }

    for (id, variable) in &config.variables {
        match working.config().variables.get(id) {
            Some(existing) if existing == variable => {}
            Some(existing) => conflicts.push(conflict(
                EntityKind::Variable,
                id,
                to_json(existing),
                to_json(variable),
            )),
            None => working.add_variable(id, variable.clone(), false)?,
        }
    }

    for (name, input) in &config.input_files {
        match working.config().input_files.get(name) {
            Some(existing) if existing == input => {}
            Some(existing) => conflicts.push(conflict(
                EntityKind::DataFile,
                name,
                to_json(existing),
                to_json(input),
            )),
            None => working.add_input_file(name, input.clone(), false)?,
        }
    }

    Ok(())
}

fn conflict(
    kind: EntityKind,
    key: &str,
    existing: impl ToString,
    incoming: impl ToString,
) -> MergeConflict {
    MergeConflict {
        kind,
        key: key.to_string(),
        existing: existing.to_string(),
        incoming: incoming.to_string(),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}
