//! Contact directory for Huddle.
//!
//! Maps display names of individuals and named groups to email addresses.
//! The directory is loaded once at startup and never mutated afterwards, so
//! every component that needs it just borrows it.
//!
//! Two document layouts are accepted:
//!
//! ```json
//! {"individuals": {"Alice": "alice@x.com"}, "groups": {"design": ["a@x.com", "b@x.com"]}}
//! ```
//!
//! and the flat layout, where a string value is an individual and an array
//! value is a group:
//!
//! ```json
//! {"Alice": "alice@x.com", "design": ["a@x.com", "b@x.com"]}
//! ```

use crate::validation::validate_email;
use log::{debug, info};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while loading the contact directory
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Contacts file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read contacts file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed contacts document: {0}")]
    Malformed(String),
    #[error("Invalid email '{email}' for contact '{name}'")]
    InvalidEmail { name: String, email: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SectionedDocument {
    #[serde(default)]
    individuals: BTreeMap<String, String>,
    #[serde(default)]
    groups: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlatEntry {
    Individual(String),
    Group(Vec<String>),
}

/// Immutable name to email index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDirectory {
    individuals: BTreeMap<String, String>,
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl ContactDirectory {
    /// Build a directory from already-parsed maps, validating every address
    pub fn new(
        individuals: BTreeMap<String, String>,
        groups: BTreeMap<String, Vec<String>>,
    ) -> Result<Self, DirectoryError> {
        for (name, email) in &individuals {
            check_email(name, email)?;
        }
        let mut indexed_groups = BTreeMap::new();
        for (name, members) in groups {
            for email in &members {
                check_email(&name, email)?;
            }
            indexed_groups.insert(name, members.into_iter().collect());
        }
        Ok(Self { individuals, groups: indexed_groups })
    }

    /// Load the directory from a JSON document on disk
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        debug!("Loading contacts from {:?}", path);
        if !path.exists() {
            return Err(DirectoryError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)
            .map_err(|source| DirectoryError::Io { path: path.to_path_buf(), source })?;
        let directory = Self::from_json(&content)?;
        info!(
            "Loaded {} individual(s) and {} group(s) from {:?}",
            directory.individuals.len(),
            directory.groups.len(),
            path
        );
        Ok(directory)
    }

    /// Parse a directory from a JSON string in either supported layout
    pub fn from_json(content: &str) -> Result<Self, DirectoryError> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| DirectoryError::Malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(DirectoryError::Malformed("top level must be a JSON object".to_string()));
        }

        // Only section names mapping to objects make the sectioned layout. A flat
        // document may still contain a contact or group literally named "groups".
        let is_sectioned = value
            .as_object()
            .map(|obj| {
                !obj.is_empty()
                    && obj.iter().all(|(k, v)| {
                        (k == "individuals" || k == "groups") && v.is_object()
                    })
            })
            .unwrap_or(false);

        if is_sectioned {
            let doc: SectionedDocument =
                serde_json::from_value(value).map_err(|e| DirectoryError::Malformed(e.to_string()))?;
            return Self::new(doc.individuals, doc.groups);
        }

        let entries: BTreeMap<String, FlatEntry> =
            serde_json::from_value(value).map_err(|e| DirectoryError::Malformed(e.to_string()))?;
        let mut individuals = BTreeMap::new();
        let mut groups = BTreeMap::new();
        for (name, entry) in entries {
            match entry {
                FlatEntry::Individual(email) => {
                    individuals.insert(name, email);
                }
                FlatEntry::Group(members) => {
                    groups.insert(name, members);
                }
            }
        }
        Self::new(individuals, groups)
    }

    /// Resolve a guest name to every email it stands for.
    ///
    /// A name that is both an individual and a group yields the union of
    /// both. Unknown names yield an empty set.
    pub fn resolve(&self, name: &str) -> BTreeSet<String> {
        let mut emails = BTreeSet::new();
        if let Some(email) = self.individuals.get(name) {
            emails.insert(email.clone());
        }
        if let Some(members) = self.groups.get(name) {
            emails.extend(members.iter().cloned());
        }
        if self.individuals.contains_key(name) && self.groups.contains_key(name) {
            debug!("'{}' is both an individual and a group; using both", name);
        }
        emails
    }

    /// Every name the extractor may return as a guest
    pub fn valid_names(&self) -> BTreeSet<String> {
        self.individuals.keys().chain(self.groups.keys()).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.individuals.len() + self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty() && self.groups.is_empty()
    }
}

fn check_email(name: &str, email: &str) -> Result<(), DirectoryError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(DirectoryError::InvalidEmail { name: name.to_string(), email: email.to_string() })
    }
}
