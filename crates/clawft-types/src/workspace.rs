//! Workspace types for the global workspace registry.
//!
//! The registry lives at `~/.clawft/workspaces.json` and tracks
//! all known workspaces by name and filesystem path.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entry in the global workspace registry (`~/.clawft/workspaces.json`).
///
/// Timestamps are stored as `DateTime<Utc>`. For backward compatibility with
/// registries that stored ISO 8601 strings, the custom deserializer accepts
/// both RFC 3339 strings and native `DateTime<Utc>` JSON representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    /// Human-readable workspace name (unique within registry).
    pub name: String,

    /// Absolute path to the workspace root directory.
    pub path: PathBuf,

    /// UTC timestamp of the last time this workspace was accessed.
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub last_accessed: Option<DateTime<Utc>>,

    /// UTC timestamp of when the workspace was first created.
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Deserialize an `Option<DateTime<Utc>>` that accepts both:
/// - A native chrono `DateTime<Utc>` JSON value (RFC 3339 string from chrono's Serialize)
/// - A plain ISO 8601 / RFC 3339 string (legacy format)
/// - `null` / missing field -> `None`
fn deserialize_optional_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(s) => {
            // Try RFC 3339 parsing (covers both chrono's output and legacy strings).
            match DateTime::parse_from_rfc3339(&s) {
                Ok(dt) => Ok(Some(dt.with_timezone(&Utc))),
                Err(_) => {
                    // Try a more relaxed ISO 8601 parse as fallback.
                    match s.parse::<DateTime<Utc>>() {
                        Ok(dt) => Ok(Some(dt)),
                        Err(_) => Ok(None), // Gracefully degrade: treat unparseable as missing.
                    }
                }
            }
        }
    }
}

/// Global workspace registry.
///
/// Serialized to / deserialized from `~/.clawft/workspaces.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceRegistry {
    /// All known workspace entries.
    #[serde(default)]
    pub workspaces: Vec<WorkspaceEntry>,
}

impl WorkspaceRegistry {
    /// Load the registry from a JSON file, returning `Default` if it does
    /// not exist.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the registry to a JSON file, creating parent directories
    /// as needed.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let dir = path.parent().ok_or("registry path has no parent")?;
        std::fs::create_dir_all(dir)?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Find an entry by workspace name.
    pub fn find_by_name(&self, name: &str) -> Option<&WorkspaceEntry> {
        self.workspaces.iter().find(|e| e.name == name)
    }

    /// Find an entry by filesystem path.
    pub fn find_by_path(&self, path: &Path) -> Option<&WorkspaceEntry> {
        self.workspaces.iter().find(|e| e.path == path)
    }

    /// Register a workspace entry.
    ///
    /// If an entry with the same name already exists, it is replaced.
    pub fn register(&mut self, entry: WorkspaceEntry) {
        self.remove_by_name(&entry.name);
        self.workspaces.push(entry);
    }

    /// Remove a workspace entry by name.
    ///
    /// Returns `true` if an entry was found and removed.
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        let before = self.workspaces.len();
        self.workspaces.retain(|e| e.name != name);
        self.workspaces.len() < before
    }
}
