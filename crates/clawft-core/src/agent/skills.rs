//! Skill discovery and loading.
//!
//! Scans a directory tree for skill definitions (each skill is a
//! subdirectory containing `skill.json` metadata and `prompt.md` LLM
//! instructions). Loaded skills are cached in an `RwLock` for concurrent
//! read access with infrequent writes.
//!
//! Directory layout:
//! ```text
//! skills/
//! +-- research/
//! |   +-- skill.json   {"name":"research","description":"...","variables":["topic"]}
//! |   +-- prompt.md    # LLM instructions text
//! +-- code_review/
//!     +-- skill.json
//!     +-- prompt.md
//! ```
//!
//! File locations follow the fallback chain:
//! `~/.clawft/workspace/skills/` then `~/.nanobot/workspace/skills/`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use clawft_platform::Platform;
use clawft_types::{ClawftError, Result};

/// A loaded skill definition.
///
/// Skills consist of JSON metadata (`skill.json`) and an optional LLM
/// prompt file (`prompt.md`). The prompt is loaded lazily on first use
/// and cached in the [`SkillsLoader`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    /// Skill identifier (matches the directory name).
    pub name: String,

    /// Human-readable description for skill listing.
    pub description: String,

    /// Template variable names expected by the skill prompt.
    #[serde(default)]
    pub variables: Vec<String>,

    /// LLM instructions loaded from `prompt.md`. `None` until the
    /// prompt file has been read.
    #[serde(skip)]
    pub prompt: Option<String>,

    /// Semantic version of the skill definition.
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0.0".into()
}

/// Loads and caches skill definitions from a workspace directory.
///
/// The loader scans for skill subdirectories, parses their `skill.json`
/// metadata, and lazily loads `prompt.md` content on first use. All
/// filesystem access goes through the [`Platform`] abstraction.
///
/// # Concurrency
///
/// The skill cache is wrapped in [`RwLock`] for many-reader / rare-writer
/// access. [`list_skills`](SkillsLoader::list_skills) and
/// [`get_skill`](SkillsLoader::get_skill) acquire read locks;
/// [`load_skill`](SkillsLoader::load_skill) and
/// [`load_all`](SkillsLoader::load_all) acquire write locks.
pub struct SkillsLoader<P: Platform> {
    skills_dir: PathBuf,
    skills: Arc<RwLock<HashMap<String, Skill>>>,
    platform: Arc<P>,
}

impl<P: Platform> SkillsLoader<P> {
    /// Create a new skills loader.
    ///
    /// Resolves the skills directory via the fallback chain:
    /// 1. `~/.clawft/workspace/skills/`
    /// 2. `~/.nanobot/workspace/skills/`
    ///
    /// If neither exists, the `.clawft` path is used.
    ///
    /// # Errors
    ///
    /// Returns [`ClawftError::ConfigInvalid`] if no home directory can
    /// be determined.
    pub fn new(platform: Arc<P>) -> Result<Self> {
        let home = platform.fs().home_dir().ok_or_else(|| {
            ClawftError::ConfigInvalid {
                reason: "could not determine home directory".into(),
            }
        })?;

        let clawft_skills = home.join(".clawft").join("workspace").join("skills");
        let nanobot_skills = home.join(".nanobot").join("workspace").join("skills");

        let skills_dir = if nanobot_skills.exists() && !clawft_skills.exists() {
            debug!(path = %nanobot_skills.display(), "using legacy nanobot skills path");
            nanobot_skills
        } else {
            debug!(path = %clawft_skills.display(), "using clawft skills path");
            clawft_skills
        };

        Ok(Self {
            skills_dir,
            skills: Arc::new(RwLock::new(HashMap::new())),
            platform,
        })
    }

    /// Create a skills loader with an explicit directory (for testing).
    #[cfg(test)]
    pub(crate) fn with_dir(skills_dir: PathBuf, platform: Arc<P>) -> Self {
        Self {
            skills_dir,
            skills: Arc::new(RwLock::new(HashMap::new())),
            platform,
        }
    }

    /// List available skill names by scanning subdirectories.
    ///
    /// A directory is considered a skill if it contains a `skill.json`
    /// file. Names are returned in filesystem order (not sorted).
    ///
    /// # Errors
    ///
    /// Returns an empty list if the skills directory does not exist.
    /// Propagates I/O errors for other failures.
    pub async fn list_skills(&self) -> Result<Vec<String>> {
        if !self.platform.fs().exists(&self.skills_dir).await {
            return Ok(Vec::new());
        }

        let entries = self
            .platform
            .fs()
            .list_dir(&self.skills_dir)
            .await
            .map_err(ClawftError::Io)?;

        let mut names = Vec::new();
        for entry in entries {
            let skill_json = entry.join("skill.json");
            if self.platform.fs().exists(&skill_json).await {
                if let Some(name) = entry.file_name() {
                    names.push(name.to_string_lossy().into_owned());
                }
            }
        }

        Ok(names)
    }

    /// Load a specific skill by name.
    ///
    /// Reads `skill.json` for metadata and `prompt.md` for the LLM
    /// prompt. The loaded skill is cached for future
    /// [`get_skill`](SkillsLoader::get_skill) calls.
    ///
    /// # Errors
    ///
    /// Returns [`ClawftError::PluginLoadFailed`] if the skill directory
    /// or `skill.json` cannot be read.
    pub async fn load_skill(&self, name: &str) -> Result<Skill> {
        let skill_dir = self.skills_dir.join(name);
        let skill_json_path = skill_dir.join("skill.json");
        let prompt_path = skill_dir.join("prompt.md");

        // Read and parse skill.json
        let json_content = self
            .platform
            .fs()
            .read_to_string(&skill_json_path)
            .await
            .map_err(|e| ClawftError::PluginLoadFailed {
                plugin: format!("skill/{name}: {e}"),
            })?;

        let mut skill: Skill =
            serde_json::from_str(&json_content).map_err(|e| ClawftError::PluginLoadFailed {
                plugin: format!("skill/{name}: invalid skill.json: {e}"),
            })?;

        // Load prompt.md if it exists
        if self.platform.fs().exists(&prompt_path).await {
            match self.platform.fs().read_to_string(&prompt_path).await {
                Ok(prompt) => {
                    skill.prompt = Some(prompt);
                }
                Err(e) => {
                    warn!(skill = name, error = %e, "failed to read prompt.md");
                }
            }
        }

        // Cache the loaded skill
        {
            let mut cache = self.skills.write().await;
            cache.insert(name.to_string(), skill.clone());
        }

        debug!(skill = name, "loaded skill");
        Ok(skill)
    }

    /// Get a cached skill by name.
    ///
    /// Returns `None` if the skill has not been loaded yet. Use
    /// [`load_skill`](SkillsLoader::load_skill) to load and cache a
    /// skill first.
    pub async fn get_skill(&self, name: &str) -> Option<Skill> {
        let cache = self.skills.read().await;
        cache.get(name).cloned()
    }

    /// Load all skills from the skills directory.
    ///
    /// Scans for skill subdirectories and loads each one. Errors on
    /// individual skills are logged as warnings but do not abort the
    /// overall load.
    pub async fn load_all(&self) -> Result<()> {
        let names = self.list_skills().await?;
        for name in &names {
            if let Err(e) = self.load_skill(name).await {
                warn!(skill = %name, error = %e, "failed to load skill, skipping");
            }
        }
        debug!(count = names.len(), "loaded all skills");
        Ok(())
    }

    /// Path to the skills directory (for diagnostics).
    pub fn skills_dir(&self) -> &PathBuf {
        &self.skills_dir
    }
}
