//! Session management for conversation persistence.
//!
//! Provides [`SessionManager`] which caches active sessions in memory and
//! persists them to disk as JSONL files using the platform filesystem
//! abstraction. Each JSONL file has a metadata header line followed by
//! one line per conversation turn.
//!
//! Ported from Python `nanobot/session/manager.py`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use percent_encoding::{percent_decode_str, percent_encode, NON_ALPHANUMERIC};
use crate::runtime::Mutex;
use tracing::{debug, warn};

use clawft_platform::Platform;
use clawft_types::error::ClawftError;
use clawft_types::session::Session;

/// Manages conversation sessions with in-memory caching and JSONL persistence.
///
/// Sessions are identified by a string key (typically `"{channel}:{chat_id}"`).
/// The manager uses a write-through cache: reads check the in-memory cache
/// first, then fall back to loading from disk. Writes update both the cache
/// and the JSONL file.
///
/// # JSONL format
///
/// Each session file is named `{sanitized_key}.jsonl` and contains:
/// - Line 1: metadata object with `_type`, `created_at`, `updated_at`,
///   `metadata`, and `last_consolidated` fields.
/// - Lines 2+: message objects with `role`, `content`, and `timestamp` fields.
///
/// # Platform abstraction
///
/// All filesystem I/O goes through the [`Platform::fs()`] trait, making
/// SessionManager testable with mock filesystems and WASM-portable.
pub struct SessionManager<P: Platform> {
    /// Directory where JSONL session files are stored.
    sessions_dir: PathBuf,

    /// In-memory cache of active sessions.
    active_sessions: Arc<Mutex<HashMap<String, Session>>>,

    /// Platform providing filesystem access.
    platform: Arc<P>,
}

impl<P: Platform> SessionManager<P> {
    /// Create a new session manager using the given platform.
    ///
    /// Discovers the sessions directory by checking:
    /// 1. `~/.clawft/workspace/sessions/`
    /// 2. `~/.nanobot/workspace/sessions/` (legacy fallback)
    ///
    /// If neither exists, defaults to `~/.clawft/workspace/sessions/` and
    /// creates it. Returns an error if the home directory cannot be determined.
    pub async fn new(platform: Arc<P>) -> clawft_types::Result<Self> {
        let home = platform
            .fs()
            .home_dir()
            .ok_or_else(|| ClawftError::ConfigInvalid {
                reason: "cannot determine home directory".into(),
            })?;

        let clawft_dir = home.join(".clawft").join("workspace").join("sessions");
        let nanobot_dir = home.join(".nanobot").join("workspace").join("sessions");

        let sessions_dir = if platform.fs().exists(&clawft_dir).await {
            debug!(path = %clawft_dir.display(), "using clawft sessions dir");
            clawft_dir
        } else if platform.fs().exists(&nanobot_dir).await {
            debug!(path = %nanobot_dir.display(), "using nanobot sessions dir (fallback)");
            nanobot_dir
        } else {
            debug!(
                path = %clawft_dir.display(),
                "sessions dir does not exist, creating"
            );
            platform
                .fs()
                .create_dir_all(&clawft_dir)
                .await
                .map_err(ClawftError::Io)?;
            clawft_dir
        };

        Ok(Self {
            sessions_dir,
            active_sessions: Arc::new(Mutex::new(HashMap::new())),
            platform,
        })
    }

    /// Create a session manager with an explicit sessions directory.
    ///
    /// Useful for testing or when the directory is already known.
    pub fn with_dir(platform: Arc<P>, sessions_dir: PathBuf) -> Self {
        Self {
            sessions_dir,
            active_sessions: Arc::new(Mutex::new(HashMap::new())),
            platform,
        }
    }

    /// Get an existing session or create a new one.
    ///
    /// Checks the in-memory cache first, then attempts to load from disk.
    /// If neither succeeds, creates a fresh empty session and caches it.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` fails session-ID validation.
    pub async fn get_or_create(&self, key: &str) -> clawft_types::Result<Session> {
        crate::security::validate_session_id(key)?;

        // Check cache first.
        {
            let cache = self.active_sessions.lock().await;
            if let Some(session) = cache.get(key) {
                return Ok(session.clone());
            }
        }

        // Try loading from disk.
        if let Ok(session) = self.load_session(key).await {
            let mut cache = self.active_sessions.lock().await;
            cache.insert(key.to_string(), session.clone());
            return Ok(session);
        }

        // Create new session.
        let session = Session::new(key);
        let mut cache = self.active_sessions.lock().await;
        cache.insert(key.to_string(), session.clone());
        Ok(session)
    }

    /// Load a session from its JSONL file on disk.
    ///
    /// Parses the first line as metadata and remaining lines as messages.
    /// Returns an error if the file does not exist or contains invalid JSON.
    ///
    /// Includes a migration path: if the percent-encoded file does not exist
    /// but the old underscore-encoded file does, the content is copied to the
    /// new filename (the old file is preserved for safety).
    pub async fn load_session(&self, key: &str) -> clawft_types::Result<Session> {
        crate::security::validate_session_id(key)?;
        let path = self.session_path(key);

        // Migration: try old-format filename if new-format doesn't exist
        if !self.platform.fs().exists(&path).await {
            let old_filename = format!("{}.jsonl", key.replace(':', "_"));
            let old_path = self.sessions_dir.join(&old_filename);
            if self.platform.fs().exists(&old_path).await {
                warn!(
                    key = key,
                    old = %old_path.display(),
                    new = %path.display(),
                    "migrating session file from old encoding format"
                );
                // Read from old, write to new, keep old for safety
                let content = self.platform.fs().read_to_string(&old_path).await?;
                self.platform.fs().write_string(&path, &content).await?;
            }
        }

        let content = self.platform.fs().read_to_string(&path).await?;

        let mut lines = content.lines();

        // Parse metadata line.
        let meta_line = lines.next().ok_or_else(|| ClawftError::ConfigInvalid {
            reason: format!("session file is empty: {}", path.display()),
        })?;

        let meta: serde_json::Value = serde_json::from_str(meta_line)?;

        let created_at = meta
            .get("created_at")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Utc::now);

        let updated_at = meta
            .get("updated_at")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Utc::now);

        let metadata: HashMap<String, serde_json::Value> = meta
            .get("metadata")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        let last_consolidated = meta
            .get("last_consolidated")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        // Parse message lines.
        let mut messages = Vec::new();
        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<serde_json::Value>(trimmed) {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    warn!(
                        key = key,
                        error = %e,
                        "skipping malformed message line in session"
                    );
                }
            }
        }

        debug!(
            key = key,
            messages = messages.len(),
            "loaded session from disk"
        );

        Ok(Session {
            key: key.to_string(),
            messages,
            created_at,
            updated_at,
            metadata,
            last_consolidated,
        })
    }

    /// Save a session to its JSONL file on disk.
    ///
    /// Writes the full session: metadata line followed by all message lines.
    /// Also updates the in-memory cache.
    pub async fn save_session(&self, session: &Session) -> clawft_types::Result<()> {
        let path = self.session_path(&session.key);

        let meta = serde_json::json!({
            "_type": "metadata",
            "created_at": session.created_at.to_rfc3339(),
            "updated_at": session.updated_at.to_rfc3339(),
            "metadata": session.metadata,
            "last_consolidated": session.last_consolidated,
        });

        let mut content = serde_json::to_string(&meta).map_err(ClawftError::Json)?;
        content.push('\n');

        for msg in &session.messages {
            content.push_str(&serde_json::to_string(msg).map_err(ClawftError::Json)?);
            content.push('\n');
        }

        self.platform.fs().write_string(&path, &content).await?;

        // Update cache.
        let mut cache = self.active_sessions.lock().await;
        cache.insert(session.key.clone(), session.clone());

        debug!(key = %session.key, "saved session to disk");

        Ok(())
    }

    /// Append a single conversation turn to a session.
    ///
    /// Updates both the in-memory cache and appends to the JSONL file on disk.
    /// If the session does not exist yet, it is created via [`get_or_create`].
    pub async fn append_turn(
        &self,
        key: &str,
        role: &str,
        content: &str,
    ) -> clawft_types::Result<()> {
        crate::security::validate_session_id(key)?;
        let mut session = self.get_or_create(key).await?;
        session.add_message(role, content, None);

        // Append message line to file.
        let msg = serde_json::json!({
            "role": role,
            "content": content,
            "timestamp": Utc::now().to_rfc3339(),
        });
        let mut line = serde_json::to_string(&msg).map_err(ClawftError::Json)?;
        line.push('\n');

        let path = self.session_path(key);

        // If the file does not exist yet, write the full session (with metadata).
        if !self.platform.fs().exists(&path).await {
            self.save_session(&session).await?;
        } else {
            self.platform.fs().append_string(&path, &line).await?;
            // Update cache.
            let mut cache = self.active_sessions.lock().await;
            cache.insert(key.to_string(), session);
        }

        Ok(())
    }

    /// List all session keys (derived from `.jsonl` filenames on disk).
    ///
    /// Decodes percent-encoded filenames back to the original session key.
    /// Files that cannot be decoded as valid UTF-8 are skipped with a warning.
    pub async fn list_sessions(&self) -> clawft_types::Result<Vec<String>> {
        let entries = self
            .platform
            .fs()
            .list_dir(&self.sessions_dir)
            .await
            .map_err(ClawftError::Io)?;

        let mut keys = Vec::new();
        for entry in entries {
            if let Some(name) = entry.file_name() {
                let name = name.to_string_lossy();
                if let Some(stem) = name.strip_suffix(".jsonl") {
                    match percent_decode_str(stem).decode_utf8() {
                        Ok(decoded) => keys.push(decoded.into_owned()),
                        Err(e) => {
                            warn!(filename = %name, error = %e, "skipping undecodable session filename");
                        }
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Remove a session from the in-memory cache.
    ///
    /// The JSONL file on disk is not deleted; only the cached copy is
    /// evicted. The next [`get_or_create`] call will reload from disk.
    pub async fn invalidate(&self, key: &str) {
        let mut cache = self.active_sessions.lock().await;
        cache.remove(key);
        debug!(key = key, "invalidated session cache entry");
    }

    /// Delete a session file from disk and remove from cache.
    pub async fn delete_session(&self, key: &str) -> clawft_types::Result<()> {
        crate::security::validate_session_id(key)?;
        let path = self.session_path(key);
        if self.platform.fs().exists(&path).await {
            self.platform
                .fs()
                .remove_file(&path)
                .await
                .map_err(ClawftError::Io)?;
        }
        self.invalidate(key).await;
        Ok(())
    }

    /// Get the sessions directory path.
    pub fn sessions_dir(&self) -> &PathBuf {
        &self.sessions_dir
    }

    /// Compute the filesystem path for a session key.
    ///
    /// Uses percent-encoding to safely represent any valid session key as
    /// a filename. This is reversible: `list_sessions()` decodes back to
    /// the original key.
    fn session_path(&self, key: &str) -> PathBuf {
        let encoded = percent_encode(key.as_bytes(), NON_ALPHANUMERIC).to_string();
        let filename = format!("{encoded}.jsonl");
        self.sessions_dir.join(filename)
    }

    /// Append a turn, then evict the oldest messages if the session now
    /// holds more than `max_messages`.
    ///
    /// Unlike [`append_turn`](Self::append_turn) (a single-line disk
    /// append), this rewrites the whole session file whenever eviction is
    /// needed, since a trimmed history can no longer be expressed as an
    /// append.
    pub async fn append_turn_bounded(
        &self,
        key: &str,
        role: &str,
        content: &str,
        max_messages: usize,
    ) -> clawft_types::Result<()> {
        self.append_turn(key, role, content).await?;

        let mut session = self.get_or_create(key).await?;
        if session.messages.len() <= max_messages {
            return Ok(());
        }

        let start = session.messages.len() - max_messages;
        session.messages.drain(..start);
        self.save_session(&session).await
    }

    /// Assemble a single textual prefix from a session's messages, bounded
    /// by `max_chars`.
    ///
    /// Messages are taken from the end of the history backwards until
    /// adding the next (earlier) one would exceed `max_chars`; the
    /// included messages are then rendered oldest-first. A message is
    /// never split: either it is fully included or fully dropped. Returns
    /// the empty string if the session has no messages (or does not
    /// exist).
    pub async fn context(&self, key: &str, max_chars: usize) -> clawft_types::Result<String> {
        let session = match self.load_session(key).await {
            Ok(session) => session,
            Err(_) => {
                let cache = self.active_sessions.lock().await;
                match cache.get(key) {
                    Some(session) => session.clone(),
                    None => return Ok(String::new()),
                }
            }
        };

        let mut included = Vec::new();
        let mut used = 0usize;
        for msg in session.messages.iter().rev() {
            let role = msg.get("role").and_then(|v| v.as_str()).unwrap_or("user");
            let content = msg.get("content").and_then(|v| v.as_str()).unwrap_or("");
            let rendered = format!("{role}: {content}");
            if used + rendered.len() > max_chars && !included.is_empty() {
                break;
            }
            used += rendered.len();
            included.push(rendered);
        }
        included.reverse();
        Ok(included.join("\n"))
    }

    /// Delete a session, reporting whether it existed beforehand.
    pub async fn delete_session_if_exists(&self, key: &str) -> clawft_types::Result<bool> {
        crate::security::validate_session_id(key)?;
        let existed = self.platform.fs().exists(&self.session_path(key)).await
            || self.active_sessions.lock().await.contains_key(key);
        self.delete_session(key).await?;
        Ok(existed)
    }

    /// Delete every session whose last update is older than `ttl`.
    ///
    /// Returns the number of sessions removed. Bounded by the number of
    /// expired sessions found, not the total session count.
    pub async fn sweep_expired(
        &self,
        now: chrono::DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> clawft_types::Result<usize> {
        let keys = self.list_sessions().await?;
        let mut swept = 0;
        for key in keys {
            let session = match self.load_session(&key).await {
                Ok(session) => session,
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping unreadable session during sweep");
                    continue;
                }
            };
            if now - session.updated_at > ttl {
                self.delete_session(&key).await?;
                swept += 1;
            }
        }
        if swept > 0 {
            debug!(count = swept, "swept expired sessions");
        }
        Ok(swept)
    }
}
