//! Process-wide session engine
//!
//! Owns the session registry and the engine-wide limits that capability
//! policies consult (bitrate ceiling, all-intra macroblock budget,
//! secure-session count). Sessions are fully independent: each lives
//! behind its own mutex, and cross-session state is limited to the shared
//! counters here.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::controls::types::{Codec, Domain};
use crate::error::{Error, Result};
use crate::platform;
use crate::session::{Session, SessionId};
use crate::transport::DeviceTransport;

/// Engine-wide limits, typically loaded from deployment configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum concurrently open sessions
    pub max_sessions: u32,
    /// Maximum concurrently open secure sessions
    pub max_secure_sessions: u32,
    /// Macroblocks-per-second budget for all-intra encoding
    pub max_mbps_all_intra: u32,
    /// Bitrate ceiling in bits per second
    pub max_bitrate: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_sessions: 16,
            max_secure_sessions: 3,
            max_mbps_all_intra: 1_036_800,
            max_bitrate: 245_000_000,
        }
    }
}

impl EngineConfig {
    /// Parse limits from a JSON configuration document.
    ///
    /// Missing fields keep their defaults.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// State shared between the engine and its sessions.
#[derive(Debug, Default)]
pub(crate) struct EngineShared {
    config: EngineConfig,
    secure_sessions: AtomicU32,
}

impl EngineShared {
    pub(crate) fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            secure_sessions: AtomicU32::new(0),
        }
    }

    pub(crate) fn config(&self) -> EngineConfig {
        self.config
    }

    /// Reserve a secure-session slot.
    pub(crate) fn acquire_secure(&self) -> Result<()> {
        let limit = self.config.max_secure_sessions;
        let outcome = self
            .secure_sessions
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                if count < limit {
                    Some(count + 1)
                } else {
                    None
                }
            });

        match outcome {
            Ok(_) => Ok(()),
            Err(count) => {
                warn!(count, limit, "secure session limit reached");
                Err(Error::SessionLimit(format!(
                    "secure sessions at limit ({limit})"
                )))
            }
        }
    }

    /// Return a secure-session slot.
    pub(crate) fn release_secure(&self) {
        self.secure_sessions.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Process-wide session registry.
pub struct Engine {
    shared: Arc<EngineShared>,
    sessions: DashMap<SessionId, Arc<Mutex<Session>>>,
    next_id: AtomicU64,
}

impl Engine {
    /// Engine with default limits.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Engine with explicit limits.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            shared: Arc::new(EngineShared::with_config(config)),
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Effective limits.
    pub fn config(&self) -> EngineConfig {
        self.shared.config()
    }

    /// Open a session for a built-in (domain, codec) template.
    ///
    /// The returned handle is the session's mutex; all capability
    /// operations run under it.
    pub fn open_session(
        &self,
        domain: Domain,
        codec: Codec,
        transport: Box<dyn DeviceTransport>,
    ) -> Result<Arc<Mutex<Session>>> {
        if self.sessions.len() as u32 >= self.shared.config.max_sessions {
            return Err(Error::SessionLimit(format!(
                "sessions at limit ({})",
                self.shared.config.max_sessions
            )));
        }

        let template = platform::template_for(domain, codec)
            .ok_or(Error::UnsupportedSession { domain, codec })?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Session::create(id, template, transport, Arc::clone(&self.shared))?;

        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(id, Arc::clone(&handle));
        info!(session = id, total = self.sessions.len(), "session registered");
        Ok(handle)
    }

    /// Look up an open session.
    pub fn session(&self, id: SessionId) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a session from the registry.
    ///
    /// The session itself is torn down once the last outstanding handle
    /// drops.
    pub fn close_session(&self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            info!(session = id, total = self.sessions.len(), "session closed");
        }
        removed
    }

    /// Number of open sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
