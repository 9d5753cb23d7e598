//! Named session registry built from config text.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{HostError, Result};
use crate::mcp::{parse_config, Session, SessionConnector};

/// Owns the named sessions of one host. Names are unique and never overwritten.
#[derive(Default, Clone)]
pub struct SessionRegistry {
    sessions: BTreeMap<String, Arc<dyn Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `config` and connect every session it names, in line order.
    pub async fn build(config: &str, connector: &dyn SessionConnector) -> Result<Self> {
        let mut registry = Self::new();
        registry.add_sessions(config, connector).await?;
        Ok(registry)
    }

    /// Register already-connected sessions.
    pub fn from_sessions(sessions: impl IntoIterator<Item = Arc<dyn Session>>) -> Result<Self> {
        let mut registry = Self::new();
        for session in sessions {
            registry.insert(session)?;
        }
        Ok(registry)
    }

    /// Parse `config` and merge its sessions into this registry.
    ///
    /// Every line is parsed and name-checked before anything connects. New
    /// sessions are committed only if all of them connect; the rest are
    /// dropped, which cancels their services. Returns the number added.
    pub async fn add_sessions(
        &mut self,
        config: &str,
        connector: &dyn SessionConnector,
    ) -> Result<usize> {
        let specs = parse_config(config)?;

        let mut seen = HashSet::with_capacity(specs.len());
        for spec in &specs {
            if self.sessions.contains_key(&spec.name) || !seen.insert(spec.name.as_str()) {
                return Err(name_conflict(&spec.name));
            }
        }

        let mut connected = Vec::with_capacity(specs.len());
        for spec in &specs {
            let session = connector.connect(spec).await?;
            connected.push((spec.name.clone(), session));
        }

        let added = connected.len();
        self.sessions.extend(connected);
        info!(added, total = self.sessions.len(), "sessions registered");
        Ok(added)
    }

    /// Register one connected session under its own name.
    pub fn insert(&mut self, session: Arc<dyn Session>) -> Result<()> {
        let name = session.name().to_string();
        if self.sessions.contains_key(&name) {
            return Err(name_conflict(&name));
        }
        self.sessions.insert(name, session);
        Ok(())
    }

    /// Registered server names in ascending order.
    pub fn list_names(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Session>> {
        self.sessions
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::UnknownServer(name.to_string()))
    }

    /// Sessions paired with their names, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Session>)> {
        self.sessions.iter().map(|(name, session)| (name.as_str(), session))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every session. Failures are logged and do not stop the rest.
    pub async fn close_all(&self) {
        for (name, session) in &self.sessions {
            if let Err(error) = session.close().await {
                warn!(server = %name, %error, "failed to close session");
            }
        }
    }
}

fn name_conflict(name: &str) -> HostError {
    HostError::Configuration(format!("server name conflict: {name}"))
}
