//! Session registry: one wizard controller per open browser session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SessionError;
use crate::gateway::SubmissionGateway;
use crate::notify::{BroadcastNotifier, Notice};
use crate::wizard::{FlowDefinition, WizardController};

/// A flow visitors can open sessions on.
struct RegisteredFlow {
    flow: Arc<FlowDefinition>,
    gateway: Arc<dyn SubmissionGateway>,
}

/// Flow listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSummary {
    pub id: String,
    pub title: String,
    pub sections: usize,
}

struct SessionEntry {
    controller: Arc<WizardController>,
    notifier: Arc<BroadcastNotifier>,
    opened_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

/// Session bookkeeping as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub flow: String,
    pub opened_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

pub struct SessionRegistry {
    flows: Vec<RegisteredFlow>,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            flows: Vec::new(),
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Make a flow available. A flow registered twice replaces the earlier one.
    pub fn register_flow(&mut self, flow: FlowDefinition, gateway: Arc<dyn SubmissionGateway>) {
        info!(flow = %flow.id, endpoint = %flow.endpoints.submit_url, "Registered flow");
        self.flows.retain(|f| f.flow.id != flow.id);
        self.flows.push(RegisteredFlow {
            flow: Arc::new(flow),
            gateway,
        });
    }

    pub fn flows(&self) -> Vec<FlowSummary> {
        self.flows
            .iter()
            .map(|f| FlowSummary {
                id: f.flow.id.clone(),
                title: f.flow.title.clone(),
                sections: f.flow.sections.len(),
            })
            .collect()
    }

    /// Start a fresh wizard on `flow_id`.
    pub async fn open(&self, flow_id: &str) -> Result<(Uuid, Arc<WizardController>), SessionError> {
        let registered = self
            .flows
            .iter()
            .find(|f| f.flow.id == flow_id)
            .ok_or_else(|| SessionError::UnknownFlow {
                flow: flow_id.to_string(),
            })?;

        let notifier = BroadcastNotifier::new();
        let controller = Arc::new(WizardController::new(
            registered.flow.clone(),
            registered.gateway.clone(),
            notifier.clone(),
        ));

        let id = Uuid::new_v4();
        let now = Utc::now();
        self.sessions.write().await.insert(
            id,
            SessionEntry {
                controller: controller.clone(),
                notifier,
                opened_at: now,
                last_seen: now,
            },
        );
        info!(session = %id, flow = flow_id, "Session opened");
        Ok((id, controller))
    }

    /// Look up a session's controller and mark it as active.
    pub async fn get(&self, id: Uuid) -> Result<Arc<WizardController>, SessionError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or(SessionError::NotFound { id })?;
        entry.last_seen = Utc::now();
        Ok(entry.controller.clone())
    }

    pub async fn info(&self, id: Uuid) -> Result<SessionInfo, SessionError> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&id).ok_or(SessionError::NotFound { id })?;
        Ok(SessionInfo {
            id,
            flow: entry.controller.flow().id.clone(),
            opened_at: entry.opened_at,
            last_seen: entry.last_seen,
        })
    }

    /// Receive the notices of one session.
    pub async fn subscribe(&self, id: Uuid) -> Result<broadcast::Receiver<Notice>, SessionError> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&id).ok_or(SessionError::NotFound { id })?;
        Ok(entry.notifier.subscribe())
    }

    /// Drop a session. Returns false if it was not open.
    pub async fn close(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            debug!(session = %id, "Session closed");
        }
        removed
    }

    /// Drop sessions idle for at least the configured timeout.
    /// Returns the number removed.
    pub async fn prune_idle(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            let idle = now
                .signed_duration_since(entry.last_seen)
                .to_std()
                .unwrap_or_default();
            idle < self.idle_timeout
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(count = pruned, "Pruned idle sessions");
        }
        pruned
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Spawn a background task that periodically drops idle sessions.
pub fn spawn_sweep_task(
    registry: Arc<SessionRegistry>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            registry.prune_idle().await;
        }
    })
}
