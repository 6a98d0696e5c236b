//! Provisioning progress events.
//!
//! The workflow reports through an injected [`ProvisionObserver`] instead of
//! logging directly, so callers decide where progress goes and tests can
//! inspect it.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a provisioning attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionState {
    Start,
    CheckTargetAbsent,
    RemoteCreated,
    SourceCloned,
    BranchResolved,
    Pushed,
    RolledBack,
}

impl std::fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisionState::Start => write!(f, "start"),
            ProvisionState::CheckTargetAbsent => write!(f, "check-target-absent"),
            ProvisionState::RemoteCreated => write!(f, "remote-created"),
            ProvisionState::SourceCloned => write!(f, "source-cloned"),
            ProvisionState::BranchResolved => write!(f, "branch-resolved"),
            ProvisionState::Pushed => write!(f, "pushed"),
            ProvisionState::RolledBack => write!(f, "rolled-back"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One observable step of a provisioning attempt. Messages never contain tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionEvent {
    pub timestamp: DateTime<Utc>,
    pub state: ProvisionState,
    pub level: EventLevel,
    pub message: String,
}

impl ProvisionEvent {
    pub fn new(state: ProvisionState, level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            state,
            level,
            message: message.into(),
        }
    }
}

/// Receives provisioning events.
pub trait ProvisionObserver: Send + Sync {
    fn on_event(&self, event: &ProvisionEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProvisionObserver for LogObserver {
    fn on_event(&self, event: &ProvisionEvent) {
        let target = "cyaudit::provision";
        match event.level {
            EventLevel::Debug => log::debug!(target: target, "[{}] {}", event.state, event.message),
            EventLevel::Info => log::info!(target: target, "[{}] {}", event.state, event.message),
            EventLevel::Warn => log::warn!(target: target, "[{}] {}", event.state, event.message),
            EventLevel::Error => log::error!(target: target, "[{}] {}", event.state, event.message),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ProvisionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<ProvisionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// The states visited, in order, with consecutive duplicates collapsed.
    pub fn states(&self) -> Vec<ProvisionState> {
        let mut states: Vec<ProvisionState> = Vec::new();
        for event in self.events() {
            if states.last() != Some(&event.state) {
                states.push(event.state);
            }
        }
        states
    }
}

impl ProvisionObserver for RecordingObserver {
    fn on_event(&self, event: &ProvisionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
