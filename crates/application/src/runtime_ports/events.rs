use appdeck_core::{AppInstanceId, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// High-level transition produced by the preview runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RuntimeEvent {
    /// Navigation moved to another screen.
    Navigated {
        /// Screen or auth pseudo-screen id.
        screen_id: String,
    },
    /// A popup was raised.
    PopupOpened {
        /// Popup variant.
        variant: String,
    },
    /// A record was appended to a table.
    RecordInserted {
        /// Table name.
        table: String,
        /// Generated record id.
        record_id: String,
    },
    /// A record deletion was requested.
    RecordDeleted {
        /// Table name.
        table: String,
        /// Requested record id.
        record_id: String,
        /// Whether a record was actually removed.
        removed: bool,
    },
    /// An api submission finished.
    ApiSubmitted {
        /// Endpoint after interpolation.
        endpoint: String,
        /// Whether the success branch was taken.
        succeeded: bool,
    },
    /// A simulated session started.
    SessionStarted {
        /// Session user id.
        user_id: String,
    },
    /// The simulated session ended.
    SessionEnded,
    /// An action was ignored.
    ActionIgnored {
        /// Authored action type.
        action_type: String,
        /// Why it was ignored.
        reason: String,
    },
    /// An action chain exceeded the nesting bound.
    ChainAborted {
        /// Depth at which dispatch stopped.
        depth: usize,
    },
}

/// Event envelope delivered to sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeEventRecord {
    /// Owning app instance.
    pub app_instance_id: AppInstanceId,
    /// Emission time.
    pub occurred_at: DateTime<Utc>,
    /// Event payload.
    pub event: RuntimeEvent,
}

impl RuntimeEventRecord {
    /// Wraps an event emitted now.
    #[must_use]
    pub fn now(app_instance_id: AppInstanceId, event: RuntimeEvent) -> Self {
        Self {
            app_instance_id,
            occurred_at: Utc::now(),
            event,
        }
    }
}

/// Port receiving runtime events.
#[async_trait]
pub trait RuntimeEventSink: Send + Sync {
    /// Publishes one event.
    async fn publish(&self, record: RuntimeEventRecord) -> AppResult<()>;
}
