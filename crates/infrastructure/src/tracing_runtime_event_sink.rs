//! Runtime event sink that writes events to tracing output.

use appdeck_application::{RuntimeEvent, RuntimeEventRecord, RuntimeEventSink};
use appdeck_core::{AppError, AppResult};
use async_trait::async_trait;
use tracing::info;

/// Development sink that logs every runtime event as a structured `info!`.
#[derive(Debug, Clone, Default)]
pub struct TracingRuntimeEventSink;

impl TracingRuntimeEventSink {
    /// Creates a new tracing event sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn event_name(event: &RuntimeEvent) -> &'static str {
    match event {
        RuntimeEvent::Navigated { .. } => "navigated",
        RuntimeEvent::PopupOpened { .. } => "popup_opened",
        RuntimeEvent::RecordInserted { .. } => "record_inserted",
        RuntimeEvent::RecordDeleted { .. } => "record_deleted",
        RuntimeEvent::ApiSubmitted { .. } => "api_submitted",
        RuntimeEvent::SessionStarted { .. } => "session_started",
        RuntimeEvent::SessionEnded => "session_ended",
        RuntimeEvent::ActionIgnored { .. } => "action_ignored",
        RuntimeEvent::ChainAborted { .. } => "chain_aborted",
    }
}

#[async_trait]
impl RuntimeEventSink for TracingRuntimeEventSink {
    async fn publish(&self, record: RuntimeEventRecord) -> AppResult<()> {
        let payload = serde_json::to_string(&record.event).map_err(|error| {
            AppError::Internal(format!("failed to serialize runtime event: {error}"))
        })?;

        info!(
            app_instance_id = %record.app_instance_id,
            occurred_at = %record.occurred_at,
            event = event_name(&record.event),
            payload = %payload,
            "runtime event"
        );

        Ok(())
    }
}
