//! Driver command monitoring forwarded to `tracing`

use mongodb::event::command::{
    CommandEventHandler, CommandFailedEvent, CommandStartedEvent, CommandSucceededEvent,
};

/// Logs every command the driver sends: `trace!` on start and success,
/// `warn!` on failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCommandMonitor;

impl CommandEventHandler for TracingCommandMonitor {
    fn handle_command_started_event(&self, event: CommandStartedEvent) {
        tracing::trace!(
            request_id = event.request_id,
            db = %event.db,
            command = %event.command_name,
            "mongo command started: {}",
            event.command
        );
    }

    fn handle_command_succeeded_event(&self, event: CommandSucceededEvent) {
        tracing::trace!(
            request_id = event.request_id,
            command = %event.command_name,
            elapsed_ms = event.duration.as_millis() as u64,
            "mongo command succeeded"
        );
    }

    fn handle_command_failed_event(&self, event: CommandFailedEvent) {
        tracing::warn!(
            request_id = event.request_id,
            command = %event.command_name,
            elapsed_ms = event.duration.as_millis() as u64,
            "mongo command failed: {}",
            event.failure
        );
    }
}
