use crate::error::{AppError, AppResult};
use crate::notifier::EngineEvent;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub timestamp: i64,
    pub event_type: String,
    pub channel: String,
    pub details: serde_json::Value,
}

impl AuditLogEntry {
    pub fn from_event(event: &EngineEvent) -> AppResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now().timestamp(),
            event_type: event.event_type().to_string(),
            channel: event.channel(),
            details: serde_json::to_value(event)?,
        })
    }
}

/// Append-only JSON-lines trail of engine events
pub struct AuditTrailService {
    log_file: PathBuf,
    file_handle: Arc<Mutex<std::fs::File>>,
}

impl AuditTrailService {
    /// Open today's audit file in `log_directory`, creating it if needed
    pub fn new(log_directory: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(log_directory)
            .map_err(|e| AppError::Message(format!("Failed to create log directory: {}", e)))?;

        let date = chrono::Utc::now().format("%Y-%m-%d");
        let log_file = log_directory.join(format!("audit_{}.log", date));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .map_err(|e| AppError::Message(format!("Failed to open audit log file: {}", e)))?;

        info!("Audit trail initialized: {:?}", log_file);

        Ok(Self {
            log_file,
            file_handle: Arc::new(Mutex::new(file)),
        })
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Log an audit entry
    pub async fn log(&self, entry: &AuditLogEntry) -> AppResult<()> {
        let json = serde_json::to_string(entry)?;

        let mut file = self.file_handle.lock().await;
        writeln!(file, "{}", json)
            .map_err(|e| AppError::Message(format!("Failed to write audit log: {}", e)))?;

        file.flush()
            .map_err(|e| AppError::Message(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    pub async fn log_event(&self, event: &EngineEvent) -> AppResult<()> {
        let entry = AuditLogEntry::from_event(event)?;
        self.log(&entry).await
    }

    /// Write every event received on `events` until all publishers are gone
    pub fn spawn_drain(self: Arc<Self>, mut events: Receiver<EngineEvent>) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut written = 0usize;
            loop {
                match events.recv().await {
                    Ok(event) => match self.log_event(&event).await {
                        Ok(()) => written += 1,
                        Err(e) => error!("Failed to audit {}: {}", event.event_type(), e),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Audit trail lagged, {} events were not recorded", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            info!("Audit trail drained, {} entries written", written);
            written
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::EventNotifier;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bracket_pool_audit_{}_{}", tag, Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_log_event_appends_json_line() {
        let dir = temp_dir("append");
        let audit = AuditTrailService::new(&dir).unwrap();

        audit
            .log_event(&EngineEvent::RoundAdvanced {
                tournament_id: 4,
                round: 2,
            })
            .await
            .unwrap();

        let contents = std::fs::read_to_string(audit.log_file()).unwrap();
        let entry: AuditLogEntry = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(entry.event_type, "round_advanced");
        assert_eq!(entry.channel, "tournament:4");
        assert_eq!(entry.details["round"], 2);

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_drain_stops_when_publishers_drop() {
        let dir = temp_dir("drain");
        let audit = Arc::new(AuditTrailService::new(&dir).unwrap());
        let notifier = EventNotifier::new(8);
        let handle = audit.clone().spawn_drain(notifier.subscribe());

        notifier.publish(EngineEvent::RoundAdvanced {
            tournament_id: 1,
            round: 2,
        });
        notifier.publish(EngineEvent::RoundReverted {
            tournament_id: 1,
            round: 1,
        });
        drop(notifier);

        assert_eq!(handle.await.unwrap(), 2);
        let contents = std::fs::read_to_string(audit.log_file()).unwrap();
        assert_eq!(contents.lines().count(), 2);

        std::fs::remove_dir_all(dir).ok();
    }
}
