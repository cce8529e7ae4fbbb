//! Audit trail for lock traffic and registry mutations
//!
//! Sinks never fail the operation they observe: recording is infallible from
//! the caller's point of view and sink-side errors are logged and dropped.

use super::authorization::{CallerContext, RegistryOperation};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// How a lock scope ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockOutcome {
    /// The guarded operation returned `Ok`
    Completed,
    /// The guarded operation returned an error or panicked
    Failed,
}

/// How a mutation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MutationOutcome {
    Success { slots: usize },
    Failure { reason: String },
}

/// Audit event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// One `add_if_absent` attempt on a lock key
    LockAttempt {
        scope: String,
        attempt: usize,
        acquired: bool,
    },
    /// Every attempt failed; the guarded operation did not run
    LockContended { scope: String, attempts: usize },
    /// The lock key was deleted after the guarded operation
    LockReleased {
        scope: String,
        held_ms: u64,
        outcome: LockOutcome,
    },
    /// A registry mutation finished
    Mutation {
        operation: RegistryOperation,
        slot_id: Option<u32>,
        principal: String,
        outcome: MutationOutcome,
    },
    /// The authorizer refused a mutation
    AuthorizationDenied {
        operation: RegistryOperation,
        principal: String,
        reason: String,
    },
}

impl AuditEvent {
    pub fn mutation(
        operation: RegistryOperation,
        slot_id: Option<u32>,
        ctx: &CallerContext,
        outcome: MutationOutcome,
    ) -> Self {
        AuditEvent::Mutation {
            operation,
            slot_id,
            principal: ctx.principal.clone(),
            outcome,
        }
    }
}

/// Timestamped audit entry as written by persistent sinks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub pid: u32,
    #[serde(flatten)]
    pub event: AuditEvent,
}

impl AuditRecord {
    pub fn now(event: AuditEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            pid: std::process::id(),
            event,
        }
    }
}

/// Receiver of audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

/// Emits each event as a structured `tracing` event under `noticeboard::audit`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!(target: "noticeboard::audit", event = %json),
            Err(e) => tracing::warn!(error = %e, "failed to encode audit event"),
        }
    }
}

/// Keeps events in memory; used by tests and diagnostics
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }
}

/// Appends one JSON object per line to a file
///
/// The file is opened in append mode so several processes can share it; each
/// record is written with a single `write_all` followed by a flush.
#[derive(Debug)]
pub struct JsonlAuditSink {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl JsonlAuditSink {
    /// Open (or create) the log lazily; a path that cannot be opened only
    /// produces warnings when events arrive
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> std::io::Result<BufWriter<File>> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(BufWriter::new(file))
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut line = match serde_json::to_string(&AuditRecord::now(event)) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode audit record");
                return;
            }
        };
        line.push('\n');

        let mut guard = self.writer.lock();
        if guard.is_none() {
            match self.open() {
                Ok(writer) => *guard = Some(writer),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "audit log unavailable"
                    );
                    return;
                }
            }
        }
        if let Some(writer) = guard.as_mut() {
            if let Err(e) = writer
                .write_all(line.as_bytes())
                .and_then(|()| writer.flush())
            {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to write audit record"
                );
                *guard = None;
            }
        }
    }
}
