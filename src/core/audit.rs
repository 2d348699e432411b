//! Audit sink implementations.
//!
//! Provides in-memory logging and Postgres schema definitions for audit
//! persistence of scheduler transitions.

use std::collections::VecDeque;

use crate::util::clock::now_ms;
use crate::util::ids::{GroupId, MemberId};

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Group whose turn state changed.
    pub group: GroupId,
    /// Member the action concerns, when attributable.
    pub member: Option<MemberId>,
    /// Action taken (acquire, enqueue, release, expire, promote, remove).
    pub action: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Postgres-backed audit sink (schema-only; DB I/O not wired).
pub struct PostgresAuditSink;

impl PostgresAuditSink {
    /// Returns SQL migration statements for the audit log.
    #[must_use]
    pub fn migrations() -> &'static [&'static str] {
        &[
            r#"
CREATE TABLE IF NOT EXISTS tl_audit_events (
    event_id TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    member_id TEXT,
    action TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_tl_audit_events_group_created ON tl_audit_events (group_id, created_at);
CREATE INDEX IF NOT EXISTS idx_tl_audit_events_member ON tl_audit_events (member_id);
"#,
        ]
    }
}

impl AuditSink for PostgresAuditSink {
    fn record(&mut self, _event: AuditEvent) {
        // Stub: actual DB writes require a runtime + client; left to integration layer.
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    group: GroupId,
    member: Option<MemberId>,
    action: impl Into<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        group,
        member,
        action: action.into(),
        created_at_ms: now_ms(),
    }
}
