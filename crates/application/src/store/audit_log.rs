use chrono::{DateTime, Utc};
use orbit_core::{TenantId, UserId};
use orbit_domain::AuditAction;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Audit payload before an id and timestamp are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Tenant the action happened in.
    pub tenant_id: TenantId,
    /// Acting user.
    pub user_id: UserId,
    /// Action kind.
    pub action: AuditAction,
    /// Module or area name.
    pub module: String,
    /// Affected record.
    pub record_id: Option<String>,
    /// Extra details.
    pub meta: Option<Value>,
}

impl AuditEvent {
    /// Creates an event without record or details.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        user_id: UserId,
        action: AuditAction,
        module: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            action,
            module: module.into(),
            record_id: None,
            meta: None,
        }
    }

    /// Attaches the affected record id.
    #[must_use]
    pub fn with_record(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Recorded audit entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Generated id.
    pub id: String,
    /// Tenant the action happened in.
    pub tenant_id: TenantId,
    /// Acting user.
    pub user_id: UserId,
    /// Action kind.
    pub action: AuditAction,
    /// Module or area name.
    pub module: String,
    /// Affected record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Extra details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Append-only client audit log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    /// Returns entries in recording order.
    #[must_use]
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Returns entries of one action kind.
    #[must_use]
    pub fn with_action(&self, action: AuditAction) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.action == action)
            .collect()
    }

    pub(super) fn append(&mut self, event: AuditEvent, now: DateTime<Utc>) {
        self.entries.push(AuditEntry {
            id: format!("audit-{}", Uuid::new_v4()),
            tenant_id: event.tenant_id,
            user_id: event.user_id,
            action: event.action,
            module: event.module,
            record_id: event.record_id,
            meta: event.meta,
            timestamp: now,
        });
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }
}
