use chrono::{DateTime, Utc};
use orbit_core::TenantId;
use serde::{Deserialize, Serialize};

use crate::plan::Plan;

/// Lifecycle status of a tenant organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    /// Tenant is in good standing.
    Active,
    /// Tenant access is paused.
    Suspended,
    /// Tenant closed its account.
    Cancelled,
}

/// Default brand color used when a tenant has none configured.
pub const DEFAULT_PRIMARY_COLOR: &str = "#2563EB";

/// Isolated customer organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    /// Tenant identifier.
    pub id: TenantId,
    /// Display name.
    pub name: String,
    /// Organization domain.
    pub domain: String,
    /// Subscription plan tag.
    pub plan: Plan,
    /// Lifecycle status.
    pub status: TenantStatus,
    /// Logo location.
    #[serde(default)]
    pub logo_url: String,
    /// Brand color.
    #[serde(default)]
    pub primary_color: String,
    /// Dark-mode preference.
    #[serde(default)]
    pub dark_mode: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Returns whether the tenant is in good standing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }

    /// Returns the configured brand color or the default one.
    #[must_use]
    pub fn primary_color(&self) -> &str {
        if self.primary_color.trim().is_empty() {
            DEFAULT_PRIMARY_COLOR
        } else {
            self.primary_color.as_str()
        }
    }
}
