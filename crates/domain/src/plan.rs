use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use orbit_core::{AppError, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seat count used by the top-tier plan to mean "no limit".
pub const UNLIMITED_SEATS: u32 = 9999;

/// Share of seats in use at which the usage notice starts warning.
pub const SEAT_WARNING_RATIO: f64 = 0.8;

/// Lifetime of a subscription synthesized from the plan tag.
pub const SYNTHESIZED_SUBSCRIPTION_DAYS: i64 = 365;

/// Subscription plan tag attached to a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Entry plan with the core sales modules.
    Basic,
    /// Mid tier adding accounts, activities, marketing and catalog modules.
    Pro,
    /// Every module and effectively unlimited seats.
    Enterprise,
}

impl Plan {
    /// Returns the stable transport value for this plan.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Returns the display label for this plan.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Pro => "Pro",
            Self::Enterprise => "Enterprise",
        }
    }

    /// Returns the feature (module) identifiers granted by this plan.
    #[must_use]
    pub fn features(&self) -> &'static [&'static str] {
        match self {
            Self::Basic => &["dashboard", "leads", "contacts", "deals", "settings"],
            Self::Pro => &[
                "dashboard",
                "leads",
                "contacts",
                "accounts",
                "deals",
                "activities",
                "campaigns",
                "products",
                "quotes",
                "reports",
                "settings",
            ],
            Self::Enterprise => &[
                "dashboard",
                "leads",
                "contacts",
                "accounts",
                "deals",
                "activities",
                "campaigns",
                "products",
                "quotes",
                "invoices",
                "orders",
                "forecasting",
                "reports",
                "settings",
            ],
        }
    }

    /// Returns the maximum number of active users the plan allows.
    #[must_use]
    pub fn max_users(&self) -> u32 {
        match self {
            Self::Basic => 5,
            Self::Pro => 20,
            Self::Enterprise => UNLIMITED_SEATS,
        }
    }
}

impl FromStr for Plan {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(AppError::Validation(format!("unknown plan value '{value}'"))),
        }
    }
}

/// Subscription attached to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Subscription identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Plan tag.
    pub plan: Plan,
    /// Backend status label, `active` when healthy.
    pub status: String,
    /// Maximum active users; [`UNLIMITED_SEATS`] means no limit.
    pub max_users: u32,
    /// Expiry timestamp.
    pub expiry_date: DateTime<Utc>,
    /// Enabled module identifiers; the only source of truth for reachability.
    pub features: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Builds an active subscription from the fixed plan tables.
    ///
    /// Used when the backend did not supply a subscription for the tenant.
    #[must_use]
    pub fn synthesize(tenant_id: TenantId, plan: Plan, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("sub-{}", Uuid::new_v4()),
            tenant_id,
            plan,
            status: "active".to_owned(),
            max_users: plan.max_users(),
            expiry_date: now + Duration::days(SYNTHESIZED_SUBSCRIPTION_DAYS),
            features: plan
                .features()
                .iter()
                .map(|feature| (*feature).to_owned())
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns whether the seat count is effectively unlimited.
    #[must_use]
    pub fn has_unlimited_seats(&self) -> bool {
        self.max_users >= UNLIMITED_SEATS
    }

    /// Returns whether the subscription expired before `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date < now
    }
}

/// Returns whether the subscription enables the module.
#[must_use]
pub fn is_module_enabled(subscription: &Subscription, module: &str) -> bool {
    subscription
        .features
        .iter()
        .any(|feature| feature == module)
}

/// Returns whether adding another active user would exceed the plan.
///
/// Always `false` for the unlimited sentinel regardless of the count.
#[must_use]
pub fn is_seat_limit_reached(active_users: usize, subscription: &Subscription) -> bool {
    if subscription.has_unlimited_seats() {
        return false;
    }

    active_users >= subscription.max_users as usize
}

/// Banner state derived from subscription health and seat usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UsageNotice {
    /// The subscription is past its expiry date.
    Expired {
        /// Plan that expired.
        plan: Plan,
    },
    /// Seat usage crossed [`SEAT_WARNING_RATIO`].
    NearSeatLimit {
        /// Plan in effect.
        plan: Plan,
        /// Active users in the tenant.
        used: usize,
        /// Seat limit of the plan.
        max_users: u32,
        /// Whether no further users can be added.
        limit_reached: bool,
    },
}

/// Returns the usage notice to show, if any.
///
/// Expiry takes precedence over seat warnings.
#[must_use]
pub fn usage_notice(
    subscription: &Subscription,
    active_users: usize,
    now: DateTime<Utc>,
) -> Option<UsageNotice> {
    if subscription.is_expired(now) {
        return Some(UsageNotice::Expired {
            plan: subscription.plan,
        });
    }

    if subscription.has_unlimited_seats() {
        return None;
    }

    // A zero-seat plan is over its limit as soon as anyone is active.
    let near_limit = if subscription.max_users == 0 {
        active_users > 0
    } else {
        active_users as f64 / f64::from(subscription.max_users) >= SEAT_WARNING_RATIO
    };
    near_limit.then(|| UsageNotice::NearSeatLimit {
        plan: subscription.plan,
        used: active_users,
        max_users: subscription.max_users,
        limit_reached: is_seat_limit_reached(active_users, subscription),
    })
}
