//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod dashboard;
mod module;
mod plan;
mod records;
mod security;
mod tenant;
mod user;

pub use dashboard::{
    ActivityItem, ActivityKind, CategoryCount, DashboardSummary, KpiTrends,
    RECENT_ACTIVITY_LIMIT, average_deal_size, conversion_rate, deals_by_stage, kpi_trends,
    leads_by_status, percent_change, pipeline_value, recent_activity, total_revenue, win_rate,
};
pub use module::{Module, NavigationEntry, visible_navigation};
pub use plan::{
    Plan, SEAT_WARNING_RATIO, SYNTHESIZED_SUBSCRIPTION_DAYS, Subscription, UNLIMITED_SEATS,
    UsageNotice, is_module_enabled, is_seat_limit_reached, usage_notice,
};
pub use records::{
    Account, Campaign, CampaignStatus, CampaignType, Contact, Deal, DealStage, DealStatus,
    DomainRecord, Invoice, InvoiceStatus, Lead, LeadSource, LeadStatus, Order, OrderStatus, Owned,
    Product, Quote, QuoteItem, QuoteStatus, Task, TaskPriority, TaskStatus, TenantScoped,
};
pub use security::{
    Actor, AuditAction, PermissionAction, Role, WILDCARD_PERMISSION, can_see_field,
    has_permission, own_permission_key, permission_key,
};
pub use tenant::{DEFAULT_PRIMARY_COLOR, Tenant, TenantStatus};
pub use user::{EmailAddress, ManagedUser, User, UserStatus};
