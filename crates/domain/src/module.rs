use std::str::FromStr;

use orbit_core::AppError;
use serde::{Deserialize, Serialize};

use crate::plan::{Plan, Subscription, is_module_enabled};
use crate::security::Role;

/// Navigable CRM module; the string form doubles as the subscription feature id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    /// Aggregated KPIs.
    Dashboard,
    /// Prospective customers.
    Leads,
    /// People at customer organizations.
    Contacts,
    /// Customer organizations.
    Accounts,
    /// Sales opportunities.
    Deals,
    /// Tasks and follow-ups.
    Activities,
    /// Marketing campaigns.
    Campaigns,
    /// Product catalog.
    Products,
    /// Sales quotes.
    Quotes,
    /// Billing invoices.
    Invoices,
    /// Customer orders.
    Orders,
    /// Pipeline forecasting.
    Forecasting,
    /// Reporting views.
    Reports,
    /// Organization settings and user management.
    Settings,
}

impl Module {
    /// Returns the stable feature identifier for this module.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Leads => "leads",
            Self::Contacts => "contacts",
            Self::Accounts => "accounts",
            Self::Deals => "deals",
            Self::Activities => "activities",
            Self::Campaigns => "campaigns",
            Self::Products => "products",
            Self::Quotes => "quotes",
            Self::Invoices => "invoices",
            Self::Orders => "orders",
            Self::Forecasting => "forecasting",
            Self::Reports => "reports",
            Self::Settings => "settings",
        }
    }

    /// Returns all modules in navigation order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Module] = &[
            Module::Dashboard,
            Module::Leads,
            Module::Contacts,
            Module::Accounts,
            Module::Deals,
            Module::Activities,
            Module::Campaigns,
            Module::Products,
            Module::Quotes,
            Module::Invoices,
            Module::Orders,
            Module::Forecasting,
            Module::Reports,
            Module::Settings,
        ];

        ALL
    }
}

impl FromStr for Module {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Module::all()
            .iter()
            .copied()
            .find(|module| module.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown module value '{value}'")))
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Sidebar entry for one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationEntry {
    /// Module the entry opens.
    pub module: Module,
    /// Route path relative to the application root.
    pub path: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Plans that advertise the module.
    pub required_plans: &'static [Plan],
    /// Roles allowed to open the module.
    pub required_roles: &'static [Role],
}

const ALL_PLANS: &[Plan] = &[Plan::Basic, Plan::Pro, Plan::Enterprise];
const PAID_PLANS: &[Plan] = &[Plan::Pro, Plan::Enterprise];
const ENTERPRISE_ONLY: &[Plan] = &[Plan::Enterprise];
const EVERY_ROLE: &[Role] = &[Role::Admin, Role::Manager, Role::Sales];
const ELEVATED_ROLES: &[Role] = &[Role::Admin, Role::Manager];

const NAVIGATION: &[NavigationEntry] = &[
    entry(Module::Dashboard, "/dashboard", "Dashboard", ALL_PLANS, EVERY_ROLE),
    entry(Module::Leads, "/leads", "Leads", ALL_PLANS, EVERY_ROLE),
    entry(Module::Contacts, "/contacts", "Contacts", ALL_PLANS, EVERY_ROLE),
    entry(Module::Accounts, "/accounts", "Accounts", PAID_PLANS, EVERY_ROLE),
    entry(Module::Deals, "/deals", "Deals", ALL_PLANS, EVERY_ROLE),
    entry(Module::Activities, "/activities", "Activities", PAID_PLANS, EVERY_ROLE),
    entry(Module::Campaigns, "/campaigns", "Campaigns", PAID_PLANS, ELEVATED_ROLES),
    entry(Module::Products, "/products", "Products", PAID_PLANS, ELEVATED_ROLES),
    entry(Module::Quotes, "/quotes", "Quotes", PAID_PLANS, ELEVATED_ROLES),
    entry(Module::Invoices, "/invoices", "Invoices", ENTERPRISE_ONLY, ELEVATED_ROLES),
    entry(Module::Orders, "/orders", "Orders", ENTERPRISE_ONLY, ELEVATED_ROLES),
    entry(Module::Forecasting, "/forecasting", "Forecasting", ENTERPRISE_ONLY, ELEVATED_ROLES),
    entry(Module::Reports, "/reports", "Reports", PAID_PLANS, ELEVATED_ROLES),
    entry(Module::Settings, "/settings", "Settings", ALL_PLANS, ELEVATED_ROLES),
];

const fn entry(
    module: Module,
    path: &'static str,
    label: &'static str,
    required_plans: &'static [Plan],
    required_roles: &'static [Role],
) -> NavigationEntry {
    NavigationEntry {
        module,
        path,
        label,
        required_plans,
        required_roles,
    }
}

impl NavigationEntry {
    /// Returns the full navigation table in sidebar order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        NAVIGATION
    }

    /// Returns the entry for a module.
    #[must_use]
    pub fn for_module(module: Module) -> Option<&'static Self> {
        NAVIGATION.iter().find(|entry| entry.module == module)
    }

    /// Returns whether the role may open this entry.
    #[must_use]
    pub fn allows_role(&self, role: Role) -> bool {
        self.required_roles.contains(&role)
    }
}

/// Returns the sidebar entries to render for a role under a subscription.
///
/// An entry is shown only when the subscription enables its module and the
/// role is listed. Without a subscription nothing is reachable.
#[must_use]
pub fn visible_navigation(
    subscription: Option<&Subscription>,
    role: Role,
) -> Vec<&'static NavigationEntry> {
    let Some(subscription) = subscription else {
        return Vec::new();
    };

    NAVIGATION
        .iter()
        .filter(|entry| is_module_enabled(subscription, entry.module.as_str()))
        .filter(|entry| entry.allows_role(role))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{TimeZone, Utc};

    use super::{Module, NavigationEntry, visible_navigation};
    use crate::plan::{Plan, Subscription};
    use crate::security::Role;

    fn subscription_with(features: &[&str]) -> Subscription {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single();
        let mut subscription =
            Subscription::synthesize("tenant-1".into(), Plan::Basic, now.unwrap_or_default());
        subscription.features = features.iter().map(|value| (*value).to_owned()).collect();
        subscription
    }

    #[test]
    fn module_roundtrip_storage_value() {
        for module in Module::all() {
            assert_eq!(Module::from_str(module.as_str()).ok(), Some(*module));
        }
        assert!(Module::from_str("billing").is_err());
    }

    #[test]
    fn every_module_has_one_navigation_entry() {
        assert_eq!(NavigationEntry::all().len(), Module::all().len());
        for module in Module::all() {
            assert!(NavigationEntry::for_module(*module).is_some());
        }
    }

    #[test]
    fn deals_entry_hidden_when_subscription_lacks_feature() {
        let subscription = subscription_with(&["dashboard", "leads"]);

        for role in Role::all() {
            let entries = visible_navigation(Some(&subscription), *role);
            assert!(entries.iter().all(|entry| entry.module != Module::Deals));
        }

        let sales_entries = visible_navigation(Some(&subscription), Role::Sales);
        let modules: Vec<Module> = sales_entries.iter().map(|entry| entry.module).collect();
        assert_eq!(modules, vec![Module::Dashboard, Module::Leads]);
    }

    #[test]
    fn role_restrictions_apply_on_top_of_features() {
        let subscription = subscription_with(&["settings", "campaigns", "leads"]);

        let sales: Vec<Module> = visible_navigation(Some(&subscription), Role::Sales)
            .iter()
            .map(|entry| entry.module)
            .collect();
        assert_eq!(sales, vec![Module::Leads]);

        let manager = visible_navigation(Some(&subscription), Role::Manager);
        assert_eq!(manager.len(), 3);
    }

    #[test]
    fn missing_subscription_hides_everything() {
        assert!(visible_navigation(None, Role::Admin).is_empty());
    }
}
