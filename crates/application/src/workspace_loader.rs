use std::sync::Arc;

use orbit_core::{AppError, AppResult};
use orbit_domain::{
    Account, Campaign, Contact, Deal, Invoice, Lead, Order, Product, Quote, Task, User,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::access_service::require_actor;
use crate::ports::{CrmGateway, ResourceGateway, TokenStore, UserGateway};
use crate::store::{Action, ResourceAction, Store, StoredRecord};

#[cfg(test)]
mod tests;

/// Gateways for every collection fetched by the initial load.
#[derive(Clone)]
pub struct WorkspaceGateways {
    /// Leads collection.
    pub leads: Arc<dyn ResourceGateway<Lead>>,
    /// Contacts collection.
    pub contacts: Arc<dyn ResourceGateway<Contact>>,
    /// Accounts collection.
    pub accounts: Arc<dyn ResourceGateway<Account>>,
    /// Deals collection.
    pub deals: Arc<dyn ResourceGateway<Deal>>,
    /// Campaigns collection.
    pub campaigns: Arc<dyn ResourceGateway<Campaign>>,
    /// Invoices collection.
    pub invoices: Arc<dyn ResourceGateway<Invoice>>,
    /// Orders collection.
    pub orders: Arc<dyn ResourceGateway<Order>>,
    /// Products collection.
    pub products: Arc<dyn ResourceGateway<Product>>,
    /// Quotes collection.
    pub quotes: Arc<dyn ResourceGateway<Quote>>,
    /// Tasks collection.
    pub tasks: Arc<dyn ResourceGateway<Task>>,
    /// Tenant users.
    pub users: Arc<dyn UserGateway>,
}

impl WorkspaceGateways {
    /// Uses one adapter for every collection.
    #[must_use]
    pub fn from_gateway<G: CrmGateway + 'static>(gateway: Arc<G>) -> Self {
        Self {
            leads: gateway.clone(),
            contacts: gateway.clone(),
            accounts: gateway.clone(),
            deals: gateway.clone(),
            campaigns: gateway.clone(),
            invoices: gateway.clone(),
            orders: gateway.clone(),
            products: gateway.clone(),
            quotes: gateway.clone(),
            tasks: gateway.clone(),
            users: gateway,
        }
    }
}

/// Outcome of one collection fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionFailure {
    /// Collection name.
    pub collection: &'static str,
    /// Error message.
    pub message: String,
}

/// Summary of an initial workspace load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Collections applied to the store.
    pub loaded: Vec<&'static str>,
    /// Collections whose fetch failed.
    pub failed: Vec<CollectionFailure>,
    /// Whether results were dropped because the session changed meanwhile.
    pub discarded: bool,
}

impl LoadReport {
    /// Returns whether every collection loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.discarded
    }
}

/// Fetches every collection of the active tenant concurrently.
#[derive(Clone)]
pub struct WorkspaceLoader {
    gateways: WorkspaceGateways,
    tokens: Arc<dyn TokenStore>,
    store: Store,
}

impl WorkspaceLoader {
    /// Creates a loader.
    #[must_use]
    pub fn new(gateways: WorkspaceGateways, tokens: Arc<dyn TokenStore>, store: Store) -> Self {
        Self {
            gateways,
            tokens,
            store,
        }
    }

    /// Loads all collections; one failing collection never blocks the others.
    ///
    /// Results are dropped when the session epoch changes while the fetches
    /// are in flight. A session without a token is signed out.
    pub async fn load(&self) -> AppResult<LoadReport> {
        let (actor, epoch) = self
            .store
            .read(|state| Ok::<_, AppError>((require_actor(state)?, state.session_epoch())))
            .await?;

        if self.tokens.token().await.is_none() {
            warn!("authenticated session has no access token, signing out");
            self.store.dispatch(Action::Logout).await;
            return Err(AppError::Unauthorized("access token missing".to_owned()));
        }

        let tenant_id = actor.tenant_id();
        let gateways = &self.gateways;
        let (
            leads,
            contacts,
            accounts,
            deals,
            campaigns,
            invoices,
            orders,
            products,
            quotes,
            tasks,
            users,
        ) = tokio::join!(
            gateways.leads.list(tenant_id),
            gateways.contacts.list(tenant_id),
            gateways.accounts.list(tenant_id),
            gateways.deals.list(tenant_id),
            gateways.campaigns.list(tenant_id),
            gateways.invoices.list(tenant_id),
            gateways.orders.list(tenant_id),
            gateways.products.list(tenant_id),
            gateways.quotes.list(tenant_id),
            gateways.tasks.list(tenant_id),
            gateways.users.list_users(tenant_id),
        );

        let mut report = LoadReport::default();
        let mut unauthorized = false;
        self.apply(epoch, leads, &mut report, &mut unauthorized).await;
        self.apply(epoch, contacts, &mut report, &mut unauthorized).await;
        self.apply(epoch, accounts, &mut report, &mut unauthorized).await;
        self.apply(epoch, deals, &mut report, &mut unauthorized).await;
        self.apply(epoch, campaigns, &mut report, &mut unauthorized).await;
        self.apply(epoch, invoices, &mut report, &mut unauthorized).await;
        self.apply(epoch, orders, &mut report, &mut unauthorized).await;
        self.apply(epoch, products, &mut report, &mut unauthorized).await;
        self.apply(epoch, quotes, &mut report, &mut unauthorized).await;
        self.apply(epoch, tasks, &mut report, &mut unauthorized).await;
        self.apply_users(epoch, users, &mut report, &mut unauthorized)
            .await;

        if unauthorized {
            warn!(tenant_id = %tenant_id, "session rejected during load, signing out");
            self.store.dispatch(Action::Logout).await;
        }

        info!(
            tenant_id = %tenant_id,
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            discarded = report.discarded,
            "workspace loaded"
        );
        Ok(report)
    }

    async fn apply<R: StoredRecord>(
        &self,
        epoch: u64,
        result: AppResult<Vec<R>>,
        report: &mut LoadReport,
        unauthorized: &mut bool,
    ) {
        let collection = R::COLLECTION;
        match result {
            Ok(records) => {
                let applied = self
                    .store
                    .dispatch_resource_in_epoch(epoch, ResourceAction::Set(records))
                    .await;
                report.record_applied(collection, applied);
            }
            Err(error) => report.record_failure(collection, &error, unauthorized),
        }
    }

    async fn apply_users(
        &self,
        epoch: u64,
        result: AppResult<Vec<User>>,
        report: &mut LoadReport,
        unauthorized: &mut bool,
    ) {
        match result {
            Ok(users) => {
                let applied = self
                    .store
                    .dispatch_in_epoch(epoch, Action::SetUsers(users))
                    .await;
                report.record_applied("users", applied);
            }
            Err(error) => report.record_failure("users", &error, unauthorized),
        }
    }
}

impl LoadReport {
    fn record_applied(&mut self, collection: &'static str, applied: bool) {
        if applied {
            self.loaded.push(collection);
        } else {
            self.discarded = true;
        }
    }

    fn record_failure(&mut self, collection: &'static str, error: &AppError, unauthorized: &mut bool) {
        warn!(collection, error = %error, "collection failed to load");
        if matches!(error, AppError::Unauthorized(_)) {
            *unauthorized = true;
        }
        self.failed.push(CollectionFailure {
            collection,
            message: error.to_string(),
        });
    }
}
