use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use orbit_core::{AppError, AppResult, TenantId};
use orbit_domain::{DomainRecord, Lead, Plan, Role};
use serde_json::{Map, Value};

use super::{WorkspaceGateways, WorkspaceLoader};
use crate::ports::{ResourceGateway, UserGateway};
use crate::store::{Action, Store};
use crate::test_support::{
    FakeResourceGateway, FakeTokenStore, FakeUserGateway, lead, signed_in_store, tenant, user,
};

fn empty<R: DomainRecord>() -> Arc<dyn ResourceGateway<R>> {
    FakeResourceGateway::<R>::with_records(Vec::new())
}

fn gateways(
    leads: Arc<dyn ResourceGateway<Lead>>,
    users: Arc<dyn UserGateway>,
) -> WorkspaceGateways {
    WorkspaceGateways {
        leads,
        contacts: empty(),
        accounts: empty(),
        deals: empty(),
        campaigns: empty(),
        invoices: empty(),
        orders: empty(),
        products: empty(),
        quotes: empty(),
        tasks: empty(),
        users,
    }
}

#[tokio::test]
async fn load_fills_every_collection_of_the_tenant() {
    let store = signed_in_store("u1", "t1", Role::Admin, Plan::Pro).await;
    let leads = FakeResourceGateway::with_records(vec![
        lead("l1", "t1", "u1", "Ada"),
        lead("l2", "t2", "u9", "Elsewhere"),
    ]);
    let users = FakeUserGateway::with_users(vec![
        user("u1", "t1", Role::Admin),
        user("u2", "t1", Role::Sales),
    ]);
    let loader = WorkspaceLoader::new(
        gateways(leads, users),
        FakeTokenStore::holding("token-1"),
        store.clone(),
    );

    let report = loader.load().await;
    assert!(report.is_ok());
    let report = report.unwrap_or_else(|_| unreachable!());
    assert!(report.is_complete());
    assert_eq!(report.loaded.len(), 11);

    let (lead_ids, user_count) = store
        .read(|state| {
            (
                state
                    .resource::<Lead>()
                    .items()
                    .iter()
                    .map(|lead| lead.id.clone())
                    .collect::<Vec<_>>(),
                state.users().items().len(),
            )
        })
        .await;
    assert_eq!(lead_ids, vec!["l1".to_owned()]);
    assert_eq!(user_count, 2);
}

#[tokio::test]
async fn one_failing_collection_does_not_block_the_rest() {
    let store = signed_in_store("u1", "t1", Role::Admin, Plan::Pro).await;
    let leads = FakeResourceGateway::with_records(vec![lead("l1", "t1", "u1", "Ada")]);
    let users = FakeUserGateway::with_users(vec![user("u1", "t1", Role::Admin)]);
    *users.failure.lock().await = Some(AppError::Upstream {
        status: 500,
        message: "boom".to_owned(),
    });
    let loader = WorkspaceLoader::new(
        gateways(leads, users),
        FakeTokenStore::holding("token-1"),
        store.clone(),
    );

    let report = loader.load().await.unwrap_or_default();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].collection, "users");
    assert_eq!(report.loaded.len(), 10);
    assert_eq!(
        store.read(|state| state.resource::<Lead>().items().len()).await,
        1
    );
    assert!(store.read(|state| state.actor().is_some()).await);
}

#[tokio::test]
async fn missing_token_signs_out() {
    let store = signed_in_store("u1", "t1", Role::Admin, Plan::Pro).await;
    let loader = WorkspaceLoader::new(
        gateways(empty(), FakeUserGateway::with_users(Vec::new())),
        Arc::new(FakeTokenStore::default()),
        store.clone(),
    );

    let result = loader.load().await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    assert!(store.read(|state| state.actor().is_none()).await);
}

#[tokio::test]
async fn rejected_collection_signs_out() {
    let store = signed_in_store("u1", "t1", Role::Admin, Plan::Pro).await;
    let leads = FakeResourceGateway::<Lead>::with_records(Vec::new());
    leads
        .fail_with(AppError::Unauthorized("token expired".to_owned()))
        .await;
    let loader = WorkspaceLoader::new(
        gateways(leads, FakeUserGateway::with_users(Vec::new())),
        FakeTokenStore::holding("token-1"),
        store.clone(),
    );

    let report = loader.load().await.unwrap_or_default();
    assert_eq!(report.failed.len(), 1);
    assert!(store.read(|state| state.actor().is_none()).await);
}

/// Switches the tenant while its list request is in flight.
struct SwitchingGateway {
    store: Store,
}

#[async_trait]
impl ResourceGateway<Lead> for SwitchingGateway {
    async fn list(&self, _tenant_id: &TenantId) -> AppResult<Vec<Lead>> {
        self.store
            .dispatch(Action::SetTenant {
                tenant: tenant("t2", Plan::Basic),
                subscription: None,
                at: Utc::now(),
            })
            .await;
        Ok(vec![lead("l1", "t1", "u1", "Stale")])
    }

    async fn get(&self, id: &str) -> AppResult<Lead> {
        Err(AppError::NotFound(id.to_owned()))
    }

    async fn create(&self, _payload: Map<String, Value>) -> AppResult<Lead> {
        Err(AppError::Internal("unused".to_owned()))
    }

    async fn update(&self, id: &str, _record: &Lead) -> AppResult<Lead> {
        Err(AppError::NotFound(id.to_owned()))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        Err(AppError::NotFound(id.to_owned()))
    }
}

#[tokio::test]
async fn results_for_a_replaced_session_are_discarded() {
    let store = signed_in_store("u1", "t1", Role::Admin, Plan::Pro).await;
    let switching = Arc::new(SwitchingGateway {
        store: store.clone(),
    });
    let loader = WorkspaceLoader::new(
        gateways(switching, FakeUserGateway::with_users(Vec::new())),
        FakeTokenStore::holding("token-1"),
        store.clone(),
    );

    let report = loader.load().await.unwrap_or_default();
    assert!(report.discarded);
    assert!(!report.is_complete());
    assert!(report.loaded.is_empty());
    assert!(
        store
            .read(|state| state.resource::<Lead>().items().is_empty())
            .await
    );
}
