use std::sync::Arc;

use orbit_core::{AppError, TenantId};
use orbit_domain::{AuditAction, Lead, Plan, Product, Role};
use serde_json::{Map, Value, json};

use super::ResourceService;
use crate::store::{ResourceAction, Store};
use crate::test_support::{FakeResourceGateway, lead, signed_in_store};

fn lead_payload(name: &str) -> Map<String, Value> {
    match json!({
        "id": "client-chosen",
        "tenantId": "t9",
        "createdBy": "someone-else",
        "name": name,
        "status": "new",
        "source": "web"
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

async fn seeded(
    role: Role,
    plan: Plan,
    leads: Vec<Lead>,
) -> (ResourceService<Lead>, Arc<FakeResourceGateway<Lead>>, Store) {
    let store = signed_in_store("u1", "t1", role, plan).await;
    store
        .dispatch_resource(ResourceAction::Set(leads.clone()))
        .await;
    let gateway = FakeResourceGateway::with_records(leads);
    let service = ResourceService::new(gateway.clone(), store.clone());
    (service, gateway, store)
}

async fn audit_count(store: &Store, action: AuditAction) -> usize {
    store
        .read(|state| state.audit().with_action(action).len())
        .await
}

#[tokio::test]
async fn created_record_is_stamped_with_session_scope() {
    let (service, _gateway, store) = seeded(Role::Sales, Plan::Basic, Vec::new()).await;

    let created = service.create(lead_payload("Ada Lovelace")).await;
    assert!(created.is_ok());
    let created = created.unwrap_or_else(|_| unreachable!());

    assert_eq!(created.id, "leads-1");
    assert_eq!(created.tenant_id.as_str(), "t1");
    assert_eq!(created.created_by.as_str(), "u1");
    assert_eq!(
        store.read(|state| state.resource::<Lead>().items().len()).await,
        1
    );
    assert_eq!(audit_count(&store, AuditAction::Create).await, 1);
}

#[tokio::test]
async fn sales_cannot_touch_records_of_colleagues() {
    let (service, gateway, _store) = seeded(
        Role::Sales,
        Plan::Basic,
        vec![lead("l1", "t1", "u1", "Own"), lead("l2", "t1", "u2", "Colleague")],
    )
    .await;

    let mut renamed = lead("l2", "t1", "u2", "Renamed");
    renamed.company = "Elsewhere".to_owned();
    let result = service.update(renamed).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let deleted = service.delete("l2").await;
    assert!(matches!(deleted, Err(AppError::NotFound(_))));
    assert!(gateway.calls().await.is_empty());
}

#[tokio::test]
async fn sales_updates_own_record() {
    let (service, gateway, store) =
        seeded(Role::Sales, Plan::Basic, vec![lead("l1", "t1", "u1", "Own")]).await;

    let updated = service.update(lead("l1", "t1", "u1", "Own, renamed")).await;
    assert!(updated.is_ok());
    assert_eq!(gateway.calls().await, vec!["update".to_owned()]);
    assert_eq!(
        store
            .read(|state| state.resource::<Lead>().find("l1").map(|lead| lead.name.clone()))
            .await
            .as_deref(),
        Some("Own, renamed")
    );
    assert_eq!(audit_count(&store, AuditAction::Update).await, 1);
}

#[tokio::test]
async fn manager_updates_any_record_of_the_tenant() {
    let (service, _gateway, store) = seeded(
        Role::Manager,
        Plan::Basic,
        vec![lead("l2", "t1", "u2", "Colleague")],
    )
    .await;

    let updated = service.update(lead("l2", "t1", "u2", "Reviewed")).await;
    assert!(updated.is_ok());
    assert_eq!(audit_count(&store, AuditAction::Update).await, 1);
}

#[tokio::test]
async fn record_cannot_move_between_tenants_or_owners() {
    let (service, gateway, _store) =
        seeded(Role::Admin, Plan::Basic, vec![lead("l1", "t1", "u2", "Ada")]).await;

    let mut moved = lead("l1", "t1", "u2", "Ada");
    moved.tenant_id = TenantId::new("t2");
    let result = service.update(moved).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let reassigned = service.update(lead("l1", "t1", "u1", "Ada")).await;
    assert!(matches!(reassigned, Err(AppError::Validation(_))));
    assert!(gateway.calls().await.is_empty());
}

#[tokio::test]
async fn module_outside_plan_is_denied_and_audited() {
    let store = signed_in_store("u1", "t1", Role::Admin, Plan::Basic).await;
    let gateway = FakeResourceGateway::<Product>::with_records(Vec::new());
    let service = ResourceService::new(gateway.clone(), store.clone());

    let result = service.refresh().await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(gateway.calls().await.is_empty());
    assert_eq!(audit_count(&store, AuditAction::PlanAccessAttempt).await, 1);
}

#[tokio::test]
async fn visible_listing_is_memoized_until_data_changes() {
    let (service, _gateway, _store) = seeded(
        Role::Sales,
        Plan::Basic,
        vec![lead("l1", "t1", "u1", "Acme"), lead("l2", "t1", "u2", "Acme East")],
    )
    .await;

    let first = service.visible().await.unwrap_or_default();
    let second = service.visible().await.unwrap_or_default();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), 1);

    let refreshed = service.refresh().await;
    assert_eq!(refreshed, Ok(2));
    let third = service.visible().await.unwrap_or_default();
    assert!(!Arc::ptr_eq(&second, &third));
    assert_eq!(third.len(), 1);
}

#[tokio::test]
async fn search_filters_the_visible_page() {
    let leads = (1..=12)
        .map(|index| lead(&format!("l{index}"), "t1", "u1", &format!("Lead {index}")))
        .collect();
    let (service, _gateway, _store) = seeded(Role::Admin, Plan::Basic, leads).await;

    service.set_page(1).await;
    let page = service.visible_page().await;
    assert!(page.is_ok());
    let page = page.unwrap_or_else(|_| unreachable!());
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 12);

    service.search("lead 1").await;
    let searched = service.visible_page().await.unwrap_or_else(|_| unreachable!());
    assert_eq!(searched.page, 0);
    assert_eq!(searched.total, 4);
}

#[tokio::test]
async fn delete_removes_record_and_audits() {
    let (service, gateway, store) =
        seeded(Role::Sales, Plan::Basic, vec![lead("l1", "t1", "u1", "Own")]).await;

    assert!(service.delete("l1").await.is_ok());
    assert!(gateway.records.lock().await.is_empty());
    assert!(
        store
            .read(|state| state.resource::<Lead>().items().is_empty())
            .await
    );
    assert_eq!(audit_count(&store, AuditAction::Delete).await, 1);
}

#[tokio::test]
async fn rejected_token_signs_the_session_out() {
    let (service, gateway, store) = seeded(Role::Admin, Plan::Basic, Vec::new()).await;
    gateway
        .fail_with(AppError::Unauthorized("token expired".to_owned()))
        .await;

    let result = service.refresh().await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    assert!(store.read(|state| state.actor().is_none()).await);
}

#[tokio::test]
async fn fetched_record_outside_scope_is_hidden() {
    let (service, _gateway, _store) = seeded(
        Role::Sales,
        Plan::Basic,
        vec![lead("l2", "t1", "u2", "Colleague")],
    )
    .await;

    let result = service.get("l2").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
