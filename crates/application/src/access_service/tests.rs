use chrono::Utc;
use orbit_core::AppError;
use orbit_domain::{
    AuditAction, DealStatus, Module, Plan, Role, UsageNotice, UserStatus,
};

use super::AccessService;
use crate::store::{Action, ResourceAction};
use crate::test_support::{deal, signed_in_store, user};

#[tokio::test]
async fn navigation_hides_modules_outside_plan_and_role() {
    let store = signed_in_store("u1", "t1", Role::Sales, Plan::Basic).await;
    let service = AccessService::new(store);

    let modules: Vec<Module> = service
        .navigation()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|entry| entry.module)
        .collect();

    assert_eq!(
        modules,
        vec![Module::Dashboard, Module::Leads, Module::Contacts, Module::Deals]
    );
}

#[tokio::test]
async fn navigation_requires_a_session() {
    let service = AccessService::new(crate::store::Store::new());
    let result = service.navigation().await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn plan_denial_is_audited() {
    let store = signed_in_store("u1", "t1", Role::Admin, Plan::Basic).await;
    let service = AccessService::new(store.clone());

    let result = service.require_module(Module::Invoices).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let attempts = store
        .read(|state| {
            state
                .audit()
                .with_action(AuditAction::PlanAccessAttempt)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        })
        .await;
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].module, "invoices");
    assert_eq!(
        attempts[0]
            .meta
            .as_ref()
            .and_then(|meta| meta.get("plan"))
            .and_then(|plan| plan.as_str()),
        Some("basic")
    );
}

#[tokio::test]
async fn role_denial_is_not_audited() {
    let store = signed_in_store("u1", "t1", Role::Sales, Plan::Enterprise).await;
    let service = AccessService::new(store.clone());

    let result = service.require_module(Module::Settings).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(store.read(|state| state.audit().entries().is_empty()).await);
}

#[tokio::test]
async fn visible_fields_follow_role_policy() {
    let store = signed_in_store("u1", "t1", Role::Sales, Plan::Pro).await;
    let service = AccessService::new(store);

    let fields = service
        .visible_fields(Module::Deals, &["title", "value", "margin", "cost"])
        .await
        .unwrap_or_default();

    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"value"));
    assert!(!fields.contains(&"margin"));
    assert!(!fields.contains(&"cost"));
}

#[tokio::test]
async fn permission_lookup_uses_exact_strings() {
    let store = signed_in_store("u1", "t1", Role::Sales, Plan::Pro).await;
    let service = AccessService::new(store);

    assert_eq!(service.has_permission("deals:write:own").await, Ok(true));
    assert_eq!(service.has_permission("deals:write").await, Ok(false));
}

#[tokio::test]
async fn usage_notice_counts_active_users() {
    let store = signed_in_store("u1", "t1", Role::Admin, Plan::Basic).await;
    let mut users: Vec<_> = (1..=4)
        .map(|index| user(&format!("u{index}"), "t1", Role::Sales))
        .collect();
    let mut inactive = user("u5", "t1", Role::Sales);
    inactive.status = UserStatus::Inactive;
    users.push(inactive);
    store.dispatch(Action::SetUsers(users)).await;
    let service = AccessService::new(store);

    let notice = service.usage_notice(Utc::now()).await.unwrap_or_default();
    assert_eq!(
        notice,
        Some(UsageNotice::NearSeatLimit {
            plan: Plan::Basic,
            used: 4,
            max_users: 5,
            limit_reached: false,
        })
    );
}

#[tokio::test]
async fn dashboard_is_scoped_to_the_actor() {
    let store = signed_in_store("a", "t1", Role::Sales, Plan::Basic).await;
    store
        .dispatch_resource(ResourceAction::Set(vec![
            deal("d1", "t1", "a", DealStatus::Won, 200.0),
            deal("d2", "t1", "b", DealStatus::Won, 800.0),
            deal("d3", "t1", "a", DealStatus::Active, 50.0),
        ]))
        .await;
    let service = AccessService::new(store);

    let summary = service.dashboard(Utc::now()).await;
    assert!(summary.is_ok());
    let summary = summary.unwrap_or_else(|_| unreachable!());
    assert_eq!(summary.avg_deal_size, 200.0);
    assert_eq!(summary.pipeline_value, 50.0);
}
