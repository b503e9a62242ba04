use chrono::{DateTime, Utc};
use orbit_core::{AppError, AppResult, UserId};
use orbit_domain::{
    Actor, AuditAction, DashboardSummary, Module, NavigationEntry, PermissionAction, UsageNotice,
    is_module_enabled, own_permission_key, permission_key, usage_notice, visible_navigation,
};
use serde_json::json;
use tracing::warn;

use crate::selectors::select_dashboard;
use crate::store::{AuditEvent, CrmState, Store};

#[cfg(test)]
mod tests;

/// Returns the signed-in actor or `Unauthorized`.
pub(crate) fn require_actor(state: &CrmState) -> AppResult<Actor> {
    state
        .actor()
        .ok_or_else(|| AppError::Unauthorized("no active session".to_owned()))
}

/// Reasons a module can be unreachable for an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ModuleDenial {
    Plan,
    Role,
}

fn module_denial(state: &CrmState, actor: &Actor, module: Module) -> Option<ModuleDenial> {
    let enabled = state
        .tenant()
        .subscription()
        .is_some_and(|subscription| is_module_enabled(subscription, module.as_str()));
    if !enabled {
        return Some(ModuleDenial::Plan);
    }

    let role_allowed = NavigationEntry::for_module(module)
        .is_some_and(|entry| entry.allows_role(actor.role()));
    if !role_allowed {
        return Some(ModuleDenial::Role);
    }

    None
}

/// Ensures the module is enabled by the subscription and open to the role.
///
/// A plan denial is recorded as `PLAN_ACCESS_ATTEMPT`.
pub(crate) async fn ensure_module_access(store: &Store, module: Module) -> AppResult<Actor> {
    let (actor, denial, plan) = store
        .read(|state| {
            let actor = require_actor(state)?;
            let denial = module_denial(state, &actor, module);
            let plan = state
                .tenant()
                .subscription()
                .map(|subscription| subscription.plan.as_str());
            Ok::<_, AppError>((actor, denial, plan))
        })
        .await?;

    match denial {
        None => Ok(actor),
        Some(ModuleDenial::Plan) => {
            warn!(
                tenant_id = %actor.tenant_id(),
                module = %module,
                plan = plan.unwrap_or("none"),
                "module not included in subscription"
            );
            store
                .record_audit(
                    AuditEvent::new(
                        actor.tenant_id().clone(),
                        actor.user_id().clone(),
                        AuditAction::PlanAccessAttempt,
                        module.as_str(),
                    )
                    .with_meta(json!({ "plan": plan, "requiredModule": module.as_str() })),
                )
                .await;
            Err(AppError::Forbidden(format!(
                "module '{module}' is not included in the current plan"
            )))
        }
        Some(ModuleDenial::Role) => Err(AppError::Forbidden(format!(
            "role '{}' cannot open module '{module}'",
            actor.role().as_str()
        ))),
    }
}

/// Ensures the actor holds an exact permission string.
pub(crate) fn require_permission(actor: &Actor, permission: &str) -> AppResult<()> {
    if actor.has_permission(permission) {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "role '{}' is missing permission '{permission}'",
        actor.role().as_str()
    )))
}

/// Ensures the actor may write a record of `module` owned by `owner`.
///
/// Unscoped `<module>:write` allows any record; `<module>:write:own` only
/// allows records the actor created. Pass `None` for a record being created.
pub(crate) fn ensure_can_write(
    actor: &Actor,
    module: Module,
    owner: Option<&UserId>,
) -> AppResult<()> {
    let module_name = module.as_str();
    if actor.has_permission(&permission_key(module_name, PermissionAction::Write)) {
        return Ok(());
    }

    let owns_record = owner.is_none_or(|owner| owner == actor.user_id());
    if owns_record && actor.has_permission(&own_permission_key(module_name, PermissionAction::Write))
    {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "role '{}' cannot write this '{module_name}' record",
        actor.role().as_str()
    )))
}

/// Read-side access checks for the signed-in actor.
#[derive(Clone)]
pub struct AccessService {
    store: Store,
}

impl AccessService {
    /// Creates an access service over the shared store.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Returns the navigation entries the actor can open.
    pub async fn navigation(&self) -> AppResult<Vec<&'static NavigationEntry>> {
        self.store
            .read(|state| {
                let actor = require_actor(state)?;
                Ok(visible_navigation(state.tenant().subscription(), actor.role()))
            })
            .await
    }

    /// Ensures a module can be opened, recording plan denials.
    pub async fn require_module(&self, module: Module) -> AppResult<Actor> {
        ensure_module_access(&self.store, module).await
    }

    /// Returns whether the actor holds a permission string.
    pub async fn has_permission(&self, permission: &str) -> AppResult<bool> {
        self.store
            .read(|state| Ok(require_actor(state)?.has_permission(permission)))
            .await
    }

    /// Keeps the fields of a module the actor may see, in input order.
    pub async fn visible_fields<'a>(
        &self,
        module: Module,
        fields: &[&'a str],
    ) -> AppResult<Vec<&'a str>> {
        let actor = self.store.read(require_actor).await?;
        Ok(fields
            .iter()
            .copied()
            .filter(|field| actor.can_see_field(module.as_str(), field))
            .collect())
    }

    /// Returns the subscription usage warning for the active tenant.
    pub async fn usage_notice(&self, now: DateTime<Utc>) -> AppResult<Option<UsageNotice>> {
        self.store
            .read(|state| {
                let actor = require_actor(state)?;
                let Some(subscription) = state.tenant().subscription() else {
                    return Ok(None);
                };
                let active_users = state.users().active_count(actor.tenant_id());
                Ok(usage_notice(subscription, active_users, now))
            })
            .await
    }

    /// Computes dashboard figures from the actor's scoped records.
    pub async fn dashboard(&self, now: DateTime<Utc>) -> AppResult<DashboardSummary> {
        let actor = ensure_module_access(&self.store, Module::Dashboard).await?;
        Ok(self
            .store
            .read(|state| select_dashboard(state, &actor, now))
            .await)
    }
}
