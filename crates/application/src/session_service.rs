use std::sync::Arc;

use chrono::Utc;
use orbit_core::{AppError, AppResult, TenantId};
use orbit_domain::{
    Actor, AuditAction, Module, PermissionAction, Plan, Subscription, Tenant, permission_key,
};
use serde_json::json;
use tracing::{info, warn};

use crate::access_service::{require_actor, require_permission};
use crate::ports::{AuthGateway, TenantGateway, TenantUpdate, TokenStore};
use crate::store::{Action, AuditEvent, Store};


/// Signs the actor out locally when a backend call came back unauthorized.
///
/// The result is passed through unchanged.
pub(crate) async fn settle_session<T>(store: &Store, result: AppResult<T>) -> AppResult<T> {
    if let Err(AppError::Unauthorized(message)) = &result {
        warn!(reason = %message, "session rejected by backend, signing out");
        store.dispatch(Action::Logout).await;
    }

    result
}

/// Login, logout and tenant lifecycle.
#[derive(Clone)]
pub struct SessionService {
    auth: Arc<dyn AuthGateway>,
    tenants: Arc<dyn TenantGateway>,
    tokens: Arc<dyn TokenStore>,
    store: Store,
}

impl SessionService {
    /// Creates a session service.
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthGateway>,
        tenants: Arc<dyn TenantGateway>,
        tokens: Arc<dyn TokenStore>,
        store: Store,
    ) -> Self {
        Self {
            auth,
            tenants,
            tokens,
            store,
        }
    }

    /// Signs in and activates the user's home tenant.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Actor> {
        self.store.dispatch(Action::LoginStarted).await;

        let response = match self.auth.login(email.trim(), password).await {
            Ok(response) => response,
            Err(error) => {
                self.store
                    .dispatch(Action::LoginFailed(login_failure_message(&error)))
                    .await;
                return Err(error);
            }
        };

        self.tokens.store(response.access_token).await;
        let subscription = self.fetch_subscription(&response.tenant.id).await;
        let actor = Actor::new(
            response.user.id.clone(),
            response.tenant.id.clone(),
            response.user.role,
        );

        self.store
            .dispatch(Action::LoginSucceeded {
                user: response.user,
                tenant: response.tenant,
                subscription,
                at: Utc::now(),
            })
            .await;
        self.store
            .record_audit(AuditEvent::new(
                actor.tenant_id().clone(),
                actor.user_id().clone(),
                AuditAction::Login,
                "auth",
            ))
            .await;

        info!(
            tenant_id = %actor.tenant_id(),
            user_id = %actor.user_id(),
            role = actor.role().as_str(),
            "signed in"
        );
        Ok(actor)
    }

    /// Signs out locally; a failing backend logout is logged and ignored.
    pub async fn logout(&self) -> AppResult<()> {
        let actor = self.store.read(|state| state.actor()).await;

        if let Err(error) = self.auth.logout().await {
            warn!(error = %error, "backend logout failed");
        }
        self.tokens.clear().await;

        if let Some(actor) = &actor {
            self.store
                .record_audit(AuditEvent::new(
                    actor.tenant_id().clone(),
                    actor.user_id().clone(),
                    AuditAction::Logout,
                    "auth",
                ))
                .await;
        }
        self.store.dispatch(Action::Logout).await;

        info!("signed out");
        Ok(())
    }

    /// Drops the local session after the backend rejected the token.
    pub async fn expire(&self) {
        self.tokens.clear().await;
        self.store.dispatch(Action::Logout).await;
    }

    /// Activates another tenant, resetting list filters.
    pub async fn switch_tenant(&self, tenant_id: &TenantId) -> AppResult<Tenant> {
        let actor = self.store.read(require_actor).await?;
        if tenant_id.is_blank() {
            return Err(AppError::Validation("tenant id is required".to_owned()));
        }

        let tenant = settle_session(&self.store, self.tenants.get_tenant(tenant_id).await).await?;
        let subscription = self.fetch_subscription(&tenant.id).await;

        self.store
            .dispatch(Action::SetTenant {
                tenant: tenant.clone(),
                subscription,
                at: Utc::now(),
            })
            .await;
        self.store
            .record_audit(
                AuditEvent::new(
                    tenant.id.clone(),
                    actor.user_id().clone(),
                    AuditAction::TenantSwitch,
                    "tenant",
                )
                .with_meta(json!({
                    "from": actor.tenant_id().as_str(),
                    "to": tenant.id.as_str(),
                })),
            )
            .await;

        info!(from = %actor.tenant_id(), to = %tenant.id, "tenant switched");
        Ok(tenant)
    }

    /// Re-reads the active tenant's subscription from the backend.
    pub async fn refresh_subscription(&self) -> AppResult<Subscription> {
        let actor = self.store.read(require_actor).await?;
        let subscription = settle_session(
            &self.store,
            self.tenants.get_subscription(actor.tenant_id()).await,
        )
        .await?;

        self.store
            .dispatch(Action::SetSubscription(subscription.clone()))
            .await;
        Ok(subscription)
    }

    /// Moves the active tenant to another plan.
    pub async fn change_plan(&self, plan: Plan) -> AppResult<Subscription> {
        let actor = self.store.read(require_actor).await?;
        require_permission(&actor, &settings_write())?;

        let subscription = settle_session(
            &self.store,
            self.tenants.change_plan(actor.tenant_id(), plan).await,
        )
        .await?;

        self.store
            .dispatch(Action::SetSubscription(subscription.clone()))
            .await;
        info!(tenant_id = %actor.tenant_id(), plan = plan.as_str(), "plan changed");
        Ok(subscription)
    }

    /// Updates branding of the active tenant.
    pub async fn update_tenant(&self, update: TenantUpdate) -> AppResult<Tenant> {
        let actor = self.store.read(require_actor).await?;
        require_permission(&actor, &settings_write())?;

        let tenant = settle_session(
            &self.store,
            self.tenants.update_tenant(actor.tenant_id(), update).await,
        )
        .await?;

        self.store.dispatch(Action::UpdateTenant(tenant.clone())).await;
        Ok(tenant)
    }

    /// Flips dark mode for the active tenant and returns the new value.
    pub async fn toggle_dark_mode(&self) -> AppResult<bool> {
        self.store.read(require_actor).await?;
        self.store.dispatch(Action::ToggleDarkMode).await;
        Ok(self.store.read(|state| state.tenant().dark_mode()).await)
    }

    async fn fetch_subscription(&self, tenant_id: &TenantId) -> Option<Subscription> {
        match self.tenants.get_subscription(tenant_id).await {
            Ok(subscription) => Some(subscription),
            Err(error) => {
                warn!(
                    tenant_id = %tenant_id,
                    error = %error,
                    "subscription unavailable, deriving from plan"
                );
                None
            }
        }
    }
}

fn settings_write() -> String {
    permission_key(Module::Settings.as_str(), PermissionAction::Write)
}

fn login_failure_message(error: &AppError) -> String {
    match error {
        AppError::Unauthorized(_) => "Invalid email or password.".to_owned(),
        AppError::Upstream { message, .. } if !message.trim().is_empty() => message.clone(),
        _ => "Login failed. Please try again.".to_owned(),
    }
}
