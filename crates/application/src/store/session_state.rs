use chrono::{DateTime, Utc};
use orbit_domain::{Subscription, Tenant, User};

/// Authentication status of the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    current_user: Option<User>,
    is_authenticated: bool,
    loading: bool,
    error: Option<String>,
}

impl AuthState {
    /// Returns the signed-in user.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// Returns whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Returns whether a login request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns the last login failure message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(super) fn start_login(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub(super) fn succeed(&mut self, user: User) {
        self.current_user = Some(user);
        self.is_authenticated = true;
        self.loading = false;
        self.error = None;
    }

    pub(super) fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    pub(super) fn sign_out(&mut self) {
        *self = Self::default();
    }
}

/// Active organization and its subscription.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantState {
    current_tenant: Option<Tenant>,
    subscription: Option<Subscription>,
    dark_mode: bool,
}

impl TenantState {
    /// Returns the active tenant.
    #[must_use]
    pub fn current_tenant(&self) -> Option<&Tenant> {
        self.current_tenant.as_ref()
    }

    /// Returns the subscription of the active tenant.
    #[must_use]
    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    /// Returns whether dark mode is on.
    #[must_use]
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// Activates a tenant.
    ///
    /// The supplied subscription wins; otherwise the held one is kept when it
    /// belongs to the same tenant. Anything else is replaced by a subscription
    /// synthesized from the tenant plan.
    pub(super) fn set_tenant(
        &mut self,
        tenant: Tenant,
        subscription: Option<Subscription>,
        now: DateTime<Utc>,
    ) {
        let subscription = subscription
            .or_else(|| self.subscription.take())
            .filter(|subscription| subscription.tenant_id == tenant.id)
            .unwrap_or_else(|| Subscription::synthesize(tenant.id.clone(), tenant.plan, now));

        self.dark_mode = tenant.dark_mode;
        self.subscription = Some(subscription);
        self.current_tenant = Some(tenant);
    }

    pub(super) fn set_subscription(&mut self, subscription: Subscription) {
        self.subscription = Some(subscription);
    }

    pub(super) fn replace_tenant_details(&mut self, tenant: Tenant) {
        if self
            .current_tenant
            .as_ref()
            .is_some_and(|current| current.id == tenant.id)
        {
            self.dark_mode = tenant.dark_mode;
            self.current_tenant = Some(tenant);
        }
    }

    pub(super) fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
        if let Some(tenant) = self.current_tenant.as_mut() {
            tenant.dark_mode = self.dark_mode;
        }
    }

    pub(super) fn clear(&mut self) {
        *self = Self::default();
    }
}
