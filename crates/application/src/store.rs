//! Client-side state container.
//!
//! All mutations go through [`CrmState::apply`] and
//! [`CrmState::apply_resource`], serialized by the [`Store`] write lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use orbit_core::UserId;
use orbit_domain::{
    Account, Actor, Campaign, Contact, Deal, DomainRecord, Invoice, Lead, ManagedUser, Order,
    Product, Quote, Subscription, Task, Tenant, User, UserStatus,
};
use tokio::sync::RwLock;

mod audit_log;
mod resource_state;
mod session_state;
mod users_state;


pub use audit_log::{AuditEntry, AuditEvent, AuditLog};
pub use resource_state::{DEFAULT_ROWS_PER_PAGE, ResourceAction, ResourceState};
pub use session_state::{AuthState, TenantState};
pub use users_state::{UserChanges, UsersState};

/// Mutation of the non-resource parts of the state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A login request started.
    LoginStarted,
    /// Login succeeded; activates the user's tenant.
    LoginSucceeded {
        /// Signed-in user.
        user: User,
        /// Home tenant of the user.
        tenant: Tenant,
        /// Subscription fetched for the tenant, if any.
        subscription: Option<Subscription>,
        /// Time used for a synthesized subscription.
        at: DateTime<Utc>,
    },
    /// Login failed with a user-facing message.
    LoginFailed(String),
    /// Signs out and drops every tenant-owned item.
    Logout,
    /// Activates another tenant and resets list filters.
    SetTenant {
        /// Tenant to activate.
        tenant: Tenant,
        /// Subscription fetched for the tenant, if any.
        subscription: Option<Subscription>,
        /// Time used for a synthesized subscription.
        at: DateTime<Utc>,
    },
    /// Replaces tenant details without switching tenants.
    UpdateTenant(Tenant),
    /// Replaces the active subscription.
    SetSubscription(Subscription),
    /// Flips dark mode for the active tenant.
    ToggleDarkMode,
    /// Replaces the users list.
    SetUsers(Vec<User>),
    /// Appends a created user.
    AddUser(ManagedUser),
    /// Applies a partial user update.
    UpdateUser {
        /// Target user.
        id: UserId,
        /// Fields to change.
        changes: UserChanges,
        /// Update timestamp.
        at: DateTime<Utc>,
    },
    /// Stores the server copy of an updated user, keeping the reset flag.
    ReplaceUser(User),
    /// Sets a user's status.
    SetUserStatus {
        /// Target user.
        id: UserId,
        /// New status.
        status: UserStatus,
        /// Update timestamp.
        at: DateTime<Utc>,
    },
    /// Marks a user as needing a new password after an admin reset.
    AdminResetPassword {
        /// Target user.
        id: UserId,
        /// Update timestamp.
        at: DateTime<Utc>,
    },
    /// Clears the reset flag after a user chose a password.
    SelfSetPassword {
        /// Target user.
        id: UserId,
        /// Update timestamp.
        at: DateTime<Utc>,
    },
    /// Appends an audit entry.
    RecordAudit {
        /// Entry payload.
        event: AuditEvent,
        /// Recording timestamp.
        at: DateTime<Utc>,
    },
    /// Drops every audit entry.
    ClearAudit,
}

/// Whole client state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrmState {
    auth: AuthState,
    tenant: TenantState,
    users: UsersState,
    audit: AuditLog,
    leads: ResourceState<Lead>,
    contacts: ResourceState<Contact>,
    accounts: ResourceState<Account>,
    deals: ResourceState<Deal>,
    campaigns: ResourceState<Campaign>,
    products: ResourceState<Product>,
    quotes: ResourceState<Quote>,
    invoices: ResourceState<Invoice>,
    orders: ResourceState<Order>,
    tasks: ResourceState<Task>,
    session_epoch: u64,
}

/// Record type with a collection slot in [`CrmState`].
pub trait StoredRecord: DomainRecord {
    /// Returns the collection for this record type.
    fn slice(state: &CrmState) -> &ResourceState<Self>;

    /// Returns the mutable collection for this record type.
    fn slice_mut(state: &mut CrmState) -> &mut ResourceState<Self>;
}

macro_rules! stored_record {
    ($($record:ty => $field:ident),+ $(,)?) => {
        $(
            impl StoredRecord for $record {
                fn slice(state: &CrmState) -> &ResourceState<Self> {
                    &state.$field
                }

                fn slice_mut(state: &mut CrmState) -> &mut ResourceState<Self> {
                    &mut state.$field
                }
            }
        )+

        impl CrmState {
            fn reset_resource_filters(&mut self) {
                $(self.$field.apply(ResourceAction::ResetFilters);)+
            }

            fn clear_resources(&mut self) {
                $(self.$field.clear();)+
            }
        }
    };
}

stored_record! {
    Lead => leads,
    Contact => contacts,
    Account => accounts,
    Deal => deals,
    Campaign => campaigns,
    Product => products,
    Quote => quotes,
    Invoice => invoices,
    Order => orders,
    Task => tasks,
}

impl CrmState {
    /// Returns authentication state.
    #[must_use]
    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Returns tenant state.
    #[must_use]
    pub fn tenant(&self) -> &TenantState {
        &self.tenant
    }

    /// Returns managed users.
    #[must_use]
    pub fn users(&self) -> &UsersState {
        &self.users
    }

    /// Returns the audit log.
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Returns the collection of one record type.
    #[must_use]
    pub fn resource<R: StoredRecord>(&self) -> &ResourceState<R> {
        R::slice(self)
    }

    /// Returns a counter that changes on login, logout and tenant switch.
    #[must_use]
    pub fn session_epoch(&self) -> u64 {
        self.session_epoch
    }

    /// Returns the signed-in user acting in the active tenant.
    #[must_use]
    pub fn actor(&self) -> Option<Actor> {
        let user = self.auth.current_user()?;
        let tenant = self.tenant.current_tenant()?;
        Some(Actor::new(user.id.clone(), tenant.id.clone(), user.role))
    }

    /// Applies one action.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::LoginStarted => self.auth.start_login(),
            Action::LoginSucceeded {
                user,
                tenant,
                subscription,
                at,
            } => {
                self.auth.succeed(user);
                self.activate_tenant(tenant, subscription, at);
            }
            Action::LoginFailed(message) => self.auth.fail(message),
            Action::Logout => {
                self.auth.sign_out();
                self.tenant.clear();
                self.users.clear();
                self.clear_resources();
                self.next_epoch();
            }
            Action::SetTenant {
                tenant,
                subscription,
                at,
            } => self.activate_tenant(tenant, subscription, at),
            Action::UpdateTenant(tenant) => self.tenant.replace_tenant_details(tenant),
            Action::SetSubscription(subscription) => self.tenant.set_subscription(subscription),
            Action::ToggleDarkMode => self.tenant.toggle_dark_mode(),
            Action::SetUsers(users) => self.users.set(users),
            Action::AddUser(user) => self.users.add(user),
            Action::UpdateUser { id, changes, at } => self.users.update(&id, changes, at),
            Action::ReplaceUser(user) => self.users.replace(user),
            Action::SetUserStatus { id, status, at } => self.users.update(
                &id,
                UserChanges {
                    status: Some(status),
                    ..UserChanges::default()
                },
                at,
            ),
            Action::AdminResetPassword { id, at } => self.users.mark_password_reset(&id, true, at),
            Action::SelfSetPassword { id, at } => self.users.mark_password_reset(&id, false, at),
            Action::RecordAudit { event, at } => self.audit.append(event, at),
            Action::ClearAudit => self.audit.clear(),
        }
    }

    /// Applies one action to the collection of `R`.
    pub fn apply_resource<R: StoredRecord>(&mut self, action: ResourceAction<R>) {
        R::slice_mut(self).apply(action);
    }

    fn activate_tenant(
        &mut self,
        tenant: Tenant,
        subscription: Option<Subscription>,
        at: DateTime<Utc>,
    ) {
        self.tenant.set_tenant(tenant, subscription, at);
        self.reset_resource_filters();
        self.next_epoch();
    }

    fn next_epoch(&mut self) {
        self.session_epoch = self.session_epoch.wrapping_add(1);
    }
}

/// Shared handle to the client state.
#[derive(Clone, Default)]
pub struct Store {
    state: Arc<RwLock<CrmState>>,
}

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an action under the write lock.
    pub async fn dispatch(&self, action: Action) {
        self.state.write().await.apply(action);
    }

    /// Applies a resource action under the write lock.
    pub async fn dispatch_resource<R: StoredRecord>(&self, action: ResourceAction<R>) {
        self.state.write().await.apply_resource(action);
    }

    /// Applies an action only if the session epoch still equals `epoch`.
    ///
    /// Returns whether the action was applied.
    pub async fn dispatch_in_epoch(&self, epoch: u64, action: Action) -> bool {
        let mut state = self.state.write().await;
        if state.session_epoch != epoch {
            return false;
        }

        state.apply(action);
        true
    }

    /// Applies a resource action only if the session epoch still equals `epoch`.
    pub async fn dispatch_resource_in_epoch<R: StoredRecord>(
        &self,
        epoch: u64,
        action: ResourceAction<R>,
    ) -> bool {
        let mut state = self.state.write().await;
        if state.session_epoch != epoch {
            return false;
        }

        state.apply_resource(action);
        true
    }

    /// Appends an audit entry stamped with the current time.
    pub async fn record_audit(&self, event: AuditEvent) {
        self.dispatch(Action::RecordAudit {
            event,
            at: Utc::now(),
        })
        .await;
    }

    /// Runs a read-only projection under the read lock.
    pub async fn read<T>(&self, reader: impl FnOnce(&CrmState) -> T) -> T {
        reader(&*self.state.read().await)
    }

    /// Returns a clone of the whole state.
    pub async fn snapshot(&self) -> CrmState {
        self.state.read().await.clone()
    }
}
