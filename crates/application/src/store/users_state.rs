use chrono::{DateTime, Utc};
use orbit_core::{TenantId, UserId};
use orbit_domain::{ManagedUser, Role, User, UserStatus};

/// Partial update of a managed user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    /// New display name.
    pub name: Option<String>,
    /// New role.
    pub role: Option<Role>,
    /// New status.
    pub status: Option<UserStatus>,
}

/// Users of the active organization as managed by administrators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersState {
    items: Vec<ManagedUser>,
}

impl UsersState {
    /// Returns every held user.
    #[must_use]
    pub fn items(&self) -> &[ManagedUser] {
        &self.items
    }

    /// Finds a user by id.
    #[must_use]
    pub fn find(&self, id: &UserId) -> Option<&ManagedUser> {
        self.items.iter().find(|managed| &managed.user.id == id)
    }

    /// Returns users of one tenant.
    #[must_use]
    pub fn for_tenant(&self, tenant_id: &TenantId) -> Vec<&ManagedUser> {
        if tenant_id.is_blank() {
            return Vec::new();
        }

        self.items
            .iter()
            .filter(|managed| &managed.user.tenant_id == tenant_id)
            .collect()
    }

    /// Counts active users of one tenant.
    #[must_use]
    pub fn active_count(&self, tenant_id: &TenantId) -> usize {
        self.for_tenant(tenant_id)
            .into_iter()
            .filter(|managed| managed.user.is_active())
            .count()
    }

    /// Returns whether a tenant already has a user with this lower-cased email.
    #[must_use]
    pub fn email_taken(&self, tenant_id: &TenantId, lowercase_email: &str) -> bool {
        self.for_tenant(tenant_id)
            .into_iter()
            .any(|managed| managed.user.email.to_lowercase() == lowercase_email)
    }

    pub(super) fn set(&mut self, users: Vec<User>) {
        self.items = users.into_iter().map(ManagedUser::new).collect();
    }

    pub(super) fn add(&mut self, user: ManagedUser) {
        self.items.push(user);
    }

    pub(super) fn update(&mut self, id: &UserId, changes: UserChanges, now: DateTime<Utc>) {
        let Some(managed) = self.find_mut(id) else {
            return;
        };

        if let Some(name) = changes.name {
            managed.user.name = name;
        }
        if let Some(role) = changes.role {
            managed.user.role = role;
        }
        if let Some(status) = changes.status {
            managed.user.status = status;
        }
        managed.user.updated_at = now;
    }

    pub(super) fn replace(&mut self, user: User) {
        if let Some(managed) = self.find_mut(&user.id) {
            managed.user = user;
        }
    }

    pub(super) fn mark_password_reset(&mut self, id: &UserId, required: bool, now: DateTime<Utc>) {
        if let Some(managed) = self.find_mut(id) {
            managed.must_reset_password = required;
            managed.user.updated_at = now;
        }
    }

    pub(super) fn clear(&mut self) {
        self.items.clear();
    }

    fn find_mut(&mut self, id: &UserId) -> Option<&mut ManagedUser> {
        self.items
            .iter_mut()
            .find(|managed| &managed.user.id == id)
    }
}
