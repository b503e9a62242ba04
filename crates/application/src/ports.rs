//! Ports implemented by backend adapters.

use async_trait::async_trait;
use orbit_core::{AccessToken, AppResult, TenantId, UserId};
use orbit_domain::{
    Account, Campaign, Contact, Deal, DomainRecord, Invoice, Lead, Order, Plan, Product, Quote,
    Role, Subscription, Task, Tenant, User, UserStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend CRUD contract of one resource collection.
#[async_trait]
pub trait ResourceGateway<R: DomainRecord>: Send + Sync {
    /// Lists every record of a tenant.
    async fn list(&self, tenant_id: &TenantId) -> AppResult<Vec<R>>;

    /// Fetches one record.
    async fn get(&self, id: &str) -> AppResult<R>;

    /// Creates a record from a payload without id or timestamps.
    async fn create(&self, payload: Map<String, Value>) -> AppResult<R>;

    /// Replaces a record.
    async fn update(&self, id: &str, record: &R) -> AppResult<R>;

    /// Deletes a record.
    async fn delete(&self, id: &str) -> AppResult<()>;
}

/// Payload for creating an employee account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Lower-cased email.
    pub email: String,
    /// Granted role.
    pub role: Role,
    /// Temporary password.
    pub password: String,
    /// Whether the password must be changed on first login.
    pub must_reset_password: bool,
}

/// Partial update sent for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// New status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

/// Backend contract of tenant users.
#[async_trait]
pub trait UserGateway: Send + Sync {
    /// Lists users of a tenant.
    async fn list_users(&self, tenant_id: &TenantId) -> AppResult<Vec<User>>;

    /// Creates an employee account.
    async fn create_user(&self, input: CreateUserInput) -> AppResult<User>;

    /// Applies a partial update.
    async fn update_user(&self, id: &UserId, input: UpdateUserInput) -> AppResult<User>;

    /// Sets a temporary password chosen by an administrator.
    async fn reset_password(&self, id: &UserId, new_password: &str) -> AppResult<User>;

    /// Changes the caller's own password.
    async fn change_password(
        &self,
        id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<User>;
}

/// Successful login payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Signed-in user.
    pub user: User,
    /// Home tenant of the user.
    pub tenant: Tenant,
    /// Bearer token for later requests.
    pub access_token: AccessToken,
}

/// Backend authentication endpoints.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchanges credentials for a session.
    async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse>;

    /// Ends the backend session.
    async fn logout(&self) -> AppResult<()>;
}

/// Partial update of tenant branding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New logo URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// New primary color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    /// New dark-mode default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
}

/// Backend tenant and subscription endpoints.
#[async_trait]
pub trait TenantGateway: Send + Sync {
    /// Fetches a tenant.
    async fn get_tenant(&self, tenant_id: &TenantId) -> AppResult<Tenant>;

    /// Updates tenant branding.
    async fn update_tenant(&self, tenant_id: &TenantId, update: TenantUpdate) -> AppResult<Tenant>;

    /// Fetches the tenant subscription.
    async fn get_subscription(&self, tenant_id: &TenantId) -> AppResult<Subscription>;

    /// Moves the tenant to another plan.
    async fn change_plan(&self, tenant_id: &TenantId, plan: Plan) -> AppResult<Subscription>;
}

/// Holder of the bearer token shared by the HTTP adapter and the session.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the stored token.
    async fn token(&self) -> Option<AccessToken>;

    /// Stores a token.
    async fn store(&self, token: AccessToken);

    /// Forgets the token.
    async fn clear(&self);
}

/// Adapter that serves every resource collection and the users endpoints.
pub trait CrmGateway:
    ResourceGateway<Lead>
    + ResourceGateway<Contact>
    + ResourceGateway<Account>
    + ResourceGateway<Deal>
    + ResourceGateway<Campaign>
    + ResourceGateway<Product>
    + ResourceGateway<Quote>
    + ResourceGateway<Invoice>
    + ResourceGateway<Order>
    + ResourceGateway<Task>
    + UserGateway
{
}

impl<T> CrmGateway for T where
    T: ResourceGateway<Lead>
        + ResourceGateway<Contact>
        + ResourceGateway<Account>
        + ResourceGateway<Deal>
        + ResourceGateway<Campaign>
        + ResourceGateway<Product>
        + ResourceGateway<Quote>
        + ResourceGateway<Invoice>
        + ResourceGateway<Order>
        + ResourceGateway<Task>
        + UserGateway
{
}
