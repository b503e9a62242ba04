//! Fixtures and fake gateways shared by the service tests.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use orbit_core::{AccessToken, AppError, AppResult, TenantId, UserId};
use orbit_domain::{
    Deal, DealStage, DealStatus, DomainRecord, Lead, LeadSource, LeadStatus, Plan, Role,
    Subscription, Tenant, TenantStatus, User, UserStatus,
};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::ports::{
    AuthGateway, CreateUserInput, LoginResponse, ResourceGateway, TenantGateway, TenantUpdate,
    TokenStore, UpdateUserInput, UserGateway,
};
use crate::store::{Action, Store};

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!())
}

/// Timestamp the fake user backend stamps on every update.
pub(crate) fn server_update_time() -> chrono::DateTime<Utc> {
    fixed_time() + chrono::Duration::hours(1)
}

pub(crate) fn lead(id: &str, tenant_id: &str, owner: &str, name: &str) -> Lead {
    Lead {
        id: id.to_owned(),
        tenant_id: TenantId::new(tenant_id),
        name: name.to_owned(),
        email: format!("{id}@leads.test"),
        phone: String::new(),
        company: String::new(),
        status: LeadStatus::New,
        source: LeadSource::Web,
        score: 0,
        created_by: UserId::new(owner),
        created_at: fixed_time(),
        updated_at: fixed_time(),
    }
}

pub(crate) fn deal(id: &str, tenant_id: &str, owner: &str, status: DealStatus, value: f64) -> Deal {
    let stage = match status {
        DealStatus::Active => DealStage::Proposal,
        DealStatus::Won => DealStage::ClosedWon,
        DealStatus::Lost => DealStage::ClosedLost,
    };

    Deal {
        id: id.to_owned(),
        tenant_id: TenantId::new(tenant_id),
        title: format!("Deal {id}"),
        contact_id: String::new(),
        account_id: String::new(),
        stage,
        value,
        margin: 0.0,
        cost: 0.0,
        revenue: if status == DealStatus::Won { value } else { 0.0 },
        probability: 50.0,
        close_date: String::new(),
        status,
        created_by: UserId::new(owner),
        created_at: fixed_time(),
        updated_at: fixed_time(),
    }
}

pub(crate) fn tenant(id: &str, plan: Plan) -> Tenant {
    Tenant {
        id: TenantId::new(id),
        name: format!("Tenant {id}"),
        domain: format!("{id}.example.com"),
        plan,
        status: TenantStatus::Active,
        logo_url: String::new(),
        primary_color: String::new(),
        dark_mode: false,
        created_at: fixed_time(),
        updated_at: fixed_time(),
    }
}

pub(crate) fn user(id: &str, tenant_id: &str, role: Role) -> User {
    User {
        id: UserId::new(id),
        tenant_id: TenantId::new(tenant_id),
        name: format!("User {id}"),
        email: format!("{id}@example.com"),
        role,
        status: UserStatus::Active,
        avatar_url: String::new(),
        created_at: fixed_time(),
        updated_at: fixed_time(),
    }
}

/// Returns a store signed in as `user_id` in tenant `tenant_id` on `plan`.
pub(crate) async fn signed_in_store(user_id: &str, tenant_id: &str, role: Role, plan: Plan) -> Store {
    let store = Store::new();
    store
        .dispatch(Action::LoginSucceeded {
            user: user(user_id, tenant_id, role),
            tenant: tenant(tenant_id, plan),
            subscription: None,
            at: Utc::now(),
        })
        .await;
    store
}

/// In-memory collection recording each call by name.
pub(crate) struct FakeResourceGateway<R> {
    pub(crate) records: Mutex<Vec<R>>,
    pub(crate) calls: Mutex<Vec<String>>,
    pub(crate) failure: Mutex<Option<AppError>>,
    next_id: Mutex<u64>,
    record: PhantomData<fn() -> R>,
}

impl<R> FakeResourceGateway<R> {
    pub(crate) fn with_records(records: Vec<R>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            next_id: Mutex::new(0),
            record: PhantomData,
        })
    }

    pub(crate) async fn fail_with(&self, error: AppError) {
        *self.failure.lock().await = Some(error);
    }

    pub(crate) async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn enter(&self, call: &str) -> AppResult<()> {
        self.calls.lock().await.push(call.to_owned());
        match self.failure.lock().await.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<R: DomainRecord> ResourceGateway<R> for FakeResourceGateway<R> {
    async fn list(&self, tenant_id: &TenantId) -> AppResult<Vec<R>> {
        self.enter("list").await?;
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| record.tenant_id() == tenant_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> AppResult<R> {
        self.enter("get").await?;
        self.records
            .lock()
            .await
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("{id} not found")))
    }

    async fn create(&self, mut payload: Map<String, Value>) -> AppResult<R> {
        self.enter("create").await?;
        let id = {
            let mut next_id = self.next_id.lock().await;
            *next_id += 1;
            format!("{}-{}", R::COLLECTION, *next_id)
        };
        let now = Value::String(fixed_time().to_rfc3339());
        payload.insert("id".to_owned(), Value::String(id));
        payload.insert("createdAt".to_owned(), now.clone());
        payload.insert("updatedAt".to_owned(), now);

        let record: R = serde_json::from_value(Value::Object(payload))
            .map_err(|error| AppError::Validation(error.to_string()))?;
        self.records.lock().await.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, record: &R) -> AppResult<R> {
        self.enter("update").await?;
        let mut records = self.records.lock().await;
        let slot = records
            .iter_mut()
            .find(|stored| stored.id() == id)
            .ok_or_else(|| AppError::NotFound(format!("{id} not found")))?;
        *slot = record.clone();
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.enter("delete").await?;
        self.records.lock().await.retain(|record| record.id() != id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeUserGateway {
    pub(crate) users: Mutex<Vec<User>>,
    pub(crate) created: Mutex<Vec<CreateUserInput>>,
    pub(crate) password_resets: Mutex<Vec<(UserId, String)>>,
    pub(crate) failure: Mutex<Option<AppError>>,
}

impl FakeUserGateway {
    pub(crate) fn with_users(users: Vec<User>) -> Arc<Self> {
        Arc::new(Self {
            users: Mutex::new(users),
            ..Self::default()
        })
    }

    pub(crate) async fn create_calls(&self) -> usize {
        self.created.lock().await.len()
    }

    async fn check_failure(&self) -> AppResult<()> {
        match self.failure.lock().await.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn find(&self, id: &UserId) -> AppResult<User> {
        self.users
            .lock()
            .await
            .iter()
            .find(|user| &user.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
    }
}

#[async_trait]
impl UserGateway for FakeUserGateway {
    async fn list_users(&self, tenant_id: &TenantId) -> AppResult<Vec<User>> {
        self.check_failure().await?;
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .filter(|user| &user.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn create_user(&self, input: CreateUserInput) -> AppResult<User> {
        self.created.lock().await.push(input.clone());
        self.check_failure().await?;

        let mut users = self.users.lock().await;
        let created = User {
            id: UserId::new(format!("user-{}", users.len() + 1)),
            tenant_id: input.tenant_id,
            name: input.name,
            email: input.email,
            role: input.role,
            status: UserStatus::Active,
            avatar_url: String::new(),
            created_at: fixed_time(),
            updated_at: fixed_time(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: &UserId, input: UpdateUserInput) -> AppResult<User> {
        self.check_failure().await?;
        let mut users = self.users.lock().await;
        let user = users
            .iter_mut()
            .find(|user| &user.id == id)
            .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;
        if let Some(name) = input.name {
            user.name = name;
        }
        if let Some(role) = input.role {
            user.role = role;
        }
        if let Some(status) = input.status {
            user.status = status;
        }
        user.updated_at = server_update_time();
        Ok(user.clone())
    }

    async fn reset_password(&self, id: &UserId, new_password: &str) -> AppResult<User> {
        self.check_failure().await?;
        self.password_resets
            .lock()
            .await
            .push((id.clone(), new_password.to_owned()));
        self.find(id).await
    }

    async fn change_password(
        &self,
        id: &UserId,
        current_password: &str,
        _new_password: &str,
    ) -> AppResult<User> {
        self.check_failure().await?;
        if current_password != "current-secret" {
            return Err(AppError::Validation("current password is wrong".to_owned()));
        }
        self.find(id).await
    }
}

/// Accepts a single email/password pair.
pub(crate) struct FakeAuthGateway {
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) response: LoginResponse,
    pub(crate) logout_calls: Mutex<usize>,
    logout_fails: bool,
}

impl FakeAuthGateway {
    pub(crate) fn accepting(user: User, tenant: Tenant) -> Arc<Self> {
        Arc::new(Self::build(user, tenant, false))
    }

    pub(crate) fn with_failing_logout(user: User, tenant: Tenant) -> Arc<Self> {
        Arc::new(Self::build(user, tenant, true))
    }

    fn build(user: User, tenant: Tenant, logout_fails: bool) -> Self {
        Self {
            email: user.email.clone(),
            password: "secret".to_owned(),
            response: LoginResponse {
                user,
                tenant,
                access_token: AccessToken::new("token-1"),
            },
            logout_calls: Mutex::new(0),
            logout_fails,
        }
    }
}

#[async_trait]
impl AuthGateway for FakeAuthGateway {
    async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        if email == self.email && password == self.password {
            return Ok(self.response.clone());
        }

        Err(AppError::Unauthorized("invalid credentials".to_owned()))
    }

    async fn logout(&self) -> AppResult<()> {
        *self.logout_calls.lock().await += 1;
        if self.logout_fails {
            return Err(AppError::Upstream {
                status: 0,
                message: "connection refused".to_owned(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeTenantGateway {
    pub(crate) tenants: Mutex<Vec<Tenant>>,
    pub(crate) subscriptions: Mutex<Vec<Subscription>>,
    pub(crate) failure: Mutex<Option<AppError>>,
}

impl FakeTenantGateway {
    pub(crate) fn with_tenants(tenants: Vec<Tenant>) -> Arc<Self> {
        Arc::new(Self {
            tenants: Mutex::new(tenants),
            ..Self::default()
        })
    }

    async fn check_failure(&self) -> AppResult<()> {
        match self.failure.lock().await.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TenantGateway for FakeTenantGateway {
    async fn get_tenant(&self, tenant_id: &TenantId) -> AppResult<Tenant> {
        self.check_failure().await?;
        self.tenants
            .lock()
            .await
            .iter()
            .find(|tenant| &tenant.id == tenant_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("tenant {tenant_id} not found")))
    }

    async fn update_tenant(&self, tenant_id: &TenantId, update: TenantUpdate) -> AppResult<Tenant> {
        let mut tenant = self.get_tenant(tenant_id).await?;
        if let Some(name) = update.name {
            tenant.name = name;
        }
        if let Some(primary_color) = update.primary_color {
            tenant.primary_color = primary_color;
        }
        Ok(tenant)
    }

    async fn get_subscription(&self, tenant_id: &TenantId) -> AppResult<Subscription> {
        self.check_failure().await?;
        self.subscriptions
            .lock()
            .await
            .iter()
            .find(|subscription| &subscription.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no subscription for {tenant_id}")))
    }

    async fn change_plan(&self, tenant_id: &TenantId, plan: Plan) -> AppResult<Subscription> {
        self.check_failure().await?;
        let subscription = Subscription::synthesize(tenant_id.clone(), plan, Utc::now());
        let mut subscriptions = self.subscriptions.lock().await;
        subscriptions.retain(|held| &held.tenant_id != tenant_id);
        subscriptions.push(subscription.clone());
        Ok(subscription)
    }
}

#[derive(Default)]
pub(crate) struct FakeTokenStore {
    token: Mutex<Option<AccessToken>>,
}

impl FakeTokenStore {
    pub(crate) fn holding(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(Some(AccessToken::new(token))),
        })
    }
}

#[async_trait]
impl TokenStore for FakeTokenStore {
    async fn token(&self) -> Option<AccessToken> {
        self.token.lock().await.clone()
    }

    async fn store(&self, token: AccessToken) {
        *self.token.lock().await = Some(token);
    }

    async fn clear(&self) {
        *self.token.lock().await = None;
    }
}
