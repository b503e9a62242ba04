use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use orbit_application::{
    AuthGateway, CreateUserInput, LoginResponse, ResourceGateway, TenantGateway, TenantUpdate,
    TokenStore, UpdateUserInput, UserGateway,
};
use orbit_core::{AppError, AppResult, TenantId, UserId};
use orbit_domain::{DomainRecord, Plan, Subscription, Tenant, User};
use reqwest::{Method, RequestBuilder, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;


#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    new_password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Serialize)]
struct ChangePlanRequest {
    plan: Plan,
}

/// REST client for the CRM backend implementing every gateway port.
///
/// The bearer token is read from the shared [`TokenStore`] for each request;
/// a `401` answer clears it and surfaces [`AppError::Unauthorized`].
#[derive(Clone)]
pub struct HttpCrmClient {
    http_client: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl HttpCrmClient {
    /// Creates a client over an existing `reqwest` client.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
    ) -> AppResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|error| {
            AppError::Validation(format!("invalid API base URL '{base_url}': {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "API base URL '{base_url}' cannot carry paths"
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            tokens,
        })
    }

    /// Creates a client with its own connection pool and request timeout.
    pub fn with_timeout(
        base_url: &str,
        timeout: Duration,
        tokens: Arc<dyn TokenStore>,
    ) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

        Self::new(http_client, base_url, tokens)
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::Internal("API base URL cannot carry paths".to_owned()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http_client.request(method, url);
        match self.tokens.token().await {
            Some(token) => builder.header(header::AUTHORIZATION, token.bearer_header()),
            None => builder,
        }
    }

    async fn execute(&self, operation: &str, builder: RequestBuilder) -> AppResult<Response> {
        let response = builder.send().await.map_err(|error| {
            warn!(operation, error = %error, "backend unreachable");
            AppError::Upstream {
                status: 0,
                message: format!("{operation} failed: {error}"),
            }
        })?;

        let status = response.status();
        debug!(operation, status = status.as_u16(), "backend responded");
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());
        let message = error_message(status, &body);

        if status == StatusCode::UNAUTHORIZED {
            warn!(operation, "backend rejected the session token");
            self.tokens.clear().await;
            return Err(AppError::Unauthorized(message));
        }

        warn!(operation, status = status.as_u16(), message = %message, "backend call failed");
        Err(AppError::Upstream {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> AppResult<T> {
        let response = self.execute(operation, builder).await?;
        let status = response.status();
        response.json::<T>().await.map_err(|error| AppError::Upstream {
            status: status.as_u16(),
            message: format!("{operation} returned an unreadable body: {error}"),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        segments: &[&str],
    ) -> AppResult<T> {
        let url = self.endpoint(segments)?;
        let builder = self.request(Method::GET, url).await;
        self.fetch(operation, builder).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        operation: &str,
        segments: &[&str],
        body: &B,
    ) -> AppResult<T> {
        let url = self.endpoint(segments)?;
        let builder = self.request(method, url).await.json(body);
        self.fetch(operation, builder).await
    }
}

/// Extracts `detail` or `message` from a JSON error body, falling back to the raw text.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["detail", "message"].iter().find_map(|key| {
            value
                .get(*key)
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
    });

    from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        })
}

#[async_trait]
impl<R: DomainRecord> ResourceGateway<R> for HttpCrmClient {
    async fn list(&self, tenant_id: &TenantId) -> AppResult<Vec<R>> {
        let mut url = self.endpoint(&[R::COLLECTION])?;
        url.query_pairs_mut()
            .append_pair("tenantId", tenant_id.as_str());
        let builder = self.request(Method::GET, url).await;
        self.fetch(&format!("list {}", R::COLLECTION), builder).await
    }

    async fn get(&self, id: &str) -> AppResult<R> {
        self.get_json(&format!("get {}", R::COLLECTION), &[R::COLLECTION, id])
            .await
    }

    async fn create(&self, payload: Map<String, Value>) -> AppResult<R> {
        self.send_json(
            Method::POST,
            &format!("create {}", R::COLLECTION),
            &[R::COLLECTION],
            &payload,
        )
        .await
    }

    async fn update(&self, id: &str, record: &R) -> AppResult<R> {
        self.send_json(
            Method::PUT,
            &format!("update {}", R::COLLECTION),
            &[R::COLLECTION, id],
            record,
        )
        .await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let url = self.endpoint(&[R::COLLECTION, id])?;
        let builder = self.request(Method::DELETE, url).await;
        self.execute(&format!("delete {}", R::COLLECTION), builder)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl UserGateway for HttpCrmClient {
    async fn list_users(&self, tenant_id: &TenantId) -> AppResult<Vec<User>> {
        let mut url = self.endpoint(&["users"])?;
        url.query_pairs_mut()
            .append_pair("tenantId", tenant_id.as_str());
        let builder = self.request(Method::GET, url).await;
        self.fetch("list users", builder).await
    }

    async fn create_user(&self, input: CreateUserInput) -> AppResult<User> {
        self.send_json(Method::POST, "create user", &["users"], &input)
            .await
    }

    async fn update_user(&self, id: &UserId, input: UpdateUserInput) -> AppResult<User> {
        self.send_json(Method::PATCH, "update user", &["users", id.as_str()], &input)
            .await
    }

    async fn reset_password(&self, id: &UserId, new_password: &str) -> AppResult<User> {
        self.send_json(
            Method::POST,
            "reset password",
            &["users", id.as_str(), "reset-password"],
            &ResetPasswordRequest { new_password },
        )
        .await
    }

    async fn change_password(
        &self,
        id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<User> {
        self.send_json(
            Method::POST,
            "change password",
            &["users", id.as_str(), "change-password"],
            &ChangePasswordRequest {
                current_password,
                new_password,
            },
        )
        .await
    }
}

#[async_trait]
impl AuthGateway for HttpCrmClient {
    async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        self.send_json(
            Method::POST,
            "login",
            &["auth", "login"],
            &LoginRequest { email, password },
        )
        .await
    }

    async fn logout(&self) -> AppResult<()> {
        let url = self.endpoint(&["auth", "logout"])?;
        let builder = self.request(Method::POST, url).await;
        self.execute("logout", builder).await.map(|_| ())
    }
}

#[async_trait]
impl TenantGateway for HttpCrmClient {
    async fn get_tenant(&self, tenant_id: &TenantId) -> AppResult<Tenant> {
        self.get_json("get tenant", &["tenants", tenant_id.as_str()])
            .await
    }

    async fn update_tenant(&self, tenant_id: &TenantId, update: TenantUpdate) -> AppResult<Tenant> {
        self.send_json(
            Method::PATCH,
            "update tenant",
            &["tenants", tenant_id.as_str()],
            &update,
        )
        .await
    }

    async fn get_subscription(&self, tenant_id: &TenantId) -> AppResult<Subscription> {
        self.get_json(
            "get subscription",
            &["tenants", tenant_id.as_str(), "subscription"],
        )
        .await
    }

    async fn change_plan(&self, tenant_id: &TenantId, plan: Plan) -> AppResult<Subscription> {
        self.send_json(
            Method::POST,
            "change plan",
            &["tenants", tenant_id.as_str(), "subscription"],
            &ChangePlanRequest { plan },
        )
        .await
    }
}
