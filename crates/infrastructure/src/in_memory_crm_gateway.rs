use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use orbit_application::{CreateUserInput, ResourceGateway, UpdateUserInput, UserGateway};
use orbit_core::{AppError, AppResult, TenantId, UserId};
use orbit_domain::{DomainRecord, TenantScoped, User, UserStatus};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;


const USERS_COLLECTION: &str = "users";

/// In-memory backend holding JSON documents per collection.
///
/// Serves every resource collection and the users endpoints; used for
/// offline runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryCrmGateway {
    collections: RwLock<HashMap<&'static str, Vec<Value>>>,
}

impl InMemoryCrmGateway {
    /// Creates an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends records to the collection of `R`.
    pub async fn seed<R: DomainRecord>(&self, records: Vec<R>) -> AppResult<()> {
        self.seed_documents(R::COLLECTION, records).await
    }

    /// Appends users.
    pub async fn seed_users(&self, users: Vec<User>) -> AppResult<()> {
        self.seed_documents(USERS_COLLECTION, users).await
    }

    async fn seed_documents<T: Serialize>(
        &self,
        collection: &'static str,
        items: Vec<T>,
    ) -> AppResult<()> {
        let documents = items
            .iter()
            .map(to_document)
            .collect::<AppResult<Vec<_>>>()?;
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .extend(documents);
        Ok(())
    }

    async fn read_all<T: DeserializeOwned>(&self, collection: &'static str) -> AppResult<Vec<T>> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|document| from_document(collection, document))
            .collect()
    }

    async fn find<T: DeserializeOwned>(&self, collection: &'static str, id: &str) -> AppResult<T> {
        let collections = self.collections.read().await;
        let document = collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|document| document_id(document) == Some(id)))
            .ok_or_else(|| not_found(collection, id))?;
        from_document(collection, document)
    }

    async fn insert<T: DeserializeOwned>(
        &self,
        collection: &'static str,
        mut payload: Map<String, Value>,
    ) -> AppResult<T> {
        let now = Value::String(Utc::now().to_rfc3339());
        payload.insert(
            "id".to_owned(),
            Value::String(format!("{collection}-{}", Uuid::new_v4())),
        );
        payload.insert("createdAt".to_owned(), now.clone());
        payload.insert("updatedAt".to_owned(), now);

        let document = Value::Object(payload);
        let created = from_document(collection, &document)?;
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(document);
        Ok(created)
    }

    /// Merges `changes` into a stored document and stamps `updatedAt`.
    async fn merge<T: DeserializeOwned>(
        &self,
        collection: &'static str,
        id: &str,
        changes: Map<String, Value>,
    ) -> AppResult<T> {
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|documents| {
                documents
                    .iter_mut()
                    .find(|document| document_id(document) == Some(id))
            })
            .ok_or_else(|| not_found(collection, id))?;

        let mut merged = document.clone();
        if let Value::Object(fields) = &mut merged {
            fields.extend(changes);
            fields.insert("id".to_owned(), Value::String(id.to_owned()));
            fields.insert(
                "updatedAt".to_owned(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }

        let updated = from_document(collection, &merged)?;
        *document = merged;
        Ok(updated)
    }
}

fn to_document<T: Serialize>(item: &T) -> AppResult<Value> {
    serde_json::to_value(item)
        .map_err(|error| AppError::Internal(format!("failed to encode document: {error}")))
}

fn from_document<T: DeserializeOwned>(collection: &str, document: &Value) -> AppResult<T> {
    serde_json::from_value(document.clone()).map_err(|error| {
        AppError::Validation(format!("invalid {collection} document: {error}"))
    })
}

fn document_id(document: &Value) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}

fn not_found(collection: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{collection} '{id}' does not exist"))
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}

#[async_trait]
impl<R: DomainRecord> ResourceGateway<R> for InMemoryCrmGateway {
    async fn list(&self, tenant_id: &TenantId) -> AppResult<Vec<R>> {
        let records: Vec<R> = self.read_all(R::COLLECTION).await?;
        Ok(records
            .into_iter()
            .filter(|record| record.tenant_id() == tenant_id)
            .collect())
    }

    async fn get(&self, id: &str) -> AppResult<R> {
        self.find(R::COLLECTION, id).await
    }

    async fn create(&self, payload: Map<String, Value>) -> AppResult<R> {
        self.insert(R::COLLECTION, payload).await
    }

    async fn update(&self, id: &str, record: &R) -> AppResult<R> {
        let changes = into_object(to_document(record)?);
        self.merge(R::COLLECTION, id, changes).await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        let documents = collections
            .get_mut(R::COLLECTION)
            .ok_or_else(|| not_found(R::COLLECTION, id))?;
        let before = documents.len();
        documents.retain(|document| document_id(document) != Some(id));
        if documents.len() == before {
            return Err(not_found(R::COLLECTION, id));
        }

        Ok(())
    }
}

#[async_trait]
impl UserGateway for InMemoryCrmGateway {
    async fn list_users(&self, tenant_id: &TenantId) -> AppResult<Vec<User>> {
        let users: Vec<User> = self.read_all(USERS_COLLECTION).await?;
        Ok(users
            .into_iter()
            .filter(|user| user.tenant_id() == tenant_id)
            .collect())
    }

    async fn create_user(&self, input: CreateUserInput) -> AppResult<User> {
        let email = input.email.to_lowercase();
        let users: Vec<User> = self.read_all(USERS_COLLECTION).await?;
        if users
            .iter()
            .any(|user| user.tenant_id == input.tenant_id && user.email.to_lowercase() == email)
        {
            return Err(AppError::Conflict(format!(
                "user with email '{email}' already exists"
            )));
        }

        let mut payload = into_object(to_document(&input)?);
        payload.remove("password");
        payload.remove("mustResetPassword");
        payload.insert(
            "status".to_owned(),
            Value::String(UserStatus::Active.as_str().to_owned()),
        );
        self.insert(USERS_COLLECTION, payload).await
    }

    async fn update_user(&self, id: &UserId, input: UpdateUserInput) -> AppResult<User> {
        let changes = into_object(to_document(&input)?);
        self.merge(USERS_COLLECTION, id.as_str(), changes).await
    }

    async fn reset_password(&self, id: &UserId, _new_password: &str) -> AppResult<User> {
        self.find(USERS_COLLECTION, id.as_str()).await
    }

    async fn change_password(
        &self,
        id: &UserId,
        _current_password: &str,
        _new_password: &str,
    ) -> AppResult<User> {
        self.find(USERS_COLLECTION, id.as_str()).await
    }
}
