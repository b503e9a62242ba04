use std::sync::Arc;

use orbit_core::{AppError, AppResult};
use orbit_domain::{Actor, AuditAction, DomainRecord};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::info;

use crate::access_service::{ensure_can_write, ensure_module_access};
use crate::ports::ResourceGateway;
use crate::scope::scope_records;
use crate::selectors::{PageView, ScopedSelector, paginate};
use crate::session_service::settle_session;
use crate::store::{AuditEvent, ResourceAction, Store, StoredRecord};

#[cfg(test)]
mod tests;

/// Fields the backend assigns on create.
const SERVER_ASSIGNED_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

/// Scoped listing and CRUD for one resource collection.
pub struct ResourceService<R: StoredRecord> {
    gateway: Arc<dyn ResourceGateway<R>>,
    store: Store,
    selector: Mutex<ScopedSelector<R>>,
}

impl<R: StoredRecord> ResourceService<R> {
    /// Creates a resource service.
    #[must_use]
    pub fn new(gateway: Arc<dyn ResourceGateway<R>>, store: Store) -> Self {
        Self {
            gateway,
            store,
            selector: Mutex::new(ScopedSelector::new()),
        }
    }

    /// Reloads the collection of the active tenant from the backend.
    pub async fn refresh(&self) -> AppResult<usize> {
        let actor = ensure_module_access(&self.store, R::MODULE).await?;
        let epoch = self.store.read(|state| state.session_epoch()).await;

        let records =
            settle_session(&self.store, self.gateway.list(actor.tenant_id()).await).await?;
        let count = records.len();
        self.store
            .dispatch_resource_in_epoch(epoch, ResourceAction::Set(records))
            .await;

        Ok(count)
    }

    /// Returns the records visible to the actor under the stored query.
    pub async fn visible(&self) -> AppResult<Arc<Vec<R>>> {
        let actor = ensure_module_access(&self.store, R::MODULE).await?;
        let mut selector = self.selector.lock().await;
        Ok(self
            .store
            .read(|state| selector.select(state.resource::<R>(), &actor))
            .await)
    }

    /// Returns the stored page of the visible records.
    pub async fn visible_page(&self) -> AppResult<PageView<R>> {
        let records = self.visible().await?;
        let (page, rows_per_page) = self
            .store
            .read(|state| {
                let collection = state.resource::<R>();
                (collection.page(), collection.rows_per_page())
            })
            .await;

        Ok(paginate(&records, page, rows_per_page))
    }

    /// Sets the free-text query and returns to the first page.
    pub async fn search(&self, query: impl Into<String>) {
        self.store
            .dispatch_resource::<R>(ResourceAction::SetSearch(query.into()))
            .await;
    }

    /// Moves to a zero-based page.
    pub async fn set_page(&self, page: usize) {
        self.store
            .dispatch_resource::<R>(ResourceAction::SetPage(page))
            .await;
    }

    /// Fetches one record the actor can see and refreshes the stored copy.
    pub async fn get(&self, id: &str) -> AppResult<R> {
        let actor = ensure_module_access(&self.store, R::MODULE).await?;
        let record = settle_session(&self.store, self.gateway.get(id).await).await?;

        if scope_records(std::slice::from_ref(&record), &actor).is_empty() {
            return Err(not_found::<R>(id));
        }

        self.store
            .dispatch_resource(ResourceAction::Update(record.clone()))
            .await;
        Ok(record)
    }

    /// Creates a record owned by the actor in the active tenant.
    ///
    /// `tenantId` and `createdBy` are stamped from the session; server-assigned
    /// fields in the payload are dropped.
    pub async fn create(&self, mut payload: Map<String, Value>) -> AppResult<R> {
        let actor = ensure_module_access(&self.store, R::MODULE).await?;
        ensure_can_write(&actor, R::MODULE, None)?;

        for field in SERVER_ASSIGNED_FIELDS {
            payload.remove(*field);
        }
        payload.insert(
            "tenantId".to_owned(),
            Value::String(actor.tenant_id().as_str().to_owned()),
        );
        payload.insert(
            "createdBy".to_owned(),
            Value::String(actor.user_id().as_str().to_owned()),
        );

        let record = settle_session(&self.store, self.gateway.create(payload).await).await?;
        self.store
            .dispatch_resource(ResourceAction::Add(record.clone()))
            .await;
        self.audit(&actor, AuditAction::Create, record.id()).await;

        info!(
            tenant_id = %actor.tenant_id(),
            module = %R::MODULE,
            record_id = record.id(),
            "record created"
        );
        Ok(record)
    }

    /// Replaces a record the actor may write.
    ///
    /// The tenant and creator of a record cannot change.
    pub async fn update(&self, record: R) -> AppResult<R> {
        let actor = ensure_module_access(&self.store, R::MODULE).await?;
        let stored = self.find_scoped(&actor, record.id()).await?;
        ensure_can_write(&actor, R::MODULE, Some(stored.created_by()))?;

        if record.tenant_id() != stored.tenant_id() {
            return Err(AppError::Validation(format!(
                "{} '{}' cannot move to another tenant",
                R::MODULE,
                record.id()
            )));
        }
        if record.created_by() != stored.created_by() {
            return Err(AppError::Validation(format!(
                "{} '{}' cannot change its creator",
                R::MODULE,
                record.id()
            )));
        }

        let updated = settle_session(
            &self.store,
            self.gateway.update(record.id(), &record).await,
        )
        .await?;
        self.store
            .dispatch_resource(ResourceAction::Update(updated.clone()))
            .await;
        self.audit(&actor, AuditAction::Update, updated.id()).await;

        info!(
            tenant_id = %actor.tenant_id(),
            module = %R::MODULE,
            record_id = updated.id(),
            "record updated"
        );
        Ok(updated)
    }

    /// Deletes a record the actor may write.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let actor = ensure_module_access(&self.store, R::MODULE).await?;
        let stored = self.find_scoped(&actor, id).await?;
        ensure_can_write(&actor, R::MODULE, Some(stored.created_by()))?;

        settle_session(&self.store, self.gateway.delete(id).await).await?;
        self.store
            .dispatch_resource::<R>(ResourceAction::Delete(id.to_owned()))
            .await;
        self.audit(&actor, AuditAction::Delete, id).await;

        info!(
            tenant_id = %actor.tenant_id(),
            module = %R::MODULE,
            record_id = id,
            "record deleted"
        );
        Ok(())
    }

    async fn find_scoped(&self, actor: &Actor, id: &str) -> AppResult<R> {
        self.store
            .read(|state| {
                let items = state.resource::<R>().items();
                scope_records(items, actor)
                    .into_iter()
                    .find(|record| record.id() == id)
                    .cloned()
            })
            .await
            .ok_or_else(|| not_found::<R>(id))
    }

    async fn audit(&self, actor: &Actor, action: AuditAction, record_id: &str) {
        self.store
            .record_audit(
                AuditEvent::new(
                    actor.tenant_id().clone(),
                    actor.user_id().clone(),
                    action,
                    R::MODULE.as_str(),
                )
                .with_record(record_id),
            )
            .await;
    }
}

fn not_found<R: DomainRecord>(id: &str) -> AppError {
    AppError::NotFound(format!("{} record '{id}' does not exist", R::MODULE))
}
