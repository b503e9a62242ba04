use chrono::Utc;
use orbit_core::{AppError, AppResult, UserId};
use orbit_domain::{
    Actor, AuditAction, ManagedUser, Module, Role, UserStatus, is_seat_limit_reached,
};
use serde_json::json;
use tracing::info;

use super::{EmployeeService, ensure_not_self, status_action, temporary_password};
use crate::access_service::require_actor;
use crate::ports::UpdateUserInput;
use crate::session_service::settle_session;
use crate::store::{Action, AuditEvent, UserChanges};

/// Shortest password accepted when users choose their own.
const MIN_PASSWORD_LENGTH: usize = 8;

impl EmployeeService {
    /// Grants another role to a user of the active tenant.
    pub async fn change_role(&self, id: &UserId, role: Role) -> AppResult<ManagedUser> {
        let actor = self.require_admin().await?;
        ensure_not_self(&actor, id, "change the role of")?;
        let current = self.find_managed(&actor, id).await?;
        if current.user.role == role {
            return Ok(current);
        }

        let changes = UserChanges {
            role: Some(role),
            ..UserChanges::default()
        };
        let updated = self.push_changes(id, changes).await?;
        self.audit(
            &actor,
            AuditAction::RoleChange,
            id,
            json!({ "from": current.user.role.as_str(), "to": role.as_str() }),
        )
        .await;

        info!(
            tenant_id = %actor.tenant_id(),
            user_id = %id,
            role = role.as_str(),
            "employee role changed"
        );
        Ok(updated)
    }

    /// Activates or deactivates a user of the active tenant.
    ///
    /// Reactivation needs a free seat.
    pub async fn set_status(&self, id: &UserId, status: UserStatus) -> AppResult<ManagedUser> {
        let actor = self.require_admin().await?;
        ensure_not_self(&actor, id, "change the status of")?;
        let current = self.find_managed(&actor, id).await?;
        if current.user.status == status {
            return Ok(current);
        }

        if status == UserStatus::Active {
            let full = self
                .store
                .read(|state| {
                    state.tenant().subscription().is_some_and(|subscription| {
                        is_seat_limit_reached(
                            state.users().active_count(actor.tenant_id()),
                            subscription,
                        )
                    })
                })
                .await;
            if full {
                return Err(AppError::Conflict(
                    "no seat is left on the current plan".to_owned(),
                ));
            }
        }

        let changes = UserChanges {
            status: Some(status),
            ..UserChanges::default()
        };
        let updated = self.push_changes(id, changes).await?;
        self.audit(
            &actor,
            status_action(status),
            id,
            json!({ "name": current.user.name }),
        )
        .await;

        info!(
            tenant_id = %actor.tenant_id(),
            user_id = %id,
            status = status.as_str(),
            "employee status changed"
        );
        Ok(updated)
    }

    /// Flips a user between active and inactive.
    pub async fn toggle_status(&self, id: &UserId) -> AppResult<ManagedUser> {
        let actor = self.require_admin().await?;
        let current = self.find_managed(&actor, id).await?;
        let next = match current.user.status {
            UserStatus::Active => UserStatus::Inactive,
            UserStatus::Inactive => UserStatus::Active,
        };

        self.set_status(id, next).await
    }

    /// Replaces a user's password with a temporary one and returns it.
    pub async fn reset_password(&self, id: &UserId) -> AppResult<String> {
        let actor = self.require_admin().await?;
        let current = self.find_managed(&actor, id).await?;

        let password = temporary_password();
        settle_session(
            &self.store,
            self.users.reset_password(id, &password).await,
        )
        .await?;
        self.store
            .dispatch(Action::AdminResetPassword {
                id: id.clone(),
                at: Utc::now(),
            })
            .await;
        self.audit(
            &actor,
            AuditAction::AdminPasswordReset,
            id,
            json!({ "name": current.user.name }),
        )
        .await;

        info!(tenant_id = %actor.tenant_id(), user_id = %id, "employee password reset");
        Ok(password)
    }

    /// Replaces the signed-in user's password and clears a pending reset.
    pub async fn change_own_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let actor = self.store.read(require_actor).await?;
        if current_password.is_empty() {
            return Err(AppError::Validation(
                "current password is required".to_owned(),
            ));
        }
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "new password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        if new_password == current_password {
            return Err(AppError::Validation(
                "new password must differ from the current one".to_owned(),
            ));
        }

        settle_session(
            &self.store,
            self.users
                .change_password(actor.user_id(), current_password, new_password)
                .await,
        )
        .await?;
        self.store
            .dispatch(Action::SelfSetPassword {
                id: actor.user_id().clone(),
                at: Utc::now(),
            })
            .await;
        self.store
            .record_audit(
                AuditEvent::new(
                    actor.tenant_id().clone(),
                    actor.user_id().clone(),
                    AuditAction::PasswordReset,
                    "auth",
                )
                .with_record(actor.user_id().as_str()),
            )
            .await;

        Ok(())
    }

    async fn find_managed(&self, actor: &Actor, id: &UserId) -> AppResult<ManagedUser> {
        self.store
            .read(|state| {
                state
                    .users()
                    .find(id)
                    .filter(|managed| &managed.user.tenant_id == actor.tenant_id())
                    .cloned()
            })
            .await
            .ok_or_else(|| AppError::NotFound(format!("user '{id}' does not exist")))
    }

    async fn push_changes(&self, id: &UserId, changes: UserChanges) -> AppResult<ManagedUser> {
        let updated = settle_session(
            &self.store,
            self.users
                .update_user(id, UpdateUserInput::from(changes))
                .await,
        )
        .await?;
        self.store.dispatch(Action::ReplaceUser(updated)).await;

        self.store
            .read(|state| state.users().find(id).cloned())
            .await
            .ok_or_else(|| AppError::NotFound(format!("user '{id}' does not exist")))
    }

    async fn audit(&self, actor: &Actor, action: AuditAction, id: &UserId, meta: serde_json::Value) {
        self.store
            .record_audit(
                AuditEvent::new(
                    actor.tenant_id().clone(),
                    actor.user_id().clone(),
                    action,
                    Module::Settings.as_str(),
                )
                .with_record(id.as_str())
                .with_meta(meta),
            )
            .await;
    }
}
