use std::sync::Arc;

use orbit_core::{AppError, AppResult, NonEmptyString, UserId};
use orbit_domain::{
    Actor, AuditAction, EmailAddress, ManagedUser, Module, PermissionAction, Role, UserStatus,
    is_seat_limit_reached, permission_key,
};
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::access_service::{ensure_module_access, require_permission};
use crate::ports::{CreateUserInput, UpdateUserInput, UserGateway};
use crate::session_service::settle_session;
use crate::store::{Action, AuditEvent, Store, UserChanges};

mod management;


/// Phase of the add-employee flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingPhase {
    /// Ready for a new attempt.
    Idle,
    /// Input is being checked.
    Validating,
    /// The seat limit is reached; stays until the subscription changes.
    Blocked {
        /// Subscription that was full.
        subscription_id: String,
        /// Seat limit of that subscription.
        max_users: u32,
    },
    /// The create request is in flight.
    Submitting,
}

/// Employee to add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Granted role.
    pub role: Role,
}

/// Result of an add-employee attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum OnboardingOutcome {
    /// The account was created.
    Created {
        /// Created user, flagged to reset the password.
        user: ManagedUser,
        /// Temporary password to hand over.
        temporary_password: String,
    },
    /// No seat is left on the plan; nothing was sent to the backend.
    Blocked {
        /// Active users counted.
        active_users: usize,
        /// Seat limit of the plan.
        max_users: u32,
    },
}

/// Adds employees and manages their role, status and password.
pub struct EmployeeService {
    users: Arc<dyn UserGateway>,
    store: Store,
    phase: Mutex<OnboardingPhase>,
}

impl EmployeeService {
    /// Creates an employee service.
    #[must_use]
    pub fn new(users: Arc<dyn UserGateway>, store: Store) -> Self {
        Self {
            users,
            store,
            phase: Mutex::new(OnboardingPhase::Idle),
        }
    }

    /// Returns the current onboarding phase.
    pub async fn phase(&self) -> OnboardingPhase {
        self.phase.lock().await.clone()
    }

    /// Runs the add-employee flow.
    ///
    /// Validation and backend failures return `Err` and leave the flow idle.
    /// A full plan returns [`OnboardingOutcome::Blocked`] without a request;
    /// the flow stays blocked until the subscription changes.
    pub async fn add_employee(&self, employee: NewEmployee) -> AppResult<OnboardingOutcome> {
        let actor = self.require_admin().await?;
        let mut phase = self.phase.lock().await;

        let (subscription, active_users, email_taken) = self
            .store
            .read(|state| {
                let email = employee.email.trim().to_lowercase();
                (
                    state.tenant().subscription().cloned(),
                    state.users().active_count(actor.tenant_id()),
                    state.users().email_taken(actor.tenant_id(), &email),
                )
            })
            .await;
        let Some(subscription) = subscription else {
            return Err(AppError::Forbidden(
                "the active tenant has no subscription".to_owned(),
            ));
        };
        let max_users = subscription.max_users;

        if let OnboardingPhase::Blocked {
            subscription_id: blocked_id,
            max_users: blocked_max,
        } = &*phase
            && *blocked_id == subscription.id
            && *blocked_max == max_users
        {
            return Ok(OnboardingOutcome::Blocked {
                active_users,
                max_users,
            });
        }

        *phase = OnboardingPhase::Validating;
        if is_seat_limit_reached(active_users, &subscription) {
            *phase = OnboardingPhase::Blocked {
                subscription_id: subscription.id,
                max_users,
            };
            info!(
                tenant_id = %actor.tenant_id(),
                active_users,
                max_users,
                "employee onboarding blocked by seat limit"
            );
            return Ok(OnboardingOutcome::Blocked {
                active_users,
                max_users,
            });
        }

        let validated = validate_employee(&employee, email_taken);
        let (name, email) = match validated {
            Ok(values) => values,
            Err(error) => {
                *phase = OnboardingPhase::Idle;
                return Err(error);
            }
        };

        *phase = OnboardingPhase::Submitting;
        let temporary_password = temporary_password();
        let created = settle_session(
            &self.store,
            self.users
                .create_user(CreateUserInput {
                    tenant_id: actor.tenant_id().clone(),
                    name,
                    email,
                    role: employee.role,
                    password: temporary_password.clone(),
                    must_reset_password: true,
                })
                .await,
        )
        .await;
        *phase = OnboardingPhase::Idle;
        let user = created?;

        let managed = ManagedUser {
            user,
            must_reset_password: true,
        };
        self.store.dispatch(Action::AddUser(managed.clone())).await;
        self.store
            .record_audit(
                AuditEvent::new(
                    actor.tenant_id().clone(),
                    actor.user_id().clone(),
                    AuditAction::UserCreated,
                    Module::Settings.as_str(),
                )
                .with_record(managed.user.id.as_str())
                .with_meta(json!({
                    "name": managed.user.name,
                    "email": managed.user.email,
                    "role": managed.user.role.as_str(),
                })),
            )
            .await;

        info!(
            tenant_id = %actor.tenant_id(),
            user_id = %managed.user.id,
            role = managed.user.role.as_str(),
            "employee added"
        );
        Ok(OnboardingOutcome::Created {
            user: managed,
            temporary_password,
        })
    }

    /// Returns whether the active tenant has no seat left.
    pub async fn seat_limit_reached(&self) -> AppResult<bool> {
        let actor = self.require_admin().await?;
        Ok(self
            .store
            .read(|state| {
                state.tenant().subscription().is_some_and(|subscription| {
                    is_seat_limit_reached(
                        state.users().active_count(actor.tenant_id()),
                        subscription,
                    )
                })
            })
            .await)
    }

    async fn require_admin(&self) -> AppResult<Actor> {
        let actor = ensure_module_access(&self.store, Module::Settings).await?;
        require_permission(&actor, &permission_key("users", PermissionAction::Write))?;
        Ok(actor)
    }
}

fn validate_employee(employee: &NewEmployee, email_taken: bool) -> AppResult<(String, String)> {
    let name = NonEmptyString::new(employee.name.as_str())
        .map_err(|_| AppError::Validation("full name is required".to_owned()))?;
    let email = EmailAddress::new(employee.email.as_str())?;
    if email_taken {
        return Err(AppError::Conflict(
            "an account with this email already exists".to_owned(),
        ));
    }

    Ok((name.into(), email.into()))
}

const PASSWORD_ADJECTIVES: &[&str] = &[
    "Blue", "Fast", "Bold", "Cool", "Wise", "Keen", "Sharp", "Bright",
];
const PASSWORD_NOUNS: &[&str] = &[
    "Tiger", "Eagle", "Storm", "River", "Comet", "Spark", "Cloud", "Rock",
];

/// Builds a readable temporary password such as `BoldComet482!`.
pub(crate) fn temporary_password() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    let adjective = PASSWORD_ADJECTIVES[usize::from(bytes[0]) % PASSWORD_ADJECTIVES.len()];
    let noun = PASSWORD_NOUNS[usize::from(bytes[1]) % PASSWORD_NOUNS.len()];
    let number = 100 + u16::from_be_bytes([bytes[2], bytes[3]]) % 900;
    format!("{adjective}{noun}{number}!")
}

impl From<UserChanges> for UpdateUserInput {
    fn from(changes: UserChanges) -> Self {
        Self {
            name: changes.name,
            role: changes.role,
            status: changes.status,
        }
    }
}

fn status_action(status: UserStatus) -> AuditAction {
    match status {
        UserStatus::Active => AuditAction::UserReactivated,
        UserStatus::Inactive => AuditAction::UserDeactivated,
    }
}

fn ensure_not_self(actor: &Actor, id: &UserId, what: &str) -> AppResult<()> {
    if actor.user_id() == id {
        return Err(AppError::Validation(format!("you cannot {what} your own account")));
    }

    Ok(())
}
