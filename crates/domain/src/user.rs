//! Tenant user types and validation rules.

use chrono::{DateTime, Utc};
use orbit_core::{AppError, AppResult, TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::security::Role;

/// Account status of a tenant user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// User can sign in and occupies a seat.
    Active,
    /// User is deactivated and frees its seat.
    Inactive,
}

impl UserStatus {
    /// Returns the stable transport value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// User account belonging to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Full name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Role deciding permission and field visibility.
    pub role: Role,
    /// Account status.
    pub status: UserStatus,
    /// Avatar location.
    #[serde(default)]
    pub avatar_url: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns whether the user occupies a seat.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// User row as tracked by the settings screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedUser {
    /// Backend representation of the user.
    #[serde(flatten)]
    pub user: User,
    /// Whether the user must replace a temporary password at next sign-in.
    #[serde(default)]
    pub must_reset_password: bool,
}

impl ManagedUser {
    /// Wraps a backend user with no pending password reset.
    #[must_use]
    pub fn new(user: User) -> Self {
        Self {
            user,
            must_reset_password: false,
        }
    }
}

/// Validated, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: no whitespace, exactly one `@`,
    /// non-empty local part, and a domain containing at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address is required".to_owned(),
            ));
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(
                "email address must not contain whitespace".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain '@'".to_owned(),
            ));
        };

        if local.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(
                "enter a valid email address".to_owned(),
            ));
        }

        let valid_domain = domain
            .split_once('.')
            .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty());
        if !valid_domain {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::EmailAddress;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let email = EmailAddress::new("  Jane.Doe@Example.COM ");
        assert_eq!(
            email.map(String::from).ok().as_deref(),
            Some("jane.doe@example.com")
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for value in ["", "jane", "@example.com", "jane@example", "jane@.com", "a b@c.de", "a@b@c.de"] {
            assert!(EmailAddress::new(value).is_err(), "{value} should be rejected");
        }
    }
}
