use std::str::FromStr;

use orbit_core::{AppError, TenantId, UserId};
use serde::{Deserialize, Serialize};

/// Closed set of roles a tenant user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full access to every module, field and action.
    Admin,
    /// Team lead with write access to the core sales modules.
    Manager,
    /// Least-privileged tier; only sees records it created.
    Sales,
}

impl Role {
    /// Returns the stable transport value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Sales => "SALES",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[Role::Admin, Role::Manager, Role::Sales];

        ALL
    }

    /// Returns whether record visibility is restricted to owned records.
    #[must_use]
    pub fn is_ownership_scoped(&self) -> bool {
        matches!(self, Self::Sales)
    }

    /// Returns the static permission set granted to the role.
    #[must_use]
    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            Self::Admin => &[WILDCARD_PERMISSION],
            Self::Manager => &[
                "dashboard:read",
                "leads:read",
                "leads:write",
                "contacts:read",
                "contacts:write",
                "accounts:read",
                "accounts:write",
                "deals:read",
                "deals:write",
                "activities:read",
                "activities:write",
                "campaigns:read",
                "reports:read",
                "settings:read",
            ],
            Self::Sales => &[
                "dashboard:read",
                "leads:read",
                "leads:write:own",
                "contacts:read",
                "contacts:write:own",
                "deals:read",
                "deals:write:own",
                "activities:read",
                "activities:write:own",
            ],
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ADMIN" => Ok(Self::Admin),
            "MANAGER" => Ok(Self::Manager),
            "SALES" => Ok(Self::Sales),
            _ => Err(AppError::Validation(format!("unknown role value '{value}'"))),
        }
    }
}

/// Permission entry that grants every permission string.
pub const WILDCARD_PERMISSION: &str = "*";

/// Returns whether the role holds the `"<module>:<action>[:own]"` permission.
///
/// Matching is exact; a `:own` grant does not satisfy the unscoped string and
/// the reverse does not hold either. Unknown strings resolve to `false` unless
/// the role holds the wildcard.
#[must_use]
pub fn has_permission(permission: &str, role: Role) -> bool {
    let granted = role.permissions();
    granted.contains(&WILDCARD_PERMISSION) || granted.contains(&permission)
}

/// Coarse action half of a permission string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionAction {
    /// Listing and viewing records.
    Read,
    /// Creating, updating and deleting records.
    Write,
}

impl PermissionAction {
    /// Returns the stable permission segment for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Builds the unscoped permission string for a module action.
#[must_use]
pub fn permission_key(module: &str, action: PermissionAction) -> String {
    format!("{module}:{}", action.as_str())
}

/// Builds the self-scoped (`:own`) permission string for a module action.
#[must_use]
pub fn own_permission_key(module: &str, action: PermissionAction) -> String {
    format!("{module}:{}:own", action.as_str())
}

/// Field-level visibility table: `(module, [(field, allowed roles)])`.
///
/// Modules and fields that are not listed are visible to every role.
const FIELD_ACCESS_POLICY: &[(&str, &[(&str, &[Role])])] = &[
    (
        "deals",
        &[
            ("margin", &[Role::Admin, Role::Manager]),
            ("revenue", &[Role::Admin, Role::Manager]),
            ("cost", &[Role::Admin]),
            ("value", &[Role::Admin, Role::Manager, Role::Sales]),
            ("title", &[Role::Admin, Role::Manager, Role::Sales]),
            ("stage", &[Role::Admin, Role::Manager, Role::Sales]),
            ("probability", &[Role::Admin, Role::Manager]),
            ("closeDate", &[Role::Admin, Role::Manager, Role::Sales]),
        ],
    ),
    (
        "contacts",
        &[
            ("phone", &[Role::Admin, Role::Manager, Role::Sales]),
            ("email", &[Role::Admin, Role::Manager, Role::Sales]),
            ("company", &[Role::Admin, Role::Manager, Role::Sales]),
        ],
    ),
    (
        "leads",
        &[
            ("score", &[Role::Admin, Role::Manager]),
            ("source", &[Role::Admin, Role::Manager, Role::Sales]),
            ("status", &[Role::Admin, Role::Manager, Role::Sales]),
        ],
    ),
    (
        "settings",
        &[
            ("billing", &[Role::Admin]),
            ("users", &[Role::Admin]),
            ("general", &[Role::Admin, Role::Manager]),
        ],
    ),
    (
        "reports",
        &[
            ("revenue", &[Role::Admin, Role::Manager]),
            ("margin", &[Role::Admin]),
            ("forecast", &[Role::Admin, Role::Manager]),
        ],
    ),
    (
        "forecasting",
        &[
            ("pipeline", &[Role::Admin, Role::Manager]),
            ("weighted", &[Role::Admin, Role::Manager]),
            ("wonRevenue", &[Role::Admin, Role::Manager]),
        ],
    ),
    (
        "accounts",
        &[
            ("revenue", &[Role::Admin, Role::Manager]),
            ("employees", &[Role::Admin, Role::Manager, Role::Sales]),
        ],
    ),
    (
        "campaigns",
        &[
            ("budget", &[Role::Admin, Role::Manager]),
            ("spent", &[Role::Admin, Role::Manager]),
        ],
    ),
    (
        "invoices",
        &[
            ("amount", &[Role::Admin, Role::Manager]),
            ("status", &[Role::Admin, Role::Manager]),
        ],
    ),
    (
        "orders",
        &[
            ("total", &[Role::Admin, Role::Manager]),
            ("status", &[Role::Admin, Role::Manager]),
        ],
    ),
    (
        "products",
        &[
            ("price", &[Role::Admin, Role::Manager]),
            ("category", &[Role::Admin, Role::Manager]),
        ],
    ),
    (
        "quotes",
        &[
            ("amount", &[Role::Admin, Role::Manager]),
            ("validUntil", &[Role::Admin, Role::Manager]),
        ],
    ),
];

/// Returns whether a field value may be rendered for the role.
///
/// Lookup is default-allow: ADMIN always sees every field, and a module or
/// field missing from the policy table is visible to all roles. Only a listed
/// field whose allowed set omits the role is hidden.
#[must_use]
pub fn can_see_field(module: &str, field: &str, role: Role) -> bool {
    if role == Role::Admin {
        return true;
    }

    let Some((_, fields)) = FIELD_ACCESS_POLICY
        .iter()
        .find(|(policy_module, _)| *policy_module == module)
    else {
        return true;
    };

    let Some((_, allowed_roles)) = fields
        .iter()
        .find(|(policy_field, _)| *policy_field == field)
    else {
        return true;
    };

    allowed_roles.contains(&role)
}

/// Authenticated user acting inside one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    user_id: UserId,
    tenant_id: TenantId,
    role: Role,
}

impl Actor {
    /// Creates an actor from identity and tenancy data.
    #[must_use]
    pub fn new(user_id: UserId, tenant_id: TenantId, role: Role) -> Self {
        Self {
            user_id,
            tenant_id,
            role,
        }
    }

    /// Returns the acting user id.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the tenant the actor is working in.
    #[must_use]
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns the actor role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns whether the actor holds the permission string.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        has_permission(permission, self.role)
    }

    /// Returns whether the actor may see a field of a module.
    #[must_use]
    pub fn can_see_field(&self, module: &str, field: &str) -> bool {
        can_see_field(module, field, self.role)
    }
}

/// Stable audit actions recorded by client use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A user signed in.
    Login,
    /// A user signed out.
    Logout,
    /// A new organization signed up.
    Signup,
    /// A domain record was created.
    Create,
    /// A domain record was updated.
    Update,
    /// A domain record was deleted.
    Delete,
    /// The active tenant changed.
    TenantSwitch,
    /// A user role changed.
    RoleChange,
    /// A module outside the subscription was requested.
    PlanAccessAttempt,
    /// An employee account was created.
    UserCreated,
    /// An employee account was deactivated.
    UserDeactivated,
    /// An employee account was reactivated.
    UserReactivated,
    /// A user changed their own password.
    PasswordReset,
    /// An administrator reset a user's password.
    AdminPasswordReset,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::Logout => "LOGOUT",
            Self::Signup => "SIGNUP",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::TenantSwitch => "TENANT_SWITCH",
            Self::RoleChange => "ROLE_CHANGE",
            Self::PlanAccessAttempt => "PLAN_ACCESS_ATTEMPT",
            Self::UserCreated => "USER_CREATED",
            Self::UserDeactivated => "USER_DEACTIVATED",
            Self::UserReactivated => "USER_REACTIVATED",
            Self::PasswordReset => "PASSWORD_RESET",
            Self::AdminPasswordReset => "ADMIN_PASSWORD_RESET",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use proptest::prelude::*;

    use super::{
        PermissionAction, Role, can_see_field, has_permission, own_permission_key, permission_key,
    };

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::Manager), Just(Role::Sales)]
    }

    #[test]
    fn role_roundtrip_storage_value() {
        for role in Role::all() {
            let restored = Role::from_str(role.as_str());
            assert_eq!(restored.ok(), Some(*role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("OWNER").is_err());
    }

    #[test]
    fn admin_wildcard_grants_everything() {
        assert!(has_permission("invoices:write", Role::Admin));
        assert!(has_permission("anything-at-all", Role::Admin));
    }

    #[test]
    fn own_scoped_grant_does_not_satisfy_unscoped_check() {
        assert!(!has_permission("deals:write", Role::Sales));
        assert!(has_permission("deals:write:own", Role::Sales));
        assert!(has_permission("deals:write", Role::Manager));
        assert!(!has_permission("campaigns:write", Role::Manager));
    }

    #[test]
    fn permission_keys_follow_module_action_shape() {
        assert_eq!(permission_key("leads", PermissionAction::Read), "leads:read");
        assert_eq!(
            own_permission_key("leads", PermissionAction::Write),
            "leads:write:own"
        );
    }

    #[test]
    fn listed_field_hides_from_unlisted_role() {
        assert!(!can_see_field("deals", "margin", Role::Sales));
        assert!(can_see_field("deals", "margin", Role::Manager));
        assert!(!can_see_field("deals", "cost", Role::Manager));
        assert!(!can_see_field("settings", "billing", Role::Manager));
    }

    #[test]
    fn unlisted_module_and_field_default_to_visible() {
        assert!(can_see_field("tasks", "priority", Role::Sales));
        assert!(can_see_field("deals", "notes", Role::Sales));
    }

    proptest! {
        #[test]
        fn admin_sees_every_field(module in ".{0,16}", field in ".{0,16}") {
            prop_assert!(can_see_field(&module, &field, Role::Admin));
        }

        #[test]
        fn field_policy_is_total(module in "[a-zA-Z]{0,12}", field in "[a-zA-Z]{0,12}", role in any_role()) {
            let first = can_see_field(&module, &field, role);
            let second = can_see_field(&module, &field, role);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn unknown_modules_are_visible_for_all_roles(field in "[a-z]{1,10}", role in any_role()) {
            let module = format!("custom_{field}");
            prop_assert!(can_see_field(&module, &field, role));
        }
    }
}
