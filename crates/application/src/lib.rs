//! Application services and ports.
//!
//! Services read and mutate a shared [`Store`] and reach the backend only
//! through the gateway traits in [`ports`].

#![forbid(unsafe_code)]

mod access_service;
mod employee_service;
pub mod ports;
mod resource_service;
mod scope;
mod selectors;
mod session_service;
mod store;
mod workspace_loader;

#[cfg(test)]
mod test_support;

pub use access_service::AccessService;
pub use employee_service::{EmployeeService, NewEmployee, OnboardingOutcome, OnboardingPhase};
pub use ports::{
    AuthGateway, CreateUserInput, CrmGateway, LoginResponse, ResourceGateway, TenantGateway,
    TenantUpdate, TokenStore, UpdateUserInput, UserGateway,
};
pub use resource_service::ResourceService;
pub use scope::{filter_by_ownership, filter_by_tenant, scope_records, scoped_clone};
pub use selectors::{PageView, ScopedSelector, paginate, select_dashboard, select_visible};
pub use session_service::SessionService;
pub use store::{
    Action, AuditEntry, AuditEvent, AuditLog, AuthState, CrmState, DEFAULT_ROWS_PER_PAGE,
    ResourceAction, ResourceState, Store, StoredRecord, TenantState, UserChanges, UsersState,
};
pub use workspace_loader::{CollectionFailure, LoadReport, WorkspaceGateways, WorkspaceLoader};
