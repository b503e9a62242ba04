//! Tenant and ownership scoping of record collections.

use orbit_core::{TenantId, UserId};
use orbit_domain::{Actor, Owned, Role, TenantScoped};

/// Keeps records that belong to `tenant_id`, preserving order.
///
/// A blank tenant id never matches.
#[must_use]
pub fn filter_by_tenant<'a, R, I>(records: I, tenant_id: &TenantId) -> Vec<&'a R>
where
    R: TenantScoped + 'a,
    I: IntoIterator<Item = &'a R>,
{
    if tenant_id.is_blank() {
        return Vec::new();
    }

    records
        .into_iter()
        .filter(|record| record.tenant_id() == tenant_id)
        .collect()
}

/// Keeps records created by `user_id` when the role is ownership scoped.
///
/// Other roles get the input back unchanged.
#[must_use]
pub fn filter_by_ownership<'a, R, I>(records: I, user_id: &UserId, role: Role) -> Vec<&'a R>
where
    R: Owned + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let records = records.into_iter();
    if !role.is_ownership_scoped() {
        return records.collect();
    }

    records
        .filter(|record| record.created_by() == user_id)
        .collect()
}

/// Applies the tenant filter, then the ownership filter, for an actor.
#[must_use]
pub fn scope_records<'a, R>(records: &'a [R], actor: &Actor) -> Vec<&'a R>
where
    R: TenantScoped + Owned,
{
    let tenant_scoped = filter_by_tenant(records, actor.tenant_id());
    filter_by_ownership(tenant_scoped, actor.user_id(), actor.role())
}

/// Clones the scoped view of `records` for an actor.
#[must_use]
pub fn scoped_clone<R>(records: &[R], actor: &Actor) -> Vec<R>
where
    R: TenantScoped + Owned + Clone,
{
    scope_records(records, actor).into_iter().cloned().collect()
}
