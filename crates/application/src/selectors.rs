//! Scoped, searchable and memoized views over the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use orbit_core::{TenantId, UserId};
use orbit_domain::{Actor, Contact, DashboardSummary, Deal, DomainRecord, Lead, Role, Task};
use serde::Serialize;

use crate::scope::{scope_records, scoped_clone};
use crate::store::{CrmState, ResourceState};

/// Scopes records to the actor, then keeps those matching `query`.
///
/// The query is compared case-insensitively as typed; surrounding spaces take
/// part in the match. A blank query keeps every scoped record.
#[must_use]
pub fn select_visible<'a, R: DomainRecord>(
    records: &'a [R],
    actor: &Actor,
    query: &str,
) -> Vec<&'a R> {
    let scoped = scope_records(records, actor);
    if query.trim().is_empty() {
        return scoped;
    }

    let needle = query.to_lowercase();
    scoped
        .into_iter()
        .filter(|record| record.matches_search(&needle))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectionKey {
    revision: u64,
    tenant_id: TenantId,
    user_id: UserId,
    role: Role,
    query: String,
}

/// Memoized [`select_visible`] over one resource collection.
///
/// The cached result is reused until the collection revision, the actor
/// scope or the query changes.
#[derive(Debug)]
pub struct ScopedSelector<R> {
    cached: Option<(SelectionKey, Arc<Vec<R>>)>,
    computations: u64,
}

impl<R> Default for ScopedSelector<R> {
    fn default() -> Self {
        Self {
            cached: None,
            computations: 0,
        }
    }
}

impl<R: DomainRecord> ScopedSelector<R> {
    /// Creates an empty selector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the visible records of a collection using its own query.
    pub fn select(&mut self, collection: &ResourceState<R>, actor: &Actor) -> Arc<Vec<R>> {
        self.select_with_query(collection, actor, collection.search_query())
    }

    /// Returns the visible records of a collection for an explicit query.
    pub fn select_with_query(
        &mut self,
        collection: &ResourceState<R>,
        actor: &Actor,
        query: &str,
    ) -> Arc<Vec<R>> {
        let key = SelectionKey {
            revision: collection.revision(),
            tenant_id: actor.tenant_id().clone(),
            user_id: actor.user_id().clone(),
            role: actor.role(),
            query: query.to_lowercase(),
        };

        if let Some((cached_key, records)) = &self.cached
            && *cached_key == key
        {
            return Arc::clone(records);
        }

        let records: Arc<Vec<R>> = Arc::new(
            select_visible(collection.items(), actor, &key.query)
                .into_iter()
                .cloned()
                .collect(),
        );
        self.computations = self.computations.wrapping_add(1);
        self.cached = Some((key, Arc::clone(&records)));
        records
    }

    /// Returns how many times the selection was recomputed.
    #[must_use]
    pub fn computations(&self) -> u64 {
        self.computations
    }
}

/// One page of a visible collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView<R> {
    /// Records on the page.
    pub items: Vec<R>,
    /// Zero-based page index.
    pub page: usize,
    /// Page size.
    pub rows_per_page: usize,
    /// Number of visible records across all pages.
    pub total: usize,
}

/// Cuts one page out of `records`; an out-of-range page is empty.
#[must_use]
pub fn paginate<R: Clone>(records: &[R], page: usize, rows_per_page: usize) -> PageView<R> {
    let rows_per_page = rows_per_page.max(1);
    let items = records
        .iter()
        .skip(page.saturating_mul(rows_per_page))
        .take(rows_per_page)
        .cloned()
        .collect();

    PageView {
        items,
        page,
        rows_per_page,
        total: records.len(),
    }
}

/// Computes dashboard figures from the actor's scoped records.
#[must_use]
pub fn select_dashboard(state: &CrmState, actor: &Actor, now: DateTime<Utc>) -> DashboardSummary {
    let leads = scoped_clone(state.resource::<Lead>().items(), actor);
    let deals = scoped_clone(state.resource::<Deal>().items(), actor);
    let contacts = scoped_clone(state.resource::<Contact>().items(), actor);
    let tasks = scoped_clone(state.resource::<Task>().items(), actor);

    DashboardSummary::compute(&leads, &deals, &contacts, &tasks, now)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use orbit_core::{TenantId, UserId};
    use orbit_domain::{Actor, Deal, DealStatus, Lead, Role};

    use super::{ScopedSelector, paginate, select_dashboard, select_visible};
    use crate::store::{CrmState, ResourceAction, ResourceState};
    use crate::test_support::{deal, lead};

    fn actor(user: &str, tenant: &str, role: Role) -> Actor {
        Actor::new(UserId::new(user), TenantId::new(tenant), role)
    }

    fn seeded_leads() -> Vec<Lead> {
        vec![
            lead("l1", "t1", "a", "Acme Widgets"),
            lead("l2", "t1", "b", "Acme Tools"),
            lead("l3", "t2", "a", "Acme Remote"),
            lead("l4", "t1", "a", "Globex"),
        ]
    }

    fn ids(records: &[&Lead]) -> Vec<String> {
        records.iter().map(|lead| lead.id.clone()).collect()
    }

    #[test]
    fn composed_selection_for_two_users() {
        let leads = seeded_leads();

        let sales_a = select_visible(&leads, &actor("a", "t1", Role::Sales), "acme");
        assert_eq!(ids(&sales_a), vec!["l1"]);

        let sales_b = select_visible(&leads, &actor("b", "t1", Role::Sales), "ACME");
        assert_eq!(ids(&sales_b), vec!["l2"]);

        let manager = select_visible(&leads, &actor("a", "t1", Role::Manager), "Acme");
        assert_eq!(ids(&manager), vec!["l1", "l2"]);
    }

    #[test]
    fn query_whitespace_takes_part_in_the_match() {
        let leads = seeded_leads();
        let admin = actor("a", "t1", Role::Admin);

        assert!(select_visible(&leads, &admin, " acme").is_empty());
        assert_eq!(ids(&select_visible(&leads, &admin, "acme w")), vec!["l1"]);
    }

    #[test]
    fn blank_query_keeps_every_scoped_record() {
        let leads = seeded_leads();
        let visible = select_visible(&leads, &actor("a", "t1", Role::Admin), "   ");
        assert_eq!(ids(&visible), vec!["l1", "l2", "l4"]);
    }

    #[test]
    fn selector_recomputes_only_when_inputs_change() {
        let mut state = CrmState::default();
        state.apply_resource(ResourceAction::Set(seeded_leads()));
        let mut selector = ScopedSelector::<Lead>::new();
        let sales = actor("a", "t1", Role::Sales);

        let first = selector.select(state.resource::<Lead>(), &sales);
        let second = selector.select(state.resource::<Lead>(), &sales);
        assert_eq!(selector.computations(), 1);
        assert_eq!(first, second);

        state.apply_resource(ResourceAction::<Lead>::SetSearch("globex".to_owned()));
        let searched = selector.select(state.resource::<Lead>(), &sales);
        assert_eq!(selector.computations(), 2);
        assert_eq!(searched.len(), 1);

        state.apply_resource(ResourceAction::Add(lead("l5", "t1", "a", "Globex East")));
        let grown = selector.select(state.resource::<Lead>(), &sales);
        assert_eq!(selector.computations(), 3);
        assert_eq!(grown.len(), 2);

        let _ = selector.select(state.resource::<Lead>(), &actor("a", "t1", Role::Manager));
        assert_eq!(selector.computations(), 4);
    }

    #[test]
    fn selector_recomputes_for_another_collection_at_the_same_revision() {
        let mut first = ResourceState::<Lead>::default();
        first.apply(ResourceAction::Set(vec![lead("l1", "t1", "a", "Acme")]));
        let mut second = ResourceState::<Lead>::default();
        second.apply(ResourceAction::Set(vec![lead("l9", "t1", "a", "Acme")]));
        let mut selector = ScopedSelector::<Lead>::new();
        let admin = actor("a", "t1", Role::Admin);

        let from_first = selector.select(&first, &admin);
        let from_second = selector.select(&second, &admin);

        assert_eq!(from_first[0].id, "l1");
        assert_eq!(from_second[0].id, "l9");
        assert_eq!(selector.computations(), 2);
    }

    #[test]
    fn pagination_cuts_pages() {
        let values: Vec<u32> = (0..23).collect();
        let page = paginate(&values, 2, 10);
        assert_eq!(page.items, vec![20, 21, 22]);
        assert_eq!(page.total, 23);
        assert!(paginate(&values, 5, 10).items.is_empty());
    }

    #[test]
    fn dashboard_uses_scoped_records_only() {
        let mut state = CrmState::default();
        state.apply_resource(ResourceAction::Set(vec![
            deal("d1", "t1", "a", DealStatus::Won, 100.0),
            deal("d2", "t1", "b", DealStatus::Won, 900.0),
            deal("d3", "t2", "a", DealStatus::Won, 5000.0),
        ]));
        state.apply_resource(ResourceAction::<Deal>::SetSearch("ignored".to_owned()));

        let sales = select_dashboard(&state, &actor("a", "t1", Role::Sales), Utc::now());
        assert_eq!(sales.avg_deal_size, 100.0);

        let manager = select_dashboard(&state, &actor("a", "t1", Role::Manager), Utc::now());
        assert_eq!(manager.avg_deal_size, 500.0);
    }
}
