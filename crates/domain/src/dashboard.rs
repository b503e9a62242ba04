//! Dashboard metrics derived from already-scoped records.
//!
//! Every function here expects input that went through tenant and ownership
//! scoping first; none of them filter by tenant on their own.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::records::{Contact, Deal, DealStatus, Lead, Task};

/// Number of entries shown in the recent activity feed.
pub const RECENT_ACTIVITY_LIMIT: usize = 8;

/// Count of records sharing one category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// Category label.
    pub name: String,
    /// Number of records.
    pub value: usize,
}

/// Month-over-month percent change of the headline KPIs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiTrends {
    /// Booked revenue trend.
    pub revenue: f64,
    /// New leads trend.
    pub leads: f64,
    /// Active pipeline trend.
    pub pipeline: f64,
    /// Conversion rate trend.
    pub conversion: f64,
    /// Win rate trend.
    pub win_rate: f64,
    /// Average won deal size trend.
    pub avg_deal_size: f64,
}

/// Kind of record surfaced in the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// A lead was created.
    Lead,
    /// A deal was created.
    Deal,
    /// A contact was created.
    Contact,
    /// A task was created.
    Task,
}

/// One row of the recent activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityItem {
    /// Source record id.
    pub id: String,
    /// Source record kind.
    pub kind: ActivityKind,
    /// Primary label.
    pub label: String,
    /// Secondary label.
    pub sub: String,
    /// Creation timestamp of the source record.
    pub time: DateTime<Utc>,
}

/// All dashboard figures for one scoped view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Sum of deal revenue.
    pub total_revenue: f64,
    /// Sum of active deal values.
    pub pipeline_value: f64,
    /// Won deals per lead, in percent.
    pub conversion_rate: f64,
    /// Won deals per closed deal, in percent.
    pub win_rate: f64,
    /// Mean value of won deals.
    pub avg_deal_size: f64,
    /// Deals grouped by stage.
    pub deals_by_stage: Vec<CategoryCount>,
    /// Leads grouped by status.
    pub leads_by_status: Vec<CategoryCount>,
    /// Month-over-month trends.
    pub trends: KpiTrends,
    /// Newest activity across leads, deals, contacts and tasks.
    pub recent_activity: Vec<ActivityItem>,
}

impl DashboardSummary {
    /// Computes every dashboard figure at `now`.
    #[must_use]
    pub fn compute(
        leads: &[Lead],
        deals: &[Deal],
        contacts: &[Contact],
        tasks: &[Task],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            total_revenue: total_revenue(deals),
            pipeline_value: pipeline_value(deals),
            conversion_rate: conversion_rate(leads, deals),
            win_rate: win_rate(deals),
            avg_deal_size: average_deal_size(deals),
            deals_by_stage: deals_by_stage(deals),
            leads_by_status: leads_by_status(leads),
            trends: kpi_trends(leads, deals, now),
            recent_activity: recent_activity(leads, deals, contacts, tasks),
        }
    }
}

/// Sum of revenue over all deals.
#[must_use]
pub fn total_revenue(deals: &[Deal]) -> f64 {
    deals.iter().map(|deal| deal.revenue).sum()
}

/// Sum of value over deals still in the pipeline.
#[must_use]
pub fn pipeline_value(deals: &[Deal]) -> f64 {
    deals
        .iter()
        .filter(|deal| deal.status == DealStatus::Active)
        .map(|deal| deal.value)
        .sum()
}

fn won_count<'a>(deals: impl IntoIterator<Item = &'a Deal>) -> usize {
    deals
        .into_iter()
        .filter(|deal| deal.status == DealStatus::Won)
        .count()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }

    part as f64 / whole as f64 * 100.0
}

/// Won deals relative to the number of leads, in percent.
#[must_use]
pub fn conversion_rate(leads: &[Lead], deals: &[Deal]) -> f64 {
    percent(won_count(deals), leads.len())
}

/// Won deals relative to closed (won or lost) deals, in percent.
#[must_use]
pub fn win_rate(deals: &[Deal]) -> f64 {
    let closed = deals
        .iter()
        .filter(|deal| matches!(deal.status, DealStatus::Won | DealStatus::Lost))
        .count();
    percent(won_count(deals), closed)
}

/// Mean value of won deals; zero when nothing was won.
#[must_use]
pub fn average_deal_size(deals: &[Deal]) -> f64 {
    let won: Vec<&Deal> = deals
        .iter()
        .filter(|deal| deal.status == DealStatus::Won)
        .collect();
    if won.is_empty() {
        return 0.0;
    }

    won.iter().map(|deal| deal.value).sum::<f64>() / won.len() as f64
}

fn count_by<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    label: impl Fn(&T) -> &'static str,
) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for item in items {
        let name = label(item);
        match counts.iter_mut().find(|count| count.name == name) {
            Some(count) => count.value += 1,
            None => counts.push(CategoryCount {
                name: name.to_owned(),
                value: 1,
            }),
        }
    }

    counts
}

/// Deals grouped by stage in first-seen order.
#[must_use]
pub fn deals_by_stage(deals: &[Deal]) -> Vec<CategoryCount> {
    count_by(deals, |deal| deal.stage.as_str())
}

/// Leads grouped by status in first-seen order.
#[must_use]
pub fn leads_by_status(leads: &[Lead]) -> Vec<CategoryCount> {
    count_by(leads, |lead| lead.status.as_str())
}

/// Percent change from `previous` to `current`.
///
/// A zero baseline yields 100 when the current value is positive, else 0.
#[must_use]
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }

    (current - previous) / previous * 100.0
}

struct MonthSplit<'a, T> {
    current: Vec<&'a T>,
    previous: Vec<&'a T>,
}

fn split_by_month<T>(
    items: &[T],
    created_at: impl Fn(&T) -> DateTime<Utc>,
    now: DateTime<Utc>,
) -> MonthSplit<'_, T> {
    let current_month = (now.year(), now.month());
    let previous_month = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };

    let mut split = MonthSplit {
        current: Vec::new(),
        previous: Vec::new(),
    };
    for item in items {
        let created = created_at(item);
        let month = (created.year(), created.month());
        if month == current_month {
            split.current.push(item);
        } else if month == previous_month {
            split.previous.push(item);
        }
    }

    split
}

struct MonthFigures {
    revenue: f64,
    pipeline: f64,
    conversion: f64,
    win_rate: f64,
    avg_deal_size: f64,
}

fn month_figures(deals: &[&Deal], lead_total: usize) -> MonthFigures {
    let owned: Vec<Deal> = deals.iter().map(|deal| (*deal).clone()).collect();
    MonthFigures {
        revenue: total_revenue(&owned),
        pipeline: pipeline_value(&owned),
        conversion: percent(won_count(deals.iter().copied()), lead_total),
        win_rate: win_rate(&owned),
        avg_deal_size: average_deal_size(&owned),
    }
}

/// Month-over-month KPI trends relative to the calendar month of `now`.
///
/// Conversion uses the overall lead count as denominator for both months.
#[must_use]
pub fn kpi_trends(leads: &[Lead], deals: &[Deal], now: DateTime<Utc>) -> KpiTrends {
    let lead_split = split_by_month(leads, |lead| lead.created_at, now);
    let deal_split = split_by_month(deals, |deal| deal.created_at, now);

    let current = month_figures(&deal_split.current, leads.len());
    let previous = month_figures(&deal_split.previous, leads.len());

    KpiTrends {
        revenue: percent_change(current.revenue, previous.revenue),
        leads: percent_change(
            lead_split.current.len() as f64,
            lead_split.previous.len() as f64,
        ),
        pipeline: percent_change(current.pipeline, previous.pipeline),
        conversion: percent_change(current.conversion, previous.conversion),
        win_rate: percent_change(current.win_rate, previous.win_rate),
        avg_deal_size: percent_change(current.avg_deal_size, previous.avg_deal_size),
    }
}

/// The newest [`RECENT_ACTIVITY_LIMIT`] records across the four resources.
#[must_use]
pub fn recent_activity(
    leads: &[Lead],
    deals: &[Deal],
    contacts: &[Contact],
    tasks: &[Task],
) -> Vec<ActivityItem> {
    let mut items: Vec<ActivityItem> = Vec::with_capacity(
        leads.len() + deals.len() + contacts.len() + tasks.len(),
    );

    items.extend(leads.iter().map(|lead| ActivityItem {
        id: lead.id.clone(),
        kind: ActivityKind::Lead,
        label: lead.name.clone(),
        sub: format!("{} · {}", lead.company, lead.status.as_str()),
        time: lead.created_at,
    }));
    items.extend(deals.iter().map(|deal| ActivityItem {
        id: deal.id.clone(),
        kind: ActivityKind::Deal,
        label: deal.title.clone(),
        sub: format!("Stage: {}", deal.stage.as_str()),
        time: deal.created_at,
    }));
    items.extend(contacts.iter().map(|contact| ActivityItem {
        id: contact.id.clone(),
        kind: ActivityKind::Contact,
        label: contact.full_name(),
        sub: contact.company.clone(),
        time: contact.created_at,
    }));
    items.extend(tasks.iter().map(|task| ActivityItem {
        id: task.id.clone(),
        kind: ActivityKind::Task,
        label: task.title.clone(),
        sub: format!("Priority: {}", task.priority.as_str()),
        time: task.created_at,
    }));

    // stable sort keeps source order for equal timestamps
    items.sort_by(|left, right| right.time.cmp(&left.time));
    items.truncate(RECENT_ACTIVITY_LIMIT);
    items
}
