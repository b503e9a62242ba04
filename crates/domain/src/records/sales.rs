use chrono::{DateTime, Utc};
use orbit_core::{TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::module::Module;

/// Qualification status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Not yet contacted.
    New,
    /// First contact made.
    Contacted,
    /// Confirmed as a real opportunity.
    Qualified,
    /// Ruled out.
    Disqualified,
}

impl LeadStatus {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Disqualified => "disqualified",
        }
    }
}

/// Channel a lead arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    /// Website form.
    Web,
    /// Referred by an existing contact.
    Referral,
    /// Inbound email.
    Email,
    /// Social network.
    Social,
    /// Anything else.
    Other,
}

/// Prospective customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Record identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Full name.
    pub name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
    /// Company name.
    #[serde(default)]
    pub company: String,
    /// Qualification status.
    pub status: LeadStatus,
    /// Acquisition channel.
    pub source: LeadSource,
    /// Lead score.
    #[serde(default)]
    pub score: u32,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

domain_record!(Lead, Module::Leads, "leads", |lead| [
    lead.name.as_str(),
    lead.email.as_str(),
    lead.company.as_str(),
]);

/// Person at a customer organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Record identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
    /// Company name.
    #[serde(default)]
    pub company: String,
    /// Linked account.
    #[serde(default)]
    pub account_id: String,
    /// Free-form status label.
    #[serde(default)]
    pub status: String,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Returns `"first last"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

domain_record!(Contact, Module::Contacts, "contacts", |contact| [
    contact.full_name(),
    contact.email.as_str(),
]);

/// Customer organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Record identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Organization name.
    pub name: String,
    /// Industry label.
    #[serde(default)]
    pub industry: String,
    /// Website.
    #[serde(default)]
    pub website: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Annual revenue.
    #[serde(default)]
    pub revenue: f64,
    /// Head count.
    #[serde(default)]
    pub employees: u32,
    /// Free-form status label.
    #[serde(default)]
    pub status: String,
    /// Account owner.
    #[serde(default)]
    pub owner_id: String,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

domain_record!(Account, Module::Accounts, "accounts", |account| [
    account.name.as_str(),
    account.industry.as_str(),
]);

/// Pipeline stage of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    /// Needs are being explored.
    Discovery,
    /// A proposal was sent.
    Proposal,
    /// Terms are being negotiated.
    Negotiation,
    /// Closed successfully.
    ClosedWon,
    /// Closed without a sale.
    ClosedLost,
}

impl DealStage {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Proposal => "proposal",
            Self::Negotiation => "negotiation",
            Self::ClosedWon => "closed_won",
            Self::ClosedLost => "closed_lost",
        }
    }
}

/// Outcome status of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    /// Still in the pipeline.
    Active,
    /// Closed and won.
    Won,
    /// Closed and lost.
    Lost,
}

/// Sales opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    /// Record identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Deal title.
    pub title: String,
    /// Primary contact.
    #[serde(default)]
    pub contact_id: String,
    /// Customer account.
    #[serde(default)]
    pub account_id: String,
    /// Pipeline stage.
    pub stage: DealStage,
    /// Expected deal value.
    #[serde(default)]
    pub value: f64,
    /// Margin.
    #[serde(default)]
    pub margin: f64,
    /// Cost.
    #[serde(default)]
    pub cost: f64,
    /// Booked revenue.
    #[serde(default)]
    pub revenue: f64,
    /// Win probability in percent.
    #[serde(default)]
    pub probability: f64,
    /// Expected close date.
    #[serde(default)]
    pub close_date: String,
    /// Outcome status.
    pub status: DealStatus,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

domain_record!(Deal, Module::Deals, "deals", |deal| [deal.title.as_str()]);
