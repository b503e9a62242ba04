use chrono::{DateTime, Utc};
use orbit_core::{TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::module::Module;

/// Channel of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignType {
    /// Email blast.
    Email,
    /// Social media.
    Social,
    /// Live or virtual event.
    Event,
    /// Referral program.
    Referral,
    /// Anything else.
    Other,
}

impl CampaignType {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Social => "Social",
            Self::Event => "Event",
            Self::Referral => "Referral",
            Self::Other => "Other",
        }
    }
}

/// Lifecycle status of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Being prepared.
    Draft,
    /// Running.
    Active,
    /// Finished.
    Done,
    /// Temporarily stopped.
    Paused,
}

/// Marketing campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    /// Record identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Campaign name.
    pub name: String,
    /// Channel.
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    /// Lifecycle status.
    pub status: CampaignStatus,
    /// Leads generated.
    #[serde(default)]
    pub leads: u32,
    /// Leads converted.
    #[serde(default)]
    pub converted: u32,
    /// Planned budget.
    #[serde(default)]
    pub budget: f64,
    /// Amount spent so far.
    #[serde(default)]
    pub spent: f64,
    /// Start date.
    #[serde(default)]
    pub start_date: String,
    /// End date.
    #[serde(default)]
    pub end_date: String,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

domain_record!(Campaign, Module::Campaigns, "campaigns", |campaign| [
    campaign.name.as_str(),
    campaign.campaign_type.as_str(),
]);
