//! Tenant-owned CRM records.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use orbit_core::{TenantId, UserId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::module::Module;
use crate::user::User;

/// Item that belongs to exactly one tenant.
pub trait TenantScoped {
    /// Returns the owning tenant.
    fn tenant_id(&self) -> &TenantId;
}

/// Item that records the user who created it.
pub trait Owned {
    /// Returns the creator.
    fn created_by(&self) -> &UserId;
}

/// Record type synchronized from one REST collection.
pub trait DomainRecord:
    TenantScoped + Owned + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Module the record is managed under.
    const MODULE: Module;

    /// REST collection path segment.
    const COLLECTION: &'static str;

    /// Returns the backend identifier.
    fn id(&self) -> &str;

    /// Returns the server-assigned creation timestamp.
    fn created_at(&self) -> DateTime<Utc>;

    /// Returns the text fields free-text search runs against.
    fn search_text(&self) -> Vec<Cow<'_, str>>;

    /// Returns whether any search field contains the lower-cased needle.
    fn matches_search(&self, lowercase_needle: &str) -> bool {
        self.search_text()
            .iter()
            .any(|text| text.to_lowercase().contains(lowercase_needle))
    }
}

impl TenantScoped for User {
    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

macro_rules! domain_record {
    ($record:ty, $module:expr, $collection:literal, |$this:ident| [$($field:expr),+ $(,)?]) => {
        impl $crate::records::TenantScoped for $record {
            fn tenant_id(&self) -> &orbit_core::TenantId {
                &self.tenant_id
            }
        }

        impl $crate::records::Owned for $record {
            fn created_by(&self) -> &orbit_core::UserId {
                &self.created_by
            }
        }

        impl $crate::records::DomainRecord for $record {
            const MODULE: $crate::module::Module = $module;
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> &str {
                self.id.as_str()
            }

            fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
                self.created_at
            }

            fn search_text(&self) -> Vec<std::borrow::Cow<'_, str>> {
                let $this = self;
                vec![$(std::borrow::Cow::from($field)),+]
            }
        }
    };
}

mod commerce;
mod marketing;
mod sales;
mod task;

pub use commerce::{Invoice, InvoiceStatus, Order, OrderStatus, Product, Quote, QuoteItem, QuoteStatus};
pub use marketing::{Campaign, CampaignStatus, CampaignType};
pub use sales::{Account, Contact, Deal, DealStage, DealStatus, Lead, LeadSource, LeadStatus};
pub use task::{Task, TaskPriority, TaskStatus};
