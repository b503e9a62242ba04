use chrono::{DateTime, Utc};
use orbit_core::{TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::module::Module;

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Record identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Product name.
    pub name: String,
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: String,
    /// Unit price.
    #[serde(default)]
    pub price: f64,
    /// Category label.
    #[serde(default)]
    pub category: String,
    /// Free-form status label.
    #[serde(default)]
    pub status: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Units in stock.
    #[serde(default)]
    pub stock: i64,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

domain_record!(Product, Module::Products, "products", |product| [
    product.name.as_str(),
    product.sku.as_str(),
    product.category.as_str(),
]);

/// Lifecycle status of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    /// Being prepared.
    Draft,
    /// Sent to the customer.
    Sent,
    /// Accepted and in effect.
    Active,
    /// Fulfilled.
    Done,
    /// Past its validity date.
    Expired,
}

/// Line item of a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    /// Quoted product.
    pub product_id: String,
    /// Product name at quote time.
    pub name: String,
    /// Quantity.
    pub qty: u32,
    /// Unit price.
    pub price: f64,
}

/// Sales quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Record identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Human-facing quote number.
    pub number: String,
    /// Recipient contact.
    #[serde(default)]
    pub contact_id: String,
    /// Recipient display name.
    #[serde(default)]
    pub contact_name: String,
    /// Related deal.
    #[serde(default)]
    pub deal_id: String,
    /// Quoted amount.
    #[serde(default)]
    pub amount: f64,
    /// Lifecycle status.
    pub status: QuoteStatus,
    /// Validity date.
    #[serde(default)]
    pub valid_until: String,
    /// Line items.
    #[serde(default)]
    pub items: Vec<QuoteItem>,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

domain_record!(Quote, Module::Quotes, "quotes", |quote| [
    quote.number.as_str(),
    quote.contact_name.as_str(),
]);

/// Payment status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Being prepared.
    Draft,
    /// Sent to the customer.
    Sent,
    /// Settled.
    Paid,
    /// Awaiting payment.
    Pending,
    /// Past its due date.
    Overdue,
}

/// Billing invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Record identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Human-facing invoice number.
    pub number: String,
    /// Billed contact.
    #[serde(default)]
    pub contact_id: String,
    /// Billed client name.
    #[serde(default)]
    pub client: String,
    /// Net amount.
    #[serde(default)]
    pub amount: f64,
    /// Tax amount.
    #[serde(default)]
    pub tax: f64,
    /// Gross total.
    #[serde(default)]
    pub total: f64,
    /// Payment due date.
    #[serde(default)]
    pub due_date: String,
    /// Payment status.
    pub status: InvoiceStatus,
    /// Originating quote.
    #[serde(default)]
    pub quote_id: Option<String>,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

domain_record!(Invoice, Module::Invoices, "invoices", |invoice| [
    invoice.number.as_str(),
    invoice.client.as_str(),
]);

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Received, not started.
    Pending,
    /// Being fulfilled.
    InProgress,
    /// Delivered.
    Done,
    /// Cancelled.
    Cancelled,
}

/// Customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Record identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Human-facing order number.
    pub number: String,
    /// Ordering contact.
    #[serde(default)]
    pub contact_id: String,
    /// Ordering client name.
    #[serde(default)]
    pub client: String,
    /// Number of line items.
    #[serde(default)]
    pub items: u32,
    /// Net amount.
    #[serde(default)]
    pub subtotal: f64,
    /// Tax amount.
    #[serde(default)]
    pub tax: f64,
    /// Gross total.
    #[serde(default)]
    pub total: f64,
    /// Fulfilment status.
    pub status: OrderStatus,
    /// Order date.
    #[serde(default)]
    pub order_date: String,
    /// Delivery date once known.
    #[serde(default)]
    pub delivery_date: Option<String>,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

domain_record!(Order, Module::Orders, "orders", |order| [
    order.number.as_str(),
    order.client.as_str(),
]);
