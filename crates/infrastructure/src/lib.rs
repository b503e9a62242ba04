//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_crm_client;
mod in_memory_crm_gateway;
mod in_memory_token_store;

pub use http_crm_client::HttpCrmClient;
pub use in_memory_crm_gateway::InMemoryCrmGateway;
pub use in_memory_token_store::InMemoryTokenStore;
