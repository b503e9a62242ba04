use std::collections::BTreeSet;
use std::sync::Arc;

use orbit_application::{
    AccessService, CrmGateway, ResourceGateway, ResourceService, Store, StoredRecord,
};
use orbit_core::{AppError, AppResult};
use orbit_domain::{
    Account, Campaign, Contact, Deal, Invoice, Lead, Module, Order, Product, Quote, Task,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// One page of a module with the fields the actor may not see removed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleListing {
    pub module: Module,
    pub page: usize,
    pub rows_per_page: usize,
    pub total: usize,
    pub hidden_fields: Vec<String>,
    pub items: Vec<Map<String, Value>>,
}

pub async fn list_module<G: CrmGateway + 'static>(
    module: Module,
    gateway: Arc<G>,
    store: Store,
    search: Option<&str>,
) -> AppResult<ModuleListing> {
    match module {
        Module::Leads => list::<Lead>(gateway, store, search).await,
        Module::Contacts => list::<Contact>(gateway, store, search).await,
        Module::Accounts => list::<Account>(gateway, store, search).await,
        Module::Deals => list::<Deal>(gateway, store, search).await,
        Module::Activities => list::<Task>(gateway, store, search).await,
        Module::Campaigns => list::<Campaign>(gateway, store, search).await,
        Module::Products => list::<Product>(gateway, store, search).await,
        Module::Quotes => list::<Quote>(gateway, store, search).await,
        Module::Invoices => list::<Invoice>(gateway, store, search).await,
        Module::Orders => list::<Order>(gateway, store, search).await,
        Module::Dashboard | Module::Forecasting | Module::Reports | Module::Settings => Err(
            AppError::Validation(format!("module '{module}' has no record listing")),
        ),
    }
}

async fn list<R: StoredRecord>(
    gateway: Arc<dyn ResourceGateway<R>>,
    store: Store,
    search: Option<&str>,
) -> AppResult<ModuleListing> {
    let access = AccessService::new(store.clone());
    let records = ResourceService::new(gateway, store);
    if let Some(query) = search {
        records.search(query).await;
    }

    let page = records.visible_page().await?;
    let mut items = page
        .items
        .iter()
        .map(|record| match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => Ok(fields),
            Ok(_) => Ok(Map::new()),
            Err(error) => Err(AppError::Internal(format!(
                "failed to encode {} record: {error}",
                R::COLLECTION
            ))),
        })
        .collect::<AppResult<Vec<_>>>()?;

    let fields: BTreeSet<String> = items
        .iter()
        .flat_map(|item| item.keys().cloned())
        .collect();
    let names: Vec<&str> = fields.iter().map(String::as_str).collect();
    let visible = access.visible_fields(R::MODULE, &names).await?;
    let hidden_fields: Vec<String> = names
        .iter()
        .filter(|name| !visible.contains(name))
        .map(|name| (*name).to_owned())
        .collect();
    for item in &mut items {
        item.retain(|field, _| !hidden_fields.contains(field));
    }

    Ok(ModuleListing {
        module: R::MODULE,
        page: page.page,
        rows_per_page: page.rows_per_page,
        total: page.total,
        hidden_fields,
        items,
    })
}
