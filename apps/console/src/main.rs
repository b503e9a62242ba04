//! Orbit CRM console: signs in, loads the workspace and prints what the
//! signed-in user may see.

#![forbid(unsafe_code)]

mod console_config;
mod listing;

use std::sync::Arc;

use chrono::Utc;
use orbit_application::{
    AccessService, LoadReport, SessionService, Store, TokenStore, WorkspaceGateways,
    WorkspaceLoader,
};
use orbit_core::{AppError, AppResult};
use orbit_domain::{DashboardSummary, Module, Plan, Role, UsageNotice};
use orbit_infrastructure::{HttpCrmClient, InMemoryTokenStore};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::console_config::ConsoleConfig;
use crate::listing::{ModuleListing, list_module};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NavigationItem {
    module: Module,
    label: &'static str,
    path: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConsoleReport {
    user_id: String,
    tenant_id: String,
    role: Role,
    plan: Option<Plan>,
    load: LoadReport,
    navigation: Vec<NavigationItem>,
    usage_notice: Option<UsageNotice>,
    dashboard: Option<DashboardSummary>,
    listing: ModuleListing,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ConsoleConfig::load()?;
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
    let client = Arc::new(HttpCrmClient::with_timeout(
        config.api_base_url.as_str(),
        config.api_timeout,
        tokens.clone(),
    )?);
    let store = Store::new();
    let session = SessionService::new(
        client.clone(),
        client.clone(),
        tokens.clone(),
        store.clone(),
    );

    session
        .login(config.email.as_str(), config.password.as_str())
        .await?;
    let report = build_report(&config, client, tokens, store).await;

    if let Err(error) = session.logout().await {
        warn!(error = %error, "logout failed");
    }

    let report = report?;
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|error| AppError::Internal(format!("failed to render report: {error}")))?;
    println!("{rendered}");
    Ok(())
}

async fn build_report(
    config: &ConsoleConfig,
    client: Arc<HttpCrmClient>,
    tokens: Arc<dyn TokenStore>,
    store: Store,
) -> AppResult<ConsoleReport> {
    let loader = WorkspaceLoader::new(
        WorkspaceGateways::from_gateway(client.clone()),
        tokens,
        store.clone(),
    );
    let load = loader.load().await?;
    if !load.is_complete() {
        warn!(
            failed = load.failed.len(),
            discarded = load.discarded,
            "workspace partially loaded"
        );
    }

    let access = AccessService::new(store.clone());
    let now = Utc::now();
    let navigation = access
        .navigation()
        .await?
        .into_iter()
        .map(|entry| NavigationItem {
            module: entry.module,
            label: entry.label,
            path: entry.path,
        })
        .collect();
    let usage_notice = access.usage_notice(now).await?;
    let dashboard = match access.dashboard(now).await {
        Ok(summary) => Some(summary),
        Err(AppError::Forbidden(message)) => {
            info!(reason = %message, "dashboard not available");
            None
        }
        Err(error) => return Err(error),
    };

    let listing = list_module(
        config.module,
        client,
        store.clone(),
        config.search.as_deref(),
    )
    .await?;

    let (actor, plan) = store
        .read(|state| {
            (
                state.actor(),
                state.tenant().subscription().map(|subscription| subscription.plan),
            )
        })
        .await;
    let actor = actor.ok_or_else(|| AppError::Unauthorized("session ended".to_owned()))?;

    Ok(ConsoleReport {
        user_id: actor.user_id().to_string(),
        tenant_id: actor.tenant_id().to_string(),
        role: actor.role(),
        plan,
        load,
        navigation,
        usage_notice,
        dashboard,
        listing,
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
