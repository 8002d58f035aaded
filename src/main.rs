use anyhow::{anyhow, Result};
use tokio::sync::mpsc;

use valiflow_realtime::commands::{dashboard, settings};
use valiflow_realtime::config::load_settings;
use valiflow_realtime::services::api::ApiClient;
use valiflow_realtime::services::bridge::BridgeRegistry;
use valiflow_realtime::services::event_bus::EventBus;
use valiflow_realtime::services::hooks::{watch_company_settings, watch_overview};
use valiflow_realtime::services::state::DashboardState;

enum Refresh {
    Overview,
    Settings,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("valiflow_realtime=debug,info")),
        )
        .init();

    let app_settings = load_settings()?;
    let company_id = app_settings
        .company_id
        .clone()
        .ok_or_else(|| anyhow!("VALIFLOW_COMPANY_ID is not set"))?;

    let api = ApiClient::new(app_settings.api_base_url.clone(), app_settings.token.clone());
    match api.verify_session().await {
        Ok(true) => {}
        Ok(false) => tracing::warn!("session token was rejected; requests will likely fail"),
        Err(err) => tracing::warn!("could not verify session: {err}"),
    }

    let bus = EventBus::new();
    let state = DashboardState::new();
    let registry = BridgeRegistry::new(bus.clone(), api.http().clone(), app_settings.token.clone());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let overview_tx = tx.clone();
    let _overview = watch_overview(&bus, Some(company_id.as_str()), move |kind| {
        tracing::debug!(event = %kind, "overview event");
        let _ = overview_tx.send(Refresh::Overview);
    });
    let settings_tx = tx.clone();
    let _settings = watch_company_settings(&bus, Some(company_id.as_str()), move |kind| {
        tracing::debug!(event = %kind, "settings event");
        let _ = settings_tx.send(Refresh::Settings);
    });
    drop(tx);

    let resource = format!("company:{}", company_id);
    registry.ensure(&resource, &app_settings.stream_url(&company_id)?)?;

    refresh_and_print(&api, &state, &company_id).await;
    settings::refresh_settings(&api, &state, &company_id).await;

    let mut notices = state.notices();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
            refresh = rx.recv() => match refresh {
                Some(Refresh::Overview) => refresh_and_print(&api, &state, &company_id).await,
                Some(Refresh::Settings) => {
                    settings::refresh_settings(&api, &state, &company_id).await;
                }
                None => break,
            },
            notice = notices.recv() => {
                if let Ok(notice) = notice {
                    eprintln!("! {}", notice.message);
                }
            }
        }
    }

    registry.close_all();
    Ok(())
}

async fn refresh_and_print(api: &ApiClient, state: &DashboardState, company_id: &str) {
    if !dashboard::refresh_overview(api, state, company_id).await {
        return;
    }
    let Some(summary) = state.overview() else {
        return;
    };

    for card in dashboard::kpi_cards(&summary) {
        println!("{:<14} {}", card.title, card.value);
    }
    for row in dashboard::recent_rows(&summary) {
        println!(
            "  {:<12} {:<24} {:>16}  {:<12} risk {:>4}  org {}",
            row.id, row.supplier, row.amount, row.status_label, row.risk, row.org_number
        );
    }
}
