use crate::models::SettingsSection;
use crate::services::api::ApiClient;
use crate::services::state::DashboardState;

/// Reloads feature toggles and every settings section. Returns how many of
/// the calls succeeded; failed sections keep their previous value.
pub async fn refresh_settings(api: &ApiClient, state: &DashboardState, company_id: &str) -> usize {
    let mut refreshed = 0;

    if state.apply_features(api.fetch_feature_toggles(company_id).await) {
        refreshed += 1;
    }
    for section in SettingsSection::ALL {
        let fetched = api.fetch_settings_section(company_id, section).await;
        if state.apply_section(section, fetched) {
            refreshed += 1;
        }
    }

    tracing::debug!(company_id, refreshed, "settings refreshed");
    refreshed
}
