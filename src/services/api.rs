use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RealtimeError, Result};
use crate::models::{FeatureToggles, OverviewSummary, SettingsSection};

/// Thin JSON client for the dashboard REST endpoints. Every request carries
/// the session bearer token when one is configured.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient {
            client,
            base_url,
            token,
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn fetch_feature_toggles(&self, company_id: &str) -> Result<FeatureToggles> {
        self.get_json(&format!("/companies/{}/features", company_id)).await
    }

    pub async fn fetch_settings_section(&self, company_id: &str, section: SettingsSection) -> Result<Value> {
        self.get_json(&format!("/companies/{}/settings/{}", company_id, section.as_str()))
            .await
    }

    pub async fn fetch_overview(&self, company_id: &str) -> Result<OverviewSummary> {
        self.get_json(&format!("/companies/{}/overview", company_id)).await
    }

    /// `Ok(false)` when the backend rejects the token, `Err` when it cannot be
    /// reached at all.
    pub async fn verify_session(&self) -> Result<bool> {
        let response = self.request(&format!("{}/auth/session", self.base_url)).send().await?;
        Ok(response.status().is_success())
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|e| RealtimeError::Fetch(format!("GET {}: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RealtimeError::Fetch(format!("GET {} returned {}: {}", path, status, body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RealtimeError::Fetch(format!("GET {}: invalid body: {}", path, e)))
    }
}
