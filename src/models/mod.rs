use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    Approved,
    Paid,
    Verified,
    Flagged,
    Blocked,
    Review,
    Pending,
    Draft,
    Unknown,
}

impl StatusCode {
    pub const ALL: [StatusCode; 9] = [
        StatusCode::Approved,
        StatusCode::Paid,
        StatusCode::Verified,
        StatusCode::Flagged,
        StatusCode::Blocked,
        StatusCode::Review,
        StatusCode::Pending,
        StatusCode::Draft,
        StatusCode::Unknown,
    ];

    /// Case-insensitive lookup of a backend status string.
    pub fn parse(raw: &str) -> Option<StatusCode> {
        let normalized = raw.trim().to_ascii_uppercase();
        StatusCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == normalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Approved => "APPROVED",
            StatusCode::Paid => "PAID",
            StatusCode::Verified => "VERIFIED",
            StatusCode::Flagged => "FLAGGED",
            StatusCode::Blocked => "BLOCKED",
            StatusCode::Review => "REVIEW",
            StatusCode::Pending => "PENDING",
            StatusCode::Draft => "DRAFT",
            StatusCode::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLabel {
    pub text: String,
    pub color_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    InvoiceIngested,
    InvoiceAnalyzed,
    SupplierUpdated,
    FraudDetected,
    SummaryUpdated,
    SettingsUpdated,
    FeatureToggled,
    Heartbeat,
    Other(String),
}

impl EventKind {
    pub fn from_name(name: &str) -> EventKind {
        match name {
            "invoice_ingested" => EventKind::InvoiceIngested,
            "invoice_analyzed" => EventKind::InvoiceAnalyzed,
            "supplier_updated" => EventKind::SupplierUpdated,
            "fraud_detected" => EventKind::FraudDetected,
            "summary_updated" => EventKind::SummaryUpdated,
            "settings_updated" => EventKind::SettingsUpdated,
            "feature_toggled" => EventKind::FeatureToggled,
            "heartbeat" => EventKind::Heartbeat,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::InvoiceIngested => "invoice_ingested",
            EventKind::InvoiceAnalyzed => "invoice_analyzed",
            EventKind::SupplierUpdated => "supplier_updated",
            EventKind::FraudDetected => "fraud_detected",
            EventKind::SummaryUpdated => "summary_updated",
            EventKind::SettingsUpdated => "settings_updated",
            EventKind::FeatureToggled => "feature_toggled",
            EventKind::Heartbeat => "heartbeat",
            EventKind::Other(name) => name,
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        EventKind::from_name(&value)
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pushed message after boundary validation. Lives only for the duration
/// of a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub event: EventKind,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub data: Value,
}

impl RealtimeEvent {
    pub fn new(event: EventKind, channel: impl Into<String>, data: Value) -> Self {
        RealtimeEvent {
            event,
            channel: channel.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMetadata {
    pub model: Option<String>,
    pub confidence: Option<f64>,
    #[serde(flatten)]
    pub extracted: Map<String, Value>,
}

impl AiMetadata {
    /// First non-blank string among `aliases`, checked in order.
    pub fn first_string(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|alias| {
            self.extracted
                .get(*alias)
                .and_then(|value| match value {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    pub id: String,
    #[serde(alias = "supplier")]
    pub supplier_name: Option<String>,
    pub supplier_org_nr: Option<String>,
    #[serde(alias = "vatNumber")]
    pub supplier_vat_number: Option<String>,
    pub supplier_bankgiro: Option<String>,
    pub amount: Option<f64>,
    pub vat_amount: Option<f64>,
    pub currency: Option<String>,
    pub invoice_date: Option<String>,
    pub due_date: Option<String>,
    pub risk_score: Option<f64>,
    pub status: Option<String>,
    #[serde(alias = "aiMetadata")]
    pub ai: Option<AiMetadata>,
    /// Optimistic UI flag; never sent back to the backend.
    #[serde(default, skip_serializing)]
    pub pending_action: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub id: String,
    pub supplier: String,
    pub amount: String,
    pub vat_amount: String,
    pub invoice_date: String,
    pub due_date: String,
    pub risk: String,
    pub status_label: String,
    pub status_class: String,
    pub org_number: String,
    pub bankgiro: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverviewSummary {
    pub total_invoices: u64,
    pub flagged_invoices: u64,
    pub total_amount: Option<f64>,
    pub average_risk: Option<f64>,
    pub recent_invoices: Vec<InvoiceView>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureToggles(pub BTreeMap<String, bool>);

impl FeatureToggles {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsSection {
    Profile,
    Access,
    Automations,
    Notifications,
    Security,
    Integrations,
    Ai,
}

impl SettingsSection {
    pub const ALL: [SettingsSection; 7] = [
        SettingsSection::Profile,
        SettingsSection::Access,
        SettingsSection::Automations,
        SettingsSection::Notifications,
        SettingsSection::Security,
        SettingsSection::Integrations,
        SettingsSection::Ai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsSection::Profile => "profile",
            SettingsSection::Access => "access",
            SettingsSection::Automations => "automations",
            SettingsSection::Notifications => "notifications",
            SettingsSection::Security => "security",
            SettingsSection::Integrations => "integrations",
            SettingsSection::Ai => "ai",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
}

/// Transient user-facing notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub stream_path: String,
    pub company_id: Option<String>,
    pub token: Option<String>,
}

impl Settings {
    pub fn stream_url(&self, company_id: &str) -> crate::error::Result<String> {
        let raw = format!("{}{}", self.api_base_url.trim_end_matches('/'), self.stream_path);
        let mut url = reqwest::Url::parse(&raw)
            .map_err(|e| crate::error::RealtimeError::Config(format!("stream url {}: {}", raw, e)))?;
        url.query_pairs_mut().append_pair("companyId", company_id);
        Ok(url.into())
    }
}
