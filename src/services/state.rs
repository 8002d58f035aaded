use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::models::{FeatureToggles, Notice, NoticeLevel, OverviewSummary, SettingsSection};
use crate::utils::now_rfc3339;

const NOTICE_CAPACITY: usize = 64;

/// Last successfully fetched dashboard data. A failed refresh never touches
/// the stored value; it raises a transient [`Notice`] instead.
pub struct DashboardState {
    overview: Mutex<Option<OverviewSummary>>,
    features: Mutex<Option<FeatureToggles>>,
    sections: Mutex<BTreeMap<SettingsSection, Value>>,
    notices: broadcast::Sender<Notice>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl DashboardState {
    pub fn new() -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        DashboardState {
            overview: Mutex::new(None),
            features: Mutex::new(None),
            sections: Mutex::new(BTreeMap::new()),
            notices,
        }
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn overview(&self) -> Option<OverviewSummary> {
        lock(&self.overview).clone()
    }

    pub fn features(&self) -> Option<FeatureToggles> {
        lock(&self.features).clone()
    }

    pub fn section(&self, section: SettingsSection) -> Option<Value> {
        lock(&self.sections).get(&section).cloned()
    }

    /// Returns whether the stored overview was replaced.
    pub fn apply_overview(&self, fetched: Result<OverviewSummary>) -> bool {
        match fetched {
            Ok(summary) => {
                *lock(&self.overview) = Some(summary);
                true
            }
            Err(err) => {
                self.notify(format!("Could not refresh overview: {}", err));
                false
            }
        }
    }

    pub fn apply_features(&self, fetched: Result<FeatureToggles>) -> bool {
        match fetched {
            Ok(features) => {
                *lock(&self.features) = Some(features);
                true
            }
            Err(err) => {
                self.notify(format!("Could not refresh feature toggles: {}", err));
                false
            }
        }
    }

    pub fn apply_section(&self, section: SettingsSection, fetched: Result<Value>) -> bool {
        match fetched {
            Ok(value) => {
                lock(&self.sections).insert(section, value);
                true
            }
            Err(err) => {
                self.notify(format!("Could not load {} settings: {}", section.as_str(), err));
                false
            }
        }
    }

    fn notify(&self, message: String) {
        tracing::warn!("{message}");
        // Nobody listening is fine; the notice is transient.
        let _ = self.notices.send(Notice {
            level: NoticeLevel::Warning,
            message,
            created_at: now_rfc3339(),
        });
    }
}
