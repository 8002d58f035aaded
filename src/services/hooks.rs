//! Per-feature subscriptions over the [`EventBus`].
//!
//! Channel matching is exact: a hook scoped to company `42` listens on
//! `company:42` and nothing else. There are no prefix rules.

use std::sync::Arc;

use crate::models::EventKind;
use crate::services::event_bus::{EventBus, Subscription};
use crate::utils::non_blank;

pub const OVERVIEW_EVENTS: [EventKind; 5] = [
    EventKind::InvoiceIngested,
    EventKind::InvoiceAnalyzed,
    EventKind::SupplierUpdated,
    EventKind::FraudDetected,
    EventKind::SummaryUpdated,
];

pub const SUPPLIER_EVENTS: [EventKind; 2] = [EventKind::InvoiceAnalyzed, EventKind::SupplierUpdated];

pub const COMPANY_SETTINGS_EVENTS: [EventKind; 2] = [EventKind::SettingsUpdated, EventKind::FeatureToggled];

/// Which events a hook cares about and how its identifier becomes a channel.
#[derive(Debug, Clone, Copy)]
pub struct HookSpec {
    pub name: &'static str,
    pub scope: &'static str,
    pub kinds: &'static [EventKind],
}

impl HookSpec {
    pub fn channel(&self, id: &str) -> String {
        format!("{}:{}", self.scope, id)
    }
}

pub const OVERVIEW: HookSpec = HookSpec {
    name: "overview",
    scope: "company",
    kinds: &OVERVIEW_EVENTS,
};

pub const SUPPLIER: HookSpec = HookSpec {
    name: "supplier",
    scope: "supplier",
    kinds: &SUPPLIER_EVENTS,
};

pub const COMPANY_SETTINGS: HookSpec = HookSpec {
    name: "company_settings",
    scope: "company",
    kinds: &COMPANY_SETTINGS_EVENTS,
};

/// Subscribes `callback` to the events `spec` allows on the channel derived
/// from `id`. Returns `None` without subscribing when `id` is absent or blank.
/// The callback only receives the event type; owners are expected to refetch.
pub fn subscribe_domain<F>(bus: &EventBus, spec: HookSpec, id: Option<&str>, callback: F) -> Option<Subscription>
where
    F: Fn(&EventKind) + Send + Sync + 'static,
{
    let id = non_blank(id)?;
    let channel = spec.channel(id);
    tracing::debug!(hook = spec.name, %channel, "hook mounted");

    let kinds = spec.kinds;
    Some(bus.subscribe(
        move |event| event.channel == channel && kinds.contains(&event.event),
        move |event| callback(&event.event),
    ))
}

pub fn watch_overview<F>(bus: &EventBus, company_id: Option<&str>, callback: F) -> Option<Subscription>
where
    F: Fn(&EventKind) + Send + Sync + 'static,
{
    subscribe_domain(bus, OVERVIEW, company_id, callback)
}

pub fn watch_supplier<F>(bus: &EventBus, supplier_id: Option<&str>, callback: F) -> Option<Subscription>
where
    F: Fn(&EventKind) + Send + Sync + 'static,
{
    subscribe_domain(bus, SUPPLIER, supplier_id, callback)
}

pub fn watch_company_settings<F>(bus: &EventBus, company_id: Option<&str>, callback: F) -> Option<Subscription>
where
    F: Fn(&EventKind) + Send + Sync + 'static,
{
    subscribe_domain(bus, COMPANY_SETTINGS, company_id, callback)
}

type SharedCallback = Arc<dyn Fn(&EventKind) + Send + Sync>;

/// A hook whose identifier can change over its lifetime. The previous
/// subscription is always disposed before the next one is created.
pub struct ScopedHook {
    bus: EventBus,
    spec: HookSpec,
    callback: SharedCallback,
    current: Option<String>,
    subscription: Option<Subscription>,
}

impl ScopedHook {
    pub fn new<F>(bus: EventBus, spec: HookSpec, callback: F) -> Self
    where
        F: Fn(&EventKind) + Send + Sync + 'static,
    {
        ScopedHook {
            bus,
            spec,
            callback: Arc::new(callback),
            current: None,
            subscription: None,
        }
    }

    pub fn set_id(&mut self, id: Option<&str>) {
        let next = non_blank(id).map(str::to_string);
        if next == self.current && (next.is_none() || self.subscription.is_some()) {
            return;
        }

        self.unmount();
        let callback = self.callback.clone();
        self.subscription = subscribe_domain(&self.bus, self.spec, next.as_deref(), move |kind| callback(kind));
        self.current = next;
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.as_ref().map(Subscription::is_active).unwrap_or(false)
    }

    pub fn unmount(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.dispose();
            tracing::debug!(hook = self.spec.name, id = ?self.current, "hook unmounted");
        }
    }
}
