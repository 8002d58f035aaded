use crate::models::{InvoiceRow, OverviewSummary};
use crate::services::api::ApiClient;
use crate::services::state::DashboardState;
use crate::utils::format::{format_currency, format_percent, format_risk_score};

/// One KPI card: title and formatted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiCard {
    pub title: &'static str,
    pub value: String,
}

/// Refetches the overview and stores it if the call succeeds.
pub async fn refresh_overview(api: &ApiClient, state: &DashboardState, company_id: &str) -> bool {
    let fetched = api.fetch_overview(company_id).await;
    state.apply_overview(fetched)
}

pub fn kpi_cards(summary: &OverviewSummary) -> Vec<KpiCard> {
    let flagged_share = if summary.total_invoices == 0 {
        None
    } else {
        Some(summary.flagged_invoices as f64 / summary.total_invoices as f64)
    };

    vec![
        KpiCard {
            title: "Invoices",
            value: summary.total_invoices.to_string(),
        },
        KpiCard {
            title: "Needs review",
            value: summary.flagged_invoices.to_string(),
        },
        KpiCard {
            title: "Flagged share",
            value: format_percent(flagged_share),
        },
        KpiCard {
            title: "Total amount",
            value: format_currency(summary.total_amount),
        },
        KpiCard {
            title: "Average risk",
            value: format_risk_score(summary.average_risk),
        },
    ]
}

pub fn recent_rows(summary: &OverviewSummary) -> Vec<InvoiceRow> {
    summary.recent_invoices.iter().map(InvoiceRow::from_view).collect()
}
