//! Display formatting for dashboard values. All functions are null-safe and
//! render [`PLACEHOLDER`] for missing input.

use crate::models::{InvoiceRow, InvoiceView};
use crate::utils::status::{color_class_for, label_for};
use crate::utils::{non_blank, parse_date};

pub const PLACEHOLDER: &str = "—";

const ORG_NR_AI_ALIASES: [&str; 5] = [
    "orgNr",
    "org_nr",
    "organizationNumber",
    "organization_number",
    "supplierOrgNr",
];

const BANKGIRO_AI_ALIASES: [&str; 4] = ["bankgiro", "bankGiro", "bg", "bankgiroNumber"];

/// SEK amount with Swedish grouping, e.g. `1 234,50 kr`.
pub fn format_currency(value: Option<f64>) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return PLACEHOLDER.to_string();
    };

    // Halves round away from zero, as in locale currency formatting.
    let cents = (value.abs() * 100.0).round();
    let fixed = format!("{:.2}", cents / 100.0);
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{},{} kr", sign, group_thousands(whole), fraction)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped
}

/// Short Swedish date (`YYYY-MM-DD`). Unparseable input is shown as-is.
pub fn format_date(value: Option<&str>) -> String {
    let Some(raw) = non_blank(value) else {
        return PLACEHOLDER.to_string();
    };
    match parse_date(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

/// Fraction in 0..=1 rendered as a whole percent.
pub fn format_percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(fraction) => format!("{}%", (fraction * 100.0).round() as i64),
        None => PLACEHOLDER.to_string(),
    }
}

/// Risk scores arrive either as fractions or as 0..=100 scores.
pub fn format_risk_score(value: Option<f64>) -> String {
    format_percent(value.map(|score| if score > 1.0 { score / 100.0 } else { score }))
}

/// Organization number, first hit wins: explicit field, AI aliases, then a
/// Swedish VAT number (`SE` + 10 digits + `01`).
pub fn extract_org_number(invoice: &InvoiceView) -> String {
    if let Some(explicit) = non_blank(invoice.supplier_org_nr.as_deref()) {
        return explicit.to_string();
    }
    if let Some(from_ai) = invoice
        .ai
        .as_ref()
        .and_then(|ai| ai.first_string(&ORG_NR_AI_ALIASES))
    {
        return from_ai;
    }
    if let Some(from_vat) =
        non_blank(invoice.supplier_vat_number.as_deref()).and_then(org_number_from_vat)
    {
        return from_vat;
    }
    PLACEHOLDER.to_string()
}

/// Bankgiro number: explicit field, then AI aliases. There is no VAT-derived
/// source for bankgiro.
pub fn extract_bankgiro(invoice: &InvoiceView) -> String {
    if let Some(explicit) = non_blank(invoice.supplier_bankgiro.as_deref()) {
        return explicit.to_string();
    }
    invoice
        .ai
        .as_ref()
        .and_then(|ai| ai.first_string(&BANKGIRO_AI_ALIASES))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn org_number_from_vat(vat: &str) -> Option<String> {
    if !vat.to_ascii_uppercase().starts_with("SE") {
        return None;
    }
    let digits: String = vat.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 10 {
        return None;
    }
    Some(format!("{}-{}", &digits[..6], &digits[6..10]))
}

impl InvoiceRow {
    pub fn from_view(invoice: &InvoiceView) -> Self {
        let status = invoice.status.as_deref().unwrap_or("UNKNOWN");
        InvoiceRow {
            id: invoice.id.clone(),
            supplier: non_blank(invoice.supplier_name.as_deref())
                .unwrap_or(PLACEHOLDER)
                .to_string(),
            amount: format_currency(invoice.amount),
            vat_amount: format_currency(invoice.vat_amount),
            invoice_date: format_date(invoice.invoice_date.as_deref()),
            due_date: format_date(invoice.due_date.as_deref()),
            risk: format_risk_score(invoice.risk_score),
            status_label: label_for(status),
            status_class: color_class_for(status).to_string(),
            org_number: extract_org_number(invoice),
            bankgiro: extract_bankgiro(invoice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AiMetadata;
    use serde_json::json;

    fn ai(fields: serde_json::Value) -> Option<AiMetadata> {
        Some(serde_json::from_value(fields).unwrap())
    }

    #[test]
    fn currency_uses_swedish_grouping() {
        let formatted = format_currency(Some(1234.5));
        assert!(formatted.contains("1 234,50"), "{formatted}");
        assert!(formatted.ends_with("kr"));
        assert_eq!(format_currency(Some(1_234_567.0)), "1 234 567,00 kr");
        assert_eq!(format_currency(Some(12.0)), "12,00 kr");
        assert_eq!(format_currency(Some(-950.25)), "-950,25 kr");
        assert_eq!(format_currency(Some(10.125)), "10,13 kr");
        assert_eq!(format_currency(Some(0.125)), "0,13 kr");
        assert_eq!(format_currency(Some(-0.001)), "0,00 kr");
        assert_eq!(format_currency(None), PLACEHOLDER);
        assert_eq!(format_currency(Some(f64::NAN)), PLACEHOLDER);
    }

    #[test]
    fn percent_rounds_to_whole_numbers() {
        assert_eq!(format_percent(Some(0.5)), "50%");
        assert_eq!(format_percent(Some(0.126)), "13%");
        assert_eq!(format_percent(Some(1.0)), "100%");
        assert_eq!(format_percent(None), PLACEHOLDER);
    }

    #[test]
    fn risk_score_accepts_both_scales() {
        assert_eq!(format_risk_score(Some(0.82)), "82%");
        assert_eq!(format_risk_score(Some(82.0)), "82%");
        assert_eq!(format_risk_score(None), PLACEHOLDER);
    }

    #[test]
    fn dates_render_as_short_iso() {
        assert_eq!(format_date(Some("2024-03-05T10:15:00Z")), "2024-03-05");
        assert_eq!(format_date(Some("05.03.2024")), "2024-03-05");
        assert_eq!(format_date(Some("next week")), "next week");
        assert_eq!(format_date(Some("  ")), PLACEHOLDER);
        assert_eq!(format_date(None), PLACEHOLDER);
    }

    #[test]
    fn explicit_org_number_wins_over_ai() {
        let invoice = InvoiceView {
            supplier_org_nr: Some("556677-8899".to_string()),
            ai: ai(json!({ "orgNr": "112233-4455" })),
            supplier_vat_number: Some("SE998877665501".to_string()),
            ..Default::default()
        };
        assert_eq!(extract_org_number(&invoice), "556677-8899");
    }

    #[test]
    fn ai_aliases_are_checked_in_order() {
        let invoice = InvoiceView {
            supplier_org_nr: Some("   ".to_string()),
            ai: ai(json!({
                "organization_number": "222222-2222",
                "org_nr": "111111-1111"
            })),
            ..Default::default()
        };
        assert_eq!(extract_org_number(&invoice), "111111-1111");
    }

    #[test]
    fn org_number_falls_back_to_vat_then_placeholder() {
        let from_vat = InvoiceView {
            supplier_vat_number: Some("SE556677889901".to_string()),
            ..Default::default()
        };
        assert_eq!(extract_org_number(&from_vat), "556677-8899");

        let foreign_vat = InvoiceView {
            supplier_vat_number: Some("DE123456789".to_string()),
            ..Default::default()
        };
        assert_eq!(extract_org_number(&foreign_vat), PLACEHOLDER);
    }

    #[test]
    fn bankgiro_prefers_explicit_field() {
        let explicit = InvoiceView {
            supplier_bankgiro: Some("123-4567".to_string()),
            ai: ai(json!({ "bankgiro": "999-9999" })),
            ..Default::default()
        };
        assert_eq!(extract_bankgiro(&explicit), "123-4567");

        let from_ai = InvoiceView {
            ai: ai(json!({ "bg": "555-1234" })),
            ..Default::default()
        };
        assert_eq!(extract_bankgiro(&from_ai), "555-1234");
        assert_eq!(extract_bankgiro(&InvoiceView::default()), PLACEHOLDER);
    }

    #[test]
    fn invoice_row_never_shows_raw_blocking_codes() {
        let invoice = InvoiceView {
            id: "inv-1".to_string(),
            supplier_name: Some("Nordic Supplies AB".to_string()),
            amount: Some(1234.5),
            status: Some("BLOCKED".to_string()),
            risk_score: Some(0.91),
            ..Default::default()
        };
        let row = InvoiceRow::from_view(&invoice);
        assert_eq!(row.status_label, "Needs review");
        assert_eq!(row.status_class, "status-warning");
        assert_eq!(row.amount, "1 234,50 kr");
        assert_eq!(row.risk, "91%");
        assert_eq!(row.due_date, PLACEHOLDER);
    }
}
