use crate::models::{InvoiceRow, InvoiceView};

pub fn invoice_rows(invoices: &[InvoiceView]) -> Vec<InvoiceRow> {
    invoices.iter().map(InvoiceRow::from_view).collect()
}

/// Sets the optimistic "action in flight" flag. This is the only local
/// mutation an invoice view ever sees; everything else comes from a refetch.
pub fn set_pending_action(invoices: &mut [InvoiceView], invoice_id: &str, pending: bool) -> bool {
    match invoices.iter_mut().find(|invoice| invoice.id == invoice_id) {
        Some(invoice) => {
            invoice.pending_action = pending;
            true
        }
        None => false,
    }
}

/// Invoices whose status is advisory (flagged or blocked), in input order.
pub fn needing_review(invoices: &[InvoiceView]) -> Vec<&InvoiceView> {
    invoices
        .iter()
        .filter(|invoice| {
            invoice
                .status
                .as_deref()
                .map(crate::utils::status::is_advisory)
                .unwrap_or(false)
        })
        .collect()
}
