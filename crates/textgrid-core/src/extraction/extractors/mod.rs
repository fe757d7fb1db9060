//! Field-extractor registry: one small module per (field, pattern) pair,
//! each implementing [`super::FieldExtractor`]. Grouped into per-field
//! extractor lists for the aggregator and the orchestrator to consume.

mod currency;
mod dates;
mod invoice_number;
mod total_amount;
mod vat;
mod vendor_name;

pub use currency::{CurrencyAnchoredExtractor, CurrencyFallbackExtractor};
pub use dates::{AnyDateFallbackExtractor, DueDateExtractor, InvoiceDateExtractor};
pub use invoice_number::InvoiceNumberExtractor;
pub use total_amount::TotalAmountExtractor;
pub use vat::{SubtotalExtractor, VatAmountExtractor, VatRateExtractor};
pub use vendor_name::{VendorNameExtractor, VendorNameFallbackExtractor};

use super::FieldExtractor;

pub fn invoice_number_extractors() -> Vec<Box<dyn FieldExtractor>> {
    vec![Box::new(InvoiceNumberExtractor)]
}

pub fn total_amount_extractors() -> Vec<Box<dyn FieldExtractor>> {
    vec![Box::new(TotalAmountExtractor)]
}

pub fn currency_extractors() -> Vec<Box<dyn FieldExtractor>> {
    vec![Box::new(CurrencyAnchoredExtractor), Box::new(CurrencyFallbackExtractor)]
}

pub fn invoice_date_extractors() -> Vec<Box<dyn FieldExtractor>> {
    vec![Box::new(InvoiceDateExtractor), Box::new(AnyDateFallbackExtractor)]
}

pub fn due_date_extractors() -> Vec<Box<dyn FieldExtractor>> {
    vec![Box::new(DueDateExtractor)]
}

pub fn vat_amount_extractors() -> Vec<Box<dyn FieldExtractor>> {
    vec![Box::new(VatAmountExtractor)]
}

pub fn vat_rate_extractors() -> Vec<Box<dyn FieldExtractor>> {
    vec![Box::new(VatRateExtractor)]
}

pub fn subtotal_extractors() -> Vec<Box<dyn FieldExtractor>> {
    vec![Box::new(SubtotalExtractor)]
}

pub fn vendor_name_extractors() -> Vec<Box<dyn FieldExtractor>> {
    vec![Box::new(VendorNameExtractor), Box::new(VendorNameFallbackExtractor)]
}
