//! `UnifiedInvoiceParser`: selects a preferred PDF text variant, detects
//! locale in two contexts, runs every field extractor through the vote
//! aggregator, cross-derives missing VAT/subtotal/total figures, and scores
//! overall confidence.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::date;
use crate::extraction::extractors::{
    currency_extractors, due_date_extractors, invoice_date_extractors, invoice_number_extractors,
    subtotal_extractors, total_amount_extractors, vat_amount_extractors, vat_rate_extractors,
};
use crate::extraction::{aggregator, ExtractionContext, FieldExtractor};
use crate::locale::{self, Locale};
use crate::model::{InvoiceLineItem, ParsedInvoice, PdfExtractionResult};
use crate::money;
use crate::vendor;

/// Fixed preference order for picking one PDF variant as the "primary" text
/// that the non-invoice-number fields are extracted from. Falls back to
/// whichever variant sorts first in `extraction.variants` if none of these
/// names match.
const PREFERRED_VARIANT_ORDER: &[&str] = &[
    "asynkron-textlayout",
    "docnet-pdfium",
    "pdfpig-default",
    "pdfpig-layout",
    "pdfpig-nearestneighbour",
    "default",
];

lazy_static! {
    static ref LINE_ITEM: Regex =
        Regex::new(r"^(.{10,}?)\s+([\d\s]*\d[,.]\d{2})\s*(?:€|\$|£|kr|SEK|EUR|USD)?\s*$").unwrap();

    static ref SKIP_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)^(invoice|total|subtotal|date|vat|tax|due|amount|currency|customer|bill\s*to|vendor)\b").unwrap(),
        Regex::new(r"(?i)\b(AL|AK|AZ|AR|CA|CO|CT|DE|FL|GA|HI|ID|IL|IN|IA|KS|KY|LA|ME|MD|MA|MI|MN|MS|MO|MT|NE|NV|NH|NJ|NM|NY|NC|ND|OH|OK|OR|PA|RI|SC|SD|TN|TX|UT|VT|VA|WA|WV|WI|WY)\s+\d{5}\b").unwrap(),
        Regex::new(r"(?i)\b(Stockholm|Göteborg|Malmö|Berlin|München|Paris|Amsterdam|Praha|Prague|Oslo|Copenhagen|Helsinki)\b").unwrap(),
        Regex::new(r"^\s*\d{3}\s?\d{2}\s*$").unwrap(),
        Regex::new(r"^\s*\d{5}(?:-\d{4})?\s*$").unwrap(),
        Regex::new(r"(?i)https?://|www\.").unwrap(),
        Regex::new(r"(?i)\b(visa|mastercard|bank\s*transfer|credit\s*card|iban|swift|bic|paypal)\b").unwrap(),
        Regex::new(r"^\s*\d+\s*$").unwrap(),
        Regex::new(r"(?i)\b(gst|hst|pst)\b").unwrap(),
        Regex::new(r"(?i)\b(USA|United States|Sweden|Sverige|Germany|Deutschland|France|Netherlands|Nederland)\b").unwrap(),
        Regex::new(r"(?i)^(thank you|terms and conditions|page \d+)").unwrap(),
    ];
}

fn is_year_like(digits_only: &str, amount: Decimal) -> bool {
    if digits_only.len() == 5 {
        return true;
    }
    let as_int: i64 = amount.trunc().to_string().parse().unwrap_or(0);
    (2020..=2099).contains(&as_int)
}

pub struct UnifiedInvoiceParser;

impl UnifiedInvoiceParser {
    /// Parse an invoice from one or more text extraction variants, plus an
    /// optional email envelope (`From:`, subject, date as `"%Y-%m-%d"`, and
    /// body). Never fails: an extraction with no variants and no email
    /// fields produces `ParsedInvoice::empty`.
    pub fn parse(
        extraction: &PdfExtractionResult,
        email_subject: Option<&str>,
        email_from: Option<&str>,
        email_date: Option<&str>,
        email_body: Option<&str>,
    ) -> ParsedInvoice {
        if extraction.variants.is_empty() {
            return ParsedInvoice::empty(None);
        }

        let preferred_text = Self::select_preferred_text(extraction);
        let preferred_lines: Vec<String> = preferred_text.lines().map(|l| l.to_string()).collect();

        let mut pdf_combined = preferred_text.clone();
        for variant in &extraction.variants {
            if variant.text != preferred_text {
                pdf_combined.push_str("\n\n");
                pdf_combined.push_str(&variant.text);
            }
        }

        let mut combined = pdf_combined.clone();
        if let Some(subject) = email_subject {
            combined.push_str("\n\n");
            combined.push_str(subject);
        }
        if let Some(body) = email_body {
            combined.push_str("\n\n");
            combined.push_str(body);
        }

        let pdf_locale = locale::detect(&pdf_combined);
        let combined_locale = locale::detect(&combined);
        tracing::debug!(?pdf_locale, ?combined_locale, "unified parser locale detection");

        let mut pdf_ctx = ExtractionContext::new(preferred_text.clone(), pdf_locale);
        if let Some(hint) = email_from {
            pdf_ctx = pdf_ctx.with_sender_hint(hint);
        }
        if let Some(body) = email_body {
            pdf_ctx = pdf_ctx.with_email_body_hint(body);
        }
        if let Some(subject) = email_subject {
            pdf_ctx = pdf_ctx.with_email_subject(subject);
        }
        let pdf_contexts = [pdf_ctx];

        let all_contexts: Vec<ExtractionContext> = extraction
            .variants
            .iter()
            .map(|v| ExtractionContext::new(v.text.clone(), combined_locale))
            .collect();

        let mut invoice = ParsedInvoice::empty(Some(extraction.best_text().unwrap_or("").to_string()));

        invoice.invoice_number =
            run_best(&all_contexts, &invoice_number_extractors()).map(|(value, _)| value);

        if let Some((currency, _)) = run_best(&pdf_contexts, &currency_extractors()) {
            invoice.currency = money::normalize_currency_token(&currency)
                .map(|c| c.to_string())
                .or(Some(currency));
        }
        if invoice.currency.is_none() {
            invoice.currency = money::detect_currency(&preferred_text).map(|c| c.to_string());
        }

        if let Some((raw, _)) = run_best(&pdf_contexts, &invoice_date_extractors()) {
            invoice.invoice_date = date::parse(&raw, pdf_locale);
            invoice.invoice_date_raw = Some(raw);
        }
        if let Some((raw, _)) = run_best(&pdf_contexts, &due_date_extractors()) {
            invoice.due_date = date::parse(&raw, pdf_locale);
            invoice.due_date_raw = Some(raw);
        }
        if invoice.invoice_date.is_none() {
            if let Some(date_str) = email_date {
                if let Some(parsed) = date::parse(date_str, pdf_locale) {
                    invoice.invoice_date = Some(parsed);
                    invoice.invoice_date_raw = Some(date_str.to_string());
                }
            }
        }

        if let Some((raw, _)) = run_best(&pdf_contexts, &total_amount_extractors()) {
            invoice.total_amount = money::parse_amount(&raw, pdf_locale).filter(|a| money::is_plausible_amount(*a));
        }
        if let Some((raw, _)) = run_best(&pdf_contexts, &subtotal_extractors()) {
            invoice.total_excluding_vat =
                money::parse_amount(&raw, pdf_locale).filter(|a| money::is_plausible_amount(*a));
        }
        if let Some((raw, _)) = run_best(&pdf_contexts, &vat_amount_extractors()) {
            invoice.vat_amount = money::parse_amount(&raw, pdf_locale).filter(|a| money::is_plausible_amount(*a));
        }
        if let Some((raw, _)) = run_best(&pdf_contexts, &vat_rate_extractors()) {
            invoice.vat_rate = parse_percent(&raw);
        }

        resolve_vat_arithmetic(&mut invoice);

        invoice.vendor_name = vendor::resolve(
            &preferred_text,
            &preferred_lines,
            pdf_locale,
            email_from,
            email_body,
        );

        invoice.line_items = extract_line_items(&preferred_lines, pdf_locale);

        invoice.confidence = calculate_confidence(&invoice);

        tracing::info!(
            invoice_number = ?invoice.invoice_number,
            vendor_name = ?invoice.vendor_name,
            confidence = invoice.confidence,
            "unified parser finished"
        );

        invoice
    }

    fn select_preferred_text(extraction: &PdfExtractionResult) -> String {
        for preferred_name in PREFERRED_VARIANT_ORDER {
            if let Some(variant) = extraction
                .variants
                .iter()
                .find(|v| v.extractor_name.eq_ignore_ascii_case(preferred_name))
            {
                return variant.text.clone();
            }
        }
        extraction
            .variants
            .first()
            .map(|v| v.text.clone())
            .unwrap_or_default()
    }
}

fn run_best(
    contexts: &[ExtractionContext],
    extractors: &[Box<dyn FieldExtractor>],
) -> Option<(String, Option<String>)> {
    let refs: Vec<&dyn FieldExtractor> = extractors.iter().map(|e| e.as_ref()).collect();
    aggregator::extract_best_with_match(contexts, &refs)
}

fn parse_percent(raw: &str) -> Option<Decimal> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',').collect();
    digits.replace(',', ".").parse().ok()
}

/// Four-branch cross-derivation of whichever of total/subtotal/VAT is
/// missing, followed by discarding a VAT amount that ends up at or above the
/// total (a contradiction, not a value worth keeping).
fn resolve_vat_arithmetic(invoice: &mut ParsedInvoice) {
    match (
        invoice.total_amount,
        invoice.total_excluding_vat,
        invoice.vat_amount,
        invoice.vat_rate,
    ) {
        (None, Some(subtotal), Some(vat), _) => {
            invoice.total_amount = Some(subtotal + vat);
        }
        (Some(total), None, Some(vat), _) => {
            invoice.total_excluding_vat = Some(total - vat);
        }
        (None, Some(subtotal), None, Some(rate)) => {
            let vat = subtotal * rate / Decimal::from(100);
            invoice.vat_amount = Some(vat);
            invoice.total_amount = Some(subtotal + vat);
        }
        (Some(total), Some(subtotal), None, _) => {
            invoice.vat_amount = Some(total - subtotal);
        }
        _ => {}
    }

    if let (Some(vat), Some(total)) = (invoice.vat_amount, invoice.total_amount) {
        if vat >= total {
            invoice.vat_amount = None;
        }
    }
}

fn extract_line_items(lines: &[String], locale: Locale) -> Vec<InvoiceLineItem> {
    let mut items = Vec::new();
    for line in lines {
        let Some(caps) = LINE_ITEM.captures(line) else {
            continue;
        };
        let description = caps[1].trim().to_string();
        let amount_raw = caps[2].trim();

        if SKIP_PATTERNS.iter().any(|p| p.is_match(line)) {
            continue;
        }

        let digits_only: String = amount_raw.chars().filter(|c| c.is_ascii_digit()).collect();
        let Some(amount) = money::parse_amount(amount_raw, locale) else {
            continue;
        };
        if is_year_like(&digits_only, amount) {
            continue;
        }
        if amount < Decimal::new(50, 2) || amount > Decimal::from(100_000) {
            continue;
        }

        items.push(InvoiceLineItem::new(description, amount));
    }
    items
}

/// Weighted sum over eight present-or-absent signals, divided by the
/// maximum attainable score of 8.0.
fn calculate_confidence(invoice: &ParsedInvoice) -> f64 {
    const MAX_SCORE: f64 = 8.0;
    let mut score = 0.0;
    if invoice.invoice_number.is_some() {
        score += 1.0;
    }
    if invoice.vendor_name.is_some() {
        score += 1.0;
    }
    if invoice.invoice_date_raw.is_some() {
        score += 1.5;
    }
    if invoice.due_date_raw.is_some() {
        score += 0.5;
    }
    if invoice.total_amount.is_some() {
        score += 2.0;
    }
    if invoice.vat_amount.is_some() {
        score += 1.0;
    }
    if invoice.currency.is_some() {
        score += 0.5;
    }
    if !invoice.line_items.is_empty() {
        score += 0.5;
    }
    score / MAX_SCORE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PdfExtractionVariant;

    fn single_variant(text: &str) -> PdfExtractionResult {
        PdfExtractionResult::new(vec![PdfExtractionVariant::new(text, "default")])
    }

    #[test]
    fn empty_extraction_yields_zero_confidence() {
        let invoice = UnifiedInvoiceParser::parse(&PdfExtractionResult::default(), None, None, None, None);
        assert_eq!(invoice.confidence, 0.0);
    }

    #[test]
    fn parses_a_simple_invoice() {
        let text = "Invoice Number: INV-2024-001\nReceipt from Acme Tech AB\n\
                     Invoice Date: 2024-06-01\nDue Date: 2024-06-15\n\
                     Subtotal: 80.00 EUR\nVAT: 20.00 EUR\nTotal: 100.00 EUR";
        let extraction = single_variant(text);
        let invoice = UnifiedInvoiceParser::parse(&extraction, None, None, None, None);

        assert_eq!(invoice.invoice_number.as_deref(), Some("INV-2024-001"));
        assert_eq!(invoice.vendor_name.as_deref(), Some("Acme Tech AB"));
        assert_eq!(invoice.currency.as_deref(), Some("EUR"));
        assert!(invoice.total_amount.is_some());
        assert!(invoice.confidence > 0.5);
    }

    #[test]
    fn derives_missing_total_from_subtotal_and_vat() {
        let mut invoice = ParsedInvoice::default();
        invoice.total_excluding_vat = Some(Decimal::new(8000, 2));
        invoice.vat_amount = Some(Decimal::new(2000, 2));
        resolve_vat_arithmetic(&mut invoice);
        assert_eq!(invoice.total_amount, Some(Decimal::new(10000, 2)));
    }

    #[test]
    fn discards_vat_at_or_above_total() {
        let mut invoice = ParsedInvoice::default();
        invoice.total_amount = Some(Decimal::new(10000, 2));
        invoice.total_excluding_vat = Some(Decimal::new(8000, 2));
        invoice.vat_amount = Some(Decimal::new(10000, 2));
        resolve_vat_arithmetic(&mut invoice);
        assert_eq!(invoice.vat_amount, None);
    }

    #[test]
    fn preferred_variant_order_picks_asynkron_over_default() {
        let extraction = PdfExtractionResult::new(vec![
            PdfExtractionVariant::new("fallback text", "default"),
            PdfExtractionVariant::new("primary text", "asynkron-textlayout"),
        ]);
        let invoice = UnifiedInvoiceParser::parse(&extraction, None, None, None, None);
        assert_eq!(invoice.raw_text.as_deref(), extraction.best_text());
        let _ = invoice;
    }
}
