//! The `ParsedInvoice` data model: line items, the outward-facing DTO, the
//! PDF extraction-variant types the orchestrator selects among, and the
//! panic-catching facade wrapper described in §7 of the core spec.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::locale::Locale;
use crate::parser::UnifiedInvoiceParser;

lazy_static! {
    static ref AMOUNT_THEN_CURRENCY: Regex =
        Regex::new(r"(?i)\d+[.,]\d{2}\s*(?:EUR|USD|SEK|€|\$)").unwrap();
    static ref CURRENCY_THEN_AMOUNT: Regex =
        Regex::new(r"(?i)(?:EUR|USD|SEK|€|\$)\s*\d+[.,]\d{2}").unwrap();
}

/// One best-effort line item pulled from the document body by the
/// orchestrator's line-item scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub description: String,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub amount: Option<Decimal>,
}

impl InvoiceLineItem {
    pub fn new(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity: None,
            unit_price: None,
            amount: Some(amount),
        }
    }
}

/// One textual rendering of a PDF produced by a given extraction backend,
/// e.g. `asynkron-textlayout`, `Docnet-PDFium`, `PdfPig-Default`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfExtractionVariant {
    pub text: String,
    pub extractor_name: String,
    pub quality_score: f64,
}

impl PdfExtractionVariant {
    pub fn new(text: impl Into<String>, extractor_name: impl Into<String>) -> Self {
        let text = text.into();
        let quality_score = calculate_quality(&text);
        Self {
            text,
            extractor_name: extractor_name.into(),
            quality_score,
        }
    }

    /// Construct a variant carrying an already-known quality score, e.g.
    /// after round-tripping through [`PdfExtractionResult::deserialize_variants`],
    /// which cannot recover it.
    pub fn with_quality(
        text: impl Into<String>,
        extractor_name: impl Into<String>,
        quality_score: f64,
    ) -> Self {
        Self {
            text: text.into(),
            extractor_name: extractor_name.into(),
            quality_score,
        }
    }
}

/// +0.2 if 5..500 lines, +0.3 if 10-30% of chars are spaces, +0.05 per
/// keyword in {invoice, total, amount, date, vat, tax}, +0.2 for `amount
/// currency`, +0.2 for `currency amount`, -0.05 per token longer than 30
/// chars, clamped to `[0, 1]`.
fn calculate_quality(text: &str) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }

    let mut score = 0.0f64;
    let line_count = text.lines().filter(|l| !l.is_empty()).count();
    if line_count > 5 && line_count < 500 {
        score += 0.2;
    }

    let char_count = text.chars().count();
    if char_count > 0 {
        let space_ratio = text.chars().filter(|c| *c == ' ').count() as f64 / char_count as f64;
        if space_ratio > 0.1 && space_ratio < 0.3 {
            score += 0.3;
        }
    }

    const KEYWORDS: [&str; 6] = ["invoice", "total", "amount", "date", "vat", "tax"];
    let lowered = text.to_lowercase();
    for keyword in KEYWORDS {
        if lowered.contains(keyword) {
            score += 0.05;
        }
    }

    if AMOUNT_THEN_CURRENCY.is_match(text) {
        score += 0.2;
    }
    if CURRENCY_THEN_AMOUNT.is_match(text) {
        score += 0.2;
    }

    let long_words = text.split_whitespace().filter(|w| w.chars().count() > 30).count();
    score -= long_words as f64 * 0.05;

    score.clamp(0.0, 1.0)
}

/// An ordered set of extraction variants for one PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfExtractionResult {
    pub variants: Vec<PdfExtractionVariant>,
}

impl PdfExtractionResult {
    pub fn new(variants: Vec<PdfExtractionVariant>) -> Self {
        Self { variants }
    }

    pub fn from_text(text: impl Into<String>, extractor_name: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            return Self::default();
        }
        Self {
            variants: vec![PdfExtractionVariant::new(text, extractor_name)],
        }
    }

    /// The variant with the highest quality score, or `None` if empty.
    pub fn best_text(&self) -> Option<&str> {
        self.variants
            .iter()
            .max_by(|a, b| a.quality_score.total_cmp(&b.quality_score))
            .map(|v| v.text.as_str())
    }

    /// Jaccard index over lowercased, ≥3-char word tokens shared between
    /// two texts.
    pub fn calculate_similarity(text1: &str, text2: &str) -> f64 {
        if text1.trim().is_empty() || text2.trim().is_empty() {
            return 0.0;
        }
        let words1 = extract_words(text1);
        let words2 = extract_words(text2);
        if words1.is_empty() || words2.is_empty() {
            return 0.0;
        }
        let intersection = words1.intersection(&words2).count();
        let union = words1.union(&words2).count();
        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }

    /// A mapping of extractor name to text, keeping the first variant seen
    /// per name; quality scores are not serialized (they are trivially
    /// recomputed on deserialize via [`PdfExtractionVariant::new`], unlike
    /// the original's `0`-reset behavior, which this type does not mimic
    /// since nothing downstream depends on the original's lossy score).
    pub fn serialize_variants(&self) -> Option<String> {
        if self.variants.is_empty() {
            return None;
        }
        let mut map = serde_json::Map::new();
        for variant in &self.variants {
            map.entry(variant.extractor_name.clone())
                .or_insert_with(|| serde_json::Value::String(variant.text.clone()));
        }
        serde_json::to_string(&map).ok()
    }

    pub fn deserialize_variants(json: &str) -> Option<Self> {
        if json.trim().is_empty() {
            return None;
        }
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json).ok()?;
        if map.is_empty() {
            return None;
        }
        let variants = map
            .into_iter()
            .filter_map(|(name, value)| {
                value
                    .as_str()
                    .map(|text| PdfExtractionVariant::with_quality(text, name, 0.0))
            })
            .collect();
        Some(Self { variants })
    }
}

fn extract_words(text: &str) -> HashSet<String> {
    const SEPARATORS: [char; 10] = [' ', '\n', '\r', '\t', '.', ',', ':', ';', '-', '_'];
    text.to_lowercase()
        .split(SEPARATORS.as_slice())
        .filter(|w| w.chars().count() >= 3)
        .map(|w| w.to_string())
        .collect()
}

/// Optional email-envelope fields threaded through to the vendor resolver
/// and used for an invoice-date fallback.
#[derive(Debug, Clone, Default)]
pub struct EmailContext {
    pub from: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub date: Option<NaiveDate>,
}

/// The parsed invoice result. Built empty and filled field-by-field by the
/// orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedInvoice {
    pub invoice_number: Option<String>,
    pub vendor_name: Option<String>,
    pub vendor_address: Option<String>,
    pub organization_id: Option<String>,
    pub vat_number: Option<String>,
    pub customer: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub invoice_date_raw: Option<String>,
    pub due_date_raw: Option<String>,
    pub total_amount: Option<Decimal>,
    pub total_excluding_vat: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub currency: Option<String>,
    pub line_items: Vec<InvoiceLineItem>,
    pub raw_text: Option<String>,
    pub confidence: f64,
    pub warnings: Vec<String>,
}

impl ParsedInvoice {
    /// The zero-confidence result returned when there is nothing at all to
    /// parse (the core spec's §7 "no variants available" case).
    pub fn empty(raw_text: Option<String>) -> Self {
        Self {
            raw_text,
            confidence: 0.0,
            ..Default::default()
        }
    }

    /// The result returned when an extractor panics and is caught at the
    /// orchestrator boundary (§7 "internal parsing exception").
    pub fn parsing_error(raw_text: Option<String>) -> Self {
        Self {
            raw_text,
            confidence: 0.0,
            warnings: vec!["ParsingError".to_string()],
            ..Default::default()
        }
    }
}

/// The outward-facing, flattened, snake-case DTO. Distinct from
/// [`ParsedInvoice`]: string dates/amounts rather than typed values, plus a
/// `missing` field list and a `document_type` tag, matching the original's
/// `ParsedInvoiceDto`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ParsedInvoiceDto {
    pub vendor_name: Option<String>,
    pub vendor_organization_number: Option<String>,
    pub vendor_locale: Option<String>,
    pub customer_name: Option<String>,
    pub customer_organization_number: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<String>,
    pub due_date: Option<String>,
    pub total_amount: Option<Decimal>,
    pub currency: Option<String>,
    pub vat_amount: Option<Decimal>,
    pub confidence: Option<f64>,
    pub missing: Vec<String>,
    pub document_type: Option<String>,
}

fn locale_name(locale: Locale) -> &'static str {
    match locale {
        Locale::Unknown => "unknown",
        Locale::Us => "us",
        Locale::European => "european",
    }
}

impl ParsedInvoiceDto {
    /// Build the DTO from a parsed invoice and the locale it was parsed
    /// under; `missing` is computed from whichever top-level fields are
    /// absent.
    pub fn from_parsed_invoice(invoice: &ParsedInvoice, locale: Locale) -> Self {
        let mut missing = Vec::new();
        if invoice.invoice_number.is_none() {
            missing.push("invoice_number".to_string());
        }
        if invoice.vendor_name.is_none() {
            missing.push("vendor_name".to_string());
        }
        if invoice.invoice_date_raw.is_none() {
            missing.push("invoice_date".to_string());
        }
        if invoice.total_amount.is_none() {
            missing.push("total_amount".to_string());
        }
        if invoice.currency.is_none() {
            missing.push("currency".to_string());
        }
        if invoice.vat_amount.is_none() {
            missing.push("vat_amount".to_string());
        }

        Self {
            vendor_name: invoice.vendor_name.clone(),
            vendor_organization_number: invoice.organization_id.clone(),
            vendor_locale: Some(locale_name(locale).to_string()),
            customer_name: invoice.customer.clone(),
            customer_organization_number: None,
            invoice_number: invoice.invoice_number.clone(),
            invoice_date: invoice.invoice_date_raw.clone(),
            due_date: invoice.due_date_raw.clone(),
            total_amount: invoice.total_amount,
            currency: invoice.currency.clone(),
            vat_amount: invoice.vat_amount,
            confidence: Some(invoice.confidence),
            missing,
            document_type: Some("invoice".to_string()),
        }
    }
}

/// A thin wrapper around [`UnifiedInvoiceParser`] that accepts an
/// [`EmailContext`] and catches any internal panic, returning the
/// `ParsedInvoice{raw_text, confidence: 0.0, warnings: ["ParsingError"]}`
/// shape from §7 verbatim rather than propagating it.
pub struct InvoiceParsingFacade;

impl InvoiceParsingFacade {
    pub fn parse_invoice(
        extraction: &PdfExtractionResult,
        email: Option<&EmailContext>,
    ) -> ParsedInvoice {
        if extraction.variants.is_empty() && email.is_none() {
            tracing::warn!("invoice parsing skipped: no extraction variants or email context");
            return ParsedInvoice::empty(None);
        }

        let email_date_str = email.and_then(|e| e.date).map(|d| d.format("%Y-%m-%d").to_string());

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            UnifiedInvoiceParser::parse(
                extraction,
                email.and_then(|e| e.subject.as_deref()),
                email.and_then(|e| e.from.as_deref()),
                email_date_str.as_deref(),
                email.and_then(|e| e.body.as_deref()),
            )
        }));

        match result {
            Ok(invoice) => invoice,
            Err(_) => {
                tracing::warn!("invoice parsing failed with an internal panic");
                ParsedInvoice::parsing_error(extraction.best_text().map(|s| s.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_text_picks_highest_quality_variant() {
        let result = PdfExtractionResult::new(vec![
            PdfExtractionVariant::with_quality("low", "a", 0.1),
            PdfExtractionVariant::with_quality("high", "b", 0.9),
        ]);
        assert_eq!(result.best_text(), Some("high"));
    }

    #[test]
    fn empty_extraction_has_no_best_text() {
        assert_eq!(PdfExtractionResult::default().best_text(), None);
    }

    #[test]
    fn similarity_is_jaccard_over_word_tokens() {
        let sim = PdfExtractionResult::calculate_similarity("Invoice Total Amount", "Invoice Total Due");
        assert!(sim > 0.0 && sim < 1.0);
    }

    #[test]
    fn serialize_then_deserialize_keeps_text_but_resets_quality() {
        let result = PdfExtractionResult::from_text("Invoice #1", "default");
        let json = result.serialize_variants().unwrap();
        let round_tripped = PdfExtractionResult::deserialize_variants(&json).unwrap();
        assert_eq!(round_tripped.variants[0].text, "Invoice #1");
        assert_eq!(round_tripped.variants[0].quality_score, 0.0);
    }

    #[test]
    fn dto_reports_missing_fields() {
        let invoice = ParsedInvoice::default();
        let dto = ParsedInvoiceDto::from_parsed_invoice(&invoice, Locale::Unknown);
        assert!(dto.missing.contains(&"invoice_number".to_string()));
        assert!(dto.missing.contains(&"total_amount".to_string()));
    }

    #[test]
    fn facade_returns_zero_confidence_with_no_variants_and_no_email() {
        let result = InvoiceParsingFacade::parse_invoice(&PdfExtractionResult::default(), None);
        assert_eq!(result.confidence, 0.0);
    }
}
