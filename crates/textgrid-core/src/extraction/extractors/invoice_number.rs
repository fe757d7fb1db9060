//! Invoice number extraction: anchored over a large disjunction of
//! label/format patterns (English, Nordic, German, French), rejecting
//! candidates that are too short or contain no digit.

use lazy_static::lazy_static;
use regex::Regex;

use crate::extraction::anchors::INVOICE_NUMBER_ANCHORS;
use crate::extraction::{find_anchored, ExtractionContext, ExtractionResult, FieldExtractor};

lazy_static! {
    /// Hyphenated alphanumerics (`XXXX00-000`), `INV######`, and generic
    /// short alnum/slash/hyphen reference codes.
    static ref INVOICE_NUMBER_VALUE: Regex = Regex::new(
        r"(?i)\bINV\d{4,}\b|\b[A-Z]{1,4}\d{2,6}-\d{2,6}\b|\b[A-Z0-9][A-Z0-9/\-\.]{3,24}\b"
    )
    .unwrap();
}

fn is_plausible_invoice_number(value: &str) -> bool {
    value.chars().count() >= 4 && value.chars().any(|c| c.is_ascii_digit())
}

/// Anchored invoice-number extractor; base votes 2, consistent with the
/// other label-driven anchored extractors in this family.
pub struct InvoiceNumberExtractor;

impl FieldExtractor for InvoiceNumberExtractor {
    fn name(&self) -> &'static str {
        "invoice-number-anchored"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        self.extract_all(ctx).into_iter().next().unwrap_or_default()
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        let matches = find_anchored(&ctx.text, &INVOICE_NUMBER_VALUE, &INVOICE_NUMBER_ANCHORS, 2);
        let mut results: Vec<ExtractionResult> = matches
            .into_iter()
            .filter(|m| m.anchor_matched.is_some() && is_plausible_invoice_number(&m.value))
            .map(|m| ExtractionResult::from(&m))
            .collect();
        results.sort_by(|a, b| b.votes.cmp(&a.votes));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;

    #[test]
    fn extracts_english_labeled_invoice_number() {
        let ctx = ExtractionContext::new("Invoice #INV-12345", Locale::Unknown);
        let extractor = InvoiceNumberExtractor;
        let result = extractor.extract(&ctx);
        assert!(result.is_match());
        assert_eq!(result.value.as_deref(), Some("INV-12345"));
    }

    #[test]
    fn extracts_swedish_labeled_invoice_number() {
        let ctx = ExtractionContext::new("Fakturanummer: 2024-0099", Locale::Unknown);
        let extractor = InvoiceNumberExtractor;
        let result = extractor.extract(&ctx);
        assert!(result.is_match());
        assert_eq!(result.value.as_deref(), Some("2024-0099"));
    }

    #[test]
    fn rejects_short_no_digit_candidates() {
        assert!(!is_plausible_invoice_number("abc"));
        assert!(!is_plausible_invoice_number("ABCD"));
        assert!(is_plausible_invoice_number("FV01"));
    }
}
