//! Vendor name extraction: one to four capitalized tokens followed by a
//! legal-entity suffix, anchored by vendor-context labels ("Receipt from",
//! "Invoice from", Nordic/German equivalents).

use lazy_static::lazy_static;
use regex::Regex;

use crate::extraction::anchors::VENDOR_CONTEXT_ANCHORS;
use crate::extraction::{find_anchored, ExtractionContext, ExtractionResult, FieldExtractor};

lazy_static! {
    /// `s.r.o`, `Ltd`, `LLC`, `Inc`, `AB`, `AS`, `Oy`, `GmbH`, `Corp`,
    /// `Limited`, `PLC`, `PBC`. A bare two-letter Nordic suffix (`AB`/`AS`)
    /// is accepted as readily as the longer forms: there is no extra check
    /// that singles out short suffixes for rejection.
    static ref VENDOR_NAME_VALUE: Regex = Regex::new(
        r"\b(?:[A-Z][A-Za-z0-9&.,'-]*\s+){0,3}[A-Z][A-Za-z0-9&.,'-]*\s+(?:s\.r\.o\.?|Ltd\.?|LLC|Inc\.?|AB|AS|Oy|GmbH|Corp\.?|Limited|PLC|PBC)\b"
    ).unwrap();
}

const STOP_WORDS: &[&str] = &[
    "your", "from", "bill", "invoice", "receipt", "to", "date", "the", "this", "dear", "attn",
];

fn is_plausible_vendor_name(value: &str) -> bool {
    let len = value.chars().count();
    if !(5..=50).contains(&len) {
        return false;
    }
    match value.split_whitespace().next() {
        Some(first) => !STOP_WORDS.contains(&first.to_lowercase().as_str()),
        None => false,
    }
}

/// Vendor-name extractor: capitalized-token-run plus legal suffix, anchored
/// by the vendor-context label family.
pub struct VendorNameExtractor;

impl FieldExtractor for VendorNameExtractor {
    fn name(&self) -> &'static str {
        "vendor-name-anchored"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        self.extract_all(ctx).into_iter().next().unwrap_or_default()
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        let matches = find_anchored(&ctx.text, &VENDOR_NAME_VALUE, &VENDOR_CONTEXT_ANCHORS, 2);
        let mut results: Vec<ExtractionResult> = matches
            .into_iter()
            .filter(|m| is_plausible_vendor_name(&m.value))
            .map(|m| ExtractionResult::from(&m))
            .collect();
        results.sort_by(|a, b| b.votes.cmp(&a.votes));
        results
    }
}

/// Vendor-name candidates anywhere in the text, with no anchor requirement;
/// used as a last-resort line-scanning fallback by the vendor resolver.
pub struct VendorNameFallbackExtractor;

impl FieldExtractor for VendorNameFallbackExtractor {
    fn name(&self) -> &'static str {
        "vendor-name-fallback"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        self.extract_all(ctx).into_iter().next().unwrap_or_default()
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        VENDOR_NAME_VALUE
            .find_iter(&ctx.text)
            .map(|m| m.as_str())
            .filter(|v| is_plausible_vendor_name(v))
            .map(|v| ExtractionResult::new(v, 1, v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;

    #[test]
    fn extracts_vendor_name_anchored_by_receipt_from() {
        let ctx = ExtractionContext::new("Receipt from Acme Tech PBC", Locale::Unknown);
        let result = VendorNameExtractor.extract(&ctx);
        assert_eq!(result.value.as_deref(), Some("Acme Tech PBC"));
    }

    #[test]
    fn accepts_bare_nordic_ab_suffix() {
        assert!(is_plausible_vendor_name("Svenska Bolag AB"));
    }

    #[test]
    fn rejects_leading_stop_word() {
        let ctx = ExtractionContext::new("Invoice from Your Company AB", Locale::Unknown);
        let result = VendorNameExtractor.extract(&ctx);
        assert_eq!(result.value, None);
    }

    #[test]
    fn fallback_scans_without_an_anchor() {
        let ctx = ExtractionContext::new("Billed by Svenska Bolag AB for services", Locale::Unknown);
        let results = VendorNameFallbackExtractor.extract_all(&ctx);
        assert!(results.iter().any(|r| r.value.as_deref() == Some("Svenska Bolag AB")));
    }
}
