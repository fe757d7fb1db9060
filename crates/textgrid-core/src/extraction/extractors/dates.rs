//! Invoice date / due date / any-date extraction: anchored date tokens
//! scored by the shared anchored-extraction engine (which already
//! disambiguates same-line two-column layouts by column distance), a
//! bare-ISO-date-pair special rule, and a catch-all fallback.

use lazy_static::lazy_static;
use regex::Regex;

use crate::date::DATE_TOKEN_PATTERN;
use crate::extraction::anchors::{DUE_DATE_ANCHORS, INVOICE_DATE_ANCHORS};
use crate::extraction::{find_anchored, Anchor, ExtractionContext, ExtractionResult, FieldExtractor};

lazy_static! {
    static ref RANGE_TOKEN: Regex = Regex::new(r"-|–|(?i)\bto\b").unwrap();
    static ref BARE_ISO_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// True if a ±6-char window around the match (excluding the matched span
/// itself) contains a range token (`-`, `–`, or `to`), which disqualifies
/// the candidate as a date range rather than a single date.
fn looks_like_range(text: &str, char_index: usize, length: usize) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let start = char_index.saturating_sub(6);
    let end = (char_index + length + 6).min(chars.len());
    let before: String = chars[start..char_index].iter().collect();
    let after: String = chars[(char_index + length).min(chars.len())..end].iter().collect();
    RANGE_TOKEN.is_match(&before) || RANGE_TOKEN.is_match(&after)
}

fn anchored_date_results(text: &str, anchors: &[Anchor]) -> Vec<ExtractionResult> {
    let mut results: Vec<ExtractionResult> = find_anchored(text, &DATE_TOKEN_PATTERN, anchors, 2)
        .into_iter()
        .filter(|m| m.anchor_matched.is_some())
        .filter(|m| !looks_like_range(text, m.value_position.char_index, m.matched_text.chars().count()))
        .map(|m| {
            let trimmed = m.matched_text.trim_end_matches(|c: char| !c.is_alphanumeric());
            ExtractionResult::new(trimmed, m.total_votes(), trimmed)
        })
        .collect();
    results.sort_by(|a, b| b.votes.cmp(&a.votes));
    results
}

/// Invoice-date extractor, anchored by "Invoice date"/"Date of issue" and
/// Nordic/German/French equivalents, plus the special "two bare ISO dates
/// on a short line with both 'invoice date' and 'due date' in the document"
/// rule, which assigns the earlier date 3 votes.
pub struct InvoiceDateExtractor;

impl FieldExtractor for InvoiceDateExtractor {
    fn name(&self) -> &'static str {
        "invoice-date-anchored"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        self.extract_all(ctx).into_iter().next().unwrap_or_default()
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        let mut results = anchored_date_results(&ctx.text, &INVOICE_DATE_ANCHORS);

        let lowered = ctx.text.to_lowercase();
        let has_both_labels = lowered.contains("invoice date") && lowered.contains("due date");
        if has_both_labels {
            let mut bare_dates: Vec<&str> = Vec::new();
            for line in &ctx.lines {
                let trimmed = line.trim();
                if trimmed.chars().count() <= 40 && BARE_ISO_DATE.is_match(trimmed) {
                    bare_dates.push(trimmed);
                }
            }
            if bare_dates.len() == 2 {
                bare_dates.sort_unstable();
                results.push(ExtractionResult::new(bare_dates[0], 3, bare_dates[0]));
            }
        }

        results.sort_by(|a, b| b.votes.cmp(&a.votes));
        results
    }
}

/// Due-date extractor, structurally identical to [`InvoiceDateExtractor`]
/// but anchored by the due-date label family.
pub struct DueDateExtractor;

impl FieldExtractor for DueDateExtractor {
    fn name(&self) -> &'static str {
        "due-date-anchored"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        self.extract_all(ctx).into_iter().next().unwrap_or_default()
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        anchored_date_results(&ctx.text, &DUE_DATE_ANCHORS)
    }
}

/// Every date token anywhere in the text, one vote each; used when no
/// anchored date survives.
pub struct AnyDateFallbackExtractor;

impl FieldExtractor for AnyDateFallbackExtractor {
    fn name(&self) -> &'static str {
        "any-date-fallback"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        self.extract_all(ctx).into_iter().next().unwrap_or_default()
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        DATE_TOKEN_PATTERN
            .find_iter(&ctx.text)
            .map(|m| {
                let matched = m.as_str().trim_end_matches(|c: char| !c.is_alphanumeric());
                ExtractionResult::new(matched, 1, matched)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;

    #[test]
    fn both_dates_present_no_other_dates_yields_exactly_those_two() {
        let ctx = ExtractionContext::new(
            "Invoice date 2024-01-01\nDue date 2024-02-01",
            Locale::Unknown,
        );
        let invoice = InvoiceDateExtractor.extract(&ctx);
        let due = DueDateExtractor.extract(&ctx);
        assert_eq!(invoice.value.as_deref(), Some("2024-01-01"));
        assert_eq!(due.value.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn two_column_layout_does_not_confuse_invoice_and_due_dates() {
        let ctx = ExtractionContext::new(
            "Invoice date 2024-01-01    Due date 2024-02-01",
            Locale::Unknown,
        );
        let invoice = InvoiceDateExtractor.extract(&ctx);
        let due = DueDateExtractor.extract(&ctx);
        assert_eq!(invoice.value.as_deref(), Some("2024-01-01"));
        assert_eq!(due.value.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn any_date_fallback_finds_every_token() {
        let ctx = ExtractionContext::new("2024-01-01 and 2024-02-01", Locale::Unknown);
        let results = AnyDateFallbackExtractor.extract_all(&ctx);
        assert_eq!(results.len(), 2);
    }
}
