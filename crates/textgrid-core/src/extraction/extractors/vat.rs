//! VAT amount, VAT rate, and subtotal extraction: label-anchored amount
//! extractors over the VAT/subtotal anchor families, plus a "Swedish
//! reverse" form where the amount precedes its label (`250,00 Moms(` or
//! `960,00 Delsumma i SEK`).

use lazy_static::lazy_static;
use regex::Regex;

use crate::extraction::anchors::{SUBTOTAL_ANCHORS, VAT_ANCHORS};
use crate::extraction::{find_anchored, ExtractionContext, ExtractionResult, FieldExtractor};
use crate::money::AMOUNT_TOKEN_PATTERN;

lazy_static! {
    static ref AMOUNT_VALUE: Regex = Regex::new(AMOUNT_TOKEN_PATTERN).unwrap();
    static ref VAT_PERCENT: Regex = Regex::new(r"(\d{1,2}(?:[.,]\d)?)\s*%").unwrap();

    static ref REVERSE_MOMS: Regex =
        Regex::new(&format!(r"(?i)({AMOUNT_TOKEN_PATTERN})\s*moms\(")).unwrap();
    static ref REVERSE_DELSUMMA: Regex =
        Regex::new(&format!(r"(?i)({AMOUNT_TOKEN_PATTERN})\s*delsumma\s+i\s+\w+")).unwrap();
}

fn reverse_form_results(text: &str, pattern: &Regex, votes: i32) -> Vec<ExtractionResult> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| ExtractionResult::new(m.as_str(), votes, m.as_str()))
        .collect()
}

fn sorted(mut results: Vec<ExtractionResult>) -> Vec<ExtractionResult> {
    results.sort_by(|a, b| b.votes.cmp(&a.votes));
    results
}

/// True if the char immediately following the match (skipping whitespace)
/// is `%`, meaning the token is a rate, not an amount.
fn followed_by_percent(text: &str, char_index: usize, length: usize) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let mut idx = char_index + length;
    while idx < chars.len() && chars[idx].is_whitespace() {
        idx += 1;
    }
    chars.get(idx) == Some(&'%')
}

/// VAT amount, anchored by the VAT label family (base votes 2), plus the
/// Swedish reverse `<amount> Moms(` form (3 votes, matching the label's own
/// anchor bonus since it is unambiguous).
pub struct VatAmountExtractor;

impl FieldExtractor for VatAmountExtractor {
    fn name(&self) -> &'static str {
        "vat-amount-anchored"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        self.extract_all(ctx).into_iter().next().unwrap_or_default()
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        let mut results: Vec<ExtractionResult> = find_anchored(&ctx.text, &AMOUNT_VALUE, &VAT_ANCHORS, 2)
            .into_iter()
            .filter(|m| m.anchor_matched.is_some())
            .filter(|m| {
                !followed_by_percent(&ctx.text, m.value_position.char_index, m.matched_text.chars().count())
            })
            .map(|m| ExtractionResult::from(&m))
            .collect();
        results.extend(reverse_form_results(&ctx.text, &REVERSE_MOMS, 3));
        sorted(results)
    }
}

/// VAT rate as a bare percentage, anchored by the VAT label family.
pub struct VatRateExtractor;

impl FieldExtractor for VatRateExtractor {
    fn name(&self) -> &'static str {
        "vat-rate-anchored"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        self.extract_all(ctx).into_iter().next().unwrap_or_default()
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        let results: Vec<ExtractionResult> = find_anchored(&ctx.text, &VAT_PERCENT, &VAT_ANCHORS, 2)
            .into_iter()
            .filter(|m| m.anchor_matched.is_some())
            .map(|m| {
                let rate = VAT_PERCENT
                    .captures(&m.matched_text)
                    .and_then(|c| c.get(1))
                    .map(|g| g.as_str().replace(',', "."))
                    .unwrap_or_else(|| m.value.clone());
                ExtractionResult::new(rate, m.total_votes(), m.matched_text.clone())
            })
            .collect();
        sorted(results)
    }
}

/// Subtotal (total excluding VAT), anchored by the subtotal label family,
/// plus the Swedish reverse `<amount> Delsumma i SEK` form.
pub struct SubtotalExtractor;

impl FieldExtractor for SubtotalExtractor {
    fn name(&self) -> &'static str {
        "subtotal-anchored"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        self.extract_all(ctx).into_iter().next().unwrap_or_default()
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        let mut results: Vec<ExtractionResult> = find_anchored(&ctx.text, &AMOUNT_VALUE, &SUBTOTAL_ANCHORS, 2)
            .into_iter()
            .filter(|m| m.anchor_matched.is_some())
            .map(|m| ExtractionResult::from(&m))
            .collect();
        results.extend(reverse_form_results(&ctx.text, &REVERSE_DELSUMMA, 3));
        sorted(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;

    #[test]
    fn extracts_vat_amount_anchored_by_moms() {
        let ctx = ExtractionContext::new("Moms 240,00", Locale::Unknown);
        let result = VatAmountExtractor.extract(&ctx);
        assert_eq!(result.value.as_deref(), Some("240,00"));
    }

    #[test]
    fn extracts_vat_amount_via_swedish_reverse_form() {
        let ctx = ExtractionContext::new("960,00 Moms(25%)", Locale::Unknown);
        let result = VatAmountExtractor.extract(&ctx);
        assert_eq!(result.value.as_deref(), Some("960,00"));
    }

    #[test]
    fn extracts_subtotal_via_delsumma_reverse_form() {
        let ctx = ExtractionContext::new("960,00 Delsumma i SEK", Locale::Unknown);
        let result = SubtotalExtractor.extract(&ctx);
        assert_eq!(result.value.as_deref(), Some("960,00"));
    }

    #[test]
    fn extracts_vat_rate_percentage() {
        let ctx = ExtractionContext::new("VAT 25%", Locale::Unknown);
        let result = VatRateExtractor.extract(&ctx);
        assert_eq!(result.value.as_deref(), Some("25"));
    }
}
