//! Currency extraction: an anchored extractor keyed to the Total-amount
//! label family (with a proximity bonus when a parsed amount sits nearby),
//! and a whole-text fallback.

use lazy_static::lazy_static;
use regex::Regex;

use crate::extraction::anchors::TOTAL_AMOUNT_ANCHORS;
use crate::extraction::{find_anchored, ExtractionContext, ExtractionResult, FieldExtractor};
use crate::money::{detect_currency, find_amount_tokens, normalize_currency_token, CURRENCY_TOKEN_PATTERN};

lazy_static! {
    static ref CURRENCY_VALUE: Regex = Regex::new(&format!("(?i){CURRENCY_TOKEN_PATTERN}")).unwrap();
}

/// Currency token anchored by Total-family labels, with a small extra bonus
/// when a parsed amount token sits within 12 chars of the currency token.
pub struct CurrencyAnchoredExtractor;

impl FieldExtractor for CurrencyAnchoredExtractor {
    fn name(&self) -> &'static str {
        "currency-anchored"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        self.extract_all(ctx).into_iter().next().unwrap_or_default()
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        let matches = find_anchored(&ctx.text, &CURRENCY_VALUE, &TOTAL_AMOUNT_ANCHORS, 1);
        let amounts = find_amount_tokens(&ctx.text);

        let mut results: Vec<ExtractionResult> = matches
            .into_iter()
            .filter_map(|m| {
                let normalized = normalize_currency_token(&m.value)?;
                let nearby_amount = amounts
                    .iter()
                    .any(|a| a.char_index.abs_diff(m.value_position.char_index) <= 12);
                let votes = m.total_votes() + if nearby_amount { 1 } else { 0 };
                Some(ExtractionResult::new(normalized, votes, m.matched_text.clone()))
            })
            .collect();
        results.sort_by(|a, b| b.votes.cmp(&a.votes));
        results
    }
}

/// Whole-text currency detection, one vote, used when no anchored match
/// survives.
pub struct CurrencyFallbackExtractor;

impl FieldExtractor for CurrencyFallbackExtractor {
    fn name(&self) -> &'static str {
        "currency-fallback"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        match detect_currency(&ctx.text) {
            Some(code) => ExtractionResult::new(code, 1, code),
            None => ExtractionResult::no_match(),
        }
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        vec![self.extract(ctx)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;

    #[test]
    fn anchored_extractor_normalizes_and_scores_bonus() {
        let ctx = ExtractionContext::new("Total due 1200.00 SEK", Locale::Unknown);
        let extractor = CurrencyAnchoredExtractor;
        let results = extractor.extract_all(&ctx);
        assert!(results.iter().any(|r| r.value.as_deref() == Some("SEK")));
    }

    #[test]
    fn fallback_detects_currency_anywhere_in_text() {
        let ctx = ExtractionContext::new("Amount due $14.68", Locale::Unknown);
        let extractor = CurrencyFallbackExtractor;
        let result = extractor.extract(&ctx);
        assert_eq!(result.value.as_deref(), Some("USD"));
        assert_eq!(result.votes, 1);
    }
}
