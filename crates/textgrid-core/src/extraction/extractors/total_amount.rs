//! Total amount extraction — the most rule-heavy extractor: scan lines
//! matching a "total due"-family label, search neighbor lines for a
//! candidate amount, and apply a battery of corrections/bonuses before the
//! candidate is handed to the aggregator.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::date::DATE_TOKEN_PATTERN;
use crate::extraction::anchors::TOTAL_AMOUNT_ANCHORS;
use crate::extraction::{ExtractionContext, ExtractionResult, FieldExtractor};
use crate::money::{find_amount_tokens, find_currency_tokens, is_plausible_amount, parse_amount};

lazy_static! {
    static ref VAT_PERCENT_LINE: Regex = Regex::new(r"(?i)%.*(?:vat|moms|mwst|tva|tax)|(?:vat|moms|mwst|tva|tax).*%").unwrap();
    static ref TAX_WORD: Regex = Regex::new(r"(?i)\b(?:vat|moms|mwst|tva|tax|skatt)\b").unwrap();
    static ref SUBTOTAL_WORD: Regex =
        Regex::new(r"(?i)\b(?:subtotal|excl(?:uding)?|netto|net)\b").unwrap();
    static ref ROUNDING_WORD: Regex = Regex::new(r"(?i)\brounding\b").unwrap();
}

fn is_year_like(amount: Decimal) -> bool {
    amount.fract().is_zero()
        && amount >= Decimal::from(1900)
        && amount <= Decimal::from(2100)
}

fn line_correction(line: &str) -> i32 {
    if VAT_PERCENT_LINE.is_match(line) {
        -4
    } else if TAX_WORD.is_match(line) {
        -3
    } else if SUBTOTAL_WORD.is_match(line) {
        -2
    } else if ROUNDING_WORD.is_match(line) {
        -2
    } else {
        0
    }
}

fn currency_proximity_bonus(line: &str, token_char_index: usize) -> i32 {
    let currencies = find_currency_tokens(line);
    let nearest = currencies
        .iter()
        .map(|c| c.char_index.abs_diff(token_char_index))
        .min();
    match nearest {
        Some(d) if d <= 12 => 2,
        Some(d) if d <= 24 => 1,
        _ => 0,
    }
}

fn has_nearby_currency(line: &str, token_char_index: usize) -> bool {
    find_currency_tokens(line)
        .iter()
        .any(|c| c.char_index.abs_diff(token_char_index) <= 12)
}

/// The rule-heavy total-amount extractor described in §4.6.
pub struct TotalAmountExtractor;

impl TotalAmountExtractor {
    /// Scan one anchor line's own text and, failing that, up to 6 lines in
    /// each direction, for a plausible amount candidate.
    fn candidates_for_anchor_line(lines: &[String], anchor_idx: usize, locale: crate::Locale) -> Vec<(usize, Decimal, usize)> {
        let mut out = Vec::new();
        let search_order: Vec<usize> = {
            let mut order = vec![anchor_idx];
            for offset in 1..=6usize {
                if anchor_idx >= offset {
                    order.push(anchor_idx - offset);
                }
                if anchor_idx + offset < lines.len() {
                    order.push(anchor_idx + offset);
                }
            }
            order
        };

        for line_idx in search_order {
            let line = &lines[line_idx];
            for token in find_amount_tokens(line) {
                let rest = &line[byte_offset(line, token.char_index + token.length)..];
                if rest.trim_start().starts_with('%') {
                    continue;
                }
                let Some(amount) = parse_amount(&token.value, locale) else {
                    continue;
                };
                if !is_plausible_amount(amount) || is_year_like(amount) {
                    continue;
                }
                if !has_nearby_currency(line, token.char_index) && DATE_TOKEN_PATTERN.is_match(line) {
                    continue;
                }
                out.push((line_idx, amount, token.char_index));
            }
            if !out.is_empty() {
                break;
            }
        }
        out
    }
}

fn byte_offset(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

impl FieldExtractor for TotalAmountExtractor {
    fn name(&self) -> &'static str {
        "total-amount-anchored"
    }

    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult {
        self.extract_all(ctx).into_iter().next().unwrap_or_default()
    }

    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
        let lines = &ctx.lines;
        let mut results = Vec::new();

        for (anchor_idx, line) in lines.iter().enumerate() {
            if !TOTAL_AMOUNT_ANCHORS.iter().any(|a| a.pattern.is_match(line)) {
                continue;
            }

            for (found_line_idx, amount, token_char_index) in
                Self::candidates_for_anchor_line(lines, anchor_idx, ctx.locale)
            {
                let found_line = &lines[found_line_idx];
                let mut votes = 2;
                votes += line_correction(found_line);
                votes += currency_proximity_bonus(found_line, token_char_index);
                if amount >= Decimal::from(1000) {
                    votes += 1; // currency-proximity-adjacent "amounts >= 1000" bonus
                    votes += 1; // separate "large amount" bonus
                }
                let distance = anchor_idx.abs_diff(found_line_idx);
                votes += match distance {
                    0 => 3,
                    1..=2 => 2,
                    _ => 1,
                };

                if votes <= 0 {
                    continue;
                }

                let canonical = format!("{:.2}", amount);
                results.push(ExtractionResult::new(canonical, votes, found_line.clone()));
            }
        }

        results.sort_by(|a, b| b.votes.cmp(&a.votes));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;

    #[test]
    fn extracts_inline_total_amount() {
        let ctx = ExtractionContext::new("Total amount 1 200,00 SEK", Locale::European);
        let extractor = TotalAmountExtractor;
        let result = extractor.extract(&ctx);
        assert_eq!(result.value.as_deref(), Some("1200.00"));
    }

    #[test]
    fn vat_percent_line_is_not_picked_as_total() {
        let ctx = ExtractionContext::new("Total due\nVAT 25 % 250.00", Locale::Us);
        let extractor = TotalAmountExtractor;
        let results = extractor.extract_all(&ctx);
        // either rejected outright (votes <= 0 filtered) or heavily penalized
        assert!(results.iter().all(|r| r.value.as_deref() != Some("250.00") || r.votes < 3));
    }

    #[test]
    fn rejects_percent_suffixed_token() {
        let ctx = ExtractionContext::new("Total due 25%", Locale::Us);
        let extractor = TotalAmountExtractor;
        let results = extractor.extract_all(&ctx);
        assert!(results.is_empty());
    }

    #[test]
    fn rejects_year_like_integer() {
        let ctx = ExtractionContext::new("Total due 2024", Locale::Us);
        let extractor = TotalAmountExtractor;
        let results = extractor.extract_all(&ctx);
        assert!(results.is_empty());
    }
}
