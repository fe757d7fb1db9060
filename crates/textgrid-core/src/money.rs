//! Tokenizing and parsing monetary amounts and currency tokens.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::locale::Locale;

/// A single regex match carried alongside its character offset and length,
/// shared by the currency/amount token scanners and the anchored extraction
/// engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub value: String,
    pub char_index: usize,
    pub length: usize,
}

/// Matches any recognized currency code, symbol, or the bare word `kr`,
/// either standalone or immediately adjacent to a digit.
pub const CURRENCY_TOKEN_PATTERN: &str =
    r"\b(?:USD|EUR|GBP|SEK|NOK|DKK|CHF|INR)\b|(?:USD|EUR|GBP|SEK|NOK|DKK|CHF|INR)(?=\d)|[€$£]|\bkr\b";

/// Matches a grouped or bare integer, optionally followed by a two-digit
/// decimal tail under either separator convention.
pub const AMOUNT_TOKEN_PATTERN: &str =
    r"(?:\d{1,3}(?:[ \t.,]\d{3})+|\d+)(?:[.,]\d{2})?";

lazy_static! {
    static ref EUR_CODE: Regex = Regex::new(r"(?i)\bEUR\b").unwrap();
    static ref USD_CODE: Regex = Regex::new(r"(?i)\bUSD\b").unwrap();
    static ref GBP_CODE: Regex = Regex::new(r"(?i)\bGBP\b").unwrap();
    static ref SEK_CODE: Regex = Regex::new(r"(?i)\bSEK\b").unwrap();
    static ref KRONA_CODE: Regex = Regex::new(r"\bkr\b").unwrap();
    static ref NOK_CODE: Regex = Regex::new(r"(?i)\bNOK\b").unwrap();
    static ref DKK_CODE: Regex = Regex::new(r"(?i)\bDKK\b").unwrap();
    static ref CHF_CODE: Regex = Regex::new(r"(?i)\bCHF\b").unwrap();
    static ref ANY_CURRENCY: Regex =
        Regex::new(r"(?i)[€$£]|EUR|USD|GBP|SEK|NOK|DKK|CHF|kr").unwrap();

    static ref CURRENCY_TOKEN: Regex = Regex::new(&format!("(?i){CURRENCY_TOKEN_PATTERN}")).unwrap();

    // `regex` has no lookaround, so the `(?<!\d)`/`(?!\d)` digit-boundary
    // guards from AMOUNT_TOKEN_PATTERN are modeled as an optional captured
    // non-digit neighbor on each side; the matched amount is group 1.
    static ref AMOUNT_TOKEN: Regex = Regex::new(&format!(
        r"(?:^|[^\d])({AMOUNT_TOKEN_PATTERN})(?:$|[^\d])"
    ))
    .unwrap();

    static ref EUROPEAN_FORMATTED_AMOUNT: Regex =
        Regex::new(r"^(\d{1,3}(?:[\s.]\d{3})*),(\d{1,2})$").unwrap();
    static ref SIMPLE_COMMA_DECIMAL: Regex = Regex::new(r"^(\d+),(\d{1,2})$").unwrap();
    static ref US_FORMATTED_AMOUNT: Regex =
        Regex::new(r"^(\d{1,3}(?:,\d{3})*)\.(\d{1,2})$").unwrap();
    static ref SIMPLE_DOT_DECIMAL: Regex = Regex::new(r"^(\d+)\.(\d{1,2})$").unwrap();
    static ref COMMA_DECIMAL_WITH_SEPARATORS: Regex =
        Regex::new(r"^(\d[\d\s.]*)?,(\d{2})$").unwrap();
    static ref DOT_DECIMAL_WITH_SEPARATORS: Regex =
        Regex::new(r"^(\d[\d,]*)\.(\d{2})$").unwrap();
}

/// Priority order EUR, USD, GBP, SEK (code or bare `kr`), NOK, DKK, CHF;
/// first match wins.
pub fn detect_currency(text: &str) -> Option<&'static str> {
    if text.contains('€') || EUR_CODE.is_match(text) {
        return Some("EUR");
    }
    if text.contains('$') || USD_CODE.is_match(text) {
        return Some("USD");
    }
    if text.contains('£') || GBP_CODE.is_match(text) {
        return Some("GBP");
    }
    if SEK_CODE.is_match(text) || KRONA_CODE.is_match(text) {
        return Some("SEK");
    }
    if NOK_CODE.is_match(text) {
        return Some("NOK");
    }
    if DKK_CODE.is_match(text) {
        return Some("DKK");
    }
    if CHF_CODE.is_match(text) {
        return Some("CHF");
    }
    None
}

/// Normalize a matched currency token to its ISO code (`€` → `EUR`,
/// `$` → `USD`, `£` → `GBP`, bare `kr` → `SEK`); a 3-letter code already in
/// the recognized set passes through uppercased. Returns `None` for
/// anything else.
pub fn normalize_currency_token(token: &str) -> Option<&'static str> {
    match token {
        "€" => Some("EUR"),
        "$" => Some("USD"),
        "£" => Some("GBP"),
        _ if token.eq_ignore_ascii_case("kr") => Some("SEK"),
        _ => {
            let upper = token.to_ascii_uppercase();
            match upper.as_str() {
                "USD" => Some("USD"),
                "EUR" => Some("EUR"),
                "GBP" => Some("GBP"),
                "SEK" => Some("SEK"),
                "NOK" => Some("NOK"),
                "DKK" => Some("DKK"),
                "CHF" => Some("CHF"),
                "INR" => Some("INR"),
                _ => None,
            }
        }
    }
}

/// All currency token matches in `text`.
pub fn find_currency_tokens(text: &str) -> Vec<TokenMatch> {
    CURRENCY_TOKEN
        .find_iter(text)
        .map(|m| TokenMatch {
            value: m.as_str().to_string(),
            char_index: m.start(),
            length: m.end() - m.start(),
        })
        .collect()
}

/// All amount token matches in `text`, in char offsets. Overlapping
/// candidates sharing a digit-run boundary (e.g. scanning right after a
/// match that consumed its trailing non-digit guard) are handled by
/// restarting the scan right after the captured group rather than after the
/// full match.
pub fn find_amount_tokens(text: &str) -> Vec<TokenMatch> {
    let mut out = Vec::new();
    let mut search_from = 0usize;
    while let Some(caps) = AMOUNT_TOKEN.captures(&text[search_from..]) {
        let group = caps.get(1).unwrap();
        let abs_start = search_from + group.start();
        let abs_end = search_from + group.end();
        let char_index = text[..abs_start].chars().count();
        let length = text[abs_start..abs_end].chars().count();
        out.push(TokenMatch {
            value: group.as_str().to_string(),
            char_index,
            length,
        });
        search_from = abs_end;
    }
    out
}

/// Strip currency symbols/codes, then parse the remaining decimal under the
/// given locale's separator convention, falling back to trying either
/// convention when the locale is `Unknown`.
pub fn parse_amount(text: &str, locale: Locale) -> Option<Decimal> {
    let cleaned = ANY_CURRENCY.replace_all(text, "").trim().to_string();
    if cleaned.is_empty() {
        return None;
    }

    if locale == Locale::European {
        if let Some(caps) = EUROPEAN_FORMATTED_AMOUNT.captures(&cleaned) {
            let int_part = caps[1].replace(' ', "").replace('.', "");
            return try_parse_decimal(&format!("{int_part}.{}", &caps[2]));
        }
        if let Some(caps) = SIMPLE_COMMA_DECIMAL.captures(&cleaned) {
            return try_parse_decimal(&format!("{}.{}", &caps[1], &caps[2]));
        }
    } else if locale == Locale::Us {
        if let Some(caps) = US_FORMATTED_AMOUNT.captures(&cleaned) {
            let int_part = caps[1].replace(',', "");
            return try_parse_decimal(&format!("{int_part}.{}", &caps[2]));
        }
        if let Some(caps) = SIMPLE_DOT_DECIMAL.captures(&cleaned) {
            return try_parse_decimal(&format!("{}.{}", &caps[1], &caps[2]));
        }
    }

    if let Some(caps) = COMMA_DECIMAL_WITH_SEPARATORS.captures(&cleaned) {
        let int_part = caps
            .get(1)
            .map(|m| m.as_str())
            .unwrap_or("")
            .replace(' ', "")
            .replace('.', "");
        return try_parse_decimal(&format!("{int_part}.{}", &caps[2]));
    }
    if let Some(caps) = DOT_DECIMAL_WITH_SEPARATORS.captures(&cleaned) {
        let int_part = caps[1].replace(',', "");
        return try_parse_decimal(&format!("{int_part}.{}", &caps[2]));
    }

    try_parse_decimal(&cleaned)
}

fn try_parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value).ok()
}

/// Amounts outside this open interval are treated as non-results by
/// downstream extractors.
pub fn is_plausible_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount < Decimal::from(10_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_currency_priority_order() {
        assert_eq!(detect_currency("€10 or $10"), Some("EUR"));
        assert_eq!(detect_currency("$10 or GBP"), Some("USD"));
        assert_eq!(detect_currency("150 kr"), Some("SEK"));
        assert_eq!(detect_currency("no currency here"), None);
    }

    #[test]
    fn normalizes_symbols_and_codes() {
        assert_eq!(normalize_currency_token("€"), Some("EUR"));
        assert_eq!(normalize_currency_token("kr"), Some("SEK"));
        assert_eq!(normalize_currency_token("eur"), Some("EUR"));
        assert_eq!(normalize_currency_token("zzz"), None);
    }

    #[test]
    fn parses_european_amount() {
        let amount = parse_amount("999 999,99", Locale::European).unwrap();
        assert_eq!(amount, Decimal::from_str("999999.99").unwrap());
    }

    #[test]
    fn parses_us_amount() {
        let amount = parse_amount("1,234.56", Locale::Us).unwrap();
        assert_eq!(amount, Decimal::from_str("1234.56").unwrap());
    }

    #[test]
    fn parses_dotted_thousands_with_comma_decimal_under_unknown_locale() {
        let amount = parse_amount("1.234,56 EUR", Locale::Unknown).unwrap();
        assert_eq!(amount, Decimal::from_str("1234.56").unwrap());
    }

    #[test]
    fn rejects_amounts_outside_plausible_range() {
        assert!(!is_plausible_amount(Decimal::ZERO));
        assert!(!is_plausible_amount(Decimal::from(10_000_000)));
        assert!(is_plausible_amount(Decimal::from_str("14.68").unwrap()));
    }

    #[test]
    fn finds_amount_tokens_with_thousand_separators() {
        let tokens = find_amount_tokens("Total 1 200,00 SEK and 14.68 USD");
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert!(values.contains(&"1 200,00"));
        assert!(values.contains(&"14.68"));
    }
}
