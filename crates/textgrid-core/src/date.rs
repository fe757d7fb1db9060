//! Recognizing and parsing the fixed set of invoice date shapes.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::locale::Locale;

/// `(month name, numeric month)` pairs across English (full + abbreviated),
/// Swedish, and German. Order matters only for `month_name_alternation`,
/// which sorts by length to prefer the longer match first per the spec's
/// documented "mars" (Swedish) vs "Mar" (English) ambiguity.
const MONTH_NAMES: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
    ("januari", 1),
    ("februari", 2),
    ("mars", 3),
    ("maj", 5),
    ("juni", 6),
    ("juli", 7),
    ("augusti", 8),
    ("oktober", 10),
    ("sept", 9),
    ("okt", 10),
    ("januar", 1),
    ("märz", 3),
    ("mai", 5),
    ("dezember", 12),
];

fn month_name_alternation() -> String {
    let mut names: Vec<&str> = MONTH_NAMES.iter().map(|(name, _)| *name).collect();
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    names.join("|")
}

lazy_static! {
    static ref MONTH_ALTERNATION: String = month_name_alternation();

    /// Exposed for use by date-field extractors, which capture the raw
    /// matched text and parse it separately via [`parse`].
    pub static ref DATE_TOKEN_PATTERN: Regex = Regex::new(&format!(
        r"(?i)\d{{4}}-\d{{2}}-\d{{2}}(?:\D|$)|\d{{1,2}}\.\d{{1,2}}\.\d{{4}}(?:\D|$)|\d{{1,2}}/\d{{1,2}}/\d{{4}}(?:\D|$)|\b(?:{alt})\.?\s+\d{{1,2}},?\s+\d{{4}}\b|\b\d{{1,2}}\s+(?:{alt})\.?\s+\d{{4}}\b",
        alt = *MONTH_ALTERNATION,
    ))
    .unwrap();

    static ref ISO_DATE: Regex = Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap();
    static ref EUROPEAN_DATE: Regex = Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{4})").unwrap();
    static ref SLASH_DATE: Regex = Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").unwrap();

    /// One `(before, after)` regex pair per month name, compiled once and
    /// indexed in parallel with `MONTH_NAMES`.
    static ref MONTH_NAME_PATTERNS: Vec<(Regex, Regex)> = MONTH_NAMES
        .iter()
        .map(|(name, _)| {
            let escaped = regex::escape(name);
            (
                Regex::new(&format!(r"(?i){escaped}\.?\s+(\d{{1,2}}),?\s+(\d{{4}})")).unwrap(),
                Regex::new(&format!(r"(?i)(\d{{1,2}})\s+{escaped}\.?\s+(\d{{4}})")).unwrap(),
            )
        })
        .collect();
}

/// Parse a free-text date under the given locale. Tries ISO, then
/// dot-separated European, then slash-separated (resolved by locale), then
/// falls back to a linear scan of the month-name table for `Month DD, YYYY`
/// and `DD Month YYYY` shapes, in the table's declared order (longer names
/// win ties by virtue of [`DATE_TOKEN_PATTERN`]'s alternation order; this
/// fallback itself just takes the first name that matches at all).
pub fn parse(text: &str, locale: Locale) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = EUROPEAN_DATE.captures(text) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        if locale != Locale::Us && first <= 31 && second <= 12 {
            if let Some(date) = NaiveDate::from_ymd_opt(year, second, first) {
                return Some(date);
            }
        }
    }

    if let Some(caps) = SLASH_DATE.captures(text) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        if locale == Locale::Us {
            if first <= 12 && second <= 31 {
                if let Some(date) = NaiveDate::from_ymd_opt(year, first, second) {
                    return Some(date);
                }
            }
        } else if first <= 31 && second <= 12 {
            if let Some(date) = NaiveDate::from_ymd_opt(year, second, first) {
                return Some(date);
            }
        }
    }

    for ((_, month_num), (before, after)) in MONTH_NAMES.iter().zip(MONTH_NAME_PATTERNS.iter()) {
        if let Some(caps) = before.captures(text) {
            let day: u32 = caps[1].parse().ok()?;
            let year: i32 = caps[2].parse().ok()?;
            if let Some(date) = NaiveDate::from_ymd_opt(year, *month_num, day) {
                return Some(date);
            }
        }

        if let Some(caps) = after.captures(text) {
            let day: u32 = caps[1].parse().ok()?;
            let year: i32 = caps[2].parse().ok()?;
            if let Some(date) = NaiveDate::from_ymd_opt(year, *month_num, day) {
                return Some(date);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_date() {
        assert_eq!(
            parse("2024-06-01", Locale::Unknown),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[test]
    fn resolves_ambiguous_slash_date_by_locale() {
        assert_eq!(
            parse("02/03/2024", Locale::Us),
            NaiveDate::from_ymd_opt(2024, 2, 3)
        );
        assert_eq!(
            parse("02/03/2024", Locale::European),
            NaiveDate::from_ymd_opt(2024, 3, 2)
        );
    }

    #[test]
    fn parses_dotted_european_date() {
        assert_eq!(
            parse("15.08.2024", Locale::European),
            NaiveDate::from_ymd_opt(2024, 8, 15)
        );
    }

    #[test]
    fn parses_long_month_name_date() {
        assert_eq!(
            parse("January 6, 2026", Locale::Us),
            NaiveDate::from_ymd_opt(2026, 1, 6)
        );
    }

    #[test]
    fn returns_none_for_unrecognized_shape() {
        assert_eq!(parse("not a date", Locale::Unknown), None);
    }

    #[test]
    fn date_token_pattern_matches_all_five_shapes() {
        assert!(DATE_TOKEN_PATTERN.is_match("2024-06-01 "));
        assert!(DATE_TOKEN_PATTERN.is_match("15.08.2024 "));
        assert!(DATE_TOKEN_PATTERN.is_match("02/03/2024 "));
        assert!(DATE_TOKEN_PATTERN.is_match("January 6, 2026"));
        assert!(DATE_TOKEN_PATTERN.is_match("6 mars 2024"));
        assert!(!DATE_TOKEN_PATTERN.is_match("no date here"));
    }
}
