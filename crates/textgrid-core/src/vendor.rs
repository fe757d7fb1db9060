//! Vendor name resolution: a cascade of PDF-text extraction, forwarded-email
//! unwrapping, and sender-hint fallbacks, in that preference order.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::extraction::extractors::{vendor_name_extractors, VendorNameFallbackExtractor};
use crate::extraction::{aggregator, ExtractionContext, FieldExtractor};
use crate::locale::Locale;

lazy_static! {
    static ref FORWARD_MARKER: Regex = Regex::new(
        r"(?i)(forwarded message|original message|vidarebefordrat meddelande|weitergeleitete nachricht|begin forwarded message:)"
    ).unwrap();

    static ref FROM_NAME_EMAIL: Regex = Regex::new(r"(?im)^from:\s*(.+?)\s*<([^>]+)>").unwrap();
    static ref FROM_BARE_EMAIL: Regex = Regex::new(r"(?im)^from:\s*([^<\r\n]+@[^\s\r\n]+)").unwrap();
    static ref FRAN_NAME_EMAIL: Regex = Regex::new(r"(?im)^från:\s*(.+?)\s*<([^>]+)>").unwrap();
    static ref VON_NAME_EMAIL: Regex = Regex::new(r"(?im)^von:\s*(.+?)\s*<([^>]+)>").unwrap();

    static ref QUOTED_NAME: Regex = Regex::new(r#""([^"]{3,})"\s*<"#).unwrap();
    static ref NAME_BEFORE_ANGLE: Regex = Regex::new(r"^\s*([^<]+?)\s*<").unwrap();
    static ref GENERIC_EMAIL_SUFFIX: Regex = Regex::new(
        r"(?i)[-_\s]?(?:Billing|Payments?|Invoices?|Support|Noreply|Sales)\s*$"
    ).unwrap();
    static ref TRAILING_DASHES: Regex = Regex::new(r"[-_]+$").unwrap();

    static ref CUSTOMER_SECTION_HEADER: Regex = Regex::new(
        r"(?i)\b(bill\s*to|customer|client|buyer|köpare|kund|rechnungsempfänger)\b"
    ).unwrap();

    static ref ACCOUNT_PREFIX: Regex = Regex::new(r"(?i)^(account|acct|ref|no\.?)\s").unwrap();
    static ref COMPANY_WITH_SUFFIX: Regex = Regex::new(
        r"\b(?:[A-Z][A-Za-z0-9&.,'-]*\s+){0,3}[A-Z][A-Za-z0-9&.,'-]*\s+(?:s\.r\.o\.?|Ltd\.?|LLC|Inc\.?|AB|AS|Oy|GmbH|Corp\.?|Limited|PLC|PBC)\b"
    ).unwrap();
}

const EXCLUDE_PHRASES: &[&str] = &["thank you", "terms and conditions", "payment due"];

/// `co`, `com`, `net`, `org` — second-level domains that do not themselves
/// identify the company (e.g. `acme.co.uk`).
const COMMON_SECOND_LEVEL_DOMAINS: &[&str] = &["co", "com", "net", "org"];

const SENDER_HINT_STOP_TOKENS: &[&str] = &[
    "the", "inc", "llc", "ltd", "corp", "company", "co", "group", "team", "support", "billing",
    "invoices", "invoice", "notifications", "alerts", "mail", "email", "no", "reply", "noreply",
    "and", "of", "a", "an", "for", "services", "service", "solutions", "ab", "as", "gmbh", "oy",
    "plc", "pbc", "limited", "sro", "srl", "sa", "bv", "nv",
];

const SKIP_SUBDOMAINS: &[&str] = &[
    "mail", "email", "smtp", "noreply", "no-reply", "billing", "invoices", "notifications",
    "alerts",
];

/// Whether `body` looks like a forwarded message, by the presence of a
/// forward-marker line in any of the supported languages.
pub fn is_forwarded_email(body: &str) -> bool {
    FORWARD_MARKER.is_match(body)
}

/// Extract the original sender of a forwarded message body as a raw
/// `"Name <email>"` header value (or a bare email address if no display name
/// is present), so the domain survives for `extract_from_sender` to fall
/// back on if the display name turns out to be generic (e.g. "Billing").
pub fn extract_original_sender_from_forward(body: &str) -> Option<String> {
    for pattern in [&*FROM_NAME_EMAIL, &*FRAN_NAME_EMAIL, &*VON_NAME_EMAIL] {
        if let Some(caps) = pattern.captures(body) {
            let name = caps.get(1).map(|m| m.as_str().trim()).filter(|n| !n.is_empty());
            let email = caps.get(2).unwrap().as_str().trim();
            return Some(match name {
                Some(name) => format!("{name} <{email}>"),
                None => email.to_string(),
            });
        }
    }
    FROM_BARE_EMAIL
        .captures(body)
        .map(|caps| caps.get(1).unwrap().as_str().trim().to_string())
}

/// Derive a candidate vendor name from a `From:` header value: a quoted
/// display name, a bare display name before `<...>`, or a company name
/// derived from the domain.
pub fn extract_from_sender(from_header: &str) -> Option<String> {
    if let Some(caps) = QUOTED_NAME.captures(from_header) {
        let name = caps.get(1).unwrap().as_str().trim();
        if name.chars().count() >= 3 {
            return Some(name.to_string());
        }
    }
    if let Some(caps) = NAME_BEFORE_ANGLE.captures(from_header) {
        let name = caps.get(1).unwrap().as_str().trim().trim_matches('"');
        if !name.contains('@') {
            let stripped = GENERIC_EMAIL_SUFFIX.replace(name, "");
            let stripped = TRAILING_DASHES.replace(stripped.trim(), "");
            let stripped = stripped.trim();
            if stripped.chars().count() >= 3 {
                return Some(stripped.to_string());
            }
        }
    }
    company_from_email_domain(from_header)
}

fn company_from_email_domain(text: &str) -> Option<String> {
    let email = text
        .split(|c| c == '<' || c == '>')
        .find(|s| s.contains('@'))
        .unwrap_or(text)
        .trim();
    let domain = email.split('@').nth(1)?.trim();
    let labels: Vec<&str> = domain.split('.').filter(|s| !s.is_empty()).collect();
    if labels.is_empty() {
        return None;
    }

    let mut candidate = labels[0];
    if SKIP_SUBDOMAINS.contains(&candidate.to_lowercase().as_str()) && labels.len() > 1 {
        candidate = labels[1];
    }
    if COMMON_SECOND_LEVEL_DOMAINS.contains(&candidate.to_lowercase().as_str()) && labels.len() > 1
    {
        candidate = labels[0];
    }

    if candidate.is_empty() {
        return None;
    }
    let mut chars = candidate.chars();
    let first = chars.next()?.to_uppercase().to_string();
    Some(format!("{first}{}", chars.as_str()))
}

fn tokenize_hint(hint: &str) -> HashSet<String> {
    hint.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2 && !SENDER_HINT_STOP_TOKENS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// +3 votes for two or more overlapping tokens between a candidate vendor
/// name and the sender hint, +2 for exactly one, else 0.
fn sender_hint_bonus(candidate: &str, sender_hint: &str) -> i32 {
    let candidate_tokens = tokenize_hint(candidate);
    let hint_tokens = tokenize_hint(sender_hint);
    let overlap = candidate_tokens.intersection(&hint_tokens).count();
    match overlap {
        0 => 0,
        1 => 2,
        _ => 3,
    }
}

/// Binary search for the index of the line containing `needle`, by simple
/// linear containment check (lines are short enough that this is cheap, and
/// there is no precomputed sort order to binary search against).
fn find_line_index(lines: &[String], needle: &str) -> Option<usize> {
    lines.iter().position(|l| l.contains(needle))
}

/// Whether the line at `index` sits in a "bill to" / customer section,
/// scanning up to 12 preceding lines for a customer-section header.
fn is_customer_context(lines: &[String], index: usize) -> bool {
    let start = index.saturating_sub(12);
    lines[start..index]
        .iter()
        .any(|l| CUSTOMER_SECTION_HEADER.is_match(l))
}

fn normalize_vendor(value: &str) -> String {
    ACCOUNT_PREFIX.replace(value, "").trim().to_string()
}

/// Run the vendor-name extractors over the PDF text, sort survivors by
/// (votes, token count, length) descending, and reject candidates sitting in
/// a customer-context section or carrying an account-number prefix.
fn extract_from_pdf_text(
    text: &str,
    lines: &[String],
    locale: Locale,
    sender_hint: Option<&str>,
) -> Option<String> {
    let extractors = vendor_name_extractors();
    let refs: Vec<&dyn FieldExtractor> = extractors.iter().map(|e| e.as_ref()).collect();
    let ctx = ExtractionContext::new(text, locale);
    let candidates = aggregator::extract_all(std::slice::from_ref(&ctx), &refs);

    let mut scored: Vec<(String, i32)> = candidates
        .into_iter()
        .filter(|(value, _)| !ACCOUNT_PREFIX.is_match(value))
        .filter(|(value, _)| !EXCLUDE_PHRASES.iter().any(|p| value.to_lowercase().contains(p)))
        .filter(|(value, _)| {
            find_line_index(lines, value)
                .map(|idx| !is_customer_context(lines, idx))
                .unwrap_or(true)
        })
        .map(|(value, votes)| {
            let bonus = sender_hint.map(|hint| sender_hint_bonus(&value, hint)).unwrap_or(0);
            (value, votes + bonus)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| b.0.split_whitespace().count().cmp(&a.0.split_whitespace().count()))
            .then_with(|| b.0.len().cmp(&a.0.len()))
    });

    if let Some((value, _)) = scored.into_iter().next() {
        return Some(normalize_vendor(&value));
    }

    // Direct-scan fallback: a bare company-suffix match not preceded by a
    // customer-context header, skipping anything the extractor pass itself
    // already rejected for the same reason.
    for caps in COMPANY_WITH_SUFFIX.find_iter(text) {
        let candidate = caps.as_str();
        if EXCLUDE_PHRASES.iter().any(|p| candidate.to_lowercase().contains(p)) {
            continue;
        }
        if let Some(idx) = find_line_index(lines, candidate) {
            if is_customer_context(lines, idx) {
                continue;
            }
        }
        return Some(normalize_vendor(candidate));
    }

    None
}

/// Last-resort unanchored scan over the PDF's lines. Note: the guard that
/// would reject a bare two-letter suffix like `AB`/`AS` is intentionally
/// absent here, matching the extractor's own `is_plausible_vendor_name`
/// behavior — a short Nordic legal suffix is accepted exactly like a longer
/// one, never skipped.
fn extract_from_lines(lines: &[String], locale: Locale) -> Option<String> {
    let joined = lines.join("\n");
    let ctx = ExtractionContext::new(joined, locale);
    VendorNameFallbackExtractor
        .extract_all(&ctx)
        .into_iter()
        .find_map(|r| r.value)
        .map(|v| normalize_vendor(&v))
}

fn extract_from_email_body(body: &str, locale: Locale) -> Option<String> {
    let ctx = ExtractionContext::new(body, locale);
    VendorNameFallbackExtractor
        .extract_all(&ctx)
        .into_iter()
        .find_map(|r| r.value)
        .map(|v| normalize_vendor(&v))
}

/// Resolve the vendor name for an invoice: prefer the PDF body text, fall
/// back to the email envelope's sender identity, then to an unanchored scan
/// of the PDF lines, then to the email body itself.
///
/// `from_header` and `email_body` are the raw `From:` header value and email
/// body text, respectively, when an email envelope accompanies the PDF.
pub fn resolve(
    pdf_text: &str,
    pdf_lines: &[String],
    locale: Locale,
    from_header: Option<&str>,
    email_body: Option<&str>,
) -> Option<String> {
    let effective_from: Option<String> = match (from_header, email_body) {
        (Some(from), Some(body)) if is_forwarded_email(body) => {
            Some(extract_original_sender_from_forward(body).unwrap_or_else(|| from.to_string()))
        }
        (from, _) => from.map(|s| s.to_string()),
    };

    if let Some(vendor) =
        extract_from_pdf_text(pdf_text, pdf_lines, locale, effective_from.as_deref())
    {
        return Some(vendor);
    }

    if let Some(from) = effective_from.as_deref() {
        if let Some(vendor) = extract_from_sender(from) {
            return Some(vendor);
        }
    }

    if let Some(vendor) = extract_from_lines(pdf_lines, locale) {
        return Some(vendor);
    }

    email_body.and_then(|body| extract_from_email_body(body, locale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_forwarded_message_marker() {
        assert!(is_forwarded_email("---------- Forwarded message ---------"));
        assert!(!is_forwarded_email("Hi, please find the invoice attached."));
    }

    #[test]
    fn extracts_original_sender_name_and_email() {
        let body = "---------- Forwarded message ---------\nFrom: Acme Billing <billing@acme.com>\nSubject: Invoice";
        let sender = extract_original_sender_from_forward(body).unwrap();
        assert_eq!(sender, "Acme Billing <billing@acme.com>");
    }

    #[test]
    fn extract_from_sender_prefers_quoted_display_name() {
        let from = "\"Acme Corp\" <billing@acme.com>";
        assert_eq!(extract_from_sender(from).as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn extract_from_sender_derives_company_from_domain_skipping_billing_subdomain() {
        let from = "invoices@billing.acmewidgets.com";
        assert_eq!(extract_from_sender(from).as_deref(), Some("Acmewidgets".to_string()).as_deref());
    }

    #[test]
    fn pdf_text_extraction_skips_customer_context() {
        let text = "Bill To:\nCustomer Company AB\n\nReceipt from Acme Tech PBC\nTotal: 100.00";
        let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
        let vendor = extract_from_pdf_text(text, &lines, Locale::Unknown, None);
        assert_eq!(vendor.as_deref(), Some("Acme Tech PBC"));
    }

    #[test]
    fn resolve_falls_back_to_sender_hint_when_pdf_text_has_no_vendor() {
        let text = "Total: 100.00";
        let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
        let vendor = resolve(text, &lines, Locale::Unknown, Some("\"Acme Corp\" <billing@acme.com>"), None);
        assert_eq!(vendor.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn extract_from_sender_strips_generic_display_name_and_falls_back_to_domain() {
        let from = "Billing <billing@vendorco.example>";
        assert_eq!(extract_from_sender(from).as_deref(), Some("Vendorco"));
    }

    #[test]
    fn resolve_unwraps_forwarded_sender_and_derives_domain_when_pdf_has_no_vendor() {
        let body = "--- Forwarded message ---\nFrom: Billing <billing@vendorco.example>\nSubject: Invoice\n\nPlease see attached.";
        let text = "Amount due: 100.00";
        let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
        let vendor = resolve(text, &lines, Locale::Unknown, Some("someone@mail.example"), Some(body));
        assert_eq!(vendor.as_deref(), Some("Vendorco"));
    }

    #[test]
    fn bare_nordic_suffix_is_not_rejected_by_line_fallback() {
        let lines = vec!["Billed by Svenska Bolag AB for services".to_string()];
        let vendor = extract_from_lines(&lines, Locale::Unknown);
        assert_eq!(vendor.as_deref(), Some("Svenska Bolag AB"));
    }
}
