//! Static anchor tables, grouped by field. Anchors are compiled once (via
//! `lazy_static`) and shared read-only by every extractor that anchors
//! against them.

use lazy_static::lazy_static;
use regex::Regex;

use super::Anchor;

fn anchor(pattern: &str, bonus_votes: i32, description: &'static str) -> Anchor {
    Anchor {
        pattern: Regex::new(pattern).unwrap(),
        bonus_votes,
        description,
    }
}

lazy_static! {
    /// English, Nordic, German, and French invoice-number labels, plus a
    /// few format-shaped anchors (hyphenated alphanumerics, `INV######`).
    pub static ref INVOICE_NUMBER_ANCHORS: Vec<Anchor> = vec![
        anchor(r"(?i)invoice\s*(?:#|number|no\.?|num)", 3, "Invoice #"),
        anchor(r"(?i)inv\s*(?:#|no\.?)", 3, "Inv No"),
        anchor(r"(?i)reference\s*(?:#|number|no\.?)", 2, "Reference number"),
        anchor(r"(?i)receipt\s*(?:#|number|no\.?)", 2, "Receipt #"),
        anchor(r"(?i)credit\s*note\s*(?:#|number|no\.?)", 2, "Credit note #"),
        anchor(r"(?i)fakturanummer|fakturan[rz]?[\.:]?", 3, "Fakturanummer"),
        anchor(r"(?i)rechnungsnummer|rechnungs-?nr", 3, "Rechnungsnummer"),
        anchor(r"(?i)num[ée]ro\s+de\s+facture|facture\s*n[o°]", 3, "Numéro de facture"),
        anchor(r"(?i)ordrenummer|bestillingsnummer", 2, "Ordrenummer"),
        anchor(r"：", 1, "fullwidth colon label"),
    ];

    /// "Total due"-family labels used by the total-amount extractor and,
    /// per §4.6, re-used by the anchored currency extractor.
    pub static ref TOTAL_AMOUNT_ANCHORS: Vec<Anchor> = vec![
        anchor(r"(?i)total\s+due", 3, "Total due"),
        anchor(r"(?i)amount\s+due", 3, "Amount due"),
        anchor(r"(?i)balance\s+due", 3, "Balance due"),
        anchor(r"(?i)\btotal\b", 2, "Total"),
        anchor(r"(?i)grand\s+total", 3, "Grand total"),
        anchor(r"(?i)att\s+betala|summa\s+att\s+betala", 3, "Att betala"),
        anchor(r"(?i)gesamtbetrag|endbetrag", 3, "Gesamtbetrag"),
        anchor(r"(?i)montant\s+(?:total|d[uû])", 3, "Montant total"),
        anchor(r"：", 1, "fullwidth colon label"),
    ];

    pub static ref SUBTOTAL_ANCHORS: Vec<Anchor> = vec![
        anchor(r"(?i)sub ?total", 3, "Subtotal"),
        anchor(r"(?i)total\s+excl(?:uding)?(?:\s+vat)?", 3, "Total excl. VAT"),
        anchor(r"(?i)netto(?:betrag)?|n\.?etto", 2, "Netto"),
        anchor(r"(?i)delsumma(?:\s+i\s+\w+)?", 3, "Delsumma"),
    ];

    pub static ref VAT_ANCHORS: Vec<Anchor> = vec![
        anchor(r"(?i)\bvat\b", 2, "VAT"),
        anchor(r"(?i)\bmoms\b", 3, "Moms"),
        anchor(r"(?i)mehrwertsteuer|mwst\.?", 3, "Mehrwertsteuer"),
        anchor(r"(?i)\btva\b", 3, "TVA"),
        anchor(r"(?i)tax\b", 1, "Tax"),
    ];

    pub static ref INVOICE_DATE_ANCHORS: Vec<Anchor> = vec![
        anchor(r"(?i)invoice\s+date", 3, "Invoice date"),
        anchor(r"(?i)date\s+of\s+issue", 3, "Date of issue"),
        anchor(r"(?i)issue\s+date", 3, "Issue date"),
        anchor(r"(?i)fakturadatum", 3, "Fakturadatum"),
        anchor(r"(?i)rechnungsdatum", 3, "Rechnungsdatum"),
        anchor(r"(?i)date\s+de\s+facture", 3, "Date de facture"),
    ];

    pub static ref DUE_DATE_ANCHORS: Vec<Anchor> = vec![
        anchor(r"(?i)due\s+date", 3, "Due date"),
        anchor(r"(?i)payment\s+due", 2, "Payment due"),
        anchor(r"(?i)f[öo]rfallodatum", 3, "Förfallodatum"),
        anchor(r"(?i)f[äa]lligkeitsdatum|f[äa]llig\s+am", 3, "Fälligkeitsdatum"),
        anchor(r"(?i)date\s+d[’']?[ée]ch[ée]ance", 3, "Date d'échéance"),
    ];

    /// Vendor-context labels that precede the vendor's name line or block.
    pub static ref VENDOR_CONTEXT_ANCHORS: Vec<Anchor> = vec![
        anchor(r"(?i)receipt\s+from", 3, "Receipt from"),
        anchor(r"(?i)invoice\s+from", 3, "Invoice from"),
        anchor(r"(?i)f[åa]n|levererat\s+av", 2, "Från"),
        anchor(r"(?i)von|rechnung\s+von", 2, "Von"),
        anchor(r"(?i)de\s+la\s+part\s+de", 2, "De la part de"),
    ];

    /// Customer-section headers used for customer-context suppression of a
    /// candidate vendor name (§4.8).
    pub static ref CUSTOMER_CONTEXT_HEADERS: Vec<Regex> = vec![
        Regex::new(r"(?i)bill\s+to").unwrap(),
        Regex::new(r"(?i)sold\s+to").unwrap(),
        Regex::new(r"(?i)ship\s+to").unwrap(),
        Regex::new(r"(?i)\bcustomer\b").unwrap(),
        Regex::new(r"(?i)\bbuyer\b").unwrap(),
        Regex::new(r"(?i)account\s+information").unwrap(),
        Regex::new(r"(?i)kund(?:information)?").unwrap(),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_number_anchors_cover_nordic_and_english_labels() {
        assert!(INVOICE_NUMBER_ANCHORS
            .iter()
            .any(|a| a.pattern.is_match("Invoice #INV-12345")));
        assert!(INVOICE_NUMBER_ANCHORS
            .iter()
            .any(|a| a.pattern.is_match("Fakturanummer: 2024-0099")));
    }

    #[test]
    fn subtotal_anchors_recognize_excl_vat_wording() {
        assert!(SUBTOTAL_ANCHORS
            .iter()
            .any(|a| a.pattern.is_match("Total excluding VAT")));
    }
}
