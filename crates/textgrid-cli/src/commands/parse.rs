//! `textgrid parse` — extract structured invoice fields from one or more
//! text extraction variants, with an optional email envelope.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use textgrid_core::{
    locale, EmailContext, InvoiceParsingFacade, Locale, ParsedInvoiceDto, PdfExtractionResult,
    PdfExtractionVariant,
};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Args)]
pub struct ParseArgs {
    /// One or more text extraction variants for the same document. Each is
    /// named after its file stem (e.g. `invoice.pdfpig-layout.txt` ->
    /// extractor name `pdfpig-layout`).
    inputs: Vec<PathBuf>,

    /// The `From:` header of an accompanying email, if any
    #[arg(long)]
    email_from: Option<String>,

    /// The subject line of an accompanying email, if any
    #[arg(long)]
    email_subject: Option<String>,

    /// The send date of an accompanying email, as `YYYY-MM-DD`
    #[arg(long)]
    email_date: Option<String>,

    /// Path to a file containing the body of an accompanying email
    #[arg(long)]
    email_body_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Emit the flattened outward DTO instead of the full internal record
    #[arg(long)]
    dto: bool,
}

pub fn run(args: ParseArgs, _config_path: Option<&str>) -> anyhow::Result<()> {
    if args.inputs.is_empty() && args.email_from.is_none() && args.email_body_file.is_none() {
        anyhow::bail!("provide at least one text variant or an email envelope flag");
    }

    let mut variants = Vec::new();
    for path in &args.inputs {
        let text = fs::read_to_string(path)?;
        let extractor_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("default")
            .to_string();
        variants.push(PdfExtractionVariant::new(text, extractor_name));
    }
    let extraction = PdfExtractionResult::new(variants);

    let email_body = args
        .email_body_file
        .as_ref()
        .map(fs::read_to_string)
        .transpose()?;

    let email = EmailContext {
        from: args.email_from.clone(),
        subject: args.email_subject.clone(),
        body: email_body,
        date: args
            .email_date
            .as_deref()
            .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
    };
    let has_email = email.from.is_some() || email.subject.is_some() || email.body.is_some();

    let invoice = InvoiceParsingFacade::parse_invoice(&extraction, has_email.then_some(&email));

    match args.format {
        OutputFormat::Json => {
            if args.dto {
                let detected_locale = extraction
                    .best_text()
                    .map(locale::detect)
                    .unwrap_or(Locale::Unknown);
                let dto = ParsedInvoiceDto::from_parsed_invoice(&invoice, detected_locale);
                println!("{}", serde_json::to_string_pretty(&dto)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&invoice)?);
            }
        }
        OutputFormat::Text => print_text(&invoice),
    }

    Ok(())
}

fn print_text(invoice: &textgrid_core::ParsedInvoice) {
    println!("{}", style("Parsed invoice").bold());
    print_field("Invoice number", &invoice.invoice_number);
    print_field("Vendor", &invoice.vendor_name);
    print_field("Invoice date", &invoice.invoice_date_raw);
    print_field("Due date", &invoice.due_date_raw);
    print_field(
        "Total",
        &invoice
            .total_amount
            .map(|a| format!("{a} {}", invoice.currency.as_deref().unwrap_or(""))),
    );
    print_field("VAT", &invoice.vat_amount.map(|a| a.to_string()));

    if !invoice.line_items.is_empty() {
        println!("{}", style("Line items:").underlined());
        for item in &invoice.line_items {
            println!("  {} — {:?}", item.description, item.amount);
        }
    }

    if invoice.warnings.is_empty() {
        println!(
            "{} confidence {:.2}",
            style("✓").green(),
            invoice.confidence
        );
    } else {
        println!(
            "{} confidence {:.2}, warnings: {}",
            style("!").yellow(),
            invoice.confidence,
            invoice.warnings.join(", ")
        );
    }
}

fn print_field(label: &str, value: &Option<String>) {
    match value {
        Some(v) => println!("{:<16} {}", format!("{label}:"), v),
        None => println!("{:<16} {}", format!("{label}:"), style("(missing)").dim()),
    }
}
