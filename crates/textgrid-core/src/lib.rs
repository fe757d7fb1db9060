//! Text layout reconstruction and invoice field extraction.
//!
//! This crate provides:
//! - An XY-cut layout engine that turns a monospaced text dump into ordered,
//!   normalized text blocks.
//! - Locale detection, decimal-exact money parsing, and date-shape recognition.
//! - An anchored extraction engine correlating candidate values with label
//!   anchors by two-dimensional distance.
//! - A registry of field extractors (invoice number, totals, dates, VAT,
//!   vendor name) and a vote-aggregating unified parser.

pub mod config;
pub mod error;
pub mod locale;
pub mod money;
pub mod date;
pub mod layout;
pub mod extraction;
pub mod vendor;
pub mod parser;
pub mod model;

pub use config::TextGridConfig;
pub use error::{Error, Result};
pub use locale::Locale;
pub use model::{
    EmailContext, InvoiceLineItem, InvoiceParsingFacade, ParsedInvoice, ParsedInvoiceDto,
    PdfExtractionResult, PdfExtractionVariant,
};
pub use parser::UnifiedInvoiceParser;
