//! CLI subcommands.

pub mod parse;
pub mod textlayout;
