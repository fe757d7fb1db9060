//! `textgrid textlayout` — reconstruct ordered text blocks from a
//! monospaced text dump.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use textgrid_core::TextGridConfig;

#[derive(Args)]
pub struct TextlayoutArgs {
    /// Path to the input text file (a monospaced PDF-text dump)
    input: PathBuf,

    /// Write the reconstructed layout to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: TextlayoutArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let text = fs::read_to_string(&args.input)?;
    let layout = textgrid_core::layout::extract(&text, config.min_gap);

    match args.output {
        Some(path) => {
            fs::write(&path, layout)?;
            println!("{} wrote layout to {}", style("✓").green(), path.display());
        }
        None => println!("{layout}"),
    }

    Ok(())
}

fn load_config(config_path: Option<&str>) -> anyhow::Result<TextGridConfig> {
    match config_path {
        Some(path) => Ok(TextGridConfig::from_file(std::path::Path::new(path))?),
        None => Ok(TextGridConfig::default()),
    }
}
