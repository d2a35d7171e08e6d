use super::{open_drafts, GlobalOptions};
use anyhow::{Context, Result};
use blockpen_editor::{ImportOptions, ImportPayload};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON file with one draft or `{ "drafts": [...] }`
    pub file: PathBuf,

    /// Replace drafts whose id already exists
    #[arg(long)]
    pub overwrite: bool,

    /// Delete every stored draft before importing
    #[arg(long)]
    pub replace: bool,
}

pub fn import(args: ImportArgs, cwd: &str, options: &GlobalOptions) -> Result<()> {
    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("Cannot read {}", args.file.display()))?;
    let payload = ImportPayload::from_json(&content)?;

    println!("📥 {} {}", "Importing".green().bold(), args.file.display());
    println!("   Drafts in file: {}", payload.len());
    if args.replace {
        println!("   {} existing drafts will be removed", "Note:".yellow());
    }

    let drafts = open_drafts(cwd, options)?;
    let result = drafts.import(
        &payload,
        ImportOptions {
            overwrite: args.overwrite,
            replace: args.replace,
        },
    )?;

    println!();
    println!("✨ {} Import complete!", "Done".green().bold());
    println!("   Imported: {}", result.imported);
    println!("   Updated:  {}", result.updated);
    if result.skipped > 0 {
        println!(
            "   {} {} (use --overwrite to replace)",
            "Skipped:".yellow(),
            result.skipped
        );
    }

    Ok(())
}
