use super::{open_drafts, GlobalOptions};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export a single draft instead of all of them
    #[arg(long)]
    pub id: Option<String>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn export(args: ExportArgs, cwd: &str, options: &GlobalOptions) -> Result<()> {
    let drafts = open_drafts(cwd, options)?;

    let (json, count) = match &args.id {
        Some(id) => {
            let draft = drafts
                .get(id)?
                .ok_or_else(|| anyhow!("Draft not found: {}", id))?;
            (serde_json::to_string_pretty(&draft)?, 1)
        }
        None => {
            let export = drafts.export_all()?;
            (serde_json::to_string_pretty(&export)?, export.drafts.len())
        }
    };

    match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
            eprintln!(
                "{} Exported {} draft{} → {}",
                "✓".green(),
                count,
                if count == 1 { "" } else { "s" },
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
