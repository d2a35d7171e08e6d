use super::{open_drafts, GlobalOptions};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Draft id
    pub id: String,
}

pub fn delete(args: DeleteArgs, cwd: &str, options: &GlobalOptions) -> Result<()> {
    let drafts = open_drafts(cwd, options)?;

    if !drafts.delete(&args.id)? {
        return Err(anyhow!("Draft not found: {}", args.id));
    }

    println!("{} Deleted {}", "✓".green(), args.id.cyan());
    Ok(())
}
