use super::{open_drafts, GlobalOptions};
use anyhow::Result;
use blockpen_editor::{DraftSummary, Millis};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Order by last modification, newest first
    #[arg(short, long)]
    pub recent: bool,

    /// Print the index as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn list(args: ListArgs, cwd: &str, options: &GlobalOptions) -> Result<()> {
    let drafts = open_drafts(cwd, options)?;
    let summaries = if args.recent {
        drafts.recent()?
    } else {
        drafts.list()?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("{} No drafts yet", "∅".dimmed());
        return Ok(());
    }

    let current = drafts.current_id().ok().flatten();
    for summary in &summaries {
        print_summary(summary, current.as_deref() == Some(summary.id.as_str()));
    }

    println!();
    println!("   {} drafts", summaries.len());
    Ok(())
}

fn print_summary(summary: &DraftSummary, is_current: bool) {
    let marker = if is_current { "●".green() } else { " ".normal() };
    println!(
        "{} {}  {}  {}",
        marker,
        summary.id.cyan(),
        summary.name.bold(),
        format_millis(summary.last_modified()).dimmed()
    );
}

pub(crate) fn format_millis(millis: Millis) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "1970-01-01 00:00");
        assert_eq!(format_millis(1_700_000_000_000), "2023-11-14 22:13");
    }
}
