use super::list::format_millis;
use super::{open_drafts, GlobalOptions};
use anyhow::{anyhow, Result};
use blockpen_editor::{Block, ListItem};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Draft id
    pub id: String,

    /// Print the stored record as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn show(args: ShowArgs, cwd: &str, options: &GlobalOptions) -> Result<()> {
    let drafts = open_drafts(cwd, options)?;
    let draft = drafts
        .get(&args.id)?
        .ok_or_else(|| anyhow!("Draft not found: {}", args.id))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&draft)?);
        return Ok(());
    }

    println!("{} {}", "Draft".green().bold(), draft.id.cyan());
    println!("   Name:     {}", draft.name);
    println!("   Title:    {}", draft.title.bold());
    println!("   Created:  {}", format_millis(draft.timestamp));
    println!("   Modified: {}", format_millis(draft.updated_at));
    println!();

    for block in &draft.blocks {
        print_block(block);
    }
    Ok(())
}

fn print_block(block: &Block) {
    match block {
        Block::Header(header) => {
            println!(
                "{} {}",
                "#".repeat(header.level.get() as usize).blue(),
                header.content.bold()
            );
        }
        Block::Paragraph(paragraph) => println!("{}", paragraph.content),
        Block::List(list) => {
            for (i, item) in list.items.iter().enumerate() {
                println!("  {} {}", format!("{}.", i + 1).dimmed(), list_item_text(item));
            }
        }
        Block::Card(card) => {
            for item in &card.cards {
                println!("  {} {}", "▣".magenta(), item.title.bold());
                if !item.content.is_empty() {
                    println!("    {}", item.content);
                }
            }
        }
    }
    println!();
}

fn list_item_text(item: &ListItem) -> String {
    match item {
        ListItem::Plain { content } => content.clone(),
        ListItem::Titled { title, content } => format!("{}: {}", title.bold(), content),
        ListItem::Definition { term, definition } => format!("{} - {}", term.bold(), definition),
    }
}
