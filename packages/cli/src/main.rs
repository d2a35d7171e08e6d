mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    delete, export, import, list, show, DeleteArgs, ExportArgs, GlobalOptions, ImportArgs,
    ListArgs, ShowArgs,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Blockpen CLI - manage blog drafts in a local store
#[derive(Parser, Debug)]
#[command(name = "blockpen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Draft store directory (overrides `storeDir` in blockpen.config.json)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored drafts
    List(ListArgs),

    /// Print one draft
    Show(ShowArgs),

    /// Export drafts as JSON
    Export(ExportArgs),

    /// Import drafts from a JSON file
    Import(ImportArgs),

    /// Delete a draft
    Delete(DeleteArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = GlobalOptions {
        store_dir: cli.store_dir,
    };

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::List(args) => list(args, &cwd, &options),
                Command::Show(args) => show(args, &cwd, &options),
                Command::Export(args) => export(args, &cwd, &options),
                Command::Import(args) => import(args, &cwd, &options),
                Command::Delete(args) => delete(args, &cwd, &options),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_import_flags() {
        let cli = Cli::parse_from([
            "blockpen",
            "--store-dir",
            "/tmp/drafts",
            "import",
            "posts.json",
            "--overwrite",
        ]);

        assert_eq!(cli.store_dir, Some(PathBuf::from("/tmp/drafts")));
        match cli.command {
            Command::Import(args) => {
                assert!(args.overwrite);
                assert!(!args.replace);
                assert_eq!(args.file, PathBuf::from("posts.json"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
