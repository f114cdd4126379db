//! Link Cart CLI
//!
//! Command-line interface for Link Cart - save, tag and search links.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use linkcart_core::{Config, ImportPolicy, JsonFileBackend, Store};

mod commands;
mod logging;
mod output;
mod prompt;

use commands::link::AddArgs;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "linkcart")]
#[command(about = "Link Cart - save, tag and search links")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a new link
    Add {
        /// URL to save (https:// is assumed when no scheme is given)
        url: String,
        /// Title (looked up from the page when omitted)
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Tags to add (repeatable, comma-separated)
        #[arg(short, long)]
        tag: Vec<String>,
        /// Don't look up the page title
        #[arg(long)]
        no_fetch: bool,
    },
    /// List links
    #[command(alias = "ls")]
    List {
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Filter by text in title, URL or tags
        #[arg(short, long)]
        search: Option<String>,
        /// Only show favorites
        #[arg(short, long)]
        favorites: bool,
    },
    /// Search links
    Search {
        /// Text to look for in title, URL or tags
        text: String,
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// Show link details
    Show {
        /// Link ID (full ID or prefix)
        id: String,
    },
    /// Edit a link
    Edit {
        /// Link ID (full ID or prefix)
        id: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Replacement tags (repeatable, comma-separated)
        #[arg(short, long)]
        tag: Vec<String>,
    },
    /// Toggle the favorite flag
    #[command(alias = "favorite")]
    Fav {
        /// Link ID (full ID or prefix)
        id: String,
    },
    /// Delete a link
    #[command(alias = "delete")]
    Rm {
        /// Link ID (full ID or prefix)
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Open a link in the browser
    Open {
        /// Link ID (full ID or prefix)
        id: String,
    },
    /// List all tags
    Tags,
    /// Export all links as JSON
    Export {
        /// Output file or directory ("-" for stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Import links from a JSON export
    Import {
        /// File to import
        file: PathBuf,
        /// How to handle links that already exist (duplicate, skip, overwrite)
        #[arg(long)]
        policy: Option<ImportPolicy>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, resolve_titles, resolve_timeout_secs,
        /// user_agent, tag_policy, import_policy, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    logging::init(&config);

    let mut store =
        Store::open(JsonFileBackend::new(config.links_path())).with_tag_policy(config.tag_policy);

    match cli.command {
        Commands::Add {
            url,
            title,
            tag,
            no_fetch,
        } => {
            let args = AddArgs {
                url,
                title,
                tags: tag,
                fetch_title: config.resolve_titles && !no_fetch,
            };
            commands::link::add(&mut store, &config, args, &output).await
        }
        Commands::List {
            tag,
            search,
            favorites,
        } => commands::link::list(&store, tag, search, favorites, &output),
        Commands::Search { text, tag } => commands::link::search(&store, text, tag, &output),
        Commands::Show { id } => commands::link::show(&store, id, &output),
        Commands::Edit { id, title, tag } => {
            commands::link::edit(&mut store, id, title, tag, &output)
        }
        Commands::Fav { id } => commands::link::favorite(&mut store, id, &output),
        Commands::Rm { id, yes } => commands::link::remove(&mut store, id, yes, &output),
        Commands::Open { id } => commands::link::open(&store, id, &output),
        Commands::Tags => commands::tag::list(&store, &output),
        Commands::Export { output: dest } => commands::transfer::export(&store, dest, &output),
        Commands::Import { file, policy } => {
            let policy = policy.unwrap_or(config.import_policy);
            commands::transfer::import(&mut store, file, policy, &output)
        }
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}
