use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod auth;
mod classify_cmd;
mod config;
mod llm;
mod state;

use classify_cmd::ClassifyOptions;

#[derive(Parser, Debug)]
#[command(name = "gastos", version, about = "Classify bank statement rows into spending categories")]
struct Cli {
    /// More logging on stderr (-v info, -vv debug). Otherwise GASTOS_LOG applies.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify one or more statements (CSV or XLSX) and export Date/Amount/Category
    Classify {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write the combined CSV here instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Ask for a short explanation per row and add an Explanation column
        #[arg(long)]
        explain: bool,

        /// Keep the original description as a Note column
        #[arg(long)]
        include_note: bool,

        /// Cache and keyword rules only; rows needing the remote model are marked as errors
        #[arg(long)]
        offline: bool,
    },

    /// Show which headers were picked as description, date and amount
    Columns { file: PathBuf },

    /// List the configured categories and keyword rules
    Categories,

    /// Manage ~/.gastos/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store API keys in ~/.gastos/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    PasteOpenaiApiKey,
    PasteAnthropicApiKey,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("GASTOS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Classify {
            files,
            out,
            explain,
            include_note,
            offline,
        } => {
            let opts = ClassifyOptions {
                out,
                explain,
                include_note,
                offline,
            };
            classify_cmd::classify_files(&files, &opts)?;
        }

        Command::Columns { file } => classify_cmd::show_columns(&file)?,

        Command::Categories => classify_cmd::show_categories()?,

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteOpenaiApiKey => auth::openai_paste_api_key()?,
            AuthCommand::PasteAnthropicApiKey => auth::anthropic_paste_api_key()?,
        },
    }

    Ok(())
}
