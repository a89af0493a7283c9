use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use config::ApiType;

#[derive(Debug, Parser)]
#[command(name = app::NAME, version = app::VERSION, about = "Translate HTML pages with a language model")]
pub struct Cli {
    /// Path to the TOML config, generated on first run
    #[arg(short, long, default_value = "pagetrans.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Translate every eligible element of an HTML file
    Translate {
        input: PathBuf,
        /// Defaults to `<stem>.translated.html` next to the input
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Charset of the input file, e.g. `iso-8859-1`
        #[arg(short, long, default_value = "utf-8")]
        encoding: String,
    },
    /// Translate one piece of text with the active endpoint
    Text { text: String },
    /// Manage inference endpoints
    #[command(subcommand)]
    Endpoint(EndpointCommand),
    /// Answer newline-delimited JSON messages on stdin
    Serve,
}

impl Command {
    /// Whether the command writes human oriented output.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, Command::Serve)
    }
}

#[derive(Debug, Subcommand)]
pub enum EndpointCommand {
    List,
    Add(EndpointArgs),
    Update {
        id: String,
        #[command(flatten)]
        args: EndpointArgs,
    },
    Remove {
        id: String,
    },
    /// Make an endpoint the active one
    Use {
        id: String,
    },
    /// Print the suggested prompt template of a dialect
    Preset {
        api_type: ApiType,
    },
}

#[derive(Debug, Clone, Args)]
pub struct EndpointArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub url: String,
    #[arg(long)]
    pub model: String,
    /// chat, completions, translategemma or plamo
    #[arg(long, default_value = "completions")]
    pub api_type: ApiType,
    /// Falls back to the dialect preset when omitted
    #[arg(long)]
    pub template: Option<String>,
}
