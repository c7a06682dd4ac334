mod auth;
mod call;
mod show;

use crate::error::Result;
use clap::{Parser, Subcommand};

pub use auth::AuthProvider;
pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "sheet-relay")]
#[command(about = "Google Sheets, Gmail and Telegram tools for a conversational agent", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Tools => call::list_tools(),
            Commands::Call { tool, args } => call::execute(tool, args.as_deref()).await,
            Commands::Auth { provider, reset } => provider.execute(*reset).await,
            Commands::Show { resource } => resource.execute().await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available tools
    Tools,
    /// Invoke a tool and print its JSON result on stdout
    Call {
        /// Tool name, e.g. create_sheet
        tool: String,
        /// Tool arguments as a JSON object
        args: Option<String>,
    },
    /// Authenticate and cache credentials
    Auth {
        #[command(subcommand)]
        provider: AuthProvider,
        /// Discard cached tokens first
        #[arg(long, global = true)]
        reset: bool,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}
