pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "shelter")]
#[command(about = "Shelter CLI - database administration for the shelter API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending schema migrations")]
    Migrate,

    #[command(about = "Insert built-in roles, economic levels and an optional administrator")]
    Seed(commands::database::SeedArgs),

    #[command(about = "Remove every row from every entity table")]
    Clear {
        #[arg(long, help = "Skip the confirmation guard")]
        yes: bool,
    },

    #[command(about = "Mint an access token for an existing user")]
    Token {
        #[arg(help = "Email of the account")]
        email: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::database::migrate(output_format).await,
        Commands::Seed(args) => commands::database::seed(args, output_format).await,
        Commands::Clear { yes } => commands::database::clear(yes, output_format).await,
        Commands::Token { email } => commands::token::mint(&email, output_format).await,
    }
}
