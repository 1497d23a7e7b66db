use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pyramid")]
#[command(version = "0.1.0")]
#[command(
    about = "Webhook signal relay with streak-based position sizing",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override dry run mode: `--dry-run` = true, `--dry-run=false` = false
    #[arg(short, long, num_args = 0..=1, default_missing_value = "true")]
    pub dry_run: Option<bool>,

    /// Config directory (default.toml plus $PYRAMID_ENV overrides)
    #[arg(short, long, default_value = "config")]
    pub config: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the webhook server (default)
    Serve {
        /// Port to listen on (default: from config/env, usually 5000)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the persisted sizing state
    State,

    /// Replace the persisted sizing state with a fresh default
    Reset,
}

impl Cli {
    pub fn command_or_default(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve { port: None })
    }
}
