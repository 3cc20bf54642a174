use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "signon-ui", about = "Credential negotiation for single sign-on requests")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one negotiation and print the reply map as JSON
    Query {
        /// JSON file with the request options. With - the terminal prompt has
        /// no input left and cancels.
        #[arg(short, long)]
        request: String,
    },
    /// Validate a request and print the mode it would run in, without any UI
    Check {
        /// JSON file with the request options, or - for stdin
        #[arg(short, long, default_value = "-")]
        request: String,
    },
}
