//! Sello command line tool

mod commands;
mod error;

use clap::{Parser, Subcommand};
use error::CliResult;

#[derive(Parser)]
#[command(name = "sello")]
#[command(about = "Sello - provenance marking and detection for AI-generated images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark an image as AI-generated with an embedded provenance manifest
    Mark {
        /// Image file to mark (PNG or JPEG)
        #[arg(short, long)]
        input: String,

        /// Output path; defaults to rewriting the input in place
        #[arg(short, long)]
        output: Option<String>,

        /// Generation prompt to record
        #[arg(short, long, default_value = "")]
        prompt: String,

        /// Generating model to record
        #[arg(short, long, default_value = "")]
        model: String,

        /// Author recorded in the creative-work assertion
        #[arg(long, default_value = "")]
        author: String,

        /// Private key PEM path (falls back to SELLO_PRIVATE_KEY)
        #[arg(short, long)]
        key: Option<String>,

        /// Certificate path (falls back to SELLO_CERTIFICATE)
        #[arg(long)]
        certificate: Option<String>,
    },

    /// Classify an image's provenance signals
    Detect {
        /// Image file to inspect
        #[arg(short, long)]
        input: String,

        /// Print the full detection result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate an Ed25519 signing key pair
    Keygen {
        /// Output directory for the PEM files
        #[arg(short, long, default_value = "keys")]
        output: String,
    },

    /// Report which signature mode a mark would use
    Status {
        /// Private key PEM path (falls back to SELLO_PRIVATE_KEY)
        #[arg(short, long)]
        key: Option<String>,

        /// Certificate path (falls back to SELLO_CERTIFICATE)
        #[arg(long)]
        certificate: Option<String>,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Mark {
            input,
            output,
            prompt,
            model,
            author,
            key,
            certificate,
        } => commands::mark::handle(input, output, prompt, model, author, key, certificate),
        Commands::Detect { input, json } => commands::detect::handle(input, json),
        Commands::Keygen { output } => commands::keygen::handle(output),
        Commands::Status { key, certificate } => commands::status::handle(key, certificate),
    }
}
