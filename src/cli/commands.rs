//! CLI command definitions and argument parsing

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "chatrag")]
#[command(about = "Chat webhook service answering questions from company documents")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: configured level)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the webhook and API server
    Serve {
        /// Host to bind (default: server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (default: server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ask one question through the RAG pipeline
    Ask {
        /// The question
        question: String,
        /// Similarity threshold override
        #[arg(short, long)]
        threshold: Option<f32>,
        /// Show expanded queries and matches
        #[arg(long)]
        details: bool,
    },
    /// Index documents into the vector namespace
    Index {
        /// Documents directory (default: ingest.documents_dir)
        #[arg(short, long)]
        dir: Option<String>,
        /// Append instead of clearing the namespace first
        #[arg(long)]
        keep_existing: bool,
    },
    /// Show current configuration
    Config {
        /// Print credentials unmasked
        #[arg(long)]
        show: bool,
    },
}
