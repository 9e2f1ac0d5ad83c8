use chatrag::cli::handle_ask;
use chatrag::cli::handle_config;
use chatrag::cli::handle_index;
use chatrag::cli::handle_serve;
use chatrag::cli::print_error;
use chatrag::cli::Cli;
use chatrag::cli::Commands;
use chatrag::config::AppConfig;
use chatrag::Result;
use clap::Parser;
use tracing::error;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            chatrag::logging::init_logging()?;
            error!("Failed to load configuration: {}", e);
            print_error(&format!("Failed to load configuration: {e}"));
            return Err(e);
        }
    };

    if cli.verbose {
        chatrag::logging::init_logging_with_level("debug")?;
    } else {
        chatrag::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        print_error(&e.to_string());
        return Err(e);
    }

    let result = match cli.command {
        Commands::Serve { host, port } => handle_serve(&config, host, port).await,
        Commands::Ask {
            question,
            threshold,
            details,
        } => handle_ask(&config, question, threshold, details).await,
        Commands::Index { dir, keep_existing } => handle_index(&config, dir, keep_existing).await,
        Commands::Config { show } => {
            handle_config(&config, show);
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("Command failed: {}", e);
        print_error(&e.to_string());
    }
    result
}
