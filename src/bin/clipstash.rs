use anyhow::Result;
use clap::Parser;
use clipstash::cli::Cli;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first so the log level can follow --verbose/--quiet
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    // Initialize tracing with environment-based filtering
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    debug!("Starting clipstash {}", clipstash::VERSION);

    // Execute command with user-friendly error handling
    if let Err(e) = cli.execute().await {
        // Log the full error for debugging
        debug!("Command execution failed: {:?}", e);

        // Display user-friendly error message
        eprintln!("Error: {}", e.user_message());

        // Exit with error code
        std::process::exit(1);
    }

    debug!("Command completed successfully");
    Ok(())
}
