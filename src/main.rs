use chart_processor::cli::{args::Args, commands};
use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Create cancellation token for coordinating graceful shutdown
        let cancellation_token = CancellationToken::new();

        let signal_token = cancellation_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nReceived CTRL+C, shutting down gracefully...");
                // Cancel all operations when Ctrl+C is received
                signal_token.cancel();
            }
        });

        commands::run(args, cancellation_token).await
    });

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Chart Processor - Country Music Charts to Parquet");
    println!("=================================================");
    println!();
    println!("Fetch top artist and top track charts per country from the Last.fm API,");
    println!("keep every response as a raw JSON snapshot, and combine snapshots into");
    println!("one Parquet dataset per chart type.");
    println!();
    println!("USAGE:");
    println!("    chart_processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    fetch       Fetch one chart for one country");
    println!("    ingest      Fetch artists and tracks for all configured countries");
    println!("    transform   Combine raw JSON snapshots into a Parquet file");
    println!("    schedule    Run ingestion every N hours until interrupted");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("ENVIRONMENT:");
    println!("    LASTFM_API_KEY   API key for chart requests (also read from .env)");
    println!("    LASTFM_BASE_URL  Override the API endpoint");
    println!();
    println!("EXAMPLES:");
    println!("    chart_processor fetch --country \"United States\" --type artists");
    println!("    chart_processor ingest --limit 50 --delay 1.5");
    println!("    chart_processor transform --type tracks --json-path data/raw/geo/tracks");
    println!("    chart_processor schedule --interval-hours 24 --run-now");
    println!();
    println!("For detailed help on any command, use:");
    println!("    chart_processor <COMMAND> --help");
}
