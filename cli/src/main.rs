use clap::{Parser, Subcommand};

mod commands;
mod util;

#[derive(Parser)]
#[command(name = "lostfound", version, about = "Lost & Found CLI: search the campus lost and found board")]
struct Cli {
    /// API base URL
    #[arg(long, env = "LOSTFOUND_API_URL", default_value = "http://localhost:5000")]
    api_url: String,

    /// Log requests to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Search items in natural language
    Search(commands::search::SearchArgs),
    /// Show how the offline extractor reads a query (no network)
    Parse(commands::parse::ParseArgs),
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "lostfound=debug".into()),
            )
            .init();
    }

    let code = match cli.command {
        Commands::Health => commands::health::run(&cli.api_url).await,
        Commands::Search(args) => commands::search::run(&cli.api_url, args).await,
        Commands::Parse(args) => commands::parse::run(args),
    };

    std::process::exit(code);
}
