//! Notewise CLI - summaries, tags and flashcards from study notes
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use notewise::server::{self, AppState};
use notewise::{agent, CombinedResult, Config, OutputSchema, Pipeline};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "notewise")]
#[command(author, version, about = "Summaries, tags and flashcards from study notes", long_about = None)]
struct Cli {
    /// Path to a notewise.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Summarise, tag and build flashcards for a file (stdin if omitted)
    Process {
        file: Option<PathBuf>,
        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },
    /// Summarise a file (stdin if omitted)
    Summarise { file: Option<PathBuf> },
    /// Generate tags for a file (stdin if omitted)
    Tags { file: Option<PathBuf> },
    /// Print the JSON Schema of an output (summary, tags or combined)
    Schema { schema: OutputSchema },
    /// Generate shell completions
    Completions { shell: clap_complete::Shell },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "notewise=debug"
    } else {
        "notewise=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Some(Commands::Schema { schema }) => {
            println!("{}", serde_json::to_string_pretty(&schema.json_schema()?)?);
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "notewise", &mut std::io::stdout());
        }
        Some(Commands::Process { file, json }) => {
            let config = load_config(cli.config.as_ref())?;
            let pipeline = build_pipeline(&config)?;
            let text = read_input(file.as_ref())?;
            let result = pipeline.process(&text).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_combined(&result);
            }
        }
        Some(Commands::Summarise { file }) => {
            let config = load_config(cli.config.as_ref())?;
            let pipeline = build_pipeline(&config)?;
            let text = read_input(file.as_ref())?;
            let summary = pipeline.summarise(&text).await?;
            println!("{}", summary.summary);
        }
        Some(Commands::Tags { file }) => {
            let config = load_config(cli.config.as_ref())?;
            let pipeline = build_pipeline(&config)?;
            let text = read_input(file.as_ref())?;
            let tags = pipeline.generate_tags(&text).await?;
            println!("{}", tags.tags.join(", "));
        }
        Some(Commands::Serve { host, port }) => {
            let config = load_config(cli.config.as_ref())?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            run_server(&config, &host, port).await?;
        }
        None => {
            // Default: run the HTTP service
            let config = load_config(cli.config.as_ref())?;
            run_server(&config, &config.server.host, config.server.port).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    Ok(match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    })
}

fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let invoker = agent::build_invoker(config)?;
    Ok(Pipeline::new(invoker))
}

async fn run_server(config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    tracing::info!(
        provider = config.agent.provider.as_str(),
        model = %config.agent.model,
        "pipeline ready"
    );
    server::serve(AppState::new(pipeline, config.agent.provider), host, port).await
}

/// Read the whole input from a file, or stdin when no file is given
fn read_input(file: Option<&PathBuf>) -> anyhow::Result<String> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(text)
}

fn print_combined(result: &CombinedResult) {
    println!("{}", "📝 Summary:".bold());
    println!("  {}\n", result.summary);

    println!("{}", "🏷️  Tags:".bold());
    println!("  {}", result.tags.join(", ").cyan());

    if result.has_flashcards() {
        println!("\n{}", "🃏 Flashcards:".bold());
        for (i, card) in result.flashcards.iter().enumerate() {
            println!("  {}. {}", i + 1, card.front.yellow());
            println!("     {}", card.back);
        }
    }
}
