use anyhow::Context as _;
use clap::{Parser, Subcommand};
use research_agent::{AgentConfig, LlmProvider, ResearchAgent, ResearchResult};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "research-agent", version, about = "Research a question on the web and get a sourced answer")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Question to research; omit for an interactive session
    query: Option<String>,

    /// Generative model provider (overrides LLM_PROVIDER)
    #[arg(long, value_enum)]
    provider: Option<LlmProvider>,

    /// Write the result as JSON to this file
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the research API over HTTP
    Serve {
        #[arg(long, default_value_t = 3000)]
        port: u16,

        #[arg(long, value_enum)]
        provider: Option<LlmProvider>,

        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "research_agent=debug,research_flow=debug,tower_http=debug"
    } else {
        "research_agent=info,research_flow=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_agent(provider: Option<LlmProvider>) -> anyhow::Result<ResearchAgent> {
    let mut config = AgentConfig::from_env();
    if let Some(provider) = provider {
        config = config.with_provider(provider);
    }
    ResearchAgent::from_config(config).context("failed to initialize research agent")
}

fn print_result(result: &ResearchResult) {
    println!("\n{}\n", result.summary);
    if !result.detailed_response.is_empty() {
        println!("{}\n", result.detailed_response);
    }
    if !result.highlights.is_empty() {
        println!("Key points:");
        for highlight in &result.highlights {
            println!("  - {}", highlight);
        }
        println!();
    }
    if !result.sources.is_empty() {
        println!("Sources:");
        for (i, source) in result.sources.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, source.title, source.url);
        }
    }
}

fn write_result(result: &ResearchResult, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "result written");
    Ok(())
}

async fn interactive(agent: &ResearchAgent) -> anyhow::Result<()> {
    println!("Web research agent. Type a question, 'reset' to clear history, or 'exit' to quit.");
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\n> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let query = line.trim();

        match query.to_lowercase().as_str() {
            "" => continue,
            "exit" | "quit" => break,
            "reset" => {
                agent.reset().await;
                println!("Conversation history cleared.");
            }
            _ => print_result(&agent.research(query).await),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve {
            port,
            provider,
            verbose,
        }) => {
            init_tracing(verbose);
            let agent = Arc::new(build_agent(provider)?);
            research_agent::server::serve(agent, port).await
        }
        None => {
            init_tracing(cli.verbose);
            let agent = build_agent(cli.provider)?;
            match cli.query {
                Some(query) => {
                    let result = agent.research(&query).await;
                    match &cli.output {
                        Some(path) => write_result(&result, path)?,
                        None => print_result(&result),
                    }
                    Ok(())
                }
                None => interactive(&agent).await,
            }
        }
    }
}
