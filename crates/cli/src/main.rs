//! papersmith - command-line companion to the gateway
//!
//! ## Usage
//!
//! ```bash
//! papersmith chat
//! papersmith research "soil microbiomes"
//! papersmith papers --email ada@example.com
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use papersmith_common::{
    config::AppConfig,
    db::{DbPool, PaperStore, PaperSummary, Repository, UserStore},
    generation::{GeminiClient, GenerationProvider},
    search::{SearchProvider, SerperClient},
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Results kept for a quick research summary
const RESEARCH_MAX_RESULTS: usize = 5;

#[derive(Parser)]
#[command(name = "papersmith")]
#[command(version, about = "Papersmith command-line tools", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat with the generation model
    Chat,

    /// Search the web for a topic and summarize the findings
    Research {
        /// Topic to research
        topic: String,
    },

    /// List stored papers
    Papers {
        /// Only papers owned by this account
        #[arg(long)]
        email: Option<String>,

        /// Maximum papers to show when listing across all accounts
        #[arg(long, default_value_t = 50)]
        limit: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    match cli.command {
        Commands::Chat => {
            let generator = GeminiClient::new(&config.generation)?;
            chat(&generator).await
        }
        Commands::Research { topic } => {
            let search = SerperClient::new(&config.search)?.with_max_results(RESEARCH_MAX_RESULTS);
            let generator = GeminiClient::new(&config.generation)?;
            let summary = research(&search, &generator, &topic).await?;
            println!("{}", summary);
            Ok(())
        }
        Commands::Papers { email, limit } => {
            let db = DbPool::new(&config.database).await?;
            db.ensure_schema().await?;
            let repo = Repository::new(db);
            let papers = list_papers(&repo, email.as_deref(), limit).await?;
            if papers.is_empty() {
                println!("No papers found.");
            }
            for paper in &papers {
                print!("{}", format_summary(paper));
            }
            Ok(())
        }
    }
}

fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit")
}

async fn chat(generator: &dyn GenerationProvider) -> Result<()> {
    println!("Papersmith chat with {} (type 'exit' to quit)\n", generator.model_name());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if is_exit_command(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match generator.generate(&line).await {
            Ok(reply) => println!("\n{}\n", reply.trim()),
            Err(e) => eprintln!("error: {}", e),
        }
    }

    println!("Bye.");
    Ok(())
}

fn research_prompt(snippets: &[&str]) -> String {
    format!("Summarize this:\n{}", snippets.join("\n"))
}

/// Search, then ask the model to summarize the snippets it found
async fn research(
    search: &dyn SearchProvider,
    generator: &dyn GenerationProvider,
    topic: &str,
) -> Result<String> {
    let results = search.search(topic).await?;
    let snippets = results.snippets();
    let top = &snippets[..snippets.len().min(RESEARCH_MAX_RESULTS)];
    tracing::debug!(hits = top.len(), "Summarizing search results");

    let summary = generator.generate(&research_prompt(top)).await?;
    Ok(summary.trim().to_string())
}

async fn list_papers(repo: &Repository, email: Option<&str>, limit: u64) -> Result<Vec<PaperSummary>> {
    match email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            let user = repo
                .find_user_by_email(&email)
                .await?
                .with_context(|| format!("no account for {}", email))?;
            Ok(repo.list_papers_by_owner(user.id).await?)
        }
        None => Ok(repo.list_recent_papers(limit).await?),
    }
}

fn format_summary(paper: &PaperSummary) -> String {
    format!(
        "ID: {}\nTitle: {}\nAbstract: {}\nCreated at: {}\n-----------\n",
        paper.id,
        paper.title,
        paper.abstract_text,
        paper.created_at.to_rfc3339()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use papersmith_common::errors::Result as AppResult;
    use papersmith_common::search::{SearchHit, SearchResult};
    use std::sync::Mutex;

    struct ManyHits(usize);

    #[async_trait]
    impl SearchProvider for ManyHits {
        async fn search(&self, _query: &str) -> AppResult<SearchResult> {
            Ok(SearchResult::new(
                (0..self.0)
                    .map(|i| SearchHit {
                        title: format!("T{}", i),
                        snippet: format!("s{}", i),
                    })
                    .collect(),
            ))
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl GenerationProvider for Recorder {
        async fn generate(&self, prompt: &str) -> AppResult<String> {
            self.0.lock().unwrap().push(prompt.to_string());
            Ok("  a short summary \n".to_string())
        }

        fn model_name(&self) -> &str {
            "recorder"
        }
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["papersmith", "research", "soil"]).unwrap();
        assert!(matches!(cli.command, Commands::Research { topic } if topic == "soil"));

        let cli = Cli::try_parse_from(["papersmith", "papers", "--email", "a@b.c"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Papers { email: Some(_), limit: 50 }
        ));

        assert!(Cli::try_parse_from(["papersmith", "research"]).is_err());
    }

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command(" QUIT "));
        assert!(!is_exit_command("exit now"));
    }

    #[tokio::test]
    async fn test_research_caps_snippets_and_trims_summary() {
        let generator = Recorder::default();

        let summary = research(&ManyHits(8), &generator, "soil").await.unwrap();

        assert_eq!(summary, "a short summary");
        let prompts = generator.0.lock().unwrap();
        assert_eq!(prompts[0], "Summarize this:\ns0\ns1\ns2\ns3\ns4");
    }
}
