//! Command line front end: explain one docstring with the three writer personas.
//!
//! ```text
//! personadocs 'def add(a, b): """Return a + b."""'
//! cat docstring.txt | personadocs --json
//! ```

use clap::Parser;
use colored::Colorize;
use personadocs::clients::azure::AzureOpenAIClient;
use personadocs::observer::{NoopObserver, TurnObserver};
use personadocs::personas::{documentation_team, DocumentationTeamOptions};
use personadocs::transcript::{display_name, ConsoleObserver, Transcript};
use personadocs::{OrchestrationError, PersonaDocsConfig};
use std::error::Error;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "personadocs")]
#[command(about = "Explain a docstring from three perspectives: developer, executive and API user")]
#[command(version)]
struct Cli {
    /// Docstring to explain. Read from stdin when omitted.
    docstring: Option<String>,

    /// Read the docstring from a file
    #[arg(short, long, conflicts_with = "docstring")]
    file: Option<PathBuf>,

    /// Round budget (at least 3)
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Let the manager model choose the speaking order
    #[arg(long)]
    manager_selection: bool,

    /// Have the manager model write the closing line
    #[arg(long)]
    generated_closing: bool,

    /// Print the finished transcript as JSON instead of streaming it
    #[arg(long)]
    json: bool,

    /// Env file holding model, api_key, azure_url and api_ver
    #[arg(long)]
    env_file: Option<PathBuf>,
}

fn read_docstring(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(text) = &cli.docstring {
        return Ok(text.clone());
    }
    if let Some(path) = &cli.file {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    personadocs::init_logger();
    let cli = Cli::parse();

    let config = match &cli.env_file {
        Some(path) => PersonaDocsConfig::from_env_file(path)?,
        None => PersonaDocsConfig::from_env()?,
    };
    let docstring = read_docstring(&cli)?;

    let options = DocumentationTeamOptions {
        max_rounds: cli.max_rounds.unwrap_or(config.max_rounds),
        manager_selection: cli.manager_selection,
        generated_closing: cli.generated_closing,
    };
    let client = Arc::new(AzureOpenAIClient::from_config(&config));
    let team = documentation_team(client, &options)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping after the current turn");
            on_interrupt.cancel();
        }
    });

    let observer: Box<dyn TurnObserver> = if cli.json {
        Box::new(NoopObserver)
    } else {
        Box::new(ConsoleObserver::stdout())
    };

    match team
        .run_with_cancellation(&docstring, observer.as_ref(), &cancel)
        .await
    {
        Ok(outcome) => {
            if cli.json {
                println!("{}", Transcript::from_outcome(&outcome).to_json()?);
            } else if outcome.is_cancelled() {
                println!("{}", "Group chat cancelled.".red().bold());
            } else {
                println!("{}", "Group chat completed!".green().bold());
            }
            Ok(())
        }
        Err(OrchestrationError::Configuration(e)) => Err(e.into()),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            if cli.json {
                if let Some(conversation) = e.partial_conversation() {
                    for message in conversation {
                        eprintln!("{}: {}", display_name(&message.sender_id), message.content);
                    }
                }
            }
            std::process::exit(1);
        }
    }
}
