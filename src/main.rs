mod config;
mod dispatch;
mod registry;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use calbot_provider_google::GoogleCalendarSource;
use registry::Registry;

#[derive(Parser)]
#[command(name = "calbot")]
#[command(about = "Manage upcoming calendar events with short conversational commands")]
struct Cli {
    /// Conversation ID used to pick the calendar from config.toml
    #[arg(short = 'c', long, default_value = "default")]
    conversation: String,

    /// A single command (list, show, add, edit, remove); with none given,
    /// commands are read line by line from stdin
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config()?;
    let calendar_id = cfg.calendar_for(&cli.conversation).to_string();

    let source = Arc::new(GoogleCalendarSource::from_disk()?);
    let mut registry = Registry::new(source);

    // One-shot: the shell already split the words.
    if !cli.command.is_empty() {
        let reply = dispatch::dispatch_words(&mut registry, &calendar_id, &cli.command).await;
        println!("{}", reply);
        return Ok(());
    }

    // Read-eval loop standing in for the host chat dispatcher.
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        let reply = dispatch::dispatch(&mut registry, &calendar_id, line).await;
        println!("{}", reply);
    }

    Ok(())
}
