//! memq CLI - inspect and exercise MemcacheQ-style queue servers.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use memq::QueueClient;
use std::fs;
use std::path::PathBuf;

mod cli;

use cli::{Cli, Command};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("memq")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("memq.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut client = QueueClient::connect(&cli.host, cli.port)
        .with_context(|| format!("Failed to connect to {}:{}", cli.host, cli.port))?;

    match cli.command {
        Command::List => {
            let queues = client.queues();
            if queues.is_empty() {
                println!("{}", "No queues found".dimmed());
            } else {
                let mut names: Vec<&String> = queues.keys().collect();
                names.sort();
                for name in names {
                    let stats = queues[name].stats();
                    println!(
                        "{} {} sent, {} received, {} remaining",
                        name.cyan(),
                        stats.sent,
                        stats.received,
                        stats.remaining()
                    );
                }
            }
        }

        Command::Create { name } => {
            let queue = client.create_queue(&name).context("Failed to create queue")?;
            println!("{} Created: {}", "✓".green(), queue.name().cyan());
        }

        Command::Delete { name } => {
            let deleted = client.delete_queue(&name).context("Failed to delete queue")?;
            if deleted {
                println!("{} Deleted: {}", "✓".green(), name.cyan());
            } else {
                eprintln!("{} Queue not found: {}", "✗".red(), name);
                std::process::exit(1);
            }
        }

        Command::Purge => {
            let count = client.queues().len();
            client.delete_all_queues().context("Failed to delete queues")?;
            println!("{} Deleted {} queue(s)", "✓".green(), count);
        }

        Command::Send { queue, message } => {
            let handle = client.create_queue(&queue).context("Failed to open queue")?;
            handle.send(&message).context("Failed to send message")?;
            println!("{} Sent to {}", "✓".green(), queue.cyan());
        }

        Command::Recv { queue, count } => {
            let handle = client.get_queue(&queue).context("Failed to look up queue")?;
            let messages = handle.receive_many(count).context("Failed to receive")?;
            for message in messages {
                match message {
                    Some(body) => println!("{}", body),
                    None => println!("{}", "(empty)".dimmed()),
                }
            }
        }

        Command::Stats { queue } => {
            let handle = client.get_queue(&queue).context("Failed to look up queue")?;
            let stats = handle.stats();
            println!("{}: {}", "Queue".bold(), handle.name().cyan());
            println!("{}: {}", "Sent".bold(), stats.sent);
            println!("{}: {}", "Received".bold(), stats.received);
            println!("{}: {}", "Remaining".bold(), stats.remaining());
        }
    }

    client.close();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
