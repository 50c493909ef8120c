//! Seedbed CLI, a thin view layer over the journaling core
//!
//! Every subcommand maps onto one facade call; the binary holds no journal
//! logic of its own.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use seedbed::{Journal, JournalConfig, Result, Rollover, SeedId};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seedbed", version, about = "Local-first daily journal")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, env = "SEEDBED_DB_PATH", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a seed to today's log, or recall an existing one
    Add {
        text: String,
        /// Mark the seed as carried over
        #[arg(long)]
        continued: bool,
        /// Recall this existing seed id instead of creating a new one
        #[arg(long)]
        reuse: Option<String>,
    },
    /// Seeds shown on a day (today by default)
    List {
        #[arg(long)]
        day: Option<NaiveDate>,
    },
    /// Search all seeds (top 5 by recency)
    Search { query: String },
    /// Replace a seed's text
    Edit { id: String, text: String },
    /// Delete a seed
    Delete { id: String },
    /// Append a comment to a seed
    Comment { id: String, text: String },
    /// Remove a comment by position
    Uncomment { id: String, index: usize },
    /// Branch management
    #[command(subcommand)]
    Branch(BranchCommand),
    /// Day-by-day history, newest first
    History,
    /// Check for a date rollover and list carryover candidates
    Checkday {
        /// Carry every candidate over instead of just listing them
        #[arg(long)]
        carry_all: bool,
    },
    /// Write a full snapshot as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Upsert every record from a snapshot file
    Import { path: PathBuf },
}

#[derive(Subcommand)]
enum BranchCommand {
    /// Group seeds under a new named branch
    Create {
        name: String,
        #[arg(required = true)]
        seeds: Vec<String>,
    },
    /// List all branches
    List,
    /// Remove a seed from a branch
    Remove { branch: String, seed: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = JournalConfig::from_env();
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }
    let journal = Journal::open(config).await?;

    match cli.command {
        Command::Add {
            text,
            continued,
            reuse,
        } => {
            let reuse = reuse.map(SeedId::new);
            match journal
                .add_or_recall_seed(&text, continued, reuse.as_ref())
                .await?
            {
                Some(seed) => println!("{}  {}", seed.id, seed.text),
                None => println!("no such seed to recall"),
            }
        }
        Command::List { day } => {
            for seed in journal.list_day(day).await? {
                let marker = if seed.continued { "↩ " } else { "" };
                println!("{}  {}{} (x{})", seed.id, marker, seed.text, seed.call_count);
            }
        }
        Command::Search { query } => {
            for hit in journal.search(&query).await? {
                let day = hit.day.map(|d| d.to_string()).unwrap_or_default();
                println!("{}  [{}] {}", hit.id, day, hit.text);
            }
        }
        Command::Edit { id, text } => {
            journal.edit_seed_text(&SeedId::new(id), &text).await?;
        }
        Command::Delete { id } => {
            journal.delete_seed(&SeedId::new(id)).await?;
        }
        Command::Comment { id, text } => {
            journal.add_comment(&SeedId::new(id), &text).await?;
        }
        Command::Uncomment { id, index } => {
            journal.delete_comment(&SeedId::new(id), index).await?;
        }
        Command::Branch(cmd) => run_branch(&journal, cmd).await?,
        Command::History => {
            for (day, seeds) in journal.history().await? {
                println!("{day}");
                for seed in seeds {
                    println!("  {}", seed.text);
                }
            }
        }
        Command::Checkday { carry_all } => match journal.check_rollover().await? {
            Rollover::Current => println!("still {}", chrono::Local::now().date_naive()),
            Rollover::NewDay { today, carryover } => {
                println!("new day: {today}");
                if carry_all {
                    let ids: Vec<SeedId> = carryover.iter().map(|s| s.id.clone()).collect();
                    let carried = journal.confirm_carryover(&ids).await?;
                    for seed in carried {
                        println!("carried: {}", seed.text);
                    }
                } else {
                    for seed in carryover {
                        println!("candidate: {}  {}", seed.id, seed.text);
                    }
                }
            }
        },
        Command::Export { out } => {
            let rendered = journal.export_snapshot().await?.to_json()?;
            match out {
                Some(path) => std::fs::write(path, rendered)?,
                None => println!("{rendered}"),
            }
        }
        Command::Import { path } => {
            let raw = std::fs::read_to_string(path)?;
            journal.import_snapshot(&raw).await?;
        }
    }
    Ok(())
}

async fn run_branch(journal: &Journal, cmd: BranchCommand) -> Result<()> {
    match cmd {
        BranchCommand::Create { name, seeds } => {
            let ids: Vec<SeedId> = seeds.into_iter().map(SeedId::new).collect();
            let branch = journal.create_branch(&name, &ids).await?;
            println!("{}  {}", branch.id, branch.name);
        }
        BranchCommand::List => {
            for branch in journal.list_branches().await? {
                println!(
                    "{}  {} ({}) - {}",
                    branch.id,
                    branch.name,
                    branch.seed_ids.len(),
                    branch.created_at.format("%Y-%m-%d")
                );
            }
        }
        BranchCommand::Remove { branch, seed } => {
            journal
                .remove_seed_from_branch(&seedbed::BranchId::new(branch), &SeedId::new(seed))
                .await?;
        }
    }
    Ok(())
}
