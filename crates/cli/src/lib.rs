//! # `ddlrag` CLI Library
//!
//! Command definitions and handlers for the `ddlrag` binary:
//!
//! - `export` reflects a database and writes its DDL to a training file.
//! - `train` loads a training file into the knowledge store, then answers an
//!   example question.
//! - `ask`, `list` and `remove` work against an already trained store.

pub mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ddlrag::{export_ddls, SqlTrainer, TrainerConfig};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Question asked after training when none is given.
pub const DEFAULT_QUESTION: &str = "Find the records in my_table1 whose name is 'Alice'";

// --- CLI Argument Structs ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reflect a database and write its tables as CREATE TABLE statements to YAML
    Export(ExportArgs),
    /// Load a training file into the knowledge store and ask an example question
    Train(TrainArgs),
    /// Generate SQL for a question from the trained knowledge
    Ask(AskArgs),
    /// List the stored training entries as YAML
    List(StoreArgs),
    /// Remove a stored training entry by id
    Remove(RemoveArgs),
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Connection string, e.g. `sqlite:///app.db` or `postgresql://user:pw@host/db`.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
    /// Where to write the generated training file.
    #[arg(long, short, default_value = "generated_training_data.yaml")]
    pub output: PathBuf,
}

#[derive(Parser, Debug)]
pub struct StoreArgs {
    /// Path to a YAML configuration file. Defaults to `config.yml` if present.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct TrainArgs {
    /// The training file to load.
    #[arg(long, short, default_value = "training_data.yaml")]
    pub file: PathBuf,
    /// The question to ask once training is done.
    #[arg(long, short, default_value = DEFAULT_QUESTION)]
    pub question: String,
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Parser, Debug)]
pub struct AskArgs {
    /// The natural-language question.
    pub question: String,
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Id of the entry, as shown by `list`.
    pub id: String,
    #[command(flatten)]
    pub store: StoreArgs,
}

// --- Public Entrypoint ---

/// The main entry point for the `ddlrag` library.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export(args) => handle_export(args).await,
        Commands::Train(args) => {
            handle_train(args).await;
            Ok(())
        }
        Commands::Ask(args) => handle_ask(args).await,
        Commands::List(args) => handle_list(args).await,
        Commands::Remove(args) => handle_remove(args).await,
    }
}

fn load_trainer_config(path: Option<&Path>) -> Result<TrainerConfig> {
    config::load_config(path).context("Failed to load trainer configuration")
}

async fn build_trainer(args: &StoreArgs) -> Result<SqlTrainer> {
    let config = load_trainer_config(args.config.as_deref())?;
    SqlTrainer::from_config(&config)
        .await
        .context("Failed to set up the trainer")
}

// --- Command Handlers ---

async fn handle_export(args: ExportArgs) -> Result<()> {
    info!("Starting 'export' to '{}'", args.output.display());
    let count = export_ddls(&args.database_url, &args.output)
        .await
        .with_context(|| format!("Failed to export DDL to '{}'", args.output.display()))?;
    println!(
        "Wrote {count} DDL statement(s) to {}",
        args.output.display()
    );
    Ok(())
}

/// Runs the training example. Failures are reported on stdout and do not
/// change the exit status.
async fn handle_train(args: TrainArgs) {
    if let Err(e) = train_and_ask(&args).await {
        error!("Training run failed: {e:?}");
        println!("run error: {e:#}");
    }
}

async fn train_and_ask(args: &TrainArgs) -> Result<()> {
    let trainer = build_trainer(&args.store).await?;

    let summary = trainer.add_training_data_from_file(&args.file).await?;
    println!(
        "Training data loaded ({} ddl, {} documentation, {} sql)",
        summary.ddls, summary.documentation, summary.sqls
    );

    let sql = trainer.ask(&args.question).await?;
    println!("Generated SQL:\n{sql}");
    Ok(())
}

async fn handle_ask(args: AskArgs) -> Result<()> {
    let trainer = build_trainer(&args.store).await?;
    let sql = trainer
        .ask(&args.question)
        .await
        .context("Failed to generate SQL")?;
    println!("{sql}");
    Ok(())
}

async fn handle_list(args: StoreArgs) -> Result<()> {
    let trainer = build_trainer(&args).await?;
    let entries = trainer.store().training_data().await?;
    print!("{}", serde_yaml::to_string(&entries)?);
    Ok(())
}

async fn handle_remove(args: RemoveArgs) -> Result<()> {
    let trainer = build_trainer(&args.store).await?;
    if trainer.store().remove_training_data(&args.id).await? {
        println!("Removed {}", args.id);
    } else {
        println!("No entry with id {}", args.id);
    }
    Ok(())
}
