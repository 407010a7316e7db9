//! # ddlrag: Schema Export and Text-to-SQL Training
//!
//! This is the main entry point for the `ddlrag` command-line interface.
//! All logic lives in the `ddlrag_cli` library crate.

use anyhow::Result;
use clap::Parser;
use ddlrag_cli::{run, Cli};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("ddlrag=info".parse()?)
                .add_directive("ddlrag_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("[ddlrag error] Failed to execute command: {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
