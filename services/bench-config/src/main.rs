//! Bench Config
//!
//! Post-install step run from `<bench>/sites`. Rewrites the supervisor
//! config and Procfile so the web and socketio processes start through
//! the Renovation entrypoints.

use renovation_bench::{update_config, FileOutcome};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Updating bench deployment files");

    let report = update_config()?;
    for (label, outcome) in [
        ("supervisor config", &report.supervisor),
        ("procfile", &report.procfile),
    ] {
        match outcome {
            FileOutcome::Patched { changed: false } => {
                tracing::info!("{} already up to date", label)
            }
            FileOutcome::Failed(err) => tracing::error!("{}", err),
            _ => {}
        }
    }

    println!("You may have to restart bench to complete configuration");

    if !report.is_success() {
        anyhow::bail!(
            "{} deployment file(s) could not be updated",
            report.failures().count()
        );
    }
    Ok(())
}
