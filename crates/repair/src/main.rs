use std::process::ExitCode;

use anyhow::Context;
use casting_db::PgEntityStore;
use casting_repair::config::RepairConfig;
use casting_repair::{run, Outcome, RepairArgs};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with prompts on stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "role_repair=info,casting_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = RepairArgs::parse();
    match execute(&args).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            eprintln!("role-repair: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(args: &RepairArgs) -> anyhow::Result<Outcome> {
    let config = RepairConfig::from_env()?;
    let pool = casting_db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    let store = PgEntityStore::new(pool.clone());
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let outcome = run(args, &store, &mut stdin.lock(), &mut stdout.lock()).await;

    pool.close().await;
    outcome
}
