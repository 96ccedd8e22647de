mod config;
mod routes;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use clarity_core::generate::{GeminiClient, InferenceClient};
use clarity_db::pool;

use config::ClarityConfig;
use routes::AppState;

#[derive(Parser)]
#[command(name = "clarity", about = "Turns messy thoughts into a per-user checklist")]
struct Cli {
    /// Database URL (overrides CLARITY_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a clarity config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/clarity")]
        db_url: String,
        /// API key for the inference endpoint
        #[arg(long)]
        inference_api_key: String,
        /// Inference model name (omit for the default)
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the clarity database (requires config file or env vars)
    DbInit,
    /// Run the HTTP server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

/// Execute the `clarity init` command: write config file.
fn cmd_init(
    db_url: &str,
    inference_api_key: &str,
    model: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let session_secret = config::generate_session_secret();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        auth: config::AuthSection {
            session_secret: session_secret.clone(),
        },
        inference: config::InferenceSection {
            api_key: inference_api_key.to_string(),
            model,
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!(
        "  auth.session_secret = {}...{}",
        &session_secret[..8],
        &session_secret[56..]
    );
    println!();
    println!("Next: run `clarity db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `clarity db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = ClarityConfig::resolve(cli_db_url)?;

    println!("Initializing clarity database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    // 5. Clean shutdown.
    db_pool.close().await;

    println!("clarity db-init complete.");
    Ok(())
}

/// Execute the `clarity serve` command: run the HTTP server until Ctrl+C.
async fn cmd_serve(cli_db_url: Option<&str>, bind: &str, port: u16) -> anyhow::Result<()> {
    let resolved = ClarityConfig::resolve(cli_db_url)?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    let inference: Arc<dyn InferenceClient> = Arc::new(GeminiClient::new(
        resolved.inference_api_key,
        resolved.inference_model,
    ));

    let state = AppState::new(db_pool.clone(), resolved.session_config, inference);
    let result = routes::run_serve(state, bind, port).await;

    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            inference_api_key,
            model,
            force,
        } => {
            cmd_init(&db_url, &inference_api_key, model, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            cmd_serve(cli.database_url.as_deref(), &bind, port).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test_util {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that mutate process environment variables.
    pub fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
