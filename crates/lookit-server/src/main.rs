//! lookit-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, starts the background worker and serves the researcher API,
//! session updates and signed media links over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for a researcher's `password_hash`:
//!
//! ```
//! cargo run -p lookit-server -- --hash-password
//! ```

use std::{fs::File, io::BufReader, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use lookit_core::store::{Job, TaskQueue};
use lookit_server::{
  config::{ResearcherAccount, ServerConfig},
  storage::LocalStorage,
  worker::{ChannelQueue, Worker},
};
use lookit_store_sqlite::{FixtureBundle, SqliteStore};
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Lookit response data server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Load a JSON fixture bundle into the store before serving.
  #[arg(long, value_name = "FILE")]
  import: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = rpassword_or_stdin()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;
  if cfg.researchers.is_empty() {
    tracing::warn!("no researchers configured; every researcher request will be rejected");
  }

  let store = Arc::new(
    SqliteStore::open(&cfg.store_path)
      .await
      .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?,
  );
  let storage = Arc::new(LocalStorage::from_config(&cfg));

  let (queue, rx) = ChannelQueue::new();
  let worker = Worker::new(Arc::clone(&store), Arc::clone(&storage)).spawn(rx);

  if let Some(path) = &cli.import {
    let file = File::open(path).with_context(|| format!("failed to open {path:?}"))?;
    let bundle = FixtureBundle::from_reader(BufReader::new(file))
      .with_context(|| format!("failed to parse fixture bundle {path:?}"))?;
    let report = store.import(bundle).await.context("fixture import failed")?;
    for &(study_id, response_id) in &report.withdrawn {
      queue
        .enqueue(Job::PurgeWithdrawnVideos { study_id, response_id })
        .context("failed to queue withdrawal purge")?;
    }
    tracing::info!(report = %serde_json::to_string(&report)?, "import complete");
  }

  let accounts: Arc<[ResearcherAccount]> = cfg.researchers.clone().into();
  let app = lookit_server::app(store, storage, Arc::new(queue) as Arc<dyn TaskQueue>, accounts);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  // The router owned the last queue sender, so the worker drains and exits.
  worker.await.context("worker task panicked")?;
  Ok(())
}

/// Read a password from stdin.
fn rpassword_or_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
