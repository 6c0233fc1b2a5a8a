//! Seer Chat - terminal client for the shared scene chat
//!
//! Joins the shared document as one participant, prints the merged timeline
//! as it changes, and posts whatever is typed. The GM can consult the Seer.

mod api;
mod app;
mod config;
mod events;
mod preferences;
mod state;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use seer_core::{
    FileStore, Mailbox, OracleResponder, PanelState, Role, SessionContext, TimelineSynchronizer,
};

use crate::api::GeminiClient;
use crate::app::{ChatApp, HELP};
use crate::config::Config;
use crate::preferences::{Environment, Preferences};

/// Shortest allowed polling interval for the document file.
const MIN_POLL_INTERVAL_MS: u64 = 50;

#[derive(Parser, Debug)]
#[command(name = "seer-chat")]
#[command(about = "Shared scene chat with an oracle")]
#[command(version)]
struct Args {
    /// Config file (defaults to SEER_CHAT_CONFIG or the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shared document file
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// Display name
    #[arg(short, long)]
    name: Option<String>,

    /// Join as the GM
    #[arg(long)]
    gm: bool,

    /// Start with the chat panel closed
    #[arg(long)]
    closed: bool,

    /// Preferences file holding this client's identity
    #[arg(long)]
    preferences: Option<PathBuf>,

    /// Document polling interval in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(ref document) = self.document {
            config.document_path = Some(document.clone());
        }
        if let Some(ref name) = self.name {
            config.display_name = name.clone();
        }
        if self.gm {
            config.role = Role::Gm;
        }
        if self.closed {
            config.panel_open = false;
        }
        if let Some(poll_ms) = self.poll_ms {
            config.poll_interval_ms = poll_ms;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so the transcript on stdout stays clean
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path);
    args.apply(&mut config);

    let preferences_path = args
        .preferences
        .clone()
        .unwrap_or_else(Preferences::default_path);
    let preferences = match Environment::check(&preferences_path) {
        Environment::Supported(preferences) => preferences,
        Environment::Unsupported(reason) => {
            println!("Seer chat is not available in this environment.");
            println!("Local preferences could not be used: {}", reason);
            return Ok(());
        }
    };

    tracing::info!("Starting Seer Chat");

    let document_path = config
        .document_path
        .clone()
        .unwrap_or_else(FileStore::default_path);
    tracing::info!("Shared document: {}", document_path.display());

    let store = Arc::new(FileStore::new(document_path));
    let watcher = store.watch(Duration::from_millis(
        config.poll_interval_ms.max(MIN_POLL_INTERVAL_MS),
    ));

    let session = SessionContext::new(
        preferences.participant_id.as_str(),
        &config.display_name,
        config.role,
    );
    let sync = TimelineSynchronizer::new(store.clone(), session.identity.clone());
    let mailbox = Arc::new(Mailbox::new(store.clone(), session));

    let generator = GeminiClient::new(&config.oracle.endpoint, config.api_key());
    tracing::info!("Oracle endpoint: {}", generator.endpoint());
    if !generator.has_api_key() {
        tracing::warn!(
            "No API key for the Seer; set {} or oracle.api_key",
            config.oracle.api_key_env
        );
    }
    let oracle = Arc::new(OracleResponder::new(mailbox.clone(), Arc::new(generator)));

    let panel = if config.panel_open {
        PanelState::Open
    } else {
        PanelState::Closed
    };
    let mut app = ChatApp::new(mailbox, oracle, sync, panel);

    println!("{}", HELP);
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut output = std::io::stdout();
    events::run(&mut app, input, &mut output).await?;

    watcher.abort();
    Ok(())
}
