//! Seer CLI - one-shot commands against a shared chat document.
//!
//! Every command prints a JSON `ApiResponse` so scripts can drive the chat.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use seer_core::{
    build_timeline, extract_outbox, ApiResponse, FileStore, Mailbox, ParticipantId, Role,
    SessionContext, SharedDocumentStore, Submission,
};

#[derive(Parser)]
#[command(name = "seer")]
#[command(about = "Seer CLI - read and write the shared chat document")]
#[command(version)]
struct Cli {
    /// Document file (defaults to SEER_DOCUMENT_FILE or ~/.seer/scene.json)
    #[arg(short, long, global = true)]
    document: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the merged, time-ordered timeline
    Timeline {
        /// Include locally rendered HTML for each message
        #[arg(long)]
        html: bool,
    },
    /// Print one participant's outbox
    Outbox {
        /// Participant identity
        #[arg(short, long)]
        identity: String,
    },
    /// List participants that own an outbox
    Participants,
    /// Post a message
    Post {
        /// Participant identity
        #[arg(short, long)]
        identity: String,
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Post as the GM
        #[arg(long)]
        gm: bool,
        /// Message text
        text: String,
    },
    /// Empty every outbox (GM only)
    Clear,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let path = cli.document.unwrap_or_else(FileStore::default_path);
    let store = Arc::new(FileStore::new(path));

    let output = match cli.command {
        Commands::Timeline { html } => handle_timeline(&store, html).await,
        Commands::Outbox { identity } => handle_outbox(&store, &identity).await,
        Commands::Participants => handle_participants(&store).await,
        Commands::Post {
            identity,
            name,
            gm,
            text,
        } => {
            let role = if gm { Role::Gm } else { Role::Player };
            let mailbox = Mailbox::new(store.clone(), SessionContext::new(identity, &name, role));
            handle_post(&mailbox, &text).await
        }
        Commands::Clear => {
            let session = SessionContext::new("seer-cli", "GM", Role::Gm);
            let mailbox = Mailbox::new(store.clone(), session);
            match mailbox.clear_all().await {
                Ok(()) => ok(json!({ "cleared": true })),
                Err(e) => err(e),
            }
        }
    };

    println!("{}", output);
}

async fn document(store: &FileStore) -> seer_core::Result<seer_core::ChatDocument> {
    let metadata = store.get().await?;
    Ok(seer_core::ChatDocument::from_metadata(&metadata))
}

async fn handle_timeline(store: &FileStore, html: bool) -> String {
    match document(store).await {
        Ok(document) => {
            let timeline = build_timeline(&document);
            let messages: Vec<serde_json::Value> = timeline
                .iter()
                .map(|message| {
                    let mut value = json!(message);
                    if html {
                        value["html"] = json!(message.safe_markup());
                    }
                    value
                })
                .collect();
            ok(json!({
                "count": timeline.len(),
                "messages": messages,
            }))
        }
        Err(e) => err(e),
    }
}

async fn handle_outbox(store: &FileStore, identity: &str) -> String {
    match document(store).await {
        Ok(document) => ok(json!({
            "identity": identity,
            "messages": extract_outbox(&document, &ParticipantId::from(identity)),
        })),
        Err(e) => err(e),
    }
}

async fn handle_participants(store: &FileStore) -> String {
    match document(store).await {
        Ok(document) => ok(json!({
            "participants": document.participants(),
            "message_count": document.message_count(),
        })),
        Err(e) => err(e),
    }
}

async fn handle_post(mailbox: &Mailbox, text: &str) -> String {
    match mailbox.submit(text).await {
        Ok(Submission::Posted(message)) => ok(json!({ "posted": message })),
        Ok(Submission::Cleared) => ok(json!({ "cleared": true })),
        Ok(Submission::Ignored) => err("Message text is empty"),
        Err(e) => err(e),
    }
}

fn ok<T: Serialize>(data: T) -> String {
    render(&ApiResponse::ok(data))
}

fn err(error: impl ToString) -> String {
    render(&ApiResponse::<()>::err(error.to_string()))
}

fn render<T: Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response)
        .unwrap_or_else(|e| format!("{{\"ok\":false,\"error\":\"{}\"}}", e))
}
