//! stream-probe - stream one chat turn from the assistant backend
//!
//! Usage: `stream-probe <assistant-id> <message> [conversation-id]`

use std::io::Write;

use anyhow::{bail, Result};
use futures::StreamExt;
use tokio::signal;
use tracing::{error, info, warn};

use assistant_stream::{
    client::{BlockData, Citation},
    metrics::describe_metrics,
    ChatClient, ChatRequest, Config, StreamEvent,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assistant_stream=info".into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (assistant_id, message) = match (args.next(), args.next()) {
        (Some(assistant_id), Some(message)) => (assistant_id, message),
        _ => bail!("usage: stream-probe <assistant-id> <message> [conversation-id]"),
    };
    let conversation_id = args.next();

    let config = Config::from_env()?;
    info!(api_url = %config.api_url, "Configuration loaded successfully");

    describe_metrics();

    let client = ChatClient::from_config(&config)?;
    let mut request = ChatRequest::new(message);
    if let Some(conversation_id) = conversation_id {
        request = request.in_conversation(conversation_id);
    }

    let mut events = client.stream_chat(&assistant_id, &request);
    let cancel = events.cancel_handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        cancel.cancel();
    });

    let mut failed = false;
    let mut stdout = std::io::stdout();

    while let Some(event) = events.next().await {
        match event {
            StreamEvent::ConversationId(id) => info!(conversation_id = %id, "Conversation"),
            StreamEvent::Token(text) => {
                print!("{}", text);
                let _ = stdout.flush();
            }
            StreamEvent::Block(block) => match BlockData::from_value(&block) {
                Some(block) => eprintln!("\n[block {} ({})]", block.id, block.block_type),
                None => eprintln!("\n[block]"),
            },
            StreamEvent::Citations(citations) => {
                for citation in Citation::from_values(&citations) {
                    eprintln!(
                        "[source] {} p.{} ({:.2})",
                        citation.document_filename,
                        citation
                            .page_number
                            .map(|p| p.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        citation.score
                    );
                }
            }
            StreamEvent::Complete(summary) => {
                println!();
                eprintln!(
                    "conversation {} | tokens in {} out {}",
                    summary.conversation_id, summary.tokens_input, summary.tokens_output
                );
            }
            StreamEvent::Error(message) => {
                println!();
                error!(message = %message, "Stream failed");
                failed = true;
            }
        }
    }

    if events.cancel_handle().is_cancelled() {
        warn!("Stream cancelled");
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, cancelling stream");
        }
        _ = terminate => {
            warn!("Received SIGTERM, cancelling stream");
        }
    }
}
