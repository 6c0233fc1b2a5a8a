//! The client event loop
//!
//! Multiplexes user input, store notifications and finished oracle requests
//! on one task. Oracle requests run in the background so the chat keeps
//! flowing while the service thinks.

use anyhow::Result;
use std::io::{ErrorKind, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;

use seer_core::OracleOutcome;

use crate::app::{ChatApp, Flow};

/// Run until input ends, `/quit`, or the store shuts down.
///
/// Oracle requests still in flight are always awaited before returning, even
/// when the loop stops on an error.
pub async fn run<R, W>(app: &mut ChatApp, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut pending: JoinSet<seer_core::Result<OracleOutcome>> = JoinSet::new();

    let outcome = drive(app, input, out, &mut pending).await;

    // Requests cannot be cancelled; let them post before leaving.
    if !pending.is_empty() {
        tracing::info!("Waiting for {} oracle request(s)", pending.len());
    }
    while let Some(joined) = pending.join_next().await {
        if let Ok(outcome) = joined {
            let output = app.handle_oracle(outcome);
            if let Err(e) = print_lines(out, output) {
                tracing::warn!("Output failed: {}", e);
            }
        }
    }
    outcome?;
    print_lines(out, app.refresh().await)?;

    tracing::info!("Event loop stopped with {} unread", app.state().unread());
    Ok(())
}

async fn drive<R, W>(
    app: &mut ChatApp,
    input: R,
    out: &mut W,
    pending: &mut JoinSet<seer_core::Result<OracleOutcome>>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    print_lines(out, app.start().await)?;
    tracing::info!("Event loop started");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        tracing::debug!("Input closed");
                        break;
                    }
                    Err(e) if e.kind() == ErrorKind::InvalidData => {
                        tracing::warn!("Skipping unreadable input line: {}", e);
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!("Input failed: {}", e);
                        break;
                    }
                };
                match app.handle_line(&line).await {
                    Flow::Continue(output) => print_lines(out, output)?,
                    Flow::Ask(prompt) => {
                        let oracle = app.oracle();
                        pending.spawn(async move { oracle.respond(&prompt).await });
                        print_lines(out, vec!["The Seer is thinking...".to_string()])?;
                    }
                    Flow::Quit => break,
                }
            }
            event = app.next_event() => {
                let Some(event) = event else {
                    tracing::warn!("Store closed");
                    break;
                };
                let output = app.handle_event(event).await;
                print_lines(out, output)?;
            }
            Some(joined) = pending.join_next(), if !pending.is_empty() => {
                let output = match joined {
                    Ok(outcome) => app.handle_oracle(outcome),
                    Err(e) => {
                        tracing::warn!("Oracle task failed: {}", e);
                        Vec::new()
                    }
                };
                print_lines(out, output)?;
            }
        }
    }
    Ok(())
}

fn print_lines<W: Write>(out: &mut W, lines: Vec<String>) -> Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}
