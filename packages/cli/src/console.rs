#![allow(clippy::module_name_repetitions)]
//! Console frontend: outbound messages print to stdout, commands come from
//! stdin lines.

use std::sync::Arc;

use async_trait::async_trait;
use fogo_watch_engine::{Command, Engine};
use fogo_watch_notify::{Transport, TransportError};
use tokio::io::{AsyncBufReadExt as _, BufReader};

/// Subscriber id for the local console session.
pub const CONSOLE_SUBSCRIBER: &str = "console";

/// Transport that prints every outbound message.
///
/// Messages for subscribers other than the console session are prefixed with
/// the recipient id, so a multi-subscriber store stays readable when the
/// watcher runs locally.
pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send(&self, subscriber_id: &str, text: &str) -> Result<(), TransportError> {
        if subscriber_id == CONSOLE_SUBSCRIBER {
            println!("{text}\n");
        } else {
            println!("[{subscriber_id}]\n{text}\n");
        }
        Ok(())
    }
}

/// Reads stdin lines and dispatches each as a command for the console
/// subscriber. Each line runs as its own task, so a slow on-demand fetch
/// never blocks further input or the polling loop. Returns when stdin
/// closes.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub async fn command_loop(engine: Arc<Engine>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let result = match Command::parse(&line) {
                Some(command) => engine.handle(CONSOLE_SUBSCRIBER, command).await,
                None => engine.unknown_command(CONSOLE_SUBSCRIBER).await,
            };
            if let Err(e) = result {
                log::error!("Command failed: {e}");
            }
        });
    }
    Ok(())
}
