use std::io::{self, Write};

use tanks_core::network::Transport;
use tanks_events::NetMessage;

/// Writes every outbound message as one JSON line on stdout
#[derive(Debug, Default)]
pub struct StdoutTransport;

impl Transport for StdoutTransport {
    fn send(&self, message: &NetMessage) {
        let line = match serde_json::to_string(message) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("failed to serialize {:?}: {}", message, e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line).and_then(|_| stdout.flush()) {
            tracing::error!("failed to write to stdout: {}", e);
        }
    }
}
