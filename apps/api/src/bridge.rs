//! Player bridge over newline-delimited JSON
//!
//! The player process talks to the gateway through a pair of byte streams
//! (stdin/stdout in the binary). Every line is one JSON frame.
//!
//! Player to gateway:
//! ```text
//! {"kind":"event","payload":{"event":"time-changed","data":{"elapsedSeconds":12}}}
//! {"kind":"reply","id":3,"result":{...}}
//! {"kind":"reply","id":4,"error":"no such index"}
//! ```
//!
//! Gateway to player:
//! ```text
//! {"command":{"name":"toggle-play"}}
//! {"id":3,"command":{"name":"get-queue"}}
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;

use crate::models::PlayerEvent;
use crate::services::player::CommandReply;
use crate::services::{CommandReceiver, EventSender, PlayerCommand, PlayerRequest};

/// Frame received from the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InboundFrame {
    Event {
        payload: PlayerEvent,
    },
    Reply {
        id: u64,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<String>,
    },
}

/// Frame sent to the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub command: PlayerCommand,
}

/// Connects the gateway's channels to a player process
pub struct PlayerBridge {
    events: EventSender,
    commands: CommandReceiver,
    pending: HashMap<u64, oneshot::Sender<CommandReply>>,
    next_id: u64,
}

impl PlayerBridge {
    pub fn new(events: EventSender, commands: CommandReceiver) -> Self {
        Self {
            events,
            commands,
            pending: HashMap::new(),
            next_id: 1,
        }
    }

    /// Pump frames until the player closes its output
    ///
    /// Malformed lines, including ones that are not UTF-8, are logged and
    /// skipped. Requests still waiting for a reply when the player goes away
    /// are dropped, which their callers see as the player being unavailable.
    pub async fn run<R, W>(mut self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // Survives cancelled reads so a partial line is continued, not lost
        let mut line = Vec::new();
        let mut commands_open = true;

        loop {
            tokio::select! {
                read = reader.read_until(b'\n', &mut line) => {
                    if read? == 0 {
                        if !line.is_empty() {
                            self.handle_bytes(&line);
                        }
                        tracing::info!(pending = self.pending.len(), "Player closed its output");
                        return Ok(());
                    }
                    self.handle_bytes(&line);
                    line.clear();
                }
                request = self.commands.recv(), if commands_open => {
                    match request {
                        Some(request) => self.forward(request, &mut writer).await?,
                        None => {
                            tracing::debug!("Command channel closed");
                            commands_open = false;
                        }
                    }
                }
            }
        }
    }

    fn handle_bytes(&mut self, bytes: &[u8]) {
        match std::str::from_utf8(bytes) {
            Ok(line) => self.handle_line(line),
            Err(e) => tracing::warn!(error = %e, len = bytes.len(), "Non UTF-8 line from player"),
        }
    }

    fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match serde_json::from_str::<InboundFrame>(line) {
            Ok(InboundFrame::Event { payload }) => {
                tracing::trace!(event = payload.kind(), "Player event");
                if self.events.send(payload).is_err() {
                    tracing::warn!("Event channel closed, dropping player event");
                }
            }
            Ok(InboundFrame::Reply { id, result, error }) => {
                let Some(reply) = self.pending.remove(&id) else {
                    tracing::debug!(id, "Reply for unknown request");
                    return;
                };
                let outcome = match error {
                    Some(message) => Err(message),
                    None => Ok(result.unwrap_or(Value::Null)),
                };
                let _ = reply.send(outcome);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed frame from player");
            }
        }
    }

    async fn forward<W>(&mut self, request: PlayerRequest, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let PlayerRequest { command, reply } = request;

        // Callers that gave up waiting leave closed senders behind
        let before = self.pending.len();
        self.pending.retain(|_, tx| !tx.is_closed());
        if self.pending.len() < before {
            tracing::debug!(
                abandoned = before - self.pending.len(),
                "Dropped requests nobody waits for"
            );
        }

        let id = reply.map(|reply| {
            let id = self.next_id;
            self.next_id += 1;
            self.pending.insert(id, reply);
            id
        });

        let frame = OutboundFrame { id, command };
        let mut line = serde_json::to_vec(&frame)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await
    }
}
