//! Push channel: the per-session event subscription.
//!
//! The server streams session events (server-sent events over one long
//! GET). Each frame names one of six kinds and carries a JSON payload;
//! unknown kinds are ignored for forward compatibility. The subscription
//! owns the reader task and must be left explicitly on teardown so the
//! server can release the participant's presence bookkeeping.

use crate::chess::Color;
use crate::client::GameClient;
use crate::error::ApiError;
use crate::snapshot::GamePatch;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// The participant a `gameStarted` event says just joined.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinedPlayer {
    /// Participant id.
    pub id: String,
    /// Seat they were assigned.
    pub color: Color,
}

/// An inbound session event, already decoded.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// Both seats are filled and play begins.
    GameStarted {
        /// Fresh game payload.
        game: GamePatch,
        /// Who completed the table.
        joined_player: JoinedPlayer,
    },
    /// A participant was assigned a seat.
    PlayerJoined {
        /// Participant id.
        player_id: String,
        /// Seat they were assigned.
        assigned_color: Color,
    },
    /// A move was accepted by the authority.
    MoveMade {
        /// Fresh game payload.
        game: GamePatch,
    },
    /// A draw was offered.
    DrawOffered {
        /// Fresh game payload.
        game: GamePatch,
        /// The offering participant.
        offered_by: String,
    },
    /// The outstanding draw offer was answered.
    DrawResponse {
        /// Fresh game payload.
        game: GamePatch,
        /// Whether the offer was accepted.
        accepted: bool,
        /// The responding participant.
        responded_by: String,
    },
    /// A participant resigned.
    GameResigned {
        /// Fresh game payload.
        game: GamePatch,
        /// The resigning participant.
        resigned_by: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameStartedPayload {
    game: GamePatch,
    joined_player: JoinedPlayer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerJoinedPayload {
    player_id: String,
    assigned_color: Color,
}

#[derive(Debug, Deserialize)]
struct GamePayload {
    game: GamePatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrawOfferedPayload {
    game: GamePatch,
    offered_by: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrawResponsePayload {
    game: GamePatch,
    accepted: bool,
    responded_by: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameResignedPayload {
    game: GamePatch,
    resigned_by: String,
}

impl GameEvent {
    /// Decodes a named event frame.
    ///
    /// `Ok(None)` means the kind is unrecognized and should be skipped.
    pub fn parse(kind: &str, data: &str) -> Result<Option<Self>, serde_json::Error> {
        let event = match kind {
            "gameStarted" => {
                let p: GameStartedPayload = serde_json::from_str(data)?;
                GameEvent::GameStarted {
                    game: p.game,
                    joined_player: p.joined_player,
                }
            }
            "playerJoined" => {
                let p: PlayerJoinedPayload = serde_json::from_str(data)?;
                GameEvent::PlayerJoined {
                    player_id: p.player_id,
                    assigned_color: p.assigned_color,
                }
            }
            "moveMade" => {
                let p: GamePayload = serde_json::from_str(data)?;
                GameEvent::MoveMade { game: p.game }
            }
            "drawOffered" => {
                let p: DrawOfferedPayload = serde_json::from_str(data)?;
                GameEvent::DrawOffered {
                    game: p.game,
                    offered_by: p.offered_by,
                }
            }
            "drawResponse" => {
                let p: DrawResponsePayload = serde_json::from_str(data)?;
                GameEvent::DrawResponse {
                    game: p.game,
                    accepted: p.accepted,
                    responded_by: p.responded_by,
                }
            }
            "gameResigned" => {
                let p: GameResignedPayload = serde_json::from_str(data)?;
                GameEvent::GameResigned {
                    game: p.game,
                    resigned_by: p.resigned_by,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

#[derive(Debug)]
struct SseFrame {
    event: String,
    data: String,
}

/// Incremental parser for the server-sent-event wire format.
#[derive(Debug, Default)]
struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: String,
}

impl SseParser {
    fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every frame completed by it.
    fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                // Blank line dispatches the accumulated frame.
                if !self.data.is_empty() {
                    frames.push(SseFrame {
                        event: self
                            .event
                            .take()
                            .unwrap_or_else(|| "message".to_string()),
                        data: std::mem::take(&mut self.data),
                    });
                } else {
                    self.event = None;
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => {
                    if !self.data.is_empty() {
                        self.data.push('\n');
                    }
                    self.data.push_str(value);
                }
                // id/retry are irrelevant to this channel.
                _ => {}
            }
        }
        frames
    }
}

/// Handle on the open push channel for one session.
///
/// Exactly one subscription exists per open session; the session
/// lifecycle guarantees no second one is opened while this is live.
/// [`EventSubscription::leave`] is idempotent and must run on teardown;
/// dropping the handle without it still stops the reader and fires a
/// best-effort departure notice.
#[derive(Debug)]
pub struct EventSubscription {
    client: GameClient,
    player_id: String,
    reader: Option<JoinHandle<()>>,
    left: bool,
}

impl EventSubscription {
    /// Joins the session's event channel and starts the reader task,
    /// which forwards decoded events into `tx`.
    #[instrument(skip_all, fields(game_id = %client.game_id(), player_id))]
    pub async fn open(
        client: GameClient,
        player_id: &str,
        tx: UnboundedSender<GameEvent>,
    ) -> Result<Self, ApiError> {
        info!("Opening event subscription");
        let response = client
            .http()
            .get(client.events_url())
            .query(&[("playerId", player_id)])
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_error_body(status, &body));
        }
        let reader = tokio::spawn(read_events(response, tx));
        Ok(Self {
            client,
            player_id: player_id.to_string(),
            reader: Some(reader),
            left: false,
        })
    }

    /// Stops the reader and tells the server this participant left.
    ///
    /// Safe to call more than once; only the first call does anything.
    #[instrument(skip(self), fields(game_id = %self.client.game_id()))]
    pub async fn leave(&mut self) {
        if self.left {
            debug!("Subscription already left");
            return;
        }
        self.left = true;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Err(err) = self.client.leave(&self.player_id).await {
            warn!(error = %err, "Departure notice failed");
        }
        info!("Event subscription closed");
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if !self.left {
            // Teardown without an explicit leave() still owes the server
            // a departure notice; fire one if a runtime is available.
            let client = self.client.clone();
            let player_id = std::mem::take(&mut self.player_id);
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(err) = client.leave(&player_id).await {
                        debug!(error = %err, "Best-effort departure notice failed");
                    }
                });
            }
        }
    }
}

async fn read_events(response: reqwest::Response, tx: UnboundedSender<GameEvent>) {
    let mut parser = SseParser::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!(error = %err, "Event stream failed");
                break;
            }
        };
        for frame in parser.push(&chunk) {
            match GameEvent::parse(&frame.event, &frame.data) {
                Ok(Some(event)) => {
                    debug!(kind = %frame.event, "Received event");
                    if tx.send(event).is_err() {
                        debug!("Event receiver dropped; stopping reader");
                        return;
                    }
                }
                Ok(None) => debug!(kind = %frame.event, "Ignoring unrecognized event kind"),
                Err(err) => {
                    warn!(kind = %frame.event, error = %err, "Ignoring malformed event payload")
                }
            }
        }
    }
    debug!("Event stream ended");
}
