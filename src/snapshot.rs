//! The authoritative game state as last observed by this client.
//!
//! Every authority response and every pushed event carries a `game`
//! payload; [`GamePatch`] is its wire shape (any subset of the snapshot
//! fields) and [`GameSnapshot::merge`] is the structural merge that folds
//! a patch into the last known state.

use crate::chess::{self, Color};
use derive_getters::Getters;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Lifecycle of a game: only ever advances.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameStatus {
    /// Fewer than two participants have joined.
    Pending,
    /// Both seats filled; gameplay permitted.
    Active,
    /// Terminal; no further intents accepted.
    Completed,
}

/// Outcome of a completed game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameResult {
    /// White won.
    White,
    /// Black won.
    Black,
    /// Drawn, by agreement or otherwise.
    Draw,
}

/// A participant bound to a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Participant {
    /// Stable participant identity.
    #[serde(rename = "_id")]
    id: String,
    /// Display name, when the server includes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

impl Participant {
    /// Creates a participant known only by id (as seat-bind events do).
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
        }
    }
}

/// The single outstanding draw offer, when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct DrawOffer {
    /// Participant who made the offer.
    offered_by: String,
}

impl DrawOffer {
    /// Creates an offer record.
    pub fn by(participant: impl Into<String>) -> Self {
        Self {
            offered_by: participant.into(),
        }
    }
}

/// Distinguishes an absent field from an explicit `null`.
///
/// The wire sends full documents where cleared fields arrive as `null`
/// (a declined draw clears `drawOffer`), while event payloads may omit
/// fields entirely; omitted must preserve, `null` must clear.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Partial `game` payload as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePatch {
    /// Position encoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
    /// Game lifecycle status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
    /// Result; `null` when not (yet) decided.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub result: Option<Option<GameResult>>,
    /// White seat; `null` while unassigned.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub white_player: Option<Option<Participant>>,
    /// Black seat; `null` while unassigned.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub black_player: Option<Option<Participant>>,
    /// Outstanding draw offer; `null` when none.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub draw_offer: Option<Option<DrawOffer>>,
    /// Move notations in play order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_history: Option<Vec<String>>,
}

/// Complete game state as last known to this client.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct GameSnapshot {
    /// Position encoding; opaque except for side to move.
    fen: String,
    /// Lifecycle status.
    status: GameStatus,
    /// Result, present once completed.
    result: Option<GameResult>,
    /// White seat.
    white_player: Option<Participant>,
    /// Black seat.
    black_player: Option<Participant>,
    /// Outstanding draw offer.
    draw_offer: Option<DrawOffer>,
    /// Append-only move log.
    move_history: Vec<String>,
}

impl GameSnapshot {
    /// Materializes a snapshot from a patch carrying at least a position
    /// and a status. Anything less cannot describe a loaded game.
    pub fn from_patch(patch: GamePatch) -> Option<Self> {
        let fen = patch.fen?;
        let status = patch.status?;
        Some(Self {
            fen,
            status,
            result: patch.result.flatten(),
            white_player: patch.white_player.flatten(),
            black_player: patch.black_player.flatten(),
            draw_offer: patch.draw_offer.flatten(),
            move_history: patch.move_history.unwrap_or_default(),
        })
    }

    /// Folds a patch into this snapshot: present fields overwrite, absent
    /// fields are preserved, and two invariants are enforced locally --
    /// `status` never moves backwards and a bound seat never unbinds.
    pub fn merge(&mut self, patch: GamePatch) {
        if let Some(fen) = patch.fen {
            self.fen = fen;
        }
        if let Some(status) = patch.status {
            if status >= self.status {
                self.status = status;
            } else {
                warn!(
                    current = %self.status,
                    incoming = %status,
                    "Dropping status regression from stale payload"
                );
            }
        }
        if let Some(result) = patch.result {
            self.result = result;
        }
        if let Some(white) = patch.white_player {
            if white.is_some() || self.white_player.is_none() {
                self.white_player = white;
            }
        }
        if let Some(black) = patch.black_player {
            if black.is_some() || self.black_player.is_none() {
                self.black_player = black;
            }
        }
        if let Some(offer) = patch.draw_offer {
            self.draw_offer = offer;
        }
        if let Some(moves) = patch.move_history {
            self.move_history = moves;
        }
    }

    /// Binds `participant` to the named seat if the seat is empty.
    ///
    /// Returns whether a bind happened; duplicate delivery is a no-op.
    pub fn bind_seat(&mut self, color: Color, participant: Participant) -> bool {
        let seat = match color {
            Color::White => &mut self.white_player,
            Color::Black => &mut self.black_player,
        };
        if seat.is_none() {
            *seat = Some(participant);
            true
        } else {
            false
        }
    }

    /// The participant bound to `color`, if any.
    pub fn seat(&self, color: Color) -> Option<&Participant> {
        match color {
            Color::White => self.white_player.as_ref(),
            Color::Black => self.black_player.as_ref(),
        }
    }

    /// The seat color a participant id is bound to, if any.
    pub fn color_of(&self, participant_id: &str) -> Option<Color> {
        if self.seat(Color::White).map(|p| p.id().as_str()) == Some(participant_id) {
            Some(Color::White)
        } else if self.seat(Color::Black).map(|p| p.id().as_str()) == Some(participant_id) {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Whether both seats are filled.
    pub fn both_seats_filled(&self) -> bool {
        self.white_player.is_some() && self.black_player.is_some()
    }

    /// Side to move per the position encoding.
    pub fn side_to_move(&self) -> Option<Color> {
        chess::side_to_move(&self.fen)
    }
}
