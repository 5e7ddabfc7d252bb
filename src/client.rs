//! Request/response client for the game authority.
//!
//! Every operation is one round trip that either yields a fresh `game`
//! payload for the store or fails with a message fit for the user. The
//! client never touches the store itself.

use crate::chess::{PromotionPiece, Square};
use crate::error::ApiError;
use crate::snapshot::GamePatch;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// HTTP client bound to one game on one authority server.
#[derive(Debug, Clone)]
pub struct GameClient {
    http: reqwest::Client,
    base_url: String,
    game_id: String,
}

#[derive(Debug, Deserialize)]
struct GameEnvelope {
    #[serde(default)]
    message: Option<String>,
    game: GamePatch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerBody<'a> {
    player_id: &'a str,
}

#[derive(Debug, Serialize)]
struct MoveBody {
    from: Square,
    to: Square,
    #[serde(skip_serializing_if = "Option::is_none")]
    promotion: Option<PromotionPiece>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DrawResponseBody<'a> {
    player_id: &'a str,
    accept: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedGame {
    game_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateEnvelope {
    game: CreatedGame,
}

impl GameClient {
    /// Creates a client for `game_id` against `base_url`.
    #[instrument(skip_all, fields(base_url = %base_url.as_ref(), game_id = %game_id.as_ref()))]
    pub fn new(base_url: impl AsRef<str>, game_id: impl AsRef<str>) -> Self {
        info!("Creating game client");
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            game_id: game_id.as_ref().to_string(),
        }
    }

    /// The game this client is bound to.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/game/{}{}", self.base_url, self.game_id, suffix)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn events_url(&self) -> String {
        self.url("/events")
    }

    /// Fetches the canonical game payload.
    #[instrument(skip(self), fields(game_id = %self.game_id))]
    pub async fn fetch_game(&self) -> Result<GamePatch, ApiError> {
        debug!("Fetching game state");
        let response = self.http.get(self.url("")).send().await?;
        read_game(response).await
    }

    /// Submits a move; `promotion` is present exactly when the move is a
    /// pawn's advance to the farthest rank.
    #[instrument(skip(self), fields(game_id = %self.game_id, %from, %to, ?promotion))]
    pub async fn submit_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PromotionPiece>,
    ) -> Result<GamePatch, ApiError> {
        info!("Submitting move");
        let response = self
            .http
            .post(self.url("/move"))
            .json(&MoveBody {
                from,
                to,
                promotion,
            })
            .send()
            .await?;
        read_game(response).await
    }

    /// Resigns the game on behalf of `player_id`.
    #[instrument(skip(self), fields(game_id = %self.game_id, player_id))]
    pub async fn resign(&self, player_id: &str) -> Result<GamePatch, ApiError> {
        info!("Submitting resignation");
        let response = self
            .http
            .post(self.url("/resign"))
            .json(&PlayerBody { player_id })
            .send()
            .await?;
        read_game(response).await
    }

    /// Offers a draw on behalf of `player_id`.
    #[instrument(skip(self), fields(game_id = %self.game_id, player_id))]
    pub async fn offer_draw(&self, player_id: &str) -> Result<GamePatch, ApiError> {
        info!("Offering draw");
        let response = self
            .http
            .post(self.url("/offer-draw"))
            .json(&PlayerBody { player_id })
            .send()
            .await?;
        read_game(response).await
    }

    /// Accepts or declines the outstanding draw offer.
    #[instrument(skip(self), fields(game_id = %self.game_id, player_id, accept))]
    pub async fn respond_draw(
        &self,
        player_id: &str,
        accept: bool,
    ) -> Result<GamePatch, ApiError> {
        info!("Responding to draw offer");
        let response = self
            .http
            .post(self.url("/respond-draw"))
            .json(&DrawResponseBody { player_id, accept })
            .send()
            .await?;
        read_game(response).await
    }

    /// Tells the server this participant has left the session, so it can
    /// reclaim its presence bookkeeping.
    #[instrument(skip(self), fields(game_id = %self.game_id, player_id))]
    pub async fn leave(&self, player_id: &str) -> Result<(), ApiError> {
        debug!("Notifying server of departure");
        let response = self
            .http
            .post(self.url("/leave"))
            .json(&PlayerBody { player_id })
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Leave notification rejected");
            Err(ApiError::from_error_body(status, &body))
        }
    }
}

async fn read_game(response: reqwest::Response) -> Result<GamePatch, ApiError> {
    let status = response.status();
    if status.is_success() {
        let envelope: GameEnvelope = response.json().await?;
        if let Some(message) = &envelope.message {
            debug!(%message, "Authority message");
        }
        Ok(envelope.game)
    } else {
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_error_body(status, &body);
        warn!(%status, error = %err, "Authority rejected request");
        Err(err)
    }
}

/// Creates a new game owned by `player_id`; returns the new game id.
#[instrument(skip_all, fields(base_url = %base_url.as_ref(), player_id))]
pub async fn create_game(
    base_url: impl AsRef<str>,
    player_id: &str,
) -> Result<String, ApiError> {
    info!("Creating game");
    let url = format!(
        "{}/game/create",
        base_url.as_ref().trim_end_matches('/')
    );
    let response = reqwest::Client::new()
        .post(url)
        .json(&PlayerBody { player_id })
        .send()
        .await?;
    let status = response.status();
    if status.is_success() {
        let envelope: CreateEnvelope = response.json().await?;
        info!(game_id = %envelope.game.game_id, "Game created");
        Ok(envelope.game.game_id)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_error_body(status, &body))
    }
}

/// Joins an existing game as `player_id`.
#[instrument(skip_all, fields(base_url = %base_url.as_ref(), game_id, player_id))]
pub async fn join_game(
    base_url: impl AsRef<str>,
    game_id: &str,
    player_id: &str,
) -> Result<(), ApiError> {
    info!("Joining game");
    let url = format!(
        "{}/game/join/{}",
        base_url.as_ref().trim_end_matches('/'),
        game_id
    );
    let response = reqwest::Client::new()
        .post(url)
        .json(&PlayerBody { player_id })
        .send()
        .await?;
    let status = response.status();
    if status.is_success() {
        info!("Joined game");
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_error_body(status, &body))
    }
}
