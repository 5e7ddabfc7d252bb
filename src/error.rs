//! Error types for the session engine.

use derive_more::{Display, Error, From};

/// Failure of an authority call: the request never completed, or the
/// server rejected the intent.
///
/// Either way the store is left untouched and the message is fit to show
/// to the user.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    /// The request could not be completed (connection, timeout, decode).
    #[display("request failed: {message}")]
    Transport {
        /// Human-readable transport failure.
        message: String,
    },
    /// The server answered with a rejection.
    #[display("{message}")]
    Rejected {
        /// Message extracted from the response body, or a fallback.
        message: String,
    },
}

impl ApiError {
    /// Builds a rejection from an error response body, preferring the
    /// server's own `{"message": ...}` over a generic fallback.
    pub(crate) fn from_error_body(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message")?.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("Request failed (HTTP {})", status.as_u16()));
        ApiError::Rejected { message }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport {
            message: err.to_string(),
        }
    }
}

/// A local guard refusal: the intent was never sent over the wire.
///
/// The display text is the user-facing reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum IntentRejection {
    /// One or both seats are still empty.
    #[display("Waiting for both players to join before starting the game.")]
    SeatsUnfilled,
    /// No snapshot has been loaded yet.
    #[display("Game data not fully loaded yet.")]
    NotLoaded,
    /// The position says it is the opponent's move.
    #[display("It's not your turn!")]
    NotYourTurn,
    /// The game is pending or already over.
    #[display("The game is not active.")]
    GameNotActive,
    /// A promotion choice is still pending; no new drop is accepted.
    #[display("Finish choosing a promotion piece first.")]
    ChoicePending,
    /// A promotion piece was chosen with no suspended move to attach to.
    #[display("No promotion is waiting for a piece choice.")]
    NoPromotionPending,
    /// A draw offer is already on the table.
    #[display("A draw offer is already outstanding.")]
    OfferOutstanding,
    /// There is nothing to accept or decline.
    #[display("There is no draw offer to respond to.")]
    NoOfferPending,
    /// Responding to one's own offer is forbidden.
    #[display("You cannot respond to your own draw offer.")]
    OwnOffer,
    /// The session has been torn down.
    #[display("The session has been closed.")]
    SessionClosed,
}

/// Outcome of a coordinator action: refused locally, or failed remotely.
#[derive(Debug, Display, Error, From)]
pub enum ActionError {
    /// Stopped by a local guard before any network traffic.
    #[display("{_0}")]
    Guard(IntentRejection),
    /// The authority call itself failed or was rejected.
    #[display("{_0}")]
    Api(ApiError),
}
