//! Move protocol: drag intents, promotion suspension, submission.
//!
//! A drop intent is decided in two steps. The guard answers synchronously
//! (so a visual layer can accept or revert the drag before any network
//! traffic), then the submission runs against the authority. Promotion
//! advances suspend between the two: the drop is provisionally refused,
//! the squares are held, and the choice of piece triggers exactly one
//! submission.

use crate::chess::{PromotionPiece, Square};
use crate::client::GameClient;
use crate::error::{ActionError, IntentRejection};
use crate::rules::{FenOracle, RulesOracle};
use crate::snapshot::{GameSnapshot, GameStatus};
use crate::store::SessionStore;
use tracing::{debug, info, instrument, warn};

/// What became of an accepted drop intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropVerdict {
    /// The move was submitted and accepted by the authority.
    Accepted,
    /// The drop is a promotion advance; submission is suspended until a
    /// piece is chosen with [`MoveCoordinator::choose_promotion`].
    PromotionPending,
}

#[derive(Debug, Clone, Copy)]
struct PendingPromotion {
    from: Square,
    to: Square,
}

/// Drives the move protocol for one session.
#[derive(Debug)]
pub struct MoveCoordinator<O: RulesOracle = FenOracle> {
    store: SessionStore,
    client: GameClient,
    oracle: O,
    pending: Option<PendingPromotion>,
}

impl MoveCoordinator<FenOracle> {
    /// Creates a coordinator using the default FEN-reading oracle.
    pub fn new(store: SessionStore, client: GameClient) -> Self {
        Self::with_oracle(store, client, FenOracle)
    }
}

impl<O: RulesOracle> MoveCoordinator<O> {
    /// Creates a coordinator over a custom rules oracle.
    pub fn with_oracle(store: SessionStore, client: GameClient, oracle: O) -> Self {
        Self {
            store,
            client,
            oracle,
            pending: None,
        }
    }

    /// Whether a promotion choice is currently pending.
    pub fn awaiting_promotion(&self) -> bool {
        self.pending.is_some()
    }

    /// Handles a drop intent from `from` to `to`.
    ///
    /// Guard rejections are returned before any network call is made.
    /// A promotion advance returns [`DropVerdict::PromotionPending`]
    /// without submitting; anything else submits immediately.
    #[instrument(skip(self), fields(%from, %to))]
    pub async fn drop_piece(
        &mut self,
        from: Square,
        to: Square,
    ) -> Result<DropVerdict, ActionError> {
        let snapshot = self.check_guard()?;

        if let Some(piece) = self.oracle.piece_at(snapshot.fen(), from)
            && self.oracle.is_promotion_advance(piece, to)
        {
            info!("Promotion advance; suspending until a piece is chosen");
            self.pending = Some(PendingPromotion { from, to });
            return Ok(DropVerdict::PromotionPending);
        }

        debug!("Plain move; submitting");
        let patch = self.client.submit_move(from, to, None).await?;
        self.store.apply(patch);
        info!("Move accepted");
        Ok(DropVerdict::Accepted)
    }

    /// Completes a suspended promotion with the chosen piece.
    ///
    /// The suspension is consumed before submission, so the coordinator
    /// returns to idle whatever the authority answers; there is no cancel
    /// path and no second submission.
    #[instrument(skip(self), fields(?piece))]
    pub async fn choose_promotion(
        &mut self,
        piece: PromotionPiece,
    ) -> Result<(), ActionError> {
        let PendingPromotion { from, to } = self
            .pending
            .take()
            .ok_or(IntentRejection::NoPromotionPending)?;
        info!(%from, %to, "Submitting promotion");
        let patch = self.client.submit_move(from, to, Some(piece)).await?;
        self.store.apply(patch);
        Ok(())
    }

    /// Evaluates the drop guard and returns the snapshot to act on.
    ///
    /// Read immediately before acting; earlier reads may have gone stale
    /// behind an interleaved event.
    fn check_guard(&self) -> Result<GameSnapshot, IntentRejection> {
        if self.store.is_closed() {
            return Err(IntentRejection::SessionClosed);
        }
        if self.pending.is_some() {
            warn!("Drop intent while a promotion choice is pending");
            return Err(IntentRejection::ChoicePending);
        }
        let snapshot = self.store.snapshot().ok_or(IntentRejection::NotLoaded)?;
        if !snapshot.both_seats_filled() {
            return Err(IntentRejection::SeatsUnfilled);
        }
        if *snapshot.status() != GameStatus::Active {
            return Err(IntentRejection::GameNotActive);
        }
        if !self.store.is_local_turn() {
            debug!("Drop intent refused; not local turn");
            return Err(IntentRejection::NotYourTurn);
        }
        Ok(snapshot)
    }
}
