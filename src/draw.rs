//! Draw handshake: offer, accept, decline.
//!
//! Pure policy over the snapshot's outstanding offer plus two call
//! sites; no state of its own.

use crate::client::GameClient;
use crate::error::{ActionError, IntentRejection};
use crate::snapshot::GameStatus;
use crate::store::SessionStore;
use tracing::{info, instrument};

/// Derived draw permissions and the actions they gate.
#[derive(Debug, Clone)]
pub struct DrawActions {
    store: SessionStore,
    client: GameClient,
}

impl DrawActions {
    /// Creates the draw action surface for one session.
    pub fn new(store: SessionStore, client: GameClient) -> Self {
        Self { store, client }
    }

    /// Whether offering a draw is currently permitted: the game is
    /// active and no offer is outstanding.
    pub fn can_offer(&self) -> bool {
        self.store
            .snapshot()
            .is_some_and(|s| *s.status() == GameStatus::Active && s.draw_offer().is_none())
    }

    /// Whether responding is currently permitted: the game is active and
    /// someone other than the local participant has an offer outstanding.
    pub fn can_respond(&self) -> bool {
        let local = self.store.local_id();
        self.store.snapshot().is_some_and(|s| {
            *s.status() == GameStatus::Active
                && s.draw_offer()
                    .as_ref()
                    .is_some_and(|offer| *offer.offered_by() != local)
        })
    }

    /// Offers a draw on behalf of the local participant.
    #[instrument(skip(self))]
    pub async fn offer(&self) -> Result<(), ActionError> {
        self.guard_offer()?;
        let patch = self.client.offer_draw(&self.store.local_id()).await?;
        self.store.apply(patch);
        info!("Draw offer sent");
        Ok(())
    }

    /// Accepts or declines the outstanding offer.
    #[instrument(skip(self), fields(accept))]
    pub async fn respond(&self, accept: bool) -> Result<(), ActionError> {
        self.guard_respond()?;
        let patch = self
            .client
            .respond_draw(&self.store.local_id(), accept)
            .await?;
        self.store.apply(patch);
        info!(accept, "Draw response sent");
        Ok(())
    }

    fn guard_offer(&self) -> Result<(), IntentRejection> {
        if self.store.is_closed() {
            return Err(IntentRejection::SessionClosed);
        }
        let snapshot = self.store.snapshot().ok_or(IntentRejection::NotLoaded)?;
        if *snapshot.status() != GameStatus::Active {
            return Err(IntentRejection::GameNotActive);
        }
        if snapshot.draw_offer().is_some() {
            return Err(IntentRejection::OfferOutstanding);
        }
        Ok(())
    }

    fn guard_respond(&self) -> Result<(), IntentRejection> {
        if self.store.is_closed() {
            return Err(IntentRejection::SessionClosed);
        }
        let snapshot = self.store.snapshot().ok_or(IntentRejection::NotLoaded)?;
        if *snapshot.status() != GameStatus::Active {
            return Err(IntentRejection::GameNotActive);
        }
        let offer = snapshot
            .draw_offer()
            .as_ref()
            .ok_or(IntentRejection::NoOfferPending)?;
        if *offer.offered_by() == self.store.local_id() {
            return Err(IntentRejection::OwnOffer);
        }
        Ok(())
    }
}
