//! Game session lifecycle: open, synchronize, act, tear down.
//!
//! A session ties the store, the authority client, and the event
//! subscription together. Opening fetches the canonical snapshot and
//! joins the push channel; from then on both the responses to local
//! intents and the pushed events fold into the same store, and derived
//! notices surface to whatever frontend is attached. Closing runs on
//! every exit path: the store stops accepting writes first, so anything
//! still in flight lands harmlessly.

use crate::chess::Color;
use crate::client::GameClient;
use crate::config::ClientConfig;
use crate::draw::DrawActions;
use crate::error::{ActionError, ApiError, IntentRejection};
use crate::events::{EventSubscription, GameEvent};
use crate::moves::MoveCoordinator;
use crate::snapshot::GameSnapshot;
use crate::store::SessionStore;
use derive_more::Display;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// A user-facing notification derived from a pushed event.
///
/// The display text is what the frontend shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Notice {
    /// The local participant's own join completed the table.
    #[display("You joined as {color}")]
    YouJoined {
        /// Seat taken.
        color: Color,
    },
    /// The opponent's join completed the table.
    #[display("Your opponent joined as {color}")]
    OpponentJoinedAs {
        /// Seat taken.
        color: Color,
    },
    /// The opponent took a seat; waiting for the game to start.
    #[display("Opponent joined the game")]
    OpponentJoined,
    /// The opponent offered a draw; a response is expected.
    #[display("Your opponent has offered a draw")]
    DrawOfferReceived,
    /// The opponent accepted the local participant's offer.
    #[display("Opponent accepted draw - Game Over!")]
    DrawAccepted,
    /// The opponent declined the local participant's offer.
    #[display("Opponent declined draw")]
    DrawDeclined,
    /// The local participant's resignation was confirmed.
    #[display("You resigned the game")]
    YouResigned,
    /// The opponent resigned.
    #[display("Opponent resigned - You win!")]
    OpponentResigned,
}

/// Folds one pushed event into the store and derives any notice.
///
/// Replacement is idempotent: duplicate or reordered delivery of the
/// same payload leaves the store's observable content unchanged. Events
/// arriving after teardown are dropped without a trace.
pub fn fold_event(store: &SessionStore, event: GameEvent, notices: &UnboundedSender<Notice>) {
    if store.is_closed() {
        debug!("Dropping event against closed store");
        return;
    }
    let local = store.local_id();
    match event {
        GameEvent::GameStarted {
            game,
            joined_player,
        } => {
            store.apply(game);
            let notice = if joined_player.id == local {
                Notice::YouJoined {
                    color: joined_player.color,
                }
            } else {
                Notice::OpponentJoinedAs {
                    color: joined_player.color,
                }
            };
            let _ = notices.send(notice);
        }
        GameEvent::PlayerJoined {
            player_id,
            assigned_color,
        } => {
            store.bind_seat(assigned_color, &player_id);
            if player_id != local {
                let _ = notices.send(Notice::OpponentJoined);
            }
        }
        GameEvent::MoveMade { game } => {
            store.apply(game);
        }
        GameEvent::DrawOffered { game, offered_by } => {
            store.apply(game);
            if offered_by != local {
                let _ = notices.send(Notice::DrawOfferReceived);
            }
        }
        GameEvent::DrawResponse {
            game,
            accepted,
            responded_by,
        } => {
            store.apply(game);
            if responded_by != local {
                let notice = if accepted {
                    Notice::DrawAccepted
                } else {
                    Notice::DrawDeclined
                };
                let _ = notices.send(notice);
            }
        }
        GameEvent::GameResigned { game, resigned_by } => {
            store.apply(game);
            let notice = if resigned_by == local {
                Notice::YouResigned
            } else {
                Notice::OpponentResigned
            };
            let _ = notices.send(notice);
        }
    }
}

/// An open, synchronized game session.
#[derive(Debug)]
pub struct GameSession {
    store: SessionStore,
    client: GameClient,
    moves: MoveCoordinator,
    draw: DrawActions,
    subscription: EventSubscription,
    fold_task: JoinHandle<()>,
}

impl GameSession {
    /// Opens a session: fetches the canonical snapshot, joins the event
    /// channel, and starts folding pushed events. Derived notices go out
    /// on `notices`, which the frontend holds the other end of.
    ///
    /// Fails without side effects when the initial fetch or the
    /// subscription is refused; the error carries the message to show.
    #[instrument(skip(config, notices), fields(game_id, participant_id))]
    pub async fn open(
        config: &ClientConfig,
        game_id: &str,
        participant_id: &str,
        notices: UnboundedSender<Notice>,
    ) -> Result<Self, ApiError> {
        info!("Opening game session");
        let client = GameClient::new(config.server_url(), game_id);
        let store = SessionStore::new(participant_id);

        let initial = client.fetch_game().await?;
        store.apply(initial);

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let subscription =
            EventSubscription::open(client.clone(), participant_id, event_tx).await?;

        let fold_store = store.clone();
        let fold_task = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                fold_event(&fold_store, event, &notices);
            }
            debug!("Fold loop ended");
        });

        let moves = MoveCoordinator::new(store.clone(), client.clone());
        let draw = DrawActions::new(store.clone(), client.clone());

        info!("Game session open");
        Ok(Self {
            store,
            client,
            moves,
            draw,
            subscription,
            fold_task,
        })
    }

    /// The game this session is synchronized with.
    pub fn game_id(&self) -> &str {
        self.client.game_id()
    }

    /// Handle on the session store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The current snapshot, if loaded.
    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.store.snapshot()
    }

    /// The move protocol coordinator.
    pub fn moves(&mut self) -> &mut MoveCoordinator {
        &mut self.moves
    }

    /// The draw handshake actions.
    pub fn draw(&self) -> &DrawActions {
        &self.draw
    }

    /// Resigns the game on behalf of the local participant.
    ///
    /// A game already over is the server's call to reject; the error
    /// carries its message and the store stays unchanged.
    #[instrument(skip(self), fields(game_id = %self.client.game_id()))]
    pub async fn resign(&self) -> Result<(), ActionError> {
        if self.store.is_closed() {
            return Err(IntentRejection::SessionClosed.into());
        }
        if !self.store.is_loaded() {
            return Err(IntentRejection::NotLoaded.into());
        }
        let patch = self.client.resign(&self.store.local_id()).await?;
        self.store.apply(patch);
        info!("Resignation accepted");
        Ok(())
    }

    /// Tears the session down: stops accepting writes, leaves the event
    /// channel (notifying the server), and stops the fold loop.
    #[instrument(skip(self), fields(game_id = %self.client.game_id()))]
    pub async fn close(mut self) {
        info!("Closing game session");
        self.store.close();
        self.subscription.leave().await;
        self.fold_task.abort();
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        // Backstop for exits that skip close(): stop mutation first so
        // anything in flight is dropped, then stop the fold loop. The
        // subscription's own drop handles the departure notice.
        self.store.close();
        self.fold_task.abort();
    }
}
