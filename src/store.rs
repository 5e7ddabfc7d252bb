//! Shared holder of the session's game snapshot.

use crate::chess::Color;
use crate::snapshot::{GamePatch, GameSnapshot, GameStatus, Participant};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

#[derive(Debug)]
struct StoreInner {
    local_id: String,
    snapshot: Option<GameSnapshot>,
    closed: bool,
}

/// Single-writer store for the session's snapshot.
///
/// Handles are cheap clones sharing one slot. The authority client and
/// the event fold never touch the snapshot directly; they hand patches to
/// [`SessionStore::apply`], which performs the structural merge. Once
/// [`SessionStore::close`] runs, every further write is dropped, so late
/// responses and events cannot resurrect a torn-down session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl SessionStore {
    /// Creates an unloaded store for the given local participant.
    #[instrument(skip_all, fields(local_id = %local_id.as_ref()))]
    pub fn new(local_id: impl AsRef<str>) -> Self {
        info!("Creating session store");
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                local_id: local_id.as_ref().to_string(),
                snapshot: None,
                closed: false,
            })),
        }
    }

    /// The local participant id this store was opened with.
    pub fn local_id(&self) -> String {
        self.lock().local_id.clone()
    }

    /// The current snapshot, if one has loaded.
    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.lock().snapshot.clone()
    }

    /// Whether a snapshot has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.lock().snapshot.is_some()
    }

    /// Folds a patch into the store.
    ///
    /// Loads the snapshot on first application; afterwards merges per
    /// [`GameSnapshot::merge`]. Returns whether the write was applied --
    /// writes against a closed store and unloadable first patches are
    /// dropped.
    #[instrument(skip_all)]
    pub fn apply(&self, patch: GamePatch) -> bool {
        let mut inner = self.lock();
        if inner.closed {
            debug!("Dropping write against closed store");
            return false;
        }
        match inner.snapshot.as_mut() {
            Some(snapshot) => {
                snapshot.merge(patch);
                debug!(status = %snapshot.status(), "Merged patch into snapshot");
                true
            }
            None => match GameSnapshot::from_patch(patch) {
                Some(snapshot) => {
                    debug!(status = %snapshot.status(), "Loaded initial snapshot");
                    inner.snapshot = Some(snapshot);
                    true
                }
                None => {
                    warn!("Dropping partial payload; no snapshot loaded yet");
                    false
                }
            },
        }
    }

    /// Binds a seat to a participant id if the seat is empty (idempotent
    /// against duplicate delivery). Dropped when closed or unloaded.
    #[instrument(skip(self), fields(color = %color, participant_id))]
    pub fn bind_seat(&self, color: Color, participant_id: &str) -> bool {
        let mut inner = self.lock();
        if inner.closed {
            debug!("Dropping seat bind against closed store");
            return false;
        }
        match inner.snapshot.as_mut() {
            Some(snapshot) => {
                let bound = snapshot.bind_seat(color, Participant::from_id(participant_id));
                if bound {
                    info!("Seat bound");
                } else {
                    debug!("Seat already bound; ignoring duplicate");
                }
                bound
            }
            None => {
                warn!("Dropping seat bind; no snapshot loaded yet");
                false
            }
        }
    }

    /// The seat color the local participant is bound to, if any.
    pub fn local_color(&self) -> Option<Color> {
        let inner = self.lock();
        let local = inner.local_id.clone();
        inner.snapshot.as_ref()?.color_of(&local)
    }

    /// Whether it is currently the local participant's turn: the game is
    /// active and the side-to-move color's seat is bound to them.
    ///
    /// Pure function of the stored snapshot; recomputed on every call.
    pub fn is_local_turn(&self) -> bool {
        let inner = self.lock();
        let Some(snapshot) = inner.snapshot.as_ref() else {
            return false;
        };
        if *snapshot.status() != GameStatus::Active {
            return false;
        }
        let Some(to_move) = snapshot.side_to_move() else {
            return false;
        };
        snapshot.seat(to_move).map(|p| p.id().as_str()) == Some(inner.local_id.as_str())
    }

    /// Marks the store closed; all subsequent writes are dropped.
    #[instrument(skip(self))]
    pub fn close(&self) {
        let mut inner = self.lock();
        if !inner.closed {
            info!("Closing session store");
            inner.closed = true;
        }
    }

    /// Whether the store has been closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        // Lock poisoning cannot outlive a panic we would want to recover
        // from; all critical sections are short and panic-free.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
