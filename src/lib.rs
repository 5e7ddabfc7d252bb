//! Chessroom - client engine for server-authoritative online chess
//!
//! The server owns the rules, the persistence, and the arbitration
//! between the two players; this crate keeps one client's view of a
//! shared game consistent with it across two channels (request/response
//! and pushed events) while enforcing local turn discipline, the
//! two-step promotion protocol, and the draw-offer handshake.
//!
//! # Architecture
//!
//! - **Store**: [`SessionStore`] holds the last known [`GameSnapshot`];
//!   every update is a structural merge of a [`GamePatch`]
//! - **Authority**: [`GameClient`] submits intents and fetches state
//! - **Events**: [`EventSubscription`] streams session events that
//!   [`fold_event`] merges into the store
//! - **Coordinators**: [`MoveCoordinator`] (drop intents, promotion
//!   suspension) and [`DrawActions`] (offer/respond permissions)
//! - **Session**: [`GameSession`] wires it all together per game
//!
//! # Example
//!
//! ```no_run
//! use chessroom::{ClientConfig, GameSession};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), chessroom::ApiError> {
//! let config = ClientConfig::from_env();
//! let (notice_tx, mut notices) = mpsc::unbounded_channel();
//! let session = GameSession::open(&config, "game-id", "player-id", notice_tx).await?;
//! while let Some(notice) = notices.recv().await {
//!     println!("{notice}");
//! }
//! session.close().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod chess;
mod client;
mod config;
mod draw;
mod error;
mod events;
mod moves;
mod rules;
mod session;
mod snapshot;
mod store;

// Crate-level exports - chess primitives
pub use chess::{
    Color, ParseSquareError, Piece, PieceKind, PromotionPiece, Square, piece_at, side_to_move,
};

// Crate-level exports - rules oracle seam
pub use rules::{FenOracle, RulesOracle};

// Crate-level exports - snapshot and wire payloads
pub use snapshot::{DrawOffer, GamePatch, GameResult, GameSnapshot, GameStatus, Participant};

// Crate-level exports - session store
pub use store::SessionStore;

// Crate-level exports - authority client
pub use client::{GameClient, create_game, join_game};

// Crate-level exports - event subscription
pub use events::{EventSubscription, GameEvent, JoinedPlayer};

// Crate-level exports - session lifecycle
pub use session::{GameSession, Notice, fold_event};

// Crate-level exports - coordinators
pub use draw::DrawActions;
pub use moves::{DropVerdict, MoveCoordinator};

// Crate-level exports - configuration
pub use config::{ClientConfig, ConfigError, SERVER_URL_VAR};

// Crate-level exports - errors
pub use error::{ActionError, ApiError, IntentRejection};
