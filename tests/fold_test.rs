//! Fold semantics: pushed events merging into the session store.

use chessroom::{
    Color, DrawOffer, GameEvent, GamePatch, GameStatus, JoinedPlayer, Notice, SessionStore,
    fold_event,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

fn channel() -> (UnboundedSender<Notice>, UnboundedReceiver<Notice>) {
    mpsc::unbounded_channel()
}

fn pending_game_patch() -> GamePatch {
    serde_json::from_value(serde_json::json!({
        "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "status": "pending",
        "whitePlayer": { "_id": "alice" },
        "blackPlayer": null
    }))
    .unwrap()
}

fn active_game_patch() -> GamePatch {
    serde_json::from_value(serde_json::json!({
        "fen": "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        "status": "active",
        "whitePlayer": { "_id": "alice" },
        "blackPlayer": { "_id": "bob" },
        "moveHistory": ["e4"]
    }))
    .unwrap()
}

#[test]
fn player_joined_binds_seat_and_notifies_opponent_side() {
    let store = SessionStore::new("alice");
    store.apply(pending_game_patch());
    let (tx, mut rx) = channel();

    fold_event(
        &store,
        GameEvent::PlayerJoined {
            player_id: "bob".into(),
            assigned_color: Color::Black,
        },
        &tx,
    );

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.seat(Color::Black).unwrap().id(), "bob");
    assert_eq!(rx.try_recv().unwrap(), Notice::OpponentJoined);
}

#[test]
fn own_join_event_is_silent() {
    let store = SessionStore::new("alice");
    store.apply(pending_game_patch());
    let (tx, mut rx) = channel();

    fold_event(
        &store,
        GameEvent::PlayerJoined {
            player_id: "alice".into(),
            assigned_color: Color::White,
        },
        &tx,
    );

    assert!(rx.try_recv().is_err());
}

#[test]
fn duplicate_join_event_changes_nothing() {
    let store = SessionStore::new("alice");
    store.apply(pending_game_patch());
    let (tx, mut rx) = channel();

    let event = GameEvent::PlayerJoined {
        player_id: "bob".into(),
        assigned_color: Color::Black,
    };
    fold_event(&store, event.clone(), &tx);
    let after_first = store.snapshot();
    rx.try_recv().unwrap();

    fold_event(&store, event, &tx);
    assert_eq!(store.snapshot(), after_first);
}

#[test]
fn game_started_replaces_and_names_the_joiner() {
    let store = SessionStore::new("alice");
    store.apply(pending_game_patch());
    let (tx, mut rx) = channel();

    fold_event(
        &store,
        GameEvent::GameStarted {
            game: active_game_patch(),
            joined_player: JoinedPlayer {
                id: "bob".into(),
                color: Color::Black,
            },
        },
        &tx,
    );

    let snapshot = store.snapshot().unwrap();
    assert_eq!(*snapshot.status(), GameStatus::Active);
    assert_eq!(
        rx.try_recv().unwrap(),
        Notice::OpponentJoinedAs {
            color: Color::Black
        }
    );
}

#[test]
fn move_made_replaces_without_notice() {
    let store = SessionStore::new("alice");
    store.apply(pending_game_patch());
    let (tx, mut rx) = channel();

    fold_event(
        &store,
        GameEvent::MoveMade {
            game: active_game_patch(),
        },
        &tx,
    );

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.move_history().len(), 1);
    assert_eq!(snapshot.side_to_move(), Some(Color::Black));
    assert!(rx.try_recv().is_err());
}

#[test]
fn duplicate_move_event_is_idempotent() {
    let store = SessionStore::new("alice");
    store.apply(pending_game_patch());
    let (tx, _rx) = channel();

    let event = GameEvent::MoveMade {
        game: active_game_patch(),
    };
    fold_event(&store, event.clone(), &tx);
    let after_first = store.snapshot();
    fold_event(&store, event, &tx);
    assert_eq!(store.snapshot(), after_first);
}

#[test]
fn draw_offer_from_opponent_requests_a_response() {
    let store = SessionStore::new("alice");
    store.apply(active_game_patch());
    let (tx, mut rx) = channel();

    let mut game = active_game_patch();
    game.draw_offer = Some(Some(DrawOffer::by("bob")));
    fold_event(
        &store,
        GameEvent::DrawOffered {
            game,
            offered_by: "bob".into(),
        },
        &tx,
    );

    assert!(store.snapshot().unwrap().draw_offer().is_some());
    assert_eq!(rx.try_recv().unwrap(), Notice::DrawOfferReceived);
}

#[test]
fn own_draw_offer_echo_is_silent() {
    let store = SessionStore::new("alice");
    store.apply(active_game_patch());
    let (tx, mut rx) = channel();

    fold_event(
        &store,
        GameEvent::DrawOffered {
            game: active_game_patch(),
            offered_by: "alice".into(),
        },
        &tx,
    );

    assert!(rx.try_recv().is_err());
}

#[test]
fn draw_response_notices_depend_on_acceptance() {
    let store = SessionStore::new("alice");
    store.apply(active_game_patch());
    let (tx, mut rx) = channel();

    fold_event(
        &store,
        GameEvent::DrawResponse {
            game: active_game_patch(),
            accepted: false,
            responded_by: "bob".into(),
        },
        &tx,
    );
    assert_eq!(rx.try_recv().unwrap(), Notice::DrawDeclined);

    fold_event(
        &store,
        GameEvent::DrawResponse {
            game: active_game_patch(),
            accepted: true,
            responded_by: "bob".into(),
        },
        &tx,
    );
    assert_eq!(rx.try_recv().unwrap(), Notice::DrawAccepted);
}

#[test]
fn resignation_notice_distinguishes_the_resigner() {
    let store = SessionStore::new("alice");
    store.apply(active_game_patch());
    let (tx, mut rx) = channel();

    fold_event(
        &store,
        GameEvent::GameResigned {
            game: active_game_patch(),
            resigned_by: "alice".into(),
        },
        &tx,
    );
    assert_eq!(rx.try_recv().unwrap(), Notice::YouResigned);

    fold_event(
        &store,
        GameEvent::GameResigned {
            game: active_game_patch(),
            resigned_by: "bob".into(),
        },
        &tx,
    );
    assert_eq!(rx.try_recv().unwrap(), Notice::OpponentResigned);
}

#[test]
fn events_after_teardown_are_dropped_silently() {
    let store = SessionStore::new("alice");
    store.apply(pending_game_patch());
    let before = store.snapshot();
    store.close();
    let (tx, mut rx) = channel();

    fold_event(
        &store,
        GameEvent::MoveMade {
            game: active_game_patch(),
        },
        &tx,
    );
    fold_event(
        &store,
        GameEvent::GameResigned {
            game: active_game_patch(),
            resigned_by: "bob".into(),
        },
        &tx,
    );

    assert_eq!(store.snapshot(), before);
    assert!(rx.try_recv().is_err(), "no notice may surface after teardown");
}
