//! Draw handshake permissions and guards.

use chessroom::{ActionError, DrawActions, GameClient, GamePatch, IntentRejection, SessionStore};

fn offline_client() -> GameClient {
    GameClient::new("http://127.0.0.1:9", "game-1")
}

fn store_with(local: &str, game: serde_json::Value) -> SessionStore {
    let store = SessionStore::new(local);
    store.apply(serde_json::from_value::<GamePatch>(game).unwrap());
    store
}

fn active_game(draw_offer: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "status": "active",
        "whitePlayer": { "_id": "alice" },
        "blackPlayer": { "_id": "bob" },
        "drawOffer": draw_offer
    })
}

fn guard(err: ActionError) -> IntentRejection {
    match err {
        ActionError::Guard(rejection) => rejection,
        ActionError::Api(err) => panic!("expected a guard rejection, hit the network: {err}"),
    }
}

#[test]
fn offer_enabled_only_with_no_outstanding_offer() {
    let actions = DrawActions::new(
        store_with("alice", active_game(serde_json::Value::Null)),
        offline_client(),
    );
    assert!(actions.can_offer());

    let actions = DrawActions::new(
        store_with("alice", active_game(serde_json::json!({ "offeredBy": "bob" }))),
        offline_client(),
    );
    assert!(!actions.can_offer());
}

#[test]
fn offer_disabled_unless_active() {
    let mut game = active_game(serde_json::Value::Null);
    game["status"] = serde_json::json!("completed");
    game["result"] = serde_json::json!("draw");
    let actions = DrawActions::new(store_with("alice", game), offline_client());
    assert!(!actions.can_offer());
}

#[test]
fn respond_requires_someone_elses_offer() {
    // No offer: nothing to respond to.
    let actions = DrawActions::new(
        store_with("alice", active_game(serde_json::Value::Null)),
        offline_client(),
    );
    assert!(!actions.can_respond());

    // Own offer: self-response forbidden.
    let actions = DrawActions::new(
        store_with(
            "alice",
            active_game(serde_json::json!({ "offeredBy": "alice" })),
        ),
        offline_client(),
    );
    assert!(!actions.can_respond());

    // Opponent's offer: allowed.
    let actions = DrawActions::new(
        store_with("alice", active_game(serde_json::json!({ "offeredBy": "bob" }))),
        offline_client(),
    );
    assert!(actions.can_respond());
}

#[tokio::test]
async fn second_offer_is_guard_rejected_without_network() {
    let actions = DrawActions::new(
        store_with("alice", active_game(serde_json::json!({ "offeredBy": "alice" }))),
        offline_client(),
    );
    let err = actions.offer().await.unwrap_err();
    assert_eq!(guard(err), IntentRejection::OfferOutstanding);
}

#[tokio::test]
async fn responding_to_own_offer_is_guard_rejected() {
    let actions = DrawActions::new(
        store_with("alice", active_game(serde_json::json!({ "offeredBy": "alice" }))),
        offline_client(),
    );
    let err = actions.respond(true).await.unwrap_err();
    assert_eq!(guard(err), IntentRejection::OwnOffer);
}

#[tokio::test]
async fn responding_with_no_offer_is_guard_rejected() {
    let actions = DrawActions::new(
        store_with("alice", active_game(serde_json::Value::Null)),
        offline_client(),
    );
    let err = actions.respond(false).await.unwrap_err();
    assert_eq!(guard(err), IntentRejection::NoOfferPending);
}

#[tokio::test]
async fn draw_actions_rejected_while_unloaded() {
    let actions = DrawActions::new(SessionStore::new("alice"), offline_client());
    assert!(!actions.can_offer());
    assert!(!actions.can_respond());
    let err = actions.offer().await.unwrap_err();
    assert_eq!(guard(err), IntentRejection::NotLoaded);
}
