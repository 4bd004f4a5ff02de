/// Integration test: group directory lifecycle through two clients.
///
/// Ana creates a private and a public group; Bob loads the directory,
/// joins the public one directly and asks to join the private one; Ana
/// approves. Both clients share one in-memory store.
use std::sync::Arc;

use notechat_realtime::{
    Client, ClientConfig, CurrentUser, GroupId, JoinOutcome, MemoryBackend, RealtimeError,
    RecordingSurface, UserId, GROUPS,
};
use serde_json::json;

async fn signed_in(backend: &Arc<MemoryBackend>, id: &str, name: &str) -> Client {
    let surface = Arc::new(RecordingSurface::new());
    let mut client = Client::new(backend.clone(), surface, ClientConfig::new());
    let _events = client
        .sign_in(CurrentUser::new(id, name, ""))
        .await
        .expect("sign in");
    client
}

#[tokio::test]
async fn private_group_join_and_approval() {
    let backend = Arc::new(MemoryBackend::new());
    let mut ana = signed_in(&backend, "u-ana", "Ana").await;
    let mut bob = signed_in(&backend, "u-bob", "Bob").await;
    let bob_id = UserId::from("u-bob");

    // ── Step 1: Ana creates two groups ──────────────────────────────────
    let private = ana.create_group("Secret Recipes", "family only", true).await.unwrap();
    let public = ana.create_group("Book Club", "", false).await.unwrap();
    assert!(private.is_admin(&UserId::from("u-ana")));
    assert_eq!(private.member_count(), 1);

    let listed: Vec<_> = ana.groups().all().iter().map(|g| g.name.clone()).collect();
    assert_eq!(listed, vec!["Book Club", "Secret Recipes"]);

    // ── Step 2: Bob loads the directory ─────────────────────────────────
    assert_eq!(bob.load_groups().await.unwrap(), 2);
    assert!(bob.groups().joined_by(&bob_id).is_empty());

    // ── Step 3: public join is immediate, private join waits ────────────
    assert_eq!(bob.request_to_join(&public.id).await.unwrap(), JoinOutcome::Joined);
    assert_eq!(bob.request_to_join(&private.id).await.unwrap(), JoinOutcome::Pending);
    assert_eq!(bob.request_to_join(&private.id).await.unwrap(), JoinOutcome::Unchanged);
    assert_eq!(bob.groups().joined_by(&bob_id).len(), 1);

    // ── Step 4: Bob cannot approve himself ──────────────────────────────
    let err = bob.approve_request(&private.id, &bob_id).await.unwrap_err();
    assert!(matches!(err, RealtimeError::NotGroupAdmin { .. }));

    // ── Step 5: Ana sees the request and approves it ────────────────────
    ana.load_groups().await.unwrap();
    assert!(ana.groups().get(&private.id).unwrap().has_pending_request(&bob_id));
    assert!(ana.approve_request(&private.id, &bob_id).await.unwrap());
    assert!(!ana.approve_request(&private.id, &bob_id).await.unwrap());

    // ── Step 6: the store reflects membership ───────────────────────────
    bob.load_groups().await.unwrap();
    assert_eq!(bob.groups().joined_by(&bob_id).len(), 2);

    let rows = backend.rows(GROUPS);
    let stored = rows
        .iter()
        .find(|r| r["id"] == json!(private.id.0))
        .expect("private group row");
    assert_eq!(stored["members"], json!(["u-ana", "u-bob"]));
    assert_eq!(stored["pending_requests"], json!([]));

    ana.sign_out().await;
    bob.sign_out().await;
}

#[tokio::test]
async fn unknown_group_is_an_error() {
    let backend = Arc::new(MemoryBackend::new());
    let mut bob = signed_in(&backend, "u-bob", "Bob").await;

    let err = bob.request_to_join(&GroupId::from("nope")).await.unwrap_err();
    assert!(matches!(err, RealtimeError::GroupNotFound { .. }));
}

#[tokio::test]
async fn unreadable_group_rows_are_skipped() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(GROUPS, json!({"id": "g-1", "name": "Ok", "admin_id": "u-1", "members": ["u-1"]}));
    backend.seed(GROUPS, json!({"id": "g-2", "members": "not a list"}));
    let mut bob = signed_in(&backend, "u-bob", "Bob").await;

    assert_eq!(bob.load_groups().await.unwrap(), 1);
    assert_eq!(bob.groups().all()[0].name, "Ok");
}

#[tokio::test]
async fn failed_create_leaves_directory_unchanged() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_fail_inserts(GROUPS, true);
    let mut ana = signed_in(&backend, "u-ana", "Ana").await;

    let err = ana.create_group("x", "", false).await.unwrap_err();
    assert!(matches!(err, RealtimeError::Backend(_)));
    assert!(ana.groups().is_empty());
}
