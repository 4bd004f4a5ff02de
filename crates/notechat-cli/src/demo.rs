//! Scripted walk through the realtime pipeline against the in-memory store.
//!
//! Ana signs in with the Book Club chat open. Bob and Cris write from
//! "other devices" (published change events); Ana replies; the chat is
//! closed; the connection drops and comes back. Every alert, session event
//! and final transcript is emitted as JSONL.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use serde_json::json;

use notechat_realtime::{
    now_ms, ChangeOperation, Client, ClientConfig, GroupId, MemoryBackend, ReplyRef, UserId,
    View, GROUPS, GROUP_MESSAGES, PROFILES,
};

use crate::console::ConsoleSurface;
use crate::events::{emit, EventSession, EventStarted, EventStep, EventSummary, EventTranscript};

pub struct DemoConfig {
    pub name: String,
    pub record_unfocused: bool,
    pub allow_alerts: bool,
    pub settle_timeout: Duration,
}

pub async fn run(config: DemoConfig, start: Instant) -> anyhow::Result<()> {
    let backend = Arc::new(MemoryBackend::new());
    seed(&backend, &config.name);

    let client_config = ClientConfig::new()
        .record_unfocused_messages(config.record_unfocused)
        .resubscribe_backoff(Duration::from_millis(50), Duration::from_secs(2));
    let surface = Arc::new(ConsoleSurface {
        allow: config.allow_alerts,
    });
    let mut client = Client::new(backend.clone(), surface, client_config);

    let user = client.load_profile(&UserId::from("u-ana")).await?;
    let mut session_events = client.sign_in(user.clone()).await?;
    let forward = tokio::spawn(async move {
        while let Some(event) = session_events.recv().await {
            emit(&EventSession::new(format!("{event:?}")));
        }
    });

    let groups = client.load_groups().await?;
    emit(&EventStarted::new(user.id.as_ref(), &user.display_name, groups));

    let book_club = GroupId::from("g-1");
    let runners = GroupId::from("g-2");
    let mention = format!("@{} did you finish chapter 3?", user.display_name);

    step("open Book Club");
    client.navigate(View::Groups);
    client.open_chat(book_club.clone());

    step("Bob writes in the open chat");
    publish(&backend, "101", &book_club, "u-bob", "Starting in 10 minutes");
    settle(&client, 1, config.settle_timeout).await?;

    step("Cris mentions you in Runners");
    publish(&backend, "102", &runners, "u-cris", &mention);
    step("Bob writes in Runners");
    publish(&backend, "103", &runners, "u-bob", "Trail run on Sunday, 7am at the park entrance");
    settle(&client, 3, config.settle_timeout).await?;

    step("reply to Bob");
    let quoted = client
        .transcript(&book_club)
        .first()
        .map(ReplyRef::quoting);
    if let Some(pending) = client.send_message(book_club.clone(), "On my way!", quoted) {
        let remote = pending.outcome().await?;
        tracing::info!(remote_id = %remote, "demo: reply persisted");
    }
    settle(&client, 4, config.settle_timeout).await?;

    step("close chat, Bob writes again");
    client.close_chat();
    publish(&backend, "104", &book_club, "u-bob", "Where is everyone?");
    settle(&client, 5, config.settle_timeout).await?;

    step("connection drops");
    backend.drop_subscriptions();
    wait_for(config.settle_timeout, || backend.subscriber_count() == 1)
        .await
        .context("no resubscribe")?;
    publish(&backend, "105", &runners, "u-cris", "Back online?");
    settle(&client, 6, config.settle_timeout).await?;

    for group in [&book_club, &runners] {
        emit(&EventTranscript::new(group.as_ref(), &client.transcript(group)));
    }

    client.sign_out().await;
    forward.await?;
    // Let the delivery task drain queued alerts before reporting.
    tokio::time::sleep(Duration::from_millis(50)).await;

    emit(&EventSummary::new(client.metrics(), start.elapsed().as_secs_f64()));
    Ok(())
}

fn seed(backend: &MemoryBackend, name: &str) {
    backend.seed(
        PROFILES,
        json!({"id": "u-ana", "name": name, "avatar": "https://picsum.photos/seed/u-ana/200"}),
    );
    backend.seed(PROFILES, json!({"id": "u-bob", "name": "Bob", "avatar": ""}));
    backend.seed(PROFILES, json!({"id": "u-cris", "name": "Cris", "avatar": ""}));
    backend.seed(
        GROUPS,
        json!({
            "id": "g-1",
            "name": "Book Club",
            "description": "One chapter a week",
            "admin_id": "u-ana",
            "members": ["u-ana", "u-bob"],
            "is_private": false,
        }),
    );
    backend.seed(
        GROUPS,
        json!({
            "id": "g-2",
            "name": "Runners",
            "admin_id": "u-cris",
            "members": ["u-ana", "u-bob", "u-cris"],
            "is_private": true,
        }),
    );
}

fn step(name: &str) {
    emit(&EventStep::new(name));
}

/// Simulate a write made by another user's device.
fn publish(backend: &MemoryBackend, id: &str, group_id: &GroupId, user_id: &str, text: &str) {
    backend.publish(
        GROUP_MESSAGES,
        ChangeOperation::Insert,
        json!({
            "id": id,
            "group_id": group_id,
            "user_id": user_id,
            "text": text,
            "created_at": now_ms(),
            "reply_to": null
        }),
    );
}

/// Wait until the handler has finished `count` events.
async fn settle(client: &Client, count: u64, timeout: Duration) -> anyhow::Result<()> {
    wait_for(timeout, || client.metrics().events_processed >= count)
        .await
        .with_context(|| format!("ingress did not process {count} events"))
}

async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> anyhow::Result<()> {
    tokio::time::timeout(timeout, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .map_err(|_| anyhow::anyhow!("timed out after {timeout:?}"))
}
