use serde::Serialize;
use std::io::Write;

use notechat_realtime::{Message, MetricsSnapshot};

/// Emit a JSONL event to stdout (flushed immediately for piped output).
pub fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = writeln!(lock, "{json}");
        let _ = lock.flush();
    }
}

// ── Session events ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventStarted {
    pub event: &'static str,
    pub user_id: String,
    pub name: String,
    pub groups: usize,
}

impl EventStarted {
    pub fn new(user_id: &str, name: &str, groups: usize) -> Self {
        Self {
            event: "started",
            user_id: user_id.to_string(),
            name: name.to_string(),
            groups,
        }
    }
}

#[derive(Serialize)]
pub struct EventStep {
    pub event: &'static str,
    pub step: String,
}

impl EventStep {
    pub fn new(step: impl Into<String>) -> Self {
        Self {
            event: "step",
            step: step.into(),
        }
    }
}

#[derive(Serialize)]
pub struct EventSession {
    pub event: &'static str,
    pub detail: String,
}

impl EventSession {
    pub fn new(detail: String) -> Self {
        Self {
            event: "session",
            detail,
        }
    }
}

// ── Delivery events ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventAlert {
    pub event: &'static str,
    pub title: String,
    pub body: String,
    pub tag: String,
}

impl EventAlert {
    pub fn new(title: &str, body: &str, tag: &str) -> Self {
        Self {
            event: "alert",
            title: title.to_string(),
            body: body.to_string(),
            tag: tag.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct EventTranscript {
    pub event: &'static str,
    pub group_id: String,
    pub messages: Vec<TranscriptLine>,
}

#[derive(Serialize)]
pub struct TranscriptLine {
    pub id: String,
    pub author: String,
    pub text: String,
    pub local: bool,
}

impl EventTranscript {
    pub fn new(group_id: &str, messages: &[Message]) -> Self {
        Self {
            event: "transcript",
            group_id: group_id.to_string(),
            messages: messages
                .iter()
                .map(|m| TranscriptLine {
                    id: m.id.to_string(),
                    author: m.author_display_name.clone(),
                    text: m.body.clone(),
                    local: m.is_optimistic(),
                })
                .collect(),
        }
    }
}

// ── Summary ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventSummary {
    pub event: &'static str,
    pub metrics: MetricsSnapshot,
    pub elapsed_s: f64,
}

impl EventSummary {
    pub fn new(metrics: MetricsSnapshot, elapsed_s: f64) -> Self {
        Self {
            event: "summary",
            metrics,
            elapsed_s,
        }
    }
}

#[derive(Serialize)]
pub struct EventMention {
    pub event: &'static str,
    pub name: String,
    pub mentioned: bool,
}
