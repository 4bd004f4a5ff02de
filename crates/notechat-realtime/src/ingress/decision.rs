//! Pure ingress decision: inbound message + names + focus → effects.
//!
//! No I/O, no clocks, no shared state. Everything the handler observed is
//! passed in, which keeps the append/notify rules testable in isolation.

use crate::config::ClientConfig;
use crate::mention::is_mentioned;
use crate::message::{Message, MessageOrigin};
use crate::notify::{NotificationIntent, NotificationKind};
use crate::types::{CurrentUser, GroupId};

use super::effect::IngressEffect;
use super::event::InboundMessage;

/// Display names resolved for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNames {
    pub author: String,
    pub group: String,
}

/// What the handler knows at decision time.
pub struct DecisionContext<'a> {
    pub current_user: &'a CurrentUser,
    /// Focus read immediately before planning.
    pub focused: Option<&'a GroupId>,
    pub config: &'a ClientConfig,
}

/// The user's own writes come back through the subscription.
pub fn is_self_echo(inbound: &InboundMessage, current_user: &CurrentUser) -> bool {
    inbound.author_id == current_user.id
}

/// Decide what an inbound message does.
///
/// - focused on its group → append
/// - mention → notify (mention title), even when focused
/// - not focused, no mention → notify (group title)
///
/// At most one notification per message. Self echoes yield nothing.
pub fn plan(
    inbound: InboundMessage,
    names: ResolvedNames,
    ctx: &DecisionContext<'_>,
) -> Vec<IngressEffect> {
    if is_self_echo(&inbound, ctx.current_user) {
        return Vec::new();
    }

    let focused = ctx.focused == Some(&inbound.group_id);
    let mentioned = is_mentioned(&inbound.body, &ctx.current_user.display_name);
    let mut effects = Vec::with_capacity(2);

    let kind = if mentioned {
        Some(NotificationKind::Mention)
    } else if !focused {
        Some(NotificationKind::Unfocused)
    } else {
        None
    };
    let notification = kind.map(|kind| {
        NotificationIntent::for_message(
            kind,
            &inbound.group_id,
            &names.group,
            &names.author,
            &inbound.body,
            ctx.config,
        )
    });

    if focused || ctx.config.record_unfocused_messages {
        let group_id = inbound.group_id.clone();
        let message = Message {
            author_avatar_ref: ctx.config.avatar_for(&inbound.author_id),
            id: inbound.id,
            group_id: inbound.group_id,
            author_id: inbound.author_id,
            author_display_name: names.author,
            body: inbound.body,
            created_at: inbound.created_at,
            reply_ref: inbound.reply_ref,
            origin: MessageOrigin::Remote,
        };
        effects.push(IngressEffect::AppendToTranscript { group_id, message });
    }

    if let Some(intent) = notification {
        effects.push(IngressEffect::Notify(intent));
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessageId, UserId};

    fn ana() -> CurrentUser {
        CurrentUser::new("u-ana", "Ana", "")
    }

    fn inbound(group: &str, author: &str, body: &str) -> InboundMessage {
        InboundMessage {
            id: MessageId::from("m-1"),
            group_id: GroupId::from(group),
            author_id: UserId::from(author),
            body: body.into(),
            created_at: 10,
            reply_ref: None,
        }
    }

    fn names() -> ResolvedNames {
        ResolvedNames {
            author: "Bob".into(),
            group: "Book Club".into(),
        }
    }

    fn run(
        msg: InboundMessage,
        focused: Option<&str>,
        config: &ClientConfig,
    ) -> Vec<IngressEffect> {
        let user = ana();
        let focused = focused.map(GroupId::from);
        let ctx = DecisionContext {
            current_user: &user,
            focused: focused.as_ref(),
            config,
        };
        plan(msg, names(), &ctx)
    }

    fn counts(effects: &[IngressEffect]) -> (usize, usize) {
        let appends = effects
            .iter()
            .filter(|e| matches!(e, IngressEffect::AppendToTranscript { .. }))
            .count();
        (appends, effects.len() - appends)
    }

    #[test]
    fn focused_plain_message_appends_only() {
        let config = ClientConfig::new();
        let effects = run(inbound("g-1", "u-bob", "hi"), Some("g-1"), &config);
        assert_eq!(counts(&effects), (1, 0));

        let IngressEffect::AppendToTranscript { group_id, message } = &effects[0] else {
            panic!("expected append");
        };
        assert_eq!(group_id, &GroupId::from("g-1"));
        assert_eq!(message.author_display_name, "Bob");
        assert_eq!(message.origin, MessageOrigin::Remote);
        assert!(message.author_avatar_ref.contains("u-bob"));
    }

    #[test]
    fn unfocused_plain_message_notifies_only() {
        let config = ClientConfig::new();
        for focus in [None, Some("g-other")] {
            let effects = run(inbound("g-1", "u-bob", "hi"), focus, &config);
            assert_eq!(counts(&effects), (0, 1));
            let IngressEffect::Notify(intent) = &effects[0] else {
                panic!("expected notify");
            };
            assert_eq!(intent.kind, NotificationKind::Unfocused);
            assert_eq!(intent.title, "New message in Book Club");
            assert_eq!(intent.dedupe_tag, GroupId::from("g-1"));
        }
    }

    #[test]
    fn focused_mention_appends_and_notifies() {
        let config = ClientConfig::new();
        let effects = run(inbound("g-1", "u-bob", "hey @Ana"), Some("g-1"), &config);
        assert_eq!(counts(&effects), (1, 1));
        assert!(matches!(
            &effects[1],
            IngressEffect::Notify(i) if i.kind == NotificationKind::Mention
        ));
    }

    #[test]
    fn unfocused_mention_yields_single_mention_alert() {
        let config = ClientConfig::new();
        let effects = run(inbound("g-1", "u-bob", "@Ana look"), None, &config);
        assert_eq!(effects.len(), 1);
        let IngressEffect::Notify(intent) = &effects[0] else {
            panic!("expected notify");
        };
        assert_eq!(intent.kind, NotificationKind::Mention);
        assert_eq!(intent.title, "🔔 You were mentioned!");
    }

    #[test]
    fn self_echo_yields_nothing() {
        let config = ClientConfig::new();
        assert!(run(inbound("g-1", "u-ana", "@Ana note to self"), Some("g-1"), &config).is_empty());
        assert!(run(inbound("g-1", "u-ana", "x"), None, &config).is_empty());
    }

    #[test]
    fn record_unfocused_also_appends() {
        let config = ClientConfig::new().record_unfocused_messages(true);
        let effects = run(inbound("g-1", "u-bob", "hi"), None, &config);
        assert_eq!(counts(&effects), (1, 1));
    }
}
