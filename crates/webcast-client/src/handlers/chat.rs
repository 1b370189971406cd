use webcast_core::error::Result;
use webcast_core::protocol::events::{ChatMessage, EmojiChatMessage};

use super::{HandlerContext, ParsedEvent};

pub(super) fn handle_chat(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: ChatMessage = ctx.decode(payload)?;
    let user = ctx.user(msg.user.as_ref());

    tracing::info!(
        target: "webcast::event",
        kind = "chat",
        user_id = %user.display_id(),
        nickname = %user.nickname,
        fans_club = ?user.fans_club_level,
        pay_grade = ?user.pay_grade,
        content = %msg.content,
    );

    Ok(ParsedEvent::Chat {
        user,
        content: msg.content,
    })
}

pub(super) fn handle_emoji_chat(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: EmojiChatMessage = ctx.decode(payload)?;
    let user = ctx.user(msg.user.as_ref());

    tracing::info!(
        target: "webcast::event",
        kind = "emoji_chat",
        user_id = %user.display_id(),
        nickname = %user.nickname,
        emoji_id = msg.emoji_id,
        default_content = %msg.default_content,
    );

    Ok(ParsedEvent::EmojiChat {
        user,
        emoji_id: msg.emoji_id,
        default_content: msg.default_content,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use prost::Message;
    use webcast_core::protocol::events::User;

    use super::*;
    use crate::config::HandlerEntry;
    use crate::handlers::testing::ctx;
    use crate::state::SharedState;

    #[test]
    fn chat_from_anonymous_sender() {
        let payload = ChatMessage {
            user: Some(User {
                id: 111111,
                nick_name: "anon".into(),
                ..Default::default()
            }),
            content: "hi".into(),
            ..Default::default()
        }
        .encode_to_vec();

        let opts = HandlerEntry::enabled();
        let shared = SharedState::default();
        let ev = handle_chat(&payload, &ctx("WebcastChatMessage", &opts, &shared)).unwrap();

        match ev {
            ParsedEvent::Chat { user, content } => {
                assert_eq!(user.id, None);
                assert_eq!(content, "hi");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn configured_sentinel_overrides_default() {
        let payload = ChatMessage {
            user: Some(User {
                id: 111111,
                ..Default::default()
            }),
            ..Default::default()
        }
        .encode_to_vec();

        let mut opts = HandlerEntry::enabled();
        opts.anonymous_user_id = 0;
        let shared = SharedState::default();
        let ev = handle_chat(&payload, &ctx("WebcastChatMessage", &opts, &shared)).unwrap();
        assert!(matches!(ev, ParsedEvent::Chat { user, .. } if user.id == Some(111111)));
    }

    #[test]
    fn garbage_payload_is_a_decode_failure() {
        let opts = HandlerEntry::enabled();
        let shared = SharedState::default();
        let err = handle_chat(&[0x0a, 0x05, 0x01], &ctx("WebcastChatMessage", &opts, &shared))
            .unwrap_err();
        assert_eq!(err.kind().as_str(), "DECODE_FAILURE");
        assert!(err.to_string().contains("WebcastChatMessage"));
    }
}
