use webcast_core::error::Result;
use webcast_core::protocol::events::{FansclubMessage, LikeMessage, MemberMessage, SocialMessage};

use super::{Gender, HandlerContext, ParsedEvent};

pub(super) fn handle_like(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: LikeMessage = ctx.decode(payload)?;
    let user = ctx.user(msg.user.as_ref());

    tracing::info!(
        target: "webcast::event",
        kind = "like",
        nickname = %user.nickname,
        count = msg.count,
        total = msg.total,
    );

    Ok(ParsedEvent::Like {
        user,
        count: msg.count,
        total: msg.total,
    })
}

pub(super) fn handle_member(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: MemberMessage = ctx.decode(payload)?;
    let gender = Gender::from_code(msg.user.as_ref().map_or(u32::MAX, |u| u.gender));
    let user = ctx.user(msg.user.as_ref());

    tracing::info!(
        target: "webcast::event",
        kind = "member",
        user_id = %user.display_id(),
        nickname = %user.nickname,
        gender = gender.as_str(),
    );

    Ok(ParsedEvent::Member { user, gender })
}

pub(super) fn handle_social(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: SocialMessage = ctx.decode(payload)?;
    let user = ctx.user(msg.user.as_ref());

    tracing::info!(
        target: "webcast::event",
        kind = "follow",
        user_id = %user.display_id(),
        nickname = %user.nickname,
    );

    Ok(ParsedEvent::Social { user })
}

pub(super) fn handle_fansclub(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: FansclubMessage = ctx.decode(payload)?;

    tracing::info!(target: "webcast::event", kind = "fansclub", content = %msg.content);

    Ok(ParsedEvent::Fansclub {
        content: msg.content,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use prost::Message;
    use webcast_core::protocol::events::User;

    use super::*;
    use crate::config::HandlerEntry;
    use crate::handlers::testing::ctx;
    use crate::state::SharedState;

    fn member(gender: u32) -> Vec<u8> {
        MemberMessage {
            user: Some(User {
                id: 5,
                nick_name: "viewer".into(),
                gender,
                ..Default::default()
            }),
            ..Default::default()
        }
        .encode_to_vec()
    }

    #[test]
    fn member_gender_mapping() {
        let opts = HandlerEntry::enabled();
        let shared = SharedState::default();
        let c = ctx("WebcastMemberMessage", &opts, &shared);

        for (code, expected) in [(0, Gender::Female), (1, Gender::Male), (2, Gender::Unknown)] {
            let ev = handle_member(&member(code), &c).unwrap();
            assert!(
                matches!(ev, ParsedEvent::Member { gender, .. } if gender == expected),
                "code={code}"
            );
        }
    }

    #[test]
    fn like_reports_count_and_total() {
        let payload = LikeMessage {
            count: 3,
            total: 1200,
            ..Default::default()
        }
        .encode_to_vec();
        let opts = HandlerEntry::enabled();
        let shared = SharedState::default();
        let ev = handle_like(&payload, &ctx("WebcastLikeMessage", &opts, &shared)).unwrap();
        assert!(matches!(ev, ParsedEvent::Like { count: 3, total: 1200, .. }));
    }
}
