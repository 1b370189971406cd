use webcast_core::error::Result;
use webcast_core::protocol::events::{
    ControlMessage, RoomMessage, RoomRankMessage, RoomStatsMessage, RoomStreamAdaptationMessage,
};

use super::{HandlerContext, ParsedEvent, CONTROL_STATUS_ENDED};

pub(super) fn handle_room(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: RoomMessage = ctx.decode(payload)?;
    let room_id = msg.common.as_ref().map_or(0, |c| c.room_id);

    tracing::info!(target: "webcast::event", kind = "room", room_id, content = %msg.content);

    Ok(ParsedEvent::Room {
        room_id,
        content: msg.content,
    })
}

pub(super) fn handle_room_stats(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: RoomStatsMessage = ctx.decode(payload)?;

    tracing::info!(target: "webcast::event", kind = "room_stats", display = %msg.display_long);

    Ok(ParsedEvent::RoomStats {
        display_long: msg.display_long,
    })
}

pub(super) fn handle_room_rank(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: RoomRankMessage = ctx.decode(payload)?;
    let entries: Vec<(String, String)> = msg
        .ranks
        .into_iter()
        .map(|r| {
            let nickname = r.user.map(|u| u.nick_name).unwrap_or_default();
            (nickname, r.score_str)
        })
        .collect();

    tracing::info!(target: "webcast::event", kind = "rank", entries = ?entries);

    Ok(ParsedEvent::RoomRank { entries })
}

pub(super) fn handle_control(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: ControlMessage = ctx.decode(payload)?;
    let ended = msg.status == CONTROL_STATUS_ENDED;

    if ended {
        tracing::info!(target: "webcast::event", kind = "control", status = msg.status, "broadcast ended");
    } else {
        tracing::debug!(target: "webcast::event", kind = "control", status = msg.status);
    }

    Ok(ParsedEvent::Control {
        status: msg.status,
        ended,
    })
}

pub(super) fn handle_stream_adaptation(
    payload: &[u8],
    ctx: &HandlerContext<'_>,
) -> Result<ParsedEvent> {
    let msg: RoomStreamAdaptationMessage = ctx.decode(payload)?;

    tracing::info!(
        target: "webcast::event",
        kind = "stream_adaptation",
        adaptation_type = msg.adaptation_type,
    );

    Ok(ParsedEvent::StreamAdaptation {
        adaptation_type: msg.adaptation_type,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use prost::Message;

    use super::*;
    use crate::config::HandlerEntry;
    use crate::handlers::testing::ctx;
    use crate::state::SharedState;

    fn control(status: i32) -> Vec<u8> {
        ControlMessage {
            status,
            ..Default::default()
        }
        .encode_to_vec()
    }

    #[test]
    fn only_status_three_ends_the_broadcast() {
        let opts = HandlerEntry::enabled();
        let shared = SharedState::default();
        let c = ctx("WebcastControlMessage", &opts, &shared);

        assert!(handle_control(&control(3), &c).unwrap().ends_broadcast());
        assert!(!handle_control(&control(1), &c).unwrap().ends_broadcast());
        assert!(!handle_control(&control(0), &c).unwrap().ends_broadcast());
    }
}
