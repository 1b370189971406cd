use std::time::Instant;

use chrono::Local;
use webcast_core::error::Result;
use webcast_core::protocol::events::RoomUserSeqMessage;

use crate::sink::Record;

use super::{HandlerContext, ParsedEvent};

pub const VIEWER_TABLE: &str = "viewer_count";
pub const VIEWER_COLUMNS: &[&str] = &["current_viewers", "total_viewers"];

/// Normalize a display count such as `"3.5万"` to an integer.
/// Unparsable input normalizes to zero.
pub fn normalize_count(text: &str) -> u64 {
    let text = text.trim();
    let (digits, scale) = if let Some(n) = text.strip_suffix('万') {
        (n, 1e4)
    } else if let Some(n) = text.strip_suffix('亿') {
        (n, 1e8)
    } else {
        (text, 1.0)
    };

    match digits.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => {
            let v = n * scale;
            // Scaled decimals round (2.3万 is 23000, not 22999); plain ones truncate.
            if scale > 1.0 {
                v.round() as u64
            } else {
                v.trunc() as u64
            }
        }
        _ => 0,
    }
}

pub(super) fn handle_room_user_seq(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: RoomUserSeqMessage = ctx.decode(payload)?;
    let current = msg.total;
    let total = normalize_count(&msg.total_pv_for_anchor);

    tracing::info!(target: "webcast::event", kind = "viewers", current, total);

    let mut recorded = false;
    if ctx.options.record_viewer_count
        && ctx
            .shared
            .viewer_gate
            .try_pass(ctx.options.log_interval(), Instant::now())
    {
        let record = Record {
            table: VIEWER_TABLE,
            columns: VIEWER_COLUMNS,
            values: vec![current.to_string(), total.to_string()],
        };
        match ctx.shared.sink.append(Local::now(), &record) {
            Ok(()) => recorded = true,
            Err(e) => tracing::warn!(error = %e, "viewer count record dropped"),
        }
    }

    Ok(ParsedEvent::ViewerCount {
        current,
        total,
        recorded,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;

    use prost::Message;

    use super::*;
    use crate::config::HandlerEntry;
    use crate::handlers::testing::ctx;
    use crate::sink::MemorySink;
    use crate::state::SharedState;

    #[test]
    fn normalizes_ten_thousand_suffix() {
        assert_eq!(normalize_count("3.5万"), 35000);
        assert_eq!(normalize_count("2.3万"), 23000);
        assert_eq!(normalize_count("12万"), 120000);
        assert_eq!(normalize_count("1.2亿"), 120_000_000);
        assert_eq!(normalize_count("9876"), 9876);
        assert_eq!(normalize_count(" 42 "), 42);
    }

    #[test]
    fn unparsable_counts_are_zero() {
        for s in ["", "万", "abc", "1,234", "-5", "NaN", "inf"] {
            assert_eq!(normalize_count(s), 0, "input={s:?}");
        }
    }

    fn seq(total: i64, pv: &str) -> Vec<u8> {
        RoomUserSeqMessage {
            total,
            total_pv_for_anchor: pv.into(),
            ..Default::default()
        }
        .encode_to_vec()
    }

    #[test]
    fn first_event_recorded_then_rate_limited() {
        let sink = Arc::new(MemorySink::new());
        let shared = SharedState::new(sink.clone());
        let mut opts = HandlerEntry::enabled();
        opts.record_viewer_count = true;
        let c = ctx("WebcastRoomUserSeqMessage", &opts, &shared);

        let first = handle_room_user_seq(&seq(120, "3.5万"), &c).unwrap();
        assert_eq!(
            first,
            ParsedEvent::ViewerCount {
                current: 120,
                total: 35000,
                recorded: true
            }
        );
        let second = handle_room_user_seq(&seq(121, "3.6万"), &c).unwrap();
        assert!(matches!(second, ParsedEvent::ViewerCount { recorded: false, .. }));

        let rows = sink.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values, ["120", "35000"]);
    }

    #[test]
    fn nothing_recorded_unless_enabled() {
        let sink = Arc::new(MemorySink::new());
        let shared = SharedState::new(sink.clone());
        let opts = HandlerEntry::enabled();
        let c = ctx("WebcastRoomUserSeqMessage", &opts, &shared);

        handle_room_user_seq(&seq(1, "1"), &c).unwrap();
        assert!(sink.rows().is_empty());
    }
}
