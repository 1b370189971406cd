use webcast_core::error::Result;
use webcast_core::protocol::events::GiftMessage;

use super::{HandlerContext, ParsedEvent};

pub(super) fn handle_gift(payload: &[u8], ctx: &HandlerContext<'_>) -> Result<ParsedEvent> {
    let msg: GiftMessage = ctx.decode(payload)?;
    let user = ctx.user(msg.user.as_ref());

    let (gift_name, unit) = msg
        .gift
        .as_ref()
        .map(|g| (g.name.clone(), u64::from(g.diamond_count)))
        .unwrap_or_default();
    let count = msg.combo_count;
    let value = unit.saturating_mul(count);

    let total_diamonds = ctx
        .options
        .track_total_diamonds
        .then(|| ctx.shared.diamonds.add(value));

    tracing::info!(
        target: "webcast::event",
        kind = "gift",
        user_id = %user.display_id(),
        nickname = %user.nickname,
        fans_club = ?user.fans_club_level,
        pay_grade = ?user.pay_grade,
        gift = %gift_name,
        count,
        value,
        total_diamonds = ?total_diamonds,
    );

    Ok(ParsedEvent::Gift {
        user,
        gift_name,
        count,
        value,
        total_diamonds,
    })
}
