//! Event handlers, one per message kind.
//!
//! A handler decodes its sub-message payload, emits a structured
//! `webcast::event` trace record, updates shared aggregates where its policy
//! says so, and returns the parsed event. Handlers are plain functions; the
//! registry binds them to message kinds once at startup.

mod audience;
mod chat;
mod gift;
mod room;
mod viewers;

use webcast_core::error::{FeedError, Result};
use webcast_core::protocol::events::User;

use crate::config::HandlerEntry;
use crate::dispatch::MessageKind;
use crate::state::SharedState;

pub use viewers::{normalize_count, VIEWER_COLUMNS, VIEWER_TABLE};

/// Status code of a control message announcing the end of the broadcast.
pub const CONTROL_STATUS_ENDED: i32 = 3;

/// What a handler sees besides its payload.
pub struct HandlerContext<'a> {
    /// Message-type key the payload arrived under.
    pub method: &'a str,
    /// Per-type options from the handler table.
    pub options: &'a HandlerEntry,
    pub shared: &'a SharedState,
}

impl HandlerContext<'_> {
    /// Decode the payload as `M`, mapping failures to `DecodeFailure`.
    pub fn decode<M: prost::Message + Default>(&self, payload: &[u8]) -> Result<M> {
        M::decode(payload).map_err(|e| FeedError::decode(self.method, payload.len(), e))
    }

    pub fn user(&self, user: Option<&User>) -> EventUser {
        EventUser::from_proto(user, self.options.anonymous_user_id)
    }
}

pub type HandlerFn = fn(&[u8], &HandlerContext<'_>) -> Result<ParsedEvent>;

/// Registration-time table: message kind -> handler function.
pub fn handler_fn(kind: MessageKind) -> HandlerFn {
    match kind {
        MessageKind::Chat => chat::handle_chat,
        MessageKind::EmojiChat => chat::handle_emoji_chat,
        MessageKind::Gift => gift::handle_gift,
        MessageKind::Like => audience::handle_like,
        MessageKind::Member => audience::handle_member,
        MessageKind::Social => audience::handle_social,
        MessageKind::Fansclub => audience::handle_fansclub,
        MessageKind::RoomUserSeq => viewers::handle_room_user_seq,
        MessageKind::Room => room::handle_room,
        MessageKind::RoomStats => room::handle_room_stats,
        MessageKind::RoomRank => room::handle_room_rank,
        MessageKind::Control => room::handle_control,
        MessageKind::RoomStreamAdaptation => room::handle_stream_adaptation,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
    Unknown,
}

impl Gender {
    fn from_code(code: u32) -> Self {
        match code {
            0 => Gender::Female,
            1 => Gender::Male,
            _ => Gender::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Unknown => "unknown",
        }
    }
}

/// Sender as displayed; `id` is `None` for anonymous users.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventUser {
    pub id: Option<u64>,
    pub nickname: String,
    pub fans_club_level: Option<i32>,
    pub pay_grade: Option<i64>,
}

impl EventUser {
    pub fn from_proto(user: Option<&User>, anonymous_id: u64) -> Self {
        let Some(u) = user else {
            return Self::default();
        };
        Self {
            id: (u.id != anonymous_id).then_some(u.id),
            nickname: u.nick_name.clone(),
            fans_club_level: u
                .fans_club
                .as_ref()
                .and_then(|f| f.data.as_ref())
                .map(|d| d.level),
            pay_grade: u.pay_grade.as_ref().map(|g| g.level),
        }
    }

    /// Id for log fields; anonymous senders log as `-`.
    pub fn display_id(&self) -> String {
        self.id.map_or_else(|| "-".to_string(), |id| id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    Chat {
        user: EventUser,
        content: String,
    },
    EmojiChat {
        user: EventUser,
        emoji_id: i64,
        default_content: String,
    },
    Gift {
        user: EventUser,
        gift_name: String,
        count: u64,
        /// Unit diamond value times combo count.
        value: u64,
        /// Running total after this gift, when tracking is enabled.
        total_diamonds: Option<u64>,
    },
    Like {
        user: EventUser,
        count: u64,
        total: u64,
    },
    Member {
        user: EventUser,
        gender: Gender,
    },
    Social {
        user: EventUser,
    },
    Fansclub {
        content: String,
    },
    ViewerCount {
        current: i64,
        total: u64,
        /// Whether a row went to the record sink.
        recorded: bool,
    },
    Room {
        room_id: u64,
        content: String,
    },
    RoomStats {
        display_long: String,
    },
    RoomRank {
        /// (nickname, score) in rank order.
        entries: Vec<(String, String)>,
    },
    Control {
        status: i32,
        ended: bool,
    },
    StreamAdaptation {
        adaptation_type: i32,
    },
}

impl ParsedEvent {
    pub fn ends_broadcast(&self) -> bool {
        matches!(self, ParsedEvent::Control { ended: true, .. })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::HandlerEntry;
    use crate::state::SharedState;

    use super::HandlerContext;

    pub fn ctx<'a>(
        method: &'a str,
        options: &'a HandlerEntry,
        shared: &'a SharedState,
    ) -> HandlerContext<'a> {
        HandlerContext {
            method,
            options,
            shared,
        }
    }
}
