/// Message types with a built-in handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    Chat,
    EmojiChat,
    Gift,
    Like,
    Member,
    Social,
    Fansclub,
    RoomUserSeq,
    Room,
    RoomStats,
    RoomRank,
    Control,
    RoomStreamAdaptation,
}

impl MessageKind {
    pub const ALL: [MessageKind; 13] = [
        MessageKind::Chat,
        MessageKind::EmojiChat,
        MessageKind::Gift,
        MessageKind::Like,
        MessageKind::Member,
        MessageKind::Social,
        MessageKind::Fansclub,
        MessageKind::RoomUserSeq,
        MessageKind::Room,
        MessageKind::RoomStats,
        MessageKind::RoomRank,
        MessageKind::Control,
        MessageKind::RoomStreamAdaptation,
    ];

    /// Dispatch key as sent in `SubMessage.method`.
    pub fn method(self) -> &'static str {
        match self {
            MessageKind::Chat => "WebcastChatMessage",
            MessageKind::EmojiChat => "WebcastEmojiChatMessage",
            MessageKind::Gift => "WebcastGiftMessage",
            MessageKind::Like => "WebcastLikeMessage",
            MessageKind::Member => "WebcastMemberMessage",
            MessageKind::Social => "WebcastSocialMessage",
            MessageKind::Fansclub => "WebcastFansclubMessage",
            MessageKind::RoomUserSeq => "WebcastRoomUserSeqMessage",
            MessageKind::Room => "WebcastRoomMessage",
            MessageKind::RoomStats => "WebcastRoomStatsMessage",
            MessageKind::RoomRank => "WebcastRoomRankMessage",
            MessageKind::Control => "WebcastControlMessage",
            MessageKind::RoomStreamAdaptation => "WebcastRoomStreamAdaptationMessage",
        }
    }

    /// Exact-match lookup; no prefix or case folding.
    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.method() == method)
    }

    /// Name used in the `handler` field of the config table.
    pub fn handler_name(self) -> &'static str {
        match self {
            MessageKind::Chat => "chat",
            MessageKind::EmojiChat => "emoji_chat",
            MessageKind::Gift => "gift",
            MessageKind::Like => "like",
            MessageKind::Member => "member",
            MessageKind::Social => "social",
            MessageKind::Fansclub => "fansclub",
            MessageKind::RoomUserSeq => "viewer_count",
            MessageKind::Room => "room",
            MessageKind::RoomStats => "room_stats",
            MessageKind::RoomRank => "room_rank",
            MessageKind::Control => "control",
            MessageKind::RoomStreamAdaptation => "stream_adaptation",
        }
    }

    pub fn from_handler_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.handler_name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_and_names_are_unique_and_invertible() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::from_method(kind.method()), Some(kind));
            assert_eq!(MessageKind::from_handler_name(kind.handler_name()), Some(kind));
        }
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(MessageKind::from_method("webcastchatmessage"), None);
        assert_eq!(MessageKind::from_method("WebcastChatMessage "), None);
        assert_eq!(MessageKind::from_method("WebcastChat"), None);
    }
}
