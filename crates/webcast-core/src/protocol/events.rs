//! Business event messages carried as sub-message payloads.
//!
//! Only the fields the client reads are declared; prost skips the rest of the
//! (much larger) platform schema.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Common {
    #[prost(string, tag = "1")]
    pub method: String,
    #[prost(uint64, tag = "2")]
    pub msg_id: u64,
    #[prost(uint64, tag = "3")]
    pub room_id: u64,
    #[prost(uint64, tag = "4")]
    pub create_time: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct User {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub short_id: u64,
    #[prost(string, tag = "3")]
    pub nick_name: String,
    #[prost(uint32, tag = "4")]
    pub gender: u32,
    #[prost(message, optional, tag = "21")]
    pub pay_grade: Option<PayGrade>,
    #[prost(message, optional, tag = "24")]
    pub fans_club: Option<FansClub>,
    #[prost(string, tag = "1028")]
    pub id_str: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PayGrade {
    #[prost(int64, tag = "6")]
    pub level: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FansClub {
    #[prost(message, optional, tag = "1")]
    pub data: Option<FansClubData>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FansClubData {
    #[prost(string, tag = "1")]
    pub club_name: String,
    #[prost(int32, tag = "2")]
    pub level: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChatMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(message, optional, tag = "2")]
    pub user: Option<User>,
    #[prost(string, tag = "3")]
    pub content: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GiftStruct {
    #[prost(uint64, tag = "5")]
    pub id: u64,
    #[prost(uint32, tag = "12")]
    pub diamond_count: u32,
    #[prost(string, tag = "16")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GiftMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(uint64, tag = "2")]
    pub gift_id: u64,
    #[prost(uint64, tag = "5")]
    pub repeat_count: u64,
    #[prost(uint64, tag = "6")]
    pub combo_count: u64,
    #[prost(message, optional, tag = "7")]
    pub user: Option<User>,
    #[prost(message, optional, tag = "8")]
    pub to_user: Option<User>,
    #[prost(message, optional, tag = "15")]
    pub gift: Option<GiftStruct>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LikeMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(uint64, tag = "2")]
    pub count: u64,
    #[prost(uint64, tag = "3")]
    pub total: u64,
    #[prost(message, optional, tag = "5")]
    pub user: Option<User>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MemberMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(message, optional, tag = "2")]
    pub user: Option<User>,
    #[prost(uint64, tag = "3")]
    pub member_count: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SocialMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(message, optional, tag = "2")]
    pub user: Option<User>,
    #[prost(uint64, tag = "3")]
    pub share_type: u64,
    #[prost(uint64, tag = "4")]
    pub action: u64,
    #[prost(uint64, tag = "6")]
    pub follow_count: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RoomUserSeqMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(int64, tag = "3")]
    pub total: i64,
    #[prost(string, tag = "4")]
    pub pop_str: String,
    #[prost(int64, tag = "6")]
    pub popularity: i64,
    #[prost(int64, tag = "7")]
    pub total_user: i64,
    #[prost(string, tag = "8")]
    pub total_user_str: String,
    #[prost(string, tag = "9")]
    pub total_str: String,
    #[prost(string, tag = "10")]
    pub online_user_for_anchor: String,
    #[prost(string, tag = "11")]
    pub total_pv_for_anchor: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FansclubMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(int32, tag = "2")]
    pub kind: i32,
    #[prost(string, tag = "3")]
    pub content: String,
    #[prost(message, optional, tag = "4")]
    pub user: Option<User>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EmojiChatMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(message, optional, tag = "2")]
    pub user: Option<User>,
    #[prost(int64, tag = "3")]
    pub emoji_id: i64,
    #[prost(string, tag = "5")]
    pub default_content: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RoomMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(string, tag = "2")]
    pub content: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RoomStatsMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(string, tag = "2")]
    pub display_short: String,
    #[prost(string, tag = "3")]
    pub display_middle: String,
    #[prost(string, tag = "4")]
    pub display_long: String,
    #[prost(int64, tag = "5")]
    pub display_value: i64,
    #[prost(int64, tag = "9")]
    pub total: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RoomRank {
    #[prost(message, optional, tag = "1")]
    pub user: Option<User>,
    #[prost(string, tag = "2")]
    pub score_str: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RoomRankMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(message, repeated, tag = "2")]
    pub ranks: Vec<RoomRank>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ControlMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(int32, tag = "2")]
    pub status: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RoomStreamAdaptationMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(int32, tag = "2")]
    pub adaptation_type: i32,
}
