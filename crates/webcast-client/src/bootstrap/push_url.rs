//! Push channel URL construction and its canonical signing fingerprint.

use md5::{Digest, Md5};
use url::Url;

use webcast_core::error::{FeedError, Result};

/// Keys covered by the session-open signature, in signing order.
pub const SIGNED_PARAMS: [&str; 13] = [
    "live_id",
    "aid",
    "version_code",
    "webcast_sdk_version",
    "room_id",
    "sub_room_id",
    "sub_channel_id",
    "did_rule",
    "user_unique_id",
    "device_platform",
    "device_type",
    "ac",
    "identity",
];

const BROWSER_VERSION: &str = "5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Query parameters of the push channel for `room_id`, in wire order.
pub fn push_params(room_id: &str, user_unique_id: &str, now_ms: u64) -> Vec<(&'static str, String)> {
    let internal_ext = format!(
        "internal_src:dim|wss_push_room_id:{room_id}|wss_push_did:{user_unique_id}\
         |first_req_ms:{now_ms}|fetch_time:{now_ms}|seq:1|wss_info:0-{now_ms}-0-0\
         |wrds_v:7392094459690748497"
    );

    vec![
        ("app_name", "douyin_web".into()),
        ("version_code", "180800".into()),
        ("webcast_sdk_version", "1.0.14-beta.0".into()),
        ("update_version_code", "1.0.14-beta.0".into()),
        ("compress", "gzip".into()),
        ("device_platform", "web".into()),
        ("cookie_enabled", "true".into()),
        ("screen_width", "1536".into()),
        ("screen_height", "864".into()),
        ("browser_language", "zh-CN".into()),
        ("browser_platform", "Win32".into()),
        ("browser_name", "Mozilla".into()),
        ("browser_version", BROWSER_VERSION.into()),
        ("browser_online", "true".into()),
        ("tz_name", "Asia/Shanghai".into()),
        (
            "cursor",
            format!("d-1_u-1_fh-7392091211001140287_t-{now_ms}_r-1"),
        ),
        ("internal_ext", internal_ext),
        ("host", "https://live.douyin.com".into()),
        ("aid", "6383".into()),
        ("live_id", "1".into()),
        ("did_rule", "3".into()),
        ("endpoint", "live_pc".into()),
        ("support_wrds", "1".into()),
        ("user_unique_id", user_unique_id.into()),
        ("im_path", "/webcast/im/fetch/".into()),
        ("identity", "audience".into()),
        ("need_persist_msg_count", "15".into()),
        ("insert_task_id", String::new()),
        ("live_reason", String::new()),
        ("room_id", room_id.into()),
        ("heartbeatDuration", "0".into()),
    ]
}

/// Append `params` to `base` as its query string.
pub fn build_url(base: &str, params: &[(&str, String)]) -> Result<Url> {
    let mut url =
        Url::parse(base).map_err(|e| FeedError::Config(format!("invalid push url {base}: {e}")))?;
    url.query_pairs_mut()
        .clear()
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    Ok(url)
}

/// Canonical signing input: `key=value` for every signed key (missing keys
/// contribute an empty value), joined with `,`.
pub fn canonical_query(url: &Url) -> String {
    SIGNED_PARAMS
        .iter()
        .map(|key| {
            let value = url
                .query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            format!("{key}={value}")
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// MD5 (lowercase hex) of the canonical query; this is what gets signed.
pub fn fingerprint(url: &Url) -> String {
    let digest = Md5::digest(canonical_query(url).as_bytes());
    format!("{digest:x}")
}
