//! Session bootstrap: cookie, room id, anti-bot tokens, room status.
//!
//! Resolution order is fixed: the `ttwid` cookie first, then the numeric room
//! id scraped from the room page (needs the cookie), then a fresh push
//! signature over the final URL (needs the room id). Cookie and room id are
//! resolved once and cached for the life of the process.

pub mod push_url;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use reqwest::header::{COOKIE, REFERER};
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use webcast_core::error::{FeedError, Result};

use crate::config::BootstrapSection;
use crate::signer::{sign_with_timeout, SignRequest, Signer};

/// Fixed nonce the room page accepts alongside a fresh msToken.
const ROOM_PAGE_NONCE: &str = "0123407cc00a9e438deb4";

const MS_TOKEN_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_";

/// Random `msToken` cookie value.
pub fn ms_token(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| MS_TOKEN_CHARSET[rng.random_range(0..MS_TOKEN_CHARSET.len())] as char)
        .collect()
}

/// Everything needed to open the push socket.
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    pub room_id: String,
    /// Signed push URL.
    pub url: Url,
    /// `ttwid` session cookie.
    pub cookie: String,
    pub user_agent: String,
}

/// Room status as reported by the enter endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomStatus {
    /// `0` live, anything else ended.
    pub status: i64,
    pub user_id: String,
    pub nickname: String,
}

impl RoomStatus {
    pub fn is_live(&self) -> bool {
        self.status == 0
    }
}

#[derive(Debug, Deserialize)]
struct EnterResponse {
    #[serde(default)]
    data: Option<EnterData>,
}

#[derive(Debug, Deserialize)]
struct EnterData {
    room_status: i64,
    #[serde(default)]
    user: Option<EnterUser>,
}

#[derive(Debug, Default, Deserialize)]
struct EnterUser {
    #[serde(default)]
    id_str: String,
    #[serde(default)]
    nickname: String,
}

/// What the connection manager needs from bootstrap.
#[async_trait]
pub trait Bootstrap: Send + Sync {
    /// Resolve the session (cached) and sign a fresh push URL.
    async fn connect_target(&self) -> Result<ConnectTarget>;

    /// Read-only status probe.
    async fn room_status(&self) -> Result<RoomStatus>;
}

fn network(what: &str) -> impl Fn(reqwest::Error) -> FeedError + '_ {
    move |e| FeedError::Network(format!("{what}: {e}"))
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// `host_url` without its scheme, trailing slash kept
/// (`https://www.douyin.com/` signs as `www.douyin.com/`).
fn signing_host(host_url: &str) -> &str {
    host_url
        .split_once("://")
        .map_or(host_url, |(_, rest)| rest)
}

/// Pull the numeric room id out of the room page.
pub fn extract_room_id(pattern: &Regex, html: &str) -> Result<String> {
    pattern
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| FeedError::PatternNotFound("roomId not present in room page".into()))
}

pub struct TokenBootstrapper {
    live_id: String,
    cfg: BootstrapSection,
    http: reqwest::Client,
    signer: Arc<dyn Signer>,
    signer_timeout: Duration,
    room_id_pattern: Regex,

    cookie: OnceCell<String>,
    room_id: OnceCell<String>,
}

impl TokenBootstrapper {
    pub fn new(
        live_id: impl Into<String>,
        cfg: BootstrapSection,
        signer: Arc<dyn Signer>,
        signer_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.http_timeout())
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(|e| FeedError::Config(format!("http client build failed: {e}")))?;

        // The page embeds the id either as plain or as escaped JSON.
        let room_id_pattern = Regex::new(r#"\\?"roomId\\?"\s*:\s*\\?"(\d+)\\?""#)
            .map_err(|e| FeedError::Config(format!("room id pattern: {e}")))?;

        Ok(Self {
            live_id: live_id.into(),
            cfg,
            http,
            signer,
            signer_timeout,
            room_id_pattern,
            cookie: OnceCell::new(),
            room_id: OnceCell::new(),
        })
    }

    /// Session cookie, resolved on first use.
    pub async fn cookie(&self) -> Result<String> {
        self.cookie
            .get_or_try_init(|| self.resolve_cookie())
            .await
            .cloned()
    }

    /// Room id, resolved on first use.
    pub async fn room_id(&self) -> Result<String> {
        self.room_id
            .get_or_try_init(|| async {
                let cookie = self.cookie().await?;
                self.resolve_room_id(&self.live_id, &cookie).await
            })
            .await
            .cloned()
    }

    /// GET the live site root and take its `ttwid` cookie.
    pub async fn resolve_cookie(&self) -> Result<String> {
        let resp = self
            .http
            .get(&self.cfg.live_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(network("request live url"))?;

        let ttwid = resp
            .cookies()
            .find(|c| c.name() == "ttwid")
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FeedError::PatternNotFound("ttwid cookie missing".into()))?;

        tracing::debug!("session cookie resolved");
        Ok(ttwid)
    }

    /// GET the room page and extract its numeric room id.
    pub async fn resolve_room_id(&self, live_id: &str, cookie: &str) -> Result<String> {
        let url = format!("{}{}", self.cfg.live_url, live_id);
        let html = self
            .http
            .get(&url)
            .header(
                COOKIE,
                format!(
                    "ttwid={cookie}&msToken={}; __ac_nonce={ROOM_PAGE_NONCE}",
                    ms_token(182)
                ),
            )
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(network("request room page"))?
            .text()
            .await
            .map_err(network("read room page"))?;

        let room_id = extract_room_id(&self.room_id_pattern, &html)?;
        tracing::info!(live_id, room_id = %room_id, "room id resolved");
        Ok(room_id)
    }

    /// Fetch an `__ac_nonce` and have it signed into `__ac_signature`.
    pub async fn resolve_signature_pair(&self) -> Result<(String, String)> {
        let resp = self
            .http
            .get(&self.cfg.host_url)
            .send()
            .await
            .map_err(network("request nonce"))?;

        let nonce = resp
            .cookies()
            .find(|c| c.name() == "__ac_nonce")
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FeedError::PatternNotFound("__ac_nonce cookie missing".into()))?;

        let req = SignRequest::AcSignature {
            host: signing_host(&self.cfg.host_url).to_string(),
            nonce: nonce.clone(),
            user_agent: self.cfg.user_agent.clone(),
        };
        let signature = sign_with_timeout(self.signer.as_ref(), &req, self.signer_timeout).await?;
        Ok((nonce, signature))
    }

    fn status_url(&self, room_id: &str) -> Result<Url> {
        let base = format!("{}webcast/room/web/enter/", self.cfg.live_url);
        let params: [(&str, String); 20] = [
            ("aid", "6383".into()),
            ("app_name", "douyin_web".into()),
            ("live_id", "1".into()),
            ("device_platform", "web".into()),
            ("language", "zh-CN".into()),
            ("enter_from", "page_refresh".into()),
            ("cookie_enabled", "true".into()),
            ("screen_width", "5120".into()),
            ("screen_height", "1440".into()),
            ("browser_language", "zh-CN".into()),
            ("browser_platform", "Win32".into()),
            ("browser_name", "Edge".into()),
            ("browser_version", "140.0.0.0".into()),
            ("web_rid", self.live_id.clone()),
            ("room_id_str", room_id.into()),
            ("enter_source", String::new()),
            ("is_need_double_stream", "false".into()),
            ("insert_task_id", String::new()),
            ("live_reason", String::new()),
            ("msToken", ms_token(182)),
        ];
        push_url::build_url(&base, &params)
    }

    /// Query the enter endpoint for the room's live status.
    pub async fn room_status(&self) -> Result<RoomStatus> {
        let room_id = self.room_id().await?;
        let cookie = self.cookie().await?;
        let (nonce, ac_signature) = self.resolve_signature_pair().await?;

        let mut url = self.status_url(&room_id)?;
        let req = SignRequest::RequestToken {
            query: url.query().unwrap_or_default().to_string(),
            user_agent: self.cfg.user_agent.clone(),
        };
        let a_bogus = sign_with_timeout(self.signer.as_ref(), &req, self.signer_timeout).await?;
        url.query_pairs_mut().append_pair("a_bogus", &a_bogus);

        let body: EnterResponse = self
            .http
            .get(url)
            .header(REFERER, format!("{}{}", self.cfg.live_url, self.live_id))
            .header(
                COOKIE,
                format!("ttwid={cookie};__ac_nonce={nonce}; __ac_signature={ac_signature}"),
            )
            .send()
            .await
            .map_err(network("request room status"))?
            .json()
            .await
            .map_err(|e| FeedError::PatternNotFound(format!("room status body: {e}")))?;

        let data = body
            .data
            .ok_or_else(|| FeedError::PatternNotFound("room status has no data".into()))?;
        let user = data.user.unwrap_or_default();

        Ok(RoomStatus {
            status: data.room_status,
            user_id: user.id_str,
            nickname: user.nickname,
        })
    }

    /// Resolve the session and sign a push URL for it.
    pub async fn connect_target(&self) -> Result<ConnectTarget> {
        let cookie = self.cookie().await?;
        let room_id = self.room_id().await?;

        let params = push_url::push_params(&room_id, &self.cfg.user_unique_id, now_ms());
        let mut url = push_url::build_url(&self.cfg.push_url, &params)?;

        let req = SignRequest::SessionOpen {
            fingerprint: push_url::fingerprint(&url),
        };
        let signature = sign_with_timeout(self.signer.as_ref(), &req, self.signer_timeout).await?;
        url.query_pairs_mut().append_pair("signature", &signature);

        Ok(ConnectTarget {
            room_id,
            url,
            cookie,
            user_agent: self.cfg.user_agent.clone(),
        })
    }
}

#[async_trait]
impl Bootstrap for TokenBootstrapper {
    async fn connect_target(&self) -> Result<ConnectTarget> {
        TokenBootstrapper::connect_target(self).await
    }

    async fn room_status(&self) -> Result<RoomStatus> {
        TokenBootstrapper::room_status(self).await
    }
}
