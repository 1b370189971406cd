use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use webcast_core::error::{FeedError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    /// Id from the room page URL (`https://live.douyin.com/<live_id>`).
    pub live_id: String,

    #[serde(default)]
    pub connection: ConnectionSection,

    #[serde(default)]
    pub bootstrap: BootstrapSection,

    #[serde(default)]
    pub signer: SignerSection,

    #[serde(default)]
    pub records: RecordsSection,

    /// Message-type key -> handler entry. Keys the client does not know are
    /// ignored when the registry is built.
    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerEntry>,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(FeedError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if self.live_id.is_empty() || !self.live_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(FeedError::Config("live_id must be a non-empty number".into()));
        }

        self.connection.validate()?;
        self.bootstrap.validate()?;
        self.signer.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

impl ConnectionSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.max_retries) {
            return Err(FeedError::Config(
                "connection.max_retries must be between 1 and 100".into(),
            ));
        }
        if self.retry_delay_ms > 600_000 {
            return Err(FeedError::Config(
                "connection.retry_delay_ms must be at most 600000".into(),
            ));
        }
        if !(1000..=60000).contains(&self.heartbeat_interval_ms) {
            return Err(FeedError::Config(
                "connection.heartbeat_interval_ms must be between 1000 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

fn default_max_retries() -> u32 {
    5
}
fn default_retry_delay_ms() -> u64 {
    3000
}
fn default_heartbeat_interval_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapSection {
    /// Live site root; the session cookie comes from here and the room page
    /// is `live_url + live_id`.
    #[serde(default = "default_live_url")]
    pub live_url: String,

    /// Main site root; serves the `__ac_nonce` cookie.
    #[serde(default = "default_host_url")]
    pub host_url: String,

    /// Push channel endpoint (query string is appended by the client).
    #[serde(default = "default_push_url")]
    pub push_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Device id sent as `user_unique_id` / `wss_push_did`.
    #[serde(default = "default_user_unique_id")]
    pub user_unique_id: String,

    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

impl Default for BootstrapSection {
    fn default() -> Self {
        Self {
            live_url: default_live_url(),
            host_url: default_host_url(),
            push_url: default_push_url(),
            user_agent: default_user_agent(),
            user_unique_id: default_user_unique_id(),
            http_timeout_ms: default_http_timeout_ms(),
        }
    }
}

impl BootstrapSection {
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("bootstrap.live_url", &self.live_url),
            ("bootstrap.host_url", &self.host_url),
            ("bootstrap.push_url", &self.push_url),
        ] {
            url::Url::parse(url).map_err(|e| FeedError::Config(format!("{name}: {e}")))?;
        }
        if !self.live_url.ends_with('/') {
            return Err(FeedError::Config("bootstrap.live_url must end with '/'".into()));
        }
        if !(1000..=120000).contains(&self.http_timeout_ms) {
            return Err(FeedError::Config(
                "bootstrap.http_timeout_ms must be between 1000 and 120000".into(),
            ));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

fn default_live_url() -> String {
    "https://live.douyin.com/".into()
}
fn default_host_url() -> String {
    "https://www.douyin.com/".into()
}
fn default_push_url() -> String {
    "wss://webcast100-ws-web-lq.douyin.com/webcast/im/push/v2/".into()
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/140.0.0.0 Safari/537.36 Edg/140.0.0.0"
        .into()
}
fn default_user_unique_id() -> String {
    "7319483754668557238".into()
}
fn default_http_timeout_ms() -> u64 {
    10000
}

/// External signing program. It receives one JSON request on stdin and must
/// print the signature on stdout.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignerSection {
    #[serde(default = "default_signer_command")]
    pub command: Vec<String>,

    #[serde(default = "default_signer_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SignerSection {
    fn default() -> Self {
        Self {
            command: default_signer_command(),
            timeout_ms: default_signer_timeout_ms(),
        }
    }
}

impl SignerSection {
    pub fn validate(&self) -> Result<()> {
        if self.command.first().map_or(true, |c| c.is_empty()) {
            return Err(FeedError::Config("signer.command must not be empty".into()));
        }
        if !(100..=60000).contains(&self.timeout_ms) {
            return Err(FeedError::Config(
                "signer.timeout_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_signer_command() -> Vec<String> {
    vec!["node".into(), "signer.js".into()]
}
fn default_signer_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordsSection {
    #[serde(default = "default_records_dir")]
    pub dir: PathBuf,

    /// Segment record files by calendar day (`<YYYY-MM-DD>_<table>.csv`).
    #[serde(default = "default_rotate_daily")]
    pub rotate_daily: bool,
}

impl Default for RecordsSection {
    fn default() -> Self {
        Self {
            dir: default_records_dir(),
            rotate_daily: default_rotate_daily(),
        }
    }
}

fn default_records_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_rotate_daily() -> bool {
    true
}

/// One row of the per-message-type handler table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerEntry {
    #[serde(default)]
    pub enabled: bool,

    /// Handler name (e.g. `chat`); defaults to the message type's own handler.
    #[serde(default)]
    pub handler: Option<String>,

    /// Gift: accumulate diamond value into the running total.
    #[serde(default)]
    pub track_total_diamonds: bool,

    /// Viewer count: append rate-limited rows to the record sink.
    #[serde(default)]
    pub record_viewer_count: bool,

    /// Viewer count: minimum seconds between two recorded rows.
    #[serde(default = "default_log_interval_seconds")]
    pub log_interval_seconds: u64,

    /// Chat/member: user id the platform uses for anonymous senders.
    #[serde(default = "default_anonymous_user_id")]
    pub anonymous_user_id: u64,
}

impl HandlerEntry {
    /// Enabled entry with default options.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            handler: None,
            track_total_diamonds: false,
            record_viewer_count: false,
            log_interval_seconds: default_log_interval_seconds(),
            anonymous_user_id: default_anonymous_user_id(),
        }
    }

    pub fn log_interval(&self) -> Duration {
        Duration::from_secs(self.log_interval_seconds)
    }
}

fn default_log_interval_seconds() -> u64 {
    300
}
fn default_anonymous_user_id() -> u64 {
    111111
}
