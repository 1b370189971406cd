//! Anti-bot signing capability.
//!
//! The platform's signature algorithms are opaque. The client only needs a
//! `Signer` that turns a request fingerprint into a signature string or fails;
//! `CommandSigner` delegates to an external program, `StaticSigner` returns a
//! fixed value.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use webcast_core::error::{FeedError, Result};

use crate::config::SignerSection;

/// What to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignRequest {
    /// Push channel `signature` over the MD5 of the canonical query subset.
    SessionOpen { fingerprint: String },
    /// `__ac_signature` cookie for the nonce issued by `host`. `host` is the
    /// configured host URL without its scheme, trailing slash included
    /// (`www.douyin.com/`).
    AcSignature {
        host: String,
        nonce: String,
        user_agent: String,
    },
    /// Per-request `a_bogus` token over an encoded query string.
    RequestToken { query: String, user_agent: String },
}

impl SignRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            SignRequest::SessionOpen { .. } => "session_open",
            SignRequest::AcSignature { .. } => "ac_signature",
            SignRequest::RequestToken { .. } => "request_token",
        }
    }
}

#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, req: &SignRequest) -> Result<String>;
}

/// Run `signer` with a deadline. Expiry and empty output are signer failures.
pub async fn sign_with_timeout(
    signer: &dyn Signer,
    req: &SignRequest,
    limit: Duration,
) -> Result<String> {
    let sig = tokio::time::timeout(limit, signer.sign(req))
        .await
        .map_err(|_| FeedError::Signer(format!("{} timed out after {limit:?}", req.kind())))??;

    let sig = sig.trim();
    if sig.is_empty() {
        return Err(FeedError::Signer(format!("{} returned no signature", req.kind())));
    }
    Ok(sig.to_string())
}

/// Signs by running an external program: the request is written to stdin as
/// one JSON object, the signature is read from stdout.
pub struct CommandSigner {
    program: String,
    args: Vec<String>,
}

impl CommandSigner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(cfg: &SignerSection) -> Result<Self> {
        let (program, args) = cfg
            .command
            .split_first()
            .ok_or_else(|| FeedError::Config("signer.command must not be empty".into()))?;
        Ok(Self::new(program.clone(), args.to_vec()))
    }
}

#[async_trait]
impl Signer for CommandSigner {
    async fn sign(&self, req: &SignRequest) -> Result<String> {
        let input = serde_json::to_vec(req)
            .map_err(|e| FeedError::Signer(format!("encode request failed: {e}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FeedError::Signer(format!("spawn {} failed: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&input)
                .await
                .map_err(|e| FeedError::Signer(format!("write request failed: {e}")))?;
        }

        let out = child
            .wait_with_output()
            .await
            .map_err(|e| FeedError::Signer(format!("signer did not finish: {e}")))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(FeedError::Signer(format!(
                "{} exited with {}: {}",
                self.program,
                out.status,
                stderr.trim()
            )));
        }

        String::from_utf8(out.stdout)
            .map(|s| s.trim().to_string())
            .map_err(|e| FeedError::Signer(format!("signature is not utf-8: {e}")))
    }
}

/// Returns the same signature for every request, or always fails when empty.
#[derive(Debug, Clone, Default)]
pub struct StaticSigner {
    value: Option<String>,
}

impl StaticSigner {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    pub fn failing() -> Self {
        Self { value: None }
    }
}

#[async_trait]
impl Signer for StaticSigner {
    async fn sign(&self, req: &SignRequest) -> Result<String> {
        self.value
            .clone()
            .ok_or_else(|| FeedError::Signer(format!("no signature for {}", req.kind())))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    struct Slow;

    #[async_trait]
    impl Signer for Slow {
        async fn sign(&self, _req: &SignRequest) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("late".into())
        }
    }

    fn req() -> SignRequest {
        SignRequest::SessionOpen {
            fingerprint: "d41d8cd98f00b204e9800998ecf8427e".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_a_signer_failure() {
        let err = sign_with_timeout(&Slow, &req(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind().as_str(), "SIGNER_FAILURE");
    }

    #[tokio::test]
    async fn blank_signature_is_rejected() {
        let err = sign_with_timeout(&StaticSigner::new("  "), &req(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind().as_str(), "SIGNER_FAILURE");
    }

    #[tokio::test]
    async fn failing_signer_fails() {
        let err = sign_with_timeout(&StaticSigner::failing(), &req(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind().as_str(), "SIGNER_FAILURE");
    }

    #[test]
    fn request_is_tagged_json() {
        let v = serde_json::to_value(req()).unwrap();
        assert_eq!(v["kind"], "session_open");
        assert_eq!(v["fingerprint"], "d41d8cd98f00b204e9800998ecf8427e");
    }
}
