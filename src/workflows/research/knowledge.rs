//! Semantic knowledge store access.
//!
//! Two tiers sit behind the same [`KnowledgeProvider`] trait. The primary
//! tier talks JSON lines to a locally spawned child process; the fallback
//! tier is a plain HTTP endpoint. The gateway tries the process first and
//! degrades to HTTP when the process cannot be spawned or stops answering.
//!
//! Process lifecycle:
//! 1. the first query spawns the child and performs a capabilities
//!    handshake, which must list `query` within the handshake timeout;
//! 2. later queries reuse the connection while the child is alive;
//! 3. an exited child is detected via `try_wait` and respawned lazily;
//! 4. any request failure tears the connection down so the next query
//!    starts from a clean spawn.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::config::ResearchConfig;

use super::http::HttpKnowledgeClient;
use super::providers::{KnowledgeProvider, KnowledgeResults, ProviderError};

#[derive(Debug, Clone)]
pub struct ProcessTierConfig {
    pub command: String,
    pub args: Vec<String>,
    pub handshake_timeout: Duration,
    pub request_timeout: Duration,
}

impl ProcessTierConfig {
    fn from_research(config: &ResearchConfig) -> Option<Self> {
        config.knowledge.command.as_ref().map(|command| Self {
            command: command.clone(),
            args: config.knowledge.args.clone(),
            handshake_timeout: config.knowledge.handshake_timeout,
            request_timeout: config.request_timeout,
        })
    }
}

#[derive(Serialize)]
struct OpLine<'a> {
    op: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Deserialize)]
struct CapabilitiesLine {
    #[serde(default)]
    capabilities: Vec<String>,
}

#[derive(Deserialize)]
struct ResultsLine {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

struct ProcessConnection {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl ProcessConnection {
    async fn spawn(config: &ProcessTierConfig) -> Result<Self, ProviderError> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                ProviderError::Connection(format!("failed to spawn {}: {err}", config.command))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ProviderError::Connection("knowledge process exposes no stdin".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            ProviderError::Connection("knowledge process exposes no stdout".to_string())
        })?;

        let mut connection = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };
        connection.handshake(config.handshake_timeout).await?;
        Ok(connection)
    }

    /// The child must advertise the `query` capability before any traffic.
    async fn handshake(&mut self, timeout: Duration) -> Result<(), ProviderError> {
        self.send(&OpLine {
            op: "capabilities",
            text: None,
        })
        .await?;

        let line = tokio::time::timeout(timeout, self.stdout.next_line())
            .await
            .map_err(|_| ProviderError::HandshakeTimeout(timeout))?
            .map_err(|err| ProviderError::Connection(format!("handshake read failed: {err}")))?
            .ok_or_else(|| {
                ProviderError::Connection("knowledge process closed during handshake".to_string())
            })?;

        let caps: CapabilitiesLine = serde_json::from_str(&line)
            .map_err(|err| ProviderError::Malformed(format!("handshake line: {err}")))?;
        if !caps.capabilities.iter().any(|cap| cap == "query") {
            return Err(ProviderError::Connection(format!(
                "knowledge process lacks the query capability (got {:?})",
                caps.capabilities
            )));
        }
        Ok(())
    }

    async fn send(&mut self, op: &OpLine<'_>) -> Result<(), ProviderError> {
        let mut line = serde_json::to_string(op)
            .map_err(|err| ProviderError::Malformed(format!("request line: {err}")))?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|err| ProviderError::Connection(format!("write to process failed: {err}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|err| ProviderError::Connection(format!("flush to process failed: {err}")))
    }

    async fn query(
        &mut self,
        text: &str,
        timeout: Duration,
    ) -> Result<KnowledgeResults, ProviderError> {
        self.send(&OpLine {
            op: "query",
            text: Some(text),
        })
        .await?;

        let line = tokio::time::timeout(timeout, self.stdout.next_line())
            .await
            .map_err(|_| {
                ProviderError::Connection(format!(
                    "knowledge process gave no answer within {timeout:?}"
                ))
            })?
            .map_err(|err| ProviderError::Connection(format!("read from process failed: {err}")))?
            .ok_or_else(|| {
                ProviderError::Connection("knowledge process closed its output".to_string())
            })?;

        let results: ResultsLine = serde_json::from_str(&line)
            .map_err(|err| ProviderError::Malformed(format!("results line: {err}")))?;
        Ok(KnowledgeResults {
            results: results.results,
        })
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

/// Primary tier: one child process, one in-flight request at a time.
///
/// The mutex both serializes pipe traffic and guards lazy (re)connection,
/// so concurrent research tasks never interleave lines on the same pipe.
pub struct ProcessKnowledgeTier {
    config: ProcessTierConfig,
    connection: Mutex<Option<ProcessConnection>>,
}

impl ProcessKnowledgeTier {
    pub fn new(config: ProcessTierConfig) -> Self {
        Self {
            config,
            connection: Mutex::new(None),
        }
    }
}

#[async_trait]
impl KnowledgeProvider for ProcessKnowledgeTier {
    async fn query(&self, text: &str) -> Result<KnowledgeResults, ProviderError> {
        let mut slot = self.connection.lock().await;

        if let Some(connection) = slot.as_mut() {
            if !connection.is_alive() {
                tracing::warn!("knowledge process exited, respawning");
                *slot = None;
            }
        }

        if slot.is_none() {
            *slot = Some(ProcessConnection::spawn(&self.config).await?);
        }

        let connection = slot.as_mut().ok_or_else(|| {
            ProviderError::Connection("knowledge connection unavailable".to_string())
        })?;
        match connection.query(text, self.config.request_timeout).await {
            Ok(results) => Ok(results),
            Err(err) => {
                // A broken pipe poisons the connection; start fresh next time.
                *slot = None;
                Err(err)
            }
        }
    }
}

/// Routes queries to the process tier first, then the HTTP tier.
pub struct KnowledgeGateway<P, F> {
    primary: Option<P>,
    fallback: F,
}

impl<P, F> KnowledgeGateway<P, F> {
    pub fn new(primary: Option<P>, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl KnowledgeGateway<ProcessKnowledgeTier, HttpKnowledgeClient> {
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ProviderError> {
        let primary = ProcessTierConfig::from_research(config).map(ProcessKnowledgeTier::new);
        Ok(Self::new(primary, HttpKnowledgeClient::from_config(config)?))
    }
}

#[async_trait]
impl<P, F> KnowledgeProvider for KnowledgeGateway<P, F>
where
    P: KnowledgeProvider,
    F: KnowledgeProvider,
{
    async fn query(&self, text: &str) -> Result<KnowledgeResults, ProviderError> {
        if let Some(primary) = &self.primary {
            match primary.query(text).await {
                Ok(results) => return Ok(results),
                Err(err) => {
                    tracing::warn!(error = %err, "knowledge process tier failed, using fallback");
                }
            }
        }
        self.fallback.query(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(script: &str, handshake_secs: u64) -> ProcessKnowledgeTier {
        ProcessKnowledgeTier::new(ProcessTierConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            handshake_timeout: Duration::from_secs(handshake_secs),
            request_timeout: Duration::from_secs(5),
        })
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_tier_handshakes_then_answers_queries() {
        let script = r#"read _
echo '{"capabilities":["query"]}'
while read _; do echo '{"results":[{"content":"migration note"}]}'; done"#;
        let tier = tier(script, 5);

        let first = tier.query("onboarding pace").await.expect("first query");
        assert_eq!(first.results.len(), 1);

        let second = tier.query("pricing history").await.expect("second query");
        assert_eq!(second.results[0]["content"], "migration note");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_tier_rejects_child_without_query_capability() {
        let script = r#"read _
echo '{"capabilities":["embed"]}'"#;
        let tier = tier(script, 5);

        let err = tier.query("anything").await.expect_err("must refuse");
        assert!(err.to_string().contains("query capability"), "got: {err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_tier_times_out_on_silent_handshake() {
        let tier = tier("sleep 30", 1);

        match tier.query("anything").await {
            Err(ProviderError::HandshakeTimeout(timeout)) => {
                assert_eq!(timeout, Duration::from_secs(1));
            }
            other => panic!("expected handshake timeout, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_tier_respawns_after_child_exits() {
        // Child serves exactly one query, then exits. The second query must
        // detect the dead child and go through a fresh spawn and handshake.
        let script = r#"read _
echo '{"capabilities":["query"]}'
read _
echo '{"results":[{"content":"one shot"}]}'"#;
        let tier = tier(script, 5);

        let first = tier.query("first").await.expect("first query");
        assert_eq!(first.results[0]["content"], "one shot");

        // Give the one-shot child a moment to exit so try_wait sees it.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let second = tier.query("second").await.expect("respawned query");
        assert_eq!(second.results[0]["content"], "one shot");
    }

    struct FailingTier;

    #[async_trait]
    impl KnowledgeProvider for FailingTier {
        async fn query(&self, _text: &str) -> Result<KnowledgeResults, ProviderError> {
            Err(ProviderError::Connection("no process".to_string()))
        }
    }

    struct StaticTier(&'static str);

    #[async_trait]
    impl KnowledgeProvider for StaticTier {
        async fn query(&self, _text: &str) -> Result<KnowledgeResults, ProviderError> {
            Ok(KnowledgeResults {
                results: vec![serde_json::json!({"content": self.0})],
            })
        }
    }

    #[tokio::test]
    async fn gateway_falls_back_when_primary_fails() {
        let gateway = KnowledgeGateway::new(Some(FailingTier), StaticTier("from fallback"));
        let results = gateway.query("q").await.expect("fallback answers");
        assert_eq!(results.results[0]["content"], "from fallback");
    }

    #[tokio::test]
    async fn gateway_skips_straight_to_fallback_without_primary() {
        let gateway: KnowledgeGateway<FailingTier, _> =
            KnowledgeGateway::new(None, StaticTier("direct"));
        let results = gateway.query("q").await.expect("fallback answers");
        assert_eq!(results.results[0]["content"], "direct");
    }

    #[tokio::test]
    async fn gateway_prefers_primary_when_it_answers() {
        let gateway = KnowledgeGateway::new(Some(StaticTier("primary")), StaticTier("fallback"));
        let results = gateway.query("q").await.expect("primary answers");
        assert_eq!(results.results[0]["content"], "primary");
    }
}
