//! Query orchestration against deployed Reasoning Engines
//!
//! One turn = one streaming POST to the region-scoped `:streamQuery`
//! endpoint, consumed as NDJSON events and reduced to display updates.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::TokenSource;

use super::delta::{DeltaReducer, StreamMode, NO_TEXT_FALLBACK};
use super::error::EngineError;
use super::event::extract_text;
use super::ndjson::EventLineDecoder;
use super::region::infer_region;

/// Generation latency is unbounded; allow minutes per turn.
const QUERY_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for the Reasoning Engine streaming API.
pub struct ReasoningEngineClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    base_url: Option<String>,
}

impl ReasoningEngineClient {
    pub fn new(tokens: Arc<dyn TokenSource>) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder().timeout(QUERY_TIMEOUT).build()?;
        Ok(Self {
            http,
            tokens,
            base_url: None,
        })
    }

    /// Override the endpoint base (scheme + host), e.g. for a local stub.
    /// By default the host is derived from the engine's region.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn endpoint(&self, engine: &str) -> String {
        let base = match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", infer_region(engine)),
        };
        format!("{base}/v1/{engine}:streamQuery")
    }

    /// Open one streaming query turn.
    ///
    /// Returns a [`QueryStream`] yielding display updates shaped by `mode`.
    /// Dropping the stream closes the underlying connection.
    pub async fn stream_query(
        &self,
        engine: &str,
        message: &str,
        user_id: &str,
        mode: StreamMode,
    ) -> Result<QueryStream, EngineError> {
        let url = self.endpoint(engine);
        let payload = serde_json::json!({
            "classMethod": "stream_query",
            "input": {
                "message": message,
                "user_id": user_id,
            },
        });

        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| EngineError::Token(e.into()))?;

        debug!("Streaming query for user '{}' to {}", user_id, url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            info!("Engine query rejected upstream: HTTP {}", status);
            return Err(EngineError::Upstream { status, body });
        }

        Ok(QueryStream::new(response.bytes_stream().boxed(), mode))
    }

    /// Run one turn to completion and return the final answer text, or the
    /// fixed fallback when the stream produced no text at all.
    pub async fn query(
        &self,
        engine: &str,
        message: &str,
        user_id: &str,
    ) -> Result<String, EngineError> {
        let mut stream = self
            .stream_query(engine, message, user_id, StreamMode::Snapshots)
            .await?;
        while stream.next_update().await?.is_some() {}
        Ok(stream.finish())
    }
}

/// One in-flight query turn: the response byte stream plus the decode →
/// extract → reduce pipeline.
///
/// Abandoning (dropping) the stream drops the HTTP response and promptly
/// releases the underlying connection.
pub struct QueryStream {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: EventLineDecoder,
    reducer: DeltaReducer,
    pending: VecDeque<Value>,
    exhausted: bool,
    fallback_emitted: bool,
}

impl QueryStream {
    fn new(body: BoxStream<'static, reqwest::Result<Bytes>>, mode: StreamMode) -> Self {
        Self {
            body,
            decoder: EventLineDecoder::new(),
            reducer: DeltaReducer::new(mode),
            pending: VecDeque::new(),
            exhausted: false,
            fallback_emitted: false,
        }
    }

    /// Next display update, or `None` once the stream is finished.
    ///
    /// When the stream ends without any extractable text, a single
    /// [`NO_TEXT_FALLBACK`] update is yielded before the end.
    pub async fn next_update(&mut self) -> Result<Option<String>, EngineError> {
        loop {
            while let Some(event) = self.pending.pop_front() {
                if let Some(text) = extract_text(&event) {
                    if let Some(update) = self.reducer.push(&text) {
                        return Ok(Some(update));
                    }
                }
            }

            if self.exhausted {
                if !self.reducer.saw_text() && !self.fallback_emitted {
                    self.fallback_emitted = true;
                    return Ok(Some(NO_TEXT_FALLBACK.to_string()));
                }
                return Ok(None);
            }

            match self.body.next().await {
                Some(chunk) => {
                    let chunk = chunk?;
                    self.pending.extend(self.decoder.decode_chunk(&chunk));
                }
                None => {
                    self.exhausted = true;
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }

    /// Final answer after the turn, with the no-text fallback applied.
    pub fn finish(self) -> String {
        self.reducer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenSource;

    const ENGINE: &str = "projects/p/locations/us-central1/reasoningEngines/e";

    /// Serve one canned response on an ephemeral port, then shut down.
    fn spawn_upstream(status: u16, body: &'static str) -> String {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        std::thread::spawn(move || {
            if let Ok(request) = server.recv() {
                let response = tiny_http::Response::from_string(body).with_status_code(status);
                let _ = request.respond(response);
            }
        });
        format!("http://{addr}")
    }

    fn test_client(base_url: String) -> ReasoningEngineClient {
        ReasoningEngineClient::new(Arc::new(StaticTokenSource::new("test-token")))
            .unwrap()
            .with_base_url(base_url)
    }

    #[test]
    fn test_endpoint_region_scoped() {
        let client =
            ReasoningEngineClient::new(Arc::new(StaticTokenSource::new("t"))).unwrap();
        assert_eq!(
            client.endpoint("projects/p/locations/us-east4/reasoningEngines/e"),
            "https://us-east4-aiplatform.googleapis.com/v1/projects/p/locations/us-east4/reasoningEngines/e:streamQuery"
        );
    }

    #[tokio::test]
    async fn test_stream_query_yields_deltas() {
        let base = spawn_upstream(
            200,
            concat!(
                "{\"content\": {\"parts\": [{\"text\": \"Hel\"}]}}\n",
                "not json at all\n",
                "{\"content\": {\"parts\": [{\"text\": \"Hello\"}]}}\n",
                "{\"usage\": {\"tokens\": 3}}\n",
                "{\"content\": {\"parts\": [{\"text\": \"Hello world\"}]}}\n",
            ),
        );
        let client = test_client(base);

        let mut stream = client
            .stream_query(ENGINE, "hi", "u-1", StreamMode::Deltas)
            .await
            .unwrap();
        let mut updates = Vec::new();
        while let Some(update) = stream.next_update().await.unwrap() {
            updates.push(update);
        }
        assert_eq!(updates, vec!["Hel", "lo", " world"]);
        assert_eq!(stream.finish(), "Hello world");
    }

    #[tokio::test]
    async fn test_stream_query_snapshots_mode() {
        let base = spawn_upstream(
            200,
            concat!(
                "{\"content\": {\"parts\": [{\"text\": \"Hello\"}]}}\n",
                "{\"content\": {\"parts\": [{\"text\": \"Goodbye\"}]}}\n",
            ),
        );
        let client = test_client(base);

        let mut stream = client
            .stream_query(ENGINE, "hi", "u-1", StreamMode::Snapshots)
            .await
            .unwrap();
        let mut updates = Vec::new();
        while let Some(update) = stream.next_update().await.unwrap() {
            updates.push(update);
        }
        assert_eq!(updates, vec!["Hello", "Goodbye"]);
    }

    #[tokio::test]
    async fn test_textless_stream_falls_back() {
        let base = spawn_upstream(200, "{\"usage\": {\"tokens\": 0}}\n\n");
        let client = test_client(base);

        let mut stream = client
            .stream_query(ENGINE, "hi", "u-1", StreamMode::Deltas)
            .await
            .unwrap();
        assert_eq!(
            stream.next_update().await.unwrap(),
            Some(NO_TEXT_FALLBACK.to_string())
        );
        assert_eq!(stream.next_update().await.unwrap(), None);
        assert_eq!(stream.finish(), NO_TEXT_FALLBACK);
    }

    #[tokio::test]
    async fn test_query_returns_final_answer() {
        let base = spawn_upstream(
            200,
            "{\"content\": {\"parts\": [{\"text\": \"a\"}, {\"text\": \"b\"}]}}\n",
        );
        let client = test_client(base);

        let answer = client.query(ENGINE, "hi", "u-1").await.unwrap();
        assert_eq!(answer, "ab");
    }

    #[tokio::test]
    async fn test_upstream_error_surfaced_with_body() {
        let base = spawn_upstream(500, "engine exploded");
        let client = test_client(base);

        let err = client
            .stream_query(ENGINE, "hi", "u-1", StreamMode::Deltas)
            .await
            .unwrap_err();
        match err {
            EngineError::Upstream { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert!(body.contains("engine exploded"));
            }
            other => panic!("expected Upstream error, got: {other}"),
        }
    }
}
