//! Bearer token acquisition
//!
//! The engine endpoint wants a Google Cloud access token; where it comes
//! from depends on the environment. The `TokenSource` trait abstracts that
//! away so the client (and its tests) never care which provider is behind
//! it. Sources cache their token and refresh shortly before expiry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Refresh this long before the token actually expires.
const EXPIRY_BUFFER: Duration = Duration::from_secs(300);

/// gcloud does not report expiry; its tokens last about an hour.
const GCLOUD_TOKEN_TTL: Duration = Duration::from_secs(45 * 60);

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Provides a valid bearer token on demand, refreshing as needed.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Pick a token source for the current environment: the metadata server on
/// Google-managed runtimes, the gcloud CLI elsewhere.
pub fn default_source() -> Arc<dyn TokenSource> {
    let on_gcp = std::env::var("K_SERVICE").is_ok() || std::env::var("GCE_METADATA_HOST").is_ok();
    if on_gcp {
        debug!("Token source: metadata server");
        Arc::new(MetadataTokenSource::new())
    } else {
        debug!("Token source: gcloud CLI");
        Arc::new(GcloudTokenSource::new())
    }
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_BUFFER < self.expires_at
    }
}

/// Fixed token, for tests and embedders that manage credentials themselves.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Token from the GCE/Cloud Run metadata server.
pub struct MetadataTokenSource {
    http: reqwest::Client,
    token_url: String,
    cached: RwLock<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

impl MetadataTokenSource {
    pub fn new() -> Self {
        Self::with_token_url(METADATA_TOKEN_URL)
    }

    /// Point at a non-standard metadata endpoint (tests, emulators).
    pub fn with_token_url(token_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            cached: RwLock::new(None),
        }
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let response = self
            .http
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .context("reaching metadata server")?;

        if !response.status().is_success() {
            bail!("metadata server returned HTTP {}", response.status());
        }

        let parsed: MetadataTokenResponse =
            response.json().await.context("parsing metadata token")?;
        info!(
            "Fetched access token from metadata server (expires in {}s)",
            parsed.expires_in
        );

        Ok(CachedToken {
            token: parsed.access_token,
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
        })
    }
}

impl Default for MetadataTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenSource for MetadataTokenSource {
    async fn access_token(&self) -> Result<String> {
        if let Some(cached) = &*self.cached.read().await {
            if cached.is_fresh() {
                return Ok(cached.token.clone());
            }
        }

        let mut guard = self.cached.write().await;
        // Another caller may have refreshed while we waited for the lock
        if let Some(cached) = &*guard {
            if cached.is_fresh() {
                return Ok(cached.token.clone());
            }
        }

        let fetched = self.fetch().await?;
        let token = fetched.token.clone();
        *guard = Some(fetched);
        Ok(token)
    }
}

/// Token from the gcloud CLI (application-default credentials, so the
/// `GOOGLE_APPLICATION_CREDENTIALS` path materialized from an inline
/// credential is honored).
pub struct GcloudTokenSource {
    program: String,
    args: Vec<String>,
    cached: RwLock<Option<CachedToken>>,
}

impl GcloudTokenSource {
    pub fn new() -> Self {
        Self::with_command(
            "gcloud",
            ["auth", "application-default", "print-access-token"],
        )
    }

    /// Run an arbitrary command instead of gcloud (tests).
    pub fn with_command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cached: RwLock::new(None),
        }
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .with_context(|| format!("running {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} failed: {}", self.program, stderr.trim());
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            bail!("{} produced no token", self.program);
        }
        info!("Fetched access token via {}", self.program);

        Ok(CachedToken {
            token,
            expires_at: Instant::now() + GCLOUD_TOKEN_TTL,
        })
    }
}

impl Default for GcloudTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenSource for GcloudTokenSource {
    async fn access_token(&self) -> Result<String> {
        if let Some(cached) = &*self.cached.read().await {
            if cached.is_fresh() {
                return Ok(cached.token.clone());
            }
        }

        let mut guard = self.cached.write().await;
        if let Some(cached) = &*guard {
            if cached.is_fresh() {
                return Ok(cached.token.clone());
            }
        }

        let fetched = self.fetch().await?;
        let token = fetched.token.clone();
        *guard = Some(fetched);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticTokenSource::new("tok-1");
        assert_eq!(source.access_token().await.unwrap(), "tok-1");
    }

    #[test]
    fn test_cached_token_freshness() {
        let fresh = CachedToken {
            token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(fresh.is_fresh());

        // Inside the refresh buffer counts as stale
        let nearly_expired = CachedToken {
            token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(!nearly_expired.is_fresh());
    }

    #[tokio::test]
    async fn test_command_source_trims_output() {
        let source = GcloudTokenSource::with_command("echo", ["fake-token"]);
        assert_eq!(source.access_token().await.unwrap(), "fake-token");
    }

    #[tokio::test]
    async fn test_command_source_failure_is_error() {
        let source = GcloudTokenSource::with_command("false", Vec::<String>::new());
        assert!(source.access_token().await.is_err());
    }

    #[tokio::test]
    async fn test_metadata_source_caches_token() {
        static HITS: AtomicUsize = AtomicUsize::new(0);

        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        std::thread::spawn(move || {
            while let Ok(request) = server.recv() {
                HITS.fetch_add(1, Ordering::SeqCst);
                let body = "{\"access_token\": \"meta-tok\", \"expires_in\": 3600, \"token_type\": \"Bearer\"}";
                let _ = request.respond(tiny_http::Response::from_string(body));
            }
        });

        let source = MetadataTokenSource::with_token_url(format!("http://{addr}/token"));
        assert_eq!(source.access_token().await.unwrap(), "meta-tok");
        assert_eq!(source.access_token().await.unwrap(), "meta-tok");
        assert_eq!(HITS.load(Ordering::SeqCst), 1);
    }
}
