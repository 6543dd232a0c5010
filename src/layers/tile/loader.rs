use super::types::{TileRequest, TileResponse};
use crate::{
    prelude::{Arc, Duration},
    MapError, Result,
};
use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver, Sender};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::{runtime::Handle, sync::Semaphore};

/// Shared async HTTP client for tile fetching
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("overlaymap/", env!("CARGO_PKG_VERSION")))
        .tcp_keepalive(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(16)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
});

/// Something that can turn a tile URL into image bytes
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches tiles over HTTP(S). Non-2xx responses are errors.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl TileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = HTTP_CLIENT.get(url).timeout(self.timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapError::Fetch(format!("HTTP {} for {}", status, url)));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct TileLoaderConfig {
    /// Upper bound on fetches in flight at once
    pub max_concurrent: usize,
}

impl Default for TileLoaderConfig {
    fn default() -> Self {
        Self { max_concurrent: 6 }
    }
}

/// Runs tile fetches on a tokio runtime and hands results back over a channel.
///
/// Each request becomes one task; a semaphore caps how many fetch at once.
/// Failed fetches are reported once and never retried.
pub struct TileLoader {
    fetcher: Arc<dyn TileFetcher>,
    handle: Handle,
    semaphore: Arc<Semaphore>,
    result_tx: Sender<TileResponse>,
    result_rx: Receiver<TileResponse>,
    pending: Arc<AtomicUsize>,
    config: TileLoaderConfig,
}

impl TileLoader {
    /// Creates a loader bound to the tokio runtime the caller is running in
    pub fn new(fetcher: Arc<dyn TileFetcher>, config: TileLoaderConfig) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| MapError::Fetch(format!("tile loader needs a tokio runtime: {}", e)))?;
        Ok(Self::with_handle(fetcher, config, handle))
    }

    pub fn with_handle(
        fetcher: Arc<dyn TileFetcher>,
        config: TileLoaderConfig,
        handle: Handle,
    ) -> Self {
        let (result_tx, result_rx) = unbounded();
        let permits = config.max_concurrent.max(1);

        log::debug!("tile loader starting with max_concurrent: {}", permits);

        Self {
            fetcher,
            handle,
            semaphore: Arc::new(Semaphore::new(permits)),
            result_tx,
            result_rx,
            pending: Arc::new(AtomicUsize::new(0)),
            config,
        }
    }

    /// Starts fetching every request; results arrive via `try_recv_results`
    pub fn submit(&self, requests: Vec<TileRequest>) {
        for request in requests {
            self.pending.fetch_add(1, Ordering::SeqCst);

            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();
            let result_tx = self.result_tx.clone();
            let pending = self.pending.clone();

            self.handle.spawn(async move {
                let response = match semaphore.acquire_owned().await {
                    Ok(_permit) => match fetcher.fetch(&request.url).await {
                        Ok(data) => {
                            log::debug!("fetched tile {} ({} bytes)", request.coord, data.len());
                            TileResponse::success(&request, data)
                        }
                        Err(e) => TileResponse::failure(&request, e.to_string()),
                    },
                    Err(e) => TileResponse::failure(&request, e.to_string()),
                };

                pending.fetch_sub(1, Ordering::SeqCst);
                // The receiver is gone once the loader is dropped.
                let _ = result_tx.send(response);
            });
        }
    }

    /// Completed fetches since the last call (non-blocking)
    pub fn try_recv_results(&self) -> Vec<TileResponse> {
        self.result_rx.try_iter().collect()
    }

    /// Requests submitted but not yet finished
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &TileLoaderConfig {
        &self.config
    }
}
